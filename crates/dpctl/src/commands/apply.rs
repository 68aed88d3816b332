//! Batch commands: apply, edit, delete.

use std::path::Path;

use serde::de::DeserializeOwned;

use dpctl_core::{BatchReport, BatchRunner, DeleteBatch, DesiredBatch};

use crate::cli::{BatchArgs, DeleteArgs, GlobalOpts};
use crate::commands::confirm;
use crate::error::CliError;
use crate::output::Printer;

pub async fn handle_apply(
    runner: &BatchRunner<'_>,
    args: &BatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let batch: DesiredBatch = load_batch(&args.file)?;
    let printer = Printer::new(global);

    if args.dry_run {
        return printer.print_preview(&runner.preview_create(&batch));
    }

    let report = locked(runner, args.lock, runner.run_create(&batch)).await?;
    finish(runner, &printer, &report, args.update_policies).await
}

pub async fn handle_edit(
    runner: &BatchRunner<'_>,
    args: &BatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let batch: DesiredBatch = load_batch(&args.file)?;
    let printer = Printer::new(global);

    if args.dry_run {
        return printer.print_preview(&runner.preview_edit(&batch).await?);
    }

    let report = locked(runner, args.lock, runner.run_edit(&batch)).await?;
    finish(runner, &printer, &report, args.update_policies).await
}

pub async fn handle_delete(
    runner: &BatchRunner<'_>,
    args: &DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let batch: DeleteBatch = load_batch(&args.file)?;
    let printer = Printer::new(global);

    if args.dry_run {
        return printer.print_preview(&runner.preview_delete(&batch).await?);
    }

    let prompt = format!("Delete listed configuration from device {}?", runner.device());
    if !confirm(&prompt, global.yes)? {
        printer.note("aborted");
        return Ok(());
    }

    let report = locked(runner, args.lock, runner.run_delete(&batch)).await?;
    finish(runner, &printer, &report, args.update_policies).await
}

// ── Shared plumbing ──────────────────────────────────────────────────

/// Run a batch future, optionally holding the device configuration lock.
///
/// The lock is released even when the batch errors; an unlock failure is
/// logged but never masks the batch result.
async fn locked<F>(
    runner: &BatchRunner<'_>,
    lock: bool,
    batch: F,
) -> Result<BatchReport, CliError>
where
    F: Future<Output = Result<BatchReport, dpctl_core::CoreError>>,
{
    if !lock {
        return Ok(batch.await?);
    }

    runner.lock().await?;
    let result = batch.await;
    if let Err(e) = runner.unlock().await {
        tracing::warn!(device = runner.device(), error = %e, "failed to release device lock");
    }
    Ok(result?)
}

fn load_batch<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| CliError::BatchFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Print the report, optionally activate policies, and pick the exit path.
///
/// A partial success exits 0 with its errors printed; only an all-failed
/// batch is a process-level failure.
async fn finish(
    runner: &BatchRunner<'_>,
    printer: &Printer,
    report: &BatchReport,
    update_policies: bool,
) -> Result<(), CliError> {
    printer.print_report(report)?;

    if report.is_failure() {
        return Err(CliError::BatchFailed {
            attempted: report.summary.attempted,
        });
    }

    if update_policies && report.changed {
        runner.apply_policy_updates().await?;
        printer.note("policy updates applied");
    }
    Ok(())
}
