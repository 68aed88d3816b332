//! Device-level commands: configuration lock and policy activation.

use dpctl_api::CcClient;
use dpctl_core::BatchRunner;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::Printer;

pub async fn handle_lock(
    client: &CcClient,
    device: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let body = client.lock_device(device).await?;
    let printer = Printer::new(global);
    printer.print_value(&body)?;
    printer.note(&format!("configuration lock acquired on {device}"));
    Ok(())
}

pub async fn handle_unlock(
    client: &CcClient,
    device: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let body = client.unlock_device(device).await?;
    let printer = Printer::new(global);
    printer.print_value(&body)?;
    printer.note(&format!("configuration lock released on {device}"));
    Ok(())
}

pub async fn handle_update_policies(
    runner: &BatchRunner<'_>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    runner.apply_policy_updates().await?;
    Printer::new(global).note(&format!("policy updates applied on {}", runner.device()));
    Ok(())
}
