//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod device;
pub mod get;

use dpctl_api::CcClient;
use dpctl_core::{BatchRunner, ExecutorOptions};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &CcClient,
    device: &str,
    refresh_between_writes: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let runner = BatchRunner::new(client, device)
        .with_options(ExecutorOptions { refresh_between_writes });

    match cmd {
        Command::Apply(args) => apply::handle_apply(&runner, &args, global).await,
        Command::Edit(args) => apply::handle_edit(&runner, &args, global).await,
        Command::Delete(args) => apply::handle_delete(&runner, &args, global).await,
        Command::Get(args) => get::handle(client, device, &args, global).await,
        Command::UpdatePolicies => device::handle_update_policies(&runner, global).await,
        Command::Lock => device::handle_lock(client, device, global).await,
        Command::Unlock => device::handle_unlock(client, device, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
