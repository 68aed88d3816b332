//! Raw table reads.

use dpctl_api::{CcClient, paths};

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::Printer;

pub async fn handle(
    client: &CcClient,
    device: &str,
    args: &GetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spec = args.kind.to_kind().table_spec();
    let path = paths::config_path(device, spec.table, &[]);

    let resp = client.get(&path).await?;
    if !resp.is_success() {
        return Err(CliError::ApiError {
            status: resp.status,
            message: resp.body,
        });
    }

    let value = resp.json()?;
    Printer::new(global).print_value(&value)
}
