mod cli;
mod commands;
mod error;
mod output;

use std::io::IsTerminal;
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use dpctl_api::{CcClient, ClientConfig, TlsMode, TransportConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a controller connection
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "dpctl", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to a controller
        cmd => {
            let (client_config, device, refresh) = build_connection(&cli.global)?;

            tracing::debug!(controller = %client_config.controller, device, "connecting");
            let client = CcClient::connect(client_config).await?;

            commands::dispatch(cmd, &client, &device, refresh, &cli.global).await
        }
    }
}

/// Resolve controller settings from profile + CLI flag overrides.
///
/// Returns the client config, the target device IP, and whether to
/// refresh tables between sibling writes.
fn build_connection(global: &cli::GlobalOpts) -> Result<(ClientConfig, String, bool), CliError> {
    let cfg = dpctl_config::load_config_or_default();

    // An explicit --controller bypasses profiles entirely.
    if let Some(controller) = &global.controller {
        let config = connection_from_flags(global, controller)?;
        let device = global.device.clone().ok_or(CliError::NoDevice)?;
        return Ok((config, device, cfg.defaults.refresh_between_writes));
    }

    let (name, profile) = dpctl_config::select_profile(&cfg, global.profile.as_deref())?;
    let mut config = dpctl_config::profile_to_client_config(profile, name, &cfg.defaults)?;

    if let Some(username) = &global.username {
        config.username = username.clone();
    }
    if global.insecure {
        config.transport.tls = TlsMode::DangerAcceptInvalid;
    }
    config.transport.timeout = Duration::from_secs(global.timeout);

    let device = global
        .device
        .clone()
        .or_else(|| profile.device.clone())
        .ok_or(CliError::NoDevice)?;

    Ok((config, device, cfg.defaults.refresh_between_writes))
}

/// Build a connection from CLI flags and env vars alone, no profile.
fn connection_from_flags(
    global: &cli::GlobalOpts,
    controller: &str,
) -> Result<ClientConfig, CliError> {
    let username = global
        .username
        .clone()
        .or_else(|| std::env::var("DPCTL_USERNAME").ok())
        .ok_or_else(|| CliError::NoCredentials { profile: "(flags)".into() })?;

    let password = match std::env::var("DPCTL_PASSWORD") {
        Ok(pw) => SecretString::from(pw),
        Err(_) if std::io::stdin().is_terminal() => {
            SecretString::from(rpassword::prompt_password(format!("Password for {username}: "))?)
        }
        Err(_) => return Err(CliError::NoCredentials { profile: "(flags)".into() }),
    };

    Ok(ClientConfig {
        controller: controller.to_owned(),
        username,
        password,
        transport: TransportConfig {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(global.timeout),
        },
    })
}
