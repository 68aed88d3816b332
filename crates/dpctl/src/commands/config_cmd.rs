//! Configuration commands: path, show, set-password.
//!
//! These run without a controller connection.

use dpctl_config as config;

use crate::cli::{ConfigAction, ConfigArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::Printer;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
        ConfigAction::Show => show(global),
        ConfigAction::SetPassword => set_password(global),
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    // Never echo stored passwords.
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("<redacted>".into());
        }
    }
    let value = serde_json::to_value(&cfg)?;
    Printer::new(global).print_value(&value)
}

fn set_password(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let password = rpassword::prompt_password(format!("Password for profile '{profile_name}': "))?;
    config::store_password(&profile_name, &password)?;
    eprintln!("password stored in keyring for profile '{profile_name}'");
    Ok(())
}
