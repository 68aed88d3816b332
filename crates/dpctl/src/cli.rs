//! Clap derive structures for the `dpctl` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dpctl -- batch DefensePro configuration via CyberController
#[derive(Debug, Parser)]
#[command(
    name = "dpctl",
    version,
    about = "Apply batch configuration to DefensePro appliances",
    long_about = "Declarative batch configuration for Radware DefensePro appliances,\n\
        driven through the CyberController REST API.\n\n\
        Desired state is described in YAML files; dpctl translates friendly\n\
        attribute values to vendor fields, plans the API operations, and\n\
        executes them with per-item failure isolation.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "DPCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// CyberController address, host or host:port (overrides profile)
    #[arg(long, short = 'c', env = "DPCTL_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Target device IP (overrides profile)
    #[arg(long, short = 'd', env = "DPCTL_DEVICE", global = true)]
    pub device: Option<String>,

    /// API username (overrides profile)
    #[arg(long, short = 'u', env = "DPCTL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DPCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DPCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "DPCTL_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the configuration described in a YAML batch file
    Apply(BatchArgs),

    /// Edit existing configuration from a YAML batch file
    Edit(BatchArgs),

    /// Delete configuration listed in a YAML batch file
    Delete(DeleteArgs),

    /// Read a raw configuration table from the device
    Get(GetArgs),

    /// Push pending policy changes into the active configuration
    UpdatePolicies,

    /// Acquire the device configuration lock
    Lock,

    /// Release the device configuration lock
    Unlock,

    /// Manage dpctl configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Batch commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// YAML file describing the desired batch
    pub file: PathBuf,

    /// Show the planned operations without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Apply policy updates after the batch completes
    #[arg(long)]
    pub update_policies: bool,

    /// Hold the device configuration lock for the duration of the batch
    #[arg(long)]
    pub lock: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// YAML file listing the entities to delete
    pub file: PathBuf,

    /// Show the planned operations without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Apply policy updates after the batch completes
    #[arg(long)]
    pub update_policies: bool,

    /// Hold the device configuration lock for the duration of the batch
    #[arg(long)]
    pub lock: bool,
}

// ── Read commands ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Entity kind to read
    pub kind: EntityKindArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EntityKindArg {
    ClProtections,
    ClProfiles,
    BdosProfiles,
    DnsProfiles,
    SecurityPolicies,
    NetworkClasses,
}

impl EntityKindArg {
    pub fn to_kind(self) -> dpctl_core::EntityKind {
        use dpctl_core::EntityKind;
        match self {
            Self::ClProtections => EntityKind::ClProtection,
            Self::ClProfiles => EntityKind::ClProfile,
            Self::BdosProfiles => EntityKind::BdosProfile,
            Self::DnsProfiles => EntityKind::DnsProfile,
            Self::SecurityPolicies => EntityKind::SecurityPolicy,
            Self::NetworkClasses => EntityKind::NetworkClass,
        }
    }
}

// ── Config commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the resolved configuration file path
    Path,

    /// Show the loaded configuration (passwords redacted)
    Show,

    /// Store a password in the system keyring for a profile
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
