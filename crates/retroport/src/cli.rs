//! Clap derive structures for the `retroport` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use retroport_core::{Console, TargetDevice};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// retroport -- open router ports for DreamPi-connected retro consoles
#[derive(Debug, Parser)]
#[command(
    name = "retroport",
    version,
    about = "Configure router port forwarding for Saturn and Dreamcast online play",
    long_about = "Logs into your router's admin panel and installs the port-forward\n\
        rules a DreamPi needs. Supports 31 router brands plus a generic\n\
        best-effort profile for everything else.",
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
    /// Router profile from the config file
    #[arg(long, short = 'p', env = "RETROPORT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "RETROPORT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "RETROPORT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Retries after a connection error or timeout
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Verify the router's TLS certificate
    #[arg(long, global = true)]
    pub secure: bool,

    /// Also write logs to this file
    #[arg(long, env = "RETROPORT_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn output(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log into the router and install the console's port forwards
    Setup(SetupArgs),

    /// Connectivity check: prints the message back
    Echo {
        /// Text to echo
        message: String,
    },

    /// List supported router vendors
    #[command(alias = "routers")]
    Vendors,

    /// Show the rules a setup would install
    Ports(PortsArgs),

    /// Serve JSON-lines requests on stdin for a UI front end
    Bridge(BridgeArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SETUP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// Console to open ports for
    #[arg(long, short = 'c', value_name = "saturn|dreamcast")]
    pub console: Option<Console>,

    /// Device the rules point at
    #[arg(long, short = 't', value_name = "dreampi|pc")]
    pub target: Option<TargetDevice>,

    /// Router vendor id (see `retroport vendors`), or "manual"
    #[arg(long, short = 'r')]
    pub router: Option<String>,

    /// Router LAN address; discovered from the default gateway when omitted
    #[arg(long)]
    pub ip: Option<String>,

    /// Router admin username
    #[arg(long, short = 'u', env = "RETROPORT_USERNAME")]
    pub username: Option<String>,

    /// Read the router password from this environment variable
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Admin panel origin, for panels on a non-standard port
    #[arg(long, value_name = "URL")]
    pub admin_url: Option<String>,

    /// Also open the Dreamcast per-game ports
    #[arg(long)]
    pub games: bool,

    /// Abort the setup after this many seconds
    #[arg(long, value_name = "SECS")]
    pub cancel_after: Option<u64>,

    /// Return the canned demo response without touching the network
    #[arg(long)]
    pub demo: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PORTS / BRIDGE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PortsArgs {
    /// Console whose rule set to show
    #[arg(long, short = 'c', value_name = "saturn|dreamcast")]
    pub console: Console,

    /// Include the Dreamcast per-game ports
    #[arg(long)]
    pub games: bool,
}

#[derive(Debug, Args)]
pub struct BridgeArgs {
    /// Answer with the demo backend instead of real routers
    #[arg(long)]
    pub demo: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Store a router password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
