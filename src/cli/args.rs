//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// setup-coursier - Install Coursier, a JVM and apps on CI runners
///
/// Downloads the Coursier launcher into the runner tool cache, makes a JVM
/// available through JAVA_HOME and installs apps from the contrib channel.
#[derive(Parser, Debug)]
#[command(name = "setup-coursier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SETUP_COURSIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tool cache root
    #[arg(long, global = true, env = "RUNNER_TOOL_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install Coursier, then a JVM, then apps
    Install(InstallArgs),

    /// Show the resolved platform and release asset
    Platform(PlatformArgs),

    /// Inspect the tool cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the install command
///
/// Each flag also reads the matching action input variable.
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct InstallArgs {
    /// Coursier version to install
    #[arg(long, env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// Extra arguments passed to every cs invocation
    #[arg(long, env = "INPUT_CS-ARGS", allow_hyphen_values = true)]
    pub cs_args: Option<String>,

    /// JVM to install, e.g. temurin:17 (default: keep JAVA_HOME or install cs's default)
    #[arg(long, env = "INPUT_JVM")]
    pub jvm: Option<String>,

    /// Space-separated apps to install, e.g. "sbt scalafmt"
    #[arg(long, env = "INPUT_APPS")]
    pub apps: Option<String>,

    /// Scratch directory for downloads
    #[arg(long, env = "RUNNER_TEMP", hide = true)]
    pub temp_dir: Option<PathBuf>,
}

/// Arguments for the platform command
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct PlatformArgs {
    /// Platform as <os>-<arch> (defaults to the current host)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Coursier version used for the download URL
    #[arg(long)]
    pub version: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached tools
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the tool cache root
    Path,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Treat blank values as absent, the way action inputs arrive when unset
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
