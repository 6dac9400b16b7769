//! setup-coursier - Coursier installer for CI runners
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use setup_coursier::actions;
use setup_coursier::cli::{Cli, Commands, LogFormat};
use setup_coursier::config::{self, ConfigManager};
use setup_coursier::error::SetupResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SetupResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let reports_workflow_errors = matches!(cli.command, Commands::Install(_));
    let result = dispatch(cli).await;
    if reports_workflow_errors {
        if let Err(e) = &result {
            actions::commands::error(&e.to_string());
        }
    }
    result
}

async fn dispatch(cli: Cli) -> SetupResult<()> {
    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = manager.load().await?;
    let cache_root = config::cache_root(cli.cache_dir.as_deref(), &config);
    debug!("Tool cache root: {}", cache_root.display());

    match cli.command {
        Commands::Install(args) => {
            setup_coursier::cli::commands::install(args, &config, &cache_root).await
        }
        Commands::Platform(args) => setup_coursier::cli::commands::platform(args, &config).await,
        Commands::Cache(args) => setup_coursier::cli::commands::cache(args, &cache_root).await,
        Commands::Config(args) => {
            setup_coursier::cli::commands::config(args, &manager, &config).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; runner debug logging counts as -vv
fn init_logging(verbose: u8, format: LogFormat) {
    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
    let level = if runner_debug || verbose >= 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::new(format!("setup_coursier={level}"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
