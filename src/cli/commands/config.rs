//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{SetupError, SetupResult};
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> SetupResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> SetupResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> SetupResult<()> {
    let path = manager.path();
    if path.exists() && !force {
        return Err(SetupError::ConfigExists(path.to_path_buf()));
    }

    manager.save(&Config::default()).await?;

    let ctx = UiContext::detect();
    ui::step_ok(&ctx, &format!("Configuration initialized at {}", path.display()));
    Ok(())
}
