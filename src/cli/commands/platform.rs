//! Platform command - show what would be downloaded for a host

use crate::cli::args::{non_blank, PlatformArgs};
use crate::config::Config;
use crate::error::SetupResult;
use crate::platform::Platform;
use crate::ui::{self, UiContext};

/// Execute the platform command
pub async fn execute(args: PlatformArgs, config: &Config) -> SetupResult<()> {
    let platform = match non_blank(args.target) {
        Some(target) => target.parse::<Platform>()?,
        None => Platform::current()?,
    };
    let version = non_blank(args.version).unwrap_or_else(|| config.coursier.version.clone());

    let ctx = UiContext::detect();
    ui::section(&ctx, "Platform");
    ui::key_value(&ctx, "Platform", &platform.to_string());
    ui::key_value(&ctx, "Version", &version);
    ui::key_value(&ctx, "Asset", &platform.asset_name());
    ui::key_value(&ctx, "Binary", platform.binary_name());
    ui::key_value(
        &ctx,
        "URL",
        &platform.download_url(&config.coursier.base_url, &version),
    );

    Ok(())
}
