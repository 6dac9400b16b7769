//! Cache command - inspect the tool cache

use crate::cache::{CacheEntry, ToolCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::error::SetupResult;
use crate::ui::{self, UiContext};
use console::style;
use std::path::Path;

/// Execute the cache command
pub async fn execute(args: CacheArgs, cache_root: &Path) -> SetupResult<()> {
    match args.action {
        CacheAction::List { format } => list_entries(cache_root, format),
        CacheAction::Path => {
            println!("{}", cache_root.display());
            Ok(())
        }
    }
}

fn list_entries(cache_root: &Path, format: OutputFormat) -> SetupResult<()> {
    let entries = ToolCache::new(cache_root, std::env::consts::ARCH).entries()?;

    if entries.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(
                    &ctx,
                    &format!("No cached tools in {}", cache_root.display()),
                );
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.binary_path().display());
            }
        }
    }

    Ok(())
}

fn print_table(entries: &[CacheEntry]) {
    println!(
        "{:<8} {:<28} {:<10} {:<18} {:<14}",
        style("TOOL").bold(),
        style("VERSION").bold(),
        style("ARCH").bold(),
        style("CACHED").bold(),
        style("SHA256").bold()
    );
    println!("{}", "-".repeat(80));

    for entry in entries {
        let cached = entry.cached_at.format("%Y-%m-%d %H:%M").to_string();
        let digest: String = entry.sha256.chars().take(12).collect();
        println!(
            "{:<8} {:<28} {:<10} {:<18} {:<14}",
            entry.tool, entry.version, entry.arch, cached, digest
        );
    }

    println!();
    println!("Total: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
}
