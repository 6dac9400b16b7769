//! Install command - Coursier, then a JVM, then apps

use crate::actions::ActionsEnvironment;
use crate::cli::args::{non_blank, InstallArgs};
use crate::config::{self, Config};
use crate::error::SetupResult;
use crate::install::{HttpFetcher, Installer};
use crate::orchestrator::{HostEnv, Inputs, Orchestrator, RunSummary};
use crate::runner::{Coursier, ProcessRunner};
use crate::ui::{self, UiContext};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Execute the install command
///
/// Failures are reported as workflow errors by the caller, which also
/// covers errors raised before this runs, such as an invalid config file.
pub async fn execute(args: InstallArgs, config: &Config, cache_root: &Path) -> SetupResult<()> {
    let inputs = inputs_from_args(&args, config)?;
    debug!("Inputs: {:?}", inputs);

    let ctx = UiContext::detect();
    let work_dir = config::temp_dir(args.temp_dir.as_deref(), config);
    let installer = Installer::new(
        Arc::new(HttpFetcher::new(ctx.clone())),
        work_dir,
        config.coursier.base_url.clone(),
    );

    let mut orchestrator = Orchestrator::new(
        cache_root,
        installer,
        Arc::new(ProcessRunner::new()),
        ActionsEnvironment::from_env(),
    );
    let summary = orchestrator.run(&inputs, &HostEnv::capture()).await?;

    print_summary(&ctx, &summary);
    Ok(())
}

fn inputs_from_args(args: &InstallArgs, config: &Config) -> SetupResult<Inputs> {
    let cs_args = match non_blank(args.cs_args.clone()) {
        Some(raw) => Coursier::parse_extra_args(&raw)?,
        None => Vec::new(),
    };

    Ok(Inputs {
        version: non_blank(args.version.clone())
            .unwrap_or_else(|| config.coursier.version.clone()),
        cs_args,
        jvm: non_blank(args.jvm.clone()),
        apps: non_blank(args.apps.clone())
            .map(|raw| Inputs::parse_apps(&raw))
            .unwrap_or_default(),
    })
}

fn print_summary(ctx: &UiContext, summary: &RunSummary) {
    ui::section(ctx, "Summary");
    ui::key_value(ctx, "Platform", &summary.platform.to_string());

    let source = if summary.downloaded { "downloaded" } else { "cached" };
    ui::step_ok(
        ctx,
        &format!(
            "Coursier {} ({}) in {}",
            summary.cs_version,
            source,
            summary.cs_dir.display()
        ),
    );

    match &summary.java_home {
        Some(home) => ui::step_ok(ctx, &format!("JVM installed in {}", home)),
        None => ui::step_info(ctx, "Kept existing JAVA_HOME"),
    }

    if summary.apps.is_empty() {
        ui::step_info(ctx, "No apps requested");
    } else {
        ui::step_ok(ctx, &format!("Installed apps: {}", summary.apps.join(" ")));
    }
}
