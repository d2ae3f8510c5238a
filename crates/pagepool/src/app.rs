//! Application entry point and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};

use pagepool_cli::presenter::{CliReportPresenter, ReportPresenter};
use pagepool_core::constants::exit_codes;
use pagepool_core::{CancellationToken, CleanupScheduler, PagePool};

use crate::config::AppConfig;
use crate::errors::report_exit_code;
use crate::simulation::{run_simulation, SimulationPlan, SyntheticFactory};

/// Run the application and return the process exit code.
pub fn run(config: &AppConfig) -> Result<i32> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        pagepool_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(exit_codes::SUCCESS);
    }

    run_cli(config)
}

fn run_cli(config: &AppConfig) -> Result<i32> {
    let settings = config.pool_settings().context("invalid pool configuration")?;
    let plan = SimulationPlan {
        pages: config.page_list(),
        locales: config.locale_list(),
        threads: config.threads,
        requests_per_thread: config.requests,
        render_time: config.render_duration().context("invalid --render-time")?,
        dirty_rate: config.dirty_rate,
    };
    if plan.pages.is_empty() || plan.locales.is_empty() {
        anyhow::bail!("at least one page and one locale are required");
    }

    let factory = SyntheticFactory::new(
        config.construct_duration().context("invalid --construct-time")?,
        config.broken.iter().cloned(),
    );
    let pool = Arc::new(PagePool::new(Arc::new(factory), settings)?);
    tracing::info!(
        pages = plan.pages.len(),
        locales = plan.locales.len(),
        threads = plan.threads,
        requests = plan.requests_per_thread,
        "starting simulation"
    );

    let mut scheduler =
        CleanupScheduler::for_pool(&pool).context("failed to start cleanup thread")?;

    let cancel = CancellationToken::new();
    ctrlc_handler(cancel.clone());

    let report = run_simulation(&pool, &plan, &cancel);
    scheduler.stop();

    let presenter = CliReportPresenter::new(config.verbose, config.quiet);
    presenter.present_report(&report);

    Ok(report_exit_code(&report))
}

fn ctrlc_handler(cancel: CancellationToken) {
    if let Err(e) = ctrlc::set_handler(move || {
        cancel.cancel();
    }) {
        tracing::warn!(error = %e, "could not install Ctrl+C handler");
    }
}
