//! Page instance pool load simulator.

use pagepool_cli::{CliReportPresenter, ReportPresenter};
use pagepool_lib::{app, config, errors};

fn main() {
    let config = config::AppConfig::parse();

    // Initialize tracing
    let default_level = if config.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    let code = match app::run(&config) {
        Ok(code) => code,
        Err(err) => {
            let presenter = CliReportPresenter::new(config.verbose, config.quiet);
            presenter.present_error(&format!("{err:#}"));
            errors::handle_error(&err)
        }
    };
    std::process::exit(code);
}
