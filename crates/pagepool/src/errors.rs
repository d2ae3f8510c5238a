//! Error handling and exit codes.

use pagepool_cli::SimulationReport;
use pagepool_core::constants::exit_codes;
use pagepool_core::ConfigError;

/// Exit code for an error that aborted the run before it finished.
#[must_use]
pub fn handle_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        exit_codes::ERROR_CONFIG
    } else {
        exit_codes::ERROR_GENERIC
    }
}

/// Exit code summarizing a finished run.
#[must_use]
pub fn report_exit_code(report: &SimulationReport) -> i32 {
    if report.cancelled > 0 {
        exit_codes::ERROR_CANCELED
    } else if report.exhausted > 0 {
        exit_codes::ERROR_EXHAUSTED
    } else if report.failed > 0 {
        exit_codes::ERROR_GENERIC
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        let config = anyhow::Error::new(ConfigError::ZeroCleanupInterval);
        assert_eq!(handle_error(&config), 4);
        assert_eq!(handle_error(&anyhow::anyhow!("thread panicked")), 1);
    }

    #[test]
    fn report_codes() {
        let mut report = SimulationReport {
            requests: 10,
            served: 10,
            ..Default::default()
        };
        assert_eq!(report_exit_code(&report), 0);

        report.served = 8;
        report.failed = 2;
        assert_eq!(report_exit_code(&report), 1);

        report.exhausted = 1;
        assert_eq!(report_exit_code(&report), 2);

        report.cancelled = 1;
        assert_eq!(report_exit_code(&report), 130);
    }
}
