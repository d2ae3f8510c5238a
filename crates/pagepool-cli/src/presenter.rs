//! CLI report presenter.

use std::fmt::Write as _;

use crate::output::{format_duration, format_number, format_percent, throughput};
use crate::report::SimulationReport;
use crate::ui;

/// Trait for presenting simulation outcomes to the user.
pub trait ReportPresenter: Send + Sync {
    /// Present a finished run.
    fn present_report(&self, report: &SimulationReport);

    /// Present an error.
    fn present_error(&self, error: &str);
}

/// Console presenter.
pub struct CliReportPresenter {
    verbose: bool,
    quiet: bool,
}

impl CliReportPresenter {
    /// Create a presenter. `quiet` wins over `verbose`.
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Render the report body as plain text.
    #[must_use]
    pub fn render(&self, report: &SimulationReport) -> String {
        if self.quiet {
            return format!(
                "served={} exhausted={} cancelled={} failed={}\n",
                report.served, report.exhausted, report.cancelled, report.failed
            );
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<28} {:>7} {:>9} {:>9} {:>9} {:>6} {:>9} {:>9} {:>9}",
            "Pool", "in-use", "available", "hits", "misses", "waits", "exhausted", "discards", "evictions"
        );
        let _ = writeln!(out, "{:-<105}", "");
        for pool in &report.pools {
            let s = &pool.stats;
            let _ = writeln!(
                out,
                "{:<28} {:>7} {:>9} {:>9} {:>9} {:>6} {:>9} {:>9} {:>9}",
                pool.key.to_string(),
                pool.in_use,
                pool.available,
                format_number(s.hits),
                format_number(s.misses),
                format_number(s.waits),
                format_number(s.exhausted),
                format_number(s.discards),
                format_number(s.evictions),
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Requests:  {}", format_number(report.requests));
        let _ = writeln!(out, "Served:    {}", format_number(report.served));
        let _ = writeln!(out, "Exhausted: {}", format_number(report.exhausted));
        let _ = writeln!(out, "Cancelled: {}", format_number(report.cancelled));
        let _ = writeln!(out, "Failed:    {}", format_number(report.failed));
        let _ = writeln!(out, "Duration:  {}", format_duration(report.elapsed));

        if self.verbose {
            let _ = writeln!(out, "Hit rate:  {}", format_percent(report.totals.hit_rate()));
            let _ = writeln!(
                out,
                "Throughput: {:.1} req/s",
                throughput(report.served, report.elapsed)
            );
            let _ = writeln!(
                out,
                "Constructed: {} (failures: {})",
                format_number(report.totals.misses),
                format_number(report.totals.construction_failures)
            );
        }
        out
    }
}

impl ReportPresenter for CliReportPresenter {
    fn present_report(&self, report: &SimulationReport) {
        if !self.quiet {
            ui::print_header("Page pools");
        }
        print!("{}", self.render(report));
        if self.quiet {
            return;
        }
        if report.all_served() {
            ui::print_success("all requests served");
        } else {
            ui::print_warning(&format!(
                "{} of {} requests not served",
                report.requests - report.served,
                report.requests
            ));
        }
    }

    fn present_error(&self, error: &str) {
        ui::print_error(error);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pagepool_core::{Locale, PoolKey, PoolSnapshot, PoolStats};

    use super::*;

    fn sample() -> SimulationReport {
        SimulationReport {
            requests: 1_200,
            served: 1_198,
            exhausted: 2,
            elapsed: Duration::from_millis(250),
            pools: vec![PoolSnapshot {
                key: PoolKey::new("Index", Locale::new("en")),
                in_use: 0,
                available: 4,
                stats: PoolStats {
                    hits: 1_194,
                    misses: 4,
                    waits: 10,
                    exhausted: 2,
                    ..Default::default()
                },
            }],
            totals: PoolStats {
                hits: 1_194,
                misses: 4,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn quiet_mode_is_one_line() {
        let text = CliReportPresenter::new(false, true).render(&sample());
        assert_eq!(text, "served=1198 exhausted=2 cancelled=0 failed=0\n");
    }

    #[test]
    fn table_lists_each_pool() {
        let text = CliReportPresenter::new(false, false).render(&sample());
        assert!(text.contains("Index (en)"));
        assert!(text.contains("1,194"));
        assert!(text.contains("Served:    1,198"));
        assert!(!text.contains("Hit rate"));
    }

    #[test]
    fn verbose_adds_rates() {
        let text = CliReportPresenter::new(true, false).render(&sample());
        assert!(text.contains("Hit rate:"));
        assert!(text.contains("req/s"));
    }

    #[test]
    fn present_does_not_panic() {
        let presenter = CliReportPresenter::new(false, false);
        presenter.present_report(&sample());
        presenter.present_error("boom");
    }
}
