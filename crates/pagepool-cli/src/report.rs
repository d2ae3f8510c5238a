//! Outcome of a load simulation run.

use std::time::Duration;

use pagepool_core::{PoolSnapshot, PoolStats};

/// Aggregated result of driving a pool registry with synthetic requests.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    /// Requests attempted across all workers.
    pub requests: u64,
    /// Requests that obtained a page and rendered it.
    pub served: u64,
    /// Requests that failed on a hard limit.
    pub exhausted: u64,
    /// Requests abandoned because the run was cancelled.
    pub cancelled: u64,
    /// Requests that failed because the page could not be constructed.
    pub failed: u64,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
    /// Final state of every pool, ordered by key.
    pub pools: Vec<PoolSnapshot>,
    /// Counters summed over every pool.
    pub totals: PoolStats,
}

impl SimulationReport {
    /// Whether every attempted request was served.
    #[must_use]
    pub fn all_served(&self) -> bool {
        self.served == self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_served_compares_counts() {
        let mut report = SimulationReport {
            requests: 4,
            served: 4,
            ..Default::default()
        };
        assert!(report.all_served());
        report.served = 3;
        report.exhausted = 1;
        assert!(!report.all_served());
    }
}
