//! Default pool limits, timing constants, and exit codes.

use std::time::Duration;

/// Default number of in-use instances before checkouts start waiting.
pub const DEFAULT_SOFT_LIMIT: usize = 5;

/// Default time a checkout waits for a released instance once the soft limit is reached.
pub const DEFAULT_SOFT_WAIT: Duration = Duration::from_millis(10);

/// Default ceiling on instances per key.
pub const DEFAULT_HARD_LIMIT: usize = 20;

/// Default idle time after which an available instance is evicted.
pub const DEFAULT_ACTIVE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Default period between two cleanup passes over all pools.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10);

/// Longest a waiting checkout sleeps before re-checking its cancellation token.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Process exit codes for the simulator binary.
pub mod exit_codes {
    /// Every request was served.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// At least one request hit the hard limit.
    pub const ERROR_EXHAUSTED: i32 = 2;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// Run cancelled by user (Ctrl+C).
    pub const ERROR_CANCELED: i32 = 130;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_ordered() {
        assert!(DEFAULT_SOFT_LIMIT <= DEFAULT_HARD_LIMIT);
    }

    #[test]
    fn poll_interval_is_shorter_than_default_wait() {
        assert!(CANCEL_POLL_INTERVAL <= DEFAULT_SOFT_WAIT);
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            exit_codes::SUCCESS,
            exit_codes::ERROR_GENERIC,
            exit_codes::ERROR_EXHAUSTED,
            exit_codes::ERROR_CONFIG,
            exit_codes::ERROR_CANCELED,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
