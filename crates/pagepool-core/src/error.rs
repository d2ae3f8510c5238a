//! Error types for pool checkout and configuration.

use crate::key::Locale;

/// Error returned by a checkout.
///
/// `E` is the page factory's own error type; construction failures are
/// passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum PoolError<E> {
    /// The hard limit was reached and no instance became available in time.
    #[error(
        "page pool for '{page}' (locale {locale}) is exhausted: hard limit of {hard_limit} instances reached"
    )]
    Exhausted {
        /// Page name of the exhausted pool.
        page: String,
        /// Locale of the exhausted pool.
        locale: Locale,
        /// Configured hard limit.
        hard_limit: usize,
    },

    /// The page factory failed.
    #[error(transparent)]
    Construction(E),
}

impl<E> PoolError<E> {
    /// Whether this is a hard-limit exhaustion.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// The factory error, if construction failed.
    #[must_use]
    pub fn construction(&self) -> Option<&E> {
        match self {
            Self::Construction(e) => Some(e),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Error raised while loading or validating pool configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `hard_limit` is below `soft_limit`.
    #[error("hard limit ({hard}) must not be below soft limit ({soft}){}", scope_suffix(.page.as_deref()))]
    HardBelowSoft {
        /// Page override the bad values came from, or `None` for the defaults.
        page: Option<String>,
        /// Configured soft limit.
        soft: usize,
        /// Configured hard limit.
        hard: usize,
    },

    /// Cleanup interval of zero would spin the scheduler.
    #[error("cleanup interval must be greater than zero")]
    ZeroCleanupInterval,

    /// A duration string could not be parsed.
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    /// Reading a settings file failed.
    #[error("failed to read pool settings: {0}")]
    Io(#[from] std::io::Error),

    /// A settings file was not valid JSON for `PoolSettings`.
    #[error("failed to parse pool settings: {0}")]
    Parse(#[from] serde_json::Error),
}

fn scope_suffix(page: Option<&str>) -> String {
    page.map(|p| format!(" for page '{p}'")).unwrap_or_default()
}
