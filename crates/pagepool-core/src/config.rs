//! Pool configuration: per-pool limits, per-page overrides, and settings files.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTIVE_WINDOW, DEFAULT_CLEANUP_INTERVAL, DEFAULT_HARD_LIMIT, DEFAULT_SOFT_LIMIT,
    DEFAULT_SOFT_WAIT,
};
use crate::error::ConfigError;

/// Limits for a single pool. Immutable once the pool is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// In-use count at which checkouts wait before constructing.
    pub soft_limit: usize,
    /// Longest a checkout waits once the soft limit is reached.
    #[serde(rename = "soft_wait_ms", with = "duration_ms")]
    pub soft_wait: Duration,
    /// Ceiling on instances per key.
    pub hard_limit: usize,
    /// Idle time after which an available instance is evicted.
    #[serde(rename = "active_window_ms", with = "duration_ms")]
    pub active_window: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            soft_limit: DEFAULT_SOFT_LIMIT,
            soft_wait: DEFAULT_SOFT_WAIT,
            hard_limit: DEFAULT_HARD_LIMIT,
            active_window: DEFAULT_ACTIVE_WINDOW,
        }
    }
}

impl PoolConfig {
    /// Check that the hard limit is not below the soft limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_scoped(None)
    }

    fn validate_scoped(&self, page: Option<&str>) -> Result<(), ConfigError> {
        if self.hard_limit < self.soft_limit {
            return Err(ConfigError::HardBelowSoft {
                page: page.map(str::to_string),
                soft: self.soft_limit,
                hard: self.hard_limit,
            });
        }
        Ok(())
    }
}

/// Partial per-page override; unset fields inherit from the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOverride {
    /// Override for `soft_limit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_limit: Option<usize>,
    /// Override for `soft_wait`.
    #[serde(
        rename = "soft_wait_ms",
        with = "opt_duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub soft_wait: Option<Duration>,
    /// Override for `hard_limit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard_limit: Option<usize>,
    /// Override for `active_window`.
    #[serde(
        rename = "active_window_ms",
        with = "opt_duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_window: Option<Duration>,
}

impl PoolOverride {
    /// Apply this override on top of `base`.
    #[must_use]
    pub fn apply(&self, base: PoolConfig) -> PoolConfig {
        PoolConfig {
            soft_limit: self.soft_limit.unwrap_or(base.soft_limit),
            soft_wait: self.soft_wait.unwrap_or(base.soft_wait),
            hard_limit: self.hard_limit.unwrap_or(base.hard_limit),
            active_window: self.active_window.unwrap_or(base.active_window),
        }
    }
}

/// Settings for a whole registry of pools.
///
/// ```
/// use pagepool_core::config::PoolSettings;
///
/// let settings = PoolSettings::from_json_str(
///     r#"{ "defaults": { "soft_limit": 2, "hard_limit": 8 },
///          "pages": { "Admin": { "hard_limit": 2 } } }"#,
/// ).unwrap();
/// assert_eq!(settings.config_for("Index").hard_limit, 8);
/// assert_eq!(settings.config_for("Admin").hard_limit, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Limits applied to every page without an override.
    pub defaults: PoolConfig,
    /// Period between two cleanup passes.
    #[serde(rename = "cleanup_interval_ms", with = "duration_ms")]
    pub cleanup_interval: Duration,
    /// Per-page overrides, keyed by page name.
    pub pages: HashMap<String, PoolOverride>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            defaults: PoolConfig::default(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            pages: HashMap::new(),
        }
    }
}

impl PoolSettings {
    /// Effective limits for a page.
    #[must_use]
    pub fn config_for(&self, page_name: &str) -> PoolConfig {
        match self.pages.get(page_name) {
            Some(over) => over.apply(self.defaults),
            None => self.defaults,
        }
    }

    /// Validate the defaults, every effective override, and the cleanup interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.defaults.validate()?;
        for name in self.pages.keys() {
            self.config_for(name).validate_scoped(Some(name))?;
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::ZeroCleanupInterval);
        }
        Ok(())
    }

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), pages = settings.pages.len(), "loaded pool settings");
        Ok(settings)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a duration string like "10ms", "30s", "5m", "1h".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let trimmed = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    let parse = |n: &str| n.trim().parse::<u64>().map_err(|_| invalid());

    if let Some(ms) = trimmed.strip_suffix("ms") {
        Ok(Duration::from_millis(parse(ms)?))
    } else if let Some(secs) = trimmed.strip_suffix('s') {
        Ok(Duration::from_secs(parse(secs)?))
    } else if let Some(mins) = trimmed.strip_suffix('m') {
        let n = parse(mins)?.checked_mul(60).ok_or_else(invalid)?;
        Ok(Duration::from_secs(n))
    } else if let Some(hours) = trimmed.strip_suffix('h') {
        let n = parse(hours)?.checked_mul(3600).ok_or_else(invalid)?;
        Ok(Duration::from_secs(n))
    } else {
        Ok(Duration::from_secs(parse(trimmed)?))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = PoolConfig::default();
        assert_eq!(config.soft_limit, 5);
        assert_eq!(config.soft_wait, Duration::from_millis(10));
        assert_eq!(config.hard_limit, 20);
        assert_eq!(config.active_window, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hard_below_soft_is_rejected() {
        let config = PoolConfig {
            soft_limit: 4,
            hard_limit: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HardBelowSoft { soft: 4, hard: 3, page: None })
        ));
    }

    #[test]
    fn zero_limits_are_valid() {
        let config = PoolConfig {
            soft_limit: 0,
            hard_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn override_inherits_unset_fields() {
        let mut settings = PoolSettings::default();
        settings.pages.insert(
            "Admin".into(),
            PoolOverride {
                hard_limit: Some(7),
                ..Default::default()
            },
        );
        let admin = settings.config_for("Admin");
        assert_eq!(admin.hard_limit, 7);
        assert_eq!(admin.soft_limit, DEFAULT_SOFT_LIMIT);
        assert_eq!(settings.config_for("Index"), PoolConfig::default());
    }

    #[test]
    fn invalid_override_names_the_page() {
        let mut settings = PoolSettings::default();
        settings.pages.insert(
            "Admin".into(),
            PoolOverride {
                hard_limit: Some(1),
                ..Default::default()
            },
        );
        match settings.validate() {
            Err(ConfigError::HardBelowSoft { page, .. }) => assert_eq!(page.as_deref(), Some("Admin")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn zero_cleanup_interval_is_rejected() {
        let settings = PoolSettings {
            cleanup_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ZeroCleanupInterval)
        ));
    }

    #[test]
    fn json_uses_millisecond_fields() {
        let settings = PoolSettings::from_json_str(
            r#"{
                "defaults": { "soft_limit": 1, "soft_wait_ms": 250, "hard_limit": 3, "active_window_ms": 60000 },
                "cleanup_interval_ms": 500,
                "pages": { "Login": { "soft_wait_ms": 5 } }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.defaults.soft_wait, Duration::from_millis(250));
        assert_eq!(settings.defaults.active_window, Duration::from_secs(60));
        assert_eq!(settings.cleanup_interval, Duration::from_millis(500));
        let login = settings.config_for("Login");
        assert_eq!(login.soft_wait, Duration::from_millis(5));
        assert_eq!(login.hard_limit, 3);
    }

    #[test]
    fn empty_json_is_all_defaults() {
        let settings = PoolSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, PoolSettings::default());
    }

    #[test]
    fn json_string_roundtrips_through_from_json_str() {
        let mut settings = PoolSettings::default();
        settings.pages.insert(
            "Index".into(),
            PoolOverride {
                soft_limit: Some(2),
                ..Default::default()
            },
        );
        let json = settings.to_json_string().unwrap();
        assert!(json.contains("soft_wait_ms"));
        assert_eq!(PoolSettings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PoolSettings::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");
        std::fs::write(&path, r#"{ "defaults": { "hard_limit": 9 } }"#).unwrap();
        let settings = PoolSettings::load(&path).unwrap();
        assert_eq!(settings.defaults.hard_limit, 9);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PoolSettings::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn parse_duration_ms() {
        assert_eq!(parse_duration("1ms").unwrap(), Duration::from_millis(1));
        assert_eq!(parse_duration(" 500ms ").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-5s").is_err());
    }
}
