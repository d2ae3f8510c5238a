//! Pool keys: a page name paired with a locale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A locale identifier such as `en` or `fr_CA`.
///
/// Tags are normalized on construction: `-` separators become `_`, the
/// language part is lower-cased and the region part upper-cased, so
/// `"fr-ca"` and `"fr_CA"` name the same pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Create a locale from a tag.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let tag = tag.trim().replace('-', "_");
        let mut parts = tag.splitn(2, '_');
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        match parts.next() {
            Some(rest) if !rest.is_empty() => Self(format!("{language}_{}", rest.to_ascii_uppercase())),
            _ => Self(language),
        }
    }

    /// The normalized tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        Self::new(&tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

/// Identifies one independent pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolKey {
    /// Logical page name.
    pub page_name: String,
    /// Locale the page instances were built for.
    pub locale: Locale,
}

impl PoolKey {
    /// Create a key.
    #[must_use]
    pub fn new(page_name: impl Into<String>, locale: Locale) -> Self {
        Self {
            page_name: page_name.into(),
            locale,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.page_name, self.locale)
    }
}
