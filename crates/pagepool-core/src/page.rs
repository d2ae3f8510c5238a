//! The page abstraction and the factory that builds page instances.

use crate::key::Locale;

/// A pooled, stateful page instance.
///
/// Pools hand pages out as `Arc<P>` and track them by pointer identity, so
/// two pages that compare equal are still distinct pool entries.
pub trait Page: Send + Sync {
    /// Logical page name this instance was built for.
    fn name(&self) -> &str;

    /// Locale this instance was built for.
    fn locale(&self) -> &Locale;

    /// Reset per-request state before the page goes back into its pool.
    ///
    /// Returns `true` if the page is dirty: its state could not be reset and
    /// it must be discarded instead of reused.
    fn detach(&self) -> bool {
        false
    }
}

/// Builds page instances for a (page name, locale) pair.
///
/// Construction is assumed to be expensive and is always invoked without any
/// pool lock held. Implementations must tolerate concurrent calls, including
/// concurrent calls for the same page and locale.
pub trait PageFactory: Send + Sync {
    /// The page type produced.
    type Page: Page;

    /// Error raised when construction fails. Passed to callers unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct a fresh page instance.
    fn create(&self, page_name: &str, locale: &Locale) -> Result<Self::Page, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        locale: Locale,
    }

    impl Page for Plain {
        fn name(&self) -> &str {
            "Plain"
        }

        fn locale(&self) -> &Locale {
            &self.locale
        }
    }

    #[test]
    fn detach_defaults_to_clean() {
        let page = Plain {
            locale: Locale::new("en"),
        };
        assert!(!page.detach());
        assert_eq!(page.name(), "Plain");
        assert_eq!(page.locale().as_str(), "en");
    }
}
