//! # pagepool-core
//!
//! Bounded, concurrent pools of expensive page instances, one pool per
//! (page name, locale). Checkouts wait on a soft limit, fail on a hard limit,
//! and idle instances are evicted by a periodic cleanup.
//!
//! # Example
//! ```
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! use pagepool_core::{CancellationToken, Locale, Page, PageFactory, PagePool, PoolSettings};
//!
//! struct Greeting {
//!     locale: Locale,
//! }
//!
//! impl Page for Greeting {
//!     fn name(&self) -> &str {
//!         "Greeting"
//!     }
//!     fn locale(&self) -> &Locale {
//!         &self.locale
//!     }
//! }
//!
//! struct Loader;
//!
//! impl PageFactory for Loader {
//!     type Page = Greeting;
//!     type Error = Infallible;
//!
//!     fn create(&self, _name: &str, locale: &Locale) -> Result<Greeting, Infallible> {
//!         Ok(Greeting { locale: locale.clone() })
//!     }
//! }
//!
//! let pool = PagePool::new(Arc::new(Loader), PoolSettings::default()).unwrap();
//! let cancel = CancellationToken::new();
//! let page = pool
//!     .checkout("Greeting", &Locale::new("en"), &cancel)
//!     .unwrap()
//!     .page()
//!     .unwrap();
//! pool.release(&page);
//!
//! let again = pool
//!     .checkout("Greeting", &Locale::new("en"), &cancel)
//!     .unwrap()
//!     .page()
//!     .unwrap();
//! assert!(Arc::ptr_eq(&page, &again));
//! ```
#![warn(missing_docs)]

pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod instance_pool;
pub mod key;
pub mod page;
pub mod registry;
pub mod scheduler;
pub mod stats;

// Re-exports
pub use cancel::CancellationToken;
pub use config::{PoolConfig, PoolOverride, PoolSettings};
pub use constants::exit_codes;
pub use error::{ConfigError, PoolError};
pub use instance_pool::{Checkout, PageInstancePool};
pub use key::{Locale, PoolKey};
pub use page::{Page, PageFactory};
pub use registry::PagePool;
pub use scheduler::CleanupScheduler;
pub use stats::{PoolSnapshot, PoolStats};
