//! Registry of per-key pools: lazy creation, routing, cleanup, invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cancel::CancellationToken;
use crate::config::PoolSettings;
use crate::error::{ConfigError, PoolError};
use crate::instance_pool::{Checkout, PageInstancePool};
use crate::key::{Locale, PoolKey};
use crate::page::{Page, PageFactory};
use crate::stats::{PoolSnapshot, PoolStats};

/// All page pools of an application, one per (page name, locale).
pub struct PagePool<F: PageFactory> {
    factory: Arc<F>,
    settings: PoolSettings,
    pools: RwLock<HashMap<PoolKey, Arc<PageInstancePool<F>>>>,
}

impl<F: PageFactory> PagePool<F> {
    /// Create a registry. Fails if `settings` do not validate.
    pub fn new(factory: Arc<F>, settings: PoolSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            factory,
            settings,
            pools: RwLock::new(HashMap::new()),
        })
    }

    /// Settings the registry was created with.
    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Check out an instance of `page_name` for `locale`, creating the pool on first use.
    pub fn checkout(
        &self,
        page_name: &str,
        locale: &Locale,
        cancel: &CancellationToken,
    ) -> Result<Checkout<F::Page>, PoolError<F::Error>> {
        self.pool_for(PoolKey::new(page_name, locale.clone()))
            .checkout(cancel)
    }

    /// Hand a page back at the end of a request.
    ///
    /// The page is detached first; a dirty page is discarded rather than
    /// returned to its pool. Pages whose pool no longer exists (for example
    /// after `invalidate`) are ignored.
    pub fn release(&self, page: &Arc<F::Page>) {
        let Some(pool) = self.existing_pool(page.name(), page.locale()) else {
            tracing::trace!(page = page.name(), "release for unknown pool ignored");
            return;
        };

        if page.detach() {
            if pool.remove(page) {
                tracing::error!(
                    key = %pool.key(),
                    "page is dirty and was discarded rather than returned to the pool"
                );
            }
        } else {
            pool.release(page);
        }
    }

    /// Discard a page, typically after an error left it in an unknown state.
    pub fn discard(&self, page: &Arc<F::Page>) {
        if let Some(pool) = self.existing_pool(page.name(), page.locale()) {
            pool.remove(page);
        }
    }

    /// Evict idle instances from every pool. Returns the number evicted.
    pub fn cleanup(&self) -> usize {
        let evicted: usize = self.pools_snapshot().iter().map(|pool| pool.cleanup()).sum();
        if evicted > 0 {
            tracing::debug!(evicted, "page pool cleanup finished");
        }
        evicted
    }

    /// Forget every pool, e.g. after templates or classes changed on disk.
    ///
    /// Available instances are dropped immediately. Instances still checked
    /// out are dropped when their request ends; releasing them is a no-op.
    pub fn invalidate(&self) {
        let old = std::mem::take(&mut *self.pools.write());
        let dropped: usize = old.values().map(|pool| pool.drain()).sum();
        tracing::info!(pools = old.len(), dropped, "page pools invalidated");
    }

    /// Number of pools created so far.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }

    /// Snapshots of every pool, ordered by key.
    #[must_use]
    pub fn snapshots(&self) -> Vec<PoolSnapshot> {
        let mut snaps: Vec<PoolSnapshot> = self
            .pools_snapshot()
            .iter()
            .map(|pool| pool.snapshot())
            .collect();
        snaps.sort_by(|a, b| a.key.cmp(&b.key));
        snaps
    }

    /// Counters summed over every pool.
    #[must_use]
    pub fn total_stats(&self) -> PoolStats {
        self.pools_snapshot()
            .iter()
            .fold(PoolStats::default(), |acc, pool| acc.merge(&pool.stats()))
    }

    fn pool_for(&self, key: PoolKey) -> Arc<PageInstancePool<F>> {
        if let Some(pool) = self.pools.read().get(&key) {
            return Arc::clone(pool);
        }

        let mut pools = self.pools.write();
        let pool = pools.entry(key).or_insert_with_key(|key| {
            let config = self.settings.config_for(&key.page_name);
            tracing::debug!(key = %key, ?config, "creating page pool");
            Arc::new(PageInstancePool::new(
                key.clone(),
                config,
                Arc::clone(&self.factory),
            ))
        });
        Arc::clone(pool)
    }

    fn existing_pool(&self, page_name: &str, locale: &Locale) -> Option<Arc<PageInstancePool<F>>> {
        let key = PoolKey::new(page_name, locale.clone());
        self.pools.read().get(&key).map(Arc::clone)
    }

    fn pools_snapshot(&self) -> Vec<Arc<PageInstancePool<F>>> {
        self.pools.read().values().map(Arc::clone).collect()
    }
}
