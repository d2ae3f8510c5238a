//! Bounded pool of interchangeable page instances for one (page, locale) key.
//!
//! Instances move between two lists guarded by one mutex: `available` (idle,
//! ready for reuse) and `in_use` (checked out by a request). A checkout that
//! finds nothing available constructs a new instance while the in-use count
//! is below the soft limit. Past the soft limit it waits on a condition
//! variable for a release, up to the soft wait measured from the start of
//! the call. After the wait it constructs only if the in-use count is still
//! below the hard limit, and fails with `PoolError::Exhausted` otherwise.
//!
//! The factory is always called with the lock released. Several threads may
//! therefore pass the limit checks together and briefly push the pool past
//! its soft or hard limit; this is accepted in exchange for never serializing
//! construction.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::cancel::CancellationToken;
use crate::config::PoolConfig;
use crate::constants::CANCEL_POLL_INTERVAL;
use crate::error::PoolError;
use crate::key::PoolKey;
use crate::page::PageFactory;
use crate::stats::{AtomicPoolStats, PoolSnapshot, PoolStats};

/// Outcome of a checkout that did not fail.
#[derive(Debug)]
pub enum Checkout<P> {
    /// A page instance, now owned by the caller until released or removed.
    Page(Arc<P>),
    /// The caller's token was cancelled while waiting; no instance was taken.
    Cancelled,
}

impl<P> Checkout<P> {
    /// The page, if one was handed out.
    #[must_use]
    pub fn page(self) -> Option<Arc<P>> {
        match self {
            Self::Page(page) => Some(page),
            Self::Cancelled => None,
        }
    }

    /// Whether the wait was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

struct CachedEntry<P> {
    page: Arc<P>,
    last_access: Instant,
}

impl<P> CachedEntry<P> {
    fn new(page: Arc<P>) -> Self {
        Self {
            page,
            last_access: Instant::now(),
        }
    }
}

struct PoolState<P> {
    available: Vec<CachedEntry<P>>,
    in_use: Vec<CachedEntry<P>>,
}

impl<P> PoolState<P> {
    /// Move the most recently released entry to `in_use`.
    fn promote(&mut self) -> Option<Arc<P>> {
        let entry = self.available.pop()?;
        let page = Arc::clone(&entry.page);
        self.in_use.push(entry);
        Some(page)
    }

    fn take_in_use(&mut self, page: &Arc<P>) -> Option<CachedEntry<P>> {
        let idx = self
            .in_use
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.page, page))?;
        Some(self.in_use.remove(idx))
    }
}

/// Pool of page instances for a single key.
pub struct PageInstancePool<F: PageFactory> {
    key: PoolKey,
    config: PoolConfig,
    factory: Arc<F>,
    state: Mutex<PoolState<F::Page>>,
    released: Condvar,
    stats: AtomicPoolStats,
}

impl<F: PageFactory> PageInstancePool<F> {
    /// Create an empty pool. Instances are constructed on demand.
    #[must_use]
    pub fn new(key: PoolKey, config: PoolConfig, factory: Arc<F>) -> Self {
        Self {
            key,
            config,
            factory,
            state: Mutex::new(PoolState {
                available: Vec::new(),
                in_use: Vec::new(),
            }),
            released: Condvar::new(),
            stats: AtomicPoolStats::new(),
        }
    }

    /// The key this pool serves.
    #[must_use]
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// The limits this pool was created with.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Check out a page instance.
    ///
    /// Returns `Checkout::Cancelled` if `cancel` fires while the call is
    /// waiting on the soft limit. A token cancelled beforehand only matters
    /// when the call would have to wait.
    pub fn checkout(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Checkout<F::Page>, PoolError<F::Error>> {
        // A soft wait too large to represent as an instant never expires.
        let deadline = Instant::now().checked_add(self.config.soft_wait);
        let mut state = self.state.lock();

        if let Some(page) = state.promote() {
            self.stats.record_hit();
            return Ok(Checkout::Page(page));
        }

        if state.in_use.len() >= self.config.soft_limit {
            self.stats.record_wait();
            loop {
                if cancel.is_cancelled() {
                    self.stats.record_cancelled();
                    tracing::debug!(key = %self.key, "checkout cancelled while waiting");
                    return Ok(Checkout::Cancelled);
                }
                let now = Instant::now();
                if deadline.is_some_and(|d| now >= d) {
                    break;
                }
                let poll_at = now + CANCEL_POLL_INTERVAL;
                let wake_at = deadline.map_or(poll_at, |d| d.min(poll_at));
                self.released.wait_until(&mut state, wake_at);
                if let Some(page) = state.promote() {
                    self.stats.record_hit();
                    return Ok(Checkout::Page(page));
                }
            }

            if state.in_use.len() >= self.config.hard_limit {
                self.stats.record_exhausted();
                tracing::warn!(
                    key = %self.key,
                    in_use = state.in_use.len(),
                    hard_limit = self.config.hard_limit,
                    "page pool exhausted"
                );
                return Err(PoolError::Exhausted {
                    page: self.key.page_name.clone(),
                    locale: self.key.locale.clone(),
                    hard_limit: self.config.hard_limit,
                });
            }
        }

        self.construct(&mut state)
    }

    fn construct(
        &self,
        state: &mut MutexGuard<'_, PoolState<F::Page>>,
    ) -> Result<Checkout<F::Page>, PoolError<F::Error>> {
        tracing::debug!(key = %self.key, in_use = state.in_use.len(), "constructing page instance");
        let created = MutexGuard::unlocked(state, || {
            self.factory.create(&self.key.page_name, &self.key.locale)
        });

        match created {
            Ok(page) => {
                let page = Arc::new(page);
                state.in_use.push(CachedEntry::new(Arc::clone(&page)));
                self.stats.record_miss();
                Ok(Checkout::Page(page))
            }
            Err(e) => {
                self.stats.record_construction_failure();
                tracing::debug!(key = %self.key, error = %e, "page construction failed");
                Err(PoolError::Construction(e))
            }
        }
    }

    /// Return a checked-out instance for reuse and wake one waiting checkout.
    ///
    /// Returns `false`, changing nothing, if the instance is not checked out
    /// from this pool.
    pub fn release(&self, page: &Arc<F::Page>) -> bool {
        let mut state = self.state.lock();
        let Some(mut entry) = state.take_in_use(page) else {
            tracing::trace!(key = %self.key, "release of untracked page ignored");
            return false;
        };
        entry.last_access = Instant::now();
        state.available.push(entry);
        drop(state);

        self.stats.record_release();
        self.released.notify_one();
        true
    }

    /// Permanently discard a checked-out instance.
    ///
    /// Returns `false`, changing nothing, if the instance is not checked out
    /// from this pool.
    pub fn remove(&self, page: &Arc<F::Page>) -> bool {
        if self.state.lock().take_in_use(page).is_none() {
            tracing::trace!(key = %self.key, "removal of untracked page ignored");
            return false;
        }
        self.stats.record_discard();
        true
    }

    /// Evict available instances idle for longer than the active window.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    /// Evict available instances last released before `now - active_window`.
    pub fn cleanup_at(&self, now: Instant) -> usize {
        let Some(cutoff) = now.checked_sub(self.config.active_window) else {
            return 0;
        };
        let mut state = self.state.lock();
        let before = state.available.len();
        state.available.retain(|entry| entry.last_access >= cutoff);
        let evicted = before - state.available.len();
        drop(state);

        if evicted > 0 {
            self.stats.record_evictions(evicted as u64);
            tracing::debug!(key = %self.key, evicted, "evicted idle page instances");
        }
        evicted
    }

    /// Drop every available instance. Checked-out instances are untouched.
    pub fn drain(&self) -> usize {
        let drained = std::mem::take(&mut self.state.lock().available).len();
        self.stats.record_evictions(drained as u64);
        drained
    }

    /// Current list sizes and counters.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock();
        PoolSnapshot {
            key: self.key.clone(),
            in_use: state.in_use.len(),
            available: state.available.len(),
            stats: self.stats.snapshot(),
        }
    }

    /// Counters only, without taking the pool lock.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Reset the counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}
