//! Background thread that runs pool cleanup at a fixed interval.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, Sender};

use crate::page::PageFactory;
use crate::registry::PagePool;

/// Periodic cleanup driver. Stops when dropped.
pub struct CleanupScheduler {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CleanupScheduler {
    /// Run `task` every `interval` on a dedicated thread.
    ///
    /// `task` returns the number of instances it evicted.
    pub fn start<T>(interval: Duration, task: T) -> std::io::Result<Self>
    where
        T: Fn() -> usize + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let ticker = crossbeam_channel::tick(interval);

        let handle = std::thread::Builder::new()
            .name("pagepool-cleanup".into())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => {
                        let evicted = task();
                        tracing::trace!(evicted, "scheduled cleanup pass");
                    }
                    recv(shutdown_rx) -> _ => break,
                }
            })?;

        tracing::debug!(?interval, "cleanup scheduler started");
        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Clean `pool` at its configured cleanup interval.
    pub fn for_pool<F>(pool: &Arc<PagePool<F>>) -> std::io::Result<Self>
    where
        F: PageFactory + 'static,
    {
        let interval = pool.settings().cleanup_interval;
        let pool = Arc::clone(pool);
        Self::start(interval, move || pool.cleanup())
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(&mut self) {
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("cleanup thread panicked");
            }
            tracing::debug!("cleanup scheduler stopped");
        }
    }

    /// Whether the thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
