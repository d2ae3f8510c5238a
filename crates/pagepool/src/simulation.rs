//! Synthetic pages, a slow factory, and a multi-threaded request driver.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pagepool_cli::SimulationReport;
use pagepool_core::{CancellationToken, Checkout, Locale, Page, PageFactory, PagePool, PoolError};

/// A page with a render counter and a dirty flag.
pub struct SyntheticPage {
    name: String,
    locale: Locale,
    serial: u64,
    renders: AtomicU64,
    dirty: AtomicBool,
}

impl SyntheticPage {
    /// Construction order of this instance across the factory.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Number of requests rendered with this instance.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    /// Render one request, optionally leaving per-request state behind.
    pub fn render(&self, hold: Duration, leave_dirty: bool) {
        if !hold.is_zero() {
            std::thread::sleep(hold);
        }
        self.renders.fetch_add(1, Ordering::Relaxed);
        if leave_dirty {
            self.dirty.store(true, Ordering::Relaxed);
        }
    }
}

impl Page for SyntheticPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }

    fn detach(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }
}

/// Construction failure of a synthetic page.
#[derive(Debug, thiserror::Error)]
#[error("template for page '{page}' (locale {locale}) could not be loaded")]
pub struct BrokenTemplate {
    /// Page that failed.
    pub page: String,
    /// Locale requested.
    pub locale: Locale,
}

/// Factory that sleeps to simulate template parsing.
pub struct SyntheticFactory {
    construct_time: Duration,
    broken: HashSet<String>,
    built: AtomicU64,
}

impl SyntheticFactory {
    /// Factory that takes `construct_time` per instance and always fails for `broken` pages.
    #[must_use]
    pub fn new(construct_time: Duration, broken: impl IntoIterator<Item = String>) -> Self {
        Self {
            construct_time,
            broken: broken.into_iter().collect(),
            built: AtomicU64::new(0),
        }
    }

    /// Instances built so far.
    #[must_use]
    pub fn built(&self) -> u64 {
        self.built.load(Ordering::Relaxed)
    }
}

impl PageFactory for SyntheticFactory {
    type Page = SyntheticPage;
    type Error = BrokenTemplate;

    fn create(&self, page_name: &str, locale: &Locale) -> Result<SyntheticPage, BrokenTemplate> {
        if !self.construct_time.is_zero() {
            std::thread::sleep(self.construct_time);
        }
        if self.broken.contains(page_name) {
            return Err(BrokenTemplate {
                page: page_name.to_string(),
                locale: locale.clone(),
            });
        }
        Ok(SyntheticPage {
            name: page_name.to_string(),
            locale: locale.clone(),
            serial: self.built.fetch_add(1, Ordering::Relaxed),
            renders: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
        })
    }
}

/// Shape of the synthetic load.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    /// Page names requested round-robin.
    pub pages: Vec<String>,
    /// Locales requested round-robin.
    pub locales: Vec<Locale>,
    /// Worker threads.
    pub threads: u32,
    /// Requests per worker.
    pub requests_per_thread: u64,
    /// How long each request holds its page.
    pub render_time: Duration,
    /// Fraction of requests that dirty their page.
    pub dirty_rate: f64,
}

impl SimulationPlan {
    fn targets(&self) -> Vec<(&str, &Locale)> {
        self.pages
            .iter()
            .flat_map(|p| self.locales.iter().map(move |l| (p.as_str(), l)))
            .collect()
    }
}

#[derive(Default)]
struct Tally {
    requests: AtomicU64,
    served: AtomicU64,
    exhausted: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
}

/// Per-worker xorshift so dirty decisions spread evenly without shared state.
struct Dice(u64);

impl Dice {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    #[allow(clippy::cast_precision_loss)]
    fn roll(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Run `plan` against `pool` and collect the outcome.
pub fn run_simulation(
    pool: &PagePool<SyntheticFactory>,
    plan: &SimulationPlan,
    cancel: &CancellationToken,
) -> SimulationReport {
    let targets = plan.targets();
    let tally = Tally::default();
    let start = Instant::now();

    if !targets.is_empty() {
        std::thread::scope(|scope| {
            for worker in 0..plan.threads {
                let targets = &targets;
                let tally = &tally;
                scope.spawn(move || run_worker(pool, plan, targets, worker, tally, cancel));
            }
        });
    }

    let report = SimulationReport {
        requests: tally.requests.load(Ordering::Relaxed),
        served: tally.served.load(Ordering::Relaxed),
        exhausted: tally.exhausted.load(Ordering::Relaxed),
        cancelled: tally.cancelled.load(Ordering::Relaxed),
        failed: tally.failed.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
        pools: pool.snapshots(),
        totals: pool.total_stats(),
    };
    tracing::info!(
        served = report.served,
        exhausted = report.exhausted,
        cancelled = report.cancelled,
        failed = report.failed,
        elapsed = ?report.elapsed,
        "simulation finished"
    );
    report
}

fn run_worker(
    pool: &PagePool<SyntheticFactory>,
    plan: &SimulationPlan,
    targets: &[(&str, &Locale)],
    worker: u32,
    tally: &Tally,
    cancel: &CancellationToken,
) {
    let mut dice = Dice::new(u64::from(worker) + 1);
    let offset = worker as usize;

    for request in 0..plan.requests_per_thread {
        tally.requests.fetch_add(1, Ordering::Relaxed);
        if cancel.is_cancelled() {
            tally.cancelled.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        #[allow(clippy::cast_possible_truncation)]
        let (page_name, locale) = targets[(offset + request as usize) % targets.len()];
        match pool.checkout(page_name, locale, cancel) {
            Ok(Checkout::Page(page)) => {
                page.render(plan.render_time, dice.roll() < plan.dirty_rate);
                pool.release(&page);
                tally.served.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Checkout::Cancelled) => {
                tally.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            Err(PoolError::Exhausted { .. }) => {
                tally.exhausted.fetch_add(1, Ordering::Relaxed);
            }
            Err(PoolError::Construction(e)) => {
                tracing::debug!(worker, error = %e, "request failed");
                tally.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pagepool_core::{PoolConfig, PoolSettings};

    use super::*;

    fn plan(threads: u32, requests: u64) -> SimulationPlan {
        SimulationPlan {
            pages: vec!["Index".into()],
            locales: vec![Locale::new("en")],
            threads,
            requests_per_thread: requests,
            render_time: Duration::ZERO,
            dirty_rate: 0.0,
        }
    }

    fn registry(config: PoolConfig, broken: &[&str]) -> PagePool<SyntheticFactory> {
        let factory = SyntheticFactory::new(
            Duration::ZERO,
            broken.iter().map(|s| (*s).to_string()),
        );
        let settings = PoolSettings {
            defaults: config,
            ..Default::default()
        };
        PagePool::new(Arc::new(factory), settings).unwrap()
    }

    #[test]
    fn single_thread_reuses_one_instance() {
        let pool = registry(PoolConfig::default(), &[]);
        let report = run_simulation(&pool, &plan(1, 50), &CancellationToken::new());
        assert_eq!(report.requests, 50);
        assert_eq!(report.served, 50);
        assert_eq!(report.totals.misses, 1);
        assert_eq!(report.totals.hits, 49);
        assert!(report.all_served());
    }

    #[test]
    fn many_threads_stay_within_hard_limit() {
        let config = PoolConfig {
            soft_limit: 2,
            hard_limit: 4,
            soft_wait: Duration::from_millis(200),
            ..Default::default()
        };
        let pool = registry(config, &[]);
        let mut p = plan(6, 40);
        p.render_time = Duration::from_micros(200);
        let report = run_simulation(&pool, &p, &CancellationToken::new());

        assert_eq!(report.requests, 240);
        assert_eq!(report.served + report.exhausted, 240);
        assert_eq!(report.pools.len(), 1);
        assert_eq!(report.pools[0].in_use, 0);
        assert!(report.pools[0].available <= 6);
    }

    #[test]
    fn dirty_pages_are_discarded() {
        let pool = registry(PoolConfig::default(), &[]);
        let mut p = plan(1, 20);
        p.dirty_rate = 1.0;
        let report = run_simulation(&pool, &p, &CancellationToken::new());
        assert_eq!(report.served, 20);
        assert_eq!(report.totals.discards, 20);
        assert_eq!(report.totals.misses, 20);
        assert_eq!(report.pools[0].available, 0);
    }

    #[test]
    fn broken_pages_count_as_failed() {
        let pool = registry(PoolConfig::default(), &["Index"]);
        let report = run_simulation(&pool, &plan(2, 5), &CancellationToken::new());
        assert_eq!(report.failed, 10);
        assert_eq!(report.served, 0);
        assert_eq!(report.totals.construction_failures, 10);
    }

    #[test]
    fn pre_cancelled_run_serves_nothing() {
        let pool = registry(PoolConfig::default(), &[]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = run_simulation(&pool, &plan(3, 10), &cancel);
        assert_eq!(report.cancelled, 30);
        assert_eq!(report.served, 0);
    }

    #[test]
    fn targets_cover_every_page_and_locale() {
        let p = SimulationPlan {
            pages: vec!["A".into(), "B".into()],
            locales: vec![Locale::new("en"), Locale::new("fr")],
            ..plan(1, 1)
        };
        assert_eq!(p.targets().len(), 4);
    }

    #[test]
    fn dice_stays_in_unit_interval() {
        let mut dice = Dice::new(7);
        for _ in 0..1_000 {
            let r = dice.roll();
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn render_marks_dirty() {
        let factory = SyntheticFactory::new(Duration::ZERO, Vec::new());
        let page = factory.create("Index", &Locale::new("en")).unwrap();
        assert!(!page.detach());
        page.render(Duration::ZERO, true);
        assert!(page.detach());
        assert_eq!(page.renders(), 1);
        assert_eq!(page.serial(), 0);
        assert_eq!(factory.built(), 1);
    }
}
