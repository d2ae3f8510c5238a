//! Criterion benchmarks for the checkout/release hot path.

use std::convert::Infallible;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use pagepool_core::{
    CancellationToken, Locale, Page, PageFactory, PageInstancePool, PagePool, PoolConfig, PoolKey,
    PoolSettings,
};

struct BenchPage {
    name: String,
    locale: Locale,
}

impl Page for BenchPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn locale(&self) -> &Locale {
        &self.locale
    }
}

struct BenchFactory;

impl PageFactory for BenchFactory {
    type Page = BenchPage;
    type Error = Infallible;

    fn create(&self, page_name: &str, locale: &Locale) -> Result<BenchPage, Infallible> {
        Ok(BenchPage {
            name: page_name.to_string(),
            locale: locale.clone(),
        })
    }
}

fn bench_single_pool(c: &mut Criterion) {
    let cancel = CancellationToken::new();
    let mut group = c.benchmark_group("PageInstancePool");

    for held in [0usize, 8, 64] {
        let pool = PageInstancePool::new(
            PoolKey::new("Index", Locale::new("en")),
            PoolConfig {
                soft_limit: held + 1,
                hard_limit: held + 1,
                ..PoolConfig::default()
            },
            Arc::new(BenchFactory),
        );
        let _held: Vec<_> = (0..held)
            .map(|_| pool.checkout(&cancel).unwrap().page().unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::new("checkout_release", held), &held, |b, _| {
            b.iter(|| {
                let page = pool.checkout(&cancel).unwrap().page().unwrap();
                pool.release(&page);
            });
        });
    }
    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let pool = PagePool::new(Arc::new(BenchFactory), PoolSettings::default()).unwrap();
    let cancel = CancellationToken::new();
    let locale = Locale::new("en");

    c.bench_function("PagePool/checkout_release", |b| {
        b.iter(|| {
            let page = pool.checkout("Index", &locale, &cancel).unwrap().page().unwrap();
            pool.release(&page);
        });
    });
}

criterion_group!(benches, bench_single_pool, bench_registry);
criterion_main!(benches);
