#![allow(dead_code)]

use sqlmetrics::instrument::DataSourceProxy;
use sqlmetrics::{MetricsConfig, MetricsProxyFactory, SqliteDataSource, TimerRegistry};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SELECT_ALL: &str = "select * from METRICS_TEST";

pub struct Fixture {
    pub registry: Arc<TimerRegistry>,
    pub factory: MetricsProxyFactory,
    pub data_source: DataSourceProxy,
}

impl Fixture {
    pub fn count(&self, name: &str) -> u64 {
        self.registry.count(name)
    }

    /// Timer names starting with `category.`.
    pub fn names_in(&self, category: &str) -> Vec<String> {
        let prefix = format!("{category}.");
        self.registry
            .names()
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect()
    }
}

/// Fresh shared in-memory database holding `METRICS_TEST`, wrapped under `test`.
pub fn fixture() -> Fixture {
    fixture_with(MetricsConfig::default())
}

pub fn fixture_with(config: MetricsConfig) -> Fixture {
    let raw = SqliteDataSource::memory(&unique_name()).unwrap();
    raw.execute_batch(
        "CREATE TABLE METRICS_TEST (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score REAL);
         INSERT INTO METRICS_TEST (id, name, score) VALUES
             (1, 'alpha', 1.5),
             (2, 'beta', NULL),
             (3, 'gamma', 3.25);",
    )
    .unwrap();

    let registry = Arc::new(TimerRegistry::new());
    let factory = MetricsProxyFactory::with_config(registry.clone(), config);
    let data_source = factory.wrap_data_source("test", Box::new(raw));
    Fixture {
        registry,
        factory,
        data_source,
    }
}

fn unique_name() -> String {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    format!(
        "metrics_test_{}_{}",
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}
