use super::{MetricRegistry, Timer, TimerFn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// In-memory registry aggregating count, total, min and max per timer name.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: Mutex<BTreeMap<String, Arc<TimerStats>>>,
}

/// Aggregate of one timer at the time of the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    /// Number of recorded durations.
    pub count: u64,
    /// Sum of recorded durations.
    pub total: Duration,
    /// Shortest recorded duration (zero when nothing was recorded).
    pub min: Duration,
    /// Longest recorded duration.
    pub max: Duration,
}

impl TimerSnapshot {
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total / count,
            Err(_) => Duration::from_nanos(
                u64::try_from(self.total.as_nanos() / u128::from(self.count)).unwrap_or(u64::MAX),
            ),
        }
    }
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Arc<TimerStats>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the timer called `name`, `None` if it was never created.
    pub fn snapshot(&self, name: &str) -> Option<TimerSnapshot> {
        self.lock().get(name).map(|stats| stats.snapshot())
    }

    /// Recorded count of `name`, zero if the timer does not exist.
    pub fn count(&self, name: &str) -> u64 {
        self.snapshot(name).map_or(0, |s| s.count)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of every timer created so far, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Snapshots of every timer, keyed by name.
    pub fn timers(&self) -> BTreeMap<String, TimerSnapshot> {
        self.lock()
            .iter()
            .map(|(name, stats)| (name.clone(), stats.snapshot()))
            .collect()
    }

    /// Drop every timer. Handles given out earlier keep recording into detached aggregates.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl MetricRegistry for TimerRegistry {
    fn timer(&self, name: &str) -> Timer {
        let stats = self
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(TimerStats::default()))
            .clone();
        Timer::from_arc(name, stats)
    }
}

#[derive(Debug)]
struct TimerStats {
    count: AtomicU64,
    total_nanos: AtomicU64,
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl Default for TimerStats {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
        }
    }
}

impl TimerStats {
    fn snapshot(&self) -> TimerSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let min = self.min_nanos.load(Ordering::Relaxed);
        TimerSnapshot {
            count,
            total: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
            min: if count == 0 {
                Duration::ZERO
            } else {
                Duration::from_nanos(min)
            },
            max: Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed)),
        }
    }
}

impl TimerFn for TimerStats {
    fn record(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        let prev_total = self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev_total.checked_add(nanos).is_none() {
            // Saturate instead of wrapping.
            self.total_nanos.store(u64::MAX, Ordering::Relaxed);
        }
        self.min_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}
