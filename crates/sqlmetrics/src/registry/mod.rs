//! Named timers.
//!
//! [`MetricRegistry`] is the only shared state of the proxy layer: every wrapped
//! object looks its timers up by name here. Two implementations ship with the
//! crate: [`TimerRegistry`] aggregates in memory, [`RecorderRegistry`] (feature
//! `metrics`) forwards to whatever `metrics` recorder is installed.

mod memory;
#[cfg(feature = "metrics")]
mod recorder;


pub use memory::{TimerRegistry, TimerSnapshot};
#[cfg(feature = "metrics")]
pub use recorder::RecorderRegistry;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of named timers.
///
/// `timer` is create-or-lookup: the same name always reaches the same aggregate.
/// Implementations must tolerate concurrent calls from any thread.
pub trait MetricRegistry: Send + Sync {
    fn timer(&self, name: &str) -> Timer;
}

/// Sink receiving the durations measured by a [`Timer`].
pub trait TimerFn: Send + Sync {
    fn record(&self, duration: Duration);
}

/// Handle to a named timer.
#[derive(Clone)]
pub struct Timer {
    name: Arc<str>,
    inner: Arc<dyn TimerFn>,
}

impl Timer {
    pub fn from_arc(name: impl Into<Arc<str>>, inner: Arc<dyn TimerFn>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// A timer that discards everything.
    pub fn noop(name: impl Into<Arc<str>>) -> Self {
        Self::from_arc(name, Arc::new(NoopTimer))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a duration measured elsewhere.
    pub fn update(&self, duration: Duration) {
        self.inner.record(duration);
    }

    /// Start measuring now.
    pub fn start(&self) -> TimerContext {
        TimerContext {
            timer: self.clone(),
            started: Instant::now(),
        }
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer").field("name", &self.name).finish()
    }
}

/// A running measurement.
///
/// [`stop`](Self::stop) records the elapsed time exactly once, since it consumes the
/// context. Dropping a context without stopping it records nothing.
#[must_use = "a timer context records nothing unless stopped"]
#[derive(Debug)]
pub struct TimerContext {
    timer: Timer,
    started: Instant,
}

impl TimerContext {
    pub fn name(&self) -> &str {
        self.timer.name()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record the elapsed time and return it.
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.timer.update(elapsed);
        elapsed
    }
}

struct NoopTimer;

impl TimerFn for NoopTimer {
    fn record(&self, _duration: Duration) {}
}
