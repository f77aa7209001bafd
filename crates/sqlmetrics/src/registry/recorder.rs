use super::{MetricRegistry, Timer, TimerFn};
use metrics::{Histogram, Unit};
use std::sync::Arc;
use std::time::Duration;

/// Registry forwarding every timer to a `metrics` histogram of the same name.
///
/// Durations are recorded in seconds. Histograms are registered with the recorder
/// current at the time [`MetricRegistry::timer`] is called, so install the global
/// recorder (or enter a local one) before wrapping anything.
#[derive(Debug, Clone, Default)]
pub struct RecorderRegistry {
    describe: bool,
}

impl RecorderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe each histogram (unit: seconds) when it is first looked up.
    pub fn describe_histograms(mut self) -> Self {
        self.describe = true;
        self
    }
}

impl MetricRegistry for RecorderRegistry {
    fn timer(&self, name: &str) -> Timer {
        if self.describe {
            metrics::describe_histogram!(name.to_string(), Unit::Seconds, "SQL call duration");
        }
        let histogram = metrics::histogram!(name.to_string());
        Timer::from_arc(name, Arc::new(HistogramTimer(histogram)))
    }
}

struct HistogramTimer(Histogram);

impl TimerFn for HistogramTimer {
    fn record(&self, duration: Duration) {
        self.0.record(duration.as_secs_f64());
    }
}
