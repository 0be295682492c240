//! Run metrics and structured logging setup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thermonet_data::EpochRecord;

/// Counters collected while a schedule runs.
pub struct Metrics {
    step_count: AtomicU64,
    epoch_count: AtomicU64,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_count: AtomicU64::new(0),
            epoch_count: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    pub fn record_step(&self) {
        let step = self.step_count.fetch_add(1, Ordering::Relaxed) + 1;
        if step.is_multiple_of(1000) {
            tracing::debug!(step, "Simulation step");
        }
    }

    /// Records a finished epoch and logs its averages.
    pub fn record_epoch(&self, duration: Duration, record: &EpochRecord) {
        self.epoch_count.fetch_add(1, Ordering::Relaxed);
        let s = &record.summary;
        tracing::info!(
            era = record.era,
            epoch = record.epoch,
            node_energy = s.node_energy,
            synapse_energy = s.synapse_energy,
            percent_changed = s.percent_changed,
            percent_fluctuation = s.percent_fluctuation,
            percent_solved = s.percent_solved,
            entropy = s.entropy,
            quality = s.quality,
            order = s.order,
            color = s.color,
            duration_ms = duration.as_millis() as u64,
            "Epoch completed"
        );
    }

    /// Increments a named counter.
    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn epoch_count(&self) -> u64 {
        self.epoch_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.step_count(), 0);
        assert_eq!(metrics.epoch_count(), 0);
    }

    #[test]
    fn test_record_epoch() {
        let metrics = Metrics::new();
        metrics.record_step();
        metrics.record_epoch(Duration::from_millis(3), &EpochRecord::default());
        assert_eq!(metrics.step_count(), 1);
        assert_eq!(metrics.epoch_count(), 1);
    }

    #[test]
    fn test_increment_counter() {
        let metrics = Metrics::new();
        metrics.increment_counter("contention");
        metrics.increment_counter("contention");
        assert_eq!(metrics.counter("contention"), 2);
        assert_eq!(metrics.counter("missing"), 0);
    }
}
