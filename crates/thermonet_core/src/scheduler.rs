//! Era, epoch and time-step driver.
//!
//! Every time step runs three strictly ordered phases:
//! 1. update the logic group with the era's logic mode and weight-update flag
//! 2. update the network group with the weight-update flag
//! 3. evaluate logic nodes against their fields
//!
//! Within a phase nodes read only synapse values pushed before the phase began,
//! so the node updates of a phase may run on the rayon pool.

use crate::histogram::WeightSnapshot;
use crate::metrics::Metrics;
use crate::network::Network;
use crate::stats::StatisticsAggregator;
use crate::units::UpdateContext;
use std::time::Instant;
use thermonet_data::{EpochRecord, Era, LogicMode, StepRecord, WeightDistributions};

/// Consumer of the records a run produces.
pub trait RecordSink {
    fn on_step(&mut self, record: &StepRecord, network: &Network) -> anyhow::Result<()>;
    fn on_epoch(&mut self, record: &EpochRecord) -> anyhow::Result<()>;
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub steps: Vec<StepRecord>,
    pub epochs: Vec<EpochRecord>,
}

impl RecordSink for MemorySink {
    fn on_step(&mut self, record: &StepRecord, _network: &Network) -> anyhow::Result<()> {
        self.steps.push(*record);
        Ok(())
    }

    fn on_epoch(&mut self, record: &EpochRecord) -> anyhow::Result<()> {
        self.epochs.push(*record);
        Ok(())
    }
}

/// Outcome of a completed schedule.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: u64,
    pub epochs: Vec<EpochRecord>,
    pub distributions: WeightDistributions,
}

pub struct SimulationScheduler {
    eras: Vec<Era>,
    steps_per_epoch: usize,
    metrics: Metrics,
}

impl SimulationScheduler {
    pub fn new(eras: Vec<Era>, steps_per_epoch: usize) -> Self {
        Self {
            eras,
            steps_per_epoch,
            metrics: Metrics::new(),
        }
    }

    pub fn from_network(network: &Network) -> Self {
        Self::new(
            network.config.eras.clone(),
            network.config.simulation.time,
        )
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Settles the network before the first era: logic nodes draw noise and the
    /// network group relaxes once, without weight updates.
    pub fn prime(&self, network: &mut Network) {
        let ctx = UpdateContext {
            seed: network.seed,
            time: 0,
            era: 0,
            weight_update: false,
            logic_mode: LogicMode::Noise,
        };
        network.update_logic_phase(&ctx);
        network.update_network_phase(&ctx);
    }

    /// Runs phases (a), (b) and (c) for one time step.
    pub fn step(&self, network: &mut Network, time: u64, era_index: usize, era: &Era) {
        let ctx = UpdateContext {
            seed: network.seed,
            time,
            era: era_index,
            weight_update: era.weight_update,
            logic_mode: era.logic_mode,
        };
        network.update_logic_phase(&ctx);
        network.update_network_phase(&ctx);
        network.evaluate_logic();
    }

    /// Primes the network and runs the whole era schedule.
    pub fn run(&self, network: &mut Network, sink: &mut dyn RecordSink) -> anyhow::Result<RunSummary> {
        self.prime(network);
        let initial = WeightSnapshot::capture(network);
        let mut aggregator = StatisticsAggregator::new(network);
        let mut epochs = Vec::new();
        let mut time = 0u64;
        let mut epoch = 0usize;

        for (era_index, era) in self.eras.iter().enumerate() {
            for _ in 0..era.epochs {
                epoch += 1;
                let started = Instant::now();
                for _ in 0..self.steps_per_epoch {
                    time += 1;
                    self.step(network, time, era_index, era);
                    let record = aggregator.record_step(network, time, era_index, epoch);
                    sink.on_step(&record, network)?;
                    self.metrics.record_step();
                }

                let record = aggregator.finish_epoch(era_index, epoch);
                sink.on_epoch(&record)?;
                self.metrics.record_epoch(started.elapsed(), &record);
                if record.summary.percent_solved >= 100.0 {
                    self.metrics.increment_counter("solved_epochs");
                }
                epochs.push(record);
            }
        }

        let distributions = WeightSnapshot::capture(network).distributions(&initial);
        tracing::info!(
            steps = time,
            epochs = epochs.len(),
            elapsed_ms = self.metrics.elapsed().as_millis() as u64,
            "Simulation completed"
        );

        Ok(RunSummary {
            steps: time,
            epochs,
            distributions,
        })
    }
}
