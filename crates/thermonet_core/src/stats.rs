//! Reduction of node and synapse observables into step and epoch records.

use crate::network::Network;
use thermonet_data::{EpochRecord, StepRecord, Summary};

/// Raw sums over one or more steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    node_energy: f64,
    free_energy: f64,
    entropy: f64,
    dissipation: f64,
    transport: f64,
    quality_numer: f64,
    quality_denom: f64,
    flipped: usize,
    fluctuations: usize,
    solved: usize,
    color: f64,
    synapse_energy: f64,
    order: f64,
}

impl Totals {
    fn sample(network: &Network) -> Self {
        let mut totals = Totals::default();
        for &i in network.network_group() {
            let state = &network.nodes[i].state;
            totals.node_energy += state.energy;
            totals.free_energy += state.free_energy;
            totals.entropy += state.entropy;
            totals.dissipation += state.dissipation;
            totals.transport += state.transport;
            totals.quality_numer += state.quality_numer;
            totals.quality_denom += state.quality_denom;
            totals.flipped += usize::from(state.state_change != 0.0);
            totals.fluctuations += usize::from(state.fluctuation);
            totals.color += f64::from(network.display_polarity[i]) * state.value;
        }
        totals.solved = network
            .logic_nodes()
            .iter()
            .filter(|&&i| network.nodes[i].state.solved)
            .count();
        totals.synapse_energy = network
            .topology
            .plastic
            .iter()
            .map(|&k| network.synapses[k].energy())
            .sum();
        totals.order = network
            .topology
            .order
            .iter()
            .map(|&k| network.synapses[k].order())
            .sum();
        totals
    }

    fn add(&mut self, other: &Totals) {
        self.node_energy += other.node_energy;
        self.free_energy += other.free_energy;
        self.entropy += other.entropy;
        self.dissipation += other.dissipation;
        self.transport += other.transport;
        self.quality_numer += other.quality_numer;
        self.quality_denom += other.quality_denom;
        self.flipped += other.flipped;
        self.fluctuations += other.fluctuations;
        self.solved += other.solved;
        self.color += other.color;
        self.synapse_energy += other.synapse_energy;
        self.order += other.order;
    }
}

/// Accumulates per-step sums and averages them per epoch.
///
/// Node observables are averaged over the network group, the solved percentage
/// over logic nodes, squared weights over plastic synapses and the order
/// parameter over order-eligible synapses. Empty partitions count as one.
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    network_nodes: f64,
    logic_nodes: f64,
    plastic: f64,
    order: f64,
    epoch: Totals,
    steps: usize,
}

impl StatisticsAggregator {
    pub fn new(network: &Network) -> Self {
        let count = |n: usize| n.max(1) as f64;
        Self {
            network_nodes: count(network.network_group().len()),
            logic_nodes: count(network.logic_nodes().len()),
            plastic: count(network.topology.plastic.len()),
            order: count(network.topology.order.len()),
            epoch: Totals::default(),
            steps: 0,
        }
    }

    fn summarize(&self, totals: &Totals, steps: usize) -> (Summary, f64) {
        let steps = steps.max(1) as f64;
        let per_node = |v: f64| v / self.network_nodes / steps;
        let summary = Summary {
            node_energy: per_node(totals.node_energy),
            synapse_energy: totals.synapse_energy / self.plastic / steps,
            percent_changed: 100.0 * per_node(totals.flipped as f64),
            percent_fluctuation: 100.0 * per_node(totals.fluctuations as f64),
            percent_solved: 100.0 * totals.solved as f64 / self.logic_nodes / steps,
            entropy: totals.entropy / steps,
            dissipation: per_node(totals.dissipation),
            transport: per_node(totals.transport),
            quality: if totals.quality_denom == 0.0 {
                0.0
            } else {
                totals.quality_numer / totals.quality_denom
            },
            order: totals.order / self.order / steps,
            color: per_node(totals.color),
        };
        (summary, per_node(totals.free_energy))
    }

    /// Samples the network after a completed step and folds it into the epoch.
    pub fn record_step(&mut self, network: &Network, time: u64, era: usize, epoch: usize) -> StepRecord {
        let totals = Totals::sample(network);
        self.epoch.add(&totals);
        self.steps += 1;
        let (summary, free_energy) = self.summarize(&totals, 1);
        StepRecord {
            time,
            era,
            epoch,
            free_energy,
            summary,
        }
    }

    /// Time-averaged record of the steps since the last call; resets the totals.
    pub fn finish_epoch(&mut self, era: usize, epoch: usize) -> EpochRecord {
        let (summary, free_energy) = self.summarize(&self.epoch, self.steps);
        let record = EpochRecord {
            era,
            epoch,
            steps: self.steps,
            free_energy,
            summary,
        };
        self.epoch = Totals::default();
        self.steps = 0;
        record
    }
}
