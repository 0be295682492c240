use super::catalog::{LogicMode, NetworkMode, NodeRole};
use serde::{Deserialize, Serialize};

/// Network-wide observables averaged over one time step or one epoch.
///
/// Node quantities are averaged over the network group, the solved percentage over
/// logic nodes, the squared weight over plastic synapses and the order parameter
/// over order-eligible synapses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    /// Mean node energy.
    pub node_energy: f64,
    /// Mean squared synapse weight.
    pub synapse_energy: f64,
    /// Percentage of network nodes whose state changed.
    pub percent_changed: f64,
    /// Percentage of network nodes that took a non-minimal state.
    pub percent_fluctuation: f64,
    /// Percentage of logic nodes reporting a solved state.
    pub percent_solved: f64,
    /// Total node entropy.
    pub entropy: f64,
    /// Mean node dissipation.
    pub dissipation: f64,
    /// Mean node transport.
    pub transport: f64,
    /// Ratio of aligned input to total input.
    pub quality: f64,
    /// Mean order parameter.
    pub order: f64,
    /// Mean polarity-weighted node state.
    pub color: f64,
}

/// Aggregate for a single time step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct StepRecord {
    pub time: u64,
    pub era: usize,
    pub epoch: usize,
    /// Mean node free energy.
    pub free_energy: f64,
    pub summary: Summary,
}

/// Time-averaged aggregate over one epoch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochRecord {
    pub era: usize,
    pub epoch: usize,
    pub steps: usize,
    pub free_energy: f64,
    pub summary: Summary,
}

/// One histogram bin comparing the start and end of a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub bin: f64,
    pub final_count: usize,
    pub initial_count: usize,
}

/// Terminal edge weight distributions for external plotting.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WeightDistributions {
    /// Scaled signed weight of every plastic synapse.
    pub weight: Vec<HistogramBin>,
    /// Sum of scaled weights per network node.
    pub node_sum: Vec<HistogramBin>,
    /// Sum of scaled absolute weights per network node.
    pub node_abs_sum: Vec<HistogramBin>,
}

/// Static description of a placed node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: usize,
    pub class: String,
    pub role: NodeRole,
    pub position: Vec<usize>,
}

/// Per-node state line written when state recording is enabled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeStateRecord {
    pub time: u64,
    pub id: usize,
    pub energy: f64,
    pub state: f64,
    pub fluctuation: bool,
    pub entropy: f64,
    pub solved: bool,
    pub dissipation: f64,
    pub transport: f64,
    pub logic_mode: LogicMode,
}

/// Outcome of topology construction, including recoverable diagnostics.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConstructionReport {
    pub mode: NetworkMode,
    pub nodes: usize,
    /// Non-recurrent synapses.
    pub edges: usize,
    pub recurrent: usize,
    pub order_eligible: usize,
    pub plastic: usize,
    /// Placement candidates rejected by exclusion rules.
    pub placement_conflicts: usize,
    /// Edge draws discarded by the feasibility check.
    pub contention_events: usize,
    /// Edge draws discarded by the bias separation check.
    pub separation_conflicts: usize,
    /// Degree quota that could not be satisfied.
    pub unmet_connections: usize,
    /// Smallest graph distance between two logic-group nodes (capped at the grid edge).
    pub min_separation: usize,
}
