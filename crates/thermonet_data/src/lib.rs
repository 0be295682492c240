//! Shared data definitions for the thermonet workspace.
//!
//! Everything in here is plain data: catalog tags that the configuration refers
//! to, era schedule entries, and the records the simulation emits. Behavior lives
//! in `thermonet_core`.

pub mod data;

pub use data::catalog::{Era, LogicMode, NetworkMode, NodeRole, Parity, RuleType};
pub use data::records::{
    ConstructionReport, EpochRecord, HistogramBin, NodeRecord, NodeStateRecord, StepRecord,
    Summary, WeightDistributions,
};

/// Stable index of a node inside the network arena (equal to its grid position index).
pub type NodeId = usize;
/// Stable index of a synapse inside the network arena (creation order).
pub type SynapseId = usize;
