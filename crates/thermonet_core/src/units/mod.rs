//! Nodes and synapses of a built network.
//!
//! Both live in flat arenas owned by [`crate::network::Network`] and refer to each
//! other by index: a node lists the synapses touching it, a synapse stores the
//! values last pushed by its two endpoints.

pub mod node;
pub mod synapse;

pub use node::{HistoryEntry, Node, NodeKind, NodeParams, NodeState, SynapseLink, UpdateContext};
pub use synapse::{Plasticity, Synapse, SynapseParams};
