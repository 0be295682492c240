//! Realized network topology and the builders that produce it.
//!
//! Construction runs in a fixed order: one edge builder (neighbor or
//! probabilistic), the separation check, then recurrent links. Each stage only
//! appends to the [`Topology`]; nothing is rewritten once recorded.

pub mod neighbor;
pub mod probabilistic;
pub mod recurrent;
pub mod separation;

pub use neighbor::NeighborGraphBuilder;
pub use probabilistic::{ProbabilisticGraphBuilder, ProbabilisticOutcome};
pub use recurrent::RecurrentLinkGenerator;
pub use separation::SeparationValidator;

use crate::placement::Placement;
use crate::rules::RuleTable;
use petgraph::graph::{NodeIndex, UnGraph};
use thermonet_data::{NodeId, NodeRole, RuleType, SynapseId};

/// Adjacency and synapse partitions of the built network.
///
/// Synapse ids are dense: `0..edge_count()` are ordinary edges in creation order,
/// followed by recurrent self loops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    /// Synapses touching each node (self loops listed once).
    pub node_to_synapse: Vec<Vec<SynapseId>>,
    /// Adjacent nodes, excluding self loops.
    pub node_to_node: Vec<Vec<NodeId>>,
    /// Endpoints of each synapse, ordered by class precedence.
    pub synapse_key_map: Vec<(NodeId, NodeId)>,
    pub recurrent: Vec<SynapseId>,
    /// Synapses contributing to the order parameter.
    pub order: Vec<SynapseId>,
    /// Synapses whose weight may adapt (`order` followed by `recurrent`).
    pub plastic: Vec<SynapseId>,
}

impl Topology {
    pub fn new(nodes: usize) -> Self {
        Self {
            node_to_synapse: vec![Vec::new(); nodes],
            node_to_node: vec![Vec::new(); nodes],
            ..Default::default()
        }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_to_node.len()
    }

    #[inline]
    pub fn synapse_count(&self) -> usize {
        self.synapse_key_map.len()
    }

    /// Non-recurrent synapses.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.synapse_key_map.len() - self.recurrent.len()
    }

    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        self.node_to_node[node].len()
    }

    #[inline]
    pub fn endpoints(&self, synapse: SynapseId) -> (NodeId, NodeId) {
        self.synapse_key_map[synapse]
    }

    /// Records an edge between two distinct nodes.
    ///
    /// The stored endpoint pair lists the earlier-ranked class second; equal ranks
    /// keep `(j, i)`.
    pub fn add_edge(
        &mut self,
        i: NodeId,
        j: NodeId,
        placement: &Placement,
        rules: &RuleTable,
    ) -> SynapseId {
        debug_assert!(self.recurrent.is_empty(), "edges must precede recurrent links");
        let id = self.synapse_key_map.len();
        let (ci, cj) = (placement.class_of(i), placement.class_of(j));
        let key = if cj < ci { (i, j) } else { (j, i) };
        self.synapse_key_map.push(key);
        self.node_to_synapse[i].push(id);
        self.node_to_synapse[j].push(id);
        self.node_to_node[i].push(j);
        self.node_to_node[j].push(i);

        let adaptive = rules.rule_type(ci, cj) != RuleType::Fixed;
        let no_bias = placement.role_of(i) != NodeRole::Bias && placement.role_of(j) != NodeRole::Bias;
        if adaptive && no_bias {
            self.order.push(id);
        }
        id
    }

    /// Appends a self-loop synapse.
    pub fn add_self_loop(&mut self, node: NodeId) -> SynapseId {
        let id = self.synapse_key_map.len();
        self.synapse_key_map.push((node, node));
        self.node_to_synapse[node].push(id);
        self.recurrent.push(id);
        id
    }

    /// Fixes the plastic partition once every synapse is recorded.
    pub fn seal(&mut self) {
        self.plastic = self.order.iter().chain(&self.recurrent).copied().collect();
    }

    /// Undirected petgraph view of the non-recurrent adjacency.
    ///
    /// Node indices match node ids; edge weights are synapse ids.
    pub fn to_graph(&self) -> UnGraph<NodeId, SynapseId> {
        let mut graph = UnGraph::with_capacity(self.node_count(), self.edge_count());
        for id in 0..self.node_count() {
            graph.add_node(id);
        }
        for (synapse, &(i, j)) in self.synapse_key_map.iter().enumerate() {
            if i != j {
                graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), synapse);
            }
        }
        graph
    }
}
