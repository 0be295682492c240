use super::Topology;
use crate::placement::Placement;
use crate::rules::RuleTable;
use std::collections::BTreeSet;
use thermonet_data::NodeId;

/// Connects every mutual pair of frozen neighbor sets exactly once.
pub struct NeighborGraphBuilder<'a> {
    placement: &'a Placement,
    rules: &'a RuleTable,
}

impl<'a> NeighborGraphBuilder<'a> {
    pub fn new(placement: &'a Placement, rules: &'a RuleTable) -> Self {
        Self { placement, rules }
    }

    /// Runs in O(N * k) for average neighbor set size k.
    pub fn build(&self) -> Topology {
        let n = self.placement.len();
        let mut pending: Vec<BTreeSet<NodeId>> = self.placement.neighbors.clone();
        let mut topology = Topology::new(n);

        for i in 0..n {
            let candidates: Vec<NodeId> = pending[i].iter().copied().collect();
            for j in candidates {
                // Consume the reverse reference so the pair is seen once.
                if pending[j].remove(&i) {
                    topology.add_edge(i, j, self.placement, self.rules);
                }
            }
        }

        tracing::info!(
            synapses = topology.edge_count(),
            order_eligible = topology.order.len(),
            "Neighbor graph built"
        );
        topology
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::graph::tests::placement_of;
    use std::collections::HashSet;
    use thermonet_data::NodeRole;

    #[test]
    fn test_one_synapse_per_mutual_pair() {
        let config = AppConfig::default();
        let rules = config.rule_table();
        let mut placement = placement_of(&[
            (2, NodeRole::Network),
            (2, NodeRole::Network),
            (2, NodeRole::Network),
            (1, NodeRole::Logic),
        ]);
        // 0-1 and 1-2 mutual, 2 -> 3 one-sided, 3 lists nobody
        placement.neighbors[0] = [1].into();
        placement.neighbors[1] = [0, 2].into();
        placement.neighbors[2] = [1, 3].into();

        let topology = NeighborGraphBuilder::new(&placement, &rules).build();
        assert_eq!(topology.edge_count(), 2);
        let pairs: HashSet<(usize, usize)> = topology
            .synapse_key_map
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        assert_eq!(pairs, HashSet::from([(0, 1), (1, 2)]));
        assert_eq!(topology.degree(3), 0);
    }
}
