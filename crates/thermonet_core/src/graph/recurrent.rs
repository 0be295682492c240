use super::Topology;
use crate::config::AppConfig;
use crate::placement::Placement;

/// Appends the configured self-loop synapses after every ordinary edge.
pub struct RecurrentLinkGenerator<'a> {
    config: &'a AppConfig,
    placement: &'a Placement,
}

impl<'a> RecurrentLinkGenerator<'a> {
    pub fn new(config: &'a AppConfig, placement: &'a Placement) -> Self {
        Self { config, placement }
    }

    /// Adds `recur` self loops per node in node order and seals the plastic set.
    pub fn apply(&self, topology: &mut Topology) {
        for (node, placed) in self.placement.nodes.iter().enumerate() {
            let recur = self.config.classes[placed.class].variants[placed.variant].recur;
            for _ in 0..recur {
                topology.add_self_loop(node);
            }
        }
        topology.seal();
        if !topology.recurrent.is_empty() {
            tracing::debug!(recurrent = topology.recurrent.len(), "Recurrent links added");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::placement_of;
    use thermonet_data::NodeRole;

    #[test]
    fn test_recurrent_ids_continue_after_edges() {
        let mut config = AppConfig::default();
        config.classes[2].variants[0].recur = 2;
        let rules = config.rule_table();
        let placement = placement_of(&[(2, NodeRole::Network), (1, NodeRole::Logic)]);

        let mut topology = Topology::new(2);
        topology.add_edge(0, 1, &placement, &rules);
        RecurrentLinkGenerator::new(&config, &placement).apply(&mut topology);

        assert_eq!(topology.recurrent, vec![1, 2]);
        assert_eq!(topology.endpoints(2), (0, 0));
        assert_eq!(topology.plastic, vec![0, 1, 2]);
        assert_eq!(topology.degree(0), 1);
    }
}
