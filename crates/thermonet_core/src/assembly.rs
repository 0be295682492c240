//! Instantiation of nodes and synapses from a finished topology.

use crate::config::{AppConfig, NodeVariant};
use crate::error::{NetworkError, Result};
use crate::graph::Topology;
use crate::placement::Placement;
use crate::rules::RuleTable;
use crate::units::{Node, NodeKind, NodeParams, Synapse, SynapseParams};
use rand::Rng;
use thermonet_data::{NodeId, RuleType};

/// Builds the node and synapse arenas and wires them together.
pub struct SynapseAssembler<'a> {
    config: &'a AppConfig,
    placement: &'a Placement,
    rules: &'a RuleTable,
}

impl<'a> SynapseAssembler<'a> {
    pub fn new(config: &'a AppConfig, placement: &'a Placement, rules: &'a RuleTable) -> Self {
        Self {
            config,
            placement,
            rules,
        }
    }

    fn variant(&self, node: NodeId) -> &NodeVariant {
        let placed = &self.placement.nodes[node];
        &self.config.classes[placed.class].variants[placed.variant]
    }

    /// One node per grid position, indexed by node id.
    pub fn nodes(&self) -> Vec<Node> {
        self.placement
            .nodes
            .iter()
            .enumerate()
            .map(|(id, placed)| {
                let variant = self.variant(id);
                Node::new(&NodeParams {
                    id,
                    class: placed.class,
                    kind: NodeKind::from_role(placed.role, variant.period),
                    states: variant.states,
                    polarity: placed.polarity,
                    energy_factor: variant.energy_factor,
                    threshold: variant.threshold,
                })
            })
            .collect()
    }

    /// Creates every synapse in id order and registers it on its endpoints.
    ///
    /// # Errors
    /// Returns [`NetworkError::RuleConfiguration`] for a synapse whose class pair
    /// resolves to a `fail` rule or has no rule at all.
    pub fn assemble<R: Rng>(
        &self,
        topology: &Topology,
        nodes: &mut [Node],
        rng: &mut R,
    ) -> Result<Vec<Synapse>> {
        let mut plastic = vec![false; topology.synapse_count()];
        for &k in &topology.plastic {
            plastic[k] = true;
        }

        let mut synapses = Vec::with_capacity(topology.synapse_count());
        for (k, &(i, j)) in topology.synapse_key_map.iter().enumerate() {
            let (ci, cj) = (self.placement.class_of(i), self.placement.class_of(j));
            let rule = match self.rules.get(ci, cj) {
                Some(rule) if rule.rule != RuleType::Fail => rule,
                _ => {
                    tracing::error!(synapse = k, i, j, "Synapse weight type is fail");
                    return Err(NetworkError::RuleConfiguration {
                        synapse: k,
                        class_i: self.config.classes[ci].name.clone(),
                        class_j: self.config.classes[cj].name.clone(),
                    });
                }
            };

            let target = self.variant(i).target + self.variant(j).target;
            let params = SynapseParams {
                id: k,
                rule: rule.rule,
                energy_factor: rule.energy_factor,
                depth: 0,
                bound: rule.bound,
                target,
                noise: rule.noise,
                size_mass: rule.size_mass,
                change_mass: rule.change_mass,
            };
            let mut synapse = Synapse::new(&params, i, j, plastic[k], rng);
            synapse.push_state(i, nodes[i].state.value);
            synapse.push_state(j, nodes[j].state.value);

            nodes[i].add_synapse(k, target);
            if i != j {
                nodes[j].add_synapse(k, target);
            }
            synapses.push(synapse);
        }

        tracing::info!(
            nodes = nodes.len(),
            synapses = synapses.len(),
            "Network build completed"
        );
        Ok(synapses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::placement_of;
    use crate::units::Plasticity;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use thermonet_data::NodeRole;

    #[test]
    fn test_targets_sum_and_self_loops_register_once() {
        let mut config = AppConfig::default();
        config.classes[2].variants[0].recur = 1;
        let rules = config.rule_table();
        // bias target 0.5, network target 0
        let placement = placement_of(&[(0, NodeRole::Bias), (2, NodeRole::Network)]);
        let mut topology = Topology::new(2);
        topology.add_edge(0, 1, &placement, &rules);
        topology.add_self_loop(1);
        topology.seal();

        let assembler = SynapseAssembler::new(&config, &placement, &rules);
        let mut nodes = assembler.nodes();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let synapses = assembler.assemble(&topology, &mut nodes, &mut rng).unwrap();

        assert_eq!(synapses.len(), 2);
        assert_eq!(synapses[0].target, 0.5);
        // bias-network is a fixed rule
        assert_eq!(synapses[0].plasticity, Plasticity::Fixed);
        assert_eq!(synapses[1].plasticity, Plasticity::Adaptive);
        assert_eq!(nodes[0].synapses.len(), 1);
        assert_eq!(nodes[1].synapses.len(), 2);
        assert_eq!(nodes[1].synapses[0].target, 0.5);
    }

    #[test]
    fn test_fail_rule_aborts_assembly() {
        let config = AppConfig::default();
        let rules = config.rule_table();
        let placement = placement_of(&[(1, NodeRole::Logic), (1, NodeRole::Logic)]);
        let mut topology = Topology::new(2);
        topology.add_edge(0, 1, &placement, &rules);
        topology.seal();

        let assembler = SynapseAssembler::new(&config, &placement, &rules);
        let mut nodes = assembler.nodes();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = assembler.assemble(&topology, &mut nodes, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::RuleConfiguration { synapse: 0, ref class_i, .. } if class_i == "logic"
        ));
    }
}
