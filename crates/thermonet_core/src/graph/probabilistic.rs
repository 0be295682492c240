//! Quota-driven edge sampling for the random, gaussian and exponential modes.
//!
//! Edges are drawn one at a time: a node `i` weighted by its remaining degree
//! quota, then a partner `j` weighted by pair eligibility times the distance
//! kernel of the mode. Draws that would strand another node below its quota, or
//! bring two logic-group nodes too close, are discarded in place and the pair is
//! never drawn again. Quota that can no longer be met is written off as unmet
//! connections.
//!
//! ## Bookkeeping
//!
//! - `eligible[i][j]`: the pair may still become an edge
//! - `active[v]`: `v` has remaining quota
//! - `mask_sum[v]`: number of `u` with `eligible[v][u] && active[u]`
//!
//! Every iteration either accepts an edge, clears one eligible pair, or retires
//! a node, so the loop terminates. Quota only ever leaves a node as a realized
//! edge end or as a recorded failure, which keeps
//! `sum(degree) + failures == sum(quota)`.

use super::Topology;
use crate::config::AppConfig;
use crate::grid::GridTopology;
use crate::placement::Placement;
use crate::rules::RuleTable;
use crate::sampler::{prefix_sample, FenwickSampler};
use rand::Rng;
use std::collections::VecDeque;
use thermonet_data::{NetworkMode, NodeId};

/// Edge set plus the recoverable diagnostics of a probabilistic build.
#[derive(Debug, Clone)]
pub struct ProbabilisticOutcome {
    pub topology: Topology,
    /// Configured degree quota per node.
    pub quotas: Vec<usize>,
    /// Quota written off per node.
    pub failures: Vec<usize>,
    pub contention_events: usize,
    pub separation_conflicts: usize,
}

impl ProbabilisticOutcome {
    #[must_use]
    pub fn unmet_connections(&self) -> usize {
        self.failures.iter().sum()
    }
}

/// Samples edges under degree quotas, pair eligibility and bias separation.
pub struct ProbabilisticGraphBuilder<'a> {
    config: &'a AppConfig,
    grid: &'a GridTopology,
    placement: &'a Placement,
    rules: &'a RuleTable,
}

struct SamplerState {
    n: usize,
    eligible: Vec<bool>,
    active: Vec<bool>,
    quota: Vec<usize>,
    mask_sum: Vec<usize>,
    bias_distance: Vec<usize>,
    failures: Vec<usize>,
    sampler: FenwickSampler,
}

impl SamplerState {
    #[inline]
    fn is_eligible(&self, a: NodeId, b: NodeId) -> bool {
        self.eligible[a * self.n + b]
    }

    fn clear_pair(&mut self, a: NodeId, b: NodeId) {
        self.eligible[a * self.n + b] = false;
        self.eligible[b * self.n + a] = false;
        self.mask_sum[a] -= 1;
        self.mask_sum[b] -= 1;
    }

    /// Removes `v` from every remaining partner count.
    fn retire(&mut self, v: NodeId) {
        self.active[v] = false;
        self.sampler.set(v, 0.0);
        for u in 0..self.n {
            if self.active[u] && self.is_eligible(v, u) {
                self.mask_sum[u] -= 1;
            }
        }
    }

    /// Writes off the remaining quota of a node that has run out of partners.
    fn exhaust(&mut self, v: NodeId) {
        let unmet = self.quota[v];
        tracing::debug!(node = v, unmet, "Connection failure");
        self.failures[v] += unmet;
        self.quota[v] = 0;
        self.retire(v);
    }

    /// Discards a drawn pair and exhausts any endpoint left without partners.
    fn discard(&mut self, a: NodeId, b: NodeId) {
        self.clear_pair(a, b);
        for v in [a, b] {
            if self.active[v] && self.mask_sum[v] == 0 {
                self.exhaust(v);
            }
        }
    }

    /// Whether accepting `(i, j)` keeps every currently satisfiable node
    /// satisfiable.
    ///
    /// The endpoints lose exactly one partner and one unit of quota each, so only
    /// third parties of an endpoint that would saturate can be affected.
    fn preserves_feasibility(&self, i: NodeId, j: NodeId) -> bool {
        let saturating: Vec<NodeId> = [i, j]
            .into_iter()
            .filter(|&v| self.quota[v] == 1)
            .collect();
        if saturating.is_empty() {
            return true;
        }

        (0..self.n)
            .filter(|&u| u != i && u != j && self.active[u])
            .all(|u| {
                let loss = saturating
                    .iter()
                    .filter(|&&v| self.is_eligible(v, u))
                    .count();
                let (have, need) = (self.mask_sum[u], self.quota[u]);
                loss == 0 || have < need || have - loss >= need
            })
    }
}

impl<'a> ProbabilisticGraphBuilder<'a> {
    pub fn new(
        config: &'a AppConfig,
        grid: &'a GridTopology,
        placement: &'a Placement,
        rules: &'a RuleTable,
    ) -> Self {
        Self {
            config,
            grid,
            placement,
            rules,
        }
    }

    /// Relative likelihood of connecting two nodes at grid distance `d`.
    fn pair_weight(&self, d: usize) -> f64 {
        let scale = self.config.network.scale;
        let d = d as f64;
        match self.config.network.mode {
            NetworkMode::Gaussian => (-d * d / (2.0 * scale * scale)).exp(),
            NetworkMode::Exponential => (-d / scale).exp(),
            NetworkMode::Random | NetworkMode::Neighbor => 1.0,
        }
    }

    fn initial_state(&self) -> SamplerState {
        let n = self.placement.len();
        let bipartite = self.config.grid.bipartite;

        let mut eligible = vec![false; n * n];
        for a in 0..n {
            for b in 0..n {
                eligible[a * n + b] = if bipartite {
                    self.grid.parity(a) != self.grid.parity(b)
                } else {
                    a != b
                };
            }
        }

        let quota: Vec<usize> = self
            .placement
            .nodes
            .iter()
            .map(|p| self.config.classes[p.class].variants[p.variant].connections)
            .collect();
        let active: Vec<bool> = quota.iter().map(|&q| q > 0).collect();
        let mask_sum = (0..n)
            .map(|a| (0..n).filter(|&b| active[b] && eligible[a * n + b]).count())
            .collect();
        let weights: Vec<f64> = quota.iter().map(|&q| q as f64).collect();

        SamplerState {
            n,
            eligible,
            active,
            mask_sum,
            bias_distance: self.placement.bias_distance.clone(),
            failures: vec![0; n],
            sampler: FenwickSampler::from_weights(&weights),
            quota,
        }
    }

    /// Samples edges until no quota or eligible pair remains.
    pub fn build<R: Rng>(&self, rng: &mut R) -> ProbabilisticOutcome {
        let mut state = self.initial_state();
        let quotas = state.quota.clone();
        let n = state.n;
        let link_separation = self.config.network.bias_node_link_separation;

        let mut topology = Topology::new(n);
        let mut row = vec![0.0; n];
        let mut scratch = Vec::with_capacity(n);
        let mut contention_events = 0;
        let mut separation_conflicts = 0;

        while let Some(i) = state.sampler.sample(rng) {
            for (j, w) in row.iter_mut().enumerate() {
                *w = if state.active[j] && state.is_eligible(i, j) {
                    self.pair_weight(self.grid.distance(i, j))
                } else {
                    0.0
                };
            }
            let Some(j) = prefix_sample(&row, &mut scratch, rng) else {
                state.exhaust(i);
                continue;
            };

            if !state.preserves_feasibility(i, j) {
                contention_events += 1;
                tracing::trace!(i, j, "Connectivity conflict corrected");
                state.discard(i, j);
                continue;
            }

            if state.bias_distance[i] + state.bias_distance[j] + 1 < link_separation {
                separation_conflicts += 1;
                tracing::trace!(i, j, "Bias node separation conflict corrected");
                state.discard(i, j);
                continue;
            }

            state.clear_pair(i, j);
            for v in [i, j] {
                state.quota[v] -= 1;
                if state.quota[v] == 0 {
                    state.retire(v);
                } else {
                    state.sampler.set(v, state.quota[v] as f64);
                }
            }
            topology.add_edge(i, j, self.placement, self.rules);
            relax_bias_distance(&mut state.bias_distance, &topology, i, j);
        }

        let outcome = ProbabilisticOutcome {
            topology,
            quotas,
            failures: state.failures,
            contention_events,
            separation_conflicts,
        };
        tracing::info!(
            mode = %self.config.network.mode,
            synapses = outcome.topology.edge_count(),
            failures = outcome.unmet_connections(),
            contention_events,
            separation_conflicts,
            "Probabilistic graph built"
        );
        outcome
    }
}

/// Propagates the shorter link distances created by a new edge `(i, j)`.
///
/// FIFO worklist seeded at both endpoints; every node is re-queued only when its
/// distance strictly decreases.
fn relax_bias_distance(distance: &mut [usize], topology: &Topology, i: NodeId, j: NodeId) {
    let mut queue = VecDeque::from([i, j]);
    while let Some(m) = queue.pop_front() {
        let through = distance[m] + 1;
        for &l in &topology.node_to_node[m] {
            if distance[l] > through {
                distance[l] = through;
                queue.push_back(l);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, NetworkConfig, NodeClassConfig, NodeVariant, SynapseRule};
    use crate::graph::tests::placement_of;
    use crate::placement::NodePlacementEngine;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use thermonet_data::{NodeRole, RuleType};

    fn random_config(edge: usize, connections: usize, bipartite: bool) -> AppConfig {
        AppConfig {
            grid: GridConfig {
                edge,
                dimension: 2,
                bipartite,
            },
            network: NetworkConfig {
                mode: NetworkMode::Random,
                bias_node_link_separation: 0,
                ..Default::default()
            },
            classes: vec![NodeClassConfig {
                name: "network".to_string(),
                role: NodeRole::Network,
                placement_check: false,
                variants: vec![NodeVariant {
                    quantity: edge * edge,
                    connections,
                    ..Default::default()
                }],
            }],
            rules: vec![SynapseRule {
                classes: ["network".to_string(), "network".to_string()],
                rule: RuleType::Adaptive,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn build(config: &AppConfig, seed: u64) -> ProbabilisticOutcome {
        let grid = GridTopology::new(config.grid.edge, config.grid.dimension);
        let rules = config.rule_table();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placement = NodePlacementEngine::new(config, &grid, &rules)
            .place(&mut rng)
            .unwrap();
        ProbabilisticGraphBuilder::new(config, &grid, &placement, &rules).build(&mut rng)
    }

    fn assert_conserved(outcome: &ProbabilisticOutcome) {
        let topology = &outcome.topology;
        for v in 0..topology.node_count() {
            assert_eq!(
                topology.degree(v),
                outcome.quotas[v] - outcome.failures[v],
                "node {}",
                v
            );
        }
        let degrees: usize = (0..topology.node_count()).map(|v| topology.degree(v)).sum();
        assert_eq!(2 * topology.edge_count(), degrees);
        assert_eq!(
            degrees + outcome.unmet_connections(),
            outcome.quotas.iter().sum::<usize>()
        );
    }

    #[test]
    fn test_random_graph_conserves_quota() {
        let config = random_config(10, 4, false);
        for seed in 0..5 {
            let outcome = build(&config, seed);
            assert_conserved(&outcome);
        }
    }

    #[test]
    fn test_bipartite_edges_join_opposite_parity() {
        let config = random_config(6, 3, true);
        let grid = GridTopology::new(6, 2);
        let outcome = build(&config, 11);
        assert_conserved(&outcome);
        for &(a, b) in &outcome.topology.synapse_key_map {
            assert_ne!(grid.parity(a), grid.parity(b));
        }
    }

    #[test]
    fn test_no_duplicate_pairs() {
        let mut config = random_config(4, 15, false);
        config.network.mode = NetworkMode::Exponential;
        config.network.scale = 1.0;
        let outcome = build(&config, 2);
        assert_conserved(&outcome);
        let mut pairs: Vec<(usize, usize)> = outcome
            .topology
            .synapse_key_map
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        let total = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
        // Every node can reach every other node: a complete graph.
        assert_eq!(total, 16 * 15 / 2);
    }

    #[test]
    fn test_impossible_quota_is_written_off() {
        // Two nodes can share at most one edge.
        let mut config = random_config(2, 3, false);
        config.grid.dimension = 1;
        config.classes[0].variants[0].quantity = 2;
        let outcome = build(&config, 0);
        assert_eq!(outcome.topology.edge_count(), 1);
        assert_eq!(outcome.unmet_connections(), 4);
        assert_conserved(&outcome);
    }

    #[test]
    fn test_relaxation_propagates_along_paths() {
        let config = AppConfig::default();
        let rules = config.rule_table();
        let placement = placement_of(&[
            (1, NodeRole::Logic),
            (2, NodeRole::Network),
            (2, NodeRole::Network),
            (2, NodeRole::Network),
        ]);
        let mut distance = vec![0, 8, 8, 8];
        let mut topology = Topology::new(4);
        topology.add_edge(2, 3, &placement, &rules);
        relax_bias_distance(&mut distance, &topology, 2, 3);
        assert_eq!(distance, vec![0, 8, 8, 8]);

        topology.add_edge(1, 2, &placement, &rules);
        relax_bias_distance(&mut distance, &topology, 1, 2);
        topology.add_edge(0, 1, &placement, &rules);
        relax_bias_distance(&mut distance, &topology, 0, 1);
        assert_eq!(distance, vec![0, 1, 2, 3]);
    }
}
