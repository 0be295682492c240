//! Node placement on the grid.
//!
//! Class instances are placed in catalog order. Every instance draws a free grid
//! position from its parity pool and, when its class asks for it, rejects
//! candidates whose exclusion radius reaches an already placed node of a class it
//! may not connect to. Once a node is accepted its neighbor set is frozen.

use crate::config::{AppConfig, NodeVariant};
use crate::error::{NetworkError, Result};
use crate::grid::GridTopology;
use crate::rules::RuleTable;
use rand::Rng;
use std::collections::BTreeSet;
use thermonet_data::{NetworkMode, NodeId, NodeRole, Parity};

/// Identity of the class instance occupying a grid position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    /// Catalog rank of the node class.
    pub class: usize,
    pub variant: usize,
    /// Instance number within the variant.
    pub instance: usize,
    pub role: NodeRole,
    /// Second member of an alternating complement pair.
    pub complement: bool,
    pub polarity: i8,
}

/// Result of placing every class instance.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Indexed by node id (grid position).
    pub nodes: Vec<PlacedNode>,
    /// Frozen neighbor sets after one-sided references were pruned.
    pub neighbors: Vec<BTreeSet<NodeId>>,
    /// Initial link distance to the nearest logic-group node.
    pub bias_distance: Vec<usize>,
    /// Candidates rejected by the exclusion test.
    pub conflicts: usize,
}

impl Placement {
    #[inline]
    pub fn class_of(&self, node: NodeId) -> usize {
        self.nodes[node].class
    }

    #[inline]
    pub fn role_of(&self, node: NodeId) -> NodeRole {
        self.nodes[node].role
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Places class instances on free grid positions.
pub struct NodePlacementEngine<'a> {
    config: &'a AppConfig,
    grid: &'a GridTopology,
    rules: &'a RuleTable,
}

impl<'a> NodePlacementEngine<'a> {
    pub fn new(config: &'a AppConfig, grid: &'a GridTopology, rules: &'a RuleTable) -> Self {
        Self {
            config,
            grid,
            rules,
        }
    }

    /// Places every instance of every class, in catalog order.
    ///
    /// # Errors
    /// Returns [`NetworkError::Placement`] when a class instance runs out of viable
    /// positions in its pool.
    pub fn place<R: Rng>(&self, rng: &mut R) -> Result<Placement> {
        let n = self.grid.len();
        let network_distances = &self.config.network.neighbor_distances;
        let mut neighbors: Vec<BTreeSet<NodeId>> = (0..n)
            .map(|i| self.grid.nodes_at(i, network_distances).into_iter().collect())
            .collect();

        let (mut available_even, mut available_odd): (Vec<NodeId>, Vec<NodeId>) =
            (0..n).partition(|&i| self.grid.parity(i) == Parity::Even);
        let mut occupant: Vec<Option<PlacedNode>> = vec![None; n];
        let mut conflicts = 0;

        let restrict_parity =
            self.config.grid.bipartite || self.config.network.mode == NetworkMode::Neighbor;

        for (rank, class) in self.config.classes.iter().enumerate() {
            for (variant_idx, variant) in class.variants.iter().enumerate() {
                let distances = if variant.neighbor_distances.is_empty() {
                    network_distances
                } else {
                    &variant.neighbor_distances
                };

                for instance in 0..variant.quantity {
                    let complement = variant.complement && instance % 2 == 1;
                    // `part` is the pool of the leading instance; its complement takes the other.
                    let pool = if !restrict_parity {
                        Parity::Any
                    } else if complement {
                        variant.part.flipped()
                    } else {
                        variant.part
                    };

                    let mut viable_even = available_even.clone();
                    let mut viable_odd = available_odd.clone();
                    let (node, own) = loop {
                        let candidate = draw(pool, &viable_even, &viable_odd, rng).ok_or_else(|| {
                            NetworkError::Placement {
                                class: class.name.clone(),
                                instance,
                                pool: pool_name(pool),
                            }
                        })?;
                        let own: BTreeSet<NodeId> =
                            self.grid.nodes_at(candidate, distances).into_iter().collect();

                        if !class.placement_check
                            || self.is_clear(rank, &own, &neighbors, &occupant)
                        {
                            break (candidate, own);
                        }

                        conflicts += 1;
                        tracing::debug!(
                            class = %class.name,
                            instance,
                            candidate,
                            "Placement conflict with neighbor nodes"
                        );
                        viable_even.retain(|&p| p != candidate);
                        viable_odd.retain(|&p| p != candidate);
                    };

                    available_even.retain(|&p| p != node);
                    available_odd.retain(|&p| p != node);

                    let stale: Vec<NodeId> = neighbors[node].difference(&own).copied().collect();
                    for j in stale {
                        neighbors[j].remove(&node);
                    }
                    neighbors[node] = own;

                    occupant[node] = Some(placed_node(rank, variant_idx, instance, class.role, complement, variant));
                }
            }
        }

        let nodes = occupant
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.ok_or_else(|| {
                    NetworkError::config(format!("grid position {} was left empty", id))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let edge = self.grid.edge();
        let bias_distance = nodes
            .iter()
            .map(|p| if p.role.is_logic_group() { 0 } else { edge })
            .collect();

        tracing::info!(nodes = n, conflicts, "Node placement completed");

        Ok(Placement {
            nodes,
            neighbors,
            bias_distance,
            conflicts,
        })
    }

    /// Grows the exclusion radius hop by hop and checks every placed node inside it.
    fn is_clear(
        &self,
        rank: usize,
        own: &BTreeSet<NodeId>,
        neighbors: &[BTreeSet<NodeId>],
        occupant: &[Option<PlacedNode>],
    ) -> bool {
        let allowed = |k: NodeId| {
            occupant[k]
                .as_ref()
                .map_or(true, |placed| self.rules.connect(rank, placed.class))
        };

        if !own.iter().all(|&k| allowed(k)) {
            return false;
        }

        let mut reached = vec![false; occupant.len()];
        for &k in own {
            reached[k] = true;
        }
        let mut frontier: Vec<NodeId> = own.iter().copied().collect();

        for _ in 0..self.config.network.bias_node_placement_separation {
            let mut next = Vec::new();
            for &k in &frontier {
                for &m in &neighbors[k] {
                    if !reached[m] {
                        reached[m] = true;
                        next.push(m);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            if !next.iter().all(|&k| allowed(k)) {
                return false;
            }
            frontier = next;
        }
        true
    }
}

fn placed_node(
    class: usize,
    variant: usize,
    instance: usize,
    role: NodeRole,
    complement: bool,
    config: &NodeVariant,
) -> PlacedNode {
    PlacedNode {
        class,
        variant,
        instance,
        role,
        complement,
        polarity: if complement {
            -config.polarity
        } else {
            config.polarity
        },
    }
}

fn draw<R: Rng>(pool: Parity, even: &[NodeId], odd: &[NodeId], rng: &mut R) -> Option<NodeId> {
    match pool {
        Parity::Even if !even.is_empty() => Some(even[rng.gen_range(0..even.len())]),
        Parity::Odd if !odd.is_empty() => Some(odd[rng.gen_range(0..odd.len())]),
        Parity::Any => {
            let total = even.len() + odd.len();
            if total == 0 {
                return None;
            }
            let k = rng.gen_range(0..total);
            Some(if k < even.len() {
                even[k]
            } else {
                odd[k - even.len()]
            })
        }
        _ => None,
    }
}

fn pool_name(pool: Parity) -> &'static str {
    match pool {
        Parity::Any => "any",
        Parity::Even => "even",
        Parity::Odd => "odd",
    }
}
