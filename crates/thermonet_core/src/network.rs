//! The owned simulation context.
//!
//! [`Network::build`] runs the whole construction pipeline:
//!
//! 1. grid metric
//! 2. node placement
//! 3. neighbor or probabilistic edge construction
//! 4. separation check
//! 5. recurrent links
//! 6. node and synapse assembly
//!
//! Every later stage (scheduler, statistics, histograms, record writers) borrows
//! the resulting [`Network`].

use crate::assembly::SynapseAssembler;
use crate::config::AppConfig;
use crate::error::{NetworkError, Result};
use crate::graph::{
    NeighborGraphBuilder, ProbabilisticGraphBuilder, RecurrentLinkGenerator, SeparationValidator,
    Topology,
};
use crate::grid::GridTopology;
use crate::placement::{NodePlacementEngine, Placement};
use crate::units::{Node, Synapse, UpdateContext};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thermonet_data::{ConstructionReport, NodeId, NodeRecord, NodeRole, Parity, SynapseId};

/// Nodes updated together and the synapses they touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Phase {
    pub nodes: Vec<NodeId>,
    /// Sorted, without duplicates.
    pub synapses: Vec<SynapseId>,
}

impl Phase {
    fn new(nodes: Vec<NodeId>, topology: &Topology) -> Self {
        let mut synapses: Vec<SynapseId> = nodes
            .iter()
            .flat_map(|&i| topology.node_to_synapse[i].iter().copied())
            .collect();
        synapses.sort_unstable();
        synapses.dedup();
        Self { nodes, synapses }
    }
}

/// Arenas, topology and schedule inputs of one run.
#[derive(Debug, Clone)]
pub struct Network {
    pub config: AppConfig,
    pub seed: u64,
    pub grid: GridTopology,
    pub placement: Placement,
    pub topology: Topology,
    pub nodes: Vec<Node>,
    pub synapses: Vec<Synapse>,
    /// `+1`/`-1` by grid parity on bipartite grids, `+1` otherwise and for the logic group.
    pub display_polarity: Vec<i8>,
    pub report: ConstructionReport,
    logic_phase: Phase,
    network_phase: Phase,
    logic_nodes: Vec<NodeId>,
}

impl Network {
    /// Builds a network, seeding from `simulation.seed` or from entropy.
    pub fn build(config: &AppConfig) -> Result<Self> {
        let seed = config.simulation.seed.unwrap_or_else(rand::random::<u64>);
        Self::build_with_seed(config, seed)
    }

    /// Builds a network from an explicit seed. Same config and seed, same network.
    ///
    /// # Errors
    /// Configuration errors are reported before anything is built; placement,
    /// separation and rule failures abort the build.
    pub fn build_with_seed(config: &AppConfig, seed: u64) -> Result<Self> {
        config
            .validate()
            .map_err(|e| NetworkError::config(format!("{:#}", e)))?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = GridTopology::new(config.grid.edge, config.grid.dimension);
        let rules = config.rule_table();
        tracing::info!(
            edge = grid.edge(),
            dimension = grid.dimension(),
            positions = grid.len(),
            seed,
            "Grid metric computed"
        );

        let placement = NodePlacementEngine::new(config, &grid, &rules).place(&mut rng)?;

        let mut report = ConstructionReport {
            mode: config.network.mode,
            nodes: placement.len(),
            placement_conflicts: placement.conflicts,
            ..Default::default()
        };

        let mut topology = if config.network.mode.is_probabilistic() {
            let outcome =
                ProbabilisticGraphBuilder::new(config, &grid, &placement, &rules).build(&mut rng);
            report.contention_events = outcome.contention_events;
            report.separation_conflicts = outcome.separation_conflicts;
            report.unmet_connections = outcome.unmet_connections();
            if report.unmet_connections > 0 {
                tracing::warn!(
                    unmet = report.unmet_connections,
                    "Degree quota not fully satisfied"
                );
            }
            outcome.topology
        } else {
            NeighborGraphBuilder::new(&placement, &rules).build()
        };

        report.min_separation = SeparationValidator::new(
            &placement,
            grid.edge(),
            config.network.bias_node_link_separation,
        )
        .validate(&topology)?;

        RecurrentLinkGenerator::new(config, &placement).apply(&mut topology);

        let assembler = SynapseAssembler::new(config, &placement, &rules);
        let mut nodes = assembler.nodes();
        let synapses = assembler.assemble(&topology, &mut nodes, &mut rng)?;

        report.edges = topology.edge_count();
        report.recurrent = topology.recurrent.len();
        report.order_eligible = topology.order.len();
        report.plastic = topology.plastic.len();

        let display_polarity = (0..placement.len())
            .map(|i| {
                if placement.role_of(i).is_logic_group() || !config.grid.bipartite {
                    1
                } else if grid.parity(i) == Parity::Even {
                    1
                } else {
                    -1
                }
            })
            .collect();

        let (logic_group, network_group): (Vec<NodeId>, Vec<NodeId>) =
            (0..placement.len()).partition(|&i| placement.role_of(i).is_logic_group());
        let logic_nodes = logic_group
            .iter()
            .copied()
            .filter(|&i| placement.role_of(i) == NodeRole::Logic)
            .collect();
        let logic_phase = Phase::new(logic_group, &topology);
        let network_phase = Phase::new(network_group, &topology);

        Ok(Self {
            config: config.clone(),
            seed,
            grid,
            placement,
            topology,
            nodes,
            synapses,
            display_polarity,
            report,
            logic_phase,
            network_phase,
            logic_nodes,
        })
    }

    /// Logic and bias nodes.
    #[inline]
    pub fn logic_group(&self) -> &[NodeId] {
        &self.logic_phase.nodes
    }

    #[inline]
    pub fn network_group(&self) -> &[NodeId] {
        &self.network_phase.nodes
    }

    /// Logic-role nodes only (evaluated for the solved condition).
    #[inline]
    pub fn logic_nodes(&self) -> &[NodeId] {
        &self.logic_nodes
    }

    /// Updates the logic group.
    pub fn update_logic_phase(&mut self, ctx: &UpdateContext) {
        let Self {
            nodes,
            synapses,
            logic_phase,
            config,
            ..
        } = self;
        run_phase(nodes, synapses, logic_phase, ctx, &config.simulation);
    }

    /// Updates the network group.
    pub fn update_network_phase(&mut self, ctx: &UpdateContext) {
        let Self {
            nodes,
            synapses,
            network_phase,
            config,
            ..
        } = self;
        run_phase(nodes, synapses, network_phase, ctx, &config.simulation);
    }

    /// Read-only check of every logic node against its current field.
    pub fn evaluate_logic(&mut self) {
        let Self {
            nodes,
            synapses,
            logic_nodes,
            ..
        } = self;
        for &i in logic_nodes.iter() {
            nodes[i].evaluate(synapses);
        }
    }

    /// Static description of every node for the topology file.
    pub fn node_records(&self) -> Vec<NodeRecord> {
        self.nodes
            .iter()
            .map(|node| NodeRecord {
                id: node.id,
                class: self.config.classes[node.class].name.clone(),
                role: node.role(),
                position: self.grid.coordinates(node.id).to_vec(),
            })
            .collect()
    }
}

/// One synchronous phase: compute from pre-phase synapse values, commit, push,
/// then adapt the touched synapses.
fn run_phase(
    nodes: &mut [Node],
    synapses: &mut [Synapse],
    phase: &Phase,
    ctx: &UpdateContext,
    simulation: &crate::config::SimulationConfig,
) {
    let next: Vec<_> = {
        let (nodes, synapses) = (&*nodes, &*synapses);
        if simulation.parallel {
            phase
                .nodes
                .par_iter()
                .map(|&i| nodes[i].compute(ctx, synapses))
                .collect()
        } else {
            phase
                .nodes
                .iter()
                .map(|&i| nodes[i].compute(ctx, synapses))
                .collect()
        }
    };

    for (&i, state) in phase.nodes.iter().zip(next) {
        nodes[i].commit(state, ctx.time, simulation.record_history);
    }

    for &i in &phase.nodes {
        let value = nodes[i].state.value;
        for link in &nodes[i].synapses {
            synapses[link.synapse].push_state(i, value);
        }
    }

    if ctx.weight_update {
        for &k in &phase.synapses {
            synapses[k].update_state(true);
        }
    }
}
