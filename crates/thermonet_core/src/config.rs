//! Configuration management for network construction and simulation.
//!
//! This module provides strongly-typed configuration structures that map to a
//! `network.toml` file. Every construction and scheduling parameter can be
//! customized through it.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impl)
//! 2. TOML file (overrides defaults section by section)
//! 3. Command line overrides (seed, output directory)
//!
//! ## Example `network.toml`
//!
//! ```toml
//! [grid]
//! edge = 8
//! dimension = 2
//! bipartite = true
//!
//! [network]
//! mode = "neighbor"
//! neighbor_distances = [1]
//!
//! [simulation]
//! time = 50
//! seed = 42
//!
//! [[classes]]
//! name = "network"
//! role = "network"
//!
//! [[classes.variants]]
//! quantity = 64
//! connections = 4
//!
//! [[rules]]
//! classes = ["network", "network"]
//! rule = "adaptive"
//!
//! [[eras]]
//! epochs = 2
//! weight_update = true
//! logic_mode = "clamp"
//! ```

use crate::rules::RuleTable;
use serde::{Deserialize, Serialize};
use thermonet_data::{Era, LogicMode, NetworkMode, NodeRole, Parity, RuleType};

/// Largest grid the dense pair matrices are allowed to cover.
pub const MAX_GRID_POSITIONS: usize = 1 << 14;

/// Periodic grid geometry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Positions per axis.
    pub edge: usize,
    /// Number of axes.
    pub dimension: usize,
    /// Restrict edges to opposite-parity node pairs.
    pub bipartite: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            edge: 8,
            dimension: 2,
            bipartite: true,
        }
    }
}

impl GridConfig {
    /// Total number of grid positions (`edge ^ dimension`).
    #[must_use]
    pub fn positions(&self) -> usize {
        self.edge.saturating_pow(self.dimension as u32)
    }
}

/// Edge construction parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: NetworkMode,
    /// Scale of the gaussian/exponential pair weights.
    pub scale: f64,
    /// Grid distances considered neighbors before class-specific pruning.
    pub neighbor_distances: Vec<usize>,
    /// Extra BFS hops of the placement exclusion radius.
    pub bias_node_placement_separation: usize,
    /// Minimum graph distance between logic-group nodes.
    pub bias_node_link_separation: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::Neighbor,
            scale: 2.0,
            neighbor_distances: vec![1],
            bias_node_placement_separation: 1,
            bias_node_link_separation: 2,
        }
    }
}

/// Scheduler parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time steps per epoch.
    pub time: usize,
    pub seed: Option<u64>,
    /// Append per-node history every step.
    pub record_history: bool,
    /// Emit a per-node state record every step.
    pub record_node_states: bool,
    /// Update the nodes of a phase on the rayon pool.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time: 50,
            seed: None,
            record_history: false,
            record_node_states: false,
            parallel: true,
        }
    }
}

/// One parameter set of a node class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NodeVariant {
    pub quantity: usize,
    /// Odd-numbered instances take the opposite parity and inverted polarity.
    pub complement: bool,
    pub part: Parity,
    /// Number of discrete state levels.
    pub states: u32,
    /// Contribution to the target weight of every attached synapse.
    pub target: f64,
    /// Degree quota in probabilistic modes.
    pub connections: usize,
    pub polarity: i8,
    /// Half period of the clamp square wave, in steps.
    pub period: u32,
    pub energy_factor: f64,
    /// Temperature of the Boltzmann update.
    pub threshold: f64,
    /// Self-loop synapses attached to every instance.
    pub recur: usize,
    /// Neighbor distance set; empty means the network-wide set.
    pub neighbor_distances: Vec<usize>,
}

impl Default for NodeVariant {
    fn default() -> Self {
        Self {
            quantity: 0,
            complement: false,
            part: Parity::Any,
            states: 2,
            target: 0.0,
            connections: 4,
            polarity: 1,
            period: 0,
            energy_factor: 1.0,
            threshold: 1.0,
            recur: 0,
            neighbor_distances: Vec::new(),
        }
    }
}

/// A node class of the catalog. Catalog order is class precedence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeClassConfig {
    pub name: String,
    pub role: NodeRole,
    /// Run the exclusion test when placing instances of this class.
    #[serde(default)]
    pub placement_check: bool,
    pub variants: Vec<NodeVariant>,
}

/// Class-pair synapse rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SynapseRule {
    pub classes: [String; 2],
    pub rule: RuleType,
    pub bound: f64,
    pub noise: f64,
    pub size_mass: f64,
    pub change_mass: f64,
    pub energy_factor: f64,
    /// Nodes of these classes may sit next to each other.
    pub connect: bool,
}

impl Default for SynapseRule {
    fn default() -> Self {
        Self {
            classes: [String::new(), String::new()],
            rule: RuleType::Adaptive,
            bound: 2.0,
            noise: 0.1,
            size_mass: 10.0,
            change_mass: 20.0,
            energy_factor: 1.0,
            connect: true,
        }
    }
}

impl SynapseRule {
    fn between(a: &str, b: &str, rule: RuleType, connect: bool) -> Self {
        Self {
            classes: [a.to_string(), b.to_string()],
            rule,
            connect,
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub classes: Vec<NodeClassConfig>,
    pub rules: Vec<SynapseRule>,
    pub eras: Vec<Era>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            network: NetworkConfig::default(),
            simulation: SimulationConfig::default(),
            classes: vec![
                NodeClassConfig {
                    name: "bias".to_string(),
                    role: NodeRole::Bias,
                    placement_check: true,
                    variants: vec![NodeVariant {
                        quantity: 2,
                        complement: true,
                        target: 0.5,
                        connections: 2,
                        ..Default::default()
                    }],
                },
                NodeClassConfig {
                    name: "logic".to_string(),
                    role: NodeRole::Logic,
                    placement_check: true,
                    variants: vec![NodeVariant {
                        quantity: 2,
                        complement: true,
                        connections: 2,
                        period: 10,
                        ..Default::default()
                    }],
                },
                NodeClassConfig {
                    name: "network".to_string(),
                    role: NodeRole::Network,
                    placement_check: false,
                    variants: vec![NodeVariant {
                        quantity: 60,
                        connections: 4,
                        threshold: 0.5,
                        ..Default::default()
                    }],
                },
            ],
            rules: vec![
                SynapseRule::between("bias", "bias", RuleType::Fail, false),
                SynapseRule::between("bias", "logic", RuleType::Fail, false),
                SynapseRule::between("bias", "network", RuleType::Fixed, true),
                SynapseRule::between("logic", "logic", RuleType::Fail, false),
                SynapseRule::between("logic", "network", RuleType::Adaptive, true),
                SynapseRule::between("network", "network", RuleType::Adaptive, true),
            ],
            eras: vec![
                Era {
                    epochs: 2,
                    weight_update: false,
                    logic_mode: LogicMode::Noise,
                },
                Era {
                    epochs: 3,
                    weight_update: true,
                    logic_mode: LogicMode::Clamp,
                },
                Era {
                    epochs: 2,
                    weight_update: false,
                    logic_mode: LogicMode::Free,
                },
            ],
        }
    }
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    ///
    /// # Validation Rules
    /// - The grid is at least 2 wide, 1-dimensional and fits the pair matrices
    /// - Class quantities fill the grid exactly (one node per position)
    /// - Rules reference known classes and have positive masses
    /// - Classes with recurrent links never resolve to a `fixed` self rule
    /// - The era schedule is non-empty
    pub fn validate(&self) -> anyhow::Result<()> {
        // Grid validation
        anyhow::ensure!(self.grid.edge >= 2, "Grid edge must be at least 2");
        anyhow::ensure!(self.grid.dimension >= 1, "Grid dimension must be positive");
        let positions = self.grid.positions();
        anyhow::ensure!(
            positions <= MAX_GRID_POSITIONS,
            "Grid too large ({} positions, max {})",
            positions,
            MAX_GRID_POSITIONS
        );
        anyhow::ensure!(
            self.grid.edge * self.grid.dimension / 2 < usize::from(u16::MAX),
            "Grid diameter does not fit the distance metric"
        );

        // Network validation
        match self.network.mode {
            NetworkMode::Neighbor => anyhow::ensure!(
                !self.network.neighbor_distances.is_empty(),
                "Neighbor mode needs at least one neighbor distance"
            ),
            NetworkMode::Gaussian | NetworkMode::Exponential => anyhow::ensure!(
                self.network.scale > 0.0,
                "Network scale must be positive"
            ),
            NetworkMode::Random => {}
        }
        anyhow::ensure!(
            self.network.neighbor_distances.iter().all(|&d| d > 0),
            "Neighbor distances must be positive"
        );

        // Class validation
        anyhow::ensure!(!self.classes.is_empty(), "Node class catalog is empty");
        for (idx, class) in self.classes.iter().enumerate() {
            anyhow::ensure!(!class.name.is_empty(), "Node class {} has no name", idx);
            anyhow::ensure!(
                self.classes[..idx].iter().all(|c| c.name != class.name),
                "Duplicate node class '{}'",
                class.name
            );
            for variant in &class.variants {
                anyhow::ensure!(
                    variant.states >= 2,
                    "Class '{}' needs at least 2 states",
                    class.name
                );
                anyhow::ensure!(
                    variant.polarity == 1 || variant.polarity == -1,
                    "Class '{}' polarity must be +1 or -1",
                    class.name
                );
                anyhow::ensure!(
                    variant.threshold >= 0.0,
                    "Class '{}' threshold must be non-negative",
                    class.name
                );
                anyhow::ensure!(
                    variant.energy_factor >= 0.0,
                    "Class '{}' energy factor must be non-negative",
                    class.name
                );
                anyhow::ensure!(
                    variant.neighbor_distances.iter().all(|&d| d > 0),
                    "Class '{}' neighbor distances must be positive",
                    class.name
                );
            }
        }
        let total: usize = self
            .classes
            .iter()
            .flat_map(|c| c.variants.iter())
            .map(|v| v.quantity)
            .sum();
        anyhow::ensure!(
            total == positions,
            "Class quantities ({}) must fill the grid ({} positions)",
            total,
            positions
        );

        // Rule validation
        for rule in &self.rules {
            for name in &rule.classes {
                anyhow::ensure!(
                    self.class_rank(name).is_some(),
                    "Rule references unknown class '{}'",
                    name
                );
            }
            anyhow::ensure!(rule.bound >= 0.0, "Rule bound must be non-negative");
            anyhow::ensure!(rule.noise >= 0.0, "Rule noise must be non-negative");
            anyhow::ensure!(rule.size_mass >= 0.0, "Rule size mass must be non-negative");
            anyhow::ensure!(rule.change_mass > 0.0, "Rule change mass must be positive");
            anyhow::ensure!(
                rule.energy_factor >= 0.0,
                "Rule energy factor must be non-negative"
            );
        }
        let table = self.rule_table();
        for (rank, class) in self.classes.iter().enumerate() {
            if class.variants.iter().any(|v| v.recur > 0) {
                let self_rule = table.get(rank, rank).map(|r| r.rule);
                anyhow::ensure!(
                    matches!(self_rule, Some(RuleType::Adaptive)),
                    "Class '{}' has recurrent links but its self rule is not adaptive",
                    class.name
                );
            }
        }

        // Schedule validation
        anyhow::ensure!(!self.eras.is_empty(), "Era schedule is empty");
        anyhow::ensure!(self.simulation.time > 0, "Time steps per epoch must be positive");

        Ok(())
    }

    /// Loads and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back to TOML (the run snapshot).
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Position of a class in the catalog ordering.
    #[must_use]
    pub fn class_rank(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == name)
    }

    /// Resolves the rule list into a dense class-pair lookup.
    #[must_use]
    pub fn rule_table(&self) -> RuleTable {
        RuleTable::from_config(self)
    }

    #[must_use]
    pub fn total_epochs(&self) -> usize {
        self.eras.iter().map(|e| e.epochs).sum()
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.grid).as_bytes());
        hasher.update(format!("{:?}", self.network).as_bytes());
        hasher.update(format!("{:?}", self.classes).as_bytes());
        hasher.update(format!("{:?}", self.rules).as_bytes());
        hasher.update(format!("{:?}", self.eras).as_bytes());
        hasher.update(self.simulation.time.to_le_bytes());
        hex::encode(hasher.finalize())
    }
}
