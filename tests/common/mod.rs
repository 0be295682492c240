use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thermonet_core::config::{AppConfig, NodeClassConfig, NodeVariant, SynapseRule};
use thermonet_data::{Era, LogicMode, NetworkMode, NodeRole, RuleType};

/// Builds small configurations for integration tests.
#[allow(dead_code)]
pub struct ConfigBuilder {
    config: AppConfig,
}

#[allow(dead_code)]
impl ConfigBuilder {
    /// Starts from the default 8x8 network.
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Starts from an empty catalog and rule table on the given grid.
    pub fn empty(edge: usize, dimension: usize) -> Self {
        let mut config = AppConfig::default();
        config.grid.edge = edge;
        config.grid.dimension = dimension;
        config.classes.clear();
        config.rules.clear();
        Self { config }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.simulation.seed = Some(seed);
        self
    }

    pub fn bipartite(mut self, bipartite: bool) -> Self {
        self.config.grid.bipartite = bipartite;
        self
    }

    pub fn mode(mut self, mode: NetworkMode) -> Self {
        self.config.network.mode = mode;
        self
    }

    pub fn link_separation(mut self, separation: usize) -> Self {
        self.config.network.bias_node_link_separation = separation;
        self
    }

    pub fn class(mut self, class: NodeClassConfig) -> Self {
        self.config.classes.push(class);
        self
    }

    pub fn rule(mut self, a: &str, b: &str, rule: RuleType) -> Self {
        self.config.rules.push(SynapseRule {
            classes: [a.to_string(), b.to_string()],
            rule,
            connect: rule != RuleType::Fail,
            ..Default::default()
        });
        self
    }

    pub fn eras(mut self, eras: Vec<Era>, time: usize) -> Self {
        self.config.eras = eras;
        self.config.simulation.time = time;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// One class with a single variant.
#[allow(dead_code)]
pub fn class(name: &str, role: NodeRole, quantity: usize, connections: usize) -> NodeClassConfig {
    NodeClassConfig {
        name: name.to_string(),
        role,
        placement_check: false,
        variants: vec![NodeVariant {
            quantity,
            connections,
            ..Default::default()
        }],
    }
}

#[allow(dead_code)]
pub fn era(epochs: usize, weight_update: bool, logic_mode: LogicMode) -> Era {
    Era {
        epochs,
        weight_update,
        logic_mode,
    }
}

/// Unique directory under the system temp dir; not created.
#[allow(dead_code)]
pub fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "thermonet_it_{}_{}_{}",
        tag,
        std::process::id(),
        nanos
    ))
}
