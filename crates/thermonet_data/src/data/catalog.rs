use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a node class plays in the network.
///
/// Logic and bias classes form the "logic group" updated in the first phase of
/// every time step; network classes form the second phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Driven node evaluated for a solved condition each step.
    Logic,
    /// Fixed-role node holding its polarity; subject to separation constraints.
    Bias,
    /// Free node relaxing under the thermodynamic update rule.
    #[default]
    Network,
}

impl NodeRole {
    /// Logic and bias nodes share the first update phase and the separation rules.
    #[must_use]
    pub fn is_logic_group(self) -> bool {
        matches!(self, NodeRole::Logic | NodeRole::Bias)
    }
}

/// Synapse rule type from the class-pair rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Weight never changes after initialization.
    Fixed,
    /// Weight adapts while the era enables weight updates.
    #[default]
    Adaptive,
    /// Unintended class pairing; building such a synapse is a fatal error.
    Fail,
}

/// Edge construction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Connect mutual grid neighbors inside the configured distance sets.
    #[default]
    Neighbor,
    /// Uniform pair weights.
    Random,
    /// Pair weight `exp(-d^2 / 2 s^2)`.
    Gaussian,
    /// Pair weight `exp(-d / s)`.
    Exponential,
}

impl NetworkMode {
    #[must_use]
    pub fn is_probabilistic(self) -> bool {
        !matches!(self, NetworkMode::Neighbor)
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkMode::Neighbor => "neighbor",
            NetworkMode::Random => "random",
            NetworkMode::Gaussian => "gaussian",
            NetworkMode::Exponential => "exponential",
        };
        f.write_str(name)
    }
}

/// Grid parity requirement for placing a class instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    Any,
    Even,
    Odd,
}

impl Parity {
    /// The parity used by the complement instance of an alternating pair.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Parity::Any => Parity::Any,
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

/// Operating mode of logic nodes during an era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicMode {
    /// Uniformly random state each step.
    #[default]
    Noise,
    /// Square wave of the class period, signed by the node polarity.
    Clamp,
    /// Relax under the network rule like any other node.
    Free,
}

impl fmt::Display for LogicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicMode::Noise => "noise",
            LogicMode::Clamp => "clamp",
            LogicMode::Free => "free",
        };
        f.write_str(name)
    }
}

/// One block of the simulation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Era {
    pub epochs: usize,
    pub weight_update: bool,
    pub logic_mode: LogicMode,
}

impl Default for Era {
    fn default() -> Self {
        Self {
            epochs: 1,
            weight_update: true,
            logic_mode: LogicMode::Clamp,
        }
    }
}
