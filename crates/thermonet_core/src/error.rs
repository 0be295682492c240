//! Error types for network construction.
//!
//! Placement, separation and rule failures are fatal for a run: the caller is
//! expected to tear down everything created for it and exit. Recoverable
//! construction problems (edge contention, unmet degree) never surface as errors;
//! they are counted in the `ConstructionReport`.

use thermonet_data::NodeId;
use thiserror::Error;

/// A logic-group node that ended up too close to another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparationViolation {
    pub node: NodeId,
    pub separation: usize,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    /// No viable grid position remains for a class instance.
    #[error("placement failure for class '{class}' instance {instance}: no viable {pool} position")]
    Placement {
        class: String,
        instance: usize,
        pool: &'static str,
    },

    /// The realized graph puts logic-group nodes closer than allowed.
    #[error("separation failure: minimum separation {found} < required {required} ({} node(s) in violation)", .violations.len())]
    Separation {
        found: usize,
        required: usize,
        violations: Vec<SeparationViolation>,
    },

    /// A synapse resolved to an unsupported class pairing.
    #[error("rule configuration failure: synapse {synapse} joins '{class_i}' and '{class_j}'")]
    RuleConfiguration {
        synapse: usize,
        class_i: String,
        class_j: String,
    },

    /// Invalid configuration detected before construction.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    #[must_use]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Fatal errors abort the run with a full teardown.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Placement { .. } | Self::Separation { .. } | Self::RuleConfiguration { .. } => {
                true
            }
            Self::Config(_) => false,
        }
    }
}
