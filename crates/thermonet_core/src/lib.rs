//! # Thermonet Core
//!
//! Construction and simulation engine for thermodynamic node networks on a
//! periodic grid.
//!
//! This crate contains:
//! - The D-torus grid metric
//! - Node placement under parity and exclusion rules
//! - Neighbor and quota-driven probabilistic edge construction
//! - Separation checks, recurrent links and synapse assembly
//! - The era / epoch / time-step scheduler and its statistics
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use thermonet_core::config::AppConfig;
//! use thermonet_core::network::Network;
//! use thermonet_core::scheduler::{MemorySink, SimulationScheduler};
//!
//! let mut config = AppConfig::default();
//! config.simulation.time = 2;
//! let mut network = Network::build_with_seed(&config, 42).unwrap();
//! let scheduler = SimulationScheduler::from_network(&network);
//! let mut sink = MemorySink::default();
//! let summary = scheduler.run(&mut network, &mut sink).unwrap();
//! assert_eq!(sink.epochs.len(), config.total_epochs());
//! assert_eq!(summary.steps as usize, config.total_epochs() * 2);
//! ```

/// Node and synapse instantiation from a finished topology
pub mod assembly;
/// Configuration management for construction and scheduling parameters
pub mod config;
/// Construction error taxonomy
pub mod error;
/// Realized topology and the edge builders
pub mod graph;
/// Periodic grid coordinates and distance metric
pub mod grid;
/// Terminal edge weight histograms
pub mod histogram;
/// Run metrics collection and logging setup
pub mod metrics;
/// Owned simulation context and construction pipeline
pub mod network;
/// Class instance placement on the grid
pub mod placement;
/// Class-pair synapse rule lookup
pub mod rules;
/// Weighted index sampling
pub mod sampler;
/// Era / epoch / step driver
pub mod scheduler;
/// Step and epoch statistics
pub mod stats;
/// Node and synapse dynamics
pub mod units;

pub use config::AppConfig;
pub use error::{NetworkError, Result};
pub use metrics::{init_logging, Metrics};
pub use network::Network;
pub use scheduler::{RecordSink, RunSummary, SimulationScheduler};
