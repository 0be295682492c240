//! Thermodynamic node networks on a periodic grid.
//!
//! The library exposes the run orchestration used by the `thermonet` binary and
//! re-exports the engine under [`model`].

pub mod app;
pub mod model;

pub use app::{App, RunOutcome};
