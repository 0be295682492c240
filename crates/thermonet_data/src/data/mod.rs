//! Core data structures for the thermonet simulation.

pub mod catalog;
pub mod records;
