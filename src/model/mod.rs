pub use thermonet_core::{NetworkError, RecordSink, SimulationScheduler};
pub mod config {
    pub use thermonet_core::config::*;
}
pub mod grid {
    pub use thermonet_core::grid::*;
}
pub mod placement {
    pub use thermonet_core::placement::*;
}
pub mod graph {
    pub use thermonet_core::graph::*;
}
pub mod sampler {
    pub use thermonet_core::sampler::*;
}
pub mod network {
    pub use thermonet_core::network::*;
}
pub mod scheduler {
    pub use thermonet_core::scheduler::*;
}
pub mod units {
    pub use thermonet_core::units::*;
}
pub mod records {
    pub use thermonet_data::*;
}
pub mod output {
    pub use thermonet_io::*;
}
