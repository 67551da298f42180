//! Topology validation
//!
//! Measures a built view (reachability, path length, giant component,
//! clustering) and applies the usability gate.

mod gate;
mod hub_report;
pub mod metrics;
mod stats;

pub use gate::GateThresholds;
pub use hub_report::{HubDetail, HubReport};
pub use stats::{HubEntry, TopologyConfig, TopologyStats, TOP_HUBS};

pub(crate) use stats::preview;
