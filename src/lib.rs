//! Discrete-time CSMA simulator.
//!
//! A fixed set of saturated nodes share one broadcast channel. Each tick the
//! [`Scheduler`] lets ready nodes contend: a lone sender holds the channel
//! until its packet is sent, simultaneous senders collide and back off using
//! a modulus taken from the backoff table. The result of a run is the link
//! utilization, the share of ticks in which exactly one node held the
//! channel.

pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod report;
pub mod scheduler;

pub use config::{load_config, parse_parameters, BackoffTable, RawParameters, SimConfig};
pub use error::{ConfigError, Error, Result};
pub use network::Network;
pub use node::{Node, NodeStateType, NodeStats};
pub use report::{format_utilization, utilization, write_utilization, SimulationReport};
pub use scheduler::{Scheduler, TickOutcome};

/// Runs a full simulation for `config`.
pub fn simulate(config: &SimConfig) -> Result<SimulationReport> {
    Scheduler::new(config)?.run()
}

/// Runs a full simulation and returns only the link utilization.
pub fn link_utilization(config: &SimConfig) -> Result<f64> {
    simulate(config)?.utilization()
}
