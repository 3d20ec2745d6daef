use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::node::NodeStats;

/// Fraction of `ticks` in which exactly one node held the channel.
pub fn utilization(successful_ticks: u64, ticks: u64) -> Result<f64> {
    if ticks == 0 {
        return Err(Error::DivisionByZero);
    }
    Ok(successful_ticks as f64 / ticks as f64)
}

/// Two decimal places, e.g. `0.73`.
pub fn format_utilization(utilization: f64) -> String {
    format!("{:.2}", utilization)
}

pub fn write_utilization<P: AsRef<Path>>(path: P, utilization: f64) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format!("{}\n", format_utilization(utilization)))?;
    info!("utilization written to {}", path.display());
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub ticks: u64,
    pub successful_ticks: u64,
    pub collision_ticks: u64,
    pub idle_ticks: u64,
    pub packets_delivered: u64,
    pub nodes: Vec<NodeStats>,
}

impl SimulationReport {
    pub fn utilization(&self) -> Result<f64> {
        utilization(self.successful_ticks, self.ticks)
    }

    pub fn print_stats(&self) {
        println!("*******************Simulation results*******************");
        for node in self.nodes.iter() {
            let share = if self.ticks == 0 {
                0.0
            } else {
                node.successful_ticks as f64 / self.ticks as f64
            };
            println!(
                "node {} channel share: {:.4}, packets: {}, collisions: {}",
                node.id, share, node.packets_delivered, node.collisions
            );
        }
        println!(
            "ticks: {}, successful: {}, collision: {}, idle: {}",
            self.ticks, self.successful_ticks, self.collision_ticks, self.idle_ticks
        );
        println!("*******************Simulation results*******************");
    }
}
