use std::fmt;

use log::{info, log_enabled, trace, Level};

use crate::config::SimConfig;
use crate::error::Result;
use crate::network::Network;
use crate::report::SimulationReport;

/// What happened on the channel during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nobody was ready to send.
    Idle,
    /// One node held the channel. `completed` is set on the last tick of its
    /// packet.
    Transmit { node: usize, completed: bool },
    /// `contenders` nodes tried to send on an idle channel at once.
    Collision { contenders: usize },
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Idle => write!(f, "Idle"),
            TickOutcome::Transmit { node, completed: false } => write!(f, "Tx node {}", node),
            TickOutcome::Transmit { node, completed: true } => write!(f, "Tx node {} (end)", node),
            TickOutcome::Collision { contenders } => write!(f, "Collision of {}", contenders),
        }
    }
}

/// Drives one run: owns the nodes, the clock and the channel for `T` ticks.
pub struct Scheduler {
    config: SimConfig,
    network: Network,
    clock: u64,
    channel_holder: Option<usize>,
    contenders: Vec<usize>,
    successful_ticks: u64,
    collision_ticks: u64,
    idle_ticks: u64,
}

impl Scheduler {
    pub fn new(config: &SimConfig) -> Result<Scheduler> {
        let network = Network::from_config(config)?;
        info!(
            "CSMA simulation set up: N={} L={} M={} R={:?} T={}",
            config.num_nodes,
            config.packet_length,
            config.max_retries,
            config.backoff_table.as_slice(),
            config.duration
        );

        Ok(Scheduler {
            config: config.clone(),
            contenders: Vec::with_capacity(network.len()),
            network,
            clock: 0,
            channel_holder: None,
            successful_ticks: 0,
            collision_ticks: 0,
            idle_ticks: 0,
        })
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Node currently holding the channel, if any.
    pub fn channel_holder(&self) -> Option<usize> {
        self.channel_holder
    }

    pub fn successful_ticks(&self) -> u64 {
        self.successful_ticks
    }

    pub fn is_finished(&self) -> bool {
        self.clock >= self.config.duration
    }

    /// Advances the clock by one tick. Returns `None` once all `T` ticks have
    /// run.
    pub fn handle_next_tick(&mut self) -> Option<TickOutcome> {
        if self.is_finished() {
            return None;
        }
        let clock = self.clock;

        // Carrier sense: only the holder may send on a busy channel.
        self.contenders.clear();
        for node in self.network.iter() {
            let channel_free = match self.channel_holder {
                None => true,
                Some(holder) => holder == node.get_id(),
            };
            if channel_free && node.is_ready() {
                self.contenders.push(node.get_id());
            }
        }

        let outcome = match self.contenders.len() {
            0 => {
                self.idle_ticks += 1;
                TickOutcome::Idle
            }
            1 => {
                let id = self.contenders[0];
                self.channel_holder = Some(id);
                self.successful_ticks += 1;
                let completed = self.network[id].tx_tick(clock, self.config.packet_length);
                if completed {
                    self.channel_holder = None;
                }
                TickOutcome::Transmit { node: id, completed }
            }
            contenders => {
                self.collision_ticks += 1;
                for &id in &self.contenders {
                    self.network[id].collide(clock, &self.config.backoff_table);
                }
                TickOutcome::Collision { contenders }
            }
        };

        // Countdown runs whenever the channel is free going into the next tick.
        if self.channel_holder.is_none() {
            for node in self.network.iter_mut() {
                node.decrement_backoff();
            }
        }

        trace!("tick {}: {}", clock, outcome);
        if log_enabled!(Level::Trace) {
            for node in self.network.iter() {
                trace!("  {}", node);
            }
        }
        self.clock += 1;
        Some(outcome)
    }

    /// Runs the remaining ticks and returns the tally.
    pub fn run(&mut self) -> Result<SimulationReport> {
        while self.handle_next_tick().is_some() {}

        let report = self.report();
        info!(
            "CSMA simulation finished after {} ticks: {} successful, {} collision, {} idle, utilization {:.2}",
            report.ticks,
            report.successful_ticks,
            report.collision_ticks,
            report.idle_ticks,
            report.utilization()?
        );
        Ok(report)
    }

    /// Tally of the ticks run so far.
    pub fn report(&self) -> SimulationReport {
        let nodes: Vec<_> = self.network.iter().map(|node| node.get_stats()).collect();
        SimulationReport {
            ticks: self.clock,
            successful_ticks: self.successful_ticks,
            collision_ticks: self.collision_ticks,
            idle_ticks: self.idle_ticks,
            packets_delivered: nodes.iter().map(|stats| stats.packets_delivered).sum(),
            nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawParameters;

    fn config(n: i64, l: i64, m: i64, r: &[i64], t: i64) -> SimConfig {
        RawParameters {
            num_nodes: Some(n),
            packet_length: Some(l),
            max_retries: Some(m),
            backoff_table: Some(r.to_vec()),
            duration: Some(t),
        }
        .validate()
        .unwrap()
    }

    fn outcomes(scheduler: &mut Scheduler) -> Vec<TickOutcome> {
        std::iter::from_fn(|| scheduler.handle_next_tick()).collect()
    }

    #[test]
    fn single_node_transmits_every_tick() {
        let mut scheduler = Scheduler::new(&config(1, 1, 3, &[2], 5)).unwrap();
        let ticks = outcomes(&mut scheduler);
        assert_eq!(ticks.len(), 5);
        assert!(ticks
            .iter()
            .all(|t| *t == TickOutcome::Transmit { node: 0, completed: true }));
        assert_eq!(scheduler.successful_ticks(), 5);
        assert!(scheduler.handle_next_tick().is_none());
    }

    #[test]
    fn two_nodes_collide_once() {
        let mut scheduler = Scheduler::new(&config(2, 1, 2, &[2, 4], 4)).unwrap();
        assert_eq!(
            outcomes(&mut scheduler),
            vec![
                TickOutcome::Transmit { node: 0, completed: true },
                TickOutcome::Collision { contenders: 2 },
                TickOutcome::Idle,
                TickOutcome::Transmit { node: 0, completed: true },
            ]
        );

        let network = scheduler.network();
        assert_eq!(network[0].get_collision_count(), 1);
        assert_eq!(network[0].get_r(), 4);
        assert_eq!(network[1].get_collision_count(), 1);
        // (1 + 1 + 1) mod 4, then counted down on ticks 1, 2 and 3
        assert_eq!(network[1].get_backoff(), 0);
    }

    #[test]
    fn holder_keeps_the_channel_for_the_whole_packet() {
        // Node 1 becomes ready while node 0 is mid-packet and must wait.
        let mut scheduler = Scheduler::new(&config(2, 3, 2, &[5, 7], 4)).unwrap();

        assert_eq!(
            scheduler.handle_next_tick(),
            Some(TickOutcome::Transmit { node: 0, completed: false })
        );
        assert_eq!(scheduler.channel_holder(), Some(0));
        assert_eq!(scheduler.network()[1].get_backoff(), 1);

        assert_eq!(
            scheduler.handle_next_tick(),
            Some(TickOutcome::Transmit { node: 0, completed: false })
        );
        assert_eq!(
            scheduler.handle_next_tick(),
            Some(TickOutcome::Transmit { node: 0, completed: true })
        );
        assert_eq!(scheduler.channel_holder(), None);
        // (0 + 2 + 1) mod 5 = 3, less the countdown at release
        assert_eq!(scheduler.network()[0].get_backoff(), 2);
        assert_eq!(scheduler.network()[1].get_backoff(), 0);

        assert_eq!(
            scheduler.handle_next_tick(),
            Some(TickOutcome::Transmit { node: 1, completed: false })
        );
        assert_eq!(scheduler.clock(), 4);
        assert!(scheduler.is_finished());
    }

    #[test]
    fn report_partitions_the_ticks() {
        let mut scheduler = Scheduler::new(&config(4, 2, 3, &[3, 5, 9], 200)).unwrap();
        let report = scheduler.run().unwrap();
        assert_eq!(report.ticks, 200);
        assert_eq!(
            report.successful_ticks + report.collision_ticks + report.idle_ticks,
            200
        );
        let per_node: u64 = report.nodes.iter().map(|s| s.successful_ticks).sum();
        assert_eq!(per_node, report.successful_ticks);
    }

    #[test]
    fn report_before_any_tick_has_no_utilization() {
        let scheduler = Scheduler::new(&config(2, 1, 1, &[2], 10)).unwrap();
        assert!(scheduler.report().utilization().is_err());
    }
}
