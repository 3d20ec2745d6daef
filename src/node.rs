use std::fmt;

use log::debug;

use crate::config::BackoffTable;

#[derive(Debug, Hash, Eq, Clone, Copy, PartialEq)]
pub enum NodeStateType {
    InTx,
    Ready,
    Backoff,
}

impl fmt::Display for NodeStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStateType::InTx => write!(f, "In Tx"),
            NodeStateType::Ready => write!(f, "Ready"),
            NodeStateType::Backoff => write!(f, "Backoff"),
        }
    }
}

/// Per-node counters collected over a run.
#[derive(Debug, Default, Hash, Eq, Clone, Copy, PartialEq)]
pub struct NodeStats {
    pub id: usize,
    pub successful_ticks: u64,
    pub packets_delivered: u64,
    /// Every collision the node took part in, never wrapped.
    pub collisions: u64,
}

#[derive(Debug, Hash, Eq, Clone, Copy, PartialEq)]
pub struct Node {
    id: usize,
    backoff: u64,
    r: u64,
    max_retries: usize,
    collision_count: usize,
    tx_elapsed: u64,
    stats: NodeStats,
}

/// `(id + clock + 1) mod r`
fn next_backoff(id: usize, clock: u64, r: u64) -> u64 {
    (id as u64 + clock + 1) % r
}

impl Node {
    /// Initial backoff equals the id, which staggers the first attempts.
    pub fn new(id: usize, r_min: u64, max_retries: usize) -> Node {
        Node {
            id,
            backoff: id as u64,
            r: r_min,
            max_retries,
            collision_count: 0,
            tx_elapsed: 0,
            stats: NodeStats {
                id,
                ..NodeStats::default()
            },
        }
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_backoff(&self) -> u64 {
        self.backoff
    }

    /// Current modulus, `R`.
    pub fn get_r(&self) -> u64 {
        self.r
    }

    pub fn get_max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn get_collision_count(&self) -> usize {
        self.collision_count
    }

    pub fn get_tx_elapsed(&self) -> u64 {
        self.tx_elapsed
    }

    pub fn get_stats(&self) -> NodeStats {
        self.stats
    }

    pub fn state(&self) -> NodeStateType {
        if self.tx_elapsed > 0 {
            NodeStateType::InTx
        } else if self.backoff == 0 {
            NodeStateType::Ready
        } else {
            NodeStateType::Backoff
        }
    }

    pub fn is_ready(&self) -> bool {
        self.backoff == 0
    }

    /// Holds the channel alone for one tick. Returns true once the packet of
    /// `packet_length` ticks has been fully sent; the node then draws a new
    /// backoff with its current `R`.
    pub fn tx_tick(&mut self, clock: u64, packet_length: u64) -> bool {
        self.tx_elapsed += 1;
        self.stats.successful_ticks += 1;
        if self.tx_elapsed < packet_length {
            return false;
        }

        self.backoff = next_backoff(self.id, clock, self.r);
        self.tx_elapsed = 0;
        self.stats.packets_delivered += 1;
        debug!(
            "node {} delivered a packet at tick {}, next backoff {}",
            self.id, clock, self.backoff
        );
        true
    }

    /// Moves one step along the backoff table. Past `M` collisions the count
    /// wraps and the first modulus is used again.
    pub fn collide(&mut self, clock: u64, table: &BackoffTable) {
        self.collision_count += 1;
        if self.collision_count < self.max_retries {
            self.r = table.modulus(self.collision_count);
        } else {
            self.collision_count = 0;
            self.r = table.first();
        }
        self.backoff = next_backoff(self.id, clock, self.r);
        self.tx_elapsed = 0;
        self.stats.collisions += 1;
        debug!(
            "node {} collided at tick {}: count {}, R {}, backoff {}",
            self.id, clock, self.collision_count, self.r, self.backoff
        );
    }

    /// One idle tick of countdown. Never drops below zero.
    pub fn decrement_backoff(&mut self) {
        self.backoff = self.backoff.saturating_sub(1);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} [{}] backoff {} R {} collisions {}",
            self.id,
            self.state(),
            self.backoff,
            self.r,
            self.collision_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_backoff_is_its_id() {
        let node = Node::new(3, 2, 4);
        assert_eq!(node.get_id(), 3);
        assert_eq!(node.get_backoff(), 3);
        assert_eq!(node.get_r(), 2);
        assert_eq!(node.get_max_retries(), 4);
        assert_eq!(node.get_collision_count(), 0);
        assert_eq!(node.get_tx_elapsed(), 0);
        assert_eq!(node.state(), NodeStateType::Backoff);
        assert_eq!(Node::new(0, 2, 4).state(), NodeStateType::Ready);
    }

    #[test]
    fn packet_completes_after_packet_length_ticks() {
        let mut node = Node::new(1, 5, 2);
        node.decrement_backoff();
        assert!(!node.tx_tick(4, 3));
        assert_eq!(node.state(), NodeStateType::InTx);
        assert!(!node.tx_tick(5, 3));
        assert!(node.tx_tick(6, 3));
        // (1 + 6 + 1) mod 5
        assert_eq!(node.get_backoff(), 3);
        assert_eq!(node.get_tx_elapsed(), 0);
        assert_eq!(node.get_r(), 5);

        let stats = node.get_stats();
        assert_eq!(stats.successful_ticks, 3);
        assert_eq!(stats.packets_delivered, 1);
    }

    #[test]
    fn collision_walks_the_table_and_wraps_at_max_retries() {
        let table = BackoffTable::new(&[2, 4, 8]).unwrap();
        let mut node = Node::new(0, table.first(), 3);

        node.collide(1, &table);
        assert_eq!(node.get_collision_count(), 1);
        assert_eq!(node.get_r(), 4);
        assert_eq!(node.get_backoff(), 2);

        node.collide(2, &table);
        assert_eq!(node.get_collision_count(), 2);
        assert_eq!(node.get_r(), 8);
        assert_eq!(node.get_backoff(), 3);

        node.collide(3, &table);
        assert_eq!(node.get_collision_count(), 0);
        assert_eq!(node.get_r(), 2);
        assert_eq!(node.get_backoff(), 0);
        assert_eq!(node.get_stats().collisions, 3);
    }

    #[test]
    fn single_retry_wraps_immediately() {
        let table = BackoffTable::new(&[3]).unwrap();
        let mut node = Node::new(2, table.first(), 1);
        node.collide(0, &table);
        assert_eq!(node.get_collision_count(), 0);
        assert_eq!(node.get_r(), 3);
        assert_eq!(node.get_backoff(), 0);
    }

    #[test]
    fn backoff_never_goes_negative() {
        let mut node = Node::new(1, 2, 1);
        node.decrement_backoff();
        node.decrement_backoff();
        assert_eq!(node.get_backoff(), 0);
    }

    #[test]
    fn display_shows_state_and_backoff() {
        let mut node = Node::new(3, 2, 4);
        assert_eq!(node.to_string(), "node 3 [Backoff] backoff 3 R 2 collisions 0");

        for _ in 0..3 {
            node.decrement_backoff();
        }
        assert_eq!(node.to_string(), "node 3 [Ready] backoff 0 R 2 collisions 0");

        node.tx_tick(0, 2);
        assert_eq!(node.to_string(), "node 3 [In Tx] backoff 0 R 2 collisions 0");
    }
}
