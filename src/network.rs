use std::ops::{Index, IndexMut};

use crate::config::{BackoffTable, SimConfig};
use crate::error::ConfigError;
use crate::node::Node;

/// The fixed set of stations sharing the channel, indexed by node id.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
}

impl Network {
    pub fn new(
        num_nodes: usize,
        table: &BackoffTable,
        max_retries: usize,
    ) -> Result<Network, ConfigError> {
        if num_nodes == 0 {
            return Err(ConfigError::NonPositiveNodeCount(0));
        }
        let nodes = (0..num_nodes)
            .map(|id| Node::new(id, table.first(), max_retries))
            .collect();
        Ok(Network { nodes })
    }

    pub fn from_config(config: &SimConfig) -> Result<Network, ConfigError> {
        Network::new(config.num_nodes, &config.backoff_table, config.max_retries)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: construction refuses an empty network.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Node> {
        self.nodes.iter_mut()
    }
}

impl Index<usize> for Network {
    type Output = Node;

    fn index(&self, id: usize) -> &Node {
        &self.nodes[id]
    }
}

impl IndexMut<usize> for Network {
    fn index_mut(&mut self, id: usize) -> &mut Node {
        &mut self.nodes[id]
    }
}
