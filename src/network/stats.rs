//! Compute network statistics
//!
//! ```
//! # use implearn::Network;
//! # let net = Network::new();
//! use implearn::network::stats::stats;
//! let stats = stats(&net);
//!
//! // Check that there is no Xor2 node
//! assert_eq!(stats.nb_xor, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::{Network, NodeType};

/// Number of inputs and nodes in a network, with structural information
#[derive(Clone, Debug)]
pub struct NetworkStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of And nodes
    pub nb_and: usize,
    /// Number of Xor nodes
    pub nb_xor: usize,
    /// Number of inverted edges
    pub nb_inverted: usize,
    /// Longest path from an input, in nodes
    pub depth: usize,
    /// Largest number of fanouts of a single node
    pub max_fanout: usize,
}

impl NetworkStats {
    /// Total number of And and Xor nodes
    pub fn nb_gates(&self) -> usize {
        self.nb_and + self.nb_xor
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        if self.nb_and != 0 {
            writeln!(f, "  And: {}", self.nb_and)?;
        }
        if self.nb_xor != 0 {
            writeln!(f, "  Xor: {}", self.nb_xor)?;
        }
        writeln!(f, "  Inverted edges: {}", self.nb_inverted)?;
        writeln!(f, "  Depth: {}", self.depth)?;
        writeln!(f, "  Max fanout: {}", self.max_fanout)?;
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the network
pub fn stats(net: &Network) -> NetworkStats {
    let mut ret = NetworkStats {
        nb_inputs: net.nb_inputs(),
        nb_and: 0,
        nb_xor: 0,
        nb_inverted: 0,
        depth: 0,
        max_fanout: 0,
    };
    let mut level = vec![0usize; net.nb_nodes()];
    for &i in net.topo_order() {
        let n = net.node(i);
        match n.kind() {
            NodeType::Input => (),
            NodeType::And => ret.nb_and += 1,
            NodeType::Xor => ret.nb_xor += 1,
        }
        ret.nb_inverted += n.fanins().iter().filter(|f| f.is_inverted()).count();
        ret.max_fanout = ret.max_fanout.max(n.fanouts().len());
        if !n.is_input() {
            level[i] = 1 + n.fanins().iter().map(|f| level[f.node()]).max().unwrap_or(0);
        }
        ret.depth = ret.depth.max(level[i]);
    }
    ret
}
