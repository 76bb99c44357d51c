use rand::Rng;

use crate::{Handle, Network, NodeType};

/// Bit-parallel simulator working directly on the network representation
pub struct BitSimulator<'a> {
    net: &'a Network,
    values: Vec<u64>,
}

/// Convert the inversion to a word for bitwise operations
fn pol_to_word(h: Handle) -> u64 {
    (!(h.is_inverted() as u64)).wrapping_add(1)
}

impl<'a> BitSimulator<'a> {
    /// Create a simulator with all values at 0
    pub fn new(net: &'a Network) -> BitSimulator<'a> {
        BitSimulator {
            net,
            values: vec![0; net.nb_nodes()],
        }
    }

    /// Simulate with the given values for the primary inputs
    pub fn run(&mut self, input_values: &[u64]) {
        assert_eq!(input_values.len(), self.net.nb_inputs());
        for (i, v) in self.net.inputs().iter().zip(input_values) {
            self.values[*i] = *v;
        }
        self.run_comb();
    }

    /// Simulate with random input values
    ///
    /// Each 64-bit input word is made of two 32-bit draws.
    pub fn run_random(&mut self, rng: &mut impl Rng) {
        for &i in self.net.inputs() {
            let hi = rng.gen::<u32>() as u64;
            let lo = rng.gen::<u32>() as u64;
            self.values[i] = (hi << 32) | lo;
        }
        self.run_comb();
    }

    /// Values of all nodes after the last run
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Value of a node after the last run
    pub fn value(&self, node: usize) -> u64 {
        self.values[node]
    }

    fn get_value(&self, h: Handle) -> u64 {
        self.values[h.node()] ^ pol_to_word(h)
    }

    /// Compute the value of a node from its fanins
    fn calc_bitval(&self, node: usize) -> u64 {
        let n = self.net.node(node);
        match n.kind() {
            NodeType::Input => self.values[node],
            NodeType::And => self.get_value(n.fanin(0)) & self.get_value(n.fanin(1)),
            NodeType::Xor => self.get_value(n.fanin(0)) ^ self.get_value(n.fanin(1)),
        }
    }

    fn run_comb(&mut self) {
        for &i in self.net.topo_order() {
            self.values[i] = self.calc_bitval(i);
        }
    }
}
