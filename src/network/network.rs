use core::fmt;

use crate::error::{ImpError, Result};
use crate::network::node::{Node, NodeType};
use crate::network::Handle;

/// Description of a single node, as handed over by an external network reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Kind of the node
    pub kind: NodeType,
    /// Fanins as (source id, inversion) pairs
    pub fanins: Vec<(usize, bool)>,
    /// Expected number of fanouts, if known; only used to pre-size and cross-check
    pub nb_fanouts: Option<usize>,
}

impl NodeSpec {
    /// A primary input
    pub fn input() -> NodeSpec {
        NodeSpec {
            kind: NodeType::Input,
            fanins: Vec::new(),
            nb_fanouts: None,
        }
    }

    /// A two-input And
    pub fn and(a: (usize, bool), b: (usize, bool)) -> NodeSpec {
        NodeSpec {
            kind: NodeType::And,
            fanins: vec![a, b],
            nb_fanouts: None,
        }
    }

    /// A two-input Xor
    pub fn xor(a: (usize, bool), b: (usize, bool)) -> NodeSpec {
        NodeSpec {
            kind: NodeType::Xor,
            fanins: vec![a, b],
            nb_fanouts: None,
        }
    }

    /// Set the expected number of fanouts
    pub fn with_fanouts(mut self, nb: usize) -> NodeSpec {
        self.nb_fanouts = Some(nb);
        self
    }
}

/// Two-input And/Xor network, the structure all learning strategies operate on
///
/// Node ids are dense. The network stores a topological order, so that every node
/// appears after its fanins; networks built incrementally use the creation order.
/// The structure is never modified once learning starts.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    inputs: Vec<usize>,
    order: Vec<usize>,
}

impl Network {
    /// Create a new network
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from an external description, checking its consistency
    ///
    /// Fails with a configuration error naming the offending node if a node has the wrong
    /// number of fanins, references a nonexistent node, takes part in a combinatorial loop,
    /// or has a different number of fanouts than announced.
    pub fn from_specs(specs: &[NodeSpec]) -> Result<Network> {
        let nb = specs.len();
        let mut ret = Network::new();
        for (id, spec) in specs.iter().enumerate() {
            let expected = spec.kind.nb_fanins();
            if spec.fanins.len() != expected {
                return Err(ImpError::config(
                    id,
                    format!(
                        "expected {} fanins, got {}",
                        expected,
                        spec.fanins.len()
                    ),
                ));
            }
            for &(src, _) in &spec.fanins {
                if src >= nb {
                    return Err(ImpError::config(
                        id,
                        format!("fanin {src} does not exist"),
                    ));
                }
            }
            let fanins = spec
                .fanins
                .iter()
                .map(|&(src, inv)| Handle::new(src, inv))
                .collect();
            let mut node = Node::new(id, spec.kind, fanins);
            if let Some(nb_fanouts) = spec.nb_fanouts {
                node.reserve_fanouts(nb_fanouts);
            }
            if spec.kind == NodeType::Input {
                ret.inputs.push(id);
            }
            ret.nodes.push(node);
        }

        for id in 0..nb {
            for pos in 0..ret.nodes[id].fanins().len() {
                let e = ret.nodes[id].fanin_edge(pos);
                ret.nodes[e.src].add_fanout(e);
            }
        }

        for (id, spec) in specs.iter().enumerate() {
            if let Some(expected) = spec.nb_fanouts {
                let actual = ret.nodes[id].fanouts().len();
                if actual != expected {
                    return Err(ImpError::config(
                        id,
                        format!("announced {expected} fanouts, found {actual}"),
                    ));
                }
            }
        }

        ret.order = ret.topo_sort()?;
        Ok(ret)
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of nodes in the network, inputs included
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get the node id of the input at index i
    pub fn input(&self, i: usize) -> usize {
        self.inputs[i]
    }

    /// Node ids of all primary inputs
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Get the node with id i
    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    /// All nodes, by id
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node ids in topological order: fanins before the nodes that use them
    pub fn topo_order(&self) -> &[usize] {
        &self.order
    }

    /// Add a new primary input
    pub fn add_input(&mut self) -> Handle {
        let id = self.push(NodeType::Input, Vec::new());
        self.inputs.push(id);
        Handle::from_node(id)
    }

    /// Add multiple primary inputs
    pub fn add_inputs(&mut self, nb: usize) -> Vec<Handle> {
        (0..nb).map(|_| self.add_input()).collect()
    }

    /// Create an And2 node
    pub fn and(&mut self, a: Handle, b: Handle) -> Handle {
        Handle::from_node(self.push(NodeType::And, vec![a, b]))
    }

    /// Create a Xor2 node
    pub fn xor(&mut self, a: Handle, b: Handle) -> Handle {
        Handle::from_node(self.push(NodeType::Xor, vec![a, b]))
    }

    /// Create an Or2 node, as an And with inverted inputs and output
    pub fn or(&mut self, a: Handle, b: Handle) -> Handle {
        !self.and(!a, !b)
    }

    /// Add a node whose fanins already exist
    fn push(&mut self, kind: NodeType, fanins: Vec<Handle>) -> usize {
        let id = self.nodes.len();
        for f in &fanins {
            assert!(f.node() < id, "Invalid fanin {f}");
        }
        let node = Node::new(id, kind, fanins);
        for pos in 0..node.fanins().len() {
            let e = node.fanin_edge(pos);
            self.nodes[e.src].add_fanout(e);
        }
        self.nodes.push(node);
        self.order.push(id);
        id
    }

    /// Compute a topological order with Kahn's algorithm
    fn topo_sort(&self) -> Result<Vec<usize>> {
        let mut count_deps: Vec<usize> = self.nodes.iter().map(|n| n.fanins().len()).collect();
        let mut to_visit: Vec<usize> = (0..self.nb_nodes())
            .filter(|i| count_deps[*i] == 0)
            .rev()
            .collect();
        let mut order = Vec::with_capacity(self.nb_nodes());
        while let Some(i) = to_visit.pop() {
            order.push(i);
            for e in self.nodes[i].fanouts() {
                count_deps[e.dst] -= 1;
                if count_deps[e.dst] == 0 {
                    to_visit.push(e.dst);
                }
            }
        }
        if order.len() != self.nb_nodes() {
            let looping = (0..self.nb_nodes())
                .find(|i| count_deps[*i] != 0)
                .unwrap_or_default();
            return Err(ImpError::config(looping, "part of a combinatorial loop"));
        }
        Ok(order)
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        let mut rank = vec![usize::MAX; self.nb_nodes()];
        for (r, i) in self.order.iter().enumerate() {
            assert_eq!(rank[*i], usize::MAX, "Node {i} appears twice in the order");
            rank[*i] = r;
        }
        for n in &self.nodes {
            assert_eq!(n.fanins().len(), n.kind().nb_fanins());
            for (pos, f) in n.fanins().iter().enumerate() {
                assert!(rank[f.node()] < rank[n.id()], "Invalid order at node {}", n.id());
                assert!(self.nodes[f.node()].fanouts().contains(&n.fanin_edge(pos)));
            }
            for e in n.fanouts() {
                assert_eq!(e.src, n.id());
                assert_eq!(self.nodes[e.dst].fanin_edge(e.pos), *e);
            }
        }
        for i in &self.inputs {
            assert!(self.nodes[*i].is_input());
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network with {} inputs, {} nodes:",
            self.nb_inputs(),
            self.nb_nodes()
        )?;
        for i in self.topo_order() {
            writeln!(f, "\tn{} = {}", i, self.node(*i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ImpError;
    use crate::network::{Handle, Network, NodeSpec};

    #[test]
    fn test_basic() {
        let mut net = Network::default();
        let i0 = net.add_input();
        let i1 = net.add_input();
        let x = net.xor(i0, i1);
        let a = net.and(x, !i1);

        assert_eq!(net.nb_inputs(), 2);
        assert_eq!(net.nb_nodes(), 4);
        assert_eq!(net.input(1), i1.node());
        assert!(net.node(x.node()).is_xor());
        assert!(net.node(a.node()).is_and());
        assert_eq!(net.node(a.node()).fanin(1), !i1);
        assert_eq!(net.node(i1.node()).fanouts().len(), 2);
        assert_eq!(net.topo_order(), &[0, 1, 2, 3]);
        net.check();
    }

    #[test]
    fn test_builder_ids() {
        let mut net = Network::new();
        let ins = net.add_inputs(3);
        assert_eq!(ins, vec![Handle::new(0, false), Handle::new(1, false), Handle::new(2, false)]);
        let x = net.and(ins[0], ins[1]);
        let y = net.xor(x, !ins[2]);
        assert_eq!(x, Handle::new(3, false));
        assert_eq!(y, Handle::new(4, false));
        assert_eq!(net.inputs(), &[0, 1, 2]);
        assert_eq!(net.node(4).fanin(1), !ins[2]);
        net.check();
    }

    #[test]
    fn test_or() {
        let mut net = Network::default();
        let i0 = net.add_input();
        let i1 = net.add_input();
        let o = net.or(i0, i1);
        assert!(o.is_inverted());
        assert_eq!(net.node(o.node()).fanin(0), !i0);
    }

    #[test]
    fn test_from_specs() {
        let specs = vec![
            NodeSpec::and((1, false), (2, true)),
            NodeSpec::input().with_fanouts(1),
            NodeSpec::input(),
            NodeSpec::xor((0, false), (2, false)),
        ];
        let net = Network::from_specs(&specs).unwrap();
        net.check();
        assert_eq!(net.nb_inputs(), 2);
        assert_eq!(net.inputs(), &[1, 2]);
        let order = net.topo_order();
        let rank = |i: usize| order.iter().position(|x| *x == i).unwrap();
        assert!(rank(1) < rank(0));
        assert!(rank(2) < rank(0));
        assert!(rank(0) < rank(3));
        assert_eq!(net.node(0).fanin(1), Handle::new(2, true));
    }

    #[test]
    fn test_bad_fanin_count() {
        let specs = vec![
            NodeSpec::input(),
            NodeSpec {
                fanins: vec![(0, false)],
                ..NodeSpec::and((0, false), (0, false))
            },
        ];
        match Network::from_specs(&specs) {
            Err(ImpError::Config { node, .. }) => assert_eq!(node, 1),
            _ => panic!("Expected a configuration error"),
        }
    }

    #[test]
    fn test_bad_reference() {
        let specs = vec![NodeSpec::input(), NodeSpec::xor((0, false), (5, false))];
        match Network::from_specs(&specs) {
            Err(ImpError::Config { node, .. }) => assert_eq!(node, 1),
            _ => panic!("Expected a configuration error"),
        }
    }

    #[test]
    fn test_fanout_mismatch() {
        let specs = vec![
            NodeSpec::input().with_fanouts(1),
            NodeSpec::input(),
            NodeSpec::and((0, false), (1, false)),
            NodeSpec::and((0, false), (2, false)),
        ];
        match Network::from_specs(&specs) {
            Err(ImpError::Config { node, .. }) => assert_eq!(node, 0),
            _ => panic!("Expected a configuration error"),
        }
    }

    #[test]
    fn test_loop() {
        let specs = vec![
            NodeSpec::input(),
            NodeSpec::and((0, false), (2, false)),
            NodeSpec::and((0, false), (1, false)),
        ];
        match Network::from_specs(&specs) {
            Err(ImpError::Config { node, .. }) => assert_eq!(node, 1),
            _ => panic!("Expected a configuration error"),
        }
    }
}
