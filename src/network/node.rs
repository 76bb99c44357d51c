use std::fmt;

use crate::network::Handle;

/// Function computed by a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Primary input, without fanins
    Input,
    /// Two-input And
    And,
    /// Two-input Xor
    Xor,
}

impl NodeType {
    /// Number of fanins required by this kind of node
    pub fn nb_fanins(&self) -> usize {
        match self {
            NodeType::Input => 0,
            NodeType::And | NodeType::Xor => 2,
        }
    }
}

/// Directed connection from a source node to an input slot of a destination node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source node
    pub src: usize,
    /// Whether the value is complemented along the edge
    pub inverted: bool,
    /// Destination node
    pub dst: usize,
    /// Input slot of the destination (0 or 1)
    pub pos: usize,
}

/// A node of the network
///
/// Nodes do not own each other: fanins are [`Handle`]s and fanouts are [`Edge`]s, both
/// holding indices into the network.
#[derive(Debug, Clone)]
pub struct Node {
    id: usize,
    kind: NodeType,
    fanins: Vec<Handle>,
    fanouts: Vec<Edge>,
}

impl Node {
    pub(crate) fn new(id: usize, kind: NodeType, fanins: Vec<Handle>) -> Node {
        debug_assert_eq!(fanins.len(), kind.nb_fanins());
        Node {
            id,
            kind,
            fanins,
            fanouts: Vec::new(),
        }
    }

    pub(crate) fn reserve_fanouts(&mut self, nb: usize) {
        self.fanouts.reserve(nb);
    }

    pub(crate) fn add_fanout(&mut self, edge: Edge) {
        debug_assert_eq!(edge.src, self.id);
        self.fanouts.push(edge);
    }

    /// Index of the node
    pub fn id(&self) -> usize {
        self.id
    }

    /// Kind of the node
    pub fn kind(&self) -> NodeType {
        self.kind
    }

    /// Returns true for primary inputs
    pub fn is_input(&self) -> bool {
        self.kind == NodeType::Input
    }

    /// Returns true for And nodes
    pub fn is_and(&self) -> bool {
        self.kind == NodeType::And
    }

    /// Returns true for Xor nodes
    pub fn is_xor(&self) -> bool {
        self.kind == NodeType::Xor
    }

    /// Fanin at slot i
    pub fn fanin(&self, i: usize) -> Handle {
        assert!(!self.is_input(), "Input node {} has no fanin", self.id);
        self.fanins[i]
    }

    /// All fanins, empty for inputs
    pub fn fanins(&self) -> &[Handle] {
        &self.fanins
    }

    /// All fanout edges
    pub fn fanouts(&self) -> &[Edge] {
        &self.fanouts
    }

    /// Edge from the fanin at slot i to this node
    pub fn fanin_edge(&self, i: usize) -> Edge {
        let h = self.fanin(i);
        Edge {
            src: h.node(),
            inverted: h.is_inverted(),
            dst: self.id,
            pos: i,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeType::Input => write!(f, "input"),
            NodeType::And => write!(f, "{} & {}", self.fanins[0], self.fanins[1]),
            NodeType::Xor => write!(f, "{} ^ {}", self.fanins[0], self.fanins[1]),
        }
    }
}
