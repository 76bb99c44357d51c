//! Storage of learned implications
//!
//! ```
//! # use implearn::ImpTable;
//! let mut table = ImpTable::new(4);
//! // n0 = 1 implies n3 = 0
//! table.put(0, true, 3, false);
//! assert!(table.check(0, true, 3, false));
//! // The contrapositive is recorded as well
//! assert!(table.check(3, true, 0, false));
//! ```

use std::fmt;

use fxhash::FxHashSet;

/// A node together with a Boolean value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeValue {
    /// Node index
    pub node: usize,
    /// Value of the node
    pub value: bool,
}

impl NodeValue {
    /// Create a node value
    pub fn new(node: usize, value: bool) -> NodeValue {
        NodeValue { node, value }
    }

    /// Dense index, node * 2 + value
    pub fn index(&self) -> usize {
        self.node * 2 + self.value as usize
    }

    /// Same node with the opposite value
    pub fn negated(&self) -> NodeValue {
        NodeValue::new(self.node, !self.value)
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}={}", self.node, self.value as u8)
    }
}

/// A single implication: `src = src_val` implies `dst = dst_val`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Implication {
    /// Premise
    pub src: NodeValue,
    /// Conclusion
    pub dst: NodeValue,
}

impl Implication {
    /// The equivalent implication `dst != dst_val` implies `src != src_val`
    pub fn contrapositive(&self) -> Implication {
        Implication {
            src: self.dst.negated(),
            dst: self.src.negated(),
        }
    }
}

impl fmt::Display for Implication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.src, self.dst)
    }
}

/// Table of implications between node values, with constant nodes
///
/// Implications are only ever added. Recording a fact also records its contrapositive, and
/// membership is checked through a hash index.
#[derive(Debug, Clone)]
pub struct ImpTable {
    index: FxHashSet<(usize, usize)>,
    lists: Vec<Vec<NodeValue>>,
    consts: Vec<Option<bool>>,
}

impl ImpTable {
    /// Create an empty table for a network with the given number of nodes
    pub fn new(nb_nodes: usize) -> ImpTable {
        ImpTable {
            index: FxHashSet::default(),
            lists: vec![Vec::new(); 2 * nb_nodes],
            consts: vec![None; nb_nodes],
        }
    }

    /// Number of nodes covered by the table
    pub fn nb_nodes(&self) -> usize {
        self.consts.len()
    }

    /// Number of recorded implications, contrapositives included
    pub fn nb_facts(&self) -> usize {
        self.index.len()
    }

    /// Number of nodes known to be constant
    pub fn nb_consts(&self) -> usize {
        self.consts.iter().filter(|c| c.is_some()).count()
    }

    /// Returns true if `src = src_val` is known to imply `dst = dst_val`
    pub fn check(&self, src: usize, src_val: bool, dst: usize, dst_val: bool) -> bool {
        let key = (
            NodeValue::new(src, src_val).index(),
            NodeValue::new(dst, dst_val).index(),
        );
        self.index.contains(&key)
    }

    /// Record that `src = src_val` implies `dst = dst_val`, and its contrapositive
    ///
    /// Returns true if the fact was new. Self-implications are ignored.
    pub fn put(&mut self, src: usize, src_val: bool, dst: usize, dst_val: bool) -> bool {
        if src == dst {
            return false;
        }
        let s = NodeValue::new(src, src_val);
        let d = NodeValue::new(dst, dst_val);
        let added = self.insert(s, d);
        self.insert(d.negated(), s.negated());
        added
    }

    /// Record an implication, and its contrapositive
    pub fn put_implication(&mut self, imp: Implication) -> bool {
        self.put(imp.src.node, imp.src.value, imp.dst.node, imp.dst.value)
    }

    fn insert(&mut self, src: NodeValue, dst: NodeValue) -> bool {
        if !self.index.insert((src.index(), dst.index())) {
            return false;
        }
        let list = &mut self.lists[src.index()];
        if let Err(pos) = list.binary_search(&dst) {
            list.insert(pos, dst);
        }
        true
    }

    /// Values implied by `src = src_val`, sorted by node then value
    pub fn get(&self, src: usize, src_val: bool) -> &[NodeValue] {
        &self.lists[NodeValue::new(src, src_val).index()]
    }

    /// All recorded implications, contrapositives included, sorted by premise
    pub fn facts(&self) -> impl Iterator<Item = Implication> + '_ {
        self.lists.iter().enumerate().flat_map(|(i, list)| {
            let src = NodeValue::new(i / 2, i % 2 != 0);
            list.iter().map(move |dst| Implication { src, dst: *dst })
        })
    }

    /// Constant value of a node, if known
    pub fn const_value(&self, node: usize) -> Option<bool> {
        self.consts[node]
    }

    /// Record that a node always takes the given value
    pub fn set_const(&mut self, node: usize, value: bool) {
        self.consts[node] = Some(value);
    }

    /// Constant nodes and their values
    pub fn consts(&self) -> impl Iterator<Item = NodeValue> + '_ {
        self.consts
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|v| NodeValue::new(i, v)))
    }

    /// Add all facts and constants of another table for the same network
    pub fn merge(&mut self, other: &ImpTable) {
        assert_eq!(self.nb_nodes(), other.nb_nodes());
        for imp in other.facts() {
            self.insert(imp.src, imp.dst);
        }
        for c in other.consts() {
            self.set_const(c.node, c.value);
        }
    }
}

impl fmt::Display for ImpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Implications:")?;
        writeln!(f, "  Facts: {}", self.nb_facts())?;
        writeln!(f, "  Constants: {}", self.nb_consts())?;
        fmt::Result::Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ImpTable, Implication, NodeValue};

    #[test]
    fn test_put_check() {
        let mut t = ImpTable::new(5);
        assert!(t.put(4, true, 1, true));
        assert!(t.check(4, true, 1, true));
        assert!(t.check(1, false, 4, false));
        assert!(!t.check(4, false, 1, true));
        assert!(!t.check(1, true, 4, true));
        assert_eq!(t.nb_facts(), 2);
    }

    #[test]
    fn test_idempotent() {
        let mut t = ImpTable::new(5);
        t.put(0, false, 3, true);
        let before = t.get(0, false).to_vec();
        assert!(!t.put(0, false, 3, true));
        assert!(!t.put(3, false, 0, true));
        assert_eq!(t.get(0, false), before.as_slice());
        assert_eq!(t.nb_facts(), 2);
    }

    #[test]
    fn test_self_implication() {
        let mut t = ImpTable::new(2);
        assert!(!t.put(1, true, 1, true));
        assert_eq!(t.nb_facts(), 0);
    }

    #[test]
    fn test_sorted() {
        let mut t = ImpTable::new(8);
        for (dst, v) in [(7, true), (2, false), (5, true), (2, true), (3, false)] {
            t.put(0, true, dst, v);
        }
        let got: Vec<(usize, bool)> = t.get(0, true).iter().map(|n| (n.node, n.value)).collect();
        assert_eq!(
            got,
            vec![(2, false), (2, true), (3, false), (5, true), (7, true)]
        );
    }

    #[test]
    fn test_symmetry() {
        let mut t = ImpTable::new(6);
        t.put(0, true, 1, false);
        t.put(2, false, 5, true);
        t.put(3, true, 0, true);
        for imp in t.facts() {
            let c = imp.contrapositive();
            assert!(t.check(c.src.node, c.src.value, c.dst.node, c.dst.value));
        }
        assert_eq!(t.facts().count(), 6);
    }

    #[test]
    fn test_merge() {
        let mut a = ImpTable::new(4);
        let mut b = ImpTable::new(4);
        a.put(0, true, 1, true);
        b.put(0, true, 1, true);
        b.put(2, false, 3, false);
        b.set_const(3, true);
        a.merge(&b);
        assert_eq!(a.nb_facts(), 4);
        assert_eq!(a.const_value(3), Some(true));
        assert_eq!(a.nb_consts(), 1);
    }

    #[test]
    fn test_display() {
        let imp = Implication {
            src: NodeValue::new(3, true),
            dst: NodeValue::new(1, false),
        };
        assert_eq!(format!("{imp}"), "n3=1 => n1=0");
        assert_eq!(format!("{}", imp.contrapositive()), "n1=1 => n3=0");
    }
}
