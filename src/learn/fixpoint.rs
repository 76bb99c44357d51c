//! Global fixpoint propagation of implication sets
//!
//! For every node value `l`, we maintain the sorted set of node values known to imply `l`.
//! Sets only grow: a forward pass computes output sets from the fanin sets, a backward pass
//! computes fanin sets from the output and sibling sets, until nothing changes.
//!
//! For an And `o = a & b`:
//! * `o=0` is implied by anything implying `a=0` or `b=0`;
//! * `o=1` is implied by anything implying both `a=1` and `b=1`;
//! * `a=0` is implied by anything implying both `o=0` and `b=1`;
//! * `a=1` is implied by anything implying `o=1`.
//!
//! Xor nodes follow the same scheme, each value being a disjunction of two conjunctions.

use std::fmt;

use itertools::{EitherOrBoth, Itertools};
use tracing::{debug, info};

use crate::engine::Engine;
use crate::learn::LearningOptions;
use crate::table::NodeValue;
use crate::{Handle, ImpTable, Network, NodeType};

/// Statistics of the fixpoint propagation
#[derive(Debug, Clone, Default)]
pub struct FixpointStats {
    /// Total size of the sets after each forward/backward iteration
    pub sizes: Vec<usize>,
    /// Number of contrapositive rounds that added something
    pub nb_contra_rounds: usize,
    /// Number of new facts, contrapositives excluded
    pub nb_facts: usize,
    /// Number of nodes found constant
    pub nb_consts: usize,
}

impl fmt::Display for FixpointStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fixpoint propagation:")?;
        writeln!(f, "  Iterations: {}", self.sizes.len())?;
        if self.nb_contra_rounds != 0 {
            writeln!(f, "  Contrapositive rounds: {}", self.nb_contra_rounds)?;
        }
        writeln!(f, "  New facts: {}", self.nb_facts)?;
        writeln!(f, "  Constants: {}", self.nb_consts)?;
        Ok(())
    }
}

/// Set of node values; `None` stands for every node value
type Cond = Option<Vec<NodeValue>>;

fn union(a: &[NodeValue], b: &[NodeValue]) -> Vec<NodeValue> {
    a.iter().merge(b.iter()).dedup().copied().collect()
}

fn intersection(a: &[NodeValue], b: &[NodeValue]) -> Vec<NodeValue> {
    a.iter()
        .merge_join_by(b.iter(), |x, y| x.cmp(y))
        .filter_map(|e| match e {
            EitherOrBoth::Both(x, _) => Some(*x),
            _ => None,
        })
        .collect()
}

fn meet(a: Option<&[NodeValue]>, b: Option<&[NodeValue]>) -> Cond {
    match (a, b) {
        (None, None) => None,
        (Some(s), None) | (None, Some(s)) => Some(s.to_vec()),
        (Some(a), Some(b)) => Some(intersection(a, b)),
    }
}

fn join(a: Cond, b: Cond) -> Cond {
    Some(union(&a?, &b?))
}

/// Implication sets of every node value
struct ImpSets<'a> {
    net: &'a Network,
    consts: Vec<Option<bool>>,
    sets: Vec<Vec<NodeValue>>,
}

impl<'a> ImpSets<'a> {
    fn new(net: &'a Network, engine: &Engine<'_>, table: &ImpTable, from_table: bool) -> Self {
        let mut sets: Vec<Vec<NodeValue>> = (0..2 * net.nb_nodes())
            .map(|i| vec![NodeValue::new(i / 2, i % 2 != 0)])
            .collect();
        if from_table {
            for imp in table.facts() {
                sets[imp.dst.index()].push(imp.src);
            }
            for s in &mut sets {
                s.sort();
                s.dedup();
            }
        }
        ImpSets {
            net,
            consts: (0..net.nb_nodes()).map(|i| engine.const_value(i)).collect(),
            sets,
        }
    }

    fn total(&self) -> usize {
        self.sets.iter().map(|s| s.len()).sum()
    }

    /// Set of the value seen on a fanin pin; None if the pin always has this value
    fn pin(&self, h: Handle, val: bool) -> Option<&[NodeValue]> {
        let src_val = val ^ h.is_inverted();
        if self.consts[h.node()] == Some(src_val) {
            None
        } else {
            Some(&self.sets[NodeValue::new(h.node(), src_val).index()])
        }
    }

    fn out(&self, node: usize, val: bool) -> Option<&[NodeValue]> {
        Some(&self.sets[NodeValue::new(node, val).index()])
    }

    /// Add values to the set of a node value; returns the growth
    fn grow(&mut self, lit: NodeValue, added: Cond) -> usize {
        let Some(added) = added else {
            return 0;
        };
        if self.consts[lit.node].is_some() {
            return 0;
        }
        let set = &mut self.sets[lit.index()];
        let before = set.len();
        if added.iter().any(|v| set.binary_search(v).is_err()) {
            *set = union(set, &added);
        }
        set.len() - before
    }

    fn grow_pin(&mut self, h: Handle, val: bool, added: Cond) -> usize {
        self.grow(NodeValue::new(h.node(), val ^ h.is_inverted()), added)
    }

    fn forward(&mut self, id: usize) -> usize {
        let net = self.net;
        let n = net.node(id);
        if n.is_input() {
            return 0;
        }
        let (a, b) = (n.fanin(0), n.fanin(1));
        let (o0, o1) = match n.kind() {
            NodeType::And => (
                join(
                    self.pin(a, false).map(<[_]>::to_vec),
                    self.pin(b, false).map(<[_]>::to_vec),
                ),
                meet(self.pin(a, true), self.pin(b, true)),
            ),
            NodeType::Xor => (
                join(
                    meet(self.pin(a, false), self.pin(b, false)),
                    meet(self.pin(a, true), self.pin(b, true)),
                ),
                join(
                    meet(self.pin(a, false), self.pin(b, true)),
                    meet(self.pin(a, true), self.pin(b, false)),
                ),
            ),
            NodeType::Input => unreachable!(),
        };
        self.grow(NodeValue::new(id, false), o0) + self.grow(NodeValue::new(id, true), o1)
    }

    fn backward(&mut self, id: usize) -> usize {
        let net = self.net;
        let n = net.node(id);
        if n.is_input() {
            return 0;
        }
        let (a, b) = (n.fanin(0), n.fanin(1));
        match n.kind() {
            NodeType::And => {
                let a0 = meet(self.out(id, false), self.pin(b, true));
                let b0 = meet(self.out(id, false), self.pin(a, true));
                let o1 = self.out(id, true).map(<[_]>::to_vec);
                self.grow_pin(a, false, a0)
                    + self.grow_pin(b, false, b0)
                    + self.grow_pin(a, true, o1.clone())
                    + self.grow_pin(b, true, o1)
            }
            NodeType::Xor => {
                let mut ret = 0;
                for (x, y) in [(a, b), (b, a)] {
                    let x0 = join(
                        meet(self.out(id, false), self.pin(y, false)),
                        meet(self.out(id, true), self.pin(y, true)),
                    );
                    let x1 = join(
                        meet(self.out(id, true), self.pin(y, false)),
                        meet(self.out(id, false), self.pin(y, true)),
                    );
                    ret += self.grow_pin(x, false, x0) + self.grow_pin(x, true, x1);
                }
                ret
            }
            NodeType::Input => unreachable!(),
        }
    }

    /// Add the contrapositive of every member: if m implies l, then !l implies !m
    fn contrapositives(&mut self) -> usize {
        let mut added = Vec::new();
        for (i, set) in self.sets.iter().enumerate() {
            let lit = NodeValue::new(i / 2, i % 2 != 0);
            for m in set {
                if m.node != lit.node {
                    added.push((m.negated(), lit.negated()));
                }
            }
        }
        let mut ret = 0;
        for (dst, src) in added {
            ret += self.grow(dst, Some(vec![src]));
        }
        ret
    }
}

/// Propagate implication sets through the network until a fixpoint, and record the results
///
/// Constants are then searched again by trial assignment, with the new implications installed
/// in the propagation engine.
pub fn learn_fixpoint(net: &Network, table: &mut ImpTable, opts: &LearningOptions) -> FixpointStats {
    let mut engine = Engine::with_table(net, table);
    let mut stats = FixpointStats::default();
    let mut sets = ImpSets::new(net, &engine, table, opts.fixpoint_from_table);
    stats.sizes.push(sets.total());
    loop {
        loop {
            let mut delta = 0;
            for &id in net.topo_order() {
                if sets.consts[id].is_none() {
                    delta += sets.forward(id);
                }
            }
            for &id in net.topo_order().iter().rev() {
                if sets.consts[id].is_none() {
                    delta += sets.backward(id);
                }
            }
            stats.sizes.push(sets.total());
            debug!(delta, "Fixpoint iteration");
            if delta == 0 {
                break;
            }
        }
        if !opts.use_contra || sets.contrapositives() == 0 {
            break;
        }
        stats.nb_contra_rounds += 1;
    }

    let mut new_consts = Vec::new();
    for (i, set) in sets.sets.iter().enumerate() {
        let lit = NodeValue::new(i / 2, i % 2 != 0);
        if sets.consts[lit.node].is_some() {
            continue;
        }
        for m in set {
            if m.node == lit.node {
                if m.value != lit.value {
                    // The opposite value implies this one
                    new_consts.push(lit);
                }
                continue;
            }
            if sets.consts[m.node].is_none() && table.put(m.node, m.value, lit.node, lit.value) {
                stats.nb_facts += 1;
            }
        }
    }

    for c in new_consts {
        stats.nb_consts += mark_const(&mut engine, table, c.node, c.value);
    }
    engine.install(table);
    for &id in net.topo_order() {
        if engine.is_const(id) {
            continue;
        }
        for val in [false, true] {
            let ok = engine.assign(id, val);
            engine.backtrack();
            if !ok {
                stats.nb_consts += mark_const(&mut engine, table, id, !val);
                break;
            }
        }
    }
    info!(
        iterations = stats.sizes.len() - 1,
        facts = stats.nb_facts,
        consts = stats.nb_consts,
        "Fixpoint propagation done"
    );
    stats
}

fn mark_const(engine: &mut Engine<'_>, table: &mut ImpTable, node: usize, val: bool) -> usize {
    let marked = engine.set_const(node, val);
    for c in &marked {
        if let Some(v) = engine.const_value(*c) {
            debug!(node = c, value = v, "Constant node");
            table.set_const(*c, v);
        }
    }
    marked.len()
}

#[cfg(test)]
mod tests {
    use super::{intersection, learn_fixpoint, union};
    use crate::learn::{learn_direct, LearningOptions};
    use crate::network::generators::{carry_chain, testcases};
    use crate::table::NodeValue;
    use crate::{ImpTable, Network};

    #[test]
    fn test_set_operations() {
        let nv = NodeValue::new;
        let a = vec![nv(0, false), nv(1, true), nv(3, false)];
        let b = vec![nv(1, true), nv(2, false), nv(3, true)];
        assert_eq!(
            union(&a, &b),
            vec![nv(0, false), nv(1, true), nv(2, false), nv(3, false), nv(3, true)]
        );
        assert_eq!(intersection(&a, &b), vec![nv(1, true)]);
    }

    #[test]
    fn test_and_chain() {
        // x = a & b, y = x & c: y = 1 implies a = 1 through x
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let c = net.add_input();
        let x = net.and(a, b);
        let y = net.and(x, c);
        let mut table = ImpTable::new(net.nb_nodes());
        let opts = LearningOptions::default().with_contra(true);
        let stats = learn_fixpoint(&net, &mut table, &opts);
        assert!(table.check(y.node(), true, a.node(), true));
        assert!(table.check(a.node(), false, y.node(), false));
        assert!(table.check(y.node(), true, x.node(), true));
        assert!(!table.check(y.node(), false, a.node(), false));
        assert_eq!(*stats.sizes.last().unwrap(), stats.sizes[stats.sizes.len() - 2]);
    }

    #[test]
    fn test_contrapositive_rounds() {
        // o = (m | c) & (m | d) with m = a | b, and z = a | b built separately.
        // a = 1 implies o = 1; its contrapositive o = 0 => a = 0 must be in the sets for the
        // passes to find o = 0 => z = 0.
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let c = net.add_input();
        let d = net.add_input();
        let m = net.or(a, b);
        let p = net.or(m, c);
        let q = net.or(m, d);
        let o = net.and(p, q);
        let z = net.or(a, b);
        let z0 = z.is_inverted();

        let mut table = ImpTable::new(net.nb_nodes());
        let stats = learn_fixpoint(&net, &mut table, &LearningOptions::default());
        assert_eq!(stats.nb_contra_rounds, 0);
        assert!(table.check(a.node(), true, o.node(), true));
        assert!(!table.check(o.node(), false, z.node(), z0));

        let mut table = ImpTable::new(net.nb_nodes());
        let opts = LearningOptions::default().with_contra(true);
        let stats = learn_fixpoint(&net, &mut table, &opts);
        assert!(stats.nb_contra_rounds > 0);
        assert!(table.check(o.node(), false, z.node(), z0));
        assert!(table.check(z.node(), !z0, o.node(), true));
    }

    #[test]
    fn test_monotone() {
        let net = carry_chain::ripple_carry(6);
        let mut table = ImpTable::new(net.nb_nodes());
        let opts = LearningOptions::default().with_contra(true);
        learn_direct(&net, &mut table, &opts).unwrap();
        let before = table.nb_facts();
        let stats = learn_fixpoint(&net, &mut table, &opts);
        for w in stats.sizes.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert!(table.nb_facts() >= before);
    }

    #[test]
    fn test_xor_constant() {
        let net = testcases::constants();
        let mut table = ImpTable::new(net.nb_nodes());
        let opts = LearningOptions::default();
        learn_direct(&net, &mut table, &opts).unwrap();
        // a ^ a is not found by propagation alone
        assert_eq!(table.const_value(6), None);
        learn_fixpoint(&net, &mut table, &opts);
        assert_eq!(table.const_value(6), Some(false));
    }
}
