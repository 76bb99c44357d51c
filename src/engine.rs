//! Propagation of node values through the network
//!
//! The [`Engine`] keeps a partial three-valued assignment of the network, one [`State`] per node.
//! [`Engine::assign`] asserts a value on a node and propagates it forward to the fanouts and
//! backward to the fanins until nothing changes, or until a contradiction is found.
//! Each assignment is undone by a matching [`Engine::backtrack`].
//!
//! ```
//! # use implearn::{Engine, Val3};
//! # use implearn::network::generators::testcases;
//! // c = a & b
//! let net = testcases::and2();
//! let mut engine = Engine::new(&net);
//! assert!(engine.assign(2, true));
//! assert_eq!(engine.value(0), Val3::One);
//! assert_eq!(engine.value(1), Val3::One);
//! engine.backtrack();
//! assert_eq!(engine.value(0), Val3::X);
//! ```

mod justify;
mod state;

use std::collections::BTreeSet;

use crate::network::{Edge, Network, NodeType};
use crate::table::{ImpTable, NodeValue};

pub use justify::{justify, structural_sat};
pub use state::{Pin, Pins, State, Val3, AND_STATES, XOR_STATES};
use state::Step;

/// Receives the node values derived during an assignment
pub trait Recorder {
    /// Called once for each node whose output value becomes known
    fn record(&mut self, node: usize, value: bool);
}

impl Recorder for () {
    fn record(&mut self, _node: usize, _value: bool) {}
}

impl Recorder for Vec<NodeValue> {
    fn record(&mut self, node: usize, value: bool) {
        self.push(NodeValue::new(node, value));
    }
}

/// Pending propagation step
#[derive(Debug, Clone, Copy)]
enum Event {
    /// A fanin of `node` took a value, seen on input slot `pos`
    Fanin { node: usize, pos: usize, val: bool },
    /// The output of `node` is forced, through the fanout edge `from` if any
    Output {
        node: usize,
        val: bool,
        from: Option<Edge>,
    },
}

/// Constraint propagation engine over a network
///
/// Propagation uses an explicit event stack, so that its depth does not depend on the depth
/// of the network. Assignments nest: each [`assign`](Engine::assign) pushes a mark on the trail,
/// and [`backtrack`](Engine::backtrack) restores every state changed since the last mark.
#[derive(Debug, Clone)]
pub struct Engine<'a> {
    network: &'a Network,
    states: Vec<State>,
    consts: Vec<Option<bool>>,
    trail: Vec<(usize, State)>,
    marks: Vec<usize>,
    unjustified: BTreeSet<usize>,
    learned: Vec<Vec<NodeValue>>,
    events: Vec<Event>,
}

impl<'a> Engine<'a> {
    /// Create an engine with every node unknown
    pub fn new(network: &'a Network) -> Engine<'a> {
        let states = network
            .nodes()
            .iter()
            .map(|n| State::initial(n.kind()))
            .collect();
        Engine {
            network,
            states,
            consts: vec![None; network.nb_nodes()],
            trail: Vec::new(),
            marks: Vec::new(),
            unjustified: BTreeSet::new(),
            learned: vec![Vec::new(); 2 * network.nb_nodes()],
            events: Vec::new(),
        }
    }

    /// Create an engine using the constants and implications already learned
    pub fn with_table(network: &'a Network, table: &ImpTable) -> Engine<'a> {
        let mut ret = Engine::new(network);
        for c in table.consts() {
            ret.set_const(c.node, c.value);
        }
        ret.install(table);
        ret
    }

    /// Network the engine works on
    pub fn network(&self) -> &'a Network {
        self.network
    }

    /// Current value of a node
    pub fn value(&self, node: usize) -> Val3 {
        self.states[node].value()
    }

    /// Current state of a node
    pub fn state(&self, node: usize) -> State {
        self.states[node]
    }

    /// Constant value of a node, if it has been proven constant
    pub fn const_value(&self, node: usize) -> Option<bool> {
        self.consts[node]
    }

    /// Returns true if the node has been proven constant
    pub fn is_const(&self, node: usize) -> bool {
        self.consts[node].is_some()
    }

    /// Number of assignments not yet backtracked
    pub fn nb_marks(&self) -> usize {
        self.marks.len()
    }

    /// Returns true if the node output is known but not explained by its inputs
    pub fn is_unjustified(&self, node: usize) -> bool {
        self.unjustified.contains(&node)
    }

    /// Unjustified nodes, by increasing id
    pub fn unjustified(&self) -> impl Iterator<Item = usize> + '_ {
        self.unjustified.iter().copied()
    }

    /// Unjustified node with the smallest id
    pub fn first_unjustified(&self) -> Option<usize> {
        self.unjustified.iter().next().copied()
    }

    /// Assert a value on a node and propagate it
    ///
    /// Returns false if a contradiction was found. A mark is pushed in both cases, and the
    /// caller must call [`backtrack`](Engine::backtrack) before the states can be trusted again.
    pub fn assign(&mut self, node: usize, val: bool) -> bool {
        self.assign_with(node, val, &mut ())
    }

    /// Same as [`assign`](Engine::assign), reporting every node value derived to a recorder
    pub fn assign_with<R: Recorder + ?Sized>(
        &mut self,
        node: usize,
        val: bool,
        rec: &mut R,
    ) -> bool {
        self.marks.push(self.trail.len());
        self.bwd_prop(node, val, None);
        self.propagate(rec)
    }

    /// Undo the most recent assignment
    pub fn backtrack(&mut self) {
        let mark = match self.marks.pop() {
            Some(m) => m,
            None => panic!("Backtrack without a matching assignment"),
        };
        let undone = self.trail.split_off(mark);
        for (node, prev) in undone.into_iter().rev() {
            self.states[node] = prev;
            self.sync_unjustified(node);
        }
    }

    /// Mark a node as constant, and derive the constant nodes that follow structurally
    ///
    /// An And with a fanin constant at 0 is constant, as is an And or a Xor whose two fanins
    /// are constant. Returns the nodes newly marked, the first being `node` itself.
    /// States are not modified.
    pub fn set_const(&mut self, node: usize, val: bool) -> Vec<usize> {
        debug_assert!(self.marks.is_empty());
        if self.consts[node].is_some() {
            return Vec::new();
        }
        self.consts[node] = Some(val);
        let mut ret = vec![node];
        for &i in self.network.topo_order() {
            if self.consts[i].is_some() {
                continue;
            }
            let n = self.network.node(i);
            let c = match n.kind() {
                NodeType::Input => None,
                NodeType::And => match (self.fanin_const(i, 0), self.fanin_const(i, 1)) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                },
                NodeType::Xor => self
                    .fanin_const(i, 0)
                    .zip(self.fanin_const(i, 1))
                    .map(|(a, b)| a ^ b),
            };
            if let Some(c) = c {
                self.consts[i] = Some(c);
                ret.push(i);
            }
        }
        ret
    }

    fn fanin_const(&self, node: usize, pos: usize) -> Option<bool> {
        let h = self.network.node(node).fanin(pos);
        self.consts[h.node()].map(|c| c ^ h.is_inverted())
    }

    /// Use learned implications during propagation
    ///
    /// Once installed, whenever a node takes a value, the values it is known to imply are
    /// asserted as well. Replaces previously installed implications.
    pub fn install(&mut self, table: &ImpTable) {
        assert_eq!(table.nb_nodes(), self.network.nb_nodes());
        for (i, l) in self.learned.iter_mut().enumerate() {
            *l = table.get(i / 2, i % 2 != 0).to_vec();
        }
    }

    /// Run the pending events until a fixpoint or a contradiction
    fn propagate<R: Recorder + ?Sized>(&mut self, rec: &mut R) -> bool {
        while let Some(ev) = self.events.pop() {
            let ok = match ev {
                Event::Fanin { node, pos, val } => self.fwd_imp(node, pos, val, rec),
                Event::Output { node, val, from } => self.bwd_imp(node, val, from, rec),
            };
            if !ok {
                self.events.clear();
                return false;
            }
        }
        true
    }

    /// A fanin of the node took a value
    fn fwd_imp<R: Recorder + ?Sized>(
        &mut self,
        node: usize,
        pos: usize,
        val: bool,
        rec: &mut R,
    ) -> bool {
        self.update(node, Pin::In(pos), val, None, rec)
    }

    /// The output of the node is forced
    fn bwd_imp<R: Recorder + ?Sized>(
        &mut self,
        node: usize,
        val: bool,
        from: Option<Edge>,
        rec: &mut R,
    ) -> bool {
        if self.consts[node] == Some(!val) {
            return false;
        }
        self.update(node, Pin::Out, val, from, rec)
    }

    /// Schedule a value on the output of a node
    fn bwd_prop(&mut self, node: usize, val: bool, from: Option<Edge>) {
        self.events.push(Event::Output { node, val, from });
    }

    /// Schedule the value of a node on all its fanout edges, except the one it came from
    fn fanout_prop(&mut self, node: usize, val: bool, from: Option<Edge>) {
        for e in self.network.node(node).fanouts() {
            if Some(*e) == from {
                continue;
            }
            self.events.push(Event::Fanin {
                node: e.dst,
                pos: e.pos,
                val: val ^ e.inverted,
            });
        }
    }

    /// Schedule a value forced on an input slot back to the fanin node
    fn fanin_prop(&mut self, node: usize, pos: usize, val: bool) {
        let e = self.network.node(node).fanin_edge(pos);
        self.bwd_prop(e.src, val ^ e.inverted, Some(e));
    }

    /// Schedule the learned implications of a node value
    fn learned_prop(&mut self, node: usize, val: bool) {
        for nv in &self.learned[NodeValue::new(node, val).index()] {
            self.events.push(Event::Output {
                node: nv.node,
                val: nv.value,
                from: None,
            });
        }
    }

    /// Apply a value on a pin of a node and schedule its consequences
    fn update<R: Recorder + ?Sized>(
        &mut self,
        node: usize,
        pin: Pin,
        val: bool,
        from: Option<Edge>,
        rec: &mut R,
    ) -> bool {
        let old = self.states[node];
        let new = match old.set(pin, val) {
            Step::Unchanged => return true,
            Step::Conflict => return false,
            Step::Changed(s) => s,
        };
        self.save_state(node, new);

        if let (Val3::X, Some(v)) = (old.value(), new.value().to_bool()) {
            if self.consts[node] == Some(!v) {
                return false;
            }
            rec.record(node, v);
            self.fanout_prop(node, v, from);
            self.learned_prop(node, v);
        }
        for pos in 0..self.network.node(node).fanins().len() {
            let p = Pin::In(pos);
            if p == pin || old.pin(p).is_known() {
                continue;
            }
            if let Some(v) = new.pin(p).to_bool() {
                self.fanin_prop(node, pos, v);
            }
        }
        true
    }

    fn save_state(&mut self, node: usize, state: State) {
        debug_assert!(state.is_legal());
        self.trail.push((node, self.states[node]));
        self.states[node] = state;
        self.sync_unjustified(node);
    }

    fn sync_unjustified(&mut self, node: usize) {
        if self.states[node].is_unjustified() {
            self.unjustified.insert(node);
        } else {
            self.unjustified.remove(&node);
        }
    }

    /// Check consistency of the datastructure
    ///
    /// Only meaningful when no contradiction is pending: after a successful assignment or after
    /// a backtrack.
    pub fn check(&self) {
        assert_eq!(self.states.len(), self.network.nb_nodes());
        assert!(self.events.is_empty());
        for n in self.network.nodes() {
            let s = self.states[n.id()];
            assert!(s.is_legal(), "Illegal state {s} at node {}", n.id());
            assert_eq!(s.is_unjustified(), self.is_unjustified(n.id()));
            for pos in 0..n.fanins().len() {
                let h = n.fanin(pos);
                let expected = match self.value(h.node()).to_bool() {
                    Some(v) => Val3::from(v ^ h.is_inverted()),
                    None => Val3::X,
                };
                assert_eq!(
                    s.pin(Pin::In(pos)),
                    expected,
                    "Inconsistent input {pos} at node {}",
                    n.id()
                );
            }
        }
        if self.marks.is_empty() {
            assert!(self.trail.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Engine, Val3};
    use crate::network::generators::testcases;
    use crate::table::{ImpTable, NodeValue};
    use crate::Network;

    #[test]
    fn test_and_scenario() {
        let net = testcases::and2();
        let mut engine = Engine::new(&net);
        let mut derived = Vec::new();
        assert!(engine.assign_with(2, true, &mut derived));
        engine.check();
        assert_eq!(engine.value(0), Val3::One);
        assert_eq!(engine.value(1), Val3::One);
        derived.sort();
        assert_eq!(
            derived,
            vec![
                NodeValue::new(0, true),
                NodeValue::new(1, true),
                NodeValue::new(2, true)
            ]
        );
        engine.backtrack();
        engine.check();
        for i in 0..3 {
            assert_eq!(engine.value(i), Val3::X);
        }

        assert!(engine.assign(0, false));
        assert_eq!(engine.value(2), Val3::Zero);
        assert!(!engine.assign(2, true));
        engine.backtrack();
        engine.check();
        assert_eq!(engine.value(2), Val3::Zero);
        engine.backtrack();
        engine.check();
        assert_eq!(engine.value(2), Val3::X);
        assert_eq!(engine.nb_marks(), 0);
    }

    #[test]
    fn test_xor_scenario() {
        let net = testcases::xor2();
        let mut engine = Engine::new(&net);
        assert!(engine.assign(0, true));
        assert_eq!(engine.value(2), Val3::X);
        assert!(engine.assign(1, true));
        assert_eq!(engine.value(2), Val3::Zero);
        engine.check();
        engine.backtrack();
        engine.backtrack();
        engine.check();
    }

    #[test]
    fn test_backward_through_inversions() {
        // d = !(a & !b) with e = d ^ c
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let c = net.add_input();
        let d = !net.and(a, !b);
        let e = net.xor(d, c);
        let mut engine = Engine::new(&net);
        // d = 0 means a & !b = 1
        assert!(engine.assign(d.node(), true));
        assert_eq!(engine.value(a.node()), Val3::One);
        assert_eq!(engine.value(b.node()), Val3::Zero);
        assert_eq!(engine.value(e.node()), Val3::X);
        assert!(engine.assign(c.node(), true));
        // e = d ^ c = 0 ^ 1
        assert_eq!(engine.value(e.node()), Val3::One);
        engine.check();
        engine.backtrack();
        engine.backtrack();
        engine.check();
    }

    #[test]
    fn test_unjustified() {
        let net = testcases::and2();
        let mut engine = Engine::new(&net);
        assert!(engine.assign(2, false));
        assert!(engine.is_unjustified(2));
        assert_eq!(engine.first_unjustified(), Some(2));
        assert!(engine.assign(1, true));
        assert!(!engine.is_unjustified(2));
        assert_eq!(engine.value(0), Val3::Zero);
        engine.backtrack();
        assert!(engine.is_unjustified(2));
        engine.backtrack();
        assert_eq!(engine.unjustified().count(), 0);
        engine.check();
    }

    #[test]
    fn test_set_const() {
        let net = testcases::constants();
        let mut engine = Engine::new(&net);
        // n3 = a & b
        let marked = engine.set_const(3, false);
        // n5 = n3 & n4
        assert_eq!(marked, vec![3, 5]);
        assert_eq!(engine.const_value(5), Some(false));
        assert!(engine.set_const(3, false).is_empty());
        // a & b = 1 is now a contradiction
        assert!(!engine.assign(3, true));
        engine.backtrack();
        assert!(!engine.assign(5, true));
        engine.backtrack();
        engine.check();
    }

    #[test]
    fn test_xor_const() {
        let mut net = Network::new();
        let a = net.add_input();
        let b = net.add_input();
        let x = net.xor(a, !b);
        let mut engine = Engine::new(&net);
        engine.set_const(a.node(), true);
        assert!(!engine.is_const(x.node()));
        let marked = engine.set_const(b.node(), true);
        assert_eq!(marked, vec![b.node(), x.node()]);
        assert_eq!(engine.const_value(x.node()), Some(true));
    }

    #[test]
    fn test_installed_implications() {
        let net = testcases::reconvergent();
        let mut engine = Engine::new(&net);
        // n5 is !(ab | ac) and n7 is a & (b | c): n7 = 1 implies n5 = 0
        assert!(engine.assign(7, true));
        assert_eq!(engine.value(5), Val3::X);
        engine.backtrack();

        let mut table = ImpTable::new(net.nb_nodes());
        table.put(7, true, 5, false);
        engine.install(&table);
        assert!(engine.assign(7, true));
        assert_eq!(engine.value(5), Val3::Zero);
        engine.check();
        engine.backtrack();
        // The contrapositive is installed too
        assert!(engine.assign(5, true));
        assert_eq!(engine.value(7), Val3::Zero);
        engine.backtrack();
        engine.check();
    }

    #[test]
    fn test_deep_chain() {
        // Deep enough to overflow a recursive implementation
        let mut net = Network::new();
        let mut x = net.add_input();
        for _ in 0..200_000 {
            let i = net.add_input();
            x = net.and(x, i);
        }
        let mut engine = Engine::new(&net);
        assert!(engine.assign(x.node(), true));
        assert_eq!(engine.value(0), Val3::One);
        engine.backtrack();
        assert_eq!(engine.value(0), Val3::X);
    }
}
