//! Structural satisfiability check based on the unjustified nodes
//!
//! When no node is unjustified, every known output is explained by known inputs, and the
//! partial assignment extends to a full assignment of the network: it is satisfiable.

use crate::engine::{Engine, Val3};
use crate::table::NodeValue;

/// Try to justify the current assignment by a greedy depth-first search
///
/// Takes the unjustified node with the smallest id and tries its justifications in order; the
/// first one that propagates without contradiction is explored further, up to `depth` levels.
/// Returns [`Val3::One`] if an assignment without unjustified nodes was reached, [`Val3::X`]
/// otherwise. The engine is left as it was.
pub fn justify(engine: &mut Engine<'_>, depth: usize) -> Val3 {
    let Some(node) = engine.first_unjustified() else {
        return Val3::One;
    };
    if depth == 0 {
        return Val3::X;
    }
    let n = engine.network().node(node);
    for &(pos, val) in engine.state(node).justifications() {
        let h = n.fanin(pos);
        let ok = engine.assign(h.node(), val ^ h.is_inverted());
        let ret = if ok { justify(engine, depth - 1) } else { Val3::X };
        engine.backtrack();
        if ok {
            return ret;
        }
    }
    Val3::X
}

/// Check whether two node values can hold together
///
/// Returns [`Val3::Zero`] if propagation finds a contradiction, so that `a` implies the
/// negation of `b`; [`Val3::One`] if a justification was found, so that both can hold;
/// [`Val3::X`] if neither could be shown.
pub fn structural_sat(engine: &mut Engine<'_>, a: NodeValue, b: NodeValue, depth: usize) -> Val3 {
    let mut ret = Val3::Zero;
    if engine.assign(a.node, a.value) {
        if engine.assign(b.node, b.value) {
            ret = justify(engine, depth);
        }
        engine.backtrack();
    }
    engine.backtrack();
    ret
}
