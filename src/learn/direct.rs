//! Direct implications, by trial assignment
//!
//! Every node is assigned to 0 then to 1. Whatever propagation derives is an implication of
//! that node value; an assignment that fails proves the node constant.

use std::fmt;

use kdam::{tqdm, BarExt};
use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::Result;
use crate::learn::LearningOptions;
use crate::table::NodeValue;
use crate::{ImpTable, Network};

/// Statistics of direct learning
#[derive(Debug, Clone, Default)]
pub struct DirectStats {
    /// Number of assignments tried
    pub nb_assignments: usize,
    /// Number of new facts, contrapositives excluded
    pub nb_facts: usize,
    /// Number of nodes found constant
    pub nb_consts: usize,
}

impl fmt::Display for DirectStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Direct learning:")?;
        writeln!(f, "  Assignments: {}", self.nb_assignments)?;
        writeln!(f, "  New facts: {}", self.nb_facts)?;
        writeln!(f, "  Constants: {}", self.nb_consts)?;
        Ok(())
    }
}

/// Record the direct implications of every node value
pub fn learn_direct(
    net: &Network,
    table: &mut ImpTable,
    opts: &LearningOptions,
) -> Result<DirectStats> {
    let mut engine = Engine::with_table(net, table);
    let mut stats = DirectStats::default();
    let mut progress = tqdm!(total = net.nb_nodes(), disable = !opts.progress);
    progress.set_description("Direct learning");
    let mut derived: Vec<NodeValue> = Vec::new();
    for &id in net.topo_order() {
        progress.update(1)?;
        if engine.is_const(id) {
            continue;
        }
        for val in [false, true] {
            derived.clear();
            stats.nb_assignments += 1;
            let ok = engine.assign_with(id, val, &mut derived);
            engine.backtrack();
            if !ok {
                for c in engine.set_const(id, !val) {
                    if let Some(v) = engine.const_value(c) {
                        debug!(node = c, value = v, "Constant node");
                        table.set_const(c, v);
                        stats.nb_consts += 1;
                    }
                }
                break;
            }
            for nv in &derived {
                if table.put(id, val, nv.node, nv.value) {
                    stats.nb_facts += 1;
                }
            }
        }
        progress.set_postfix(format!("facts={} consts={}", stats.nb_facts, stats.nb_consts));
    }
    info!(
        facts = stats.nb_facts,
        consts = stats.nb_consts,
        "Direct learning done"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::learn_direct;
    use crate::engine::Engine;
    use crate::learn::LearningOptions;
    use crate::network::generators::{random, testcases};
    use crate::ImpTable;

    #[test]
    fn test_and_facts() {
        let net = testcases::and2();
        let mut table = ImpTable::new(3);
        let stats = learn_direct(&net, &mut table, &LearningOptions::default()).unwrap();
        assert!(table.check(2, true, 0, true));
        assert!(table.check(2, true, 1, true));
        assert!(table.check(0, false, 2, false));
        assert!(table.check(1, false, 2, false));
        assert!(!table.check(2, false, 0, false));
        assert_eq!(table.nb_facts(), 4);
        assert_eq!(stats.nb_consts, 0);
        assert_eq!(stats.nb_assignments, 6);
    }

    #[test]
    fn test_constants() {
        let net = testcases::constants();
        let mut table = ImpTable::new(net.nb_nodes());
        learn_direct(&net, &mut table, &LearningOptions::default()).unwrap();
        assert_eq!(table.const_value(2), Some(false));
        assert_eq!(table.const_value(5), Some(false));
        assert_eq!(table.const_value(0), None);
    }

    #[test]
    fn test_sound_by_propagation() {
        for seed in 0..5 {
            let net = random::random_network(5, 40, 10, 3, seed);
            let mut table = ImpTable::new(net.nb_nodes());
            learn_direct(&net, &mut table, &LearningOptions::default()).unwrap();
            let mut engine = Engine::new(&net);
            for imp in table.facts() {
                if table.const_value(imp.src.node).is_some() {
                    continue;
                }
                assert!(engine.assign(imp.src.node, imp.src.value));
                assert!(!engine.assign(imp.dst.node, !imp.dst.value), "{imp}");
                engine.backtrack();
                engine.backtrack();
            }
            engine.check();
        }
    }
}
