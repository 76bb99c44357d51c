//! Independent check of a table against the network, by SAT

use rustsat::solvers::SolverResult;
use tracing::{info, warn};

use crate::error::Result;
use crate::learn::cnf::{network_clauses, node_lit, solve_once};
use crate::table::{Implication, NodeValue};
use crate::{ImpTable, Network};

/// Facts and constants of a table that could not be proved
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Number of implications checked, contrapositives counted once
    pub nb_checked: usize,
    /// Implications with a counterexample or left unresolved
    pub failed_facts: Vec<Implication>,
    /// Constants with a counterexample or left unresolved
    pub failed_consts: Vec<NodeValue>,
}

impl VerifyReport {
    /// Returns true if every fact and constant was proved
    pub fn is_ok(&self) -> bool {
        self.failed_facts.is_empty() && self.failed_consts.is_empty()
    }
}

/// Prove every fact and constant of the table with a SAT solver
///
/// The encoding only uses the network, never the table, so that a wrong fact cannot be used to
/// prove another one. Each query runs in a fresh Kissat instance.
pub fn verify_table(
    net: &Network,
    table: &ImpTable,
    conflict_limit: Option<u32>,
) -> Result<VerifyReport> {
    let clauses = network_clauses(net);
    let mut report = VerifyReport::default();
    for imp in table.facts() {
        if imp.contrapositive() < imp {
            continue;
        }
        report.nb_checked += 1;
        let units = [
            node_lit(imp.src.node, imp.src.value),
            node_lit(imp.dst.node, !imp.dst.value),
        ];
        if solve_once(&clauses, &units, conflict_limit)? != SolverResult::Unsat {
            warn!(%imp, "Implication not proved");
            report.failed_facts.push(imp);
        }
    }
    for c in table.consts() {
        let units = [node_lit(c.node, !c.value)];
        if solve_once(&clauses, &units, conflict_limit)? != SolverResult::Unsat {
            warn!(%c, "Constant not proved");
            report.failed_consts.push(c);
        }
    }
    info!(
        checked = report.nb_checked,
        consts = table.nb_consts(),
        failed = report.failed_facts.len() + report.failed_consts.len(),
        "Verification done"
    );
    Ok(report)
}
