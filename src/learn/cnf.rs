//! CNF encoding of fanin cones
//!
//! Each node is a SAT variable with the same index. [`ConeSolver`] keeps a live incremental
//! solver, extended lazily with the cones of new nodes and queried under assumptions.
//! [`solve_once`] loads a fixed clause set into a one-shot solver instead.

use fxhash::FxHashSet;
use rustsat::clause;
use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Clause, Lit};
use rustsat_kissat::Kissat;
use rustsat_minisat::core::Minisat;

use crate::error::{ImpError, Result};
use crate::{Handle, Network, NodeType};

/// Literal stating that a node has the given value
pub(crate) fn node_lit(node: usize, value: bool) -> Lit {
    Lit::new(node as u32, !value)
}

/// Literal stating that the value seen through a handle is 1
fn handle_lit(h: Handle) -> Lit {
    Lit::new(h.node() as u32, h.is_inverted())
}

fn solver_error(e: impl std::fmt::Display) -> ImpError {
    ImpError::Solver(e.to_string())
}

/// Clauses of a single node: 3 for an And, 4 for a Xor, a unit clause if constant
fn node_clauses(net: &Network, consts: &[Option<bool>], i: usize, ret: &mut Vec<Clause>) {
    if let Some(c) = consts.get(i).copied().flatten() {
        ret.push(clause![node_lit(i, c)]);
    }
    let n = net.node(i);
    let o = node_lit(i, true);
    match n.kind() {
        NodeType::Input => (),
        NodeType::And => {
            let a = handle_lit(n.fanin(0));
            let b = handle_lit(n.fanin(1));
            ret.push(clause![a, !o]);
            ret.push(clause![b, !o]);
            ret.push(clause![!a, !b, o]);
        }
        NodeType::Xor => {
            let a = handle_lit(n.fanin(0));
            let b = handle_lit(n.fanin(1));
            ret.push(clause![a, b, !o]);
            ret.push(clause![!a, !b, !o]);
            ret.push(clause![!a, b, o]);
            ret.push(clause![a, !b, o]);
        }
    }
}

/// Clauses of the whole network, without constants
pub(crate) fn network_clauses(net: &Network) -> Vec<Clause> {
    let mut ret = Vec::new();
    for i in 0..net.nb_nodes() {
        node_clauses(net, &[], i, &mut ret);
    }
    ret
}

/// Solve a clause set with additional unit literals, in a fresh solver
pub(crate) fn solve_once(
    clauses: &[Clause],
    units: &[Lit],
    conflict_limit: Option<u32>,
) -> Result<SolverResult> {
    let mut solver = Kissat::default();
    if let Some(limit) = conflict_limit {
        solver.set_limit(rustsat_kissat::Limit::Conflicts(limit));
    }
    for cl in clauses {
        solver.add_clause(cl.clone()).map_err(solver_error)?;
    }
    for l in units {
        solver.add_clause(clause![*l]).map_err(solver_error)?;
    }
    solver.solve().map_err(solver_error)
}

/// Incremental solver holding the fanin cones of a set of nodes
pub(crate) struct ConeSolver {
    solver: Minisat,
    in_cone: FxHashSet<usize>,
}

impl ConeSolver {
    pub fn new() -> ConeSolver {
        ConeSolver {
            solver: Minisat::default(),
            in_cone: FxHashSet::default(),
        }
    }

    /// Add the clauses for the cone of `root`, for the nodes not already encoded
    pub fn extend(&mut self, net: &Network, consts: &[Option<bool>], root: usize) -> Result<()> {
        let mut clauses = Vec::new();
        let mut to_visit = vec![root];
        while let Some(i) = to_visit.pop() {
            if !self.in_cone.insert(i) {
                continue;
            }
            node_clauses(net, consts, i, &mut clauses);
            to_visit.extend(net.node(i).fanins().iter().map(|h| h.node()));
        }
        for cl in clauses {
            self.add_clause(cl)?;
        }
        Ok(())
    }

    /// Add a clause known to hold in the network
    pub fn add_clause(&mut self, cl: Clause) -> Result<()> {
        self.solver.add_clause(cl).map_err(solver_error)
    }

    /// Solve under assumptions, with a conflict budget for this call only
    pub fn solve(&mut self, assumps: &[Lit], conflict_limit: Option<u32>) -> Result<SolverResult> {
        let limit = match conflict_limit {
            Some(l) => rustsat_minisat::Limit::Conflicts(l.into()),
            None => rustsat_minisat::Limit::None,
        };
        self.solver.set_limit(limit);
        self.solver.solve_assumps(assumps).map_err(solver_error)
    }

    #[cfg(test)]
    fn cone_size(&self) -> usize {
        self.in_cone.len()
    }
}

#[cfg(test)]
mod tests {
    use rustsat::clause;
    use rustsat::solvers::SolverResult;

    use super::{network_clauses, node_lit, solve_once, ConeSolver};
    use crate::network::generators::testcases;

    #[test]
    fn test_and_cone() {
        let net = testcases::and2();
        let mut cone = ConeSolver::new();
        cone.extend(&net, &[], 2).unwrap();
        assert_eq!(cone.cone_size(), 3);
        cone.extend(&net, &[], 0).unwrap();
        assert_eq!(cone.cone_size(), 3);
        let r = cone.solve(&[node_lit(2, true), node_lit(0, false)], None).unwrap();
        assert_eq!(r, SolverResult::Unsat);
        // Assumptions do not stay after the call
        let r = cone.solve(&[node_lit(2, false), node_lit(0, true)], None).unwrap();
        assert_eq!(r, SolverResult::Sat);
    }

    #[test]
    fn test_consts() {
        let net = testcases::xor2();
        let mut cone = ConeSolver::new();
        cone.extend(&net, &[Some(true), None, None], 2).unwrap();
        let r = cone.solve(&[node_lit(2, true), node_lit(1, true)], None).unwrap();
        assert_eq!(r, SolverResult::Unsat);
        let r = cone.solve(&[node_lit(2, true), node_lit(1, false)], None).unwrap();
        assert_eq!(r, SolverResult::Sat);
    }

    #[test]
    fn test_added_clause() {
        let net = testcases::xor2();
        let mut cone = ConeSolver::new();
        cone.extend(&net, &[], 2).unwrap();
        let r = cone.solve(&[node_lit(0, true), node_lit(1, true)], None).unwrap();
        assert_eq!(r, SolverResult::Sat);
        cone.add_clause(clause![node_lit(0, false), node_lit(1, false)])
            .unwrap();
        let r = cone.solve(&[node_lit(0, true), node_lit(1, true)], None).unwrap();
        assert_eq!(r, SolverResult::Unsat);
    }

    #[test]
    fn test_solve_once() {
        let net = testcases::and2();
        let clauses = network_clauses(&net);
        assert_eq!(clauses.len(), 3);
        let r = solve_once(&clauses, &[node_lit(2, true), node_lit(1, false)], None).unwrap();
        assert_eq!(r, SolverResult::Unsat);
        let r = solve_once(&clauses, &[node_lit(2, false)], None).unwrap();
        assert_eq!(r, SolverResult::Sat);
    }
}
