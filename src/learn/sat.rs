//! Simulation-guided implication discovery, proved by SAT
//!
//! Random simulation proposes candidate implications between node pairs and discards those it
//! contradicts. Survivors are grouped by source node, and each group shares an incremental
//! solver: it starts with the cone of the source, grows with the cone of each destination, and
//! keeps the clauses of the implications already proved. Simulation is only a filter: nothing
//! is recorded without a proof.

use std::fmt;

use itertools::{EitherOrBoth, Itertools};
use kdam::{tqdm, BarExt};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustsat::clause;
use rustsat::solvers::SolverResult;
use tracing::{debug, info};

use crate::engine::{structural_sat, Engine, Val3};
use crate::error::Result;
use crate::learn::cnf::{node_lit, ConeSolver};
use crate::learn::LearningOptions;
use crate::sim::BitSimulator;
use crate::table::{Implication, NodeValue};
use crate::{ImpTable, Network};

/// Statistics of SAT-based learning
#[derive(Debug, Clone, Default)]
pub struct SatStats {
    /// Candidates after the first simulation round
    pub nb_initial_candidates: usize,
    /// Candidates left after simulation
    pub nb_candidates: usize,
    /// Number of simulation rounds
    pub nb_sim_rounds: usize,
    /// Candidates already in the table when their turn came
    pub nb_known: usize,
    /// Candidates proved by propagation alone
    pub nb_structural_proved: usize,
    /// Candidates refuted by structural justification
    pub nb_structural_refuted: usize,
    /// Number of SAT calls
    pub nb_solve: usize,
    /// Calls that proved the candidate
    pub nb_unsat: usize,
    /// Calls that refuted the candidate
    pub nb_sat: usize,
    /// Calls that reached the conflict limit
    pub nb_aborted: usize,
    /// Candidates left unresolved by the conflict limit; they may be retried with a larger one
    pub unresolved: Vec<Implication>,
    /// New facts, contrapositives and transitive compositions included
    pub nb_facts: usize,
}

impl fmt::Display for SatStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sat learning:")?;
        writeln!(
            f,
            "  Candidates: {} ({} before simulation, {} rounds)",
            self.nb_candidates, self.nb_initial_candidates, self.nb_sim_rounds
        )?;
        writeln!(f, "  Already known: {}", self.nb_known)?;
        if self.nb_structural_proved + self.nb_structural_refuted != 0 {
            writeln!(
                f,
                "  Structural: {} proved, {} refuted",
                self.nb_structural_proved, self.nb_structural_refuted
            )?;
        }
        writeln!(
            f,
            "  Solver calls: {} ({} unsat, {} sat, {} aborted)",
            self.nb_solve, self.nb_unsat, self.nb_sat, self.nb_aborted
        )?;
        writeln!(f, "  New facts: {}", self.nb_facts)?;
        Ok(())
    }
}

/// Sorted primary inputs in the fanin cone of every node
pub(crate) fn input_supports(net: &Network) -> Vec<Vec<usize>> {
    let mut ret: Vec<Vec<usize>> = vec![Vec::new(); net.nb_nodes()];
    for &i in net.topo_order() {
        let n = net.node(i);
        let support = if n.is_input() {
            vec![i]
        } else {
            let a = &ret[n.fanin(0).node()];
            let b = &ret[n.fanin(1).node()];
            a.iter().merge(b.iter()).dedup().copied().collect()
        };
        ret[i] = support;
    }
    ret
}

fn shares_input(a: &[usize], b: &[usize]) -> bool {
    a.iter()
        .merge_join_by(b.iter(), |x, y| x.cmp(y))
        .any(|e| matches!(e, EitherOrBoth::Both(..)))
}

/// Returns true if no simulated pattern contradicts the implication
fn holds(values: &[u64], imp: &Implication) -> bool {
    let src = values[imp.src.node];
    let dst = values[imp.dst.node];
    let src_patterns = if imp.src.value { src } else { !src };
    let violating = if imp.dst.value { !dst } else { dst };
    src_patterns & violating == 0
}

/// Candidate implications from node i to an earlier node j, not already known
fn initial_candidates(
    net: &Network,
    table: &ImpTable,
    consts: &[Option<bool>],
    values: &[u64],
) -> Vec<Implication> {
    let supports = input_supports(net);
    let mut ret = Vec::new();
    for i in 0..net.nb_nodes() {
        if consts[i].is_some() {
            continue;
        }
        for j in 0..i {
            if consts[j].is_some() || !shares_input(&supports[i], &supports[j]) {
                continue;
            }
            for (sv, dv) in [(false, false), (false, true), (true, false), (true, true)] {
                let imp = Implication {
                    src: NodeValue::new(i, sv),
                    dst: NodeValue::new(j, dv),
                };
                if holds(values, &imp) && !table.check(i, sv, j, dv) {
                    ret.push(imp);
                }
            }
        }
    }
    ret
}

/// Record a proved implication, and compose it with the facts known at both ends
///
/// With `src => dst`, everything implied by `dst` is implied by `src`, and everything implied
/// by `!src` is implied by `!dst`. Returns the number of new facts.
fn record(table: &mut ImpTable, consts: &[Option<bool>], imp: Implication) -> usize {
    let (src, dst) = (imp.src, imp.dst);
    let mut ret = table.put_implication(imp) as usize;
    let after = table.get(dst.node, dst.value).to_vec();
    for d in after {
        if d.node != src.node && consts[d.node].is_none() {
            ret += table.put(src.node, src.value, d.node, d.value) as usize;
        }
    }
    let before = table.get(src.node, !src.value).to_vec();
    for s in before {
        if s.node != dst.node && consts[s.node].is_none() {
            ret += table.put(dst.node, !dst.value, s.node, s.value) as usize;
        }
    }
    ret
}

/// Find implications by random simulation and prove them with a SAT solver
pub fn learn_sat(net: &Network, table: &mut ImpTable, opts: &LearningOptions) -> Result<SatStats> {
    let mut engine = Engine::with_table(net, table);
    let consts: Vec<Option<bool>> = (0..net.nb_nodes()).map(|i| engine.const_value(i)).collect();
    let mut stats = SatStats::default();

    let mut rng = SmallRng::seed_from_u64(opts.seed);
    let mut sim = BitSimulator::new(net);
    sim.run_random(&mut rng);
    let mut candidates = initial_candidates(net, table, &consts, sim.values());
    stats.nb_initial_candidates = candidates.len();
    stats.nb_sim_rounds = 1;

    let mut nb_stable = 0;
    while nb_stable < opts.sim_stable_rounds && stats.nb_sim_rounds < opts.sim_max_rounds {
        sim.run_random(&mut rng);
        let before = candidates.len();
        candidates.retain(|c| holds(sim.values(), c));
        stats.nb_sim_rounds += 1;
        if before - candidates.len() < opts.sim_min_eliminations {
            nb_stable += 1;
        } else {
            nb_stable = 0;
        }
    }
    stats.nb_candidates = candidates.len();
    info!(
        initial = stats.nb_initial_candidates,
        remaining = stats.nb_candidates,
        rounds = stats.nb_sim_rounds,
        "Simulation done"
    );

    let mut progress = tqdm!(total = candidates.len(), disable = !opts.progress);
    progress.set_description("Candidates verified");
    let mut cone = ConeSolver::new();
    let mut cur_src = None;
    for imp in candidates {
        progress.update(1)?;
        if cur_src != Some(imp.src.node) {
            cone = ConeSolver::new();
            cone.extend(net, &consts, imp.src.node)?;
            cur_src = Some(imp.src.node);
        }
        if table.check(imp.src.node, imp.src.value, imp.dst.node, imp.dst.value) {
            stats.nb_known += 1;
            continue;
        }
        if opts.justify_depth > 0 {
            match structural_sat(&mut engine, imp.src, imp.dst.negated(), opts.justify_depth) {
                Val3::Zero => {
                    stats.nb_structural_proved += 1;
                    stats.nb_facts += record(table, &consts, imp);
                    continue;
                }
                Val3::One => {
                    stats.nb_structural_refuted += 1;
                    continue;
                }
                Val3::X => (),
            }
        }
        cone.extend(net, &consts, imp.dst.node)?;
        stats.nb_solve += 1;
        let src_lit = node_lit(imp.src.node, imp.src.value);
        let dst_lit = node_lit(imp.dst.node, imp.dst.value);
        match cone.solve(&[src_lit, !dst_lit], opts.conflict_limit)? {
            SolverResult::Unsat => {
                stats.nb_unsat += 1;
                cone.add_clause(clause![!src_lit, dst_lit])?;
                stats.nb_facts += record(table, &consts, imp);
            }
            SolverResult::Sat => stats.nb_sat += 1,
            SolverResult::Interrupted => {
                debug!(%imp, "Solver interrupted");
                stats.nb_aborted += 1;
                stats.unresolved.push(imp);
            }
        }
        progress.set_postfix(format!(
            "unsat={} sat={} aborted={}",
            stats.nb_unsat, stats.nb_sat, stats.nb_aborted
        ));
    }
    info!(
        solve = stats.nb_solve,
        unsat = stats.nb_unsat,
        sat = stats.nb_sat,
        aborted = stats.nb_aborted,
        facts = stats.nb_facts,
        "Sat learning done"
    );
    Ok(stats)
}
