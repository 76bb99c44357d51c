//! Implication learning strategies
//!
//! Each strategy reads the network and the current [`ImpTable`], and adds the facts it finds.
//! They can be run alone or chained by [`learn`], in the order direct, fixpoint, SAT.
//!
//! ```
//! # use implearn::learn::{learn, LearningOptions};
//! # use implearn::network::generators::testcases;
//! let net = testcases::reconvergent();
//! let learned = learn(&net, &LearningOptions::default()).unwrap();
//! // n7 = a & (b | c) and n5 = !((a & b) | (a & c)) are complements
//! assert!(learned.table.check(7, true, 5, false));
//! assert!(learned.table.check(7, false, 5, true));
//! ```

mod cnf;
mod direct;
mod fixpoint;
mod sat;
mod verify;

use std::fmt;

use tracing::info;

use crate::error::Result;
use crate::{ImpTable, Network};

pub use direct::{learn_direct, DirectStats};
pub use fixpoint::{learn_fixpoint, FixpointStats};
pub use sat::{learn_sat, SatStats};
pub use verify::{verify_table, VerifyReport};

/// Options controlling which strategies run and how
#[derive(Debug, Clone)]
pub struct LearningOptions {
    /// Run direct learning, by trial assignment of every node
    pub direct: bool,
    /// Run the global fixpoint propagation
    pub fixpoint: bool,
    /// Run the simulation-guided SAT verification
    pub sat: bool,
    /// Start the fixpoint from the facts already in the table, instead of empty sets
    pub fixpoint_from_table: bool,
    /// Add contrapositives during the fixpoint and iterate again until stable
    pub use_contra: bool,
    /// Seed for random simulation
    pub seed: u64,
    /// Stop simulating after this many consecutive rounds with few eliminations
    pub sim_stable_rounds: usize,
    /// A simulation round eliminating fewer candidates than this counts as stable
    pub sim_min_eliminations: usize,
    /// Hard limit on the number of simulation rounds
    pub sim_max_rounds: usize,
    /// Conflict limit for each SAT call; a call reaching it leaves the candidate unresolved
    pub conflict_limit: Option<u32>,
    /// Depth of the structural justification tried before each SAT call; 0 to disable
    pub justify_depth: usize,
    /// Show progress bars
    pub progress: bool,
}

impl Default for LearningOptions {
    fn default() -> Self {
        LearningOptions {
            direct: true,
            fixpoint: true,
            sat: true,
            fixpoint_from_table: true,
            use_contra: false,
            seed: 1,
            sim_stable_rounds: 10,
            sim_min_eliminations: 10,
            sim_max_rounds: 1000,
            conflict_limit: Some(10_000),
            justify_depth: 0,
            progress: false,
        }
    }
}

impl LearningOptions {
    /// Enable or disable direct learning
    pub fn with_direct(mut self, enable: bool) -> Self {
        self.direct = enable;
        self
    }

    /// Enable or disable the fixpoint propagation
    pub fn with_fixpoint(mut self, enable: bool) -> Self {
        self.fixpoint = enable;
        self
    }

    /// Enable or disable SAT verification
    pub fn with_sat(mut self, enable: bool) -> Self {
        self.sat = enable;
        self
    }

    /// Enable or disable contrapositives during the fixpoint
    pub fn with_contra(mut self, enable: bool) -> Self {
        self.use_contra = enable;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the conflict limit of SAT calls
    pub fn with_conflict_limit(mut self, limit: Option<u32>) -> Self {
        self.conflict_limit = limit;
        self
    }

    /// Set the structural justification depth
    pub fn with_justify_depth(mut self, depth: usize) -> Self {
        self.justify_depth = depth;
        self
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, enable: bool) -> Self {
        self.progress = enable;
        self
    }
}

/// Statistics of the strategies that ran
#[derive(Debug, Clone, Default)]
pub struct LearnStats {
    /// Direct learning
    pub direct: Option<DirectStats>,
    /// Fixpoint propagation
    pub fixpoint: Option<FixpointStats>,
    /// SAT verification
    pub sat: Option<SatStats>,
}

impl fmt::Display for LearnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = &self.direct {
            write!(f, "{s}")?;
        }
        if let Some(s) = &self.fixpoint {
            write!(f, "{s}")?;
        }
        if let Some(s) = &self.sat {
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

/// Result of [`learn`]
#[derive(Debug, Clone)]
pub struct Learned {
    /// Implications and constants found
    pub table: ImpTable,
    /// What each strategy did
    pub stats: LearnStats,
}

/// Run the enabled strategies in sequence on a fresh table
pub fn learn(net: &Network, opts: &LearningOptions) -> Result<Learned> {
    let mut table = ImpTable::new(net.nb_nodes());
    let stats = learn_into(net, &mut table, opts)?;
    Ok(Learned { table, stats })
}

/// Run the enabled strategies in sequence, adding to an existing table
pub fn learn_into(net: &Network, table: &mut ImpTable, opts: &LearningOptions) -> Result<LearnStats> {
    let mut stats = LearnStats::default();
    if opts.direct {
        stats.direct = Some(learn_direct(net, table, opts)?);
    }
    if opts.fixpoint {
        stats.fixpoint = Some(learn_fixpoint(net, table, opts));
    }
    if opts.sat {
        stats.sat = Some(learn_sat(net, table, opts)?);
    }
    info!(
        facts = table.nb_facts(),
        consts = table.nb_consts(),
        "Learning done"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::{learn, LearningOptions};
    use crate::network::generators::{adder, testcases};

    #[test]
    fn test_pipeline_constants() {
        let net = testcases::constants();
        let learned = learn(&net, &LearningOptions::default()).unwrap();
        assert_eq!(learned.table.const_value(2), Some(false));
        assert_eq!(learned.table.const_value(5), Some(false));
        assert_eq!(learned.table.const_value(6), Some(false));
        assert_eq!(learned.table.const_value(3), None);
        assert!(learned.stats.direct.is_some());
        assert!(learned.stats.sat.is_some());
    }

    #[test]
    fn test_strategies_compose() {
        let net = adder::ripple_carry(3);
        let direct_only = LearningOptions::default()
            .with_fixpoint(false)
            .with_sat(false);
        let all = LearningOptions::default();
        let a = learn(&net, &direct_only).unwrap();
        let b = learn(&net, &all).unwrap();
        assert!(b.stats.fixpoint.is_some());
        for imp in a.table.facts() {
            assert!(b
                .table
                .check(imp.src.node, imp.src.value, imp.dst.node, imp.dst.value));
        }
        assert!(b.table.nb_facts() >= a.table.nb_facts());
        let text = format!("{}", b.stats);
        assert!(text.contains("Direct"));
        assert!(text.contains("Sat"));
    }
}
