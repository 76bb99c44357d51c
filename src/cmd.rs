//! Command line interface

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use implearn::learn::{learn, verify_table, LearningOptions};
use implearn::network::generators::{adder, carry_chain, random};
use implearn::network::stats::stats;
use implearn::{Network, Result};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a generated network
    ///
    /// Will print the number of inputs and gates, the logic depth and the largest fanout.
    #[clap()]
    Show(ShowArgs),

    /// Learn implications on a generated network
    ///
    /// Runs direct learning, fixpoint propagation and SAT-based learning in sequence,
    /// then prints what each of them found.
    #[clap()]
    Learn(LearnArgs),
}

/// Kind of network to generate
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Generator {
    /// Ripple-carry adder, with And and Xor gates
    Adder,
    /// Carry chain of a ripple-carry adder, And gates only
    Chain,
    /// Random And/Xor network
    Random,
}

/// Description of the network to generate
#[derive(Args)]
pub struct NetworkArgs {
    /// Network generator
    #[arg(short = 'g', long, value_enum, default_value_t = Generator::Adder)]
    generator: Generator,

    /// Number of bits for adders, number of gates for random networks
    #[arg(short = 's', long, default_value_t = 8)]
    size: usize,

    /// Seed for random networks
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl NetworkArgs {
    fn build(&self) -> Network {
        match self.generator {
            Generator::Adder => adder::ripple_carry(self.size),
            Generator::Chain => carry_chain::ripple_carry(self.size),
            Generator::Random => {
                let nb_inputs = (self.size / 8).max(2);
                random::random_network(nb_inputs, self.size, 16, 4, self.seed)
            }
        }
    }
}

/// Command arguments for network informations
#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    network: NetworkArgs,
}

impl ShowArgs {
    pub fn run(&self) -> Result<()> {
        let net = self.network.build();
        println!("Network stats:\n{}\n\n", stats(&net));
        Ok(())
    }
}

/// Command arguments for implication learning
#[derive(Args)]
pub struct LearnArgs {
    #[command(flatten)]
    network: NetworkArgs,

    /// Skip direct learning
    #[arg(long)]
    no_direct: bool,

    /// Skip the fixpoint propagation
    #[arg(long)]
    no_fixpoint: bool,

    /// Skip SAT-based learning
    #[arg(long)]
    no_sat: bool,

    /// Add contrapositives during the fixpoint propagation
    #[arg(long)]
    contra: bool,

    /// Conflict limit for each SAT call, 0 for no limit
    #[arg(long, default_value_t = 10_000)]
    conflict_limit: u32,

    /// Depth of structural justification before SAT calls, 0 to disable
    #[arg(long, default_value_t = 0)]
    justify_depth: usize,

    /// Prove every learned fact again with a SAT solver
    #[arg(long)]
    check: bool,

    /// Show progress bars
    #[arg(long)]
    progress: bool,
}

impl LearnArgs {
    fn options(&self) -> LearningOptions {
        let limit = (self.conflict_limit != 0).then_some(self.conflict_limit);
        LearningOptions::default()
            .with_direct(!self.no_direct)
            .with_fixpoint(!self.no_fixpoint)
            .with_sat(!self.no_sat)
            .with_contra(self.contra)
            .with_seed(self.network.seed)
            .with_conflict_limit(limit)
            .with_justify_depth(self.justify_depth)
            .with_progress(self.progress)
    }

    pub fn run(&self) -> Result<()> {
        let net = self.network.build();
        let opts = self.options();
        println!("Network stats:\n{}\n", stats(&net));
        let learned = learn(&net, &opts)?;
        println!("{}", learned.stats);
        println!("{}", learned.table);
        if self.check {
            let report = verify_table(&net, &learned.table, opts.conflict_limit)?;
            if report.is_ok() {
                println!("All {} facts verified", report.nb_checked);
            } else {
                for imp in &report.failed_facts {
                    println!("Unproved implication: {imp}");
                }
                for c in &report.failed_consts {
                    println!("Unproved constant: {c}");
                }
                std::process::exit(1);
            }
        }
        Ok(())
    }
}
