//! Implication learning on And/Xor logic networks
//!
//! This crate finds implications between node values of a combinational network: facts of the
//! form "whenever node `a` is 1, node `b` is 0", as well as nodes that are constant.
//! Such facts are used to speed up test pattern generation, equivalence checking and logic
//! optimization.
//!
//! # Usage
//!
//! ```bash
//! # Show the structure of a generated network
//! implearn show --generator adder --size 8
//! # Learn implications on it, and check every learned fact with a SAT solver
//! implearn learn --generator adder --size 8 --check
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! [`Network`] is a directed acyclic graph of two-input And and Xor nodes, with primary inputs.
//! Inverters are implicit, occupying just one bit in [`Handle`]. Each node knows its fanouts,
//! which is what propagation needs to walk the network in both directions.
//!
//! For example, here is a half adder:
//! ```
//! # use implearn::Network;
//! let mut net = Network::new();
//! let a = net.add_input();
//! let b = net.add_input();
//! let carry = net.and(a, b);
//! let sum = net.xor(a, b);
//! assert_eq!(net.nb_nodes(), 4);
//! ```
//!
//! ## Algorithms
//!
//! The [`Engine`] holds a three-valued assignment of the network and propagates values through
//! it, with backtracking. The strategies in [`learn`] build on it, and record what they find in
//! an [`ImpTable`]:
//! * direct learning assigns each node in turn and records what propagation derives;
//! * fixpoint learning computes, for every node value, the set of values that imply it;
//! * SAT learning proposes candidates by random simulation, then proves them with a solver.
//!
//! ```
//! # use implearn::learn::{learn, LearningOptions};
//! # use implearn::network::generators::testcases;
//! let net = testcases::and2();
//! let learned = learn(&net, &LearningOptions::default()).unwrap();
//! // c = a & b: c = 1 implies a = 1
//! assert!(learned.table.check(2, true, 0, true));
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod learn;
pub mod network;
pub mod sim;
pub mod table;

pub use engine::{Engine, Recorder, State, Val3};
pub use error::{ImpError, Result};
pub use network::{stats, Edge, Handle, Network, Node, NodeSpec, NodeType};
pub use table::{ImpTable, Implication, NodeValue};
