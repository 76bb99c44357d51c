//! Error types
//!
//! Contradictions found during propagation are not errors: they are reported as `false`
//! by [`Engine::assign`](crate::Engine::assign) and recovered by backtracking.

use thiserror::Error;

/// Errors reported while building a network or running a learning strategy
#[derive(Debug, Error)]
pub enum ImpError {
    /// Malformed network description, detected before any learning starts
    #[error("invalid network at node {node}: {reason}")]
    Config {
        /// Offending node
        node: usize,
        /// What is wrong with it
        reason: String,
    },

    /// The SAT backend failed; this is neither a proof nor a refutation
    #[error("SAT solver failure: {0}")]
    Solver(String),

    /// Progress reporting failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ImpError {
    pub(crate) fn config(node: usize, reason: impl Into<String>) -> ImpError {
        ImpError::Config {
            node,
            reason: reason.into(),
        }
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ImpError>;
