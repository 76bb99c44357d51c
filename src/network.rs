//! Representation and handling of And/Xor networks

pub mod generators;
mod handle;
mod network;
mod node;
pub mod stats;

pub use handle::Handle;
pub use network::{Network, NodeSpec};
pub use node::{Edge, Node, NodeType};
