//! Outline document model.
//!
//! A [`Document`] is a tree of [`Node`]s rooted at a base directory. Nodes
//! that already exist on disk remember where they live; nodes the user added
//! while editing do not.

mod document;
mod node;
mod outline;

pub use document::{Document, DocumentError};
pub use node::{IdGenerator, Node, NodeId, NodeKind};
pub use outline::OutlineError;
