//! Bridges between directory trees on disk and outline documents.
//!
//! [`TreeLoader`] reads a directory into a [`Document`](crate::document::Document);
//! [`materialize`] writes a document that carries file text back out.

mod materialize;
mod tree_loader;

pub use materialize::{MaterializeError, materialize};
pub use tree_loader::{LoadError, TreeLoader};
