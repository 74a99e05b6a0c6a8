//! Data model for single-file RCS archives.
//!
//! - [`quote`]: the `@`-quoting convention for string fields.
//! - [`graph`]: the validated revision graph (header, nodes, identifiers).
//! - [`builder`]: assembling a graph from declarative revision specs.
//!
//! Text encoding and decoding of whole files lives in `rcs-text`.

pub mod builder;
pub mod graph;
pub mod quote;

pub use builder::{GraphBuilder, RevisionSpec};
pub use graph::header::{AdminHeader, FileLayout, LineEnding, Lock, Symbol};
pub use graph::id::RevisionId;
pub use graph::node::RevisionNode;
pub use graph::{RevisionGraph, StructuralError};
pub use quote::EncodingError;
