//! nodegraph - composable attributed node trees and topological batching
//!
//! The crate provides the building blocks for tree- and graph-shaped data:
//!
//! - [`Structure`]: an insertion-ordered name → value container
//! - [`Node`]: a node with a family tag, a per-kind unique [`Identity`], a
//!   name and named attributes
//! - [`Registry`]: the process-wide identity table with non-owning lookup
//! - [`Tree`]: an arena of composite nodes with parent/child structure
//! - [`resolver::resolve_batches`]: groups a dependency map into batches that
//!   can be processed in order, each batch in parallel
//!
//! ## Architecture
//!
//! ```text
//! Structure ─► Node ─► Tree (arena, NodeId handles)
//!                │
//!                └──► Registry (identity → Handle, released on drop)
//!
//! resolver (pure function over key → dependency sets)
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod registry;
pub mod resolver;
pub mod structure;
pub mod tree;

pub use config::{BuiltTree, GraphConfig, NodeConfig};
pub use error::{CycleError, GraphError};
pub use node::{Abstract, AbstractComposite, Attribute, Field, Node, NodeKind};
pub use registry::{Handle, Identity, Registry, Residence};
pub use resolver::resolve_batches;
pub use structure::{FromValue, Structure, Value};
pub use tree::{NodeId, NodeRef, Subtree, Tree};
