//! Error types and helpers for user-friendly error messages
//!
//! Every failure in the kernel is local and synchronous. [`GraphError`] covers
//! the attribute container, nodes and the composite tree; [`CycleError`] is
//! returned by the dependency resolver when a cycle stops it from making
//! progress. Both carry an actionable hint for command-line display.

use std::fmt;

use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised by attribute containers, nodes and trees
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Attempt to set or delete a read-only field (`family`, `identity`, `children`)
    #[error("{family} | '{field}' attribute is read only")]
    ImmutableAttribute { family: String, field: String },

    /// `add_attribute` called with a name that is already taken
    #[error("Attribute '{name}' already exists")]
    DuplicateAttribute { name: String },

    /// Access or removal of a name that is not present
    #[error("Attribute '{name}' doesn't exist")]
    MissingAttribute { name: String },

    /// A value of the wrong kind was supplied or requested
    #[error("'{context}' expects {expected}, found {found}")]
    InvalidValueKind {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Structural operation given an index outside the valid range
    #[error("Index {index} is out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    /// The handle is stale or belongs to another tree
    #[error("Node {node} does not exist in this tree")]
    UnknownNode { node: NodeId },

    /// The child is still attached to a parent
    #[error("Node {child} already has a parent")]
    AlreadyParented { child: NodeId },

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child} under {ancestor} would create a cycle")]
    WouldCycle { child: NodeId, ancestor: NodeId },
}

impl GraphError {
    /// Create an immutable attribute error
    pub fn immutable(family: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ImmutableAttribute {
            family: family.into(),
            field: field.into(),
        }
    }

    /// Create a duplicate attribute error
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateAttribute { name: name.into() }
    }

    /// Create a missing attribute error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingAttribute { name: name.into() }
    }

    /// Create an invalid value kind error
    pub fn invalid_kind(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::InvalidValueKind {
            context: context.into(),
            expected,
            found,
        }
    }

    /// Actionable suggestion for this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            GraphError::ImmutableAttribute { .. } => Some(
                "'family' and 'identity' are fixed at construction; \
                 restructure children through the tree operations instead",
            ),
            GraphError::DuplicateAttribute { .. } => {
                Some("Remove the existing attribute first or pick another name")
            }
            GraphError::MissingAttribute { .. } => {
                Some("Check the name with has_attribute() or list_attribute_names()")
            }
            GraphError::IndexOutOfRange { .. } => {
                Some("Insertion accepts 0..=len, removal accepts 0..len")
            }
            GraphError::AlreadyParented { .. } => {
                Some("Detach the node with remove_child() or use set_parent() to move it")
            }
            GraphError::WouldCycle { .. } => Some("A node cannot be placed under its own descendant"),
            GraphError::InvalidValueKind { .. } | GraphError::UnknownNode { .. } => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        print_with_hint(self, self.hint(), &[]);
    }
}

/// The resolver reached a fixed point with keys still waiting on each other
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unresolvable dependency cycle between {} key(s)", unresolved.len())]
pub struct CycleError<K> {
    /// Keys that could not be scheduled, each with its remaining dependencies
    pub unresolved: Vec<(K, Vec<K>)>,

    /// Batches resolved before the cycle stopped progress
    pub batches: Vec<Vec<K>>,
}

impl<K: fmt::Display> CycleError<K> {
    /// Human-readable "key -> deps" lines for each unresolved key
    pub fn describe(&self) -> Vec<String> {
        self.unresolved
            .iter()
            .map(|(key, deps)| {
                let deps: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
                format!("{} -> {}", key, deps.join(", "))
            })
            .collect()
    }

    /// Display error with formatting, hint and the offending keys
    pub fn display_with_hints(&self) {
        print_with_hint(
            self,
            Some("Break the cycle by removing one of the dependencies listed below"),
            &self.describe(),
        );
    }
}

fn print_with_hint(error: &dyn fmt::Display, hint: Option<&str>, details: &[String]) {
    use console::style;

    eprintln!("\n{} {}", style("ERROR:").red().bold(), error);

    if let Some(h) = hint {
        eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
    }

    if !details.is_empty() {
        eprintln!("\n{}", style("UNRESOLVED:").cyan().bold());
        for detail in details {
            eprintln!("  • {}", detail);
        }
    }

    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = GraphError::immutable("Abstract", "identity");
        assert_eq!(err.to_string(), "Abstract | 'identity' attribute is read only");

        let err = GraphError::invalid_kind("name", "text", "integer");
        assert_eq!(err.to_string(), "'name' expects text, found integer");
        assert!(err.hint().is_none());

        let err = GraphError::IndexOutOfRange { index: 3, len: 2 };
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_cycle_describe() {
        let err = CycleError {
            unresolved: vec![("a", vec!["b"]), ("b", vec!["a"])],
            batches: vec![],
        };
        assert_eq!(err.describe(), vec!["a -> b", "b -> a"]);
        assert_eq!(err.to_string(), "Unresolvable dependency cycle between 2 key(s)");
    }
}
