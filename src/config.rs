//! Graph description files
//!
//! A description is a TOML document with an optional dependency map and an
//! optional list of tree nodes:
//!
//! ```toml
//! [dependencies]
//! app = ["net", "ui"]
//! net = ["core"]
//! ui = ["core"]
//!
//! [[nodes]]
//! name = "scene"
//!
//! [[nodes]]
//! name = "camera"
//! parent = "scene"
//! attributes = { fov = { value = 60, hint = "degrees" } }
//! fields = { enabled = true }
//! ```
//!
//! Siblings keep their declaration order. A `parent` may name a node declared
//! later in the file.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::node::{Attribute, Field, Node};
use crate::structure::{Structure, Value};
use crate::tree::{NodeId, Tree};

/// Root of a graph description file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Key → keys it depends on
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,

    /// Tree nodes in declaration order
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// One `[[nodes]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub name: String,

    /// Name of the parent node, if any
    pub parent: Option<String>,

    /// Attribute payloads (`{ value, hint }`)
    #[serde(default)]
    pub attributes: Structure<Attribute>,

    /// Plain, non-attribute fields
    #[serde(default)]
    pub fields: Structure<Value>,
}

/// A tree materialized from a description, with node ids by name
#[derive(Debug)]
pub struct BuiltTree {
    pub tree: Tree,
    pub ids: HashMap<String, NodeId>,
}

impl GraphConfig {
    /// Load a description from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph description from {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid graph description {}", path.display()))
    }

    /// Parse a description from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse graph description")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                bail!("Node names must not be empty");
            }
            if parents.insert(node.name.as_str(), node.parent.as_deref()).is_some() {
                bail!("Node '{}' is declared more than once", node.name);
            }
        }

        for node in &self.nodes {
            if let Some(parent) = node.parent.as_deref() {
                if !parents.contains_key(parent) {
                    bail!("Node '{}' has unknown parent '{}'", node.name, parent);
                }
            }

            // Walk up the declared parents; revisiting a name means a cycle
            let mut seen = HashSet::new();
            let mut current = Some(node.name.as_str());
            while let Some(name) = current {
                if !seen.insert(name) {
                    bail!("Node '{}' has a cyclic parent chain", node.name);
                }
                current = parents.get(name).copied().flatten();
            }
        }

        Ok(())
    }

    /// Materialize the `[[nodes]]` section into a composite tree
    ///
    /// The description is validated first, so configs assembled in code get the
    /// same checks as parsed ones.
    pub fn build_tree(&self) -> Result<BuiltTree> {
        self.validate()?;

        let mut tree = Tree::new();
        let mut ids = HashMap::new();
        let mut created = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let built = Node::with_fields(Some(node.name.as_str()), node.all_fields())
                .with_context(|| format!("Invalid node '{}'", node.name))?;
            let id = tree.insert(built);
            ids.insert(node.name.clone(), id);
            created.push(id);
        }

        for (node, &child) in self.nodes.iter().zip(&created) {
            if let Some(parent) = &node.parent {
                let parent_id = *ids
                    .get(parent)
                    .with_context(|| format!("Node '{}' has unknown parent '{}'", node.name, parent))?;
                tree.add_child(parent_id, child)
                    .with_context(|| format!("Failed to attach '{}' under '{}'", node.name, parent))?;
            }
        }

        tracing::debug!(nodes = tree.len(), roots = tree.roots().len(), "Built tree from description");
        Ok(BuiltTree { tree, ids })
    }
}

impl NodeConfig {
    /// Every configured entry as node fields, attributes first
    pub fn all_fields(&self) -> impl Iterator<Item = (&str, Field)> {
        self.attributes
            .iter()
            .map(|(k, a)| (k, Field::Attribute(a.clone())))
            .chain(self.fields.iter().map(|(k, v)| (k, Field::Value(v.clone()))))
    }
}
