//! Tree command - Display the composite node tree
//!
//! Usage:
//!   nodegraph tree graph.toml                 # List every root
//!   nodegraph tree graph.toml --root camera   # List one subtree
//!   nodegraph tree graph.toml --format json   # Output as JSON

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use nodegraph::{Attribute, BuiltTree, Field, GraphConfig, NodeRef, Structure, Value};

use super::OutputFormat;
use crate::utils::terminal::{print_info, print_warning};

/// Display the node tree of a graph description
#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Graph description file (TOML)
    pub file: PathBuf,

    /// Only show the subtree under this node
    #[arg(long, short = 'r')]
    pub root: Option<String>,

    /// Output format: text, json
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Node for JSON output
#[derive(Serialize, Debug)]
struct NodeJson {
    name: String,
    family: &'static str,
    identity: u64,
    #[serde(skip_serializing_if = "Structure::is_empty")]
    attributes: Structure<Attribute>,
    #[serde(skip_serializing_if = "Structure::is_empty")]
    fields: Structure<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeJson>,
}

impl NodeJson {
    fn from_node(node: NodeRef<'_>) -> Self {
        Self {
            name: node.name().to_string(),
            family: node.family(),
            identity: node.identity().get(),
            attributes: node.attributes().map(|(k, a)| (k, a.clone())).collect(),
            fields: node
                .fields()
                .iter()
                .filter_map(|(k, f)| match f {
                    Field::Value(v) => Some((k, v.clone())),
                    Field::Attribute(_) => None,
                })
                .collect(),
            children: node.children().map(Self::from_node).collect(),
        }
    }
}

impl TreeCommand {
    /// Execute the tree command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let config = GraphConfig::load_from_path(&self.file)?;
        if config.nodes.is_empty() {
            print_warning(&format!("No [[nodes]] entries in {}", self.file.display()));
        }

        let BuiltTree { tree, ids } = config.build_tree()?;

        let roots: Vec<NodeRef<'_>> = match &self.root {
            Some(name) => match ids.get(name).and_then(|&id| tree.get(id)) {
                Some(node) => vec![node],
                None => bail!("Unknown node '{}'", name),
            },
            None => tree.roots().iter().filter_map(|&id| tree.get(id)).collect(),
        };

        if verbose {
            print_info(&format!("{} node(s), {} root(s)", tree.len(), tree.roots().len()));
        }

        match self.format {
            OutputFormat::Text => {
                for root in roots {
                    print!("{}", root.listing());
                }
            }
            OutputFormat::Json => {
                let json: Vec<NodeJson> = roots.into_iter().map(NodeJson::from_node).collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }

        Ok(())
    }
}
