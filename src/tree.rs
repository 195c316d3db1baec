//! Composite nodes: an arena-owned tree of attributed nodes
//!
//! A [`Tree`] is the single owner of its nodes. Parents refer to their
//! children by [`NodeId`] and children keep a non-owning back-index to their
//! parent, so there is no ownership cycle. Every structural mutation updates
//! both sides of the parent/child relation in one step, and a node can only be
//! attached under one parent at a time.
//!
//! ```
//! use nodegraph::Tree;
//!
//! let mut tree: Tree = Tree::new();
//! let root = tree.create(Some("root"), None).unwrap();
//! let a = tree.create(Some("A"), Some(root)).unwrap();
//! tree.create(Some("A1"), Some(a)).unwrap();
//! tree.create(Some("B"), Some(root)).unwrap();
//!
//! let names: Vec<_> = tree
//!     .get(root)
//!     .unwrap()
//!     .list_subtree()
//!     .map(|(_, node)| node.name().to_string())
//!     .collect();
//! assert_eq!(names, ["root", "A", "A1", "B"]);
//! ```

use std::any::TypeId;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::GraphError;
use crate::node::{AbstractComposite, Node, NodeKind};
use crate::registry::{Handle, Residence};

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

/// Handle to a node slot in a specific [`Tree`]
///
/// Handles are cheap to copy. Once the node is pruned the handle goes stale
/// and every tree operation reports it as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tree: u32,
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.tree, self.index)
    }
}

struct Entry<K: NodeKind> {
    node: Node<K>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot<K: NodeKind> {
    generation: u32,
    entry: Option<Entry<K>>,
}

/// Arena of composite nodes
pub struct Tree<K: NodeKind = AbstractComposite> {
    id: u32,
    slots: Vec<Slot<K>>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    len: usize,
}

impl<K: NodeKind> Tree<K> {
    pub fn new() -> Self {
        Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            len: 0,
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nodes without a parent, in the order they became roots
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    fn entry(&self, id: NodeId) -> Result<&Entry<K>, GraphError> {
        if id.tree != self.id {
            return Err(GraphError::UnknownNode { node: id });
        }
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(GraphError::UnknownNode { node: id })
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry<K>, GraphError> {
        if id.tree != self.id {
            return Err(GraphError::UnknownNode { node: id });
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(GraphError::UnknownNode { node: id })
    }

    /// Read view of a node
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, K>> {
        let entry = self.entry(id).ok()?;
        Some(NodeRef {
            tree: self,
            id,
            entry,
        })
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.entry(id).ok().map(|e| &e.node)
    }

    /// Mutable access to a node's name and attributes
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<K>> {
        self.entry_mut(id).ok().map(|e| &mut e.node)
    }

    /// Map a registry handle back to a node of this tree
    pub fn resolve(&self, handle: &Handle) -> Option<NodeId> {
        match handle.residence {
            Residence::Tree(id) if handle.kind == TypeId::of::<K>() && self.contains(id) => Some(id),
            _ => None,
        }
    }

    /// Take ownership of a node; it becomes a root
    pub fn insert(&mut self, node: Node<K>) -> NodeId {
        let entry = Entry {
            node,
            parent: None,
            children: Vec::new(),
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId {
                    tree: self.id,
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId {
                    tree: self.id,
                    index,
                    generation: 0,
                }
            }
        };

        if let Ok(entry) = self.entry(id) {
            entry.node.relocate(Residence::Tree(id));
        }
        self.roots.push(id);
        self.len += 1;
        id
    }

    /// Create a node, optionally appending it to `parent`'s children
    pub fn create(&mut self, name: Option<&str>, parent: Option<NodeId>) -> Result<NodeId, GraphError> {
        if let Some(parent) = parent {
            self.entry(parent)?;
        }

        let node = match name {
            Some(name) => Node::named(name),
            None => Node::new(),
        };
        let id = self.insert(node);

        if let Some(parent) = parent {
            self.attach(parent, id, None)?;
        }
        Ok(id)
    }

    fn is_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entry(id).ok().and_then(|e| e.parent);
        }
        false
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.entry(parent)?;
        if self.entry(child)?.parent.is_some() {
            return Err(GraphError::AlreadyParented { child });
        }
        if self.is_ancestor(child, parent) {
            return Err(GraphError::WouldCycle {
                child,
                ancestor: parent,
            });
        }
        Ok(())
    }

    /// Link a root `child` under `parent`, appending when `index` is `None`
    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> Result<(), GraphError> {
        self.check_attachable(parent, child)?;

        let children = &mut self.entry_mut(parent)?.children;
        let len = children.len();
        match index {
            Some(index) if index > len => return Err(GraphError::IndexOutOfRange { index, len }),
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }

        self.entry_mut(child)?.parent = Some(parent);
        self.roots.retain(|&r| r != child);

        tracing::debug!(%parent, %child, "Attached node");
        Ok(())
    }

    /// Unlink `child` from its parent; it becomes a root
    fn detach(&mut self, child: NodeId) -> Result<(), GraphError> {
        let Some(parent) = self.entry(child)?.parent else {
            return Ok(());
        };

        self.entry_mut(parent)?.children.retain(|&c| c != child);
        self.entry_mut(child)?.parent = None;
        self.roots.push(child);

        tracing::debug!(%parent, %child, "Detached node");
        Ok(())
    }

    /// Move `child` under `parent` (appended last), or make it a root with `None`
    ///
    /// The old parent's children, the new parent's children and the child's
    /// back-reference are updated together. Nothing changes on error.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), GraphError> {
        let current = self.entry(child)?.parent;

        let Some(parent) = parent else {
            return self.detach(child);
        };
        self.entry(parent)?;
        if current == Some(parent) {
            return Ok(());
        }
        if self.is_ancestor(child, parent) {
            return Err(GraphError::WouldCycle {
                child,
                ancestor: parent,
            });
        }

        self.detach(child)?;
        self.attach(parent, child, None)
    }

    /// Append a parentless `child` to `parent`'s children
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.attach(parent, child, None)
    }

    /// Insert a parentless `child` at `index` (0..=child_count)
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<(), GraphError> {
        let len = self.entry(parent)?.children.len();
        if index > len {
            return Err(GraphError::IndexOutOfRange { index, len });
        }
        self.attach(parent, child, Some(index))
    }

    /// Detach the child at `index` (0..child_count) and return it
    ///
    /// The detached node stays alive in the tree as a root.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId, GraphError> {
        let children = &self.entry(parent)?.children;
        let child = *children.get(index).ok_or(GraphError::IndexOutOfRange {
            index,
            len: children.len(),
        })?;

        self.detach(child)?;
        Ok(child)
    }

    /// Destroy `id` and its whole subtree, returning how many nodes were dropped
    ///
    /// The registry entries of the dropped nodes disappear with them.
    pub fn prune(&mut self, id: NodeId) -> Result<usize, GraphError> {
        self.detach(id)?;
        self.roots.retain(|&r| r != id);

        let mut stack = vec![id];
        let mut removed = 0;
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                stack.extend(entry.children);
                removed += 1;
            }
        }

        self.len -= removed;
        tracing::debug!(node = %id, removed, "Pruned subtree");
        Ok(removed)
    }
}

impl<K: NodeKind> Default for Tree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKind> fmt::Debug for Tree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("id", &self.id)
            .field("len", &self.len)
            .field("roots", &self.roots)
            .finish()
    }
}

/// Borrowed view of a node and its position in the tree
pub struct NodeRef<'a, K: NodeKind = AbstractComposite> {
    tree: &'a Tree<K>,
    id: NodeId,
    entry: &'a Entry<K>,
}

impl<K: NodeKind> Clone for NodeRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: NodeKind> Copy for NodeRef<'_, K> {}

impl<'a, K: NodeKind> NodeRef<'a, K> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node<K> {
        &self.entry.node
    }

    pub fn parent(&self) -> Option<NodeRef<'a, K>> {
        self.entry.parent.and_then(|p| self.tree.get(p))
    }

    pub fn child_ids(&self) -> &'a [NodeId] {
        &self.entry.children
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a, K>> + 'a {
        let tree = self.tree;
        self.entry.children.iter().filter_map(move |&c| tree.get(c))
    }

    pub fn child_at(&self, index: usize) -> Option<NodeRef<'a, K>> {
        self.entry.children.get(index).and_then(|&c| self.tree.get(c))
    }

    /// Position of `child` among this node's children
    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        self.entry.children.iter().position(|&c| c == child)
    }

    /// Position of this node among its parent's children
    pub fn row(&self) -> Option<usize> {
        self.parent()?.index_of(self.id)
    }

    pub fn child_count(&self) -> usize {
        self.entry.children.len()
    }

    /// Number of ancestors (0 for a root)
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), |p| p.parent()).count()
    }

    /// Depth-first, pre-order walk of this node and its descendants
    ///
    /// Yields `(depth, node)` with depth relative to this node. Each call
    /// starts a fresh walk over the current structure.
    pub fn list_subtree(&self) -> Subtree<'a, K> {
        Subtree {
            tree: self.tree,
            stack: vec![(0, self.id)],
        }
    }

    /// Indented text listing of the subtree, one tab per level
    pub fn listing(&self) -> String {
        self.list_subtree()
            .map(|(depth, node)| format!("{}|----'{}'\n", "\t".repeat(depth), node.name()))
            .collect()
    }
}

impl<K: NodeKind> Deref for NodeRef<'_, K> {
    type Target = Node<K>;

    fn deref(&self) -> &Self::Target {
        &self.entry.node
    }
}

impl<K: NodeKind> fmt::Debug for NodeRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("node", &self.entry.node)
            .field("parent", &self.entry.parent)
            .field("children", &self.entry.children)
            .finish()
    }
}

/// Lazy pre-order iterator returned by [`NodeRef::list_subtree`]
pub struct Subtree<'a, K: NodeKind = AbstractComposite> {
    tree: &'a Tree<K>,
    stack: Vec<(usize, NodeId)>,
}

impl<'a, K: NodeKind> Iterator for Subtree<'a, K> {
    type Item = (usize, NodeRef<'a, K>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, id) = self.stack.pop()?;
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            self.stack
                .extend(node.child_ids().iter().rev().map(|&c| (depth + 1, c)));
            return Some((depth, node));
        }
    }
}
