//! Process-wide identity registry
//!
//! Every node receives an [`Identity`] from the table of its kind when it is
//! constructed. The registry never owns a node: it records where the node
//! lives ([`Residence`]) and hands out [`Handle`]s that the owner can resolve.
//! When the node is dropped its [`Registration`] guard removes the entry, so a
//! lookup for a destroyed node reports absent instead of dangling.
//!
//! Tables are keyed by the concrete kind's [`TypeId`], so two kinds that share a
//! family tag still get separate counters.
//!
//! Identities start at 1, increase monotonically per kind and are never reused.
//! The counter increment and the table insertion happen under one lock, which
//! makes concurrent construction of nodes of the same kind safe.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::tree::NodeId;

/// Unique per-kind node identity (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(u64);

impl Identity {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a live node is owned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residence {
    /// Owned directly by the caller
    Detached,
    /// Owned by a [`Tree`](crate::Tree) arena at this slot
    Tree(NodeId),
}

/// Non-owning reference to a live node, as returned by [`Registry::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub kind: TypeId,
    pub family: &'static str,
    pub identity: Identity,
    pub residence: Residence,
}

#[derive(Debug)]
struct KindTable {
    family: &'static str,
    last_issued: u64,
    live: BTreeMap<u64, Residence>,
}

/// Per-kind identity counters and live-node tables
#[derive(Debug)]
pub struct Registry {
    kinds: Mutex<BTreeMap<TypeId, KindTable>>,
}

static GLOBAL: Registry = Registry::new();

impl Registry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            kinds: Mutex::new(BTreeMap::new()),
        }
    }

    /// The registry used by every built-in node kind
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    fn tables(&self) -> MutexGuard<'_, BTreeMap<TypeId, KindTable>> {
        // A panic while holding the lock cannot leave a table half-updated.
        self.kinds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue the next identity for the kind `kind` and record it as live
    pub fn register(&'static self, kind: TypeId, family: &'static str) -> Registration {
        let mut tables = self.tables();
        let table = tables.entry(kind).or_insert_with(|| KindTable {
            family,
            last_issued: 0,
            live: BTreeMap::new(),
        });
        table.last_issued += 1;
        let identity = Identity(table.last_issued);
        table.live.insert(identity.0, Residence::Detached);

        Registration {
            registry: self,
            kind,
            family,
            identity,
        }
    }

    /// Find a live node of kind `kind` by identity
    ///
    /// Returns `None` for identities below 1, above the highest issued one, or
    /// whose node has been destroyed.
    pub fn lookup(&self, kind: TypeId, identity: i64) -> Option<Handle> {
        let tables = self.tables();
        let table = tables.get(&kind)?;
        if identity < 1 || identity as u64 > table.last_issued {
            return None;
        }
        let residence = *table.live.get(&(identity as u64))?;

        Some(Handle {
            kind,
            family: table.family,
            identity: Identity(identity as u64),
            residence,
        })
    }

    /// Highest identity issued so far for `kind` (0 if none)
    pub fn highest_issued(&self, kind: TypeId) -> u64 {
        self.tables().get(&kind).map_or(0, |t| t.last_issued)
    }

    /// Number of live nodes of `kind`
    pub fn live_count(&self, kind: TypeId) -> usize {
        self.tables().get(&kind).map_or(0, |t| t.live.len())
    }

    fn relocate(&self, kind: TypeId, identity: Identity, residence: Residence) {
        if let Some(slot) = self
            .tables()
            .get_mut(&kind)
            .and_then(|t| t.live.get_mut(&identity.0))
        {
            *slot = residence;
        }
    }

    fn release(&self, kind: TypeId, family: &str, identity: Identity) {
        if let Some(table) = self.tables().get_mut(&kind) {
            table.live.remove(&identity.0);
        }
        tracing::debug!(family, %identity, "Released node identity");
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Liveness guard held by a node; dropping it removes the registry entry
#[derive(Debug)]
pub struct Registration {
    registry: &'static Registry,
    kind: TypeId,
    family: &'static str,
    identity: Identity,
}

impl Registration {
    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub(crate) fn relocate(&self, residence: Residence) {
        self.registry.relocate(self.kind, self.identity, residence);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.release(self.kind, self.family, self.identity);
    }
}
