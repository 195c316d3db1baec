//! Topological batch resolution
//!
//! Turns a key → dependencies map into an ordered list of batches. Every key in
//! a batch depends only on keys from earlier batches, so the keys of one batch
//! can be processed in parallel. Keys that are only ever mentioned as a
//! dependency are implicit leaves and land in the first batch.
//!
//! ```
//! use std::collections::{HashMap, HashSet};
//! use nodegraph::resolver::{resolve_batches, sorted};
//!
//! let deps = HashMap::from([
//!     ("a", HashSet::from(["b", "c"])),
//!     ("b", HashSet::from(["c"])),
//!     ("c", HashSet::new()),
//! ]);
//!
//! let batches = resolve_batches(deps).unwrap();
//! assert_eq!(sorted(batches), vec![vec!["c"], vec!["b"], vec!["a"]]);
//! ```

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::CycleError;

/// Resolve `dependencies` into ready batches
///
/// Repeated keys have their dependency sets merged. Each round emits every
/// key whose dependencies are all resolved, then strips those keys from the
/// remaining sets. A round that finds nothing ready means the remaining keys
/// are on a cycle or wait on one; resolution stops with a [`CycleError`]
/// instead of looping. At most one round per key is needed, so the function
/// always terminates.
pub fn resolve_batches<K, I, D>(dependencies: I) -> Result<Vec<HashSet<K>>, CycleError<K>>
where
    K: Clone + Eq + Hash,
    I: IntoIterator<Item = (K, D)>,
    D: IntoIterator<Item = K>,
{
    let mut pending: HashMap<K, HashSet<K>> = HashMap::new();
    for (key, deps) in dependencies {
        pending.entry(key).or_default().extend(deps);
    }

    let implicit: Vec<K> = pending
        .values()
        .flatten()
        .filter(|dep| !pending.contains_key(*dep))
        .cloned()
        .collect();
    for key in implicit {
        pending.entry(key).or_default();
    }

    let mut batches: Vec<HashSet<K>> = Vec::new();
    while !pending.is_empty() {
        let ready: HashSet<K> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(key, _)| key.clone())
            .collect();

        if ready.is_empty() {
            tracing::warn!(
                unresolved = pending.len(),
                resolved_batches = batches.len(),
                "Dependency cycle detected"
            );
            return Err(CycleError {
                unresolved: pending
                    .into_iter()
                    .map(|(key, deps)| (key, deps.into_iter().collect()))
                    .collect(),
                batches: batches
                    .into_iter()
                    .map(|batch| batch.into_iter().collect())
                    .collect(),
            });
        }

        pending.retain(|key, _| !ready.contains(key));
        for deps in pending.values_mut() {
            deps.retain(|dep| !ready.contains(dep));
        }

        tracing::debug!(batch = batches.len(), size = ready.len(), "Resolved batch");
        batches.push(ready);
    }

    Ok(batches)
}

/// Batches with their keys sorted, for stable display
pub fn sorted<K: Ord>(batches: Vec<HashSet<K>>) -> Vec<Vec<K>> {
    batches
        .into_iter()
        .map(|batch| {
            let mut keys: Vec<K> = batch.into_iter().collect();
            keys.sort();
            keys
        })
        .collect()
}

/// A single valid processing order: batches in order, keys sorted within each
pub fn flatten<K: Ord>(batches: Vec<HashSet<K>>) -> Vec<K> {
    sorted(batches).into_iter().flatten().collect()
}
