//! Bookkeeping for which map entries belong to which container, so
//! `cleanup_policy` can remove exactly the rows `populate_policy` added and
//! nothing else.

use std::collections::HashMap;

/// One container's slice of the shared maps: the raw keys it holds in each
/// map, so they can be deleted again on teardown without re-deriving them
/// from the policy (which may have since changed on disk).
#[derive(Clone, Debug, Default)]
pub struct ContainerEntry {
    pub cgroup_id: u64,
    pub map_keys: HashMap<&'static str, Vec<Vec<u8>>>,
}

/// Tracks one [`ContainerEntry`] per container id, keyed by the short id the
/// rest of the runtime uses. A plain `HashMap` is enough here: the manager
/// owns the map for its whole lifetime and containers are looked up by id,
/// never by reference cycle.
#[derive(Debug, Default)]
pub struct Tracker {
    containers: HashMap<String, ContainerEntry>,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker {
            containers: HashMap::new(),
        }
    }

    pub fn insert(&mut self, container_id: impl Into<String>, entry: ContainerEntry) {
        self.containers.insert(container_id.into(), entry);
    }

    /// Returns the existing entry for `container_id`, or inserts a fresh
    /// one stamped with `cgroup_id` and returns that. Lets a caller grow an
    /// entry's `map_keys` incrementally across several calls instead of
    /// building the whole entry before it's visible to `remove`/`get`.
    pub fn entry_or_insert(&mut self, container_id: &str, cgroup_id: u64) -> &mut ContainerEntry {
        self.containers
            .entry(container_id.to_string())
            .or_insert_with(|| ContainerEntry {
                cgroup_id,
                map_keys: HashMap::new(),
            })
    }

    pub fn remove(&mut self, container_id: &str) -> Option<ContainerEntry> {
        self.containers.remove(container_id)
    }

    pub fn get(&self, container_id: &str) -> Option<&ContainerEntry> {
        self.containers.get(container_id)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_roundtrips() {
        let mut tracker = Tracker::new();
        tracker.insert(
            "abc123",
            ContainerEntry {
                cgroup_id: 42,
                map_keys: HashMap::new(),
            },
        );
        assert_eq!(tracker.len(), 1);
        let entry = tracker.remove("abc123").unwrap();
        assert_eq!(entry.cgroup_id, 42);
        assert!(tracker.is_empty());
    }

    #[test]
    fn remove_unknown_id_is_none() {
        let mut tracker = Tracker::new();
        assert!(tracker.remove("nope").is_none());
    }
}
