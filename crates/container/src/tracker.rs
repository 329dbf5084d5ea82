//! The container tracker arena (§3 "Container tracker", Design Note 2,
//! §9): a `HashMap` keyed by short container id rather than parent/child
//! `Rc`/`Weak` cycles. Process records inside a [`ContainerRecord`] hold
//! only the owning container id, never a back-reference.

use crate::state::ContainerState;
use nix::unistd::Pid;
use std::collections::HashMap;
use std::path::PathBuf;

/// One tracked spawned process inside a container.
#[derive(Clone, Debug)]
pub struct ProcessRecord {
    pub container_id: String,
    pub pid: Pid,
}

/// The host's record of one container: identity, lifecycle state, and the
/// resources `destroy` must unwind.
#[derive(Clone, Debug)]
pub struct ContainerRecord {
    pub id: String,
    pub child_pid: Pid,
    pub rootfs: PathBuf,
    pub runtime_dir: PathBuf,
    pub hostname: String,
    pub cgroup_id: Option<u64>,
    pub state: ContainerState,
    pub processes: Vec<ProcessRecord>,
}

impl ContainerRecord {
    pub fn control_socket_path(&self) -> PathBuf {
        self.runtime_dir.join("control")
    }
}

/// The host's tracker arena: one [`ContainerRecord`] per live container,
/// addressed by short id. Mutated only from the host's main thread
/// (§5 "Shared-resource policy").
#[derive(Debug, Default)]
pub struct Tracker {
    containers: HashMap<String, ContainerRecord>,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker {
            containers: HashMap::new(),
        }
    }

    pub fn insert(&mut self, record: ContainerRecord) {
        self.containers.insert(record.id.clone(), record);
    }

    pub fn remove(&mut self, id: &str) -> Option<ContainerRecord> {
        self.containers.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&ContainerRecord> {
        self.containers.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ContainerRecord> {
        self.containers.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> ContainerRecord {
        ContainerRecord {
            id: id.to_string(),
            child_pid: Pid::from_raw(1234),
            rootfs: PathBuf::from("/tmp/rootfs"),
            runtime_dir: PathBuf::from("/run/containerv").join(id),
            hostname: id.to_string(),
            cgroup_id: None,
            state: ContainerState::Created,
            processes: Vec::new(),
        }
    }

    #[test]
    fn insert_then_lookup() {
        let mut tracker = Tracker::new();
        tracker.insert(sample("c-abc123"));
        assert!(tracker.contains("c-abc123"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn remove_returns_the_record() {
        let mut tracker = Tracker::new();
        tracker.insert(sample("c-abc123"));
        let record = tracker.remove("c-abc123").unwrap();
        assert_eq!(record.id, "c-abc123");
        assert!(tracker.is_empty());
    }

    #[test]
    fn control_socket_path_is_under_runtime_dir() {
        let record = sample("c-xyz789");
        assert_eq!(
            record.control_socket_path(),
            PathBuf::from("/run/containerv/c-xyz789/control")
        );
    }
}
