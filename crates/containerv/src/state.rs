//! The one piece of state that has to survive past a single CLI
//! invocation: which process is the host monitor for a given container id
//! (§3 "Container — a host-side monitor process id"). `containerv create`
//! writes this file once bring-up succeeds and owns the container for the
//! rest of its life; `containerv destroy`/`join` from a *different*
//! invocation read it back to find the monitor to talk to, since only the
//! monitor process can `waitpid` the child it forked.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Enough of a [`container::ContainerRecord`] to reattach to a running
/// container from a process that didn't fork it, plus the pid of the
/// `containerv create` invocation that did. Written once bring-up
/// finishes and removed by whichever process actually calls `destroy`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorState {
    pub id: String,
    pub monitor_pid: i32,
    pub child_pid: i32,
    pub runtime_dir: PathBuf,
    pub rootfs: PathBuf,
    pub hostname: String,
    pub cgroup_id: Option<u64>,
}

impl MonitorState {
    fn path(runtime_dir: &Path) -> PathBuf {
        runtime_dir.join("monitor.json")
    }

    pub fn save(&self) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(self).expect("MonitorState always serializes");
        std::fs::write(Self::path(&self.runtime_dir), json)
    }

    pub fn load(runtime_dir: &Path) -> io::Result<MonitorState> {
        let bytes = std::fs::read(Self::path(runtime_dir))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn remove(runtime_dir: &Path) {
        let _ = std::fs::remove_file(Self::path(runtime_dir));
    }

    /// Rebuilds a [`container::ContainerRecord`] good enough for
    /// `spawn`/`kill`/`join`. `child_pid` in the rebuilt record is not
    /// meaningful outside the monitor process that owns it — never call
    /// `destroy` on a manager adopted this way.
    pub fn to_record(&self) -> container::ContainerRecord {
        container::ContainerRecord {
            id: self.id.clone(),
            child_pid: nix::unistd::Pid::from_raw(self.child_pid),
            rootfs: self.rootfs.clone(),
            runtime_dir: self.runtime_dir.clone(),
            hostname: self.hostname.clone(),
            cgroup_id: self.cgroup_id,
            state: container::ContainerState::Running,
            processes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let state = MonitorState {
            id: "c-abc123".into(),
            monitor_pid: 4242,
            child_pid: 4243,
            runtime_dir: dir.path().to_path_buf(),
            rootfs: PathBuf::from("/tmp/rootfs"),
            hostname: "c-abc123".into(),
            cgroup_id: Some(7),
        };
        state.save().unwrap();

        let loaded = MonitorState::load(dir.path()).unwrap();
        assert_eq!(loaded.id, "c-abc123");
        assert_eq!(loaded.monitor_pid, 4242);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MonitorState::load(dir.path()).is_err());
    }
}
