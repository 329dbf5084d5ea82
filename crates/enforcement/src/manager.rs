//! `PolicyMapManager` (component G): owns the loaded BPF skeletons and the
//! deny-event collector thread, and is the only part of the runtime that
//! touches BPF syscalls directly. Degrades to [`ManagerState::Uninitialized`]
//! when the host has no BPF LSM rather than failing container startup
//! outright — policy enforcement becomes a no-op and every container runs
//! unconfined, which `initialize` logs at `warn`.

use crate::abi;
use crate::deny;
use crate::error::{EnforcementError, Result};
use crate::pin;
use crate::skel::{self, Loaded};
use crate::tracker::Tracker;
use libbpf_rs::MapFlags;
use log::warn;
use policy::compiler::CompiledPolicy;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Whether the manager has a working BPF LSM enforcement plane or is
/// running in the degraded, unconfined mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Available,
    Uninitialized,
}

/// Utilization snapshot for one pinned map, for `get_metrics`.
#[derive(Clone, Copy, Debug)]
pub struct MapMetrics {
    pub name: &'static str,
    pub entries: u32,
    pub max_entries: u32,
}

struct Handles {
    loaded: Loaded,
    deny_thread: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
}

/// Owns the loaded skeletons, the in-memory container tracker, and the
/// deny-event collector thread. `handles` is `None` in
/// [`ManagerState::Uninitialized`].
pub struct PolicyMapManager {
    state: ManagerState,
    handles: Option<Handles>,
    tracker: Mutex<Tracker>,
}

impl PolicyMapManager {
    /// Checks BPF LSM availability, pins the six policy maps under
    /// `pin_dir`, attaches every LSM program and starts the deny-event
    /// collector. On any failure, logs a warning and returns a manager in
    /// [`ManagerState::Uninitialized`] rather than propagating the error.
    pub fn initialize(pin_dir: &Path) -> Self {
        match Self::try_initialize(pin_dir) {
            Ok(manager) => manager,
            Err(e) => {
                warn!("policy enforcement unavailable, containers will run unconfined: {}", e);
                PolicyMapManager {
                    state: ManagerState::Uninitialized,
                    handles: None,
                    tracker: Mutex::new(Tracker::new()),
                }
            }
        }
    }

    fn try_initialize(pin_dir: &Path) -> Result<Self> {
        pin::check_lsm_available()?;
        pin::ensure_pin_dir(pin_dir)?;

        // Drop any stale pin whose ABI no longer matches before the
        // skeleton creates fresh maps; reuse_or_recreate's own freshly
        // opened handle is discarded, its only job here is the unlink.
        for map_abi in abi::expected() {
            let _ = pin::reuse_or_recreate(pin_dir, &map_abi)?;
        }

        let loaded = skel::load_and_attach()?;

        for map_abi in abi::expected() {
            let map = skel::map_by_name(&loaded, map_abi.name);
            pin::pin_map(pin_dir, map, map_abi.name)?;
            let is_net_map = [abi::NET_CREATE, abi::NET_TUPLE, abi::NET_UNIX].contains(&map_abi.name);
            if is_net_map {
                pin::probe_writable(map, &map_abi)?;
            }
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let deny_thread = deny::spawn(loaded.fs_ringbuf_fd, loaded.net_ringbuf_fd, shutdown.clone())?;

        Ok(PolicyMapManager {
            state: ManagerState::Available,
            handles: Some(Handles {
                loaded,
                deny_thread,
                shutdown,
            }),
            tracker: Mutex::new(Tracker::new()),
        })
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Installs `compiled`'s entries into the pinned maps, recording each
    /// key under `container_id` as it is written rather than only after
    /// the whole loop succeeds. A `map.update` failure partway through
    /// (one map hits capacity, say) then still leaves every already-written
    /// key recorded under a live tracker entry for `cleanup_policy` to
    /// reclaim. A no-op returning `Ok(())` when uninitialized.
    pub fn populate_policy(&self, container_id: &str, compiled: &CompiledPolicy) -> Result<()> {
        let handles = match &self.handles {
            Some(h) => h,
            None => return Ok(()),
        };

        for entry in &compiled.entries {
            let map = skel::map_by_name(&handles.loaded, entry.map_name());
            check_capacity(map, entry.map_name())?;
            map.update(&entry.key_bytes(), &entry.value_bytes(), MapFlags::ANY)
                .map_err(|e| EnforcementError::MapUpdate(entry.map_name(), e))?;

            self.tracker
                .lock()
                .expect("tracker mutex poisoned")
                .entry_or_insert(container_id, compiled.cgroup_id)
                .map_keys
                .entry(entry.map_name())
                .or_default()
                .push(entry.key_bytes());
        }

        Ok(())
    }

    /// Removes every map row this container's `populate_policy` call
    /// installed. A no-op when uninitialized or when the container was
    /// never tracked (already cleaned up, or never had a policy).
    pub fn cleanup_policy(&self, container_id: &str) -> Result<()> {
        let handles = match &self.handles {
            Some(h) => h,
            None => return Ok(()),
        };

        let entry = self.tracker.lock().expect("tracker mutex poisoned").remove(container_id);
        let entry = match entry {
            Some(e) => e,
            None => return Ok(()),
        };

        for (map_name, keys) in entry.map_keys {
            let map = skel::map_by_name(&handles.loaded, map_name);
            for key in keys {
                if let Err(e) = map.delete(&key) {
                    warn!("failed to delete stale policy row from {}: {}", map_name, e);
                }
            }
        }
        Ok(())
    }

    /// Per-map entry counts for observability. Empty when uninitialized.
    pub fn get_metrics(&self) -> Vec<MapMetrics> {
        let handles = match &self.handles {
            Some(h) => h,
            None => return Vec::new(),
        };

        abi::expected()
            .into_iter()
            .map(|map_abi| {
                let map = skel::map_by_name(&handles.loaded, map_abi.name);
                MapMetrics {
                    name: map_abi.name,
                    entries: count_entries(map),
                    max_entries: map_abi.max_entries,
                }
            })
            .collect()
    }

    /// Signals the deny-event thread to stop and joins it, then drops the
    /// loaded skeletons, detaching every LSM program and unpinning nothing
    /// (pins outlive the process by design, so a restarted daemon can reuse
    /// them). Idempotent: a second call on an uninitialized manager is a
    /// no-op.
    pub fn shutdown(self) {
        if let Some(handles) = self.handles {
            handles.shutdown.store(true, Ordering::Relaxed);
            let _ = handles.deny_thread.join();
        }
    }
}

fn check_capacity(map: &libbpf_rs::Map, name: &'static str) -> Result<()> {
    let max_entries = map.info().map(|i| i.max_entries).unwrap_or(u32::MAX);
    if count_entries(map) >= max_entries {
        return Err(EnforcementError::Exhausted { name, max_entries });
    }
    Ok(())
}

fn count_entries(map: &libbpf_rs::Map) -> u32 {
    map.keys().count() as u32
}
