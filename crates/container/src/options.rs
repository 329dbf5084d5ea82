//! Caller-facing option structs for [`crate::manager::ContainerManager`]'s
//! public API (§6 "Container API").

use capability::ProfileLevel;
use cgroup::CgroupLimits;
use common::capability::CapabilityGroups;
use namespace::MountSpec;
use policy::Policy;
use std::path::PathBuf;

/// Everything `create` needs to bring a container up.
#[derive(Clone, Debug)]
pub struct CreateOptions {
    pub rootfs: PathBuf,
    pub capability_groups: CapabilityGroups,
    pub cgroup_limits: CgroupLimits,
    pub mounts: Vec<MountSpec>,
    pub policy: Policy,
    pub uid_map: IdMap,
    pub gid_map: IdMap,
    pub seccomp_level: ProfileLevel,
}

/// A host_start/child_start/count triple, re-exported here so callers
/// building [`CreateOptions`] don't need to depend on the `handshake`
/// module directly.
pub type IdMap = crate::handshake::IdMapRange;

#[derive(Clone, Debug, Default)]
pub struct SpawnOptions {
    /// The executable to run, resolved inside the container's mount
    /// namespace. Becomes `argv[0]` on the wire.
    pub path: String,
    /// Additional arguments, not including `path` itself.
    pub argv: Vec<String>,
    pub envp: Vec<String>,
    pub uid: i32,
    pub gid: i32,
    /// Block until the spawned process has been reaped before returning.
    pub wait: bool,
}
