//! Orchestrates the in-child bring-up sequence: unshare the requested
//! namespaces, make the mount tree private, bind-mount the runtime
//! directory, apply caller mounts, bind the host's `/sys` in (while the
//! host path is still reachable), chroot into the rootfs and mount the
//! remaining synthetic filesystems.

use crate::error::{NamespaceError, Result};
use crate::flags::clone_flags_for;
use crate::mount::{self, MountSpec};
use common::capability::{CapabilityGroup, CapabilityGroups};
use log::debug;
use nix::mount::{mount as nix_mount, MsFlags};
use nix::sched::unshare;
use nix::unistd::{chdir, chroot};
use std::path::Path;

/// Runs the full namespace/mount/chroot sequence for a container's init
/// process. Must be called after the initial `clone`/`fork` into the child,
/// before any other in-container setup (capability drop, socket open).
///
/// Callers that need to pause between the unshare and the mount/chroot work
/// (to hand a uid/gid map over to the host, for instance) should call
/// [`unshare_only`] and [`finish_bring_up`] directly instead.
pub fn bring_up(
    groups: &CapabilityGroups,
    rootfs: &Path,
    runtime_dir: &Path,
    mounts: &[MountSpec],
) -> Result<()> {
    unshare_only(groups)?;
    finish_bring_up(groups, rootfs, runtime_dir, mounts)
}

/// The first half of bring-up: unshare the namespaces `groups` calls for.
/// Leaves the calling process's mount namespace untouched otherwise.
pub fn unshare_only(groups: &CapabilityGroups) -> Result<()> {
    let flags = clone_flags_for(groups);
    unshare(flags).map_err(|e| NamespaceError::Unshare {
        flags: format!("{:?}", flags),
        source: e,
    })?;
    debug!("unshared namespaces: {:?}", flags);
    Ok(())
}

/// The second half of bring-up: private-mount remount, runtime dir bind,
/// caller mounts, chroot and synthetic filesystem mounts. Must run after
/// [`unshare_only`], and after any uid/gid map handshake the caller needs.
pub fn finish_bring_up(
    groups: &CapabilityGroups,
    rootfs: &Path,
    runtime_dir: &Path,
    mounts: &[MountSpec],
) -> Result<()> {
    make_root_private()?;

    if groups.contains(CapabilityGroup::Filesystem) {
        bind_runtime_dir(rootfs, runtime_dir)?;
    }

    for spec in mounts {
        mount::apply(rootfs, spec)?;
    }
    mount::bind_sys(rootfs)?;

    enter_rootfs(rootfs)?;
    mount::mount_synthetic()?;

    Ok(())
}

fn make_root_private() -> Result<()> {
    nix_mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| NamespaceError::Mount {
        source_path: None,
        target: Path::new("/").to_path_buf(),
        fstype: None,
        source: e,
    })?;
    debug!("remounted / as MS_REC|MS_PRIVATE");
    Ok(())
}

fn bind_runtime_dir(rootfs: &Path, runtime_dir: &Path) -> Result<()> {
    let relative = runtime_dir
        .strip_prefix("/")
        .map_err(|_| NamespaceError::NonAbsoluteDestination(runtime_dir.to_path_buf()))?;
    let target = rootfs.join(relative);
    std::fs::create_dir_all(&target).map_err(|e| NamespaceError::CreateTarget(target.clone(), e))?;
    nix_mount(
        Some(runtime_dir),
        &target,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| NamespaceError::Mount {
        source_path: Some(runtime_dir.to_path_buf()),
        target: target.clone(),
        fstype: None,
        source: e,
    })?;
    debug!(
        "bind-mounted runtime dir {} at {}",
        runtime_dir.display(),
        target.display()
    );
    Ok(())
}

fn enter_rootfs(rootfs: &Path) -> Result<()> {
    chdir(rootfs).map_err(|e| NamespaceError::RootSwitch(rootfs.to_path_buf(), e))?;
    chroot(rootfs).map_err(|e| NamespaceError::RootSwitch(rootfs.to_path_buf(), e))?;
    chdir("/").map_err(|e| NamespaceError::RootSwitch(Path::new("/").to_path_buf(), e))?;
    debug!("chrooted into {}", rootfs.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::capability::CapabilityGroup;

    #[test]
    fn bind_runtime_dir_rejects_relative_path() {
        let groups = CapabilityGroups::new([CapabilityGroup::Filesystem]);
        let err = bring_up(
            &groups,
            Path::new("/does/not/exist"),
            Path::new("relative"),
            &[],
        );
        // unshare() itself will fail first without CAP_SYS_ADMIN in most
        // test sandboxes, so we only assert this path returns an error
        // rather than panicking on the relative runtime dir.
        assert!(err.is_err());
    }
}
