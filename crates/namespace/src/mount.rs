//! Caller-supplied mount descriptions and their application against a
//! rootfs that has already been chdir'd into.

use crate::error::{NamespaceError, Result};
use crate::flags::{ms_flags_for, MountOptions};
use log::debug;
use nix::mount::mount as nix_mount;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// A single caller-requested mount, expressed in terms of the abstract
/// option bitset rather than raw `MsFlags`.
#[derive(Clone, Debug)]
pub struct MountSpec {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub fstype: Option<String>,
    pub options: MountOptions,
}

impl MountSpec {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        fstype: Option<String>,
        options: MountOptions,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            fstype,
            options,
        }
    }
}

/// Apply `spec` relative to `rootfs`. If the destination does not exist and
/// `create` is set, it is created recursively (mode 0755) under `rootfs`
/// first. A failing mount is fatal and aborts the whole bring-up sequence.
pub fn apply(rootfs: &Path, spec: &MountSpec) -> Result<()> {
    let relative = spec
        .destination
        .strip_prefix("/")
        .map_err(|_| NamespaceError::NonAbsoluteDestination(spec.destination.clone()))?;
    let target = rootfs.join(relative);

    if !target.exists() && spec.options.create {
        fs::create_dir_all(&target).map_err(|e| NamespaceError::CreateTarget(target.clone(), e))?;
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755))
            .map_err(|e| NamespaceError::CreateTarget(target.clone(), e))?;
    }

    let flags = ms_flags_for(&spec.options);
    nix_mount(
        Some(spec.source.as_path()),
        &target,
        spec.fstype.as_deref(),
        flags,
        None::<&str>,
    )
    .map_err(|e| NamespaceError::Mount {
        source_path: Some(spec.source.clone()),
        target: target.clone(),
        fstype: spec.fstype.clone(),
        source: e,
    })?;

    debug!(
        "mounted {} -> {} (fstype {:?}, options {:?})",
        spec.source.display(),
        target.display(),
        spec.fstype,
        spec.options
    );
    Ok(())
}

/// Bind-mount the host's `/sys` under `rootfs`. Must run *before* the
/// chroot: the source is a host path (mounting a fresh sysfs inside a
/// non-root user namespace is refused by the kernel, so the host's is
/// reused instead), and once the chroot has happened the host's `/sys` is
/// no longer reachable by path from inside the container to bind from.
pub fn bind_sys(rootfs: &Path) -> Result<()> {
    let host_path = Path::new("/sys");
    let relative = host_path.strip_prefix("/").expect("host path is absolute");
    let target = rootfs.join(relative);
    fs::create_dir_all(&target).map_err(|e| NamespaceError::CreateTarget(target.clone(), e))?;
    nix_mount(
        Some(host_path),
        &target,
        None::<&str>,
        nix::mount::MsFlags::MS_BIND | nix::mount::MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| NamespaceError::Mount {
        source_path: Some(host_path.to_path_buf()),
        target: target.clone(),
        fstype: None,
        source: e,
    })?;
    debug!("bind-mounted {} at {}", host_path.display(), target.display());
    Ok(())
}

/// Mount the synthetic filesystems a container's init expects that don't
/// need a host source: `/proc` and a tmpfs `/tmp`. Must run *after* the
/// chroot into rootfs, using absolute targets that resolve against the
/// process's (now-switched) filesystem root rather than the host. Unlike
/// [`bind_sys`], these have no host path to bind from, so there's no
/// requirement to mount them before the chroot.
pub fn mount_synthetic() -> Result<()> {
    mount_proc()?;
    mount_tmp()?;
    Ok(())
}

fn mount_proc() -> Result<()> {
    let target = Path::new("/proc");
    fs::create_dir_all(target).map_err(|e| NamespaceError::CreateTarget(target.to_path_buf(), e))?;
    nix_mount(
        Some("proc"),
        target,
        Some("proc"),
        nix::mount::MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| NamespaceError::Mount {
        source_path: None,
        target: target.to_path_buf(),
        fstype: Some("proc".into()),
        source: e,
    })?;
    debug!("mounted proc at {}", target.display());
    Ok(())
}

fn mount_tmp() -> Result<()> {
    let target = Path::new("/tmp");
    fs::create_dir_all(target).map_err(|e| NamespaceError::CreateTarget(target.to_path_buf(), e))?;
    nix_mount(
        Some("tmpfs"),
        target,
        Some("tmpfs"),
        nix::mount::MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| NamespaceError::Mount {
        source_path: None,
        target: target.to_path_buf(),
        fstype: Some("tmpfs".into()),
        source: e,
    })?;
    debug!("mounted tmpfs at {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_absolute_destination_is_rejected() {
        let spec = MountSpec::new("/src", "relative/path", None, MountOptions::default());
        let err = apply(Path::new("/rootfs"), &spec).unwrap_err();
        assert!(matches!(err, NamespaceError::NonAbsoluteDestination(_)));
    }
}
