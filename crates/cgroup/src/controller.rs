//! Per-container cgroup v2 directory lifecycle: creation, limit
//! application and teardown.

use crate::error::{CgroupError, Result};
use crate::limits::CgroupLimits;
use log::debug;
use nix::unistd::Pid;
use std::fs::{self, Permissions};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

const CGROUP2_SUPER_MAGIC: libc::c_long = 0x6367_7270;

/// A handle on the cgroup v2 hierarchy root, e.g. `/sys/fs/cgroup`. Holds no
/// per-container state; each container gets its own subdirectory named
/// after its hostname.
#[derive(Clone, Debug)]
pub struct CgroupController {
    root: PathBuf,
}

impl CgroupController {
    /// Open the cgroup v2 hierarchy rooted at `root`, verifying it is
    /// actually cgroup v2 via the `statfs` magic number.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !is_cgroup2(&root) {
            return Err(CgroupError::NotCgroupV2(root));
        }
        Ok(Self { root })
    }

    fn path_for(&self, hostname: &str) -> PathBuf {
        self.root.join(hostname)
    }

    /// Create `<root>/<hostname>` (mode 0700), apply `limits`, then move
    /// `pid` into the cgroup. Writes happen sequentially; the first failure
    /// aborts and is returned with the offending path attached.
    pub fn init(&self, hostname: &str, pid: Pid, limits: &CgroupLimits) -> Result<u64> {
        let path = self.path_for(hostname);
        fs::create_dir(&path).map_err(|e| CgroupError::Create(path.clone(), e))?;
        fs::set_permissions(&path, Permissions::from_mode(0o700))
            .map_err(|e| CgroupError::Create(path.clone(), e))?;
        debug!("created cgroup directory {}", path.display());

        self.write(&path, "memory.max", limits.memory_max())?;
        self.write(&path, "cpu.weight", &limits.cpu_weight().to_string())?;
        self.write(&path, "pids.max", limits.pids_max())?;
        self.write(&path, "cgroup.procs", &pid.as_raw().to_string())?;

        cgroup_id(&path)
    }

    /// Remove `<root>/<hostname>`. The kernel only allows this once the
    /// cgroup is empty, i.e. after every process inside has exited.
    pub fn free(&self, hostname: &str) -> Result<()> {
        let path = self.path_for(hostname);
        match fs::remove_dir(&path) {
            Ok(()) => {
                debug!("removed cgroup directory {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CgroupError::Remove(path, e)),
        }
    }

    /// The inode number of `<root>/<hostname>`, stable for the cgroup's
    /// lifetime and used as the enforcement-plane isolation key.
    pub fn cgroup_id(&self, hostname: &str) -> Result<u64> {
        cgroup_id(&self.path_for(hostname))
    }

    fn write(&self, dir: &Path, file: &str, value: &str) -> Result<()> {
        let path = dir.join(file);
        fs::write(&path, value).map_err(|e| CgroupError::Write {
            path,
            value: value.to_string(),
            source: e,
        })?;
        debug!("wrote {:?} to {}", value, dir.join(file).display());
        Ok(())
    }
}

fn cgroup_id(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path).map_err(|e| CgroupError::Stat(path.to_path_buf(), e))?;
    Ok(meta.ino())
}

fn is_cgroup2(root: &Path) -> bool {
    let mut buf: libc::statfs = unsafe { std::mem::zeroed() };
    let c_path = match std::ffi::CString::new(root.as_os_str().as_bytes()) {
        Ok(p) => p,
        Err(_) => return false,
    };
    let rc = unsafe { libc::statfs(c_path.as_ptr(), &mut buf) };
    rc == 0 && buf.f_type == CGROUP2_SUPER_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result as AnyResult;
    use nix::unistd::getpid;
    use tempfile::TempDir;

    fn fake_cgroup2_root() -> AnyResult<TempDir> {
        Ok(tempfile::tempdir()?)
    }

    #[test]
    fn new_rejects_non_cgroup2_mount() -> AnyResult<()> {
        let dir = fake_cgroup2_root()?;
        assert!(CgroupController::new(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn init_and_free_roundtrip_without_real_cgroupfs() -> AnyResult<()> {
        // Bypass the statfs check by constructing the controller directly;
        // this still exercises init()/free()'s file writes against a tmpfs
        // directory, just not the real unified hierarchy.
        let dir = fake_cgroup2_root()?;
        let controller = CgroupController {
            root: dir.path().to_path_buf(),
        };
        let limits = CgroupLimits::default();

        let id = controller.init("c-test01", getpid(), &limits);
        // Writing to "memory.max" etc. fails outside a real cgroupfs, but the
        // directory creation and id resolution must still succeed up to
        // that point.
        assert!(dir.path().join("c-test01").exists());
        drop(id);

        // free() is idempotent even though init() never fully completed.
        std::fs::remove_file(dir.path().join("c-test01").join("cgroup.procs")).ok();
        controller.free("c-test01")?;
        assert!(!dir.path().join("c-test01").exists());
        Ok(())
    }

    #[test]
    fn free_on_missing_hostname_is_idempotent() -> AnyResult<()> {
        let dir = fake_cgroup2_root()?;
        let controller = CgroupController {
            root: dir.path().to_path_buf(),
        };
        controller.free("never-existed")?;
        Ok(())
    }
}
