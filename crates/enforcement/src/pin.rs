//! Pin-directory bring-up and per-map reuse-or-recreate, the first half of
//! `PolicyMapManager::initialize`: LSM availability check, `/sys/fs/bpf/cvd`
//! creation, and opening each pinned map by path with an ABI check before
//! handing it back to the caller for population.

use crate::abi::MapAbi;
use crate::error::{EnforcementError, Result};
use libbpf_rs::Map;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const LSM_SYSFS: &str = "/sys/kernel/security/lsm";
pub const PIN_DIR: &str = "/sys/fs/bpf/cvd";

/// Checks that `bpf` appears in the kernel's enabled LSM list.
pub fn check_lsm_available() -> Result<()> {
    check_lsm_available_at(LSM_SYSFS)
}

fn check_lsm_available_at(path: &str) -> Result<()> {
    let contents = fs::read_to_string(path).map_err(|_| EnforcementError::LsmUnavailable)?;
    if contents.split(',').any(|name| name.trim() == "bpf") {
        Ok(())
    } else {
        Err(EnforcementError::LsmUnavailable)
    }
}

/// Creates the pin directory (and parents) if it doesn't already exist.
pub fn ensure_pin_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| EnforcementError::PinDirCreate(dir.to_path_buf(), e))
}

/// Opens the map pinned at `dir/abi.name`, verifying its ABI matches
/// `abi`. If the pin doesn't exist, returns `Ok(None)` so the caller can pin
/// a freshly created map there instead. If it exists with a mismatched ABI,
/// unlinks it and returns `Ok(None)` as well, logging the recreation at
/// `warn`.
pub fn reuse_or_recreate(dir: &Path, abi: &MapAbi) -> Result<Option<Map>> {
    let path = dir.join(abi.name);
    if !path.exists() {
        return Ok(None);
    }

    let map = Map::from_pinned_path(&path).map_err(|e| EnforcementError::SkeletonLoad(abi.name, e))?;
    let found_type = map.map_type();
    let found_key = map.key_size();
    let found_value = map.value_size();

    if found_type == abi.map_type && found_key == abi.key_size && found_value == abi.value_size {
        info!("reusing pinned map {} at {:?}", abi.name, path);
        return Ok(Some(map));
    }

    warn!(
        "pinned map {} at {:?} has stale ABI (type={:?} key={} value={}), expected (type={:?} key={} value={}); unlinking and recreating",
        abi.name, path, found_type, found_key, found_value, abi.map_type, abi.key_size, abi.value_size
    );
    unlink(&path)?;
    Ok(None)
}

pub fn unlink(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EnforcementError::Unpin(path.to_path_buf(), e)),
    }
}

pub fn pin_path(name: &str) -> PathBuf {
    Path::new(PIN_DIR).join(name)
}

pub fn pin_map(dir: &Path, map: &Map, name: &'static str) -> Result<()> {
    let path = dir.join(name);
    if path.exists() {
        return Ok(());
    }
    map.pin(&path).map_err(|source| EnforcementError::Pin {
        name,
        path,
        source,
    })
}

/// A write-then-delete probe used on freshly pinned net maps: some kernels
/// accept a pin of the wrong key/value layout without erroring until the
/// first real update, so the manager writes and removes a zero key/value
/// pair immediately after pinning to fail fast during `initialize`.
pub fn probe_writable(map: &Map, abi: &MapAbi) -> Result<()> {
    let key = vec![0u8; abi.key_size as usize];
    let value = vec![0u8; abi.value_size as usize];
    map.update(&key, &value, libbpf_rs::MapFlags::ANY)
        .map_err(|e| EnforcementError::MapUpdate(abi.name, e))?;
    map.delete(&key).map_err(|e| EnforcementError::MapDelete(abi.name, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lsm_available_when_bpf_present() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "lockdown,capability,bpf").unwrap();
        assert!(check_lsm_available_at(f.path().to_str().unwrap()).is_ok());
    }

    #[test]
    fn lsm_unavailable_when_bpf_absent() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "lockdown,capability").unwrap();
        assert!(matches!(
            check_lsm_available_at(f.path().to_str().unwrap()),
            Err(EnforcementError::LsmUnavailable)
        ));
    }

    #[test]
    fn lsm_unavailable_when_sysfs_missing() {
        assert!(matches!(
            check_lsm_available_at("/nonexistent/lsm"),
            Err(EnforcementError::LsmUnavailable)
        ));
    }

    #[test]
    fn ensure_pin_dir_creates_nested_path() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b").join("cvd");
        ensure_pin_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn reuse_or_recreate_returns_none_when_unpinned() {
        let tmp = tempfile::tempdir().unwrap();
        let abi = crate::abi::expected().remove(0);
        assert!(reuse_or_recreate(tmp.path(), &abi).unwrap().is_none());
    }
}
