//! Classic-BPF seccomp filter emission for a container's init process.

use crate::error::{CapabilityError, Result};
use seccompiler::{
    apply_filter, BpfProgram, SeccompAction, SeccompFilter, SeccompRule, TargetArch,
};
use std::collections::BTreeMap;
use std::convert::TryInto;

/// The minimum syscall denylist required by bring-up: namespace/mount
/// manipulation, process introspection and power-state changes must never
/// reach the kernel from inside a container, even one granted every
/// capability group.
const DENYLIST: &[&str] = &[
    "ptrace",
    "process_vm_readv",
    "process_vm_writev",
    "mount",
    "umount2",
    "swapon",
    "swapoff",
    "reboot",
    "kexec_load",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Determines the action taken on a denied syscall.
pub enum ProfileLevel {
    /// Deny with `errno = EPERM`, letting the calling program observe and
    /// potentially recover from the failure.
    Standard,
    /// Deny by delivering `SIGSYS`, terminating the offending thread.
    Paranoid,
}

/// Build and apply the seccomp filter for `level` to the current thread.
pub fn apply_seccomp(level: ProfileLevel) -> Result<()> {
    let program = build_filter(level)?;
    apply_filter(&program).map_err(|e| CapabilityError::SeccompApply(e.to_string()))
}

fn build_filter(level: ProfileLevel) -> Result<BpfProgram> {
    let deny_action = match level {
        ProfileLevel::Standard => SeccompAction::Errno(libc::EPERM as u32),
        ProfileLevel::Paranoid => SeccompAction::KillThread,
    };

    let mut rules: BTreeMap<i64, Vec<SeccompRule>> = BTreeMap::new();
    for name in DENYLIST {
        if let Some(nr) = syscall_nr(name) {
            rules.insert(nr, vec![]);
        }
    }

    let filter = SeccompFilter::new(
        rules,
        SeccompAction::Allow,
        deny_action,
        target_arch(),
    )
    .map_err(|e| CapabilityError::SeccompBuild(e.to_string()))?;

    filter
        .try_into()
        .map_err(|e: seccompiler::BackendError| CapabilityError::SeccompBuild(e.to_string()))
}

#[cfg(target_arch = "x86_64")]
fn target_arch() -> TargetArch {
    TargetArch::x86_64
}

#[cfg(target_arch = "aarch64")]
fn target_arch() -> TargetArch {
    TargetArch::aarch64
}

fn syscall_nr(name: &str) -> Option<i64> {
    Some(match name {
        "ptrace" => libc::SYS_ptrace,
        "process_vm_readv" => libc::SYS_process_vm_readv,
        "process_vm_writev" => libc::SYS_process_vm_writev,
        "mount" => libc::SYS_mount,
        "umount2" => libc::SYS_umount2,
        "swapon" => libc::SYS_swapon,
        "swapoff" => libc::SYS_swapoff,
        "reboot" => libc::SYS_reboot,
        "kexec_load" => libc::SYS_kexec_load,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_syscalls_all_resolve() {
        for name in DENYLIST {
            assert!(syscall_nr(name).is_some(), "unresolved syscall {}", name);
        }
    }

    #[test]
    fn filter_builds_for_both_levels() {
        build_filter(ProfileLevel::Standard).expect("standard filter builds");
        build_filter(ProfileLevel::Paranoid).expect("paranoid filter builds");
    }
}
