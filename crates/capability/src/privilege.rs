//! Capability bitset manipulation and privilege transitions executed by a
//! container's init process before it enters the idle loop.

use crate::error::{CapabilityError, Result};
use capctl::caps::{Cap, CapSet, CapState};
use capctl::prctl;
use log::debug;
use nix::unistd::{self, Gid, Uid};

/// Capabilities dropped from the bounding and inheritable sets at the end of
/// bring-up, regardless of what the caller's capability-group selection
/// grants. Kept narrow on purpose: this is a blacklist applied on top of
/// whatever the namespace builder already restricted.
const BOUNDING_BLACKLIST: &[Cap] = &[
    Cap::AUDIT_CONTROL,
    Cap::AUDIT_READ,
    Cap::AUDIT_WRITE,
    Cap::DAC_READ_SEARCH,
    Cap::FSETID,
    Cap::IPC_LOCK,
    Cap::MAC_ADMIN,
    Cap::MAC_OVERRIDE,
    Cap::MKNOD,
    Cap::SETFCAP,
    Cap::SYSLOG,
    Cap::SYS_ADMIN,
    Cap::SYS_BOOT,
    Cap::SYS_MODULE,
    Cap::SYS_NICE,
    Cap::SYS_RAWIO,
    Cap::SYS_RESOURCE,
    Cap::SYS_TIME,
    Cap::WAKE_ALARM,
];

/// The inheritable set granted while acting as root during the user/group
/// switch, before the effective uid/gid are dropped.
const SWITCH_INHERITABLE: &[Cap] = &[
    Cap::CHOWN,
    Cap::DAC_OVERRIDE,
    Cap::DAC_READ_SEARCH,
    Cap::FOWNER,
    Cap::FSETID,
    Cap::SETGID,
    Cap::SETUID,
    Cap::SYS_ADMIN,
    Cap::SETFCAP,
];

/// Drop [`BOUNDING_BLACKLIST`] from the bounding set via repeated
/// `PR_CAPBSET_DROP`, and clear the same capabilities from the inheritable
/// set of the current thread.
pub fn drop_capabilities() -> Result<()> {
    for cap in BOUNDING_BLACKLIST {
        capctl::bounding::drop(*cap).map_err(|source| CapabilityError::Bounding {
            cap: cap.name(),
            source,
        })?;
        debug!("dropped {} from the bounding set", cap.name());
    }

    let mut state = CapState::get_current().map_err(CapabilityError::SetState)?;
    for cap in BOUNDING_BLACKLIST {
        state.inheritable.drop(*cap);
    }
    state.set_current().map_err(CapabilityError::SetState)?;
    debug!("cleared blacklisted capabilities from the inheritable set");

    Ok(())
}

/// Acquire the fixed inheritable set, switch the real/effective/saved
/// uid and gid to `uid`/`gid` while keeping capabilities across the
/// transition (`PR_SET_KEEPCAPS`), then reapply the capability set.
///
/// Must be called while still root; returns
/// [`CapabilityError::EscalationUnavailable`] otherwise.
pub fn switch_user_with_capabilities(uid: u32, gid: u32) -> Result<()> {
    if !nix::unistd::geteuid().is_root() {
        return Err(CapabilityError::EscalationUnavailable(
            "effective uid is not 0".into(),
        ));
    }

    let mut inheritable = CapSet::empty();
    for cap in SWITCH_INHERITABLE {
        inheritable.add(*cap);
    }
    let state = CapState {
        effective: inheritable,
        permitted: inheritable,
        inheritable,
    };
    state.set_current().map_err(CapabilityError::SetState)?;
    debug!("granted switch inheritable set");

    prctl::set_keepcaps(true).map_err(|source| CapabilityError::Prctl {
        op: "PR_SET_KEEPCAPS",
        source,
    })?;

    let target_uid = Uid::from_raw(uid);
    let target_gid = Gid::from_raw(gid);
    unistd::setresgid(target_gid, target_gid, target_gid).map_err(CapabilityError::IdSwitch)?;
    unistd::setresuid(target_uid, target_uid, target_uid).map_err(CapabilityError::IdSwitch)?;
    debug!("switched to uid={} gid={}", uid, gid);

    let reapplied = CapState {
        effective: inheritable,
        permitted: inheritable,
        inheritable,
    };
    reapplied.set_current().map_err(CapabilityError::SetState)?;

    Ok(())
}

/// Set `PR_SET_NO_NEW_PRIVS`, preventing the process (and its descendants)
/// from gaining privileges through `execve` of a setuid/setgid binary.
pub fn apply_no_new_privs() -> Result<()> {
    prctl::set_no_new_privs().map_err(|source| CapabilityError::Prctl {
        op: "PR_SET_NO_NEW_PRIVS",
        source,
    })?;
    debug!("set PR_SET_NO_NEW_PRIVS");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for cap in BOUNDING_BLACKLIST {
            assert!(seen.insert(*cap), "duplicate {:?} in blacklist", cap);
        }
    }

    #[test]
    fn switch_inheritable_excludes_sys_boot() {
        assert!(!SWITCH_INHERITABLE.contains(&Cap::SYS_BOOT));
    }

    #[test]
    fn switch_requires_root() {
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let err = switch_user_with_capabilities(1000, 1000).unwrap_err();
        assert!(matches!(err, CapabilityError::EscalationUnavailable(_)));
    }

    #[test]
    #[ignore]
    fn drop_capabilities_requires_root_in_ci() {
        drop_capabilities().expect("drop_capabilities should succeed as root");
    }
}
