//! Pure translation from the abstract capability bitset and mount option
//! bitset to the kernel's `CloneFlags`/`MsFlags`. Kept free of any syscall
//! so the arithmetic is unit-testable without root or a real kernel.

use common::capability::CapabilityGroups;
use nix::mount::MsFlags;
use nix::sched::CloneFlags;

/// Which abstract mount options a single bind mount was requested with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountOptions {
    pub bind: bool,
    pub recursive: bool,
    pub readonly: bool,
    pub create: bool,
}

/// `unshare(2)` flags for a container's namespaces, derived from the
/// capability groups it was granted. UTS is always included.
pub fn clone_flags_for(groups: &CapabilityGroups) -> CloneFlags {
    use common::capability::CapabilityGroup::*;

    let mut flags = CloneFlags::CLONE_NEWUTS;
    for group in groups.iter() {
        flags |= match group {
            Filesystem => CloneFlags::CLONE_NEWNS,
            Network => CloneFlags::CLONE_NEWNET,
            ProcessControl => CloneFlags::CLONE_NEWPID,
            Ipc => CloneFlags::CLONE_NEWIPC,
            Cgroups => CloneFlags::CLONE_NEWCGROUP,
            Users => CloneFlags::CLONE_NEWUSER,
        };
    }
    flags
}

/// Translate a mount's abstract option set into `MsFlags`. `create` does not
/// correspond to a mount flag; it only affects whether the builder creates
/// the target path before mounting.
pub fn ms_flags_for(options: &MountOptions) -> MsFlags {
    let mut flags = MsFlags::empty();
    if options.bind {
        flags |= MsFlags::MS_BIND;
    }
    if options.recursive {
        flags |= MsFlags::MS_REC;
    }
    if options.readonly {
        flags |= MsFlags::MS_RDONLY;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::capability::CapabilityGroup;

    #[test]
    fn clone_flags_always_includes_uts() {
        let groups = CapabilityGroups::default();
        assert!(clone_flags_for(&groups).contains(CloneFlags::CLONE_NEWUTS));
    }

    #[test]
    fn clone_flags_adds_one_flag_per_group() {
        let groups: CapabilityGroups = [CapabilityGroup::Filesystem, CapabilityGroup::Network]
            .into_iter()
            .collect();
        let flags = clone_flags_for(&groups);
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWNET));
        assert!(!flags.contains(CloneFlags::CLONE_NEWPID));
    }

    #[test]
    fn ms_flags_translate_bind_recursive_readonly() {
        let opts = MountOptions {
            bind: true,
            recursive: true,
            readonly: true,
            create: false,
        };
        let flags = ms_flags_for(&opts);
        assert!(flags.contains(MsFlags::MS_BIND));
        assert!(flags.contains(MsFlags::MS_REC));
        assert!(flags.contains(MsFlags::MS_RDONLY));
    }

    #[test]
    fn ms_flags_create_has_no_kernel_flag_equivalent() {
        let opts = MountOptions {
            create: true,
            ..Default::default()
        };
        assert_eq!(ms_flags_for(&opts), MsFlags::empty());
    }
}
