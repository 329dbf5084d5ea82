//! Linux namespace vocabulary shared between the namespace builder, the
//! container lifecycle engine and the policy compiler (which keys enforcement
//! decisions off the mount namespace a container runs in).

use std::path::PathBuf;
use strum::{AsRefStr, Display, EnumString};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A single namespace a container's init process either joins (by bind path)
/// or creates fresh.
pub struct Namespace {
    pub kind: NamespaceKind,
    pub path: PathBuf,
}

impl Namespace {
    pub fn new(kind: NamespaceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

#[derive(
    AsRefStr, Copy, Clone, Debug, Display, EnumString, Eq, Hash, PartialEq, Ord, PartialOrd,
)]
#[strum(serialize_all = "UPPERCASE")]
#[repr(u32)]
/// The eight namespace kinds the Linux kernel supports via `CLONE_NEW*` /
/// `unshare(2)`. Discriminants are the wire values `GETFDS` uses to index
/// its `types[CV_NS_COUNT]` array, so these must not be renumbered.
pub enum NamespaceKind {
    Cgroup = 0,
    Ipc = 1,
    Mnt = 2,
    Net = 3,
    Pid = 4,
    Time = 5,
    User = 6,
    Uts = 7,
}

/// All eight kinds, in wire-discriminant order.
pub const ALL_NAMESPACE_KINDS: [NamespaceKind; 8] = [
    NamespaceKind::Cgroup,
    NamespaceKind::Ipc,
    NamespaceKind::Mnt,
    NamespaceKind::Net,
    NamespaceKind::Pid,
    NamespaceKind::Time,
    NamespaceKind::User,
    NamespaceKind::Uts,
];

impl NamespaceKind {
    /// The entry under `/proc/<pid>/ns/` for this namespace kind.
    pub fn proc_name(self) -> &'static str {
        match self {
            NamespaceKind::Cgroup => "cgroup",
            NamespaceKind::Ipc => "ipc",
            NamespaceKind::Mnt => "mnt",
            NamespaceKind::Net => "net",
            NamespaceKind::Pid => "pid",
            NamespaceKind::Time => "time",
            NamespaceKind::User => "user",
            NamespaceKind::Uts => "uts",
        }
    }

    pub fn from_wire(value: u32) -> Option<Self> {
        ALL_NAMESPACE_KINDS.into_iter().find(|k| *k as u32 == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_as_ref() {
        assert_eq!(NamespaceKind::Mnt.as_ref(), "MNT");
        assert_eq!(NamespaceKind::Cgroup.as_ref(), "CGROUP");
    }

    #[test]
    fn kind_from_str_round_trips() {
        assert_eq!(NamespaceKind::Pid, NamespaceKind::from_str("PID").unwrap());
        assert_eq!(NamespaceKind::Time, NamespaceKind::from_str("TIME").unwrap());
    }

    #[test]
    fn new_sets_fields() {
        let ns = Namespace::new(NamespaceKind::Net, "/proc/1234/ns/net");
        assert_eq!(ns.kind, NamespaceKind::Net);
        assert_eq!(ns.path, PathBuf::from("/proc/1234/ns/net"));
    }

    #[test]
    fn proc_name_is_lowercase() {
        assert_eq!(NamespaceKind::Uts.proc_name(), "uts");
        assert_eq!(NamespaceKind::User.proc_name(), "user");
    }

    #[test]
    fn wire_discriminants_round_trip() {
        for kind in ALL_NAMESPACE_KINDS {
            assert_eq!(NamespaceKind::from_wire(kind as u32), Some(kind));
        }
        assert_eq!(NamespaceKind::from_wire(99), None);
    }
}
