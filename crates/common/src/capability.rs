//! The closed enumeration of capability groups a container can be granted
//! (§3 "Capability set"): the vocabulary shared by every caller that needs
//! to know which groups were requested (the namespace builder picks
//! unshare flags off a [`CapabilityGroups`] set, the container lifecycle
//! engine gates the uid/gid map handshake on whether `Users` is present,
//! and so on). The privileged syscalls that act on a *process's* Linux
//! capabilities live in the `capability` crate, which uses `capctl`'s own
//! `Cap` enum directly rather than duplicating it here.

use std::{collections::HashSet, ops::Deref};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The closed enumeration of capability groups a container can be granted.
/// Each group conditionally adds an unshare flag and a wider Linux
/// capability grant when building the namespace/mount/privilege sequence for
/// a container's init process.
#[derive(
    AsRefStr, Copy, Clone, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Ord, PartialOrd,
)]
#[strum(serialize_all = "kebab-case")]
pub enum CapabilityGroup {
    Filesystem,
    Network,
    ProcessControl,
    Ipc,
    Cgroups,
    Users,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilityGroups(HashSet<CapabilityGroup>);

impl CapabilityGroups {
    pub fn new(groups: impl IntoIterator<Item = CapabilityGroup>) -> Self {
        Self(groups.into_iter().collect())
    }

    pub fn contains(&self, group: CapabilityGroup) -> bool {
        self.0.contains(&group)
    }
}

impl Deref for CapabilityGroups {
    type Target = HashSet<CapabilityGroup>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<CapabilityGroup> for CapabilityGroups {
    fn from_iter<T: IntoIterator<Item = CapabilityGroup>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn groups_round_trip() {
        let groups = CapabilityGroups::new([CapabilityGroup::Filesystem, CapabilityGroup::Network]);
        assert!(groups.contains(CapabilityGroup::Filesystem));
        assert!(groups.contains(CapabilityGroup::Network));
        assert!(!groups.contains(CapabilityGroup::Users));
    }

    #[test]
    fn group_from_str() {
        assert_eq!(
            CapabilityGroup::ProcessControl,
            CapabilityGroup::from_str("process-control").unwrap()
        );
    }
}
