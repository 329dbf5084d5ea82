//! The expected `(type, key_size, value_size)` triple for each of the six
//! pinned policy maps. A pinned map on disk that doesn't match gets
//! unlinked and recreated by [`crate::pin::reuse_or_recreate`] — the
//! recovery path for [`crate::error::EnforcementError::AbiMismatch`].

use libbpf_rs::MapType;
use policy::compiler::{BasenameValue, DirValue, FsKey, FsValue, NetCreateKey, NetTupleKey, NetUnixKey};
use std::mem::size_of;

#[derive(Clone, Copy, Debug)]
pub struct MapAbi {
    pub name: &'static str,
    pub map_type: MapType,
    pub key_size: u32,
    pub value_size: u32,
    pub max_entries: u32,
}

/// Fixed-size upper bound on the variable-length [`BasenameValue`] wire
/// shape: `count: u32` plus `MAX_BASENAME_BUCKET` packed rule records.
fn basename_value_size() -> u32 {
    use policy::types::MAX_BASENAME_BUCKET;
    (4 + MAX_BASENAME_BUCKET * size_of::<policy::compiler::BasenameRuleRecord>()) as u32
}

pub const POLICY: &str = "policy";
pub const DIR_POLICY: &str = "dir_policy";
pub const BASENAME_POLICY: &str = "basename_policy";
pub const NET_CREATE: &str = "net_create";
pub const NET_TUPLE: &str = "net_tuple";
pub const NET_UNIX: &str = "net_unix";

/// The ABI every fs/net map must have, in the order `initialize` checks and
/// pins them.
pub fn expected() -> Vec<MapAbi> {
    vec![
        MapAbi {
            name: POLICY,
            map_type: MapType::Hash,
            key_size: size_of::<FsKey>() as u32,
            value_size: size_of::<FsValue>() as u32,
            max_entries: 10240,
        },
        MapAbi {
            name: DIR_POLICY,
            map_type: MapType::Hash,
            key_size: size_of::<FsKey>() as u32,
            value_size: size_of::<DirValue>() as u32,
            max_entries: 10240,
        },
        MapAbi {
            name: BASENAME_POLICY,
            map_type: MapType::Hash,
            key_size: size_of::<FsKey>() as u32,
            value_size: basename_value_size(),
            max_entries: 10240,
        },
        MapAbi {
            name: NET_CREATE,
            map_type: MapType::Hash,
            key_size: size_of::<NetCreateKey>() as u32,
            value_size: 4,
            max_entries: 4096,
        },
        MapAbi {
            name: NET_TUPLE,
            map_type: MapType::Hash,
            key_size: size_of::<NetTupleKey>() as u32,
            value_size: 4,
            max_entries: 8192,
        },
        MapAbi {
            name: NET_UNIX,
            map_type: MapType::Hash,
            key_size: size_of::<NetUnixKey>() as u32,
            value_size: 4,
            max_entries: 4096,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_has_one_entry_per_map() {
        let names: Vec<_> = expected().iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            vec![POLICY, DIR_POLICY, BASENAME_POLICY, NET_CREATE, NET_TUPLE, NET_UNIX]
        );
    }

    #[test]
    fn key_sizes_match_fs_key_layout() {
        for abi in expected().iter().take(3) {
            assert_eq!(abi.key_size, size_of::<FsKey>() as u32);
        }
    }
}
