//! Glue around the two generated BPF skeletons (`fs.skel.rs`, `net.skel.rs`
//! under `$OUT_DIR`, built by `build.rs` via `libbpf-cargo`): open, load,
//! attach every LSM program, and hand back the map handles and ring buffer
//! file descriptors `PolicyMapManager` and the deny-event collector need.

#![allow(clippy::all)]

mod fs_skel {
    include!(concat!(env!("OUT_DIR"), "/fs.skel.rs"));
}
mod net_skel {
    include!(concat!(env!("OUT_DIR"), "/net.skel.rs"));
}

use crate::abi;
use crate::error::{EnforcementError, Result};
use libbpf_rs::{Link, Map};
use std::os::unix::io::AsRawFd;

/// Both skeletons, loaded and attached, kept alive for the manager's
/// lifetime — dropping this detaches every program and closes the maps.
pub struct Loaded {
    fs_skel: fs_skel::FsSkel<'static>,
    net_skel: net_skel::NetSkel<'static>,
    _links: Vec<Link>,
    pub fs_ringbuf_fd: i32,
    pub net_ringbuf_fd: i32,
}

pub fn load_and_attach() -> Result<Loaded> {
    let fs_open = fs_skel::FsSkelBuilder::default()
        .open()
        .map_err(|e| EnforcementError::SkeletonLoad("fs", e))?;
    let fs_skel = fs_open.load().map_err(|e| EnforcementError::SkeletonLoad("fs", e))?;

    let net_open = net_skel::NetSkelBuilder::default()
        .open()
        .map_err(|e| EnforcementError::SkeletonLoad("net", e))?;
    let net_skel = net_open.load().map_err(|e| EnforcementError::SkeletonLoad("net", e))?;

    let mut links = Vec::new();
    links.push(
        fs_skel
            .progs()
            .containerv_file_open()
            .attach()
            .map_err(|e| EnforcementError::Attach("file_open", e))?,
    );
    links.push(
        fs_skel
            .progs()
            .containerv_path_truncate()
            .attach()
            .map_err(|e| EnforcementError::Attach("path_truncate", e))?,
    );
    links.push(
        net_skel
            .progs()
            .containerv_socket_create()
            .attach()
            .map_err(|e| EnforcementError::Attach("socket_create", e))?,
    );
    links.push(
        net_skel
            .progs()
            .containerv_socket_connect()
            .attach()
            .map_err(|e| EnforcementError::Attach("socket_connect", e))?,
    );
    links.push(
        net_skel
            .progs()
            .containerv_socket_bind()
            .attach()
            .map_err(|e| EnforcementError::Attach("socket_bind", e))?,
    );

    let fs_ringbuf_fd = fs_skel.maps().fs_denials().as_raw_fd();
    let net_ringbuf_fd = net_skel.maps().net_denials().as_raw_fd();

    Ok(Loaded {
        fs_skel,
        net_skel,
        _links: links,
        fs_ringbuf_fd,
        net_ringbuf_fd,
    })
}

/// Looks up one of the six policy maps by its pinned name. Panics on an
/// unknown name — callers only ever pass names from [`crate::abi::expected`].
pub fn map_by_name<'a>(loaded: &'a Loaded, name: &str) -> &'a Map<'a> {
    match name {
        n if n == abi::POLICY => loaded.fs_skel.maps().policy(),
        n if n == abi::DIR_POLICY => loaded.fs_skel.maps().dir_policy(),
        n if n == abi::BASENAME_POLICY => loaded.fs_skel.maps().basename_policy(),
        n if n == abi::NET_CREATE => loaded.net_skel.maps().net_create(),
        n if n == abi::NET_TUPLE => loaded.net_skel.maps().net_tuple(),
        n if n == abi::NET_UNIX => loaded.net_skel.maps().net_unix(),
        other => panic!("unknown policy map name {}", other),
    }
}
