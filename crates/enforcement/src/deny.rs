//! The deny-event collector (component H): a dedicated thread that polls
//! the `fs_denials` and `net_denials` ring buffers and logs each decoded
//! [`DenyEvent`] at `debug`. Runs until `shutdown` is set, checking at a
//! one-second cadence so a slow epoll wait never blocks process exit for
//! long.

use crate::error::{EnforcementError, Result};
use getset::Getters;
use libbpf_rs::RingBufferBuilder;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// One decoded `struct deny_event` from either ring buffer.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct DenyEvent {
    cgroup_id: u64,
    dev: u64,
    ino: u64,
    required_mask: u32,
    hook: Hook,
    comm: String,
    name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    FileOpen,
    InodeUnlink,
    PathTruncate,
    SocketCreate,
    SocketBind,
    SocketConnect,
    SocketListen,
    SocketAccept,
    Unknown(u32),
}

impl Hook {
    fn from_id(id: u32) -> Self {
        match id {
            1 => Hook::FileOpen,
            2 => Hook::InodeUnlink,
            3 => Hook::PathTruncate,
            10 => Hook::SocketCreate,
            11 => Hook::SocketBind,
            12 => Hook::SocketConnect,
            13 => Hook::SocketListen,
            14 => Hook::SocketAccept,
            other => Hook::Unknown(other),
        }
    }
}

/// Layout mirrors `struct deny_event` in `bpf/policy_maps.h`:
/// `cgroup_id: u64, dev: u64, ino: u64, required_mask: u32, hook_id: u32,
/// comm: [u8; 16], name_len: u32, name: [u8; 256]`.
fn decode(raw: &[u8]) -> Option<DenyEvent> {
    if raw.len() < 8 * 3 + 4 * 2 + 16 + 4 + 256 {
        return None;
    }
    let mut off = 0;
    let read_u64 = |buf: &[u8], off: &mut usize| {
        let v = u64::from_ne_bytes(buf[*off..*off + 8].try_into().unwrap());
        *off += 8;
        v
    };
    let read_u32 = |buf: &[u8], off: &mut usize| {
        let v = u32::from_ne_bytes(buf[*off..*off + 4].try_into().unwrap());
        *off += 4;
        v
    };

    let cgroup_id = read_u64(raw, &mut off);
    let dev = read_u64(raw, &mut off);
    let ino = read_u64(raw, &mut off);
    let required_mask = read_u32(raw, &mut off);
    let hook_id = read_u32(raw, &mut off);
    let comm_bytes = &raw[off..off + 16];
    off += 16;
    let name_len = read_u32(raw, &mut off) as usize;
    let name_bytes = &raw[off..off + 256];

    let comm = String::from_utf8_lossy(&comm_bytes[..comm_bytes.iter().position(|b| *b == 0).unwrap_or(16)]).into_owned();
    let clipped = name_len.min(256);
    let name = String::from_utf8_lossy(&name_bytes[..clipped]).into_owned();

    Some(DenyEvent {
        cgroup_id,
        dev,
        ino,
        required_mask,
        hook: Hook::from_id(hook_id),
        comm,
        name,
    })
}

fn handle_event(raw: &[u8]) -> i32 {
    match decode(raw) {
        Some(event) => {
            debug!(
                "policy deny: cgroup={} hook={:?} dev={} ino={} mask={:#o} comm={} name={}",
                event.cgroup_id, event.hook, event.dev, event.ino, event.required_mask, event.comm, event.name
            );
        }
        None => {
            debug!("policy deny: malformed ring buffer record ({} bytes)", raw.len());
        }
    }
    0
}

/// Spawns the collector thread over both ring buffer file descriptors.
/// `shutdown` is polled every [`POLL_INTERVAL`]; setting it to `true` makes
/// the thread exit at the next wakeup.
pub fn spawn(fs_ringbuf_fd: i32, net_ringbuf_fd: i32, shutdown: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    let mut builder = RingBufferBuilder::new();
    builder
        .add_raw(fs_ringbuf_fd, handle_event)
        .map_err(EnforcementError::RingBuffer)?;
    builder
        .add_raw(net_ringbuf_fd, handle_event)
        .map_err(EnforcementError::RingBuffer)?;
    let ringbuf = builder.build().map_err(EnforcementError::RingBuffer)?;

    Ok(std::thread::spawn(move || {
        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = ringbuf.poll(POLL_INTERVAL) {
                debug!("deny-event ring buffer poll error: {}", e);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw(hook_id: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7u64.to_ne_bytes()); // cgroup_id
        buf.extend_from_slice(&8u64.to_ne_bytes()); // dev
        buf.extend_from_slice(&9u64.to_ne_bytes()); // ino
        buf.extend_from_slice(&2u32.to_ne_bytes()); // required_mask
        buf.extend_from_slice(&hook_id.to_ne_bytes());
        let mut comm = [0u8; 16];
        comm[..4].copy_from_slice(b"sh\0\0");
        buf.extend_from_slice(&comm);
        let name = b"nvme0n1p1";
        buf.extend_from_slice(&(name.len() as u32).to_ne_bytes());
        let mut name_buf = [0u8; 256];
        name_buf[..name.len()].copy_from_slice(name);
        buf.extend_from_slice(&name_buf);
        buf
    }

    #[test]
    fn decodes_a_well_formed_event() {
        let raw = sample_raw(1);
        let event = decode(&raw).unwrap();
        assert_eq!(*event.cgroup_id(), 7);
        assert_eq!(*event.dev(), 8);
        assert_eq!(*event.ino(), 9);
        assert_eq!(*event.hook(), Hook::FileOpen);
        assert_eq!(event.name(), "nvme0n1p1");
    }

    #[test]
    fn unknown_hook_id_is_preserved() {
        let raw = sample_raw(99);
        let event = decode(&raw).unwrap();
        assert_eq!(*event.hook(), Hook::Unknown(99));
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        assert!(decode(&[0u8; 4]).is_none());
    }
}
