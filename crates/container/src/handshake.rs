//! Host/child handshake over a pair of pipes (§4.E): the child emits
//! `WAITING_FOR_NS_SETUP` once it has unshared namespaces and needs the
//! host to write `/proc/<pid>/{uid_map,gid_map}`, the host acks with the
//! same event carrying a status code, the child aborts on nonzero, and on
//! successful bring-up the child emits `UP`. `DOWN` carries the child's
//! exit status on both bring-up failure and normal shutdown.

use crate::error::{ContainerError, Result};
use log::debug;
use nix::unistd::{read, write, Pid};
use std::os::unix::io::RawFd;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// Child→host: about to block for the uid/gid map write. Host→child:
    /// the ack, with `0` for success or a nonzero status on failure.
    WaitingForNsSetup(i32),
    /// Child→host: bring-up finished, the child has entered its idle loop.
    Up,
    /// Either direction: a terminal status. From the child this reports a
    /// bring-up failure or the shutdown status; the host never sends it.
    Down(i32),
}

const TAG_WAITING: u8 = 1;
const TAG_UP: u8 = 2;
const TAG_DOWN: u8 = 3;
const EVENT_LEN: usize = 5;

impl HandshakeEvent {
    fn encode(self) -> [u8; EVENT_LEN] {
        let mut buf = [0u8; EVENT_LEN];
        match self {
            HandshakeEvent::WaitingForNsSetup(status) => {
                buf[0] = TAG_WAITING;
                buf[1..5].copy_from_slice(&status.to_le_bytes());
            }
            HandshakeEvent::Up => buf[0] = TAG_UP,
            HandshakeEvent::Down(status) => {
                buf[0] = TAG_DOWN;
                buf[1..5].copy_from_slice(&status.to_le_bytes());
            }
        }
        buf
    }

    fn decode(buf: [u8; EVENT_LEN]) -> Result<Self> {
        let status = i32::from_le_bytes(buf[1..5].try_into().expect("4 bytes"));
        match buf[0] {
            TAG_WAITING => Ok(HandshakeEvent::WaitingForNsSetup(status)),
            TAG_UP => Ok(HandshakeEvent::Up),
            TAG_DOWN => Ok(HandshakeEvent::Down(status)),
            other => Err(ContainerError::Handshake(format!("unknown event tag {}", other))),
        }
    }
}

/// Writes `event` to `fd`, retrying on `EINTR`.
pub fn send(fd: RawFd, event: HandshakeEvent) -> Result<()> {
    let buf = event.encode();
    let mut off = 0;
    while off < buf.len() {
        match write(fd, &buf[off..]) {
            Ok(n) => off += n,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(ContainerError::Pipe(e)),
        }
    }
    Ok(())
}

/// Blocks until a full event has been read from `fd`. A `0`-byte read (the
/// peer closed its end) is reported as a handshake failure rather than a
/// truncated event, per §7's "peer pipe closed unexpectedly" taxonomy entry.
pub fn recv(fd: RawFd) -> Result<HandshakeEvent> {
    let mut buf = [0u8; EVENT_LEN];
    let mut off = 0;
    while off < buf.len() {
        match read(fd, &mut buf[off..]) {
            Ok(0) => return Err(ContainerError::Handshake("peer pipe closed unexpectedly".into())),
            Ok(n) => off += n,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(ContainerError::Pipe(e)),
        }
    }
    HandshakeEvent::decode(buf)
}

/// A host_start/child_start/count triple, written verbatim as one line to
/// `/proc/<pid>/{uid_map,gid_map}`. The kernel only accepts a single write
/// per map per process lifetime; callers must not call this twice for the
/// same pid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdMapRange {
    pub host_start: u32,
    pub child_start: u32,
    pub count: u32,
}

impl IdMapRange {
    fn line(&self) -> String {
        format!("{} {} {}\n", self.child_start, self.host_start, self.count)
    }
}

/// Writes `uid_map`/`gid_map` to the child's `/proc` entries. Must be
/// called exactly once, between the child's `WAITING_FOR_NS_SETUP` event
/// and the host's ack.
pub fn write_id_maps(pid: Pid, uid_map: IdMapRange, gid_map: IdMapRange) -> Result<()> {
    write_one(pid, "uid_map", uid_map)?;
    write_one(pid, "gid_map", gid_map)?;
    Ok(())
}

fn write_one(pid: Pid, file: &str, range: IdMapRange) -> Result<()> {
    let path = PathBuf::from(format!("/proc/{}/{}", pid, file));
    std::fs::write(&path, range.line()).map_err(|e| ContainerError::IdMapWrite(path.clone(), e))?;
    debug!("wrote {} for pid {}: {:?}", file, pid, range);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_event_round_trips_through_encode_decode() {
        let event = HandshakeEvent::WaitingForNsSetup(0);
        assert_eq!(HandshakeEvent::decode(event.encode()).unwrap(), event);
    }

    #[test]
    fn down_event_preserves_negative_status() {
        let event = HandshakeEvent::Down(-5);
        assert_eq!(HandshakeEvent::decode(event.encode()).unwrap(), event);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut buf = [0u8; EVENT_LEN];
        buf[0] = 99;
        assert!(matches!(HandshakeEvent::decode(buf), Err(ContainerError::Handshake(_))));
    }

    #[test]
    fn id_map_line_has_kernel_order_inside_then_outside_then_count() {
        let range = IdMapRange {
            host_start: 100000,
            child_start: 0,
            count: 65536,
        };
        assert_eq!(range.line(), "0 100000 65536\n");
    }
}
