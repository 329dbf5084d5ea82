//! Encode/decode for each command's payload. These operate on raw `&[u8]`
//! rather than a serialization crate because the layouts are a fixed C ABI
//! and every field's width matters for partial-read/write handling over a
//! datagram socket.

use crate::command::CV_NS_COUNT;
use crate::error::{ProtocolError, Result};

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let end = offset + 4;
    if bytes.len() < end {
        return Err(ProtocolError::Truncated {
            expected: end,
            actual: bytes.len(),
        });
    }
    Ok(u32::from_le_bytes(bytes[offset..end].try_into().expect("4 bytes")))
}

fn read_i32(bytes: &[u8], offset: usize) -> Result<i32> {
    read_u32(bytes, offset).map(|v| v as i32)
}

/// `GETROOT` reply: a NUL-terminated rootfs path string.
pub fn encode_getroot_reply(rootfs: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(rootfs.len() + 1);
    buf.extend_from_slice(rootfs.as_bytes());
    buf.push(0);
    buf
}

pub fn decode_getroot_reply(bytes: &[u8]) -> Result<String> {
    decode_cstring(bytes)
}

fn decode_cstring(bytes: &[u8]) -> Result<String> {
    let nul_pos = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or(ProtocolError::MissingNulTerminator)?;
    std::str::from_utf8(&bytes[..nul_pos])
        .map(str::to_string)
        .map_err(|_| ProtocolError::InvalidUtf8)
}

/// `GETFDS` request: `{count: u32, types: [u32; CV_NS_COUNT]}`. `count` is
/// how many of the leading `types` entries are populated; the rest are
/// padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetFdsRequest {
    pub types: Vec<u32>,
}

pub fn encode_getfds_request(req: &GetFdsRequest) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + CV_NS_COUNT * 4);
    buf.extend_from_slice(&(req.types.len() as u32).to_le_bytes());
    for i in 0..CV_NS_COUNT {
        let v = req.types.get(i).copied().unwrap_or(0);
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn decode_getfds_request(bytes: &[u8]) -> Result<GetFdsRequest> {
    let count = read_u32(bytes, 0)? as usize;
    if count > CV_NS_COUNT {
        return Err(ProtocolError::TooManyFds {
            max: CV_NS_COUNT,
            actual: count,
        });
    }
    let mut types = Vec::with_capacity(count);
    for i in 0..count {
        types.push(read_u32(bytes, 4 + i * 4)?);
    }
    Ok(GetFdsRequest { types })
}

/// `SPAWN` request: `{path_len, arg_len, env_len, path…, argv…, envp…, uid,
/// gid, flags}`. `argv`/`envp` are each a flat run of NUL-terminated
/// strings whose total byte length is `arg_len`/`env_len`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub path: String,
    pub argv: Vec<String>,
    pub envp: Vec<String>,
    pub uid: i32,
    pub gid: i32,
    pub flags: u32,
}

fn encode_nul_joined(strings: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    for s in strings {
        buf.extend_from_slice(s.as_bytes());
        buf.push(0);
    }
    buf
}

fn decode_nul_joined(bytes: &[u8]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let rel_nul = bytes[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtocolError::MissingNulTerminator)?;
        let s = std::str::from_utf8(&bytes[start..start + rel_nul])
            .map_err(|_| ProtocolError::InvalidUtf8)?;
        out.push(s.to_string());
        start += rel_nul + 1;
    }
    Ok(out)
}

pub fn encode_spawn_request(req: &SpawnRequest) -> Vec<u8> {
    let path_bytes = encode_nul_joined(std::slice::from_ref(&req.path));
    let arg_bytes = encode_nul_joined(&req.argv);
    let env_bytes = encode_nul_joined(&req.envp);

    let mut buf = Vec::with_capacity(12 + path_bytes.len() + arg_bytes.len() + env_bytes.len() + 12);
    buf.extend_from_slice(&(path_bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(arg_bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(env_bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&path_bytes);
    buf.extend_from_slice(&arg_bytes);
    buf.extend_from_slice(&env_bytes);
    buf.extend_from_slice(&req.uid.to_le_bytes());
    buf.extend_from_slice(&req.gid.to_le_bytes());
    buf.extend_from_slice(&req.flags.to_le_bytes());
    buf
}

pub fn decode_spawn_request(bytes: &[u8]) -> Result<SpawnRequest> {
    let path_len = read_u32(bytes, 0)? as usize;
    let arg_len = read_u32(bytes, 4)? as usize;
    let env_len = read_u32(bytes, 8)? as usize;

    let mut offset = 12;
    let path_end = offset + path_len;
    let path_field = slice(bytes, offset, path_end)?;
    offset = path_end;

    let arg_end = offset + arg_len;
    let arg_field = slice(bytes, offset, arg_end)?;
    offset = arg_end;

    let env_end = offset + env_len;
    let env_field = slice(bytes, offset, env_end)?;
    offset = env_end;

    let uid = read_i32(bytes, offset)?;
    let gid = read_i32(bytes, offset + 4)?;
    let flags = read_u32(bytes, offset + 8)?;

    let mut path_strings = decode_nul_joined(path_field)?;
    if path_strings.len() != 1 {
        return Err(ProtocolError::InvalidUtf8);
    }
    let path = path_strings.remove(0);

    Ok(SpawnRequest {
        path,
        argv: decode_nul_joined(arg_field)?,
        envp: decode_nul_joined(env_field)?,
        uid,
        gid,
        flags,
    })
}

fn slice(bytes: &[u8], start: usize, end: usize) -> Result<&[u8]> {
    if bytes.len() < end {
        return Err(ProtocolError::Truncated {
            expected: end,
            actual: bytes.len(),
        });
    }
    Ok(&bytes[start..end])
}

/// `SPAWN` reply: the child pid, or a negative `errno` on failure.
pub fn encode_spawn_reply(pid_or_negative_errno: i32) -> Vec<u8> {
    pid_or_negative_errno.to_le_bytes().to_vec()
}

pub fn decode_spawn_reply(bytes: &[u8]) -> Result<i32> {
    read_i32(bytes, 0)
}

/// Extended `SPAWN` reply used when the request's `wait` flag was set: the
/// pid followed by its exit status, collected in-container before replying
/// so the caller's synchronous `spawn` doesn't need a second round trip.
/// Absent the wait flag, only the 4-byte pid form
/// ([`encode_spawn_reply`]/[`decode_spawn_reply`]) is sent.
pub fn encode_spawn_reply_waited(pid_or_negative_errno: i32, exit_status: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8);
    buf.extend_from_slice(&pid_or_negative_errno.to_le_bytes());
    buf.extend_from_slice(&exit_status.to_le_bytes());
    buf
}

/// Decodes either reply shape: 4 bytes is a bare pid (no exit status), 8
/// bytes is pid + exit status.
pub fn decode_spawn_reply_ext(bytes: &[u8]) -> Result<(i32, Option<i32>)> {
    let pid = read_i32(bytes, 0)?;
    if bytes.len() >= 8 {
        Ok((pid, Some(read_i32(bytes, 4)?)))
    } else {
        Ok((pid, None))
    }
}

/// `KILL` request: the target pid.
pub fn encode_kill_request(pid: i32) -> Vec<u8> {
    pid.to_le_bytes().to_vec()
}

pub fn decode_kill_request(bytes: &[u8]) -> Result<i32> {
    read_i32(bytes, 0)
}

/// `KILL` reply: `0` on success, a negative `errno` otherwise.
pub fn encode_kill_reply(status: i32) -> Vec<u8> {
    status.to_le_bytes().to_vec()
}

pub fn decode_kill_reply(bytes: &[u8]) -> Result<i32> {
    read_i32(bytes, 0)
}

/// `UPLOAD`/`DOWNLOAD` request: a flat run of NUL-terminated file paths.
/// The accompanying ancillary data (host-opened read fds for `UPLOAD`,
/// none for `DOWNLOAD`) travels alongside via `SCM_RIGHTS`, not in this
/// payload.
pub fn encode_path_list(paths: &[String]) -> Vec<u8> {
    encode_nul_joined(paths)
}

pub fn decode_path_list(bytes: &[u8]) -> Result<Vec<String>> {
    decode_nul_joined(bytes)
}

/// Per-file status reply shared by `UPLOAD` and `DOWNLOAD`: one `i32` per
/// requested path, `0` for success or a negative `errno`.
pub fn encode_status_array(statuses: &[i32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(statuses.len() * 4);
    for s in statuses {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

pub fn decode_status_array(bytes: &[u8]) -> Result<Vec<i32>> {
    if bytes.len() % 4 != 0 {
        return Err(ProtocolError::LengthMismatch {
            declared: bytes.len() as u32,
            actual: bytes.len(),
        });
    }
    bytes
        .chunks_exact(4)
        .map(|c| Ok(i32::from_le_bytes(c.try_into().expect("4 bytes"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getroot_round_trips() {
        let bytes = encode_getroot_reply("/run/containerv/c-abc/root");
        assert_eq!(
            decode_getroot_reply(&bytes).unwrap(),
            "/run/containerv/c-abc/root"
        );
    }

    #[test]
    fn getroot_missing_nul_is_rejected() {
        assert!(matches!(
            decode_getroot_reply(b"no-terminator"),
            Err(ProtocolError::MissingNulTerminator)
        ));
    }

    #[test]
    fn getfds_round_trips() {
        let req = GetFdsRequest {
            types: vec![1, 2, 3],
        };
        let bytes = encode_getfds_request(&req);
        assert_eq!(decode_getfds_request(&bytes).unwrap(), req);
    }

    #[test]
    fn getfds_rejects_over_capacity_count() {
        let mut bytes = vec![0u8; 4 + CV_NS_COUNT * 4];
        bytes[0..4].copy_from_slice(&((CV_NS_COUNT as u32) + 1).to_le_bytes());
        assert!(matches!(
            decode_getfds_request(&bytes),
            Err(ProtocolError::TooManyFds { .. })
        ));
    }

    #[test]
    fn spawn_request_round_trips() {
        let req = SpawnRequest {
            path: "/bin/true".into(),
            argv: vec!["true".into(), "--flag".into()],
            envp: vec!["PATH=/usr/bin".into()],
            uid: 1000,
            gid: 1000,
            flags: 0,
        };
        let bytes = encode_spawn_request(&req);
        assert_eq!(decode_spawn_request(&bytes).unwrap(), req);
    }

    #[test]
    fn spawn_request_with_empty_argv_envp_round_trips() {
        let req = SpawnRequest {
            path: "/bin/true".into(),
            argv: vec![],
            envp: vec![],
            uid: -1,
            gid: -1,
            flags: 0,
        };
        let bytes = encode_spawn_request(&req);
        assert_eq!(decode_spawn_request(&bytes).unwrap(), req);
    }

    #[test]
    fn spawn_reply_round_trips_negative_errno() {
        let bytes = encode_spawn_reply(-2);
        assert_eq!(decode_spawn_reply(&bytes).unwrap(), -2);
    }

    #[test]
    fn spawn_reply_waited_round_trips_pid_and_status() {
        let bytes = encode_spawn_reply_waited(4242, 0);
        assert_eq!(decode_spawn_reply_ext(&bytes).unwrap(), (4242, Some(0)));
    }

    #[test]
    fn spawn_reply_ext_decodes_bare_pid_form() {
        let bytes = encode_spawn_reply(4242);
        assert_eq!(decode_spawn_reply_ext(&bytes).unwrap(), (4242, None));
    }

    #[test]
    fn kill_request_and_reply_round_trip() {
        assert_eq!(decode_kill_request(&encode_kill_request(4242)).unwrap(), 4242);
        assert_eq!(decode_kill_reply(&encode_kill_reply(0)).unwrap(), 0);
    }

    #[test]
    fn path_list_round_trips() {
        let paths = vec!["/a/b".to_string(), "/c/d/e".to_string()];
        let bytes = encode_path_list(&paths);
        assert_eq!(decode_path_list(&bytes).unwrap(), paths);
    }

    #[test]
    fn status_array_round_trips() {
        let statuses = vec![0, -1, -13];
        let bytes = encode_status_array(&statuses);
        assert_eq!(decode_status_array(&bytes).unwrap(), statuses);
    }

    #[test]
    fn status_array_rejects_misaligned_length() {
        assert!(matches!(
            decode_status_array(&[0u8, 1, 2]),
            Err(ProtocolError::LengthMismatch { .. })
        ));
    }
}
