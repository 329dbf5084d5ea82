//! The in-container idle loop (§4.D, §5 "In-container: a single-threaded
//! idle loop on `poll(socket_fd)`"): serves one control-socket command to
//! completion before reading the next. Runs entirely inside the container's
//! mount/pid/user namespaces, after chroot, as the namespace's PID 1.

use crate::error::{ContainerError, Result};
use common::namespace::NamespaceKind;
use log::{debug, trace, warn};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use protocol::command::{CommandType, Header};
use protocol::payload::*;
use protocol::ControlSocket;
use std::collections::HashMap;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::path::Path;

/// Large enough for a `SPAWN` request carrying a handful of long argv/envp
/// entries, or a batch of upload/download paths.
const MAX_PAYLOAD: usize = 64 * 1024;

/// Set in `SpawnRequest::flags` when the caller wants `spawn` to block
/// until the process exits before reporting pid + exit status.
const SPAWN_FLAG_WAIT: u32 = 0b1;

/// Runs the dispatch loop until a `DESTROY` command arrives. Returns the
/// exit status to report on the child-to-host pipe's final `DOWN` event.
pub fn run(socket: &ControlSocket, rootfs: &Path) -> Result<i32> {
    let mut processes: HashMap<i32, Pid> = HashMap::new();

    loop {
        let (header, payload, fds, from) = socket.recv_from(MAX_PAYLOAD)?;
        let from = from.ok_or_else(|| {
            ContainerError::Handshake("control socket datagram carried no sender address".into())
        })?;
        let from = from
            .path()
            .ok_or_else(|| ContainerError::Handshake("client socket is not path-bound".into()))?
            .to_path_buf();

        trace!("idle loop: received {:?} ({} bytes)", header.ty, header.length);

        match header.ty {
            CommandType::GetRoot => handle_getroot(socket, &from, rootfs)?,
            CommandType::GetFds => handle_getfds(socket, &from, &payload)?,
            CommandType::Spawn => handle_spawn(socket, &from, &payload, &mut processes)?,
            CommandType::Kill => handle_kill(socket, &from, &payload, &mut processes)?,
            CommandType::Upload => handle_upload(socket, &from, &payload, fds)?,
            CommandType::Download => handle_download(socket, &from, &payload)?,
            CommandType::Destroy => {
                terminate_all(&processes);
                debug!("idle loop: DESTROY received, shutting down");
                return Ok(0);
            }
        }
    }
}

fn reply(socket: &ControlSocket, to: &Path, ty: CommandType, payload: &[u8]) -> Result<()> {
    let header = Header::new(ty, payload.len() as u32);
    socket.send_to(to, header, payload, &[]).map_err(ContainerError::from)
}

fn terminate_all(processes: &HashMap<i32, Pid>) {
    for pid in processes.values() {
        if let Err(e) = kill(*pid, Signal::SIGTERM) {
            warn!("SIGTERM to pid {} failed: {}", pid, e);
        }
    }
}

fn handle_getroot(socket: &ControlSocket, from: &Path, rootfs: &Path) -> Result<()> {
    let path = rootfs.to_string_lossy().into_owned();
    reply(socket, from, CommandType::GetRoot, &encode_getroot_reply(&path))
}

fn handle_getfds(socket: &ControlSocket, from: &Path, payload: &[u8]) -> Result<()> {
    let req = decode_getfds_request(payload)?;

    let mut available = Vec::new();
    let mut fds: Vec<RawFd> = Vec::new();
    let mut owned: Vec<OwnedFd> = Vec::new();

    for ty in &req.types {
        let Some(kind) = NamespaceKind::from_wire(*ty) else {
            continue;
        };
        let path = format!("/proc/self/ns/{}", kind.proc_name());
        match OpenOptions::new().read(true).open(&path) {
            Ok(file) => {
                let owned_fd: OwnedFd = file.into();
                fds.push(owned_fd.as_raw_fd());
                owned.push(owned_fd);
                available.push(*ty);
            }
            Err(e) => warn!("GETFDS: failed to open {}: {}", path, e),
        }
    }

    let reply_payload = encode_getfds_request(&GetFdsRequest { types: available });
    let header = Header::new(CommandType::GetFds, reply_payload.len() as u32);
    socket
        .send_to(from, header, &reply_payload, &fds)
        .map_err(ContainerError::from)
}

fn handle_spawn(
    socket: &ControlSocket,
    from: &Path,
    payload: &[u8],
    processes: &mut HashMap<i32, Pid>,
) -> Result<()> {
    let req = decode_spawn_request(payload)?;
    let wait = req.flags & SPAWN_FLAG_WAIT != 0;

    match spawn_process(&req) {
        Ok(pid) => {
            processes.insert(pid.as_raw(), pid);
            debug!("spawned {:?} as pid {}", req.path, pid);

            if wait {
                let status = wait_for_exit(pid)?;
                processes.remove(&pid.as_raw());
                let body = encode_spawn_reply_waited(pid.as_raw(), status);
                reply(socket, from, CommandType::Spawn, &body)
            } else {
                reply(socket, from, CommandType::Spawn, &encode_spawn_reply(pid.as_raw()))
            }
        }
        Err(errno) => {
            warn!("spawn of {:?} failed: {}", req.path, errno);
            reply(
                socket,
                from,
                CommandType::Spawn,
                &encode_spawn_reply(-(errno as i32)),
            )
        }
    }
}

fn spawn_process(req: &SpawnRequest) -> std::result::Result<Pid, nix::errno::Errno> {
    use nix::unistd::{execve, fork, ForkResult};

    match unsafe { fork() }? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            if req.uid >= 0 {
                if let Err(e) = capability::switch_user_with_capabilities(req.uid as u32, req.gid as u32) {
                    warn!("spawned process could not switch to uid {}: {}", req.uid, e);
                    std::process::exit(126);
                }
            }

            let path = match CString::new(req.path.as_str()) {
                Ok(p) => p,
                Err(_) => std::process::exit(127),
            };
            let mut argv = vec![path.clone()];
            argv.extend(req.argv.iter().filter_map(|a| CString::new(a.as_str()).ok()));
            let envp: Vec<CString> = req.envp.iter().filter_map(|e| CString::new(e.as_str()).ok()).collect();

            let _ = execve(&path, &argv, &envp);
            std::process::exit(127);
        }
    }
}

fn wait_for_exit(pid: Pid) -> Result<i32> {
    match waitpid(pid, None).map_err(ContainerError::Wait)? {
        WaitStatus::Exited(_, code) => Ok(code),
        WaitStatus::Signaled(_, sig, _) => Ok(128 + sig as i32),
        _ => Ok(-1),
    }
}

fn handle_kill(
    socket: &ControlSocket,
    from: &Path,
    payload: &[u8],
    processes: &mut HashMap<i32, Pid>,
) -> Result<()> {
    let pid = decode_kill_request(payload)?;
    let status = match processes.get(&pid) {
        Some(tracked) => match kill(*tracked, Signal::SIGTERM) {
            Ok(()) => {
                processes.remove(&pid);
                0
            }
            Err(errno) => -(errno as i32),
        },
        None => -(nix::errno::Errno::ESRCH as i32),
    };
    reply(socket, from, CommandType::Kill, &encode_kill_reply(status))
}

fn handle_upload(
    socket: &ControlSocket,
    from: &Path,
    payload: &[u8],
    fds: Vec<OwnedFd>,
) -> Result<()> {
    let paths = decode_path_list(payload)?;
    let mut statuses = Vec::with_capacity(paths.len());

    let mut fds = fds.into_iter();
    for path in &paths {
        let status = match fds.next() {
            Some(fd) => copy_into(fd, Path::new(path)).map(|_| 0).unwrap_or_else(|e| -io_errno(&e)),
            None => -(nix::errno::Errno::EINVAL as i32),
        };
        statuses.push(status);
    }

    reply(socket, from, CommandType::Upload, &encode_status_array(&statuses))
}

fn copy_into(fd: OwnedFd, dest: &Path) -> std::io::Result<()> {
    let mut src = File::from(fd);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = OpenOptions::new().write(true).create(true).truncate(true).open(dest)?;
    std::io::copy(&mut src, &mut out)?;
    Ok(())
}

fn handle_download(socket: &ControlSocket, from: &Path, payload: &[u8]) -> Result<()> {
    let paths = decode_path_list(payload)?;
    let mut statuses = Vec::with_capacity(paths.len());
    let mut fds: Vec<RawFd> = Vec::new();
    let mut owned: Vec<OwnedFd> = Vec::new();

    for path in &paths {
        match File::open(path) {
            Ok(file) => {
                let owned_fd: OwnedFd = file.into();
                fds.push(owned_fd.as_raw_fd());
                owned.push(owned_fd);
                statuses.push(0);
            }
            Err(e) => statuses.push(-io_errno(&e)),
        }
    }

    let body = encode_status_array(&statuses);
    let header = Header::new(CommandType::Download, body.len() as u32);
    socket.send_to(from, header, &body, &fds).map_err(ContainerError::from)
}

fn io_errno(err: &std::io::Error) -> i32 {
    err.raw_os_error().unwrap_or(libc::EIO)
}
