//! The in-container bring-up sequence (§4.E): everything that runs between
//! the host's `fork` and the container's idle loop taking over. Executes
//! entirely inside the process that will become the container's PID 1.

use crate::error::{ContainerError, Result};
use crate::handshake::{self, HandshakeEvent, IdMapRange};
use crate::idle;
use capability::ProfileLevel;
use common::capability::{CapabilityGroup, CapabilityGroups};
use log::{debug, warn};
use namespace::MountSpec;
use nix::unistd::{close, dup2, fork, getpid, setsid, ForkResult};
use std::os::unix::io::RawFd;
use std::path::Path;
use std::process;

/// Parameters for one container's in-child bring-up. Plain data rather
/// than a reference to [`crate::options::CreateOptions`] so this module
/// doesn't need to depend on the manager's view of a container.
pub struct ChildConfig<'a> {
    pub groups: CapabilityGroups,
    pub rootfs: &'a Path,
    pub runtime_dir: &'a Path,
    pub mounts: &'a [MountSpec],
    pub uid_map: IdMapRange,
    pub gid_map: IdMapRange,
    pub seccomp_level: ProfileLevel,
    pub child_to_host: RawFd,
    pub host_to_child: RawFd,
    pub stdout_w: RawFd,
    pub stderr_w: RawFd,
}

/// Runs bring-up to completion and never returns: the final step is always
/// `process::exit`, whether bring-up succeeded and the idle loop ran to a
/// `DESTROY`, or an earlier step failed.
pub fn run(cfg: ChildConfig) -> ! {
    match run_fallible(&cfg) {
        Ok(status) => {
            let _ = handshake::send(cfg.child_to_host, HandshakeEvent::Down(status));
            process::exit(status);
        }
        Err(e) => {
            warn!("container bring-up failed: {}", e);
            let _ = handshake::send(cfg.child_to_host, HandshakeEvent::Down(1));
            process::exit(1);
        }
    }
}

fn run_fallible(cfg: &ChildConfig) -> Result<i32> {
    redirect_logs(cfg.stdout_w, cfg.stderr_w)?;

    namespace::unshare_only(&cfg.groups)?;
    debug!("pid {}: namespaces unshared", getpid());

    if cfg.groups.contains(CapabilityGroup::Users) {
        run_id_map_handshake(cfg)?;
    }

    namespace::finish_bring_up(&cfg.groups, cfg.rootfs, cfg.runtime_dir, cfg.mounts)?;
    debug!("pid {}: mount/chroot bring-up finished", getpid());

    let socket_path = cfg.runtime_dir.join("control");
    let socket = protocol::ControlSocket::bind(&socket_path)?;

    capability::apply_no_new_privs()?;
    capability::drop_capabilities()?;
    capability::apply_seccomp(cfg.seccomp_level)?;
    debug!("pid {}: capabilities dropped, seccomp applied", getpid());

    become_pid_one()?;

    handshake::send(cfg.child_to_host, HandshakeEvent::Up)?;
    debug!("pid {}: entering idle loop as container init", getpid());

    idle::run(&socket, cfg.rootfs)
}

fn redirect_logs(stdout_w: RawFd, stderr_w: RawFd) -> Result<()> {
    dup2(stdout_w, libc::STDOUT_FILENO).map_err(|e| ContainerError::Syscall("dup2", e))?;
    dup2(stderr_w, libc::STDERR_FILENO).map_err(|e| ContainerError::Syscall("dup2", e))?;
    if stdout_w != libc::STDOUT_FILENO {
        let _ = close(stdout_w);
    }
    if stderr_w != libc::STDERR_FILENO {
        let _ = close(stderr_w);
    }
    Ok(())
}

fn run_id_map_handshake(cfg: &ChildConfig) -> Result<()> {
    handshake::send(cfg.child_to_host, HandshakeEvent::WaitingForNsSetup(0))?;
    match handshake::recv(cfg.host_to_child)? {
        HandshakeEvent::WaitingForNsSetup(0) => Ok(()),
        HandshakeEvent::WaitingForNsSetup(status) => Err(ContainerError::Handshake(format!(
            "host reported id map setup failure, status {}",
            status
        ))),
        other => Err(ContainerError::Handshake(format!(
            "expected WAITING_FOR_NS_SETUP ack, got {:?}",
            other
        ))),
    }
}

/// `unshare(CLONE_NEWPID)` only affects the calling process's *future*
/// children, not the caller itself. A `setsid`+`fork` here is what actually
/// puts a process at PID 1 of the new namespace: the surviving child is the
/// namespace's first process, the parent quits without touching the
/// control socket or either handshake pipe.
fn become_pid_one() -> Result<()> {
    setsid().map_err(|e| ContainerError::Syscall("setsid", e))?;
    match unsafe { fork() }.map_err(ContainerError::Fork)? {
        ForkResult::Parent { .. } => {
            // SAFETY: the other copy of every fd this process holds stays
            // open in the surviving child; this exit must not run any more
            // Rust destructors over shared state than unavoidable.
            unsafe { libc::_exit(0) };
        }
        ForkResult::Child => {
            debug!("pid {} is now init of its pid namespace", getpid());
            Ok(())
        }
    }
}
