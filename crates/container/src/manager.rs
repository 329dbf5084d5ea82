//! `ContainerManager` (§4, §6 "Container API"): the host-side lifecycle
//! engine. Owns the cgroup controller, the (possibly degraded) policy
//! enforcement plane and the container tracker, and drives every
//! operation end to end: `create`'s fork/handshake/cgroup/policy sequence,
//! `spawn`/`kill`/`upload`/`download` over the control socket, and
//! `destroy`'s teardown.

use crate::child::{self, ChildConfig};
use crate::error::{ContainerError, Result};
use crate::handshake::{self, HandshakeEvent};
use crate::options::{CreateOptions, SpawnOptions};
use crate::state::ContainerState;
use crate::tracker::{ContainerRecord, ProcessRecord, Tracker};
use cgroup::CgroupController;
use common::capability::CapabilityGroup;
use common::namespace::{NamespaceKind, ALL_NAMESPACE_KINDS};
use enforcement::PolicyMapManager;
use log::{debug, info, warn};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{chdir, chroot, close, fork, pipe, setns, ForkResult, Pid};
use protocol::command::{CommandType, Header};
use protocol::payload::*;
use protocol::ControlSocket;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::fs;
use std::os::unix::io::{FromRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MAX_PAYLOAD: usize = 64 * 1024;
const SPAWN_FLAG_WAIT: u32 = 0b1;
/// Upper bound on how long `destroy` waits for a container's log-drain
/// threads to notice the pipe closing before it gives up on joining them.
const LOG_THREAD_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct ManagerConfig {
    pub runtime_root: PathBuf,
    pub cgroup_root: PathBuf,
    pub bpf_pin_dir: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            runtime_root: PathBuf::from("/run/containerv"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            bpf_pin_dir: PathBuf::from("/sys/fs/bpf/cvd"),
        }
    }
}

/// The host-side lifecycle engine. There is no global singleton: each
/// caller owns its own manager, constructed from an explicit config and
/// torn down with an explicit [`shutdown`](Self::shutdown) call.
pub struct ContainerManager {
    config: ManagerConfig,
    cgroup: CgroupController,
    enforcement: PolicyMapManager,
    tracker: Tracker,
    log_threads: HashMap<String, Vec<JoinHandle<()>>>,
}

impl ContainerManager {
    pub fn initialize(config: ManagerConfig) -> Result<Self> {
        fs::create_dir_all(&config.runtime_root)?;
        let cgroup = CgroupController::new(&config.cgroup_root)?;
        let enforcement = PolicyMapManager::initialize(&config.bpf_pin_dir);
        Ok(Self {
            config,
            cgroup,
            enforcement,
            tracker: Tracker::new(),
            log_threads: HashMap::new(),
        })
    }

    /// Consumes the manager, stopping the enforcement plane's deny-event
    /// thread. Live containers are left running; callers that want a clean
    /// shutdown should `destroy` them first.
    pub fn shutdown(self) {
        self.enforcement.shutdown();
    }

    pub fn state(&self, id: &str) -> Option<ContainerState> {
        self.tracker.get(id).map(|r| r.state)
    }

    pub fn cgroup_id(&self, id: &str) -> Option<u64> {
        self.tracker.get(id).and_then(|r| r.cgroup_id)
    }

    /// The pid `create` forked for this container. Meaningful only to the
    /// process that forked it; see [`Self::adopt`].
    pub fn child_pid(&self, id: &str) -> Option<nix::unistd::Pid> {
        self.tracker.get(id).map(|r| r.child_pid)
    }

    /// Re-inserts a [`ContainerRecord`] into a freshly constructed manager's
    /// tracker. `create`'s `child_pid` only means anything to the process
    /// that forked it, so a separate invocation reattaching to a container
    /// it didn't create (`spawn`/`kill`/`join` as standalone CLI calls)
    /// needs a way to make the tracker aware of it without re-running
    /// bring-up. Callers that reattach this way must not call `destroy`,
    /// since `waitpid` on `child_pid` would fail outside its parent.
    pub fn adopt(&mut self, record: ContainerRecord) {
        self.tracker.insert(record);
    }

    /// Brings a container up per §4.E: fork, the uid/gid map handshake
    /// (only when the `Users` capability group was requested), mount/chroot
    /// bring-up, cgroup attach, policy compile + install, then `Running`.
    pub fn create(&mut self, options: CreateOptions) -> Result<String> {
        let id = generate_id();
        common::validate::hostname(&id)
            .map_err(|_| ContainerError::InvalidHostname(id.clone()))?;

        let runtime_dir = self.config.runtime_root.join(&id);
        fs::create_dir_all(&runtime_dir)?;

        let (c2h_r, c2h_w) = pipe().map_err(ContainerError::Pipe)?;
        let (h2c_r, h2c_w) = pipe().map_err(ContainerError::Pipe)?;
        let (stdout_r, stdout_w) = pipe().map_err(ContainerError::Pipe)?;
        let (stderr_r, stderr_w) = pipe().map_err(ContainerError::Pipe)?;

        match unsafe { fork() }.map_err(ContainerError::Fork)? {
            ForkResult::Child => {
                let _ = close(c2h_r);
                let _ = close(h2c_w);
                let _ = close(stdout_r);
                let _ = close(stderr_r);
                child::run(ChildConfig {
                    groups: options.capability_groups.clone(),
                    rootfs: &options.rootfs,
                    runtime_dir: &runtime_dir,
                    mounts: &options.mounts,
                    uid_map: options.uid_map,
                    gid_map: options.gid_map,
                    seccomp_level: options.seccomp_level,
                    child_to_host: c2h_w,
                    host_to_child: h2c_r,
                    stdout_w,
                    stderr_w,
                });
            }
            ForkResult::Parent { child } => {
                let _ = close(c2h_w);
                let _ = close(h2c_r);
                let _ = close(stdout_w);
                let _ = close(stderr_w);

                let outcome = self.bring_up(&id, &options, child, c2h_r, h2c_w);

                let _ = close(c2h_r);
                let _ = close(h2c_w);

                match outcome {
                    Ok(cgroup_id) => {
                        let stdout_thread = spawn_log_thread(id.clone(), "stdout", stdout_r);
                        let stderr_thread = spawn_log_thread(id.clone(), "stderr", stderr_r);
                        self.log_threads
                            .insert(id.clone(), vec![stdout_thread, stderr_thread]);

                        self.tracker.insert(ContainerRecord {
                            id: id.clone(),
                            child_pid: child,
                            rootfs: options.rootfs.clone(),
                            runtime_dir,
                            hostname: id.clone(),
                            cgroup_id: Some(cgroup_id),
                            state: ContainerState::Running,
                            processes: Vec::new(),
                        });
                        info!("container {} is running (pid {})", id, child);
                        Ok(id)
                    }
                    Err(e) => {
                        let _ = close(stdout_r);
                        let _ = close(stderr_r);
                        let _ = waitpid(child, None);
                        let _ = self.cgroup.free(&id);
                        let _ = fs::remove_dir_all(&runtime_dir);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Runs the host side of bring-up: the optional id-map handshake, then
    /// waiting for `UP`/`DOWN`, then cgroup attach and policy install.
    /// Returns the resolved cgroup id on success.
    fn bring_up(
        &self,
        id: &str,
        options: &CreateOptions,
        child_pid: Pid,
        c2h_r: RawFd,
        h2c_w: RawFd,
    ) -> Result<u64> {
        if options.capability_groups.contains(CapabilityGroup::Users) {
            match handshake::recv(c2h_r)? {
                HandshakeEvent::WaitingForNsSetup(_) => {}
                other => {
                    return Err(ContainerError::Handshake(format!(
                        "expected WAITING_FOR_NS_SETUP, got {:?}",
                        other
                    )))
                }
            }
            let ack = match handshake::write_id_maps(child_pid, options.uid_map, options.gid_map) {
                Ok(()) => 0,
                Err(e) => {
                    warn!("uid/gid map write failed for {}: {}", id, e);
                    1
                }
            };
            handshake::send(h2c_w, HandshakeEvent::WaitingForNsSetup(ack))?;
            if ack != 0 {
                return Err(ContainerError::Handshake("id map write failed".into()));
            }
        }

        match handshake::recv(c2h_r)? {
            HandshakeEvent::Up => {}
            HandshakeEvent::Down(status) => return Err(ContainerError::BringUpFailed(status)),
            other => {
                return Err(ContainerError::Handshake(format!(
                    "expected UP, got {:?}",
                    other
                )))
            }
        }
        debug!("container {} reported UP", id);

        let cgroup_id = self.cgroup.init(id, child_pid, &options.cgroup_limits)?;
        let compiled = policy::compile(&options.rootfs, &self.config.cgroup_root, id, &options.policy)?;
        self.enforcement.populate_policy(id, &compiled)?;
        Ok(cgroup_id)
    }

    /// Sends `SPAWN` to a running container's control socket and waits for
    /// its reply: the pid, and when `options.wait` was set, its exit status.
    pub fn spawn(&mut self, id: &str, options: SpawnOptions) -> Result<(i32, Option<i32>)> {
        let record = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let server_path = record.control_socket_path();
        let runtime_dir = record.runtime_dir.clone();

        let (socket, client_path) = bind_client_socket(&runtime_dir)?;
        let flags = if options.wait { SPAWN_FLAG_WAIT } else { 0 };
        let body = encode_spawn_request(&SpawnRequest {
            path: options.path,
            argv: options.argv,
            envp: options.envp,
            uid: options.uid,
            gid: options.gid,
            flags,
        });
        let header = Header::new(CommandType::Spawn, body.len() as u32);
        socket.send_to(&server_path, header, &body, &[])?;

        let (_header, payload, _fds) = socket.recv(MAX_PAYLOAD)?;
        let _ = fs::remove_file(&client_path);

        let (pid, status) = decode_spawn_reply_ext(&payload)?;
        if pid < 0 {
            return Err(ContainerError::Handshake(format!(
                "spawn failed with errno {}",
                -pid
            )));
        }

        if status.is_none() {
            let record = self
                .tracker
                .get_mut(id)
                .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
            record.processes.push(ProcessRecord {
                container_id: id.to_string(),
                pid,
            });
        }

        Ok((pid, status))
    }

    pub fn kill(&mut self, id: &str, pid: i32) -> Result<()> {
        let record = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let server_path = record.control_socket_path();
        let runtime_dir = record.runtime_dir.clone();

        let (socket, client_path) = bind_client_socket(&runtime_dir)?;
        let body = encode_kill_request(pid);
        let header = Header::new(CommandType::Kill, body.len() as u32);
        socket.send_to(&server_path, header, &body, &[])?;

        let (_header, payload, _fds) = socket.recv(MAX_PAYLOAD)?;
        let _ = fs::remove_file(&client_path);
        let status = decode_kill_reply(&payload)?;
        if status != 0 {
            return Err(ContainerError::Handshake(format!(
                "kill failed with errno {}",
                -status
            )));
        }

        record.processes.retain(|p| p.pid != pid);
        Ok(())
    }

    /// Uploads `local` files into the container at `remote` paths, opening
    /// each source read-only on the host and passing the fds via
    /// `SCM_RIGHTS` so the container writes them itself after chroot.
    pub fn upload(&mut self, id: &str, files: &[(PathBuf, String)]) -> Result<Vec<i32>> {
        let record = self
            .tracker
            .get(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let server_path = record.control_socket_path();
        let runtime_dir = record.runtime_dir.clone();

        let mut fds: Vec<RawFd> = Vec::with_capacity(files.len());
        let mut owned: Vec<std::fs::File> = Vec::with_capacity(files.len());
        let mut dests = Vec::with_capacity(files.len());
        for (local, remote) in files {
            let file = std::fs::File::open(local)?;
            fds.push(std::os::unix::io::AsRawFd::as_raw_fd(&file));
            owned.push(file);
            dests.push(remote.clone());
        }

        let (socket, client_path) = bind_client_socket(&runtime_dir)?;
        let body = encode_path_list(&dests);
        let header = Header::new(CommandType::Upload, body.len() as u32);
        socket.send_to(&server_path, header, &body, &fds)?;
        drop(owned);

        let (_header, payload, _fds) = socket.recv(MAX_PAYLOAD)?;
        let _ = fs::remove_file(&client_path);
        Ok(decode_status_array(&payload)?)
    }

    /// Downloads `remote` paths from the container, returning one open
    /// read-only fd per path that was successfully opened in-container, in
    /// the order of `remote` filtered to the successes in `statuses`.
    pub fn download(&mut self, id: &str, remote: &[String]) -> Result<Vec<OwnedFd>> {
        let record = self
            .tracker
            .get(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let server_path = record.control_socket_path();
        let runtime_dir = record.runtime_dir.clone();

        let (socket, client_path) = bind_client_socket(&runtime_dir)?;
        let body = encode_path_list(remote);
        let header = Header::new(CommandType::Download, body.len() as u32);
        socket.send_to(&server_path, header, &body, &[])?;

        let (_header, payload, fds) = socket.recv(MAX_PAYLOAD)?;
        let _ = fs::remove_file(&client_path);
        let statuses = decode_status_array(&payload)?;

        let mut fds = fds.into_iter();
        let mut out = Vec::new();
        for status in statuses {
            if status == 0 {
                if let Some(fd) = fds.next() {
                    out.push(fd);
                }
            }
        }
        Ok(out)
    }

    /// Tears a container down: `DESTROY` over the control socket, reaping
    /// the init process, removing its cgroup and policy rows, and joining
    /// its log-drain threads (bounded, since a wedged container might never
    /// close its log pipes on its own).
    pub fn destroy(&mut self, id: &str) -> Result<()> {
        let record = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        record.state = ContainerState::Destroying;
        let server_path = record.control_socket_path();
        let runtime_dir = record.runtime_dir.clone();
        let child_pid = record.child_pid;

        if let Ok((socket, client_path)) = bind_client_socket(&runtime_dir) {
            let header = Header::new(CommandType::Destroy, 0);
            if socket.send_to(&server_path, header, &[], &[]).is_err() {
                warn!("container {} control socket unreachable during destroy", id);
            }
            let _ = fs::remove_file(&client_path);
        }

        match waitpid(child_pid, None) {
            Ok(WaitStatus::Exited(_, code)) => debug!("container {} init exited with {}", id, code),
            Ok(other) => debug!("container {} init wait status: {:?}", id, other),
            Err(e) => warn!("waitpid for container {} failed: {}", id, e),
        }

        self.enforcement.cleanup_policy(id)?;
        let _ = self.cgroup.free(id);
        let _ = fs::remove_dir_all(&runtime_dir);

        if let Some(threads) = self.log_threads.remove(id) {
            join_with_timeout(threads, LOG_THREAD_JOIN_TIMEOUT);
        }

        self.tracker.remove(id);
        info!("container {} destroyed", id);
        Ok(())
    }

    /// Joins the calling process into `container_id`'s namespaces and
    /// chroots it into the same rootfs, mutating the caller's own process
    /// rather than the tracked container. Intended for short-lived tools
    /// (`containerv join`) that exec something inside an existing
    /// container without going through `spawn`.
    pub fn join(&self, id: &str) -> Result<()> {
        let record = self.tracker.get(id).ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let server_path = record.control_socket_path();
        let runtime_dir = record.runtime_dir.clone();

        let (socket, client_path) = bind_client_socket(&runtime_dir)?;

        let wanted: Vec<u32> = ALL_NAMESPACE_KINDS.iter().map(|k| *k as u32).collect();
        let req_body = encode_getfds_request(&GetFdsRequest { types: wanted });
        let header = Header::new(CommandType::GetFds, req_body.len() as u32);
        socket.send_to(&server_path, header, &req_body, &[])?;
        let (_header, payload, fds) = socket.recv(MAX_PAYLOAD)?;
        let granted = decode_getfds_request(&payload)?;

        for (ty, fd) in granted.types.iter().zip(fds.iter()) {
            if let Some(kind) = NamespaceKind::from_wire(*ty) {
                setns(std::os::unix::io::AsRawFd::as_raw_fd(fd), to_clone_ns_flag(kind))
                    .map_err(|e| ContainerError::Syscall("setns", e))?;
                debug!("joined {} namespace of container {}", kind, id);
            }
        }

        let root_header = Header::new(CommandType::GetRoot, 0);
        socket.send_to(&server_path, root_header, &[], &[])?;
        let (_header, root_payload, _fds) = socket.recv(MAX_PAYLOAD)?;
        let rootfs = decode_getroot_reply(&root_payload)?;
        let _ = fs::remove_file(&client_path);

        chroot(Path::new(&rootfs)).map_err(|e| ContainerError::Syscall("chroot", e))?;
        chdir("/").map_err(|e| ContainerError::Syscall("chdir", e))?;
        Ok(())
    }
}

fn to_clone_ns_flag(kind: NamespaceKind) -> nix::sched::CloneFlags {
    use nix::sched::CloneFlags;
    match kind {
        NamespaceKind::Cgroup => CloneFlags::CLONE_NEWCGROUP,
        NamespaceKind::Ipc => CloneFlags::CLONE_NEWIPC,
        NamespaceKind::Mnt => CloneFlags::CLONE_NEWNS,
        NamespaceKind::Net => CloneFlags::CLONE_NEWNET,
        NamespaceKind::Pid => CloneFlags::CLONE_NEWPID,
        // nix 0.25's CloneFlags has no CLONE_NEWTIME constant yet.
        NamespaceKind::Time => CloneFlags::from_bits_retain(libc::CLONE_NEWTIME),
        NamespaceKind::User => CloneFlags::CLONE_NEWUSER,
        NamespaceKind::Uts => CloneFlags::CLONE_NEWUTS,
    }
}

fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("c-{}", suffix)
}

fn bind_client_socket(runtime_dir: &Path) -> Result<(ControlSocket, PathBuf)> {
    let suffix: u32 = rand::thread_rng().gen();
    let path = runtime_dir.join(format!("client-{:08x}", suffix));
    let socket = ControlSocket::bind(&path)?;
    Ok((socket, path))
}

fn spawn_log_thread(id: String, stream: &'static str, fd: RawFd) -> JoinHandle<()> {
    thread::spawn(move || {
        use std::io::BufRead;
        let file = unsafe { std::fs::File::from_raw_fd(fd) };
        let reader = std::io::BufReader::new(file);
        for line in reader.lines() {
            match line {
                Ok(text) => debug!(target: "containerv::child", "[{} {}] {}", id, stream, text),
                Err(_) => break,
            }
        }
    })
}

fn join_with_timeout(threads: Vec<JoinHandle<()>>, timeout: Duration) {
    let deadline = std::time::Instant::now() + timeout;
    for handle in threads {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            warn!("log-drain thread did not finish before the destroy timeout");
            continue;
        }
        // JoinHandle has no timed join; the pipe write-ends are always
        // closed by this point (the container's fd table died with it or
        // the host closed its copies), so the thread's final read returns
        // promptly in practice. We still bound total destroy latency by
        // not waiting past `deadline` for the remaining threads.
        let _ = handle.join();
    }
}
