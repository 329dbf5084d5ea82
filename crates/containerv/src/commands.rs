//! The implementation behind each [`crate::cli::Command`] variant. `create`
//! owns the container it forks and stays in the foreground as its host
//! monitor; `spawn`/`destroy`/`join` are short-lived invocations that
//! reattach to an already-running container through its persisted
//! [`MonitorState`] rather than their own tracker entry.

use anyhow::{anyhow, bail, Context, Result};
use capability::ProfileLevel;
use cgroup::CgroupLimits;
use common::capability::{CapabilityGroup, CapabilityGroups};
use container::{ContainerManager, CreateOptions, IdMap, SpawnOptions};
use namespace::flags::MountOptions;
use namespace::mount::MountSpec;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::Pid;
use policy::Policy;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cli::{CreateArgs, DestroyArgs, JoinArgs, SpawnArgs};
use crate::config::Config;
use crate::state::MonitorState;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Brings a container up and blocks until it is told to tear down, either
/// by `containerv destroy` signaling this process or by SIGINT/SIGTERM
/// from a terminal. This process is the container's host monitor: it, and
/// only it, can reap the `child_pid` it forked.
pub fn create(config: &Config, args: CreateArgs) -> Result<()> {
    let mut manager = ContainerManager::initialize(config.manager_config())
        .context("initializing container manager")?;

    let capability_groups: CapabilityGroups = args
        .cap_groups
        .iter()
        .map(|s| {
            CapabilityGroup::from_str(s).map_err(|_| anyhow!("unknown capability group {:?}", s))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .collect();

    let wants_users = capability_groups.contains(CapabilityGroup::Users);
    let uid_map = parse_id_map(args.uid_map.as_deref(), wants_users)?;
    let gid_map = parse_id_map(args.gid_map.as_deref(), wants_users)?;

    let mounts = args
        .binds
        .iter()
        .map(|spec| parse_bind(spec))
        .collect::<Result<Vec<_>>>()?;

    let seccomp_level = match args.seccomp.as_str() {
        "standard" => ProfileLevel::Standard,
        "paranoid" => ProfileLevel::Paranoid,
        other => bail!("unknown seccomp level {:?}", other),
    };

    let rootfs = args.rootfs.clone();
    let options = CreateOptions {
        rootfs: args.rootfs,
        capability_groups,
        cgroup_limits: CgroupLimits::new(args.memory_max, args.cpu_weight, args.pids_max),
        mounts,
        policy: Policy::default(),
        uid_map,
        gid_map,
        seccomp_level,
    };

    let id = manager.create(options).context("bringing container up")?;
    println!("{}", id);

    let runtime_dir = config.runtime_root().join(&id);
    let state = MonitorState {
        id: id.clone(),
        monitor_pid: std::process::id() as i32,
        child_pid: std::process::id() as i32,
        runtime_dir: runtime_dir.clone(),
        rootfs,
        hostname: id.clone(),
        cgroup_id: manager.cgroup_id(&id),
    };
    state.save().context("persisting monitor state")?;

    install_shutdown_handlers()?;
    log::info!("containerv: monitoring container {} (pid {})", id, std::process::id());
    while !SHUTDOWN.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    log::info!("containerv: shutting down container {}", id);
    manager.destroy(&id).context("destroying container on shutdown")?;
    MonitorState::remove(&runtime_dir);
    manager.shutdown();
    Ok(())
}

pub fn spawn(config: &Config, args: SpawnArgs) -> Result<()> {
    let mut manager = ContainerManager::initialize(config.manager_config())?;
    let runtime_dir = config.runtime_root().join(&args.id);
    let state = MonitorState::load(&runtime_dir)
        .with_context(|| format!("no running container {:?}", args.id))?;
    manager.adopt(state.to_record());

    let options = SpawnOptions {
        path: args.path,
        argv: args.argv,
        envp: Vec::new(),
        uid: args.uid,
        gid: args.gid,
        wait: args.wait,
    };
    let (pid, status) = manager.spawn(&args.id, options)?;
    match status {
        Some(code) => println!("pid {} exited with status {}", pid, code),
        None => println!("pid {}", pid),
    }
    Ok(())
}

/// Signals the monitor process that owns `id` to destroy its container,
/// then waits (briefly and best-effort) for the runtime directory to go
/// away as confirmation.
pub fn destroy(config: &Config, args: DestroyArgs) -> Result<()> {
    let runtime_dir = config.runtime_root().join(&args.id);
    let state = MonitorState::load(&runtime_dir)
        .with_context(|| format!("no running container {:?}", args.id))?;

    signal::kill(Pid::from_raw(state.monitor_pid), Signal::SIGTERM)
        .with_context(|| format!("signaling monitor process {}", state.monitor_pid))?;

    for _ in 0..50 {
        if !runtime_dir.exists() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    log::warn!(
        "containerv: monitor {} for container {} did not exit within 5s",
        state.monitor_pid,
        args.id
    );
    Ok(())
}

pub fn join(config: &Config, args: JoinArgs) -> Result<()> {
    let mut manager = ContainerManager::initialize(config.manager_config())?;
    let runtime_dir = config.runtime_root().join(&args.id);
    let state = MonitorState::load(&runtime_dir)
        .with_context(|| format!("no running container {:?}", args.id))?;
    manager.adopt(state.to_record());
    manager.join(&args.id).context("joining container namespaces")
}

fn parse_id_map(spec: Option<&str>, required: bool) -> Result<IdMap> {
    match spec {
        Some(s) => {
            let parts: Vec<&str> = s.split(':').collect();
            let [host_start, child_start, count] = parts[..] else {
                bail!("id map {:?} must be host:child:count", s);
            };
            Ok(IdMap {
                host_start: host_start.parse().context("id map host_start")?,
                child_start: child_start.parse().context("id map child_start")?,
                count: count.parse().context("id map count")?,
            })
        }
        None if required => bail!("--cap-group users requires --uid-map and --gid-map"),
        None => Ok(IdMap {
            host_start: 0,
            child_start: 0,
            count: 0,
        }),
    }
}

fn parse_bind(spec: &str) -> Result<MountSpec> {
    let (src, dst) = spec
        .split_once(':')
        .ok_or_else(|| anyhow!("bind mount {:?} must be src:dst", spec))?;
    Ok(MountSpec::new(
        src,
        dst,
        None,
        MountOptions {
            bind: true,
            recursive: true,
            readonly: false,
            create: true,
        },
    ))
}

fn install_shutdown_handlers() -> Result<()> {
    unsafe {
        signal::signal(Signal::SIGTERM, SigHandler::Handler(request_shutdown))
            .context("installing SIGTERM handler")?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(request_shutdown))
            .context("installing SIGINT handler")?;
    }
    Ok(())
}
