//! `containerv`'s command surface: a thin, explicit CLI over
//! [`container::ContainerManager`], not a general-purpose container
//! manager. Four subcommands, one per SPEC operation this binary exposes
//! as a manual testing harness.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "containerv", about = "Manual smoke-test harness for the containerv runtime")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Brings a new container up and stays in the foreground as its host
    /// monitor until it is destroyed or this process is signaled.
    Create(CreateArgs),
    /// Starts a process inside a running container.
    Spawn(SpawnArgs),
    /// Signals a container's monitor process to tear the container down.
    Destroy(DestroyArgs),
    /// Joins the calling process into a running container's namespaces
    /// and chroots into its rootfs.
    Join(JoinArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Path to the container's root filesystem.
    #[arg(long)]
    pub rootfs: PathBuf,

    /// Capability groups to grant, comma-separated
    /// (filesystem,network,process-control,ipc,cgroups,users).
    #[arg(long = "cap-group", value_delimiter = ',')]
    pub cap_groups: Vec<String>,

    #[arg(long = "memory-max")]
    pub memory_max: Option<String>,
    #[arg(long = "cpu-weight")]
    pub cpu_weight: Option<u32>,
    #[arg(long = "pids-max")]
    pub pids_max: Option<String>,

    /// `host:child:count` uid mapping, required when `users` is in
    /// `--cap-group`.
    #[arg(long = "uid-map")]
    pub uid_map: Option<String>,
    /// `host:child:count` gid mapping, required when `users` is in
    /// `--cap-group`.
    #[arg(long = "gid-map")]
    pub gid_map: Option<String>,

    /// `src:dst` bind mount, repeatable.
    #[arg(long = "bind")]
    pub binds: Vec<String>,

    #[arg(long = "seccomp", default_value = "standard", value_parser = ["standard", "paranoid"])]
    pub seccomp: String,
}

#[derive(clap::Args, Debug)]
pub struct SpawnArgs {
    pub id: String,
    /// Executable path inside the container.
    pub path: String,
    /// Remaining arguments, passed through to the spawned process.
    #[arg(trailing_var_arg = true)]
    pub argv: Vec<String>,
    #[arg(long, default_value_t = 0)]
    pub uid: i32,
    #[arg(long, default_value_t = 0)]
    pub gid: i32,
    /// Block until the spawned process exits and print its status.
    #[arg(long)]
    pub wait: bool,
}

#[derive(clap::Args, Debug)]
pub struct DestroyArgs {
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct JoinArgs {
    pub id: String,
}
