use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContainerError>;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("invalid hostname {0:?}")]
    InvalidHostname(String),

    #[error("no such container {0:?}")]
    NotFound(String),

    #[error("container {0:?} already exists")]
    AlreadyExists(String),

    #[error("fork failed: {0}")]
    Fork(#[source] nix::errno::Errno),

    #[error("failed to create pipe: {0}")]
    Pipe(#[source] nix::errno::Errno),

    #[error("failed to create runtime directory {0:?}: {1}")]
    RuntimeDir(PathBuf, std::io::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("child exited before signaling UP (status {0})")]
    BringUpFailed(i32),

    #[error("uid/gid map write to {0:?} failed: {1}")]
    IdMapWrite(PathBuf, std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no container named {0:?} is tracked")]
    Gone(String),

    #[error(transparent)]
    Namespace(#[from] namespace::NamespaceError),

    #[error(transparent)]
    Capability(#[from] capability::CapabilityError),

    #[error(transparent)]
    Cgroup(#[from] cgroup::CgroupError),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error(transparent)]
    Policy(#[from] policy::PolicyError),

    #[error(transparent)]
    Enforcement(#[from] enforcement::EnforcementError),

    #[error("waitpid failed: {0}")]
    Wait(#[source] nix::errno::Errno),

    #[error("{0} failed: {1}")]
    Syscall(&'static str, #[source] nix::errno::Errno),
}

impl From<ContainerError> for common::Error {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::InvalidHostname(_)
            | ContainerError::NotFound(_)
            | ContainerError::AlreadyExists(_)
            | ContainerError::RuntimeDir(..)
            | ContainerError::IdMapWrite(..)
            | ContainerError::Gone(_) => common::Error::InvalidArgument(err.to_string()),
            ContainerError::Io(ref source) => {
                common::Error::system_call("io", errno_of(source))
            }
            ContainerError::Handshake(_) | ContainerError::BringUpFailed(_) => {
                common::Error::Handshake(err.to_string())
            }
            ContainerError::Fork(errno) | ContainerError::Pipe(errno) | ContainerError::Wait(errno) => {
                common::Error::system_call("container bring-up", errno)
            }
            ContainerError::Syscall(op, errno) => common::Error::system_call(op, errno),
            ContainerError::Namespace(e) => e.into(),
            ContainerError::Capability(e) => e.into(),
            ContainerError::Cgroup(e) => e.into(),
            ContainerError::Protocol(e) => e.into(),
            ContainerError::Policy(_) => common::Error::PolicyCompile(err.to_string()),
            ContainerError::Enforcement(_) => common::Error::NotAvailable(err.to_string()),
        }
    }
}

fn errno_of(err: &std::io::Error) -> nix::errno::Errno {
    err.raw_os_error()
        .map(nix::errno::Errno::from_i32)
        .unwrap_or(nix::errno::Errno::EIO)
}
