use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnforcementError>;

#[derive(Error, Debug)]
pub enum EnforcementError {
    #[error("BPF LSM is not enabled (the string \"bpf\" is absent from /sys/kernel/security/lsm)")]
    LsmUnavailable,

    #[error("failed to create BPF pin directory {0:?}: {1}")]
    PinDirCreate(PathBuf, std::io::Error),

    #[error("failed to open or load BPF skeleton {0}: {1}")]
    SkeletonLoad(&'static str, libbpf_rs::Error),

    #[error("failed to attach BPF program {0}: {1}")]
    Attach(&'static str, libbpf_rs::Error),

    #[error("pinned map {name} at {path:?} has ABI (type={found_type:?}, key_size={found_key}, value_size={found_value}), expected (type={expected_type:?}, key_size={expected_key}, value_size={expected_value})")]
    AbiMismatch {
        name: &'static str,
        path: PathBuf,
        found_type: libbpf_rs::MapType,
        found_key: u32,
        found_value: u32,
        expected_type: libbpf_rs::MapType,
        expected_key: u32,
        expected_value: u32,
    },

    #[error("failed to pin map {name} at {path:?}: {source}")]
    Pin {
        name: &'static str,
        path: PathBuf,
        source: libbpf_rs::Error,
    },

    #[error("failed to unlink stale pin {0:?}: {1}")]
    Unpin(PathBuf, std::io::Error),

    #[error("map {0} update failed: {1}")]
    MapUpdate(&'static str, libbpf_rs::Error),

    #[error("map {0} delete failed: {1}")]
    MapDelete(&'static str, libbpf_rs::Error),

    #[error("map {name} is at capacity ({max_entries} entries)")]
    Exhausted {
        name: &'static str,
        max_entries: u32,
    },

    #[error("policy compile error: {0}")]
    Policy(#[from] policy::PolicyError),

    #[error("ring buffer setup failed: {0}")]
    RingBuffer(libbpf_rs::Error),

    #[error("epoll setup for the deny thread failed: {0}")]
    Epoll(#[source] nix::errno::Errno),
}

impl From<EnforcementError> for common::Error {
    fn from(err: EnforcementError) -> Self {
        match &err {
            EnforcementError::LsmUnavailable | EnforcementError::PinDirCreate(..) => {
                common::Error::NotAvailable(err.to_string())
            }
            EnforcementError::AbiMismatch { .. } => common::Error::AbiMismatch(err.to_string()),
            EnforcementError::Exhausted { .. } => common::Error::Exhausted(err.to_string()),
            EnforcementError::Policy(_) => common::Error::PolicyCompile(err.to_string()),
            _ => common::Error::InvalidArgument(err.to_string()),
        }
    }
}
