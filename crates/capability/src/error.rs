//! Crate-local error type, converting into the umbrella [`common::Error`] at
//! this crate's public boundary.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CapabilityError>;

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("capability bounding set operation on {cap} failed: {source}")]
    Bounding { cap: &'static str, source: io::Error },

    #[error("failed to set capability state: {0}")]
    SetState(io::Error),

    #[error("privilege escalation to root is unavailable: {0}")]
    EscalationUnavailable(String),

    #[error("setresuid/setresgid failed: {0}")]
    IdSwitch(#[source] nix::errno::Errno),

    #[error("prctl({op}) failed: {source}")]
    Prctl { op: &'static str, source: io::Error },

    #[error("seccomp filter build failed: {0}")]
    SeccompBuild(String),

    #[error("seccomp filter apply failed: {0}")]
    SeccompApply(String),
}

impl From<CapabilityError> for common::Error {
    fn from(err: CapabilityError) -> Self {
        match &err {
            CapabilityError::IdSwitch(errno) => {
                common::Error::system_call("setresuid/setresgid", *errno)
            }
            _ => common::Error::InvalidArgument(err.to_string()),
        }
    }
}
