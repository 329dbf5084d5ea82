//! The umbrella error kind every crate-local error converts into at its
//! public boundary.

use nix::errno::Errno;
use std::error::Error as StdError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The seven error kinds from the error handling design. Every subsystem
/// returns one of these, carrying enough context to explain itself in a log
/// line without the caller needing to know which subsystem produced it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed hostname, oversize rule, null required input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// BPF-LSM absent, cgroup v2 unmounted, pin dir unwritable. The enforce
    /// layer degrades to a no-op rather than failing the caller.
    #[error("not available: {0}")]
    NotAvailable(String),

    /// Map capacity reached, fd-passing count > 16, basename bucket > 8.
    #[error("exhausted: {0}")]
    Exhausted(String),

    /// Peer pipe closed unexpectedly, or the child process is gone.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// An underlying syscall failed; `errno` is preserved when known.
    #[error("system call {call} failed on {}: {source}", path.as_deref().map(|p| p.display().to_string()).unwrap_or_default())]
    SystemCall {
        call: &'static str,
        path: Option<PathBuf>,
        #[source]
        source: Errno,
    },

    /// A pinned map had an unexpected key/value size or type; the caller
    /// already unlinked and recreated it by the time this surfaces.
    #[error("pinned map ABI mismatch: {0}")]
    AbiMismatch(String),

    /// A policy rule's path could not be resolved to `(dev, ino)`. Not
    /// fatal: the rule is skipped and this is logged as a warning.
    #[error("policy compile: {0}")]
    PolicyCompile(String),
}

impl Error {
    pub fn system_call(call: &'static str, errno: Errno) -> Self {
        Error::SystemCall {
            call,
            path: None,
            source: errno,
        }
    }

    pub fn system_call_on(call: &'static str, path: impl Into<PathBuf>, errno: Errno) -> Self {
        Error::SystemCall {
            call,
            path: Some(path.into()),
            source: errno,
        }
    }

    /// The subsystem exit code carried in the low byte of the process exit
    /// status, per §7 ("fatal failures exit with a nonzero status whose low
    /// byte carries the originating subsystem's error code").
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidArgument(_) => 1,
            Error::NotAvailable(_) => 2,
            Error::Exhausted(_) => 3,
            Error::Handshake(_) => 4,
            Error::SystemCall { .. } => 5,
            Error::AbiMismatch(_) => 6,
            Error::PolicyCompile(_) => 7,
        }
    }
}

/// Render an error and its full `source()` chain as a single colon-joined
/// string, the way operators expect to see it in a single structured log
/// line.
pub fn chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut cur = err.source();
    while let Some(src) = cur {
        parts.push(src.to_string());
        cur = src.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(thiserror::Error, Debug)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn chain_joins_source_stack() {
        let err = Outer(Inner);
        assert_eq!(chain(&err), "outer: inner");
    }

    #[test]
    fn exit_code_is_stable_per_kind() {
        assert_eq!(Error::InvalidArgument("x".into()).exit_code(), 1);
        assert_eq!(Error::PolicyCompile("x".into()).exit_code(), 7);
    }
}
