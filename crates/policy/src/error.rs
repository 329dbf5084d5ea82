use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("hostname {0:?} is not a valid cgroup name")]
    InvalidHostname(String),

    #[error("failed to resolve cgroup id for {0:?}: {1}")]
    CgroupIdUnavailable(std::path::PathBuf, std::io::Error),

    #[error("basename pattern {pattern:?}: {reason}")]
    BadBasenamePattern { pattern: String, reason: String },

    #[error(
        "too many rules for basename bucket under parent {parent:?}: {count} > {max}"
    )]
    TooManyRules {
        parent: std::path::PathBuf,
        count: usize,
        max: usize,
    },

    #[error("unix socket path {0:?} exceeds the 107-byte limit")]
    UnixPathTooLong(String),
}

impl From<PolicyError> for common::Error {
    fn from(err: PolicyError) -> Self {
        match &err {
            PolicyError::InvalidHostname(_) => common::Error::InvalidArgument(err.to_string()),
            PolicyError::CgroupIdUnavailable(..) => {
                common::Error::NotAvailable(err.to_string())
            }
            PolicyError::BadBasenamePattern { .. } | PolicyError::UnixPathTooLong(_) => {
                common::Error::PolicyCompile(err.to_string())
            }
            PolicyError::TooManyRules { .. } => common::Error::Exhausted(err.to_string()),
        }
    }
}
