use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CgroupError>;

#[derive(Error, Debug)]
pub enum CgroupError {
    #[error("cgroup v2 is not mounted at {0}")]
    NotCgroupV2(PathBuf),

    #[error("writing {value:?} to {path:?} failed: {source}")]
    Write {
        path: PathBuf,
        value: String,
        #[source]
        source: std::io::Error,
    },

    #[error("creating cgroup directory {0:?} failed: {1}")]
    Create(PathBuf, std::io::Error),

    #[error("removing cgroup directory {0:?} failed: {1}")]
    Remove(PathBuf, std::io::Error),

    #[error("reading cgroup id (inode) of {0:?} failed: {1}")]
    Stat(PathBuf, std::io::Error),
}

impl From<CgroupError> for common::Error {
    fn from(err: CgroupError) -> Self {
        match &err {
            CgroupError::NotCgroupV2(path) => {
                common::Error::NotAvailable(format!("cgroup v2 unmounted at {}", path.display()))
            }
            CgroupError::Write { path, source, .. } => {
                common::Error::system_call_on("write", path.clone(), errno_of(source))
            }
            CgroupError::Create(path, source) => {
                common::Error::system_call_on("mkdir", path.clone(), errno_of(source))
            }
            CgroupError::Remove(path, source) => {
                common::Error::system_call_on("rmdir", path.clone(), errno_of(source))
            }
            CgroupError::Stat(path, source) => {
                common::Error::system_call_on("fstat", path.clone(), errno_of(source))
            }
        }
    }
}

fn errno_of(err: &std::io::Error) -> nix::errno::Errno {
    err.raw_os_error()
        .map(nix::errno::Errno::from_i32)
        .unwrap_or(nix::errno::Errno::EIO)
}
