use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NamespaceError>;

#[derive(Error, Debug)]
pub enum NamespaceError {
    #[error("unshare({flags:?}) failed: {source}")]
    Unshare {
        flags: String,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("mount {source_path:?} -> {target:?} (fstype {fstype:?}) failed: {source}")]
    Mount {
        source_path: Option<PathBuf>,
        target: PathBuf,
        fstype: Option<String>,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("chroot/chdir into {0:?} failed: {1}")]
    RootSwitch(PathBuf, #[source] nix::errno::Errno),

    #[error("mount destination {0:?} is not an absolute path")]
    NonAbsoluteDestination(PathBuf),

    #[error("failed to create mount target {0:?}: {1}")]
    CreateTarget(PathBuf, std::io::Error),
}

impl From<NamespaceError> for common::Error {
    fn from(err: NamespaceError) -> Self {
        match &err {
            NamespaceError::Unshare { source, .. } => {
                common::Error::system_call("unshare", *source)
            }
            NamespaceError::Mount { target, source, .. } => {
                common::Error::system_call_on("mount", target.clone(), *source)
            }
            NamespaceError::RootSwitch(path, source) => {
                common::Error::system_call_on("chroot", path.clone(), *source)
            }
            NamespaceError::NonAbsoluteDestination(_) | NamespaceError::CreateTarget(..) => {
                common::Error::InvalidArgument(err.to_string())
            }
        }
    }
}
