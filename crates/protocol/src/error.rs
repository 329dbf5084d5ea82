use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("message too short: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unknown command type {0}")]
    UnknownCommand(u32),

    #[error("payload length {declared} in header does not match {actual} bytes received")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("a single message may carry at most {max} file descriptors, got {actual}")]
    TooManyFds { max: usize, actual: usize },

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("string field is missing its NUL terminator")]
    MissingNulTerminator,

    #[error("socket io error: {0}")]
    Io(#[source] std::io::Error),

    #[error("socket syscall failed: {0}")]
    Errno(#[source] nix::errno::Errno),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err)
    }
}

impl From<nix::errno::Errno> for ProtocolError {
    fn from(err: nix::errno::Errno) -> Self {
        ProtocolError::Errno(err)
    }
}

impl From<ProtocolError> for common::Error {
    fn from(err: ProtocolError) -> Self {
        match &err {
            ProtocolError::Errno(errno) => common::Error::system_call("socket", *errno),
            ProtocolError::Io(_) => common::Error::Handshake(err.to_string()),
            _ => common::Error::InvalidArgument(err.to_string()),
        }
    }
}
