//! Wire format and transport for the host/container control socket:
//! a fixed `{type, length}` header, per-command payload encode/decode, and
//! an `AF_UNIX`/`SOCK_DGRAM` transport that can carry `SCM_RIGHTS` fds.

pub mod command;
pub mod error;
pub mod payload;
pub mod socket;

pub use command::{CommandType, Header, CV_NS_COUNT, HEADER_LEN, MAX_FDS};
pub use error::{ProtocolError, Result};
pub use socket::ControlSocket;
