//! The fixed set of control-socket commands and the `{type, length}` header
//! that precedes every message's payload.

use crate::error::{ProtocolError, Result};

/// Number of namespace kinds a `GETFDS` reply can carry, one fd slot per
/// [`common::namespace::NamespaceKind`] variant.
pub const CV_NS_COUNT: usize = 8;

/// Ancillary data is capped at this many file descriptors per message, the
/// conservative default most `SCM_RIGHTS` implementations impose.
pub const MAX_FDS: usize = 16;

/// Size in bytes of the wire header: two little-endian `u32`s.
pub const HEADER_LEN: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandType {
    GetRoot = 1,
    GetFds = 2,
    Spawn = 3,
    Kill = 4,
    Upload = 5,
    Download = 6,
    Destroy = 7,
}

impl CommandType {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(CommandType::GetRoot),
            2 => Ok(CommandType::GetFds),
            3 => Ok(CommandType::Spawn),
            4 => Ok(CommandType::Kill),
            5 => Ok(CommandType::Upload),
            6 => Ok(CommandType::Download),
            7 => Ok(CommandType::Destroy),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

/// The fixed-size header preceding every message's payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub ty: CommandType,
    pub length: u32,
}

impl Header {
    pub fn new(ty: CommandType, length: u32) -> Self {
        Self { ty, length }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.ty.as_u32().to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let ty = u32::from_le_bytes(bytes[0..4].try_into().expect("slice is 4 bytes"));
        let length = u32::from_le_bytes(bytes[4..8].try_into().expect("slice is 4 bytes"));
        Ok(Header {
            ty: CommandType::from_u32(ty)?,
            length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = Header::new(CommandType::Spawn, 42);
        let bytes = header.encode();
        assert_eq!(Header::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn decode_rejects_truncated_header() {
        let err = Header::decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[test]
    fn decode_rejects_unknown_command() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&99u32.to_le_bytes());
        let err = Header::decode(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(99)));
    }

    #[test]
    fn every_command_round_trips_through_u32() {
        for ty in [
            CommandType::GetRoot,
            CommandType::GetFds,
            CommandType::Spawn,
            CommandType::Kill,
            CommandType::Upload,
            CommandType::Download,
            CommandType::Destroy,
        ] {
            assert_eq!(CommandType::from_u32(ty.as_u32()).unwrap(), ty);
        }
    }
}
