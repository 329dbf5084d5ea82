//! The policy rule sum type: file, directory and basename rules keyed by a
//! resolved `(dev, ino)` pair, plus network rules keyed by literal socket
//! fields. Mirrors the kernel map key/value shapes this compiles into.

use bitflags::bitflags;
use std::path::PathBuf;

bitflags! {
    /// Allow-mask for file/dir/basename rules.
    #[derive(Default)]
    pub struct FsAllow: u32 {
        const READ  = 0b001;
        const WRITE = 0b010;
        const EXEC  = 0b100;
    }
}

bitflags! {
    /// Allow-mask for net rules.
    #[derive(Default)]
    pub struct NetAllow: u32 {
        const CREATE  = 0b00_0001;
        const BIND    = 0b00_0010;
        const CONNECT = 0b00_0100;
        const LISTEN  = 0b00_1000;
        const ACCEPT  = 0b01_0000;
        const SEND    = 0b10_0000;
    }
}

bitflags! {
    /// Directory rule modifiers.
    #[derive(Default)]
    pub struct DirFlags: u32 {
        const CHILDREN_ONLY = 0b01;
        const RECURSIVE     = 0b10;
    }
}

/// A host path resolved relative to the container's rootfs when relative,
/// left absolute (host-rooted) otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRule {
    pub path: PathBuf,
    pub allow: FsAllow,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirRule {
    pub path: PathBuf,
    pub allow: FsAllow,
    pub flags: DirFlags,
}

/// One token in a basename pattern. `*` (tail wildcard) may only appear as
/// the final token of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BasenameToken {
    /// A literal run of characters; `?` inside it matches any single char.
    Literal(String),
    /// `[0-9]`: exactly one digit.
    SingleDigit,
    /// `[0-9]+`: one or more digits.
    OneOrMoreDigits,
    /// `*`: matches the rest of the basename. Only valid as the last token.
    TailWildcard,
}

pub const MAX_BASENAME_TOKENS: usize = 6;
pub const MAX_LITERAL_LEN: usize = 32;
pub const MAX_BASENAME_BUCKET: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasenameRule {
    pub parent: PathBuf,
    pub tokens: Vec<BasenameToken>,
    pub allow: FsAllow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressFamily {
    Inet,
    Inet6,
    Unix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SockKind {
    Stream,
    Dgram,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetRule {
    /// Allow creating a socket of this `(family, type, protocol)`.
    Create {
        family: AddressFamily,
        kind: SockKind,
        protocol: u32,
        allow: NetAllow,
    },
    /// Allow a specific 4-tuple (IPv4/IPv6).
    Tuple {
        family: AddressFamily,
        kind: SockKind,
        protocol: u32,
        port: u16,
        addr: [u8; 16],
        allow: NetAllow,
    },
    /// Allow a UNIX-domain socket at a fixed path (<=107 bytes).
    Unix {
        kind: SockKind,
        protocol: u32,
        path: String,
        allow: NetAllow,
    },
}

/// The full policy a container is started with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    pub files: Vec<FileRule>,
    pub dirs: Vec<DirRule>,
    pub basenames: Vec<BasenameRule>,
    pub nets: Vec<NetRule>,
}
