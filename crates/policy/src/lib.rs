//! Compiles user-supplied filesystem/network policy rules into the kernel
//! map entries the enforcement plane installs before a container executes
//! untrusted code. Pure and synchronous: [`compiler::compile`] never
//! touches BPF, only `stat`s host paths and resolves a cgroup id.

pub mod compiler;
pub mod error;
pub mod types;

pub use compiler::{compile, matches_pattern, parse_pattern, resolve_cgroup_id, CompiledPolicy, MapEntry};
pub use error::{PolicyError, Result};
pub use types::{
    AddressFamily, BasenameRule, BasenameToken, DirFlags, DirRule, FileRule, FsAllow, NetAllow,
    NetRule, Policy, SockKind,
};
