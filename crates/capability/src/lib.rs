//! Capability bitset manipulation, privilege transitions and classic-BPF
//! seccomp filter emission for a container's init process.

pub mod error;
pub mod privilege;
pub mod seccomp;

pub use error::{CapabilityError, Result};
pub use privilege::{apply_no_new_privs, drop_capabilities, switch_user_with_capabilities};
pub use seccomp::{apply_seccomp, ProfileLevel};
