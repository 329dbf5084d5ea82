//! Namespace unshare and mount/chroot builder for a container's init
//! process. [`flags`] is pure translation logic, unit-testable without a
//! kernel; [`builder::bring_up`] is the syscall-driving orchestration that
//! actually unshares, mounts and chroots.

pub mod builder;
pub mod error;
pub mod flags;
pub mod mount;

pub use builder::{bring_up, finish_bring_up, unshare_only};
pub use error::{NamespaceError, Result};
pub use flags::{clone_flags_for, ms_flags_for, MountOptions};
pub use mount::{apply as apply_mount, bind_sys, mount_synthetic, MountSpec};
