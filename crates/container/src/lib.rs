//! The container lifecycle engine (§4 "Lifecycle engine"): brings up a
//! container's namespaces/mounts/cgroup, speaks the host/child handshake
//! and control-socket protocol, and tears everything back down.
//!
//! [`manager::ContainerManager`] is the host-side entry point. [`child`]
//! and [`idle`] run inside the container process itself, after `fork` and
//! after chroot respectively.

pub mod child;
pub mod error;
pub mod handshake;
pub mod idle;
pub mod manager;
pub mod options;
pub mod state;
pub mod tracker;

pub use error::{ContainerError, Result};
pub use manager::{ContainerManager, ManagerConfig};
pub use options::{CreateOptions, IdMap, SpawnOptions};
pub use state::ContainerState;
pub use tracker::ContainerRecord;
