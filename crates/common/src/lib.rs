//! Shared types, error kinds and logging helpers used by every containerv crate.

pub mod capability;
pub mod error;
pub mod logging;
pub mod namespace;
pub mod validate;

pub use capability::{CapabilityGroup, CapabilityGroups};
pub use error::Error;
pub use namespace::{Namespace, NamespaceKind};
