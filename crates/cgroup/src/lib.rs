//! cgroup v2 controller and resource usage monitoring.
//!
//! [`CgroupController`] owns the directory lifecycle (create, apply
//! limits, attach the init pid, remove); [`UsageMonitor`] reads the same
//! directory back out for periodic usage reporting.

pub mod controller;
pub mod error;
pub mod limits;
pub mod monitor;

pub use controller::CgroupController;
pub use error::{CgroupError, Result};
pub use limits::CgroupLimits;
pub use monitor::{Usage, UsageMonitor};
