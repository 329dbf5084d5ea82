//! Policy map manager and deny-event collector: the BPF LSM enforcement
//! plane that turns a compiled [`policy::compiler::CompiledPolicy`] into
//! live kernel rules, and surfaces the decisions the kernel made back to
//! userspace as logged [`deny::DenyEvent`]s.
//!
//! [`PolicyMapManager`] is the crate's single entry point. Everything else
//! here — the generated skeleton glue in [`skel`], the pin-directory
//! lifecycle in [`pin`], the expected map ABIs in [`abi`] — is plumbing it
//! owns.

pub mod abi;
pub mod deny;
pub mod error;
pub mod manager;
pub mod pin;
mod skel;
pub mod tracker;

pub use deny::{DenyEvent, Hook};
pub use error::{EnforcementError, Result};
pub use manager::{MapMetrics, ManagerState, PolicyMapManager};
pub use pin::PIN_DIR;
