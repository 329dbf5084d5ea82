//! The host-side container state machine (§4.E). Transitions are driven
//! entirely by [`crate::manager::ContainerManager`]; this module only
//! carries the vocabulary so log lines and tests can refer to states by
//! name.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    ChildRunning,
    SetupNs,
    ChildUpWait,
    Running,
    Destroying,
    Gone,
    Failed,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerState::Created => "CREATED",
            ContainerState::ChildRunning => "CHILD_RUNNING",
            ContainerState::SetupNs => "SETUP_NS",
            ContainerState::ChildUpWait => "CHILD_UP_WAIT",
            ContainerState::Running => "RUNNING",
            ContainerState::Destroying => "DESTROYING",
            ContainerState::Gone => "GONE",
            ContainerState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_state_machine_names() {
        assert_eq!(ContainerState::ChildUpWait.to_string(), "CHILD_UP_WAIT");
        assert_eq!(ContainerState::Gone.to_string(), "GONE");
    }
}
