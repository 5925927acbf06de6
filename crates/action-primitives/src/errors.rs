//! Error types for action primitives

use rosterbot_core_types::FlowError;
use thiserror::Error;

use crate::driver::DriverError;

/// Error types for action primitive operations
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ActionError {
    /// Wait operation timed out
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Every invocation strategy failed
    #[error("Action exhausted: {0}")]
    Exhausted(String),

    /// Driver reported a fault that polling cannot outgrow
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::WaitTimeout(_) | ActionError::Exhausted(_) => true,
            ActionError::Driver(err) => err.is_transient(),
        }
    }
}

impl From<ActionError> for FlowError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::WaitTimeout(what) => FlowError::NavigationTimeout(what),
            ActionError::Exhausted(what) => FlowError::ActionExhausted(what),
            ActionError::Driver(err) => FlowError::Driver(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterbot_core_types::{ErrorKind, NodeHandle};

    #[test]
    fn maps_into_flow_taxonomy() {
        let timeout: FlowError = ActionError::WaitTimeout("#table-body".into()).into();
        assert_eq!(timeout.kind(), ErrorKind::NavigationTimeout);

        let exhausted: FlowError = ActionError::Exhausted("#attendance".into()).into();
        assert_eq!(exhausted.kind(), ErrorKind::ActionExhausted);
    }

    #[test]
    fn stale_driver_errors_are_retryable() {
        let stale = ActionError::from(DriverError::Stale(NodeHandle("mem-4".into())));
        assert!(stale.is_retryable());
        let transport = ActionError::from(DriverError::Transport("connection reset".into()));
        assert!(!transport.is_retryable());
    }
}
