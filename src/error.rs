//! Error types for the state machine

use std::fmt::Debug;
use thiserror::Error;

/// Result type alias for state machine operations
pub type Result<R, S, T> = std::result::Result<R, Error<S, T>>;

/// Errors that can occur while configuring or firing a state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error<S: Debug, T: Debug> {
    /// The trigger already has a behaviour registered on this state
    #[error("State {state:?} already has a transition for trigger {trigger:?}")]
    DuplicateTrigger {
        /// State being configured
        state: S,
        /// Trigger registered twice
        trigger: T,
    },

    /// Making `state` a substate of `parent` would close a loop
    #[error("State {state:?} cannot be a substate of {parent:?}: cycle in the state hierarchy")]
    Cycle {
        /// State being configured
        state: S,
        /// Requested parent
        parent: S,
    },

    /// The composite state already declares an initial substate
    #[error("State {0:?} already has an initial transition")]
    DuplicateInitialTransition(S),

    /// The declared initial substate is not a direct substate of the composite
    #[error("Initial transition of {state:?} targets {substate:?}, which is not one of its substates")]
    InvalidInitialTransition {
        /// Composite state
        state: S,
        /// Declared initial substate
        substate: S,
    },

    /// No state on the active chain accepts the trigger
    #[error("No valid leaving transitions are permitted from state {state:?} for trigger {trigger:?}")]
    UnhandledTrigger {
        /// Current state, unchanged
        state: S,
        /// Fired trigger
        trigger: T,
    },

    /// The machine was driven out of order
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl<S: Debug, T: Debug> Error<S, T> {
    /// Whether this error was raised while building a configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateTrigger { .. }
                | Error::Cycle { .. }
                | Error::DuplicateInitialTransition(_)
        )
    }
}
