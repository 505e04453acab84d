//! Errors raised by the tree provider

use thiserror::Error;

/// Programmer-misuse and command errors
///
/// Absence conditions (no remotes, not signed in) are never errors; they
/// surface as placeholder action nodes instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// `initialize` was called on a provider that already has its collaborators
    #[error("Tree provider is already initialized")]
    AlreadyInitialized,

    /// An operation needs the collaborators passed to `initialize`
    #[error("Tree provider is not initialized")]
    NotInitialized,

    /// The provider was disposed
    #[error("Tree provider is disposed")]
    Disposed,

    /// A command id that the tree does not register
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A command was invoked with a missing or unusable argument
    #[error("Invalid argument for {command}: {reason}")]
    InvalidCommandArgument {
        command: &'static str,
        reason: String,
    },
}
