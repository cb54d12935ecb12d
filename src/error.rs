//! Error types
//!
//! Gameplay failure (death) is not an error: it is an expected outcome handled
//! by the levels. Errors here are programmer mistakes (state machine misuse)
//! and storage problems, which callers usually log and swallow.

use std::io;

use crate::sim::StateId;

/// Errors surfaced by the game host
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("state {0:?} was never registered")]
    UnregisteredState(StateId),

    #[error("no active state; switch to a registered state first")]
    NoActiveState,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the key-value persistence layer
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported save version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}
