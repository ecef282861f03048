//! Error types for the chat server
//!
//! Defines application-level errors and inbox delivery errors.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Username;

/// Application-level errors
///
/// Covers both fatal errors (connection or process termination) and
/// chat errors (rendered as an error message to the offending client).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Incoming line exceeded the codec limit (fatal for the connection)
    #[error("Line exceeds maximum length ({0} bytes)")]
    LineTooLong(usize),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Configuration file could not be read
    #[error("Failed to read config at {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("Failed to parse config at {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration parsed but is unusable
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Username is already held by another connection
    #[error("A user with that username is already connected. Try again...")]
    UserTaken(Username),

    /// Username is not (or no longer) registered
    #[error("User is not connected.")]
    NotConnected(Username),

    /// Requested status is outside the configured vocabulary
    #[error("Status '{status}' is not allowed. Choose one from {}.", allowed.join(", "))]
    InvalidStatus {
        status: String,
        allowed: Vec<String>,
    },

    /// Private message addressed to the sender
    #[error("You can't send private messages to yourself.")]
    SelfMessage,

    /// Private message addressed to a user that is not connected
    #[error("No such user: {0}")]
    UnknownRecipient(Username),
}

impl AppError {
    /// Chat errors are reported to the client; everything else ends the connection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::UserTaken(_)
                | AppError::NotConnected(_)
                | AppError::InvalidStatus { .. }
                | AppError::SelfMessage
                | AppError::UnknownRecipient(_)
        )
    }
}

/// Inbox delivery errors
///
/// Occurs when the receiving connection has already dropped its inbox.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
