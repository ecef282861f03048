//! Chat message definitions
//!
//! A `Message` is what travels through a user's inbox and what the
//! connection handler writes back to the client. The kind only selects the
//! presentation tag (terminal colour); it has no effect on routing.

use std::fmt::{self, Display, Formatter};

use crossterm::style::Stylize;

use crate::error::AppError;

/// Category of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Presence changes, status confirmations, user listings
    Status,
    /// Private message copy (sender or recipient side)
    Private,
    /// Public broadcast
    Public,
    /// Help text and greetings
    Info,
    /// Notices about the connection itself, such as input being rejected
    Warning,
    /// Rejected operation
    Error,
}

/// A single message awaiting delivery to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

// Builder methods
impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Status, text)
    }

    pub fn private(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Private, text)
    }

    pub fn public(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Public, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }
}

/// Renders the text wrapped in its presentation tag.
/// Info and warning share a colour.
impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = self.text.as_str();
        match self.kind {
            MessageKind::Status => write!(f, "{}", text.blue()),
            MessageKind::Private => write!(f, "{}", text.green()),
            MessageKind::Public => write!(f, "{}", text.magenta()),
            MessageKind::Info | MessageKind::Warning => write!(f, "{}", text.yellow()),
            MessageKind::Error => write!(f, "{}", text.red()),
        }
    }
}

/// Convert AppError to an error message for client notification
impl From<AppError> for Message {
    fn from(err: AppError) -> Self {
        Message::error(format!("ERROR: {}", err))
    }
}
