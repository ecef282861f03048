//! User entry definition
//!
//! Represents a registered user with their status and inbox channel.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Message;
use crate::types::Username;

/// Receiving side of a user's inbox, owned by that user's connection
pub type Inbox = mpsc::UnboundedReceiver<Message>;

/// Registered user information
///
/// Holds the username, the current status and the sending side of the
/// user's inbox. Dropping the entry closes the inbox.
#[derive(Debug)]
pub struct UserEntry {
    /// Normalized username
    pub username: Username,
    /// Current status, always a member of the status vocabulary
    pub status: String,
    /// Registry -> connection message channel
    inbox: mpsc::UnboundedSender<Message>,
}

impl UserEntry {
    /// Create a new entry together with the receiving side of its inbox
    pub fn new(username: Username, status: impl Into<String>) -> (Self, Inbox) {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let entry = Self {
            username,
            status: status.into(),
            inbox,
        };
        (entry, receiver)
    }

    /// Enqueue a message for this user
    ///
    /// Returns an error if the connection already dropped its inbox.
    pub fn deliver(&self, msg: Message) -> Result<(), SendError> {
        self.inbox.send(msg).map_err(|_| SendError::ChannelClosed)
    }

    /// Snapshot row for user listings
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            status: self.status.clone(),
        }
    }
}

/// One row of the connected-users listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub username: Username,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let (entry, _inbox) = UserEntry::new(Username::from("alice"), "online");

        assert_eq!(entry.username.as_str(), "alice");
        assert_eq!(entry.status, "online");
        assert_eq!(entry.summary().status, "online");
    }

    #[test]
    fn test_deliver_fifo() {
        let (entry, mut inbox) = UserEntry::new(Username::from("alice"), "online");

        entry.deliver(Message::public("one")).unwrap();
        entry.deliver(Message::status("two")).unwrap();

        assert_eq!(inbox.try_recv().unwrap().text, "one");
        assert_eq!(inbox.try_recv().unwrap().text, "two");
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn test_deliver_after_inbox_dropped() {
        let (entry, inbox) = UserEntry::new(Username::from("alice"), "online");
        drop(inbox);

        assert!(matches!(
            entry.deliver(Message::public("lost")),
            Err(SendError::ChannelClosed)
        ));
    }
}
