//! User registry and message router
//!
//! The single source of truth for who is connected. Owned by the
//! `ChatServer` actor, so every operation here runs to completion before the
//! next one starts.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::AppError;
use crate::message::Message;
use crate::types::{StatusList, Username};
use crate::user::{Inbox, UserEntry, UserSummary};

/// Registered users keyed by username
#[derive(Debug)]
pub struct Registry {
    users: HashMap<Username, UserEntry>,
    statuses: StatusList,
}

impl Registry {
    pub fn new(statuses: StatusList) -> Self {
        Self {
            users: HashMap::new(),
            statuses,
        }
    }

    /// Register a user and announce the arrival to everyone, the new user included
    ///
    /// Returns the receiving side of the new user's inbox.
    pub fn join(&mut self, username: Username) -> Result<Inbox, AppError> {
        if self.users.contains_key(&username) {
            return Err(AppError::UserTaken(username));
        }

        let (entry, inbox) = UserEntry::new(username.clone(), self.statuses.default_status());
        self.users.insert(username.clone(), entry);
        info!("User {} joined", username);

        self.broadcast(Message::status(format!("{} joined", username)));
        debug!("Total users: {}", self.users.len());
        Ok(inbox)
    }

    /// Remove a user and announce the departure to the remaining users
    ///
    /// The entry (and with it the inbox) is gone before the broadcast, so
    /// the departing user never sees their own "left" message.
    pub fn leave(&mut self, username: &Username) {
        if self.users.remove(username).is_none() {
            return;
        }
        info!("User {} left", username);

        self.broadcast(Message::status(format!("{} left", username)));
        debug!("Total users: {}", self.users.len());
    }

    /// Change a user's status and confirm it to that user only
    pub fn set_status(&mut self, username: &Username, status: &str) -> Result<(), AppError> {
        let Some(entry) = self.users.get_mut(username) else {
            return Err(AppError::NotConnected(username.clone()));
        };

        if !self.statuses.contains(status) {
            return Err(AppError::InvalidStatus {
                status: status.to_string(),
                allowed: self.statuses.as_slice().to_vec(),
            });
        }

        entry.status = status.to_string();
        info!("User {} set status to '{}'", username, status);

        Self::deliver(entry, Message::status(format!("Updated status to {}.", status)));
        Ok(())
    }

    /// Route a chat message
    ///
    /// With a recipient, exactly two inboxes receive a private copy: the
    /// recipient's and the sender's. Without one, every connected inbox
    /// receives the public message, the sender's included.
    pub fn send_message(
        &mut self,
        sender: &Username,
        text: &str,
        recipient: Option<&Username>,
    ) -> Result<(), AppError> {
        if recipient == Some(sender) {
            return Err(AppError::SelfMessage);
        }

        let Some(from) = self.users.get(sender) else {
            return Err(AppError::NotConnected(sender.clone()));
        };

        match recipient {
            Some(recipient) => {
                let Some(to) = self.users.get(recipient) else {
                    return Err(AppError::UnknownRecipient(recipient.clone()));
                };

                Self::deliver(
                    to,
                    Message::private(format!("Private message from {}: {}", sender, text)),
                );
                Self::deliver(
                    from,
                    Message::private(format!("Private message to {}: {}", recipient, text)),
                );
                info!("Private message from {} to {}: {}", sender, recipient, text);
            }
            None => {
                let message = format!("Public message from {}: {}", sender, text);
                info!("{}", message);
                self.broadcast(Message::public(message));
            }
        }

        Ok(())
    }

    /// Snapshot of connected users and their statuses, sorted by name
    pub fn users(&self) -> Vec<UserSummary> {
        let mut users: Vec<UserSummary> = self.users.values().map(UserEntry::summary).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    pub fn contains(&self, username: &Username) -> bool {
        self.users.contains_key(username)
    }

    pub fn status_of(&self, username: &Username) -> Option<&str> {
        self.users.get(username).map(|entry| entry.status.as_str())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Helper: enqueue a copy of the message in every inbox
    fn broadcast(&self, msg: Message) {
        for entry in self.users.values() {
            Self::deliver(entry, msg.clone());
        }
    }

    /// Helper: enqueue in one inbox
    ///
    /// A closed inbox belongs to a session that is already closing and will
    /// leave shortly, so the message is dropped.
    fn deliver(entry: &UserEntry, msg: Message) {
        if entry.deliver(msg).is_err() {
            debug!("Inbox of {} already closed", entry.username);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use tokio::sync::mpsc::error::TryRecvError;

    fn name(s: &str) -> Username {
        Username::from(s)
    }

    fn drain(inbox: &mut Inbox) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(msg) = inbox.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[test]
    fn test_join_announces_to_everyone() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        let mut bob = registry.join(name("bob")).unwrap();

        let alice_msgs = drain(&mut alice);
        assert_eq!(alice_msgs.len(), 2);
        assert_eq!(alice_msgs[1], Message::status("bob joined"));

        let bob_msgs = drain(&mut bob);
        assert_eq!(bob_msgs, vec![Message::status("bob joined")]);
        assert_eq!(registry.status_of(&name("bob")), Some("online"));
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut registry = Registry::new(StatusList::default());
        let _alice = registry.join(name("alice")).unwrap();
        registry.set_status(&name("alice"), "away").unwrap();

        let err = registry.join(name("alice")).unwrap_err();
        assert!(matches!(err, AppError::UserTaken(ref n) if n.as_str() == "alice"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.status_of(&name("alice")), Some("away"));
    }

    #[test]
    fn test_leave_excludes_departing_user() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        let mut bob = registry.join(name("bob")).unwrap();
        drain(&mut alice);
        drain(&mut bob);

        registry.leave(&name("bob"));

        assert!(!registry.contains(&name("bob")));
        assert_eq!(drain(&mut alice), vec![Message::status("bob left")]);
        // Bob's sender half was dropped with the entry
        assert!(matches!(bob.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn test_leave_unknown_is_noop() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        drain(&mut alice);

        registry.leave(&name("nobody"));
        assert!(drain(&mut alice).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_status_confirms_to_owner_only() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        let mut bob = registry.join(name("bob")).unwrap();
        drain(&mut alice);
        drain(&mut bob);

        registry.set_status(&name("alice"), "away").unwrap();

        assert_eq!(registry.status_of(&name("alice")), Some("away"));
        assert_eq!(
            drain(&mut alice),
            vec![Message::status("Updated status to away.")]
        );
        assert!(drain(&mut bob).is_empty());
    }

    #[test]
    fn test_closed_inbox_does_not_fail_operations() {
        let mut registry = Registry::new(StatusList::default());
        let alice = registry.join(name("alice")).unwrap();
        let mut bob = registry.join(name("bob")).unwrap();
        drain(&mut bob);
        drop(alice);

        registry.set_status(&name("alice"), "busy").unwrap();
        assert_eq!(registry.status_of(&name("alice")), Some("busy"));

        registry
            .send_message(&name("alice"), "still here", Some(&name("bob")))
            .unwrap();
        registry.send_message(&name("bob"), "hi", None).unwrap();
        assert_eq!(
            drain(&mut bob),
            vec![
                Message::private("Private message from alice: still here"),
                Message::public("Public message from bob: hi"),
            ]
        );
    }

    #[test]
    fn test_set_status_rejects_unknown_value() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        drain(&mut alice);

        let err = registry.set_status(&name("alice"), "sleeping").unwrap_err();
        match err {
            AppError::InvalidStatus { status, allowed } => {
                assert_eq!(status, "sleeping");
                assert_eq!(allowed, vec!["online", "away", "busy"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.status_of(&name("alice")), Some("online"));
        assert!(drain(&mut alice).is_empty());
    }

    #[test]
    fn test_set_status_not_connected() {
        let mut registry = Registry::new(StatusList::default());
        let err = registry.set_status(&name("ghost"), "away").unwrap_err();
        assert!(matches!(err, AppError::NotConnected(_)));
    }

    #[test]
    fn test_public_fan_out_includes_sender() {
        let mut registry = Registry::new(StatusList::default());
        let mut inboxes: Vec<Inbox> = ["alice", "bob", "carol"]
            .iter()
            .map(|n| registry.join(name(n)).unwrap())
            .collect();
        inboxes.iter_mut().for_each(|inbox| {
            drain(inbox);
        });

        registry.send_message(&name("alice"), "hi", None).unwrap();

        for inbox in inboxes.iter_mut() {
            let msgs = drain(inbox);
            assert_eq!(msgs.len(), 1);
            assert_eq!(msgs[0].kind, MessageKind::Public);
            assert_eq!(msgs[0].text, "Public message from alice: hi");
        }
    }

    #[test]
    fn test_private_touches_exactly_two_inboxes() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        let mut bob = registry.join(name("bob")).unwrap();
        let mut carol = registry.join(name("carol")).unwrap();
        drain(&mut alice);
        drain(&mut bob);
        drain(&mut carol);

        registry
            .send_message(&name("bob"), "yo", Some(&name("alice")))
            .unwrap();

        assert_eq!(
            drain(&mut alice),
            vec![Message::private("Private message from bob: yo")]
        );
        assert_eq!(
            drain(&mut bob),
            vec![Message::private("Private message to alice: yo")]
        );
        assert!(drain(&mut carol).is_empty());
    }

    #[test]
    fn test_self_message_rejected() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        drain(&mut alice);

        let err = registry
            .send_message(&name("alice"), "me", Some(&name("alice")))
            .unwrap_err();
        assert!(matches!(err, AppError::SelfMessage));
        assert!(drain(&mut alice).is_empty());

        // Rejected even when the sender is not registered
        let err = registry
            .send_message(&name("ghost"), "me", Some(&name("ghost")))
            .unwrap_err();
        assert!(matches!(err, AppError::SelfMessage));
    }

    #[test]
    fn test_unknown_recipient() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        drain(&mut alice);

        let err = registry
            .send_message(&name("alice"), "hello", Some(&name("bob")))
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownRecipient(ref n) if n.as_str() == "bob"));
        assert!(drain(&mut alice).is_empty());
    }

    #[test]
    fn test_departed_user_cannot_be_targeted() {
        let mut registry = Registry::new(StatusList::default());
        let mut alice = registry.join(name("alice")).unwrap();
        let _bob = registry.join(name("bob")).unwrap();
        registry.leave(&name("bob"));
        drain(&mut alice);

        let err = registry
            .send_message(&name("alice"), "still there?", Some(&name("bob")))
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownRecipient(_)));

        let err = registry.send_message(&name("bob"), "hi", None).unwrap_err();
        assert!(matches!(err, AppError::NotConnected(_)));

        registry.send_message(&name("alice"), "alone", None).unwrap();
        assert_eq!(drain(&mut alice).len(), 1);
    }

    #[test]
    fn test_users_sorted_snapshot() {
        let mut registry = Registry::new(StatusList::default());
        let _b = registry.join(name("bob")).unwrap();
        let _a = registry.join(name("alice")).unwrap();
        registry.set_status(&name("bob"), "busy").unwrap();

        let users = registry.users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username.as_str(), "alice");
        assert_eq!(users[0].status, "online");
        assert_eq!(users[1].username.as_str(), "bob");
        assert_eq!(users[1].status, "busy");
    }
}
