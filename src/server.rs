//! ChatServer Actor implementation
//!
//! The central actor that owns the user registry. Connection handlers never
//! touch the registry directly: they send a `ServerCommand` through a
//! `ServerHandle` and, where a result is needed, wait on a oneshot reply.
//! Because the actor handles one command at a time, every registry operation
//! is atomic and all users observe a single order of public messages.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::AppError;
use crate::registry::Registry;
use crate::types::{StatusList, Username};
use crate::user::{Inbox, UserSummary};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Register a username
    Join {
        username: Username,
        reply: oneshot::Sender<Result<Inbox, AppError>>,
    },
    /// Unregister a username
    Leave { username: Username },
    /// Change a user's status
    SetStatus {
        username: Username,
        status: String,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    /// Send a public (no recipient) or private message
    Send {
        sender: Username,
        text: String,
        recipient: Option<Username>,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    /// Snapshot of connected users
    ListUsers {
        reply: oneshot::Sender<Vec<UserSummary>>,
    },
}

/// The main ChatServer actor
///
/// Owns the registry and processes commands from connection handlers.
pub struct ChatServer {
    /// All registered users
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, statuses: StatusList) -> Self {
        Self {
            registry: Registry::new(statuses),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    ///
    /// A dropped reply receiver only means the asking connection went away.
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Join { username, reply } => {
                let _ = reply.send(self.registry.join(username));
            }
            ServerCommand::Leave { username } => {
                self.registry.leave(&username);
            }
            ServerCommand::SetStatus {
                username,
                status,
                reply,
            } => {
                let _ = reply.send(self.registry.set_status(&username, &status));
            }
            ServerCommand::Send {
                sender,
                text,
                recipient,
                reply,
            } => {
                let result = self
                    .registry
                    .send_message(&sender, &text, recipient.as_ref());
                let _ = reply.send(result);
            }
            ServerCommand::ListUsers { reply } => {
                let _ = reply.send(self.registry.users());
            }
        }
        debug!("Registered users: {}", self.registry.len());
    }
}

/// Cloneable handle used by connection handlers to reach the actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    pub fn new(sender: mpsc::Sender<ServerCommand>) -> Self {
        Self { sender }
    }

    /// Register a username, returning the user's inbox
    pub async fn join(&self, username: Username) -> Result<Inbox, AppError> {
        self.request(|reply| ServerCommand::Join { username, reply })
            .await?
    }

    /// Unregister a username
    pub async fn leave(&self, username: Username) -> Result<(), AppError> {
        self.sender
            .send(ServerCommand::Leave { username })
            .await
            .map_err(|_| AppError::ChannelSend)
    }

    pub async fn set_status(
        &self,
        username: Username,
        status: impl Into<String>,
    ) -> Result<(), AppError> {
        let status = status.into();
        self.request(|reply| ServerCommand::SetStatus {
            username,
            status,
            reply,
        })
        .await?
    }

    /// Send a chat message; `recipient` makes it private
    pub async fn send_message(
        &self,
        sender: Username,
        text: impl Into<String>,
        recipient: Option<Username>,
    ) -> Result<(), AppError> {
        let text = text.into();
        self.request(|reply| ServerCommand::Send {
            sender,
            text,
            recipient,
            reply,
        })
        .await?
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AppError> {
        self.request(|reply| ServerCommand::ListUsers { reply }).await
    }

    /// Helper: send a command and wait for the actor's reply
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ServerCommand,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| AppError::ChannelSend)?;
        response.await.map_err(|_| AppError::ChannelSend)
    }
}
