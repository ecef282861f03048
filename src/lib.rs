//! ChaTTY: a telnet chat server library
//!
//! A multi-user chat service reachable with any line-oriented TCP client
//! (telnet, netcat). Each client picks a unique username and then exchanges
//! public messages, private messages and status updates through
//! slash-prefixed commands.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the user `Registry`
//! - Each connection has a `handler` task with a read task and a write task
//! - Every user has an unbounded inbox; the write task awaits it directly
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chatty::{serve, ChatServer, Config, ServerHandle};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(Config::default());
//!     let listener = TcpListener::bind(config.addr()).await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx, config.statuses.clone()).run());
//!     serve(listener, ServerHandle::new(cmd_tx), config).await;
//! }
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use codec::{LineCodec, Outgoing};
pub use command::{Command, CommandKind, Input};
pub use config::Config;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, serve};
pub use message::{Message, MessageKind};
pub use registry::Registry;
pub use server::{ChatServer, ServerCommand, ServerHandle};
pub use types::{ConnectionId, StatusList, Username};
pub use user::{Inbox, UserEntry, UserSummary};
