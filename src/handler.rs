//! Telnet connection handler
//!
//! Drives one client through its session:
//!
//! 1. **Negotiating**: prompt for a username until one joins the registry.
//!    An empty answer or a dropped connection ends the session without a join.
//! 2. **Active**: greet the user, then run two tasks. The read task parses
//!    lines and calls into the `ChatServer`; the write task is the only
//!    writer of the socket and delivers the user's inbox plus local replies.
//! 3. **Closing**: once either task ends (quit, EOF, or a write failure) the
//!    user leaves the registry and the shared cancellation token stops the
//!    other task, which closes its half of the socket.

use std::ops::ControlFlow;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec::{LineCodec, Outgoing};
use crate::command::{help_lines, user_list_lines, Command, Input};
use crate::config::Config;
use crate::error::AppError;
use crate::message::Message;
use crate::server::ServerHandle;
use crate::types::{ConnectionId, Username};
use crate::user::Inbox;

type LineReader = FramedRead<OwnedReadHalf, LineCodec>;
type LineWriter = FramedWrite<OwnedWriteHalf, LineCodec>;

/// Shown as soon as a client connects
const BANNER: &str = "Welcome to ChaTTY.";

const USERNAME_PROMPT: &str = "Username: ";

/// Accept connections forever, spawning a handler task for each
///
/// Accept failures are logged and skipped; the loop only ends when the
/// future is dropped.
pub async fn serve(listener: TcpListener, server: ServerHandle, config: Arc<Config>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let server = server.clone();
                let config = Arc::clone(&config);

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, server, config).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a new TCP connection
///
/// Negotiates a username, runs the session and unregisters the user when
/// the session ends.
pub async fn handle_connection(
    stream: TcpStream,
    server: ServerHandle,
    config: Arc<Config>,
) -> Result<(), AppError> {
    let connection_id = ConnectionId::new();
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    debug!("Connection {} from {}", connection_id, peer_addr);

    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(read_half, LineCodec::new());
    let mut sink = FramedWrite::new(write_half, LineCodec::new());

    sink.send(Outgoing::text(BANNER)).await?;

    let Some((username, inbox)) = negotiate(&mut lines, &mut sink, &server).await? else {
        info!(
            "Connection {} closed before setting a username",
            connection_id
        );
        let _ = sink.close().await;
        return Ok(());
    };
    info!("Connection {} is now {}", connection_id, username);

    greet(&mut sink, &username, &server, &config).await?;

    let shutdown = CancellationToken::new();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();

    let session = Session {
        username: username.clone(),
        server: server.clone(),
        config,
        replies: reply_tx,
    };

    let read_task = tokio::spawn(read_loop(lines, session, shutdown.clone()));
    let write_task = tokio::spawn(write_loop(sink, inbox, reply_rx, shutdown.clone()));

    // Wait for either task to complete
    tokio::select! {
        result = read_task => {
            debug!("Read task completed for {}", username);
            if let Ok(Err(e)) = result {
                warn!("Read task for {} failed: {}", username, e);
            }
        }
        _ = write_task => {
            debug!("Write task completed for {}", username);
        }
    }

    // Closing: drop the registry entry, then stop whichever task is still running
    let left = server.leave(username.clone()).await;
    shutdown.cancel();
    info!("User {} disconnected", username);

    left
}

/// Prompt until a unique username has joined
///
/// Returns None when the client hangs up or answers with an empty name.
async fn negotiate(
    lines: &mut LineReader,
    sink: &mut LineWriter,
    server: &ServerHandle,
) -> Result<Option<(Username, Inbox)>, AppError> {
    loop {
        sink.send(Outgoing::Prompt(USERNAME_PROMPT.to_string()))
            .await?;

        let line = match lines.next().await {
            Some(line) => line?,
            None => return Ok(None),
        };

        let Some(username) = Username::normalize(&line) else {
            return Ok(None);
        };

        match server.join(username.clone()).await {
            Ok(inbox) => return Ok(Some((username, inbox))),
            Err(e @ AppError::UserTaken(_)) => {
                debug!("Username {} is taken", username);
                sink.send(Outgoing::from(Message::from(e))).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Welcome text, help and a snapshot of who is online
async fn greet(
    sink: &mut LineWriter,
    username: &Username,
    server: &ServerHandle,
    config: &Config,
) -> Result<(), AppError> {
    let users = server.list_users().await?;

    let mut output = vec![
        Outgoing::text(""),
        Message::info(format!("Welcome {}! Get chatty.", username)).into(),
        Outgoing::text(""),
    ];
    output.extend(help_lines(&config.statuses).into_iter().map(Outgoing::from));
    output.push(Outgoing::text(""));
    output.extend(user_list_lines(&users).into_iter().map(Outgoing::from));
    output.push(Outgoing::text(""));

    for item in output {
        sink.feed(item).await?;
    }
    sink.flush().await
}

/// State the read task needs to act for one user
struct Session {
    username: Username,
    server: ServerHandle,
    config: Arc<Config>,
    /// Output meant only for this client (help, listings, errors), one batch per reply
    replies: mpsc::UnboundedSender<Vec<Outgoing>>,
}

impl Session {
    /// Act on one parsed line
    ///
    /// Chat errors are reported back to the client; only fatal errors
    /// escape, and `Break` means the user asked to quit.
    async fn dispatch(&self, input: Input) -> Result<ControlFlow<()>, AppError> {
        let result = match input {
            Input::Empty => Ok(()),
            Input::Chat(text) => {
                self.server
                    .send_message(self.username.clone(), text, None)
                    .await
            }
            Input::Command(Command::Quit) => return Ok(ControlFlow::Break(())),
            Input::Command(Command::Help) => {
                self.reply_all(help_lines(&self.config.statuses));
                Ok(())
            }
            Input::Command(Command::List) => {
                let users = self.server.list_users().await?;
                self.reply_all(user_list_lines(&users));
                Ok(())
            }
            Input::Command(Command::Message { to, text }) => match Username::normalize(&to) {
                Some(recipient) => {
                    self.server
                        .send_message(self.username.clone(), text, Some(recipient))
                        .await
                }
                None => {
                    self.reply_all(help_lines(&self.config.statuses));
                    Ok(())
                }
            },
            Input::Command(Command::Status(status)) => {
                self.server
                    .set_status(self.username.clone(), status)
                    .await
            }
        };

        match result {
            Ok(()) => Ok(ControlFlow::Continue(())),
            Err(e) if e.is_recoverable() => {
                debug!("Rejected request from {}: {}", self.username, e);
                self.reply(Message::from(e));
                Ok(ControlFlow::Continue(()))
            }
            Err(e) => Err(e),
        }
    }

    fn reply(&self, msg: Message) {
        self.reply_all(vec![msg]);
    }

    fn reply_all(&self, messages: Vec<Message>) {
        let batch = messages.into_iter().map(Outgoing::from).collect();
        if self.replies.send(batch).is_err() {
            debug!("Write task for {} already ended", self.username);
        }
    }
}

/// Read task: client lines -> ChatServer
async fn read_loop(
    mut lines: LineReader,
    session: Session,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = lines.next() => match next {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!("Invalid input from {}: {}", session.username, e);
                    session.reply(Message::warning(format!("{}. Closing connection.", e)));
                    break;
                }
                None => {
                    debug!("Client {} closed the connection", session.username);
                    break;
                }
            },
        };

        if session.dispatch(Input::parse(&line)).await?.is_break() {
            debug!("User {} quit", session.username);
            break;
        }
    }
    debug!("Read task ended for {}", session.username);
    Ok(())
}

/// Write task: local replies and inbox -> client
///
/// A reply batch is written as one block, so inbox traffic never lands in
/// the middle of a help or user listing. Replies still queued when the inbox
/// closes are written before the socket is shut down.
async fn write_loop(
    mut sink: LineWriter,
    mut inbox: Inbox,
    mut replies: mpsc::UnboundedReceiver<Vec<Outgoing>>,
    shutdown: CancellationToken,
) {
    loop {
        let batch = tokio::select! {
            biased;
            Some(batch) = replies.recv() => batch,
            message = inbox.recv() => match message {
                Some(message) => vec![Outgoing::Message(message)],
                // The registry dropped the entry
                None => {
                    let mut rest = Vec::new();
                    while let Ok(batch) = replies.try_recv() {
                        rest.extend(batch);
                    }
                    let _ = write_batch(&mut sink, rest).await;
                    break;
                }
            },
            _ = shutdown.cancelled() => break,
        };

        if let Err(e) = write_batch(&mut sink, batch).await {
            debug!("Socket write failed, ending write task: {}", e);
            break;
        }
    }
    debug!("Write task ended");

    let _ = sink.close().await;
}

async fn write_batch(sink: &mut LineWriter, batch: Vec<Outgoing>) -> Result<(), AppError> {
    for item in batch {
        sink.feed(item).await?;
    }
    sink.flush().await
}
