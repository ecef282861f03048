//! Telnet line codec
//!
//! Frames the client byte stream into text lines and serializes outgoing
//! prompts and messages. Telnet clients terminate lines with `\r\n`
//! (sometimes `\r\0`), plain netcat sends a bare `\n`; both are accepted.
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::AppError;
use crate::message::Message;

/// Maximum accepted line length (excluding the terminator).
pub const MAX_LINE_LENGTH: usize = 4096;

/// Something written to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// A message rendered with its presentation tag
    Message(Message),
    /// An untagged line
    Text(String),
    /// Text left on the current line, waiting for input
    Prompt(String),
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Outgoing::Text(text.into())
    }
}

impl From<Message> for Outgoing {
    fn from(msg: Message) -> Self {
        Outgoing::Message(msg)
    }
}

/// A tokio codec that frames input on `\n` and terminates output with `\r\n`.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Bytes already scanned for a newline, so a slow trickle of input is not rescanned.
    next_index: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Strip the line terminator and telnet padding.
fn trim_terminator(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\0'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Decode a line leniently.
fn finish_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(trim_terminator(bytes)).into_owned()
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| self.next_index + offset);

        match newline {
            Some(pos) => {
                let line = src.split_to(pos + 1);
                self.next_index = 0;
                if trim_terminator(&line[..pos]).len() > MAX_LINE_LENGTH {
                    return Err(AppError::LineTooLong(MAX_LINE_LENGTH));
                }
                Ok(Some(finish_line(&line[..pos])))
            }
            None => {
                if trim_terminator(&src[..]).len() > MAX_LINE_LENGTH {
                    return Err(AppError::LineTooLong(MAX_LINE_LENGTH));
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    /// A final line without terminator is still delivered.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split();
        Ok(Some(finish_line(&rest)))
    }
}

impl Encoder<Outgoing> for LineCodec {
    type Error = AppError;

    fn encode(&mut self, item: Outgoing, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (wire, terminate) = match item {
            Outgoing::Message(msg) => (msg.to_string(), true),
            Outgoing::Text(text) => (text, true),
            Outgoing::Prompt(text) => (text, false),
        };
        dst.reserve(wire.len() + 2);
        dst.put_slice(wire.as_bytes());
        if terminate {
            dst.put_slice(b"\r\n");
        }
        Ok(())
    }
}
