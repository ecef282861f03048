//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: UUID-based identifier for a TCP connection
//! - `Username`: normalized, unique display name
//! - `StatusList`: the configured status vocabulary

use serde::Deserialize;
use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// A connection has no username while it negotiates one, so log lines
/// use this id until the session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a connected user
///
/// Always holds a normalized value when produced by [`Username::normalize`]:
/// trimmed, lower-cased, spaces replaced by `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    /// Normalize raw client input into a username
    ///
    /// Returns None when nothing is left after trimming.
    pub fn normalize(raw: &str) -> Option<Self> {
        let name = raw.trim().to_lowercase().replace(' ', "-");
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Ordered set of allowed status strings
///
/// The first entry is the status every user starts with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct StatusList(Vec<String>);

impl StatusList {
    pub fn new(statuses: Vec<String>) -> Self {
        Self(statuses)
    }

    /// Status assigned on join
    pub fn default_status(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("online")
    }

    pub fn contains(&self, status: &str) -> bool {
        self.0.iter().any(|s| s == status)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StatusList {
    fn default() -> Self {
        Self(vec![
            "online".to_string(),
            "away".to_string(),
            "busy".to_string(),
        ])
    }
}
