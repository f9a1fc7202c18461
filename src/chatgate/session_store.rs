//! Session-keyed conversation memory.
//!
//! A session is an opaque string key owning an append-only transcript. It is
//! created the first time something is appended under its key and never
//! deleted. Two implementations are provided:
//!
//! - [`InMemorySessionStore`]: process-lifetime only, used in tests.
//! - [`JsonlSessionStore`]: one `.jsonl` file per session under a directory,
//!   one [`TranscriptEntry`] per line, surviving restarts.
//!
//! ```rust
//! use chatgate::client_wrapper::{Message, Role};
//! use chatgate::session_store::{InMemorySessionStore, SessionStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = InMemorySessionStore::new();
//! store
//!     .append("s1", &[Message::new(Role::User, "hello")])
//!     .await
//!     .unwrap();
//! assert_eq!(store.load("s1").await.unwrap().len(), 1);
//! assert!(store.load("s2").await.unwrap().is_empty());
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

use crate::chatgate::client_wrapper::{Message, Role};

/// Errors raised by session stores.
#[derive(Debug)]
pub enum SessionStoreError {
    Io(io::Error),
    /// A transcript line could not be decoded.
    Corrupt { path: PathBuf, line: usize, reason: String },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStoreError::Io(e) => write!(f, "session store I/O error: {}", e),
            SessionStoreError::Corrupt { path, line, reason } => write!(
                f,
                "corrupt transcript {} at line {}: {}",
                path.display(),
                line,
                reason
            ),
        }
    }
}

impl Error for SessionStoreError {}

impl From<io::Error> for SessionStoreError {
    fn from(err: io::Error) -> Self {
        SessionStoreError::Io(err)
    }
}

/// Persistence seam for conversation history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Every message stored under `session_id`, oldest first. Unknown keys are empty.
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, SessionStoreError>;

    /// Append `messages` to the end of the transcript for `session_id`.
    async fn append(&self, session_id: &str, messages: &[Message])
        -> Result<(), SessionStoreError>;
}

/// Transcripts held in memory for the lifetime of the store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions that have received at least one append.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, SessionStoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(
        &self,
        session_id: &str,
        messages: &[Message],
    ) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }
}

/// One persisted line of a transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Zero-based position in the session.
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
}

impl TranscriptEntry {
    pub fn message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

/// Derive the transcript filename for a session key.
///
/// The readable prefix is the key with unsafe characters replaced; the hash
/// suffix keeps keys that sanitize to the same prefix apart.
pub fn session_filename(session_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let safe_id: String = session_id
        .chars()
        .take(64)
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}-{}.jsonl", safe_id, &digest[..16])
}

/// Append-only JSONL transcripts, one file per session.
pub struct JsonlSessionStore {
    dir: PathBuf,
    /// Entry count per session, loaded lazily; also serialises writers.
    next_index: Mutex<HashMap<String, u64>>,
}

impl JsonlSessionStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SessionStoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        log::info!("session transcripts stored in {}", dir.display());
        Ok(Self {
            dir,
            next_index: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the transcript file for `session_id`.
    pub fn transcript_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(session_filename(session_id))
    }

    /// Read every entry of a session, oldest first.
    pub fn read_entries(&self, session_id: &str) -> Result<Vec<TranscriptEntry>, SessionStoreError> {
        let path = self.transcript_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let mut entries = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: TranscriptEntry =
                serde_json::from_str(&line).map_err(|e| SessionStoreError::Corrupt {
                    path: path.clone(),
                    line: number + 1,
                    reason: e.to_string(),
                })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, SessionStoreError> {
        Ok(self
            .read_entries(session_id)?
            .iter()
            .map(TranscriptEntry::message)
            .collect())
    }

    async fn append(
        &self,
        session_id: &str,
        messages: &[Message],
    ) -> Result<(), SessionStoreError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut counters = self.next_index.lock().await;
        let next = match counters.get(session_id) {
            Some(n) => *n,
            None => self.read_entries(session_id)?.len() as u64,
        };

        let mut buffer = String::new();
        for (offset, message) in messages.iter().enumerate() {
            let entry = TranscriptEntry {
                index: next + offset as u64,
                timestamp: Utc::now(),
                role: message.role,
                content: message.content.clone(),
            };
            let json = serde_json::to_string(&entry)
                .map_err(|e| io::Error::other(format!("Failed to serialize entry: {}", e)))?;
            buffer.push_str(&json);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.transcript_path(session_id))?;
        file.write_all(buffer.as_bytes())?;

        counters.insert(session_id.to_string(), next + messages.len() as u64);
        log::debug!(
            "session '{}': appended {} message(s), {} total",
            session_id,
            messages.len(),
            next + messages.len() as u64
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_filename_is_safe_and_distinct() {
        let a = session_filename("user/1");
        let b = session_filename("user_1");
        assert!(a.starts_with("user_1-"));
        assert!(a.ends_with(".jsonl"));
        assert_ne!(a, b);
        assert_eq!(a, session_filename("user/1"));
    }

    #[tokio::test]
    async fn test_in_memory_sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        store
            .append("a", &[Message::new(Role::User, "one")])
            .await
            .unwrap();
        store
            .append("a", &[Message::new(Role::Assistant, "two")])
            .await
            .unwrap();

        let history = store.load("a").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "two");
        assert!(store.load("b").await.unwrap().is_empty());
        assert_eq!(store.session_count().await, 1);
    }
}
