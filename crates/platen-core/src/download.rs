//! Download token cache.
//!
//! Bridges large binary payloads from the render pipeline to a later,
//! separate HTTP fetch. Tokens are single-use and time-bounded: retrieval
//! removes the entry in the same operation that reads it, and expiry is
//! evaluated lazily at read time plus an opportunistic sweep. There is no
//! background eviction timer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// How long an issued download stays retrievable by default.
pub const DEFAULT_DOWNLOAD_TTL: Duration = Duration::from_secs(5 * 60);

struct StoredEntry {
    payload: Vec<u8>,
    mime_type: String,
    expires_at: Instant,
}

/// A consumed download: the payload and its mime type.
pub struct DownloadPayload {
    pub payload: Vec<u8>,
    pub mime_type: String,
}

/// In-memory store of pending downloads keyed by unguessable token.
#[derive(Default)]
pub struct DownloadCache {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl DownloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload under a freshly generated token and return the token.
    ///
    /// A zero `ttl` makes the entry unretrievable on the next consume;
    /// tokens are never caller-supplied, so a used token cannot be
    /// re-issued.
    pub async fn issue(&self, payload: Vec<u8>, mime_type: impl Into<String>, ttl: Duration) -> String {
        let token = Uuid::new_v4().to_string();
        let entry = StoredEntry {
            payload,
            mime_type: mime_type.into(),
            expires_at: Instant::now() + ttl,
        };

        let mut entries = self.entries.lock().await;
        entries.insert(token.clone(), entry);
        debug!(pending = entries.len(), "issued download token");

        token
    }

    /// Store a payload with the default time-to-live.
    pub async fn issue_default(&self, payload: Vec<u8>, mime_type: impl Into<String>) -> String {
        self.issue(payload, mime_type, DEFAULT_DOWNLOAD_TTL).await
    }

    /// Atomically look up and remove the entry for `token`.
    ///
    /// Returns `None` for an unknown token, and also for a known-but-expired
    /// one: the expired payload is discarded, not served, and the two cases
    /// are indistinguishable to the caller. The entry is removed whether or
    /// not it has expired, which is what guarantees at-most-once delivery.
    pub async fn consume(&self, token: &str) -> Option<DownloadPayload> {
        let entry = self.entries.lock().await.remove(token)?;

        if Instant::now() >= entry.expires_at {
            return None;
        }

        Some(DownloadPayload {
            payload: entry.payload,
            mime_type: entry.mime_type,
        })
    }

    /// Remove every expired entry. Idempotent, safe at any frequency; meant
    /// as an opportunistic sweep before serving a retrieval request.
    pub async fn prune_expired(&self) {
        let now = Instant::now();
        self.entries.lock().await.retain(|_, e| e.expires_at > now);
    }

    /// Number of live (unconsumed, possibly expired) entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
