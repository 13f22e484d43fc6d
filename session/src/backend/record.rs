use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::SessionResult;

/// A persisted session: every region of one client's state plus bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Last time the session was committed
    pub updated_at: DateTime<Utc>,
    /// Optional time when the session expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Region name to region contents
    pub data: Map<String, Value>,
}

impl Session {
    /// Create a new, empty session with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            expires_at: None,
            data: Map::new(),
        }
    }

    /// Replace the session data and bump `updated_at`
    pub fn replace_data(&mut self, data: Map<String, Value>) {
        self.data = data;
        self.updated_at = Utc::now();
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Set the expiration time for this session
    pub fn set_expiry(&mut self, expires_at: DateTime<Utc>) {
        self.expires_at = Some(expires_at);
        self.updated_at = Utc::now();
    }

    /// Push the expiry `ttl_secs` past now, or clear it when there is no TTL
    ///
    /// A TTL too large to represent as a timestamp means the session never expires.
    pub fn touch(&mut self, ttl_secs: Option<u64>) {
        let now = Utc::now();
        self.updated_at = now;
        self.expires_at = ttl_secs.and_then(|secs| {
            let expires_at = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl));
            if expires_at.is_none() {
                warn!("Session TTL of {}s is out of range, session will not expire", secs);
            }
            expires_at
        });
    }
}

/// Storage for session records, shared by every request
pub trait SessionBackend: Send + Sync + Debug {
    /// Create a new session with the given ID
    fn create_session(&self, id: String) -> SessionResult<Session>;

    /// Get a live session by ID; expired sessions are `NotFound`
    fn get_session(&self, id: &str) -> SessionResult<Session>;

    /// Save a session, replacing any previous record with the same ID
    fn save_session(&self, session: Session) -> SessionResult<()>;

    /// Delete a session by ID
    fn delete_session(&self, id: &str) -> SessionResult<()>;

    /// Delete expired sessions, returning how many were removed
    fn cleanup_expired_sessions(&self) -> SessionResult<usize>;

    /// List all active (non-expired) sessions
    fn list_sessions(&self) -> SessionResult<Vec<Session>>;
}

/// Type alias for Arc-wrapped SessionBackend trait objects
pub type SessionBackendRef = Arc<dyn SessionBackend>;
