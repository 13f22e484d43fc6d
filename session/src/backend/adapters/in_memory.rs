use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{debug, warn};

use crate::backend::record::{Session, SessionBackend};
use crate::errors::{SessionError, SessionResult};

/// In-memory implementation of SessionBackend
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionBackend {
    /// Thread-safe storage of sessions
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionBackend {
    /// Create a new InMemorySessionBackend
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for InMemorySessionBackend {
    fn create_session(&self, id: String) -> SessionResult<Session> {
        let session = Session::new(id.clone());

        let mut sessions = self.sessions.write().map_err(|e| {
            SessionError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        sessions.insert(id, session.clone());
        debug!("Created session: {}", session.id);

        Ok(session)
    }

    fn get_session(&self, id: &str) -> SessionResult<Session> {
        let sessions = self.sessions.read().map_err(|e| {
            SessionError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let session = sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        if session.is_expired() {
            return Err(SessionError::NotFound(format!("Session expired: {}", id)));
        }

        Ok(session)
    }

    fn save_session(&self, session: Session) -> SessionResult<()> {
        let mut sessions = self.sessions.write().map_err(|e| {
            SessionError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn delete_session(&self, id: &str) -> SessionResult<()> {
        let mut sessions = self.sessions.write().map_err(|e| {
            SessionError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if sessions.remove(id).is_none() {
            return Err(SessionError::NotFound(id.to_string()));
        }

        debug!("Deleted session: {}", id);
        Ok(())
    }

    fn cleanup_expired_sessions(&self) -> SessionResult<usize> {
        let mut sessions = self.sessions.write().map_err(|e| {
            SessionError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let expired = session.is_expired_at(now);
            if expired {
                debug!("Cleaned up expired session: {}", id);
            }
            !expired
        });

        let count = before - sessions.len();
        if count > 0 {
            warn!("Cleaned up {} expired sessions", count);
        }

        Ok(count)
    }

    fn list_sessions(&self) -> SessionResult<Vec<Session>> {
        let sessions = self.sessions.read().map_err(|e| {
            SessionError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let now = Utc::now();
        let active_sessions: Vec<Session> = sessions
            .values()
            .filter(|session| !session.is_expired_at(now))
            .cloned()
            .collect();

        debug!("Listed {} active sessions", active_sessions.len());
        Ok(active_sessions)
    }
}
