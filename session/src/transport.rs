//! Per-request session transport
//!
//! A `SessionTransport` lives for one handled request. It decides which
//! session id the request refers to, loads that session from the backend on
//! activation and writes it back on commit. Every `SessionStore` opened
//! during the request shares one transport through a `SessionTransportRef`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::{Session, SessionBackendRef};
use crate::config::SessionConfig;
use crate::errors::{SessionError, SessionResult};

/// The parts of an inbound request the transport looks at
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cookies: HashMap<String, String>,
    params: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Adds a query or form parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct TransportState {
    session_id: Option<String>,
    active: bool,
    record: Option<Session>,
    data: Map<String, Value>,
}

/// Session state for a single request
#[derive(Debug)]
pub struct SessionTransport {
    backend: SessionBackendRef,
    request: RequestContext,
    config: SessionConfig,
    state: RwLock<TransportState>,
}

/// Type alias for the shared handle stores hold on their transport
pub type SessionTransportRef = Arc<SessionTransport>;

impl SessionTransport {
    pub fn new(backend: SessionBackendRef, request: RequestContext, config: SessionConfig) -> Self {
        Self {
            backend,
            request,
            config,
            state: RwLock::new(TransportState::default()),
        }
    }

    /// Convenience constructor returning the shared handle
    pub fn shared(
        backend: SessionBackendRef,
        request: RequestContext,
        config: SessionConfig,
    ) -> SessionTransportRef {
        Arc::new(Self::new(backend, request, config))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True if the request carries a non-empty session cookie
    pub fn has_credential(&self) -> bool {
        self.request
            .cookie(&self.config.session_name)
            .is_some_and(|value| !value.is_empty())
    }

    /// A session id supplied by the request, parameters first, then the cookie
    pub fn request_session_id(&self) -> Option<String> {
        let name = &self.config.session_name;
        self.request
            .param(name)
            .or_else(|| self.request.cookie(name))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Adopt a session id; ignored once the transport is active
    pub fn set_session_id(&self, id: impl Into<String>) {
        let mut state = self.write_state();
        if state.active {
            warn!("Ignoring session id change on an active session");
            return;
        }
        state.session_id = Some(id.into());
    }

    pub fn session_id(&self) -> Option<String> {
        self.read_state().session_id.clone()
    }

    pub fn is_active(&self) -> bool {
        self.read_state().active
    }

    /// True if any region holds data, whether or not the transport is active
    pub fn is_populated(&self) -> bool {
        !self.read_state().data.is_empty()
    }

    /// Load the adopted session from the backend, or create a fresh one
    ///
    /// Does nothing if the transport is already active. An id with no live
    /// record behind it is not reused; the new session gets a fresh id.
    pub fn activate(&self) -> SessionResult<()> {
        let mut state = self.write_state();
        if state.active {
            return Ok(());
        }

        let resumed = match state.session_id.as_deref() {
            Some(id) => match self.backend.get_session(id) {
                Ok(session) => Some(session),
                Err(SessionError::NotFound(_)) => {
                    debug!("No live session for id {}, starting a new one", id);
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let session = match resumed {
            Some(session) => {
                debug!("Resumed session: {}", session.id);
                session
            }
            None => self.backend.create_session(Uuid::new_v4().to_string())?,
        };

        if !state.data.is_empty() {
            warn!(
                "Discarding {} region(s) written before session {} was activated",
                state.data.len(),
                session.id
            );
        }

        state.session_id = Some(session.id.clone());
        state.data = session.data.clone();
        state.record = Some(session);
        state.active = true;
        Ok(())
    }

    /// Write the session data back to the backend
    ///
    /// Does nothing if the transport was never activated.
    pub fn commit(&self) -> SessionResult<()> {
        let mut state = self.write_state();
        if !state.active {
            return Ok(());
        }

        let Some(mut record) = state.record.clone() else {
            return Ok(());
        };
        record.replace_data(state.data.clone());
        record.touch(self.config.ttl_secs);

        self.backend.save_session(record.clone())?;
        debug!("Committed session: {}", record.id);
        state.record = Some(record);
        Ok(())
    }

    /// Delete the backend record and forget all local state
    pub fn destroy(&self) -> SessionResult<()> {
        let mut state = self.write_state();
        if let Some(id) = state.session_id.as_deref() {
            match self.backend.delete_session(id) {
                Ok(()) | Err(SessionError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            debug!("Destroyed session: {}", id);
        }
        *state = TransportState::default();
        Ok(())
    }

    /// Run `f` against the session data (all regions)
    pub fn with_data<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.read_state().data)
    }

    /// Run `f` against the session data (all regions), mutably
    pub fn with_data_mut<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.write_state().data)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TransportState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Session state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TransportState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Session state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
