//! Namespaced key-value access to session state
//!
//! A `SessionStore` owns one region of the session data: a JSON object stored
//! under its namespace. Reads on a missing or malformed region see an empty
//! map; writes create or reinitialize it. Only `deserialize` reports errors.

use serde_json::{map, Map, Value};
use tracing::{debug, warn};

use crate::errors::{SessionError, SessionResult};
use crate::transport::{SessionTransport, SessionTransportRef};

/// When a store activates its transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Start only if the request already carries a session credential
    #[default]
    Auto,
    /// Always start
    Always,
    /// Wait for an explicit `start`
    Never,
}

/// One namespaced region of a request's session data
#[derive(Debug, Clone)]
pub struct SessionStore {
    transport: SessionTransportRef,
    namespace: String,
}

impl SessionStore {
    /// Open a store on the configured default namespace
    pub fn new(transport: SessionTransportRef, mode: StartMode) -> Self {
        let namespace = transport.config().default_namespace.clone();
        Self::with_namespace(transport, mode, namespace)
    }

    /// Open a store on an explicit namespace
    pub fn with_namespace(
        transport: SessionTransportRef,
        mode: StartMode,
        namespace: impl Into<String>,
    ) -> Self {
        let store = Self {
            transport,
            namespace: namespace.into(),
        };

        let should_start = match mode {
            StartMode::Always => true,
            StartMode::Auto => store.transport.has_credential(),
            StartMode::Never => false,
        };
        if should_start {
            store.start(None);
        }

        store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn transport(&self) -> &SessionTransport {
        &self.transport
    }

    /// Make sure the session is running and this store's region exists
    ///
    /// If the session already holds data this does nothing. Otherwise the
    /// given id, or failing that an id supplied by the request, is adopted
    /// before the transport is activated. Activation failures are logged and
    /// the store carries on with an empty local session.
    pub fn start(&self, session_id: Option<&str>) -> &Self {
        if self.transport.is_populated() {
            debug!(namespace = %self.namespace, "Session already populated, skipping start");
            return self;
        }

        if let Some(id) = session_id {
            self.transport.set_session_id(id);
        } else if let Some(id) = self.transport.request_session_id() {
            self.transport.set_session_id(id);
        }

        if let Err(e) = self.transport.activate() {
            warn!(namespace = %self.namespace, "Failed to activate session: {}", e);
        }

        let well_formed = self
            .transport
            .with_data(|data| data.get(&self.namespace).map(Value::is_object));
        match well_formed {
            Some(true) => {}
            Some(false) => {
                warn!(namespace = %self.namespace, "Session region is not a mapping, resetting");
                self.reset();
            }
            None => {
                self.reset();
            }
        }

        self
    }

    /// Merge `entries` into the region, replacing it if it is not a mapping
    pub fn import(&self, entries: Map<String, Value>) -> &Self {
        self.with_region_mut(|region| region.extend(entries));
        self
    }

    /// The full region contents
    pub fn export(&self) -> Map<String, Value> {
        self.with_region(Map::clone)
    }

    /// Same as [`SessionStore::export`]
    pub fn data(&self) -> Map<String, Value> {
        self.export()
    }

    /// Replace the region with an empty mapping
    pub fn reset(&self) -> &Self {
        self.transport.with_data_mut(|data| {
            data.insert(self.namespace.clone(), Value::Object(Map::new()));
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.with_region(|region| region.get(key).cloned())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        self.with_region_mut(|region| {
            region.insert(key, value);
        });
    }

    pub fn exists(&self, key: &str) -> bool {
        self.with_region(|region| region.contains_key(key))
    }

    /// Remove `key`, returning its previous value
    pub fn unset(&self, key: &str) -> Option<Value> {
        let present = self.exists(key);
        if !present {
            return None;
        }
        self.with_region_mut(|region| region.remove(key))
    }

    pub fn count(&self) -> usize {
        self.with_region(Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate over a snapshot of the region taken now
    pub fn iterate(&self) -> map::IntoIter {
        self.export().into_iter()
    }

    /// JSON object encoding of the region
    pub fn serialize(&self) -> String {
        Value::Object(self.export()).to_string()
    }

    /// Replace the region with a JSON-encoded object
    ///
    /// The region is left untouched if `input` is not valid JSON or does not
    /// decode to an object.
    pub fn deserialize(&self, input: &str) -> SessionResult<()> {
        match serde_json::from_str::<Value>(input)? {
            Value::Object(region) => {
                self.transport.with_data_mut(|data| {
                    data.insert(self.namespace.clone(), Value::Object(region));
                });
                Ok(())
            }
            other => Err(SessionError::UnexpectedShape(format!(
                "expected a JSON object for region {}, got {}",
                self.namespace,
                json_kind(&other)
            ))),
        }
    }

    fn with_region<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        self.transport.with_data(|data| match data.get(&self.namespace) {
            Some(Value::Object(region)) => f(region),
            _ => f(&Map::new()),
        })
    }

    fn with_region_mut<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        self.transport.with_data_mut(|data| {
            let mut region = match data.remove(&self.namespace) {
                Some(Value::Object(region)) => region,
                Some(_) => {
                    warn!(namespace = %self.namespace, "Session region is not a mapping, reinitializing");
                    Map::new()
                }
                None => Map::new(),
            };
            let result = f(&mut region);
            data.insert(self.namespace.clone(), Value::Object(region));
            result
        })
    }
}

impl<'a> IntoIterator for &'a SessionStore {
    type Item = (String, Value);
    type IntoIter = map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iterate()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
