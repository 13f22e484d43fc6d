// Session state for web requests:
// - Per-request transport with smart start and commit
// - Namespaced key-value stores over the session data
// - Notification queue built on a store
// - Pluggable persistence backends
// - Configuration loading

pub mod backend;
pub use backend::{InMemorySessionBackend, Session, SessionBackend, SessionBackendRef};

pub mod config;
pub use config::*;

pub mod errors;
pub use errors::*;

pub mod notifications;
pub use notifications::{Notification, NotificationQueue};

pub mod store;
pub use store::{SessionStore, StartMode};

pub mod transport;
pub use transport::{RequestContext, SessionTransport, SessionTransportRef};
