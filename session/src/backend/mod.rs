//! Session persistence
//!
//! The transport loads a session record when it is activated and writes it
//! back on commit. Where the records live is decided by a `SessionBackend`
//! implementation; the crate ships an in-memory one.

pub mod adapters;
pub mod record;

pub use adapters::InMemorySessionBackend;
pub use record::{Session, SessionBackend, SessionBackendRef};
