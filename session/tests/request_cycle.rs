use chrono::{Duration, Utc};
use primal_session::{
    InMemorySessionBackend, Notification, NotificationQueue, RequestContext, SessionBackend,
    SessionBackendRef, SessionConfig, SessionStore, SessionTransport, SessionTransportRef,
    StartMode,
};
use serde_json::json;
use std::fs;
use std::sync::Arc;

fn request(backend: &SessionBackendRef, cookie: Option<&str>) -> SessionTransportRef {
    let context = match cookie {
        Some(id) => RequestContext::new().with_cookie("SESSIONID", id),
        None => RequestContext::new(),
    };
    SessionTransport::shared(backend.clone(), context, SessionConfig::default())
}

#[test]
fn notifications_survive_to_the_next_request() {
    let backend: SessionBackendRef = Arc::new(InMemorySessionBackend::new());

    let first = request(&backend, None);
    NotificationQueue::new(first.clone())
        .push_notice("Saved successfully")
        .push("Check your input", "error");
    first.commit().unwrap();
    let id = first.session_id().unwrap();

    let second = request(&backend, Some(&id));
    let queue = NotificationQueue::new(second.clone());
    assert_eq!(
        queue.pop_all(),
        vec![
            Notification::notice("Saved successfully"),
            Notification::new("Check your input", "error"),
        ]
    );
    second.commit().unwrap();

    let third = request(&backend, Some(&id));
    assert!(NotificationQueue::new(third).is_empty());
}

#[test]
fn auto_store_resumes_only_with_a_cookie() {
    let backend: SessionBackendRef = Arc::new(InMemorySessionBackend::new());

    let first = request(&backend, None);
    let store = SessionStore::with_namespace(first.clone(), StartMode::Always, "Cart");
    store.set("items", 2);
    first.commit().unwrap();
    let id = first.session_id().unwrap();

    let anonymous = request(&backend, None);
    let store = SessionStore::with_namespace(anonymous.clone(), StartMode::Auto, "Cart");
    assert!(!anonymous.is_active());
    assert_eq!(store.get("items"), None);

    let returning = request(&backend, Some(&id));
    let store = SessionStore::with_namespace(returning.clone(), StartMode::Auto, "Cart");
    assert!(returning.is_active());
    assert_eq!(returning.session_id(), Some(id));
    assert_eq!(store.get("items"), Some(json!(2)));
}

#[test]
fn request_parameter_id_is_adopted() {
    let backend: SessionBackendRef = Arc::new(InMemorySessionBackend::new());

    let first = request(&backend, None);
    SessionStore::new(first.clone(), StartMode::Always).set("k", "v");
    first.commit().unwrap();
    let id = first.session_id().unwrap();

    let context = RequestContext::new().with_param("SESSIONID", id.clone());
    let second = SessionTransport::shared(backend, context, SessionConfig::default());
    let store = SessionStore::new(second.clone(), StartMode::Never);
    assert!(!second.is_active());

    store.start(None);
    assert_eq!(second.session_id(), Some(id));
    assert_eq!(store.get("k"), Some(json!("v")));
}

#[test]
fn expired_session_is_not_resumed() {
    let backend = Arc::new(InMemorySessionBackend::new());
    let shared: SessionBackendRef = backend.clone();

    let first = request(&shared, None);
    SessionStore::new(first.clone(), StartMode::Always).set("k", "v");
    first.commit().unwrap();
    let id = first.session_id().unwrap();

    let mut record = backend.get_session(&id).unwrap();
    record.set_expiry(Utc::now() - Duration::seconds(1));
    backend.save_session(record).unwrap();

    let second = request(&shared, Some(&id));
    let store = SessionStore::new(second.clone(), StartMode::Auto);
    assert!(second.is_active());
    assert_ne!(second.session_id(), Some(id));
    assert_eq!(store.get("k"), None);
}

#[test]
fn last_commit_wins() {
    let backend: SessionBackendRef = Arc::new(InMemorySessionBackend::new());

    let first = request(&backend, None);
    SessionStore::new(first.clone(), StartMode::Always).set("n", 0);
    first.commit().unwrap();
    let id = first.session_id().unwrap();

    let a = request(&backend, Some(&id));
    let b = request(&backend, Some(&id));
    let store_a = SessionStore::new(a.clone(), StartMode::Auto);
    let store_b = SessionStore::new(b.clone(), StartMode::Auto);
    store_a.set("n", 1);
    store_b.set("n", 2);
    a.commit().unwrap();
    b.commit().unwrap();

    let check = request(&backend, Some(&id));
    let store = SessionStore::new(check, StartMode::Auto);
    assert_eq!(store.get("n"), Some(json!(2)));
}

#[test]
fn huge_configured_ttl_commits_without_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    fs::write(&path, "ttl_secs = 100000000000000\n").unwrap();
    let config = SessionConfig::load_from_file(&path).unwrap();

    let backend = Arc::new(InMemorySessionBackend::new());
    let transport =
        SessionTransport::shared(backend.clone(), RequestContext::new(), config);
    SessionStore::new(transport.clone(), StartMode::Always).set("k", 1);
    transport.commit().unwrap();

    let id = transport.session_id().unwrap();
    let stored = backend.get_session(&id).unwrap();
    assert_eq!(stored.expires_at, None);
    assert_eq!(stored.data["SessionAbstraction"], json!({ "k": 1 }));
}
