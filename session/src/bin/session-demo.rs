use clap::Parser;
use primal_session::{
    get_default_config_file, InMemorySessionBackend, NotificationQueue, RequestContext,
    SessionBackendRef, SessionConfig, SessionConfigOverrides, SessionStore, SessionTransport,
    StartMode,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "session-demo",
    about = "Runs two simulated requests against an in-memory session backend"
)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the session cookie
    #[arg(long)]
    session_name: Option<String>,

    /// Session lifetime in seconds
    #[arg(long)]
    ttl_secs: Option<u64>,

    /// Notification messages to queue on the first request
    #[arg(default_values_t = vec!["Saved successfully".to_string()])]
    messages: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => match get_default_config_file("primal-session") {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("No default config location: {}", e);
                None
            }
        },
    };
    let config = match &config_path {
        Some(path) => SessionConfig::load_from_file(path)?,
        None => SessionConfig::default(),
    };
    let config = config.merge(&SessionConfigOverrides {
        session_name: args.session_name.clone(),
        default_namespace: None,
        ttl_secs: args.ttl_secs,
    });
    info!("Using session cookie {}", config.session_name);

    let backend: SessionBackendRef = Arc::new(InMemorySessionBackend::new());

    // First request: no cookie, so the queue forces a fresh session.
    let first = SessionTransport::shared(backend.clone(), RequestContext::new(), config.clone());
    let queue = NotificationQueue::new(first.clone());
    for message in &args.messages {
        queue.push_notice(message.as_str());
    }
    first.commit()?;
    let session_id = first
        .session_id()
        .ok_or_else(|| anyhow::anyhow!("session was not started"))?;
    info!("Request 1 queued {} notification(s) in session {}", queue.len(), session_id);

    // Second request: the cookie is present, so an Auto store resumes it.
    let request = RequestContext::new().with_cookie(config.session_name.clone(), session_id);
    let second = SessionTransport::shared(backend, request, config);
    let store = SessionStore::new(second.clone(), StartMode::Auto);
    info!("Request 2 session active: {}", store.transport().is_active());

    let notifications = NotificationQueue::new(second.clone()).pop_all();
    println!("{}", serde_json::to_string_pretty(&notifications)?);
    second.commit()?;

    Ok(())
}
