mod auth;
mod error;
mod events;
mod routes;
mod state;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use medpub::workflow::recovery::spawn_stale_sweep;
use medpub::{
    apply_env_overrides, load_config, CaseEventBroadcaster, CaseProxy, CaseRepository, Config,
    Database, FsObjectStore, HttpWebhookClient, MedpubError, Proxy, WebhookEndpoint, Workflow,
};

use error::StartupError;
use state::AppState;

/// Environment variable naming the config file when no argument is given.
const CONFIG_ENV_VAR: &str = "MEDPUB_CONFIG";

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

fn load(path: Option<&PathBuf>) -> Result<Config, MedpubError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run() -> Result<(), StartupError> {
    let path = config_path();
    let config = load(path.as_ref())?;
    telemetry::init(&config.logging)?;

    info!("Starting medpub-server v{}", env!("CARGO_PKG_VERSION"));
    match &path {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No configuration file given, using defaults"),
    }

    let db_path = config
        .database_path()
        .ok_or_else(|| StartupError::Setup("Could not determine database path".to_string()))?;
    let db = Database::open(&db_path).map_err(MedpubError::from)?;

    let storage_dir = config
        .storage_directory()
        .ok_or_else(|| StartupError::Setup("Could not determine storage directory".to_string()))?;
    std::fs::create_dir_all(&storage_dir)?;
    let store = Arc::new(FsObjectStore::new(&storage_dir));
    info!("Storing images under {:?}", storage_dir);

    let webhook = HttpWebhookClient::from_config(&config.webhooks).map_err(MedpubError::from)?;
    for endpoint in WebhookEndpoint::ALL {
        if !webhook.is_configured(endpoint) {
            warn!("Webhook '{}' is not configured; calls will fail", endpoint);
        }
    }

    let repo: Arc<dyn CaseRepository> = Arc::new(db);
    let events = CaseEventBroadcaster::default();
    let proxy: Arc<dyn CaseProxy> = Arc::new(
        Proxy::new(repo.clone(), Arc::new(webhook))
            .with_events(events.clone())
            .with_publish_base_url(config.publish.fallback_base_url.clone()),
    );
    let workflow = Arc::new(Workflow::new(repo.clone(), store, proxy.clone()));

    let _event_logger = events::spawn_event_logger(&events);
    let _sweep = config.recovery.stale_after().map(|older_than| {
        info!(
            "Reverting analyses stuck for over {}s (checked every {}s)",
            older_than.as_secs(),
            config.recovery.sweep_interval_secs
        );
        spawn_stale_sweep(repo.clone(), older_than, config.recovery.sweep_interval())
    });

    let app = routes::router(
        AppState::new(workflow, proxy),
        config.server.max_upload_bytes,
    );

    let listener = TcpListener::bind(config.server.bind_address.as_str()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The subscriber may not be installed yet.
        eprintln!("medpub-server: {}", e);
        std::process::exit(1);
    }
}
