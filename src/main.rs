use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use attendance_engine::api::{AppState, Stores, create_router};
use attendance_engine::audit::AuditLogger;
use attendance_engine::config::ConfigLoader;
use attendance_engine::storage::{LocalPhotoStore, MemoryAuditSink, MemoryStore, SystemClock};

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_dir =
        std::env::var("ATTENDANCE_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let bind_addr: SocketAddr = std::env::var("ATTENDANCE_BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;

    let config = ConfigLoader::load(&config_dir)?;
    info!(config_dir = %config_dir, timezone = %config.engine().timezone.name, "Configuration loaded");

    let store = Arc::new(MemoryStore::new());
    for user in config.seed_users() {
        store.add_user(user.clone())?;
    }
    let photos = Arc::new(LocalPhotoStore::new(&config.engine().photos.upload_dir));
    let (audit, audit_worker) = AuditLogger::spawn(
        Arc::new(MemoryAuditSink::new()),
        config.engine().audit.queue_capacity,
    );

    let seeds = config.seed_locations().to_vec();
    let state = AppState::new(
        config,
        Stores::memory(store, photos),
        Arc::new(SystemClock),
        audit,
    );
    let seeded = state.locations().seed(&seeds)?;
    info!(locations = seeded.len(), "Seed locations loaded");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(address = %bind_addr, "Server listening");
    axum::serve(
        listener,
        create_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    // the router held the last audit handles
    if let Err(err) = audit_worker.await {
        warn!(error = %err, "Audit worker ended abnormally");
    }
    Ok(())
}
