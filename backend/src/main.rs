use std::net::SocketAddr;

use property_requests_backend::app::{router, AppState};
use property_requests_backend::config::AppConfig;
use property_requests_backend::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!(
        "Loaded config: port={} data={} uploads={} origins={:?}",
        config.port,
        config.data_dir.display(),
        config.uploads_dir.display(),
        config.allowed_origins
    );
    if config.admin_token.is_none() {
        log::warn!("ADMIN_TOKEN is not set; deletes and backups will be refused");
    }

    let store = Store::open(&config.data_dir)
        .await
        .map_err(|e| format!("Failed to open data directory: {}", e))?;
    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    tokio::fs::create_dir_all(&config.backups_dir).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    log::info!("Starting server on {}", addr);

    let app = router(AppState::new(config, store));
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app.into_make_service()).await?;

    Ok(())
}
