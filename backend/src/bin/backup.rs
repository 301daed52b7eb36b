//! Writes one snapshot of all collections and prunes old ones.

use property_requests_backend::backup::write_snapshot;
use property_requests_backend::config::AppConfig;
use property_requests_backend::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    let store = Store::new(&config.data_dir);

    match write_snapshot(&store, &config.backups_dir, config.backup_retention).await {
        Ok(file) => {
            log::info!("Backup finished: {}", file.display());
            Ok(())
        }
        Err(e) => {
            log::error!("Backup failed: {}", e);
            Err(e.into())
        }
    }
}
