use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use dotenv::dotenv;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_ORIGINS: [&str; 4] = [
    "https://dawakrdn.vercel.app",
    "https://systamwargrtn.vercel.app",
    "http://localhost:3000",
    "http://localhost:5173",
];

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub backups_dir: PathBuf,
    /// Shared secret for `x-admin-token`. Unset means nobody is admin.
    #[serde(default)]
    pub admin_token: Option<String>,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub backup_retention: usize,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env file if present
        Self::from_builder(
            Config::builder().add_source(
                Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            ),
        )
    }

    /// Fills in defaults under whatever sources `builder` already has.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .set_default("port", 3001)?
            .set_default("data_dir", "data")?
            .set_default("uploads_dir", "uploads")?
            .set_default("backups_dir", "backups")?
            .set_default("allowed_origins", DEFAULT_ORIGINS.to_vec())?
            .set_default("max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("backup_retention", 30)?
            .build()?
            .try_deserialize()
    }

    /// Whether a presented admin token matches the configured one.
    pub fn is_admin(&self, presented: Option<&str>) -> bool {
        match (self.admin_token.as_deref(), presented) {
            (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
            _ => false,
        }
    }
}
