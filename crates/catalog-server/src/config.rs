use std::path::PathBuf;

use crate::error::Result;
use catalog_types::config::BackendConfig;
pub use clap::Parser;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "CATALOG_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "CATALOG_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "CATALOG_UPLOAD_LIMIT_MB",
        default_value = "10",
        help = "Maximum upload size in MB"
    )]
    pub upload_limit_mb: usize,

    #[arg(long, env = "CATALOG_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.backend.data_dir()
    }

    pub fn images_dir(&self) -> PathBuf {
        self.backend.images_dir()
    }

    pub fn database_url(&self) -> String {
        self.backend.database_url()
    }
}
