use clap::Parser;
use std::{fs, path::PathBuf};

/// Storage locations shared by the server and the CLI
#[derive(Debug, Clone, Parser)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "CATALOG_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/catalog.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "CATALOG_DATA_DIR",
        help = "Data directory (database, cover images), default is system default like ~/.local/share/game-catalog",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "CATALOG_IMAGES_DIR",
        help = "Directory for uploaded cover images, default data_dir/public/images"
    )]
    images_dir: Option<PathBuf>,
}

fn default_data_dir() -> String {
    let dir = dirs::data_dir()
        .map(|p| p.join("game-catalog"))
        .unwrap_or_else(|| PathBuf::from("game-catalog"));

    if !fs::exists(&dir).expect("Failed to check if data directory exists") {
        fs::create_dir_all(&dir).expect("Failed to create data directory");
    } else if !dir.is_dir() {
        panic!("Data directory is not a directory",)
    }

    dir.to_string_lossy().to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.images_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("public").join("images"))
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/catalog.db", self.data_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let config =
            BackendConfig::try_parse_from(["catalog", "--data-dir", data_dir.as_str()]).unwrap();
        assert_eq!(config.data_dir(), dir.path());
        assert_eq!(config.images_dir(), dir.path().join("public/images"));
        assert_eq!(
            config.database_url(),
            format!("sqlite://{}/catalog.db", data_dir)
        );
    }

    #[test]
    fn test_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let config = BackendConfig::try_parse_from([
            "catalog",
            "--data-dir",
            data_dir.as_str(),
            "--database-url",
            "sqlite::memory:",
            "--images-dir",
            "/srv/covers",
        ])
        .unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.images_dir(), PathBuf::from("/srv/covers"));
    }
}
