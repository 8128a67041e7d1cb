use std::sync::Arc;

use catalog_dal::Pool;
use catalog_store::file_store::FileStore;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        let store = FileStore::new(app_config.images_dir.clone());
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                pool,
                store,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    /// Store for uploaded cover images
    pub fn store(&self) -> &FileStore {
        &self.state.store
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
    store: FileStore,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub images_dir: std::path::PathBuf,
    pub upload_limit_mb: usize,
}
