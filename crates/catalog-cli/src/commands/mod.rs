pub mod migrate;
pub mod populate;

use catalog_types::config::BackendConfig;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens database from backend configuration and brings schema up to date
pub(crate) async fn open_database(backend: &BackendConfig) -> anyhow::Result<catalog_dal::Pool> {
    let data_dir = backend.data_dir();
    if !data_dir.is_dir() {
        tokio::fs::create_dir_all(&data_dir).await?;
    }
    let pool = catalog_dal::new_pool(&backend.database_url()).await?;
    catalog_dal::migrate(&pool).await?;
    Ok(pool)
}
