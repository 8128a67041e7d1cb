use crate::config::ServerConfig;
use crate::error::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use catalog_app::{
    rest_api::game::CATALOG_URL,
    state::{AppConfig, AppState},
};
use futures::FutureExt;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if args.cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    debug!("Server stopped");
    Ok(())
}

fn main_router(state: AppState) -> Router<()> {
    let upload_limit = state.config().upload_limit_mb * 1024 * 1024;
    Router::new()
        .merge(catalog_app::rest_api::router())
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
        .route("/", get(root))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn root() -> impl IntoResponse {
    Redirect::to(CATALOG_URL)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let app_config = AppConfig {
        images_dir: config.images_dir(),
        upload_limit_mb: config.upload_limit_mb,
    };

    if !app_config.images_dir.is_dir() {
        tokio::fs::create_dir_all(&app_config.images_dir).await?;
        info!("Created directory for cover images");
    }

    let pool = catalog_dal::new_pool(&config.database_url()).await?;
    catalog_dal::migrate(&pool).await?;
    Ok(AppState::new(app_config, pool))
}
