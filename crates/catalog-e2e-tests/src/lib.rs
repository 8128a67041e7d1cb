use std::{path::Path, time::Duration};

use anyhow::{Result, anyhow};
use catalog_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::{Url, redirect::Policy};
use tempfile::TempDir;
use tracing::debug;

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    data_dir: TempDir,
}

impl ConfigGuard {
    pub fn path(&self) -> &Path {
        self.data_dir.path()
    }
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &[
        "catalog-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--upload-limit-mb",
        "1",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Configuration with fresh data directory in system temp
pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    test_config(test_name, &std::env::temp_dir())
}

pub fn base_url(args: &ServerConfig) -> Result<Url> {
    let url = Url::parse(&format!("http://{}:{}/", args.listen_address, args.port))?;
    Ok(url)
}

/// Client which does not follow redirects, so they can be checked
pub fn client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()?;
    Ok(client)
}

/// Starts server in background and waits until it is healthy
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let health_url = base_url(&args)?.join("health")?;
    tokio::spawn(async move {
        if let Err(e) = catalog_server::run(args).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => debug!("Server not ready: {}", response.status()),
            Err(e) => debug!("Server not ready: {e}"),
        }
    }
    Err(anyhow!("Server did not start"))
}

/// Launches server and returns client and base url for it
pub async fn launch_env(args: ServerConfig) -> Result<(reqwest::Client, Url)> {
    let base_url = base_url(&args)?;
    spawn_server(args).await?;
    Ok((client()?, base_url))
}
