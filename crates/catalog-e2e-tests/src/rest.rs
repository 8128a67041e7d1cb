use anyhow::{Result, anyhow};
use reqwest::{StatusCode, Url, header::LOCATION};
use serde_json::Value;

/// Target of redirect response
pub fn location(response: &reqwest::Response) -> Result<String> {
    let location = response
        .headers()
        .get(LOCATION)
        .ok_or_else(|| anyhow!("Missing location header"))?
        .to_str()?
        .to_string();
    Ok(location)
}

/// Id is last segment of resource url
pub fn id_from_url(url: &str) -> Result<i64> {
    let id = url
        .rsplit('/')
        .next()
        .ok_or_else(|| anyhow!("Invalid url {url}"))?
        .parse()?;
    Ok(id)
}

pub async fn get_view(client: &reqwest::Client, url: Url) -> Result<(StatusCode, Value)> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let view: Value = response.json().await?;
    Ok((status, view))
}

/// Creates genre and returns its url
pub async fn create_genre(
    client: &reqwest::Client,
    base_url: &Url,
    name: &str,
    description: &str,
) -> Result<String> {
    let url = base_url.join("genres/create")?;
    let response = client
        .post(url)
        .form(&[("name", name), ("description", description)])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
}
