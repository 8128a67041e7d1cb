use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use catalog_store::{Store as _, ValidPath};
use catalog_types::utils::file_ext;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/images/{file}", get(image))
}

/// Streams stored cover image
pub async fn image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let path = ValidPath::file_name(file)?;
    let store = state.store();
    let size = store.size(&path).await?;
    let data = store.load_data(&path).await?;

    let mime = file_ext(path.as_ref())
        .and_then(|ext| new_mime_guess::from_ext(&ext).first().map(|m| m.to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_str(&mime).map_err(|e| ApiError::InternalError(e.to_string()))?,
    );
    headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from(size));

    Ok((StatusCode::OK, headers, Body::from_stream(data)))
}
