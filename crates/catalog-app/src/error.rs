use axum::{
    extract::{multipart::MultipartError, rejection::FormRejection},
    response::{IntoResponse, Response},
};
use catalog_store::error::StoreError;
use http::StatusCode;
use tracing::error;

use crate::view::View;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unprocessable request: {0}")]
    UnprocessableRequest(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(catalog_dal::Error),

    #[error("Store error: {0}")]
    StoreError(StoreError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<catalog_dal::Error> for ApiError {
    fn from(e: catalog_dal::Error) -> Self {
        match e {
            catalog_dal::Error::RecordNotFound(entity) => ApiError::ResourceNotFound(entity),
            catalog_dal::Error::ValidationError(report) => {
                ApiError::UnprocessableRequest(report.to_string())
            }
            catalog_dal::Error::InvalidOrderByField(field) => {
                ApiError::InvalidRequest(format!("Invalid order by field: {field}"))
            }
            e => ApiError::DatabaseError(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => ApiError::ResourceNotFound(path),
            StoreError::InvalidPath => ApiError::InvalidRequest("Invalid path".into()),
            e => ApiError::StoreError(e),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidRequest(format!("Invalid multipart data: {}", e.body_text()))
    }
}

impl From<FormRejection> for ApiError {
    fn from(e: FormRejection) -> Self {
        ApiError::InvalidRequest(e.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnprocessableRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) | ApiError::StoreError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ResourceNotFound(_))
    }
}

#[derive(serde::Serialize)]
struct ErrorPage {
    status: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::ResourceNotFound(what) => format!("{what} not found"),
            ApiError::InvalidRequest(_) | ApiError::UnprocessableRequest(_) => self.to_string(),
            _ => {
                error!("Request failed: {self}");
                "Internal server error".to_string()
            }
        };
        let title = status.canonical_reason().unwrap_or("Error").to_string();
        View::new(
            "error",
            title,
            ErrorPage {
                status: status.as_u16(),
                message,
            },
        )
        .with_status(status)
        .into_response()
    }
}
