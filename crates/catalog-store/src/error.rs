pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Invalid path")]
    InvalidPath,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Not found: {0:?}")]
    NotFound(String),
}
