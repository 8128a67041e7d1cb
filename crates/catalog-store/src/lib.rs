#![allow(async_fn_in_trait)]
use bytes::Bytes;
use error::{StoreError, StoreResult};
use futures::Stream;

pub mod error;
pub mod file_store;
use tracing::debug;

const MAX_NAME_LEN: usize = 255;
const NAME_INVALID_CHARS: &str = r#"/\:"#;

fn is_name_invalid(s: &str) -> bool {
    s.is_empty()
        || s.starts_with(".")
        || s.len() > MAX_NAME_LEN
        || s.chars()
            .any(|c| NAME_INVALID_CHARS.contains(c) || c.is_ascii_control())
}

/// Name of file directly in store root, validated not to escape root, be hidden or contain special chars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPath(String);

impl ValidPath {
    pub fn file_name(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        if is_name_invalid(&name) {
            debug!("Invalid file name: {name}");
            Err(StoreError::InvalidPath)
        } else {
            Ok(ValidPath(name))
        }
    }
}

impl AsRef<str> for ValidPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct StoreInfo {
    pub final_path: ValidPath,
    pub size: u64,
    /// SHA256 hash
    pub hash: String,
}

/// Files are stored under exactly the requested path, existing file is replaced
pub trait Store {
    async fn store_data(&self, path: &ValidPath, data: &[u8]) -> StoreResult<StoreInfo>;
    async fn load_data(
        &self,
        path: &ValidPath,
    ) -> Result<impl Stream<Item = StoreResult<Bytes>> + 'static, StoreError>;
    async fn size(&self, path: &ValidPath) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert!(ValidPath::file_name("doom cover.jpg").is_ok());
        assert!(ValidPath::file_name("covers/doom.jpg").is_err());
        assert!(ValidPath::file_name("..").is_err());
        assert!(ValidPath::file_name(".hidden").is_err());
        assert!(ValidPath::file_name("c:doom.jpg").is_err());
        assert!(ValidPath::file_name("dir\\doom.jpg").is_err());
        assert!(ValidPath::file_name("").is_err());
        assert!(ValidPath::file_name("x".repeat(256)).is_err());
    }
}
