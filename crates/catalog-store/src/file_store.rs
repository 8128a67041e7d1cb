use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use futures::{Stream, TryFutureExt as _, TryStreamExt as _};
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt as _};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use super::{
    Store, StoreInfo, ValidPath,
    error::{StoreError, StoreResult},
};

#[inline]
fn hex(bytes: &[u8]) -> String {
    base16ct::lower::encode_string(bytes)
}

async fn tmp_path(final_path: &Path) -> StoreResult<PathBuf> {
    let id = uuid::Uuid::new_v4().to_string();
    let tmp_path = final_path.with_extension(format!("{id}.tmp"));
    if let Some(parent) = tmp_path.parent() {
        match fs::metadata(parent).await {
            Ok(meta) => {
                if !meta.is_dir() {
                    error!("Parent is not a directory: {parent:?}");
                    return Err(StoreError::InvalidPath);
                }
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::NotFound {
                    fs::create_dir_all(parent).await?;
                } else {
                    error!("Failed to stat parent: {parent:?}: {e}");
                    return Err(e.into());
                }
            }
        }
    }
    Ok(tmp_path)
}

async fn cleanup<E: Display>(path: &Path, error: E) -> Result<(), E> {
    error!("Failed to store file to path {path:?}: {error}");
    if fs::try_exists(path).await.unwrap_or(false) {
        fs::remove_file(path)
            .await
            .map_err(|e| error!("Failed to remove file {path:?}: {e}"))
            .ok();
    }
    Err(error)
}

fn not_found(path: &ValidPath) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.as_ref().to_string())
        } else {
            e.into()
        }
    }
}

struct FileStoreInner {
    root: PathBuf,
}

#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(FileStoreInner { root: root.into() }),
        }
    }
}

impl Store for FileStore {
    /// Data are written to temporary file first and then renamed over final path,
    /// so readers never see partially written file
    async fn store_data(&self, path: &ValidPath, data: &[u8]) -> StoreResult<StoreInfo> {
        let final_path = self.inner.root.join(path.as_ref());
        if fs::metadata(&final_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            error!("Cannot overwrite directory {final_path:?}");
            return Err(StoreError::InvalidPath);
        }
        let tmp_path = tmp_path(&final_path).await?;
        let mut new_file = fs::File::create(&tmp_path)
            .await
            .inspect_err(|e| error!("Failed to create tmp file {tmp_path:?}: {e}"))?;
        new_file
            .write_all(data)
            .or_else(|e| cleanup(&tmp_path, e))
            .await?;
        new_file.flush().or_else(|e| cleanup(&tmp_path, e)).await?;
        drop(new_file);
        fs::rename(&tmp_path, &final_path)
            .or_else(|e| cleanup(&tmp_path, e))
            .await?;
        let size = data.len() as u64;
        debug!("Stored {size} bytes to {final_path:?}");
        let digest = Sha256::digest(data);
        Ok(StoreInfo {
            final_path: path.clone(),
            size,
            hash: hex(&digest),
        })
    }

    async fn load_data(
        &self,
        path: &ValidPath,
    ) -> Result<impl Stream<Item = StoreResult<Bytes>> + 'static, StoreError> {
        let final_path = self.inner.root.join(path.as_ref());
        let file = fs::File::open(&final_path).await.map_err(not_found(path))?;
        let stream = ReaderStream::new(file).map_err(StoreError::from);
        Ok(stream)
    }

    async fn size(&self, path: &ValidPath) -> StoreResult<u64> {
        let final_path = self.inner.root.join(path.as_ref());
        let meta = fs::metadata(&final_path).await.map_err(not_found(path))?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt as _;

    use super::*;

    async fn load_all(store: &FileStore, path: &ValidPath) -> Vec<u8> {
        let mut stream = store.load_data(path).await.unwrap();
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        data
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn test_store() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let content = b"neco tady je";
        let store = FileStore::new(tmp_dir.path());
        let store2 = store.clone();
        // test to move store to other thread
        let validated_path = ValidPath::file_name("doom.jpg").unwrap();
        let validated_path2 = validated_path.clone();
        let handle =
            tokio::spawn(async move { store2.store_data(&validated_path2, content).await });
        let res = handle.await.unwrap().unwrap();
        assert_eq!(res.size, 12);
        assert_eq!(res.final_path.as_ref(), "doom.jpg");
        assert_eq!(res.hash.len(), 64);
        let res_path = tmp_dir.path().join("doom.jpg");
        assert_eq!(fs::read(&res_path).await.unwrap(), content);
        assert_eq!(store.size(&validated_path).await.unwrap(), 12);
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn test_overwrite() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp_dir.path());
        let path = ValidPath::file_name("cover.png").unwrap();
        store.store_data(&path, b"first version").await.unwrap();
        let res = store.store_data(&path, b"second").await.unwrap();
        assert_eq!(res.final_path.as_ref(), "cover.png");
        assert_eq!(load_all(&store, &path).await, b"second");

        let mut entries = std::fs::read_dir(tmp_dir.path()).unwrap();
        let only = entries.next().unwrap().unwrap();
        assert_eq!(only.file_name(), "cover.png");
        assert!(entries.next().is_none(), "no temporary files left");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn test_load() {
        let size = 100 * 1024;
        let tmp_dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..size).map(|_| rand::random::<u8>()).collect();
        let store = FileStore::new(tmp_dir.path());
        let path = ValidPath::file_name("data.bin").unwrap();
        store.store_data(&path, &data).await.unwrap();

        let loaded = load_all(&store, &path).await;
        assert_eq!(loaded.len(), size);
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_missing() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp_dir.path());
        let path = ValidPath::file_name("missing.jpg").unwrap();
        let res = store.load_data(&path).await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));
        let res = store.size(&path).await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));
    }
}
