//! File Object Store - 文件系统对象存储实现
//!
//! 对象写入 media_dir 下，通过 /media 静态路由对外提供

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ObjectStorePort, StorageError};

/// 文件系统对象存储
pub struct FileObjectStore {
    /// 存储根目录
    base_dir: PathBuf,
    /// 对外访问前缀，如 http://localhost:8080/media
    public_base_url: String,
}

impl FileObjectStore {
    /// 创建新的文件存储
    pub async fn new(
        base_dir: impl AsRef<Path>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(Self {
            base_dir,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// key 只允许普通路径分量，防止写出根目录
    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && !key.contains('\\')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl ObjectStorePort for FileObjectStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        let path = self.object_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError(e.to_string()))?;
        }

        fs::write(&path, data)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(
            key = %key,
            content_type = %content_type,
            size = data.len(),
            "Saved object"
        );

        Ok(self.public_url(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(key)?;

        if !path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::read(&path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get() {
        let temp_dir = tempdir().unwrap();
        let store = FileObjectStore::new(temp_dir.path(), "http://localhost:8080/media/")
            .await
            .unwrap();

        let url = store
            .put("videos/abc.mp4", b"fake mp4", "video/mp4")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/media/videos/abc.mp4");
        assert!(temp_dir.path().join("videos/abc.mp4").exists());

        let data = store.get("videos/abc.mp4").await.unwrap();
        assert_eq!(data, b"fake mp4");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let temp_dir = tempdir().unwrap();
        let store = FileObjectStore::new(temp_dir.path(), "http://x/media")
            .await
            .unwrap();

        for key in ["", "../etc/passwd", "/abs/path", "a/../../b", "a\\b"] {
            let result = store.put(key, b"x", "text/plain").await;
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_get_missing() {
        let temp_dir = tempdir().unwrap();
        let store = FileObjectStore::new(temp_dir.path(), "http://x/media")
            .await
            .unwrap();
        assert!(matches!(
            store.get("audio/none.wav").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
