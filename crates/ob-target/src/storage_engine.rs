//! The on-disk object store itself — layout, erasure coding, mirroring,
//! LRU, dsort, ETL, checksumming — is an explicit Non-goal (spec.md §1);
//! it is treated as an external collaborator behind this trait (§9
//! "Embedded database" design note generalizes the same way: model the
//! collaborator as an interface, not a reimplementation). `LocalStorage`
//! below is a stub sufficient to exercise the control-plane handlers in
//! this crate, grounded on the shape of the teacher's `StorageEngine`
//! trait (`hafiz-storage/src/engine/mod.rs`) with the erasure/mirroring
//! surface trimmed away.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use ob_core::error::{Error, Result};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[async_trait]
pub trait StorageEngine: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<String>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
    async fn size(&self, bucket: &str, key: &str) -> Result<u64>;
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;
}

/// Flat-file stub: one file per object under `<data_dir>/<bucket>/<key>`.
/// No sharding, no checksDB, no mirroring — the real layout is the
/// collaborator's concern.
pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.data_dir.join(bucket)
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.bucket_path(bucket).join(key)
    }
}

#[async_trait]
impl StorageEngine for LocalStorage {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        let etag = hex::encode(Sha256::digest(&data));
        debug!(bucket, key, bytes = data.len(), "stored object");
        Ok(etag)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let path = self.object_path(bucket, key);
        if !path.exists() {
            return Err(Error::ObjectNotFound(format!("{bucket}/{key}")));
        }
        Ok(Bytes::from(fs::read(&path).await?))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.object_path(bucket, key).exists())
    }

    async fn size(&self, bucket: &str, key: &str) -> Result<u64> {
        let path = self.object_path(bucket, key);
        if !path.exists() {
            return Err(Error::ObjectNotFound(format!("{bucket}/{key}")));
        }
        Ok(fs::metadata(&path).await?.len())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        fs::create_dir_all(self.bucket_path(bucket)).await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let path = self.bucket_path(bucket);
        if path.exists() {
            let mut entries = fs::read_dir(&path).await?;
            if entries.next_entry().await?.is_some() {
                return Err(Error::BucketNotEmpty(bucket.to_string()));
            }
            fs::remove_dir_all(&path).await?;
        }
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.bucket_path(bucket).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let dir = tempdir();
        let storage = LocalStorage::new(&dir);
        storage.init().await.unwrap();
        storage.create_bucket("b1").await.unwrap();
        storage.put("b1", "obj.txt", Bytes::from_static(b"hello")).await.unwrap();
        let got = storage.get("b1", "obj.txt").await.unwrap();
        assert_eq!(&got[..], b"hello");
    }

    #[tokio::test]
    async fn get_missing_object_errors() {
        let dir = tempdir();
        let storage = LocalStorage::new(&dir);
        storage.init().await.unwrap();
        storage.create_bucket("b1").await.unwrap();
        assert!(matches!(storage.get("b1", "nope").await, Err(Error::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn delete_bucket_rejects_non_empty() {
        let dir = tempdir();
        let storage = LocalStorage::new(&dir);
        storage.init().await.unwrap();
        storage.create_bucket("b1").await.unwrap();
        storage.put("b1", "obj.txt", Bytes::from_static(b"x")).await.unwrap();
        assert!(matches!(storage.delete_bucket("b1").await, Err(Error::BucketNotEmpty(_))));
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("ob-target-test-{}", ob_core::utils::generate_job_uuid()));
        p
    }
}
