//! Blob storage for downloaded favicons.
//!
//! Blobs live in the `blobs` table keyed by path-like strings
//! (`favicons/{domain}.ico`). Writes are upserts, so a later resolution for
//! the same key replaces the earlier body. Public URLs are
//! `{public_base_url}/storage/{key}` and are served by the HTTP layer.

use super::connection::Database;
use super::hash::content_digest;
use super::BlobStore;
use crate::Error;
use async_trait::async_trait;
use serde::Serialize;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

/// Path prefix under which blobs are publicly served.
pub const STORAGE_PREFIX: &str = "storage";

/// A stored blob with its serving metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    pub key: String,
    pub content_type: String,
    pub cache_control: String,
    /// Hex SHA-256 of `bytes`.
    pub digest: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub updated_at: String,
}

impl Database {
    /// Insert or overwrite the blob at `key`.
    pub async fn upsert_blob(
        &self, key: &str, bytes: Vec<u8>, content_type: &str, cache_control: &str,
    ) -> Result<(), Error> {
        let key = key.to_string();
        let content_type = content_type.to_string();
        let cache_control = cache_control.to_string();
        let digest = content_digest(&bytes);
        let updated_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO blobs (key, content_type, cache_control, digest, size, bytes, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(key) DO UPDATE SET
                         content_type = excluded.content_type,
                         cache_control = excluded.cache_control,
                         digest = excluded.digest,
                         size = excluded.size,
                         bytes = excluded.bytes,
                         updated_at = excluded.updated_at",
                    params![key, content_type, cache_control, digest, bytes.len() as i64, bytes, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a blob by key.
    pub async fn fetch_blob(&self, key: &str) -> Result<Option<StoredBlob>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredBlob>, Error> {
                let blob = conn
                    .query_row(
                        "SELECT key, content_type, cache_control, digest, bytes, updated_at
                         FROM blobs WHERE key = ?1",
                        params![key],
                        |row| {
                            Ok(StoredBlob {
                                key: row.get(0)?,
                                content_type: row.get(1)?,
                                cache_control: row.get(2)?,
                                digest: row.get(3)?,
                                bytes: row.get(4)?,
                                updated_at: row.get(5)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(blob)
            })
            .await
            .map_err(Error::from)
    }
}

/// The database's blob table exposed under a public base URL.
#[derive(Clone, Debug)]
pub struct BlobBucket {
    db: Database,
    public_base_url: String,
}

impl BlobBucket {
    pub fn new(db: Database, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { db, public_base_url }
    }
}

#[async_trait]
impl BlobStore for BlobBucket {
    async fn put_blob(&self, key: &str, bytes: Vec<u8>, content_type: &str, cache_control: &str) -> Result<(), Error> {
        self.db.upsert_blob(key, bytes, content_type, cache_control).await
    }

    async fn get_blob(&self, key: &str) -> Result<Option<StoredBlob>, Error> {
        self.db.fetch_blob(key).await
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{STORAGE_PREFIX}/{}", self.public_base_url, key.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn bucket() -> BlobBucket {
        let db = Database::open_in_memory().await.unwrap();
        BlobBucket::new(db, "https://nav.example.com/")
    }

    #[tokio::test]
    async fn test_put_and_get_blob() {
        let bucket = bucket().await;
        bucket
            .put_blob("favicons/example.com.ico", vec![1, 2, 3], "image/x-icon", "public, max-age=60")
            .await
            .unwrap();

        let blob = bucket.get_blob("favicons/example.com.ico").await.unwrap().unwrap();
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.content_type, "image/x-icon");
        assert_eq!(blob.cache_control, "public, max-age=60");
        assert_eq!(blob.digest, content_digest(&[1, 2, 3]));
    }

    #[tokio::test]
    async fn test_get_missing_blob() {
        let bucket = bucket().await;
        assert!(bucket.get_blob("favicons/none.ico").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let bucket = bucket().await;
        let key = "favicons/example.com.ico";
        bucket.put_blob(key, vec![1], "image/x-icon", "no-cache").await.unwrap();
        bucket.put_blob(key, vec![9, 9], "image/png", "no-cache").await.unwrap();

        let blob = bucket.get_blob(key).await.unwrap().unwrap();
        assert_eq!(blob.bytes, vec![9, 9]);
        assert_eq!(blob.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_public_url_is_deterministic() {
        let bucket = bucket().await;
        assert_eq!(
            bucket.public_url("favicons/example.com.ico"),
            "https://nav.example.com/storage/favicons/example.com.ico"
        );
        assert_eq!(bucket.public_url("favicons/example.com.ico"), bucket.public_url("/favicons/example.com.ico"));
    }
}
