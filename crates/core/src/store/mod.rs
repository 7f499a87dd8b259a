//! SQLite-backed persistence for the link directory and favicon blobs.
//!
//! This module provides:
//!
//! - The `RecordStore` and `BlobStore` seams the favicon resolver depends on
//! - A `Database` handle with async access via tokio-rusqlite
//! - Automatic schema migrations and WAL mode
//! - Link CRUD and search for the directory

pub mod blobs;
pub mod connection;
pub mod hash;
pub mod links;
pub mod migrations;

pub use crate::Error;

pub use blobs::{BlobBucket, StoredBlob};
pub use connection::Database;
pub use links::{CategoryCount, Link, LinkPatch, NewLink};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How a resolved icon is written back for a url.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordWriteMode {
    /// Update an existing row; a missing row is a no-op.
    #[default]
    Update,
    /// Also record urls with no directory row, in a cache kept apart from
    /// the public directory.
    Upsert,
}

/// Lookup and write-back of cached icon URLs, keyed by the exact url string.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The cached icon for `url`, if one has been recorded.
    async fn find_icon(&self, url: &str) -> Result<Option<String>, Error>;

    /// Record `icon` for `url`. Returns whether a row was written.
    async fn write_icon(&self, url: &str, icon: &str, mode: RecordWriteMode) -> Result<bool, Error>;
}

/// Binary object storage with deterministic public URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Insert or overwrite the blob at `key`.
    async fn put_blob(&self, key: &str, bytes: Vec<u8>, content_type: &str, cache_control: &str) -> Result<(), Error>;

    async fn get_blob(&self, key: &str) -> Result<Option<StoredBlob>, Error>;

    /// Public URL for `key`. Pure; does not check existence.
    fn public_url(&self, key: &str) -> String;
}
