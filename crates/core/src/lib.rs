//! Core types and shared functionality for navhub.
//!
//! This crate provides:
//! - SQLite-backed record store (the link directory) and blob store
//! - Unified error types
//! - Configuration structures
//! - The admin access policy

pub mod config;
pub mod error;
pub mod policy;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use policy::AdminPolicy;
pub use store::{BlobBucket, BlobStore, Database, Link, RecordStore, RecordWriteMode, StoredBlob};
