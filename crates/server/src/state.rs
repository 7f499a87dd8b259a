//! Shared handler state.

use std::sync::Arc;

use navhub_client::fetch::{FetchClient, FetchConfig};
use navhub_client::{FaviconResolver, ResolverConfig};
use navhub_core::{AdminPolicy, AppConfig, BlobBucket, Database, Error};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub blobs: BlobBucket,
    pub resolver: FaviconResolver,
    pub policy: Arc<AdminPolicy>,
}

impl AppState {
    pub fn new(db: Database, blobs: BlobBucket, resolver: FaviconResolver, policy: AdminPolicy) -> Self {
        Self { db, blobs, resolver, policy: Arc::new(policy) }
    }

    /// Open the database and wire the resolver to it.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let db = Database::open(&config.db_path).await?;
        let blobs = BlobBucket::new(db.clone(), config.public_base_url.clone());
        let fetcher = FetchClient::new(FetchConfig::from_app_config(config))?;

        let resolver = FaviconResolver::new(
            Arc::new(fetcher),
            Arc::new(db.clone()),
            Arc::new(blobs.clone()),
            ResolverConfig::from_app_config(config)?,
        );

        Ok(Self::new(db, blobs, resolver, AdminPolicy::new(&config.admin_emails)))
    }
}
