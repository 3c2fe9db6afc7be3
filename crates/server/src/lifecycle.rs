//! Startup lifecycle: precache install and stale-generation cleanup.
//!
//! Mirrors the two-phase bring-up of the cache. Install fetches every
//! manifest asset from the origin and commits them to the current static
//! bucket in a single transaction, so a half-populated precache is never
//! observable. Activate then deletes every bucket that does not belong to
//! the current cache version. Both run to completion before the gateway
//! starts accepting traffic.

use std::sync::Arc;

use portico_client::{Origin, OriginRequest};
use portico_core::cache::hash::compute_cache_key;
use portico_core::{Bucket, CacheDb, Error, valid_bucket_names};

/// Bring-up phase the gateway is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Precache not yet committed.
    Installing,
    /// Precache committed; stale generations may still exist.
    Waiting,
    /// Current generation is the only one left; ready to serve.
    Active,
}

/// Runs the install and activate phases against one cache version.
pub struct Lifecycle {
    db: CacheDb,
    origin: Arc<dyn Origin>,
    version: String,
    precache_assets: Vec<String>,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new(db: CacheDb, origin: Arc<dyn Origin>, version: String, precache_assets: Vec<String>) -> Self {
        Self { db, origin, version, precache_assets, state: LifecycleState::Installing }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Fetch every manifest asset and commit them atomically.
    ///
    /// Every asset must come back with status 200. Any fetch failure or
    /// non-200 status aborts the install and nothing is written, leaving
    /// whatever the previous run committed untouched.
    pub async fn install(&mut self) -> Result<(), Error> {
        let bucket = Bucket::Static.versioned_name(&self.version);
        let mut staged = Vec::with_capacity(self.precache_assets.len());

        for asset in &self.precache_assets {
            let response = self
                .origin
                .fetch(OriginRequest::get(asset))
                .await
                .map_err(|e| Error::Precache(format!("{asset}: {e}")))?;

            if response.status.as_u16() != 200 {
                return Err(Error::Precache(format!("{asset}: status {}", response.status.as_u16())));
            }

            let key = compute_cache_key("GET", asset);
            staged.push((key, "GET".to_string(), asset.clone(), response.to_stored()));
        }

        let count = staged.len();
        self.db.put_all(&bucket, staged).await?;
        self.state = LifecycleState::Waiting;
        tracing::info!(bucket = %bucket, assets = count, "Precache installed");
        Ok(())
    }

    /// Delete every bucket that is not part of the current version.
    ///
    /// Bucket names are derived from the version label, so bumping the
    /// version orphans the previous generation's buckets; this removes
    /// them.
    pub async fn activate(&mut self) -> Result<(), Error> {
        let valid = valid_bucket_names(&self.version);

        for name in self.db.bucket_names().await? {
            if !valid.contains(&name) {
                let removed = self.db.delete_bucket(&name).await?;
                tracing::info!(bucket = %name, entries = removed, "Deleted stale cache generation");
            }
        }

        self.state = LifecycleState::Active;
        Ok(())
    }
}
