use super::country::{CountryQuery, CountryRecord};
use super::source::{CountryDescriptor, RateTable};
use super::summary::Summary;
use crate::error::{Result, WorldstatError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Metadata key holding the start timestamp of the last completed refresh.
pub const LAST_REFRESHED_AT_KEY: &str = "last_refreshed_at";

/// Persistence gateway for country records.
///
/// Records are keyed by `name_key(name)`. Names passed to lookups and deletes
/// go through the same function, so callers may hand over raw user input.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Inserts or overwrites every record, stamping `last_refreshed_at = as_of`.
    /// Concurrent readers observe either none or all of the batch.
    async fn upsert_all(&self, records: Vec<CountryRecord>, as_of: DateTime<Utc>) -> Result<usize>;
    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>>;
    async fn find_many(&self, query: &CountryQuery) -> Result<Vec<CountryRecord>>;
    /// Returns the removed record, or `None` when no record matched.
    async fn delete_by_name(&self, name: &str) -> Result<Option<CountryRecord>>;
    async fn count(&self) -> Result<usize>;
}

/// Single-row key/value facts about the snapshot.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_last_refreshed_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.put(LAST_REFRESHED_AT_KEY, at.to_rfc3339()).await
    }

    async fn last_refreshed_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.get(LAST_REFRESHED_AT_KEY).await? else {
            return Ok(None);
        };
        let parsed = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| WorldstatError::InternalError(Box::new(e)))?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }
}

#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<CountryDescriptor>>;
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// Turns a summary into an artifact file. Each call fully replaces `target`.
pub trait SummaryRenderer: Send + Sync {
    fn render(&self, summary: &Summary, target: &Path) -> Result<()>;

    /// File name of the artifact inside the cache directory.
    fn file_name(&self) -> &'static str;
}

pub type CountryStoreRef = Arc<dyn CountryStore>;
pub type MetadataStoreRef = Arc<dyn MetadataStore>;
pub type CountrySourceRef = Arc<dyn CountrySource>;
pub type RateSourceRef = Arc<dyn RateSource>;
pub type SummaryRendererRef = Arc<dyn SummaryRenderer>;
