use crate::domain::country::{CountryQuery, CountryRecord, canonical_name, name_key};
use crate::domain::ports::{CountryStore, MetadataStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for country records.
///
/// Uses `Arc<RwLock<BTreeMap<String, CountryRecord>>>` keyed by `name_key`.
/// A batch upsert holds the write lock for the whole batch, so readers never
/// see half of a refresh.
#[derive(Default, Clone)]
pub struct InMemoryCountryStore {
    countries: Arc<RwLock<BTreeMap<String, CountryRecord>>>,
}

impl InMemoryCountryStore {
    /// Creates a new, empty in-memory country store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CountryStore for InMemoryCountryStore {
    async fn upsert_all(&self, records: Vec<CountryRecord>, as_of: DateTime<Utc>) -> Result<usize> {
        let staged: Vec<(String, CountryRecord)> = records
            .into_iter()
            .map(|mut record| {
                record.name = canonical_name(&record.name);
                record.last_refreshed_at = as_of;
                (name_key(&record.name), record)
            })
            .collect();
        let written = staged.len();

        let mut countries = self.countries.write().await;
        countries.extend(staged);
        Ok(written)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let countries = self.countries.read().await;
        Ok(countries.get(&name_key(name)).cloned())
    }

    async fn find_many(&self, query: &CountryQuery) -> Result<Vec<CountryRecord>> {
        let countries = self.countries.read().await;
        Ok(query.apply(countries.values().cloned()))
    }

    async fn delete_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let mut countries = self.countries.write().await;
        Ok(countries.remove(&name_key(name)))
    }

    async fn count(&self) -> Result<usize> {
        let countries = self.countries.read().await;
        Ok(countries.len())
    }
}

/// A thread-safe in-memory key/value store for snapshot metadata.
#[derive(Default, Clone)]
pub struct InMemoryMetadataStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryMetadataStore {
    /// Creates a new, empty in-memory metadata store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }
}
