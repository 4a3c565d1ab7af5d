use crate::domain::country::{CountryQuery, CountryRecord, canonical_name, name_key};
use crate::domain::ports::{CountryStore, MetadataStore};
use crate::error::{Result, WorldstatError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Column Family for storing country records keyed by `name_key`.
pub const CF_COUNTRIES: &str = "countries";
/// Column Family for the key/value snapshot metadata.
pub const CF_METADATA: &str = "metadata";

/// A persistent store implementation using RocksDB.
///
/// Holds country records and snapshot metadata in separate Column Families.
/// Batch upserts go through a single `WriteBatch`, and scans run over the
/// iterator's implicit snapshot, so a reader never mixes two refreshes.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("countries" and "metadata") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_countries = ColumnFamilyDescriptor::new(CF_COUNTRIES, Options::default());
        let cf_metadata = ColumnFamilyDescriptor::new(CF_METADATA, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_countries, cf_metadata])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| WorldstatError::internal(format!("{name} column family not found")))
    }

    fn scan_countries(&self) -> Result<Vec<CountryRecord>> {
        let cf = self.cf(CF_COUNTRIES)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(decode(&value)?);
        }
        Ok(records)
    }
}

fn encode(record: &CountryRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| WorldstatError::InternalError(Box::new(e)))
}

fn decode(bytes: &[u8]) -> Result<CountryRecord> {
    serde_json::from_slice(bytes).map_err(|e| WorldstatError::InternalError(Box::new(e)))
}

#[async_trait]
impl CountryStore for RocksDBStore {
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    async fn upsert_all(&self, records: Vec<CountryRecord>, as_of: DateTime<Utc>) -> Result<usize> {
        let cf = self.cf(CF_COUNTRIES)?;
        let mut batch = WriteBatch::default();
        let written = records.len();

        for mut record in records {
            record.name = canonical_name(&record.name);
            record.last_refreshed_at = as_of;
            batch.put_cf(cf, name_key(&record.name).as_bytes(), encode(&record)?);
        }

        self.db.write(batch)?;
        Ok(written)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let cf = self.cf(CF_COUNTRIES)?;
        match self.db.get_cf(cf, name_key(name).as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_many(&self, query: &CountryQuery) -> Result<Vec<CountryRecord>> {
        Ok(query.apply(self.scan_countries()?))
    }

    async fn delete_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let cf = self.cf(CF_COUNTRIES)?;
        let key = name_key(name);
        let Some(bytes) = self.db.get_pinned_cf(cf, key.as_bytes())? else {
            return Ok(None);
        };
        let removed = decode(&bytes)?;
        drop(bytes);
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(Some(removed))
    }

    async fn count(&self) -> Result<usize> {
        let cf = self.cf(CF_COUNTRIES)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl MetadataStore for RocksDBStore {
    async fn put(&self, key: &str, value: String) -> Result<()> {
        let cf = self.cf(CF_METADATA)?;
        self.db.put_cf(cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.cf(CF_METADATA)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| WorldstatError::InternalError(Box::new(e))),
            None => Ok(None),
        }
    }
}
