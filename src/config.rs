//! Runtime settings and the wiring of adapters into a `CountryEngine`.

use crate::application::engine::CountryEngine;
use crate::application::summary::SummaryCache;
use crate::domain::ports::{CountryStoreRef, MetadataStoreRef};
use crate::error::Result;
use crate::infrastructure::http::{HttpCountrySource, HttpRateSource, http_client};
use crate::infrastructure::in_memory::{InMemoryCountryStore, InMemoryMetadataStore};
use crate::infrastructure::svg::SvgSummaryRenderer;
use crate::logging::LogFormat;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_DB_PATH: &str = "data/worldstat.db";

/// Settings shared by every subcommand. Each flag falls back to an
/// environment variable, which may in turn come from a `.env` file.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Countries catalog endpoint
    #[arg(long, global = true, env = "COUNTRIES_API_URL", default_value = DEFAULT_COUNTRIES_URL)]
    pub countries_url: String,

    /// USD exchange rates endpoint
    #[arg(long, global = true, env = "EXCHANGE_RATES_API_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Directory holding the summary image
    #[arg(long, global = true, env = "CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Path to the persistent RocksDB database
    #[arg(long, global = true, env = "DATABASE_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Keep the snapshot in memory only; nothing survives the process
    #[arg(long, global = true)]
    pub in_memory: bool,

    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Both persistence handles. They share one backend when it is persistent.
pub struct Stores {
    pub countries: CountryStoreRef,
    pub metadata: MetadataStoreRef,
}

pub fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            std::fs::create_dir_all(path)?;
            let store = Arc::new(crate::infrastructure::rocksdb::RocksDBStore::open(path)?);
            tracing::debug!(path = %path.display(), "opened rocksdb store");
            Ok(Stores {
                countries: store.clone(),
                metadata: store,
            })
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "Persistent storage requested, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

fn in_memory_stores() -> Stores {
    Stores {
        countries: Arc::new(InMemoryCountryStore::new()),
        metadata: Arc::new(InMemoryMetadataStore::new()),
    }
}

impl Settings {
    /// Database location, or `None` when running in memory.
    pub fn store_path(&self) -> Option<&Path> {
        (!self.in_memory).then_some(self.db_path.as_path())
    }

    /// Assembles the engine from HTTP sources, the selected store and the SVG renderer.
    pub fn build_engine(&self) -> Result<CountryEngine> {
        let stores = open_stores(self.store_path())?;
        let client = http_client()?;
        let summary = SummaryCache::new(
            stores.countries.clone(),
            stores.metadata.clone(),
            Arc::new(SvgSummaryRenderer),
            &self.cache_dir,
        );

        Ok(CountryEngine::new(
            Arc::new(HttpCountrySource::new(client.clone(), &self.countries_url)),
            Arc::new(HttpRateSource::new(client, &self.rates_url)),
            stores.countries,
            stores.metadata,
            summary,
        ))
    }
}
