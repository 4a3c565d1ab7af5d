use crate::application::summary::SummaryCache;
use crate::domain::country::{CountryQuery, CountryRecord};
use crate::domain::ports::{CountrySourceRef, CountryStoreRef, MetadataStoreRef, RateSourceRef};
use crate::domain::reconcile::reconcile;
use crate::error::{Result, SourceId, WorldstatError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Phases of one refresh cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Fetching,
    Reconciling,
    Committing,
    Stamping,
    CacheRebuild,
    Done,
    Failed,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshPhase::Fetching => "fetching",
            RefreshPhase::Reconciling => "reconciling",
            RefreshPhase::Committing => "committing",
            RefreshPhase::Stamping => "stamping",
            RefreshPhase::CacheRebuild => "cache_rebuild",
            RefreshPhase::Done => "done",
            RefreshPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub records_processed: usize,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Shape reported to callers when a refresh could not reach its sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshFailure {
    pub source_unavailable: bool,
    pub source: SourceId,
    pub details: String,
}

impl RefreshFailure {
    pub fn from_error(err: &WorldstatError) -> Option<Self> {
        match err {
            WorldstatError::SourceUnavailable { source_id, details } => Some(Self {
                source_unavailable: true,
                source: *source_id,
                details: details.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub total_countries: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(String),
    NotFound,
}

/// Coordinates refresh cycles and serves reads over the country snapshot.
///
/// A refresh fetches both feeds concurrently, reconciles them, commits the
/// result in one batch, stamps the refresh time and finally hands the
/// summary rebuild to a background task whose outcome only reaches the log.
pub struct CountryEngine {
    countries: CountrySourceRef,
    rates: RateSourceRef,
    store: CountryStoreRef,
    metadata: MetadataStoreRef,
    summary: SummaryCache,
    refresh_lock: Mutex<()>,
    pending_summary: Mutex<Option<JoinHandle<()>>>,
}

impl CountryEngine {
    /// Creates a new `CountryEngine`.
    ///
    /// # Arguments
    ///
    /// * `countries` - Source of the country catalog.
    /// * `rates` - Source of USD exchange rates.
    /// * `store` - Persistence gateway for country records.
    /// * `metadata` - Key/value store holding the refresh stamp.
    /// * `summary` - Builder for the summary artifact.
    pub fn new(
        countries: CountrySourceRef,
        rates: RateSourceRef,
        store: CountryStoreRef,
        metadata: MetadataStoreRef,
        summary: SummaryCache,
    ) -> Self {
        Self {
            countries,
            rates,
            store,
            metadata,
            summary,
            refresh_lock: Mutex::new(()),
            pending_summary: Mutex::new(None),
        }
    }

    /// Runs one refresh cycle.
    ///
    /// Cycles are serialized: a second caller waits for the running cycle to
    /// finish before starting its own. When either source fails nothing is
    /// written and the previous snapshot and stamp stay as they were.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let _cycle = self.refresh_lock.lock().await;
        let as_of = Utc::now();

        info!(phase = %RefreshPhase::Fetching, "refresh cycle started");
        let (countries, rates) =
            tokio::join!(self.countries.fetch_countries(), self.rates.fetch_rates());
        let (countries, rates) = match (countries, rates) {
            (Ok(countries), Ok(rates)) => (countries, rates),
            (Err(err), _) => return Err(fail(SourceId::Countries, err)),
            (_, Err(err)) => return Err(fail(SourceId::Rates, err)),
        };

        info!(
            phase = %RefreshPhase::Reconciling,
            descriptors = countries.len(),
            rates = rates.len()
        );
        let records: Vec<CountryRecord> =
            reconcile(&countries, &rates, as_of, &mut rand::thread_rng());

        info!(phase = %RefreshPhase::Committing, records = records.len());
        let records_processed = self.store.upsert_all(records, as_of).await?;

        info!(phase = %RefreshPhase::Stamping, %as_of);
        self.metadata.set_last_refreshed_at(as_of).await?;

        info!(phase = %RefreshPhase::CacheRebuild);
        self.schedule_summary_rebuild().await;

        info!(phase = %RefreshPhase::Done, records_processed, "refresh cycle finished");
        Ok(RefreshReport {
            records_processed,
            last_refreshed_at: as_of,
        })
    }

    async fn schedule_summary_rebuild(&self) {
        let summary = self.summary.clone();
        let handle = tokio::spawn(async move {
            match summary.rebuild().await {
                Ok(path) => info!(path = %path.display(), "summary image rebuilt"),
                Err(err) => error!(error = %err, "summary image rebuild failed"),
            }
        });
        *self.pending_summary.lock().await = Some(handle);
    }

    /// Waits for the most recently scheduled summary rebuild, if any.
    pub async fn wait_for_summary(&self) {
        let handle = self.pending_summary.lock().await.take();
        if let Some(handle) = handle
            && let Err(err) = handle.await
        {
            error!(error = %err, "summary rebuild task aborted");
        }
    }

    pub async fn countries(&self, query: &CountryQuery) -> Result<Vec<CountryRecord>> {
        self.store.find_many(query).await
    }

    /// Looks a country up by name in any capitalization.
    pub async fn country(&self, name: &str) -> Result<Option<CountryRecord>> {
        let name = required_name(name)?;
        self.store.find_by_name(name).await
    }

    pub async fn delete_country(&self, name: &str) -> Result<DeleteOutcome> {
        let name = required_name(name)?;
        match self.store.delete_by_name(name).await? {
            Some(removed) => {
                info!(name = %removed.name, "country deleted");
                Ok(DeleteOutcome::Deleted(removed.name))
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    pub async fn status(&self) -> Result<StatusReport> {
        Ok(StatusReport {
            total_countries: self.store.count().await?,
            last_refreshed_at: self.metadata.last_refreshed_at().await?,
        })
    }

    /// Path of the summary artifact, or `None` before the first rebuild.
    pub async fn summary_image(&self) -> Option<PathBuf> {
        self.summary.existing().await
    }
}

fn fail(source_id: SourceId, err: WorldstatError) -> WorldstatError {
    let err = match err {
        WorldstatError::SourceUnavailable { .. } => err,
        other => WorldstatError::SourceUnavailable {
            source_id,
            details: other.to_string(),
        },
    };
    warn!(phase = %RefreshPhase::Failed, error = %err, "refresh cycle aborted");
    err
}

fn required_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WorldstatError::ValidationError(
            "name parameter is required".to_string(),
        ));
    }
    Ok(trimmed)
}
