use crate::domain::country::{CountryQuery, SortOrder};
use crate::domain::ports::{CountryStoreRef, MetadataStoreRef, SummaryRendererRef};
use crate::domain::summary::{RankedCountry, Summary, TOP_COUNT};
use crate::error::{Result, WorldstatError};
use std::path::{Path, PathBuf};

/// Rebuilds the summary artifact from whatever the store currently holds.
#[derive(Clone)]
pub struct SummaryCache {
    store: CountryStoreRef,
    metadata: MetadataStoreRef,
    renderer: SummaryRendererRef,
    path: PathBuf,
}

impl SummaryCache {
    pub fn new(
        store: CountryStoreRef,
        metadata: MetadataStoreRef,
        renderer: SummaryRendererRef,
        cache_dir: impl AsRef<Path>,
    ) -> Self {
        let path = cache_dir.as_ref().join(renderer.file_name());
        Self {
            store,
            metadata,
            renderer,
            path,
        }
    }

    /// Location the artifact is written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gathers the total count, the GDP ranking and the refresh stamp.
    pub async fn collect(&self) -> Result<Summary> {
        let total_countries = self.store.count().await?;
        let ranked = self
            .store
            .find_many(&CountryQuery {
                sort: SortOrder::GdpDesc,
                ..Default::default()
            })
            .await?;
        let top_by_gdp = ranked
            .iter()
            .filter_map(RankedCountry::from_record)
            .take(TOP_COUNT)
            .collect();
        let last_refreshed_at = self.metadata.last_refreshed_at().await?;

        Ok(Summary {
            total_countries,
            top_by_gdp,
            last_refreshed_at,
        })
    }

    /// Renders a fresh artifact, replacing the previous one.
    pub async fn rebuild(&self) -> Result<PathBuf> {
        let summary = self.collect().await?;
        let renderer = self.renderer.clone();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || renderer.render(&summary, &path))
            .await
            .map_err(|e| WorldstatError::InternalError(Box::new(e)))??;

        Ok(self.path.clone())
    }

    /// The artifact path, if a rebuild has ever produced it.
    pub async fn existing(&self) -> Option<PathBuf> {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => Some(self.path.clone()),
            _ => None,
        }
    }
}
