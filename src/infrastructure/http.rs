//! Adapters for the two external feeds.
//!
//! Each adapter issues exactly one GET per call. Transport errors, non-2xx
//! statuses and undecodable bodies all surface as `SourceUnavailable`; there
//! are no retries and no timeout beyond what the shared client imposes.

use crate::domain::ports::{CountrySource, RateSource};
use crate::domain::source::{CountryDescriptor, RateTable, parse_descriptors};
use crate::error::{Result, SourceId, WorldstatError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Builds the HTTP client shared by both adapters.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("worldstat/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| WorldstatError::InternalError(Box::new(e)))
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    source_id: SourceId,
) -> Result<T> {
    let unavailable = |details: String| WorldstatError::SourceUnavailable { source_id, details };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("GET {url} returned {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| unavailable(format!("invalid payload from {url}: {e}")))
}

#[derive(Clone)]
pub struct HttpCountrySource {
    client: Client,
    url: String,
}

impl HttpCountrySource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CountrySource for HttpCountrySource {
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    async fn fetch_countries(&self) -> Result<Vec<CountryDescriptor>> {
        let values: Vec<serde_json::Value> =
            get_json(&self.client, &self.url, SourceId::Countries).await?;
        let descriptors = parse_descriptors(values);
        debug!(count = descriptors.len(), "fetched country descriptors");
        Ok(descriptors)
    }
}

#[derive(Clone)]
pub struct HttpRateSource {
    client: Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> Result<RateTable> {
        let table: RateTable = get_json(&self.client, &self.url, SourceId::Rates).await?;
        debug!(count = table.len(), "fetched exchange rates");
        Ok(table)
    }
}
