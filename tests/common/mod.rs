#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use worldstat::application::engine::CountryEngine;
use worldstat::application::summary::SummaryCache;
use worldstat::domain::ports::{CountrySource, RateSource, SummaryRendererRef};
use worldstat::domain::source::{CountryDescriptor, CurrencyDescriptor, RateTable};
use worldstat::error::{Result, SourceId, WorldstatError};
use worldstat::infrastructure::in_memory::{InMemoryCountryStore, InMemoryMetadataStore};
use worldstat::infrastructure::svg::SvgSummaryRenderer;

pub fn descriptor(name: &str, population: i64, currency: Option<&str>) -> CountryDescriptor {
    CountryDescriptor {
        name: Some(name.to_string()),
        capital: Some(format!("{name} City")),
        region: Some("Europe".to_string()),
        population: Some(population),
        flag: Some(format!("https://flags.example/{name}.svg")),
        currencies: currency.map(|code| {
            vec![CurrencyDescriptor {
                code: Some(code.to_string()),
            }]
        }),
    }
}

pub fn in_region(mut descriptor: CountryDescriptor, region: &str) -> CountryDescriptor {
    descriptor.region = Some(region.to_string());
    descriptor
}

pub fn rates(entries: &[(&str, Decimal)]) -> RateTable {
    entries.iter().map(|(code, rate)| (*code, *rate)).collect()
}

/// Country source whose response can be swapped between refreshes.
#[derive(Default)]
pub struct StubCountries {
    response: Mutex<Option<Vec<CountryDescriptor>>>,
}

impl StubCountries {
    pub fn returning(descriptors: Vec<CountryDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Some(descriptors)),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, descriptors: Option<Vec<CountryDescriptor>>) {
        *self.response.lock().unwrap() = descriptors;
    }
}

#[async_trait]
impl CountrySource for StubCountries {
    async fn fetch_countries(&self) -> Result<Vec<CountryDescriptor>> {
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| WorldstatError::SourceUnavailable {
                source_id: SourceId::Countries,
                details: "stubbed outage".to_string(),
            })
    }
}

#[derive(Default)]
pub struct StubRates {
    response: Mutex<Option<RateTable>>,
}

impl StubRates {
    pub fn returning(table: RateTable) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Some(table)),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, table: Option<RateTable>) {
        *self.response.lock().unwrap() = table;
    }
}

#[async_trait]
impl RateSource for StubRates {
    async fn fetch_rates(&self) -> Result<RateTable> {
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| WorldstatError::SourceUnavailable {
                source_id: SourceId::Rates,
                details: "stubbed outage".to_string(),
            })
    }
}

/// An engine over in-memory stores, plus handles to inspect them directly.
pub struct Harness {
    pub engine: CountryEngine,
    pub store: Arc<InMemoryCountryStore>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub countries: Arc<StubCountries>,
    pub rates: Arc<StubRates>,
}

pub fn harness(
    countries: Arc<StubCountries>,
    rates: Arc<StubRates>,
    cache_dir: &Path,
) -> Harness {
    harness_with_renderer(countries, rates, cache_dir, Arc::new(SvgSummaryRenderer))
}

pub fn harness_with_renderer(
    countries: Arc<StubCountries>,
    rates: Arc<StubRates>,
    cache_dir: &Path,
    renderer: SummaryRendererRef,
) -> Harness {
    let store = Arc::new(InMemoryCountryStore::new());
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let summary = SummaryCache::new(store.clone(), metadata.clone(), renderer, cache_dir);
    let engine = CountryEngine::new(
        countries.clone(),
        rates.clone(),
        store.clone(),
        metadata.clone(),
        summary,
    );
    Harness {
        engine,
        store,
        metadata,
        countries,
        rates,
    }
}

/// Minimal HTTP/1.1 server answering fixed routes, one connection at a time.
pub struct StubServer {
    addr: SocketAddr,
}

pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl StubServer {
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                // Drain headers; requests carry no body.
                let mut header = String::new();
                while reader.read_line(&mut header).map(|n| n > 2).unwrap_or(false) {
                    header.clear();
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = routes
                    .iter()
                    .find(|route| route.path == path)
                    .map(|route| (route.status, route.body.as_str()))
                    .unwrap_or((404, "{}"));
                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn countries_body() -> String {
    serde_json::json!([
        {
            "name": "Peru",
            "capital": "Lima",
            "region": "Americas",
            "population": 1000,
            "flag": "https://flags.example/pe.svg",
            "currencies": [{ "code": "PEN", "name": "Peruvian sol", "symbol": "S/." }]
        },
        {
            "name": "Antarctica",
            "region": "Polar",
            "population": 1000
        },
        {
            "name": "Atlantis",
            "population": 0,
            "currencies": [{ "code": "ATL" }]
        },
        "not an object",
        {
            "name": "Monaco",
            "capital": "Monaco",
            "region": "Europe",
            "population": 39000,
            "currencies": [{ "code": "EUR" }]
        }
    ])
    .to_string()
}

pub fn rates_body() -> String {
    serde_json::json!({
        "result": "success",
        "base_code": "USD",
        "rates": { "USD": 1, "PEN": 4, "EUR": 0.92 }
    })
    .to_string()
}
