use crate::error::WorldstatError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Display form of a country name: every whitespace-delimited word starts
/// with an upper-case character and words are re-joined with single spaces.
/// The rest of each word keeps the casing it arrived with, so
/// "Guinea-Bissau" stays intact while "peru" becomes "Peru".
pub fn canonical_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Storage key for a country name. Case-insensitive and whitespace-collapsed,
/// so "france", "FRANCE" and " France " share one key.
pub fn name_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One row of the country snapshot, keyed by its canonical `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    /// Canonical display name. Unique across the snapshot once keyed with `name_key`.
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    /// Always positive: descriptors without a population never become records.
    pub population: u64,
    /// Code of the first currency the source declares, if any.
    pub currency_code: Option<String>,
    /// USD-relative rate, set only when `estimated_gdp` came from the rate formula.
    pub exchange_rate: Option<Decimal>,
    /// `0` when the country declares no currency, `None` when its currency is unrated.
    pub estimated_gdp: Option<Decimal>,
    pub flag_url: Option<String>,
    /// Start timestamp of the refresh cycle that last wrote this row.
    pub last_refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Name,
    GdpDesc,
    GdpAsc,
}

impl FromStr for SortOrder {
    type Err = WorldstatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(Self::Name),
            "gdp_desc" => Ok(Self::GdpDesc),
            "gdp_asc" => Ok(Self::GdpAsc),
            other => Err(WorldstatError::ValidationError(format!(
                "unknown sort order '{other}', expected name, gdp_desc or gdp_asc"
            ))),
        }
    }
}

/// Filter and ordering applied by `CountryStore::find_many`.
///
/// Both filters are exact matches and combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryQuery {
    pub region: Option<String>,
    pub currency_code: Option<String>,
    pub sort: SortOrder,
}

impl CountryQuery {
    pub fn matches(&self, record: &CountryRecord) -> bool {
        let region_ok = self
            .region
            .as_deref()
            .is_none_or(|region| record.region.as_deref() == Some(region));
        let currency_ok = self
            .currency_code
            .as_deref()
            .is_none_or(|code| record.currency_code.as_deref() == Some(code));
        region_ok && currency_ok
    }

    /// Orders records in place. Null GDP values go last in both directions
    /// and ties fall back to ascending name.
    pub fn sort(&self, records: &mut [CountryRecord]) {
        records.sort_by(|a, b| compare(self.sort, a, b));
    }

    /// Filters and sorts an unordered set of records.
    pub fn apply(&self, records: impl IntoIterator<Item = CountryRecord>) -> Vec<CountryRecord> {
        let mut selected: Vec<CountryRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();
        self.sort(&mut selected);
        selected
    }
}

fn compare(order: SortOrder, a: &CountryRecord, b: &CountryRecord) -> Ordering {
    let by_gdp = match order {
        SortOrder::Name => Ordering::Equal,
        SortOrder::GdpDesc => nulls_last(a.estimated_gdp, b.estimated_gdp, |x, y| y.cmp(x)),
        SortOrder::GdpAsc => nulls_last(a.estimated_gdp, b.estimated_gdp, |x, y| x.cmp(y)),
    };
    by_gdp.then_with(|| a.name.cmp(&b.name))
}

fn nulls_last(
    a: Option<Decimal>,
    b: Option<Decimal>,
    cmp: impl Fn(&Decimal, &Decimal) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
