use super::country::CountryRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Number of countries listed in the summary ranking.
pub const TOP_COUNT: usize = 5;

/// The dataset a summary artifact is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_countries: usize,
    /// Highest estimated GDP first; countries with unknown GDP are never ranked.
    pub top_by_gdp: Vec<RankedCountry>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCountry {
    pub name: String,
    pub estimated_gdp: Decimal,
}

impl RankedCountry {
    /// Records without an estimated GDP have no rank.
    pub fn from_record(record: &CountryRecord) -> Option<Self> {
        record.estimated_gdp.map(|estimated_gdp| Self {
            name: record.name.clone(),
            estimated_gdp,
        })
    }
}
