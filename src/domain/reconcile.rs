//! Merges the catalog and rate feeds into country records.

use super::country::{CountryRecord, canonical_name, name_key};
use super::source::{CountryDescriptor, RateTable, non_blank};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Lower bound of the GDP multiplier, inclusive.
pub const MULTIPLIER_MIN: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
/// Upper bound of the GDP multiplier, exclusive.
pub const MULTIPLIER_MAX: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

// Multipliers are drawn in millionths so the bounds stay exact.
const MULTIPLIER_SCALE: u32 = 6;
const MULTIPLIER_UNITS: std::ops::Range<i64> = 1_000_000_000..2_000_000_000;

/// Derived economic fields for one country. The branches are exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Valuation {
    /// The country declares no currency: GDP is zero and there is no rate.
    NoCurrency,
    /// The currency has no usable rate: both fields are unknown.
    Unrated,
    Rated { rate: Decimal, gdp: Decimal },
}

impl Valuation {
    pub fn exchange_rate(&self) -> Option<Decimal> {
        match self {
            Valuation::Rated { rate, .. } => Some(*rate),
            Valuation::NoCurrency | Valuation::Unrated => None,
        }
    }

    pub fn estimated_gdp(&self) -> Option<Decimal> {
        match self {
            Valuation::NoCurrency => Some(Decimal::ZERO),
            Valuation::Unrated => None,
            Valuation::Rated { gdp, .. } => Some(*gdp),
        }
    }
}

/// Draws the per-record noise factor standing in for GDP per capita,
/// uniformly from `[1000, 2000)`.
pub fn draw_multiplier<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(MULTIPLIER_UNITS), MULTIPLIER_SCALE)
}

/// `population * multiplier / rate`, or `None` if the decimal math overflows.
pub fn estimate_gdp(population: u64, multiplier: Decimal, rate: Decimal) -> Option<Decimal> {
    Decimal::from(population)
        .checked_mul(multiplier)?
        .checked_div(rate)
}

pub fn valuate<R: Rng + ?Sized>(
    population: u64,
    currency_code: Option<&str>,
    rates: &RateTable,
    rng: &mut R,
) -> Valuation {
    let Some(code) = currency_code else {
        return Valuation::NoCurrency;
    };
    let Some(rate) = rates.rate_for(code) else {
        return Valuation::Unrated;
    };
    match estimate_gdp(population, draw_multiplier(rng), rate) {
        Some(gdp) => Valuation::Rated { rate, gdp },
        None => Valuation::Unrated,
    }
}

/// Turns one descriptor into a record, or `None` when it has no name or no
/// positive population.
pub fn reconcile_one<R: Rng + ?Sized>(
    descriptor: &CountryDescriptor,
    rates: &RateTable,
    as_of: DateTime<Utc>,
    rng: &mut R,
) -> Option<CountryRecord> {
    let name = non_blank(descriptor.name.as_deref())?;
    let population = descriptor
        .population
        .filter(|p| *p > 0)
        .and_then(|p| u64::try_from(p).ok())?;

    let currency_code = descriptor.primary_currency();
    let valuation = valuate(population, currency_code, rates, rng);

    Some(CountryRecord {
        name: canonical_name(name),
        capital: non_blank(descriptor.capital.as_deref()).map(str::to_string),
        region: non_blank(descriptor.region.as_deref()).map(str::to_string),
        population,
        currency_code: currency_code.map(str::to_string),
        exchange_rate: valuation.exchange_rate(),
        estimated_gdp: valuation.estimated_gdp(),
        flag_url: non_blank(descriptor.flag.as_deref()).map(str::to_string),
        last_refreshed_at: as_of,
    })
}

/// Reconciles a whole catalog. Ineligible descriptors are skipped; when two
/// descriptors share a storage key the later one replaces the earlier.
pub fn reconcile<R: Rng + ?Sized>(
    descriptors: &[CountryDescriptor],
    rates: &RateTable,
    as_of: DateTime<Utc>,
    rng: &mut R,
) -> Vec<CountryRecord> {
    let mut records: Vec<CountryRecord> = Vec::with_capacity(descriptors.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let Some(record) = reconcile_one(descriptor, rates, as_of, rng) else {
            debug!(
                name = descriptor.name.as_deref().unwrap_or("<missing>"),
                population = ?descriptor.population,
                "skipping descriptor without name or population"
            );
            continue;
        };
        let key = name_key(&record.name);
        match positions.get(&key) {
            Some(&index) => records[index] = record,
            None => {
                positions.insert(key, records.len());
                records.push(record);
            }
        }
    }

    records
}
