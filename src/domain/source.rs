//! Schemas for the two external feeds the refresh cycle consumes.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// A country entry as published by the countries catalog.
///
/// Every field is optional on the wire; the reconciliation step decides which
/// descriptors are usable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<CurrencyDescriptor>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrencyDescriptor {
    #[serde(default)]
    pub code: Option<String>,
}

impl CountryDescriptor {
    /// Code of the first declared currency. A first entry without a code
    /// counts as no currency at all.
    pub fn primary_currency(&self) -> Option<&str> {
        self.currencies
            .as_deref()
            .and_then(|currencies| currencies.first())
            .and_then(|currency| non_blank(currency.code.as_deref()))
    }
}

/// Returns the value unless it is missing or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decodes each element of the catalog array on its own, dropping the ones
/// that do not fit the descriptor schema.
pub fn parse_descriptors(values: Vec<serde_json::Value>) -> Vec<CountryDescriptor> {
    let total = values.len();
    let descriptors: Vec<CountryDescriptor> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                debug!(error = %e, "skipping malformed country descriptor");
                None
            }
        })
        .collect();
    if descriptors.len() < total {
        debug!(
            total,
            decoded = descriptors.len(),
            "some country descriptors were malformed"
        );
    }
    descriptors
}

/// USD-relative exchange rates keyed by currency code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RateTable {
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// Looks up a usable rate. Zero or negative rates are treated as absent
    /// since nothing can be divided by them.
    pub fn rate_for(&self, code: &str) -> Option<Decimal> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| *rate > Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(code, rate)| (code.into(), rate)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_descriptors_skips_malformed_entries() {
        let values = vec![
            json!({"name": "Peru", "population": 1000, "currencies": [{"code": "PEN"}]}),
            json!({"name": "Broken", "population": "lots"}),
            json!("not even an object"),
            json!({"name": "Antarctica"}),
        ];

        let descriptors = parse_descriptors(values);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name.as_deref(), Some("Peru"));
        assert_eq!(descriptors[1].population, None);
    }

    #[test]
    fn test_primary_currency_takes_first_entry() {
        let descriptor: CountryDescriptor = serde_json::from_value(json!({
            "name": "Zimbabwe",
            "currencies": [{"code": "USD"}, {"code": "ZWL"}]
        }))
        .unwrap();
        assert_eq!(descriptor.primary_currency(), Some("USD"));

        let codeless: CountryDescriptor = serde_json::from_value(json!({
            "name": "Nowhere",
            "currencies": [{"name": "Shell"}, {"code": "XYZ"}]
        }))
        .unwrap();
        assert_eq!(codeless.primary_currency(), None);

        let empty = CountryDescriptor {
            currencies: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(empty.primary_currency(), None);
    }

    #[test]
    fn test_rate_table_deserializes_rates_payload() {
        let table: RateTable = serde_json::from_str(
            r#"{"result": "success", "base_code": "USD", "rates": {"USD": 1, "PEN": 3.7512, "EUR": 0.92}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rate_for("PEN"), Some(dec!(3.7512)));
        assert_eq!(table.rate_for("GBP"), None);
    }

    #[test]
    fn test_rate_table_ignores_non_positive_rates() {
        let table: RateTable = [("AAA", dec!(0)), ("BBB", dec!(-1)), ("CCC", dec!(2))]
            .into_iter()
            .collect();
        assert_eq!(table.rate_for("AAA"), None);
        assert_eq!(table.rate_for("BBB"), None);
        assert_eq!(table.rate_for("CCC"), Some(dec!(2)));
    }
}
