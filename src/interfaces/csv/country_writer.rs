use crate::domain::country::CountryRecord;
use crate::error::Result;
use std::io::Write;

/// Writes country records to a CSV sink.
///
/// The header row is derived from `CountryRecord`'s field names and emitted
/// once, before the first record. Absent values become empty cells.
pub struct CountryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CountryWriter<W> {
    /// Creates a new `CountryWriter` over any `Write` sink (e.g., Stdout, File).
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new().from_writer(sink);
        Self { writer }
    }

    pub fn write_countries<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a CountryRecord>,
    ) -> Result<()> {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;

    fn record(name: &str) -> CountryRecord {
        CountryRecord {
            name: name.to_string(),
            capital: Some("Lima".to_string()),
            region: Some("Americas".to_string()),
            population: 33_000_000,
            currency_code: Some("PEN".to_string()),
            exchange_rate: Some(dec!(3.75)),
            estimated_gdp: Some(dec!(12345.678)),
            flag_url: None,
            last_refreshed_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_writer_emits_header_and_rows() {
        let mut buf = Vec::new();
        CountryWriter::new(&mut buf)
            .write_countries(&[record("Peru")])
            .unwrap();

        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some(
                "name,capital,region,population,currency_code,exchange_rate,estimated_gdp,flag_url,last_refreshed_at"
            )
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Peru,Lima,Americas,33000000,PEN,3.75,12345.678,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_writer_without_records_is_empty() {
        let mut buf = Vec::new();
        CountryWriter::new(&mut buf)
            .write_countries(std::iter::empty())
            .unwrap();
        assert!(buf.is_empty());
    }
}
