//! CSV price source.
//!
//! Expected layout (header names are matched case-insensitively, extra
//! columns are ignored):
//!
//! ```text
//! drug,unit_price
//! Paracetamol,2.0
//! Amoxicillin,5.25
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{normalize_key, PriceTable, PriceTableError, PriceTableResult};

const DRUG_COLUMN: &str = "drug";
const PRICE_COLUMN: &str = "unit_price";

impl PriceTable {
    /// Load a price table from a CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> PriceTableResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PriceTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_csv_reader(file)?;
        tracing::info!(path = %path.display(), drugs = table.len(), "loaded price table");
        Ok(table)
    }

    /// Load a price table from any CSV reader.
    pub fn from_csv_reader<R: Read>(reader: R) -> PriceTableResult<Self> {
        let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let headers = csv.headers()?.clone();
        if headers.is_empty() {
            return Err(PriceTableError::Empty);
        }
        let drug_idx = column_index(&headers, DRUG_COLUMN)?;
        let price_idx = column_index(&headers, PRICE_COLUMN)?;

        let mut table = PriceTable::default();
        let mut rows = 0usize;
        let mut overwritten = 0usize;

        for record in csv.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());

            let name = record.get(drug_idx).unwrap_or_default();
            let key = normalize_key(name);
            if key.is_empty() {
                return Err(PriceTableError::EmptyDrugName { line });
            }

            let raw_price = record.get(price_idx).unwrap_or_default();
            let price = parse_price(raw_price).ok_or_else(|| PriceTableError::InvalidPrice {
                line,
                value: raw_price.to_string(),
            })?;
            if price < 0.0 {
                return Err(PriceTableError::NegativePrice {
                    line,
                    drug: name.to_string(),
                    price,
                });
            }

            if table.insert_key(key, price).is_some() {
                overwritten += 1;
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(PriceTableError::Empty);
        }
        if overwritten > 0 {
            tracing::debug!(overwritten, "duplicate drug names replaced earlier prices");
        }

        Ok(table)
    }
}

fn column_index(headers: &StringRecord, name: &'static str) -> PriceTableResult<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or(PriceTableError::MissingColumn(name))
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}
