//! Drug price table.
//!
//! The table is built once from a price source and is read-only afterwards.
//! It is the only source of the drug vocabulary used by the pattern matcher.

mod loader;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use thiserror::Error;

use crate::parser::lexer;

/// Price source errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum PriceTableError {
    #[error("Cannot read price source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Price source is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("Price source has no rows")]
    Empty,

    #[error("Line {line}: drug name is blank")]
    EmptyDrugName { line: u64 },

    #[error("Line {line}: '{value}' is not a valid unit price")]
    InvalidPrice { line: u64, value: String },

    #[error("Line {line}: negative unit price {price} for '{drug}'")]
    NegativePrice { line: u64, drug: String, price: f64 },
}

pub type PriceTableResult<T> = Result<T, PriceTableError>;

/// A near match for a drug name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSuggestion {
    /// Normalized drug key
    pub drug: String,
    /// Unit price for the key
    pub unit_price: f64,
    /// Jaro-Winkler similarity to the query (0.0 - 1.0)
    pub score: f64,
}

/// Mapping from normalized drug name to unit price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, f64>,
}

impl PriceTable {
    /// Build a table from (name, price) pairs. Later duplicates win.
    ///
    /// Blank names and negative or non-finite prices are skipped.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (name, price) in pairs {
            let key = normalize_key(name.as_ref());
            if key.is_empty() {
                tracing::debug!(name = name.as_ref(), "skipping blank drug name");
                continue;
            }
            if !price.is_finite() || price < 0.0 {
                tracing::debug!(drug = %key, price, "skipping invalid price");
                continue;
            }
            table.insert_key(key, price);
        }
        table
    }

    /// Insert an already-normalized key, returning the price it replaced.
    fn insert_key(&mut self, key: String, price: f64) -> Option<f64> {
        self.prices.insert(key, price)
    }

    /// Unit price for a drug name, normalized the same way as the keys.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.prices.get(&normalize_key(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Normalized drug keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }

    /// Rank keys by similarity to a name, best first.
    pub fn closest(&self, name: &str, limit: usize) -> Vec<PriceSuggestion> {
        let query = normalize_key(name);
        if query.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<PriceSuggestion> = self
            .prices
            .iter()
            .map(|(key, price)| PriceSuggestion {
                drug: key.clone(),
                unit_price: *price,
                score: jaro_winkler(&query, key),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.drug.cmp(&b.drug))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// Normalize a drug name into a table key.
///
/// Lowercases, tokenizes and joins the token texts with single spaces, so
/// "Vitamin  C" and "vitamin c" share a key and "co-amoxiclav" becomes
/// "co - amoxiclav".
pub fn normalize_key(name: &str) -> String {
    lexer::normalize(name)
        .iter()
        .map(|token| token.lower.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
