//! Rx-Bill Core Library
//!
//! Rule-based dosage extraction and medication billing for free-text prescriptions.
//!
//! # Architecture
//!
//! ```text
//!   Price source (CSV) ──► PriceTable ──► PatternSet (compiled once)
//!                                                │
//! Prescription text                              │
//!        │                                       ▼
//!        └──► Lexer ──► tokens ──► Pattern Matcher ──► DRUG / FREQUENCY /
//!                                                      DURATION / MEAL spans
//!                                                            │
//!                                                            ▼
//!                                                       Segmenter
//!                                               (one entry per DRUG span)
//!                                                            │
//!                                             [fallback regex recovery]
//!                                                            │
//!                                                            ▼
//!                                                    Cost Calculator
//!                                                            │
//!                                              ┌─────────────┴─────────────┐
//!                                              ▼                           ▼
//!                                         ParseResult                 BillExport
//!                                   (medicines + total_cost)        (JSON / CSV)
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: Price table and CSV price source
//! - [`parser`]: Lexer, pattern matcher, segmenter and fallback pass
//! - [`billing`]: Cost calculation
//! - [`models`]: Domain types (DrugEntry, ParseResult)
//! - [`export`]: Bill export
//!
//! # Example
//!
//! ```
//! use rx_bill_core::{PrescriptionParser, PriceTable};
//!
//! let prices = PriceTable::from_pairs([("paracetamol", 2.0)]);
//! let parser = PrescriptionParser::new(&prices);
//! let result = parser.parse("Paracetamol twice a day for 5 days");
//!
//! assert_eq!(result.medicines[0].total_units, Some(10));
//! assert_eq!(result.total_cost, 20.0);
//! ```

pub mod billing;
pub mod catalog;
pub mod export;
pub mod models;
pub mod parser;

// Re-export commonly used types
pub use catalog::{PriceSuggestion, PriceTable, PriceTableError, PriceTableResult};
pub use export::BillExport;
pub use models::{DrugEntry, ParseResult};
pub use parser::{ParserOptions, PrescriptionParser};

/// Parse and price a prescription with default options.
///
/// Compiles the pattern set on every call; hold a [`PrescriptionParser`]
/// when parsing many prescriptions against the same table.
pub fn calculate_bill(text: &str, prices: &PriceTable) -> ParseResult {
    PrescriptionParser::new(prices).parse(text)
}
