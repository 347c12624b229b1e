//! Prescription parsing engine.
//!
//! Pipeline: Lexer → Pattern Matcher → Segmenter → (Fallback) → Cost Calculator

pub mod fallback;
pub mod lexer;
pub mod matcher;
pub mod segmenter;

pub use lexer::{extract_count, normalize, word_to_int, Token, TokenKind, TokenStream};
pub use matcher::{Category, MatchSpan, PatternSet};
pub use segmenter::{aggregate, segment, EntryDraft, DEFAULT_DURATION_DAYS};

use crate::billing;
use crate::catalog::PriceTable;
use crate::models::{DrugEntry, ParseResult};

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Run the regex recovery pass for drafts missing frequency or duration
    pub fallback: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { fallback: true }
    }
}

/// Parser bound to one price table.
///
/// The pattern set is compiled once in the constructor; `parse` only reads
/// shared state, so a parser can serve concurrent callers.
pub struct PrescriptionParser<'a> {
    prices: &'a PriceTable,
    patterns: PatternSet,
    options: ParserOptions,
}

impl<'a> PrescriptionParser<'a> {
    /// Create a parser with default options.
    pub fn new(prices: &'a PriceTable) -> Self {
        Self::with_options(prices, ParserOptions::default())
    }

    /// Create a parser with explicit options.
    pub fn with_options(prices: &'a PriceTable, options: ParserOptions) -> Self {
        let patterns = PatternSet::compile(prices);
        tracing::debug!(drugs = patterns.drug_count(), fallback = options.fallback, "compiled pattern set");
        Self {
            prices,
            patterns,
            options,
        }
    }

    /// Extract unpriced drug entries from prescription text.
    pub fn extract(&self, text: &str) -> Vec<DrugEntry> {
        let stream = lexer::normalize(text);
        let matches = self.patterns.find_matches(&stream);
        let mut drafts = segmenter::segment(&matches);

        if self.options.fallback {
            fallback::recover(&mut drafts, stream.source());
        }

        drafts.into_iter().map(EntryDraft::finalize).collect()
    }

    /// Extract and price all entries in a prescription.
    pub fn parse(&self, text: &str) -> ParseResult {
        billing::price(self.extract(text), self.prices)
    }

    /// Matched spans, for inspection.
    pub fn matches(&self, text: &str) -> Vec<MatchSpan> {
        self.patterns.find_matches(&lexer::normalize(text))
    }

    /// Price table the pattern set was compiled from.
    pub fn prices(&self) -> &PriceTable {
        self.prices
    }

    /// Compiled templates for all four families.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Options this parser was built with.
    pub fn options(&self) -> ParserOptions {
        self.options
    }
}
