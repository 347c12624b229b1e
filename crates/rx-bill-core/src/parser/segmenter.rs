//! Groups matched spans into per-drug entries.
//!
//! Spans are consumed in text order. A DRUG span opens a new entry (closing
//! the previous one); FREQUENCY, DURATION and MEAL spans attach to the open
//! entry, first match wins. Spans seen before any DRUG span are dropped.

use super::lexer::extract_count;
use super::matcher::{Category, MatchSpan};
use crate::models::DrugEntry;

/// Duration assumed when a prescription never states one.
pub const DEFAULT_DURATION_DAYS: u32 = 1;

/// An entry still being collected, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Drug text from the DRUG span
    pub drug: String,
    pub frequency: Option<u32>,
    pub duration: Option<u32>,
    pub meal_instruction: Option<String>,
    /// Byte offset where the DRUG span starts
    pub drug_start: usize,
    /// Byte offset where the DRUG span ends
    pub drug_end: usize,
}

impl EntryDraft {
    fn open(span: &MatchSpan) -> Self {
        Self {
            drug: span.text.clone(),
            frequency: None,
            duration: None,
            meal_instruction: None,
            drug_start: span.start,
            drug_end: span.end,
        }
    }

    /// Whether the primary pass left frequency or duration unset.
    pub fn is_incomplete(&self) -> bool {
        self.frequency.is_none() || self.duration.is_none()
    }

    /// Close the draft, filling the default duration.
    pub fn finalize(self) -> DrugEntry {
        let duration = self.duration.unwrap_or(DEFAULT_DURATION_DAYS);
        tracing::debug!(
            drug = %self.drug,
            frequency = ?self.frequency,
            duration,
            defaulted = self.duration.is_none(),
            "finalized entry"
        );

        let mut entry = DrugEntry::new(self.drug, self.frequency, duration);
        entry.meal_instruction = self.meal_instruction;
        entry
    }
}

/// Collection state: waiting for a drug, or filling the open draft.
#[derive(Debug, Default)]
pub struct Segmenter {
    current: Option<EntryDraft>,
    finished: Vec<EntryDraft>,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next span in text order.
    pub fn feed(&mut self, span: &MatchSpan) {
        if span.category == Category::Drug {
            if let Some(done) = self.current.take() {
                self.finished.push(done);
            }
            self.current = Some(EntryDraft::open(span));
            return;
        }

        let Some(draft) = self.current.as_mut() else {
            tracing::debug!(category = %span.category, text = %span.text, "span before any drug, dropped");
            return;
        };

        match span.category {
            Category::Frequency if draft.frequency.is_none() => {
                draft.frequency = count_in(span);
            }
            Category::Duration if draft.duration.is_none() => {
                draft.duration = count_in(span);
            }
            Category::Meal if draft.meal_instruction.is_none() => {
                draft.meal_instruction = Some(span.text.clone());
            }
            _ => {
                tracing::trace!(category = %span.category, text = %span.text, "field already set, ignored");
            }
        }
    }

    /// Close the open draft and return all drafts in text order.
    pub fn finish(mut self) -> Vec<EntryDraft> {
        if let Some(done) = self.current.take() {
            self.finished.push(done);
        }
        self.finished
    }
}

fn count_in(span: &MatchSpan) -> Option<u32> {
    let count = extract_count(&span.text);
    if count.is_none() {
        tracing::debug!(category = %span.category, text = %span.text, "no usable number in span");
    }
    count
}

/// Group spans into drafts without applying defaults.
pub fn segment(matches: &[MatchSpan]) -> Vec<EntryDraft> {
    let mut ordered: Vec<&MatchSpan> = matches.iter().collect();
    ordered.sort_by_key(|span| span.start);

    let mut segmenter = Segmenter::new();
    for span in ordered {
        segmenter.feed(span);
    }
    segmenter.finish()
}

/// Group spans into finalized entries.
pub fn aggregate(matches: &[MatchSpan]) -> Vec<DrugEntry> {
    segment(matches)
        .into_iter()
        .map(EntryDraft::finalize)
        .collect()
}
