//! Degraded-mode recovery for frequency and duration.
//!
//! Runs after the token matcher, only for drafts that still lack a frequency
//! or a duration, and only over the text between the draft's drug and the
//! next drug. Values found here never replace values from the matcher.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::lexer::word_to_int;
use super::segmenter::EntryDraft;

/// How a regex hit turns into a count.
#[derive(Debug, Clone, Copy)]
enum Reading {
    /// Fixed value (abbreviations like "bid")
    Fixed(u32),
    /// Number in capture group 1
    Count,
    /// Number in capture group 1, times a factor
    Scaled(u32),
    /// Interval in hours in capture group 1; doses per day = 24 / hours
    EveryHours,
}

struct Rule {
    pattern: Regex,
    reading: Reading,
}

impl Rule {
    fn new(pattern: &str, reading: Reading) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            reading,
        }
    }

    fn read(&self, caps: &Captures<'_>) -> Option<u32> {
        let number = || {
            let raw = caps.get(1)?.as_str();
            word_to_int(raw)
                .filter(|&n| n > 0)
                .and_then(|n| u32::try_from(n).ok())
        };

        match self.reading {
            Reading::Fixed(value) => Some(value),
            Reading::Count => number(),
            Reading::Scaled(factor) => number()?.checked_mul(factor),
            Reading::EveryHours => {
                let hours = number()?;
                (24 % hours == 0).then(|| 24 / hours)
            }
        }
    }
}

/// True when `start..end` is only part of a decimal such as "1.5".
fn inside_decimal(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let after_point =
        start >= 2 && bytes[start - 1] == b'.' && bytes[start - 2].is_ascii_digit();
    let before_point = bytes.get(end) == Some(&b'.')
        && bytes.get(end + 1).is_some_and(u8::is_ascii_digit);
    after_point || before_point
}

static FREQUENCY_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(r"\b(?:od|qd)\b", Reading::Fixed(1)),
        Rule::new(r"\b(?:bd|bid)\b", Reading::Fixed(2)),
        Rule::new(r"\b(?:tds|tid)\b", Reading::Fixed(3)),
        Rule::new(r"\b(?:qds|qid)\b", Reading::Fixed(4)),
        Rule::new(
            r"\b(\d+|[a-z]+)\s*(?:x|times?)\s*(?:a|per|each|/)?\s*(?:day|daily)\b",
            Reading::Count,
        ),
        Rule::new(r"\bevery\s+(\d+|[a-z]+)\s*(?:hours?|hrs?|h)\b", Reading::EveryHours),
        Rule::new(r"\b(?:every|each)\s+day\b", Reading::Fixed(1)),
        Rule::new(r"\bdaily\b", Reading::Fixed(1)),
    ]
});

static DURATION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(r"\bfor\s+(\d+|[a-z]+)\s*weeks?\b", Reading::Scaled(7)),
        Rule::new(r"\bfor\s+a\s+week\b", Reading::Fixed(7)),
        Rule::new(r"\bfor\s+(\d+|[a-z]+)\s*months?\b", Reading::Scaled(30)),
        Rule::new(r"\bfor\s+a\s+month\b", Reading::Fixed(30)),
        Rule::new(r"\bx\s*(\d+)\s*days?\b", Reading::Count),
        Rule::new(r"\b(\d+|[a-z]+)[\s-]*days?\s+course\b", Reading::Count),
    ]
});

/// Earliest rule hit in the text. Ties go to the rule listed first.
///
/// A hit whose number is only part of a decimal ("5" in "1.5 times a day")
/// blocks its whole phrase, so no other rule can read a value out of it.
fn earliest(rules: &[Rule], text: &str) -> Option<u32> {
    let blocked: Vec<Range<usize>> = rules
        .iter()
        .flat_map(|rule| rule.pattern.captures_iter(text))
        .filter(|caps| {
            caps.get(1)
                .is_some_and(|group| inside_decimal(text, group.start(), group.end()))
        })
        .filter_map(|caps| caps.get(0).map(|m| m.range()))
        .collect();

    let mut best: Option<(usize, u32)> = None;

    for rule in rules {
        let hit = rule.pattern.captures_iter(text).find_map(|caps| {
            let start = caps.get(0)?.start();
            if blocked.iter().any(|range| range.contains(&start)) {
                return None;
            }
            Some((start, rule.read(&caps)?))
        });

        if let Some((start, value)) = hit {
            if best.map_or(true, |(best_start, _)| start < best_start) {
                best = Some((start, value));
            }
        }
    }

    best.map(|(_, value)| value)
}

/// Frequency recovered from free text, if any.
pub fn recover_frequency(text: &str) -> Option<u32> {
    earliest(&FREQUENCY_RULES, &text.to_lowercase())
}

/// Duration in days recovered from free text, if any.
pub fn recover_duration(text: &str) -> Option<u32> {
    earliest(&DURATION_RULES, &text.to_lowercase())
}

/// Fill missing frequency/duration on drafts from their own text segments.
///
/// `source` is the prescription text the drafts were built from.
pub fn recover(drafts: &mut [EntryDraft], source: &str) {
    let starts: Vec<usize> = drafts.iter().map(|d| d.drug_start).collect();

    for (idx, draft) in drafts.iter_mut().enumerate() {
        if !draft.is_incomplete() {
            continue;
        }

        let end = starts.get(idx + 1).copied().unwrap_or(source.len());
        let Some(segment) = source.get(draft.drug_end..end) else {
            continue;
        };

        if draft.frequency.is_none() {
            draft.frequency = recover_frequency(segment);
            if let Some(frequency) = draft.frequency {
                tracing::debug!(drug = %draft.drug, frequency, "frequency recovered by fallback pass");
            }
        }
        if draft.duration.is_none() {
            draft.duration = recover_duration(segment);
            if let Some(duration) = draft.duration {
                tracing::debug!(drug = %draft.drug, duration, "duration recovered by fallback pass");
            }
        }
    }
}
