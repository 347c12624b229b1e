//! Token pattern matcher.
//!
//! Four pattern families are matched over the token stream:
//!
//! | Category  | Templates                                                   |
//! |-----------|-------------------------------------------------------------|
//! | DRUG      | the tokens of any price-table key                           |
//! | FREQUENCY | N time(s) [a] day, N per day, N daily, once/twice/thrice [a] day, once/twice/thrice daily |
//! | DURATION  | for N day(s)                                                |
//! | MEAL      | before/after meal(s), before/after breakfast/lunch/dinner   |
//!
//! Selection is greedy: at the earliest token where anything matches, the
//! longest match wins; equal lengths go to the template declared first
//! (DRUG, then FREQUENCY, DURATION, MEAL). Matching resumes after the
//! chosen span, so spans never overlap.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::lexer::{Token, TokenStream};
use crate::catalog::PriceTable;

/// Category of a matched span. Declaration order is tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Drug,
    Frequency,
    Duration,
    Meal,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Drug => "DRUG",
            Category::Frequency => "FREQUENCY",
            Category::Duration => "DURATION",
            Category::Meal => "MEAL",
        };
        f.write_str(label)
    }
}

/// A categorized run of tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub category: Category,
    /// Byte offset of the first covered character
    pub start: usize,
    /// Byte offset one past the last covered character
    pub end: usize,
    /// Covered source text, lowercased
    pub text: String,
    /// Indices of the covered tokens
    pub tokens: Range<usize>,
}

/// Test applied to a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPredicate {
    /// Lowercase text equals the literal
    Lower(String),
    /// Lowercase text is one of the literals
    LowerIn(&'static [&'static str]),
    /// Digit string or number word
    LikeNum,
}

impl TokenPredicate {
    fn lower(text: &str) -> Self {
        TokenPredicate::Lower(text.to_string())
    }

    pub fn accepts(&self, token: &Token) -> bool {
        match self {
            TokenPredicate::Lower(text) => token.lower == *text,
            TokenPredicate::LowerIn(options) => options.contains(&token.lower.as_str()),
            TokenPredicate::LikeNum => token.like_num,
        }
    }
}

/// How many consecutive tokens an element may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

impl Quantifier {
    fn bounds(self) -> (usize, usize) {
        match self {
            Quantifier::One => (1, 1),
            Quantifier::Optional => (0, 1),
            Quantifier::OneOrMore => (1, usize::MAX),
            Quantifier::ZeroOrMore => (0, usize::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternElement {
    pub predicate: TokenPredicate,
    pub quantifier: Quantifier,
}

impl PatternElement {
    pub fn one(predicate: TokenPredicate) -> Self {
        Self {
            predicate,
            quantifier: Quantifier::One,
        }
    }

    pub fn optional(predicate: TokenPredicate) -> Self {
        Self {
            predicate,
            quantifier: Quantifier::Optional,
        }
    }

    /// Literal that can seed the first-token index.
    fn anchor(&self) -> Option<&str> {
        match (&self.predicate, self.quantifier) {
            (TokenPredicate::Lower(text), Quantifier::One | Quantifier::OneOrMore) => {
                Some(text.as_str())
            }
            _ => None,
        }
    }
}

/// A token-sequence template tagged with a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub category: Category,
    pub elements: Vec<PatternElement>,
}

impl Template {
    pub fn new(category: Category, elements: Vec<PatternElement>) -> Self {
        Self { category, elements }
    }

    /// End index of the longest non-empty match starting at `start`.
    pub fn longest_match(&self, tokens: &[Token], start: usize) -> Option<usize> {
        longest_from(&self.elements, tokens, start).filter(|&end| end > start)
    }
}

fn longest_from(elements: &[PatternElement], tokens: &[Token], pos: usize) -> Option<usize> {
    let Some((first, rest)) = elements.split_first() else {
        return Some(pos);
    };

    let (min, max) = first.quantifier.bounds();
    let mut consumed = 0;
    let mut best = None;

    loop {
        if consumed >= min {
            best = best.max(longest_from(rest, tokens, pos + consumed));
        }
        if consumed == max
            || pos + consumed >= tokens.len()
            || !first.predicate.accepts(&tokens[pos + consumed])
        {
            break;
        }
        consumed += 1;
    }

    best
}

const DOSING_WORDS: &[&str] = &["once", "twice", "thrice"];
const TIME_WORDS: &[&str] = &["time", "times"];
const DAY_WORDS: &[&str] = &["day", "days"];
const MEAL_TIMING: &[&str] = &["before", "after"];
const MEAL_WORDS: &[&str] = &["meal", "meals"];
const MEAL_NAMES: &[&str] = &["breakfast", "lunch", "dinner"];

fn frequency_templates() -> Vec<Template> {
    use PatternElement as E;
    use TokenPredicate as P;

    vec![
        Template::new(
            Category::Frequency,
            vec![
                E::one(P::LikeNum),
                E::one(P::LowerIn(TIME_WORDS)),
                E::optional(P::lower("a")),
                E::one(P::lower("day")),
            ],
        ),
        Template::new(
            Category::Frequency,
            vec![E::one(P::LikeNum), E::one(P::lower("per")), E::one(P::lower("day"))],
        ),
        Template::new(
            Category::Frequency,
            vec![E::one(P::LikeNum), E::one(P::lower("daily"))],
        ),
        Template::new(
            Category::Frequency,
            vec![
                E::one(P::LowerIn(DOSING_WORDS)),
                E::optional(P::lower("a")),
                E::one(P::lower("day")),
            ],
        ),
        Template::new(
            Category::Frequency,
            vec![E::one(P::LowerIn(DOSING_WORDS)), E::one(P::lower("daily"))],
        ),
    ]
}

fn duration_templates() -> Vec<Template> {
    use PatternElement as E;
    use TokenPredicate as P;

    vec![Template::new(
        Category::Duration,
        vec![
            E::one(P::lower("for")),
            E::one(P::LikeNum),
            E::one(P::LowerIn(DAY_WORDS)),
        ],
    )]
}

fn meal_templates() -> Vec<Template> {
    use PatternElement as E;
    use TokenPredicate as P;

    vec![
        Template::new(
            Category::Meal,
            vec![E::one(P::LowerIn(MEAL_TIMING)), E::one(P::LowerIn(MEAL_WORDS))],
        ),
        Template::new(
            Category::Meal,
            vec![E::one(P::LowerIn(MEAL_TIMING)), E::one(P::LowerIn(MEAL_NAMES))],
        ),
    ]
}

/// Compiled templates for all four families.
///
/// Built once per price table; matching only reads it.
#[derive(Debug, Clone)]
pub struct PatternSet {
    templates: Vec<Template>,
    /// First-token literal → template indices
    anchored: HashMap<String, Vec<usize>>,
    /// Templates whose first element is not a single literal
    unanchored: Vec<usize>,
}

impl PatternSet {
    /// Compile the pattern set, deriving the DRUG vocabulary from the table.
    pub fn compile(prices: &PriceTable) -> Self {
        let mut keys: Vec<&str> = prices.keys().collect();
        keys.sort_unstable();

        let drug_templates = keys.into_iter().map(|key| {
            let elements = key
                .split(' ')
                .map(|part| PatternElement::one(TokenPredicate::lower(part)))
                .collect();
            Template::new(Category::Drug, elements)
        });

        let templates: Vec<Template> = drug_templates
            .chain(frequency_templates())
            .chain(duration_templates())
            .chain(meal_templates())
            .collect();

        Self::from_templates(templates)
    }

    /// Build a pattern set from explicit templates, in priority order.
    pub fn from_templates(templates: Vec<Template>) -> Self {
        let mut anchored: HashMap<String, Vec<usize>> = HashMap::new();
        let mut unanchored = Vec::new();

        for (idx, template) in templates.iter().enumerate() {
            match template.elements.first().and_then(PatternElement::anchor) {
                Some(literal) => anchored.entry(literal.to_string()).or_default().push(idx),
                None => unanchored.push(idx),
            }
        }

        Self {
            templates,
            anchored,
            unanchored,
        }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Number of DRUG templates.
    pub fn drug_count(&self) -> usize {
        self.templates
            .iter()
            .filter(|t| t.category == Category::Drug)
            .count()
    }

    /// Find non-overlapping spans, ordered by start offset.
    pub fn find_matches(&self, stream: &TokenStream) -> Vec<MatchSpan> {
        let tokens = stream.tokens();
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos < tokens.len() {
            match self.best_at(tokens, pos) {
                Some((idx, end)) => {
                    let category = self.templates[idx].category;
                    let start_offset = tokens[pos].start;
                    let end_offset = tokens[end - 1].end;
                    let span = MatchSpan {
                        category,
                        start: start_offset,
                        end: end_offset,
                        text: stream.span_text(start_offset, end_offset),
                        tokens: pos..end,
                    };
                    tracing::trace!(%category, text = %span.text, start = span.start, "matched span");
                    spans.push(span);
                    pos = end;
                }
                None => pos += 1,
            }
        }

        spans
    }

    /// Best (template index, end token) starting at `pos`.
    fn best_at(&self, tokens: &[Token], pos: usize) -> Option<(usize, usize)> {
        let mut candidates: Vec<usize> = self
            .anchored
            .get(&tokens[pos].lower)
            .into_iter()
            .flatten()
            .chain(self.unanchored.iter())
            .copied()
            .collect();
        candidates.sort_unstable();

        let mut best: Option<(usize, usize)> = None;
        for idx in candidates {
            if let Some(end) = self.templates[idx].longest_match(tokens, pos) {
                // Strictly longer only: earlier templates keep ties.
                if best.map_or(true, |(_, best_end)| end > best_end) {
                    best = Some((idx, end));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::normalize;

    fn patterns() -> PatternSet {
        PatternSet::compile(&PriceTable::from_pairs([
            ("paracetamol", 2.0),
            ("aspirin", 1.5),
            ("vitamin c", 0.5),
            ("vitamin", 0.25),
        ]))
    }

    fn matched(text: &str) -> Vec<(Category, String)> {
        patterns()
            .find_matches(&normalize(text))
            .into_iter()
            .map(|s| (s.category, s.text))
            .collect()
    }

    #[test]
    fn test_full_prescription() {
        assert_eq!(
            matched("Paracetamol 1 tablet 3 times a day for 5 days after meals"),
            vec![
                (Category::Drug, "paracetamol".to_string()),
                (Category::Frequency, "3 times a day".to_string()),
                (Category::Duration, "for 5 days".to_string()),
                (Category::Meal, "after meals".to_string()),
            ]
        );
    }

    #[test]
    fn test_frequency_variants() {
        let cases = [
            ("2 times a day", "2 times a day"),
            ("2 times day", "2 times day"),
            ("one time a day", "one time a day"),
            ("3 per day", "3 per day"),
            ("4 daily", "4 daily"),
            ("once a day", "once a day"),
            ("twice day", "twice day"),
            ("thrice daily", "thrice daily"),
            ("Twice Daily", "twice daily"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                matched(input),
                vec![(Category::Frequency, expected.to_string())],
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_duration_and_meal_variants() {
        assert_eq!(
            matched("for seven days before breakfast"),
            vec![
                (Category::Duration, "for seven days".to_string()),
                (Category::Meal, "before breakfast".to_string()),
            ]
        );
        assert_eq!(matched("for 1 day"), vec![(Category::Duration, "for 1 day".to_string())]);
        assert_eq!(matched("after dinner"), vec![(Category::Meal, "after dinner".to_string())]);
        assert_eq!(matched("before meal"), vec![(Category::Meal, "before meal".to_string())]);
    }

    #[test]
    fn test_no_match_across_punctuation() {
        assert!(matched("twice, daily").is_empty());
        assert!(matched("for a few days").is_empty());
    }

    #[test]
    fn test_drug_matching_is_case_insensitive() {
        assert_eq!(matched("ASPIRIN"), vec![(Category::Drug, "aspirin".to_string())]);
        assert!(matched("aspirins").is_empty());
    }

    #[test]
    fn test_longest_drug_wins() {
        assert_eq!(
            matched("vitamin c once daily"),
            vec![
                (Category::Drug, "vitamin c".to_string()),
                (Category::Frequency, "once daily".to_string()),
            ]
        );
        assert_eq!(matched("vitamin d"), vec![(Category::Drug, "vitamin".to_string())]);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        // A shorter drug at the same start loses to a longer frequency.
        let set = PatternSet::compile(&PriceTable::from_pairs([("once", 1.0)]));
        let spans = set.find_matches(&normalize("once daily"));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, Category::Frequency);

        let tie = PatternSet::from_templates(vec![
            Template::new(
                Category::Meal,
                vec![PatternElement::one(TokenPredicate::lower("x"))],
            ),
            Template::new(
                Category::Drug,
                vec![PatternElement::one(TokenPredicate::lower("x"))],
            ),
        ]);
        let spans = tie.find_matches(&normalize("x"));
        assert_eq!(spans[0].category, Category::Meal);
    }

    #[test]
    fn test_spans_ordered_and_disjoint() {
        let spans = patterns()
            .find_matches(&normalize("aspirin twice a day paracetamol 3 daily for 2 days"));

        assert_eq!(spans.len(), 5);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        assert_eq!(spans[0].tokens, 0..1);
        assert_eq!(spans[1].tokens, 1..4);
    }

    #[test]
    fn test_repeatable_elements() {
        let set = PatternSet::from_templates(vec![Template::new(
            Category::Frequency,
            vec![
                PatternElement {
                    predicate: TokenPredicate::LikeNum,
                    quantifier: Quantifier::OneOrMore,
                },
                PatternElement {
                    predicate: TokenPredicate::lower("very"),
                    quantifier: Quantifier::ZeroOrMore,
                },
                PatternElement::one(TokenPredicate::lower("often")),
            ],
        )]);

        let spans = set.find_matches(&normalize("twenty one very very often"));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "twenty one very very often");

        assert!(set.find_matches(&normalize("very often")).is_empty());
    }

    #[test]
    fn test_drug_count() {
        assert_eq!(patterns().drug_count(), 4);
    }
}
