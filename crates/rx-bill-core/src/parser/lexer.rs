//! Lexical normalizer for prescription text.
//!
//! Handles:
//! - Tokenization (letters, digits and punctuation are separate tokens)
//! - Case folding (every token carries its lowercase form)
//! - Number reading ("once" → 1, "twice" → 2, "14" → 14, "twenty one" → 21)

use serde::{Deserialize, Serialize};

/// Broad class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Run of alphabetic characters
    Word,
    /// Run of ASCII digits, optionally with one decimal part ("0.5")
    Number,
    /// Any single character that is neither whitespace, letter nor digit
    Punct,
}

/// A single token of prescription text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Text as written in the prescription
    pub text: String,
    /// Lowercase form used for matching
    pub lower: String,
    /// Byte offset of the first character in the source text
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Token class
    pub kind: TokenKind,
    /// Digit string or English number word
    pub like_num: bool,
}

impl Token {
    fn new(text: &str, start: usize, end: usize, kind: TokenKind) -> Self {
        let lower = text.to_lowercase();
        let like_num = match kind {
            TokenKind::Number => true,
            TokenKind::Word => is_number_word(&lower),
            TokenKind::Punct => false,
        };
        Self {
            text: text.to_string(),
            lower,
            start,
            end,
            kind,
            like_num,
        }
    }
}

/// Tokenized prescription text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    source: String,
    tokens: Vec<Token>,
}

impl TokenStream {
    /// The text the tokens were read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Lowercase source text between two byte offsets.
    pub fn span_text(&self, start: usize, end: usize) -> String {
        self.source[start..end].to_lowercase()
    }
}

/// Split text into tokens, keeping byte offsets into the original text.
pub fn normalize(text: &str) -> TokenStream {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let start = pos;
        let (kind, end) = if c.is_ascii_digit() {
            let mut end = scan_while(text, start, |ch| ch.is_ascii_digit());
            if let Some(fraction) = text[end..].strip_prefix('.') {
                if fraction.starts_with(|ch: char| ch.is_ascii_digit()) {
                    end = scan_while(text, end + 1, |ch| ch.is_ascii_digit());
                }
            }
            (TokenKind::Number, end)
        } else if c.is_alphabetic() {
            (TokenKind::Word, scan_while(text, start, char::is_alphabetic))
        } else {
            (TokenKind::Punct, start + c.len_utf8())
        };

        tokens.push(Token::new(&text[start..end], start, end, kind));
        pos = end;
    }

    TokenStream {
        source: text.to_string(),
        tokens,
    }
}

fn scan_while(text: &str, from: usize, pred: impl Fn(char) -> bool) -> usize {
    text[from..]
        .char_indices()
        .find(|&(_, ch)| !pred(ch))
        .map_or(text.len(), |(i, _)| from + i)
}

/// Read a token as an integer.
///
/// Tiers, in priority order:
/// 1. dosing words: once/one, twice/two, thrice/three
/// 2. plain digit strings
/// 3. English number words ("four", "twenty one", "one hundred and five")
///
/// Returns `None` when no tier applies. `None` means "no number here", never zero.
pub fn word_to_int(token: &str) -> Option<u64> {
    let lower = token.trim().to_lowercase();

    match lower.as_str() {
        "once" | "one" => return Some(1),
        "twice" | "two" => return Some(2),
        "thrice" | "three" => return Some(3),
        _ => {}
    }

    if !lower.is_empty() && lower.bytes().all(|b| b.is_ascii_digit()) {
        return lower.parse().ok();
    }

    words_to_number(&lower)
}

/// First positive count in a phrase, as used for frequencies and durations.
///
/// Tokens that do not read as a number (or read as zero) are skipped.
pub fn extract_count(phrase: &str) -> Option<u32> {
    normalize(phrase)
        .iter()
        .filter_map(|token| word_to_int(&token.lower))
        .filter(|&n| n > 0)
        .find_map(|n| u32::try_from(n).ok())
}

/// Whether a lowercase word is an English number word.
pub fn is_number_word(word: &str) -> bool {
    small_number(word).is_some() || word == "hundred" || scale(word).is_some()
}

const ONES: &[(&str, u64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS: &[(&str, u64)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

const SCALES: &[(&str, u64)] = &[
    ("thousand", 1_000),
    ("million", 1_000_000),
    ("billion", 1_000_000_000),
];

fn lookup(table: &[(&str, u64)], word: &str) -> Option<u64> {
    table.iter().find(|(name, _)| *name == word).map(|(_, v)| *v)
}

fn small_number(word: &str) -> Option<u64> {
    lookup(ONES, word).or_else(|| lookup(TENS, word))
}

fn scale(word: &str) -> Option<u64> {
    lookup(SCALES, word)
}

/// Compose number words: "two hundred and five" → 205, "twenty-one" → 21.
fn words_to_number(phrase: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut seen = false;

    for word in phrase
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
    {
        if word == "and" && seen {
            continue;
        }

        if let Some(value) = small_number(word) {
            current = current.checked_add(value)?;
        } else if word == "hundred" {
            current = current.max(1).checked_mul(100)?;
        } else if let Some(multiplier) = scale(word) {
            total = total.checked_add(current.max(1).checked_mul(multiplier)?)?;
            current = 0;
        } else {
            return None;
        }
        seen = true;
    }

    if !seen {
        return None;
    }
    total.checked_add(current)
}
