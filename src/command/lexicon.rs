//! Spanish numeric lexicon.
//!
//! [`NumericLexicon`] turns a captured quantity phrase into a number.  Word
//! forms are tried first (`"cuarenta y cinco"`, `"medio"`), then the first
//! digit literal in the phrase (`"1,5"`, `"45"`).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Static word table
// ---------------------------------------------------------------------------

static WORD_NUMBERS: &[(&str, f64)] = &[
    ("cero", 0.0),
    ("medio", 0.5),
    ("media", 0.5),
    ("un", 1.0),
    ("uno", 1.0),
    ("una", 1.0),
    ("dos", 2.0),
    ("tres", 3.0),
    ("cuatro", 4.0),
    ("cinco", 5.0),
    ("seis", 6.0),
    ("siete", 7.0),
    ("ocho", 8.0),
    ("nueve", 9.0),
    ("diez", 10.0),
    ("quince", 15.0),
    ("veinte", 20.0),
    ("veinticinco", 25.0),
    ("treinta", 30.0),
    ("cuarenta", 40.0),
    ("cuarenta y cinco", 45.0),
    ("cincuenta", 50.0),
    ("sesenta", 60.0),
    ("noventa", 90.0),
    ("cien", 100.0),
    ("ciento", 100.0),
    ("ciento veinte", 120.0),
    ("ciento ochenta", 180.0),
    ("trescientos", 300.0),
    ("trescientos sesenta", 360.0),
];

static DIGIT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:[.,]\d+)?)\b").expect("static regex"));

static LEXICON: LazyLock<NumericLexicon> = LazyLock::new(NumericLexicon::build);

// ---------------------------------------------------------------------------
// NumericLexicon
// ---------------------------------------------------------------------------

/// Process-wide, read-only table of Spanish number words.
#[derive(Debug)]
pub struct NumericLexicon {
    words: HashMap<&'static str, f64>,
    max_words: usize,
}

impl NumericLexicon {
    /// The shared lexicon instance.
    pub fn global() -> &'static NumericLexicon {
        &LEXICON
    }

    fn build() -> Self {
        let words: HashMap<_, _> = WORD_NUMBERS.iter().copied().collect();
        let max_words = WORD_NUMBERS
            .iter()
            .map(|(w, _)| w.split_whitespace().count())
            .max()
            .unwrap_or(1);
        Self { words, max_words }
    }

    /// Exact, case-insensitive word-form lookup.
    pub fn lookup(&self, phrase: &str) -> Option<f64> {
        let normalized = phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        self.words.get(normalized.as_str()).copied()
    }

    /// Word lookup first, then the first digit literal (`,` or `.` decimal
    /// separator).
    pub fn resolve(&self, phrase: &str) -> Option<f64> {
        if let Some(n) = self.lookup(phrase) {
            return Some(n);
        }
        let literal = DIGIT_NUMBER.captures(phrase)?.get(1)?.as_str();
        literal.replace(',', ".").parse().ok()
    }

    /// Resolve the quantity that ends right before `end` in `text`.
    ///
    /// The longest word-form phrase ending at `end` wins; otherwise the last
    /// word is parsed as a digit literal.
    pub fn quantity_before(&self, text: &str, end: usize) -> Option<f64> {
        let words: Vec<&str> = text.get(..end)?.split_whitespace().collect();
        let longest = self.max_words.min(words.len());

        for n in (1..=longest).rev() {
            let phrase = words[words.len() - n..].join(" ");
            if let Some(value) = self.lookup(&phrase) {
                return Some(value);
            }
        }

        self.resolve(words.last()?)
    }

    /// `true` when `phrase` is a multi-word entry (used to keep
    /// `"cuarenta y cinco"` from being split as a compound command).
    pub fn is_number_phrase(&self, phrase: &str) -> bool {
        self.lookup(phrase).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lex() -> &'static NumericLexicon {
        NumericLexicon::global()
    }

    #[test]
    fn resolves_single_words() {
        assert_eq!(lex().resolve("dos"), Some(2.0));
        assert_eq!(lex().resolve("cien"), Some(100.0));
        assert_eq!(lex().resolve("Medio"), Some(0.5));
        assert_eq!(lex().resolve("media"), Some(0.5));
    }

    #[test]
    fn resolves_multi_word_entries() {
        assert_eq!(lex().resolve("cuarenta y cinco"), Some(45.0));
        assert_eq!(lex().resolve("trescientos  sesenta"), Some(360.0));
        assert_eq!(lex().resolve("ciento ochenta"), Some(180.0));
    }

    #[test]
    fn falls_back_to_digit_literals() {
        assert_eq!(lex().resolve("3"), Some(3.0));
        assert_eq!(lex().resolve("unos 45"), Some(45.0));
        assert_eq!(lex().resolve("1,5"), Some(1.5));
        assert_eq!(lex().resolve("2.25"), Some(2.25));
    }

    #[test]
    fn unresolvable_phrase_is_none() {
        assert_eq!(lex().resolve("muchos"), None);
        assert_eq!(lex().resolve(""), None);
    }

    #[test]
    fn quantity_before_prefers_longest_phrase() {
        let text = "gira cuarenta y cinco grados";
        let end = text.find("grados").unwrap();
        assert_eq!(lex().quantity_before(text, end), Some(45.0));

        let text = "gira trescientos sesenta grados";
        let end = text.find("grados").unwrap();
        assert_eq!(lex().quantity_before(text, end), Some(360.0));
    }

    #[test]
    fn quantity_before_reads_digits_and_words() {
        let text = "avanza 3 metros";
        assert_eq!(lex().quantity_before(text, text.find("metros").unwrap()), Some(3.0));

        let text = "avanza medio metro";
        assert_eq!(lex().quantity_before(text, text.find("metro").unwrap()), Some(0.5));

        let text = "metros";
        assert_eq!(lex().quantity_before(text, 0), None);
    }
}
