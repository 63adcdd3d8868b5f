//! Token Scanner: extracts G-code *words* — a letter paired with a signed
//! decimal number — from a line's code part.

use std::sync::OnceLock;

use regex::Regex;

/// A single G-code word extracted from a code part.
///
/// `letter` is normalized to uppercase for dispatch; `value_text` and `raw`
/// preserve the exact source text so unrecognized or unparseable words can
/// be passed through byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Uppercased command letter, e.g. `'X'`.
    pub letter: char,
    /// The signed decimal exactly as written, e.g. `"-60"`, `".5"`.
    pub value_text: String,
    /// The full original substring (letter + value_text), preserving the
    /// source letter's original case.
    pub raw: String,
    /// Byte offset of this word's first character within the code part it
    /// was scanned from.
    pub index: usize,
}

impl Word {
    /// Parses `value_text` as `f64`. Fails only on malformed input the
    /// scanner's own regex should never actually produce (e.g. a bare `.`
    /// or `-`), which the spec treats as a pass-through warning rather than
    /// an error.
    pub fn parsed_value(&self) -> Option<f64> {
        self.value_text.parse::<f64>().ok()
    }
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // letter, then an optional sign, then digits-with-optional-fraction
        // or a bare fractional like ".5". No exponent form.
        Regex::new(r"(?P<letter>[A-Za-z])(?P<value>[+-]?(?:\d+\.\d*|\.\d+|\d+))")
            .expect("static word regex must compile")
    })
}

/// Scans `code_part` and returns its words in source order.
pub fn scan_words(code_part: &str) -> Vec<Word> {
    word_regex()
        .captures_iter(code_part)
        .map(|caps| {
            let whole = caps.get(0).expect("capture group 0 always matches");
            let letter_match = caps.name("letter").expect("letter group always matches");
            let value_match = caps.name("value").expect("value group always matches");
            Word {
                letter: letter_match
                    .as_str()
                    .chars()
                    .next()
                    .expect("letter group is exactly one char")
                    .to_ascii_uppercase(),
                value_text: value_match.as_str().to_string(),
                raw: whole.as_str().to_string(),
                index: whole.start(),
            }
        })
        .collect()
}

/// The full recognized G-code letter alphabet (§7). Anything else triggers
/// a diagnostic but is still passed through unchanged.
pub const KNOWN_LETTERS: &[char] = &[
    'G', 'M', 'T', 'X', 'Y', 'Z', 'I', 'J', 'K', 'F', 'R', 'S', 'D', 'A', 'P',
];

/// Letters present in `words` that fall outside [`KNOWN_LETTERS`], in order
/// of first appearance, deduplicated.
pub fn unknown_letters(words: &[Word]) -> Vec<char> {
    let mut seen = Vec::new();
    for w in words {
        if !KNOWN_LETTERS.contains(&w.letter) && !seen.contains(&w.letter) {
            seen.push(w.letter);
        }
    }
    seen
}
