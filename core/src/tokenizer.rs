use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[A-Za-z0-9_]+").expect("valid regex");
}

/// Split text into lowercase runs of ASCII letters, digits and underscore, in order.
/// Duplicates are kept; anything else acts as a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}
