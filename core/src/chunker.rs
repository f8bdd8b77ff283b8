//! Paragraph-aware chunking.
//!
//! Text is split on blank lines into paragraphs. Paragraphs that fit within
//! the character budget become one chunk each; longer ones are broken at
//! sentence ends (`.`, `!`, `?` followed by whitespace) and greedily repacked.
//! A sentence longer than the budget is kept whole. Abbreviations such as
//! "Dr." are treated as sentence ends.

use lazy_static::lazy_static;
use regex::Regex;

/// Chunk size used by ingestion unless a corpus is built with another bound.
pub const DEFAULT_MAX_CHARS: usize = 600;

lazy_static! {
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").expect("valid regex");
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").expect("valid regex");
}

/// Split `text` into chunks of at most `max_chars` characters where sentence
/// boundaries allow it. Lengths count Unicode scalar values, not bytes.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    for para in PARAGRAPH_BREAK.split(text).map(str::trim).filter(|p| !p.is_empty()) {
        if para.chars().count() <= max_chars {
            chunks.push(para.to_string());
        } else {
            pack_sentences(para, max_chars, &mut chunks);
        }
    }

    if chunks.is_empty() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.chars().take(max_chars).collect());
        }
    }
    chunks
}

fn pack_sentences(para: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for sentence in sentences(para) {
        let len = sentence.chars().count();
        if cur_len + len + 1 <= max_chars {
            if !cur.is_empty() {
                cur.push(' ');
                cur_len += 1;
            }
            cur.push_str(sentence);
            cur_len += len;
        } else {
            if !cur.is_empty() {
                out.push(std::mem::take(&mut cur));
            }
            cur.push_str(sentence);
            cur_len = len;
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
}

/// Sentences of a trimmed paragraph; terminal punctuation stays with its sentence.
fn sentences(para: &str) -> impl Iterator<Item = &str> {
    let mut start = 0;
    let mut parts = Vec::new();
    for m in SENTENCE_END.find_iter(para) {
        // punctuation is a single ASCII byte
        let cut = m.start() + 1;
        parts.push(&para[start..cut]);
        start = m.end();
    }
    parts.push(&para[start..]);
    parts.into_iter().filter(|s| !s.is_empty())
}
