//! TF-IDF weighting over sparse term maps.
//!
//! Term frequency is uniform per occurrence (each token adds `1/len`), so a
//! chunk's frequencies sum to one. Inverse document frequency is smoothed:
//! `idf(t) = ln((1 + N) / (1 + df(t))) + 1`, with `N` the chunk count (at
//! least one) and `df(t)` the number of distinct chunks containing `t`.

use crate::{Chunk, IdfTable, TermWeights, Weight};
use std::collections::{HashMap, HashSet};

/// Frequency map of a token sequence. Empty input gives an empty map.
pub fn term_frequencies<S: AsRef<str>>(tokens: &[S]) -> TermWeights {
    let mut tf = TermWeights::new();
    if tokens.is_empty() {
        return tf;
    }
    let inv = 1.0 / tokens.len() as Weight;
    for t in tokens {
        *tf.entry(t.as_ref().to_string()).or_insert(0.0) += inv;
    }
    tf
}

/// Number of distinct chunks each term occurs in.
pub fn document_frequencies(chunks: &[Chunk]) -> HashMap<&str, u32> {
    let mut df: HashMap<&str, u32> = HashMap::new();
    for ch in chunks {
        let seen: HashSet<&str> = ch.tokens.iter().map(String::as_str).collect();
        for t in seen {
            *df.entry(t).or_insert(0) += 1;
        }
    }
    df
}

pub fn inverse_document_frequencies(chunks: &[Chunk]) -> IdfTable {
    let n = chunks.len().max(1) as Weight;
    document_frequencies(chunks)
        .into_iter()
        .map(|(t, df_t)| (t.to_string(), ((1.0 + n) / (1.0 + df_t as Weight)).ln() + 1.0))
        .collect()
}

/// Apply `idf` to a frequency map, returning the weight vector and its
/// Euclidean norm. Terms without an IDF entry are dropped. The norm is 1.0
/// when nothing survives so callers can always divide by it.
pub fn weigh(tf: &TermWeights, idf: &IdfTable) -> (TermWeights, Weight) {
    let weights: TermWeights = tf
        .iter()
        .filter_map(|(t, f)| idf.get(t).map(|w| (t.clone(), f * w)))
        .collect();
    let norm = norm_of(&weights);
    (weights, norm)
}

fn norm_of(weights: &TermWeights) -> Weight {
    let norm = weights.values().map(|v| v * v).sum::<Weight>().sqrt();
    if norm == 0.0 { 1.0 } else { norm }
}

/// Sparse dot product. Walks the smaller map and probes the larger one.
pub fn dot(a: &TermWeights, b: &TermWeights) -> Weight {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(t, v)| large.get(t).map(|w| v * w))
        .sum()
}
