use crate::index::{Chunk, Corpus};
use crate::tokenizer::tokenize;
use crate::vectorize::{dot, term_frequencies, weigh};
use crate::Weight;

/// Number of results a query returns unless the caller asks otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// One ranked match: cosine similarity in `(0, 1]` and the chunk it refers to.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub score: Weight,
    pub chunk: &'a Chunk,
}

/// Rank chunks by cosine similarity to `text` using the corpus IDF table.
///
/// Chunks sharing no weighted term with the query are left out. Results are
/// ordered by score, highest first; equal scores keep corpus order. At most
/// `k` hits are returned. Chunks ingested since the last rebuild have no
/// weights and are never matched.
pub fn query<'a>(corpus: &'a Corpus, text: &str, k: usize) -> Vec<Hit<'a>> {
    let mut hits = rank(corpus, text);
    hits.truncate(k);
    hits
}

/// Every matching chunk in ranked order, without the top-k cut.
pub fn rank<'a>(corpus: &'a Corpus, text: &str) -> Vec<Hit<'a>> {
    let tokens = tokenize(text);
    if tokens.is_empty() || corpus.is_empty() {
        return Vec::new();
    }
    let (q_weights, q_norm) = weigh(&term_frequencies(&tokens), corpus.idf());
    if q_weights.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<Hit<'a>> = corpus
        .chunks()
        .iter()
        .filter(|ch| !ch.weights.is_empty())
        .filter_map(|ch| {
            let d = dot(&q_weights, &ch.weights);
            if d == 0.0 {
                return None;
            }
            Some(Hit { score: d / (q_norm * ch.norm), chunk: ch })
        })
        .collect();

    // stable: ties stay in corpus order
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}

impl Corpus {
    pub fn query(&self, text: &str, k: usize) -> Vec<Hit<'_>> {
        query(self, text, k)
    }
}
