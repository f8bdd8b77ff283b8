//! In-memory document search: paragraph-aware chunking, TF-IDF weighting and
//! cosine-ranked retrieval.
//!
//! Typical use is ingest, rebuild once, then query:
//!
//! ```
//! use docqa_core::Corpus;
//!
//! let mut corpus = Corpus::new();
//! corpus.add_text("pets.txt", "the cat sat\n\nthe dog ran");
//! corpus.rebuild();
//! let hits = corpus.query("cat", 3);
//! assert_eq!(hits[0].chunk.text, "the cat sat");
//! ```

pub mod chunker;
pub mod index;
pub mod locate;
pub mod search;
pub mod shared;
pub mod tokenizer;
pub mod vectorize;

use std::collections::HashMap;

pub type Weight = f64;
pub type ChunkId = usize;
/// Sparse term -> weight map.
pub type TermWeights = HashMap<String, Weight>;
pub type IdfTable = HashMap<String, Weight>;

pub use chunker::{split_chunks, DEFAULT_MAX_CHARS};
pub use index::{snippet, Chunk, Corpus, Document};
pub use search::{query, rank, Hit, DEFAULT_TOP_K};
pub use shared::{OwnedHit, SharedCorpus};
pub use tokenizer::tokenize;
