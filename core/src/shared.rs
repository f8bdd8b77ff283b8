use crate::index::Corpus;
use crate::search::rank;
use crate::Weight;
use anyhow::Result;
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::Path;
use std::sync::Arc;

/// Owned copy of a ranked match, for use after the corpus lock is released.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OwnedHit {
    pub doc_path: String,
    pub chunk_id: usize,
    pub score: Weight,
    pub text: String,
}

/// Corpus handle for concurrent callers. Queries share a read lock; ingestion,
/// rebuild and clear hold the write lock, so no query ever sees a
/// half-rebuilt set of vectors.
#[derive(Clone, Default)]
pub struct SharedCorpus {
    inner: Arc<RwLock<Corpus>>,
}

impl SharedCorpus {
    pub fn new(corpus: Corpus) -> Self {
        Self { inner: Arc::new(RwLock::new(corpus)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Corpus> {
        self.inner.read()
    }

    /// Ingest one file, optionally rebuilding in the same critical section.
    pub fn add_file(&self, path: &Path, rebuild: bool) -> Result<usize> {
        let mut corpus = self.inner.write();
        let n = corpus.add_file(path)?;
        if rebuild {
            corpus.rebuild();
        }
        Ok(n)
    }

    pub fn add_folder(&self, folder: &Path, rebuild: bool) -> (usize, usize) {
        let mut corpus = self.inner.write();
        let counts = corpus.add_folder(folder);
        if rebuild && counts.0 > 0 {
            corpus.rebuild();
        }
        counts
    }

    pub fn rebuild(&self) {
        self.inner.write().rebuild();
    }

    /// Swap in a fresh corpus with the same chunk bound.
    pub fn clear(&self) {
        let mut corpus = self.inner.write();
        *corpus = Corpus::with_max_chars(corpus.max_chars());
    }

    pub fn query(&self, text: &str, k: usize) -> Vec<OwnedHit> {
        self.query_with_total(text, k).1
    }

    /// Top `k` hits together with the number of chunks that matched at all.
    pub fn query_with_total(&self, text: &str, k: usize) -> (usize, Vec<OwnedHit>) {
        let corpus = self.inner.read();
        let mut hits = rank(&corpus, text);
        let total = hits.len();
        hits.truncate(k);
        let owned = hits
            .into_iter()
            .map(|h| OwnedHit {
                doc_path: h.chunk.doc_path.clone(),
                chunk_id: h.chunk.chunk_id,
                score: h.score,
                text: h.chunk.text.clone(),
            })
            .collect();
        (total, owned)
    }
}
