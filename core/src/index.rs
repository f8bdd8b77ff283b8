use crate::chunker::{split_chunks, DEFAULT_MAX_CHARS};
use crate::locate::{is_supported, read_text_lossy};
use crate::tokenizer::tokenize;
use crate::vectorize::{inverse_document_frequencies, term_frequencies, weigh};
use crate::{ChunkId, IdfTable, TermWeights, Weight};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub path: String,
    pub n_chunks: usize,
}

impl Document {
    /// Final path component, or the whole path when there is none.
    pub fn file_name(&self) -> &str {
        display_name(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub doc_path: String,
    /// Ordinal of this chunk within its document.
    pub chunk_id: ChunkId,
    pub text: String,
    pub tokens: Vec<String>,
    pub tf: TermWeights,
    /// TF-IDF weights; empty until the next rebuild.
    pub weights: TermWeights,
    pub norm: Weight,
}

impl Chunk {
    pub fn file_name(&self) -> &str {
        display_name(&self.doc_path)
    }

    pub fn snippet(&self, max_chars: usize) -> String {
        snippet(&self.text, max_chars)
    }
}

/// One-line preview of `text`, at most `max_chars` characters including a
/// trailing `...` when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn display_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// In-memory corpus: documents and their chunks in insertion order plus the
/// IDF table from the last [`Corpus::rebuild`].
#[derive(Debug)]
pub struct Corpus {
    docs: Vec<Document>,
    chunks: Vec<Chunk>,
    idf: IdfTable,
    max_chars: usize,
    stale: bool,
}

impl Default for Corpus {
    fn default() -> Self {
        Self::with_max_chars(DEFAULT_MAX_CHARS)
    }
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { docs: Vec::new(), chunks: Vec::new(), idf: IdfTable::new(), max_chars, stale: false }
    }

    pub fn documents(&self) -> &[Document] { &self.docs }
    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn idf(&self) -> &IdfTable { &self.idf }
    pub fn max_chars(&self) -> usize { self.max_chars }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    /// True when chunks were added after the last rebuild and carry no weights yet.
    pub fn needs_rebuild(&self) -> bool { self.stale }

    /// Chunk `text` under the name `source` and append it as one document.
    /// Chunks with no tokens are not stored. Weights stay empty until
    /// [`Corpus::rebuild`]. Returns the number of chunks stored.
    pub fn add_text(&mut self, source: &str, text: &str) -> usize {
        let mut n = 0;
        for piece in split_chunks(text, self.max_chars) {
            let tokens = tokenize(&piece);
            if tokens.is_empty() {
                tracing::trace!(source, "skipping chunk without tokens");
                continue;
            }
            let tf = term_frequencies(&tokens);
            self.chunks.push(Chunk {
                doc_path: source.to_string(),
                chunk_id: n,
                text: piece,
                tokens,
                tf,
                weights: TermWeights::new(),
                norm: 0.0,
            });
            n += 1;
        }
        self.docs.push(Document { path: source.to_string(), n_chunks: n });
        self.stale |= n > 0;
        n
    }

    /// Read and ingest one file. The path is assumed to be an existing,
    /// supported file; invalid UTF-8 is dropped rather than rejected.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = read_text_lossy(path).with_context(|| format!("reading {}", path.display()))?;
        let n = self.add_text(&path.to_string_lossy(), &text);
        tracing::debug!(path = %path.display(), chunks = n, "ingested file");
        Ok(n)
    }

    /// Ingest every supported file directly inside `folder`, in path order.
    /// A folder that cannot be listed counts as empty; a file that cannot be
    /// read is skipped with a warning and not counted.
    pub fn add_folder<P: AsRef<Path>>(&mut self, folder: P) -> (usize, usize) {
        let folder = folder.as_ref();
        let (mut n_files, mut n_chunks) = (0, 0);
        for f in list_supported_files(folder) {
            match self.add_file(&f) {
                Ok(n) => {
                    n_files += 1;
                    n_chunks += n;
                }
                Err(e) => tracing::warn!(path = %f.display(), error = ?e, "skipping unreadable file"),
            }
        }
        tracing::debug!(folder = %folder.display(), files = n_files, chunks = n_chunks, "ingested folder");
        (n_files, n_chunks)
    }

    /// Recompute the IDF table from every chunk, then every chunk's weights
    /// and norm. Always a full pass.
    pub fn rebuild(&mut self) {
        self.idf = inverse_document_frequencies(&self.chunks);
        for ch in self.chunks.iter_mut() {
            let (weights, norm) = weigh(&ch.tf, &self.idf);
            ch.weights = weights;
            ch.norm = norm;
        }
        self.stale = false;
        tracing::debug!(chunks = self.chunks.len(), terms = self.idf.len(), "rebuilt tf-idf vectors");
    }

    /// Drop all documents, chunks and the IDF table, keeping the chunk bound.
    pub fn clear(&mut self) {
        *self = Self::with_max_chars(self.max_chars);
    }
}

fn list_supported_files(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_supported(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
