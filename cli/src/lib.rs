//! Command handling for the interactive document Q&A shell.
//!
//! Each input line is matched against an ordered intent table; the first
//! pattern that matches wins. Order matters because patterns overlap
//! (`load folder x` would otherwise be read as `load <file named "folder x">`).

use anyhow::Result;
use docqa_core::locate::{is_supported, resolve_for_load};
use docqa_core::{Corpus, DEFAULT_TOP_K};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::path::PathBuf;

/// Snippet length used when printing matches.
pub const SNIPPET_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Final message; the caller should stop reading input.
    Quit(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(s) | Reply::Quit(s) => s,
        }
    }
}

type Handler = fn(&mut Session, &Captures) -> Result<Reply>;

lazy_static! {
    static ref INTENTS: Vec<(Regex, Handler)> = {
        let table: [(&str, Handler); 7] = [
            (r"(?i)^load\s+folder\s+(?P<folder>.+)$", |s, c| s.load_folder(&c["folder"])),
            (r"(?i)^load\s+(?P<file>.+)$", |s, c| s.load_file(&c["file"])),
            (r"(?i)^ask\s+(?P<q>.+)$", |s, c| Ok(s.ask(&c["q"]))),
            (r"(?i)^(?:list|show)\s+docs$", |s, _| Ok(s.list_docs())),
            (r"(?i)^clear\s+docs$", |s, _| Ok(s.clear_docs())),
            (r"(?i)^help$", |_, _| Ok(Reply::Text(HELP.to_string()))),
            (r"(?i)^(?:bye|exit|quit)$", |_, _| Ok(Reply::Quit("Bye!".to_string()))),
        ];
        table
            .into_iter()
            .map(|(pat, handler)| (Regex::new(pat).expect("valid intent pattern"), handler))
            .collect()
    };
}

const HELP: &str = "Commands:
  load <file>          - add a .txt/.md/.log (as given, base dir, or docs dir)
  load folder <path>   - add all .txt/.md/.log files in a folder
  list docs            - show loaded files
  clear docs           - remove all indexed files
  ask <question>       - search loaded files with TF-IDF + cosine
  help                 - this menu
  bye/exit/quit        - leave";

/// A corpus plus the directories used to resolve relative paths.
pub struct Session {
    corpus: Corpus,
    base_dir: PathBuf,
    docs_dir: PathBuf,
    auto_rebuild: bool,
    top_k: usize,
}

impl Session {
    pub fn new(corpus: Corpus, base_dir: PathBuf, docs_dir: PathBuf) -> Self {
        Self { corpus, base_dir, docs_dir, auto_rebuild: true, top_k: DEFAULT_TOP_K }
    }

    /// When disabled, loads only ingest and the caller must call [`Session::rebuild`].
    pub fn with_auto_rebuild(mut self, on: bool) -> Self {
        self.auto_rebuild = on;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn rebuild(&mut self) {
        self.corpus.rebuild();
    }

    /// Route one line of input to its intent.
    pub fn respond(&mut self, message: &str) -> Reply {
        let text = message.trim();
        if text.is_empty() {
            return Reply::Text("Say something.".to_string());
        }
        for (pattern, handler) in INTENTS.iter() {
            if let Some(caps) = pattern.captures(text) {
                return match handler(self, &caps) {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::warn!(error = %e, input = text, "intent failed");
                        Reply::Text(format!("Oops, that blew up: {e:#}"))
                    }
                };
            }
        }
        Reply::Text("Not sure. Try 'help'.".to_string())
    }

    fn resolve(&self, raw: &str) -> Option<PathBuf> {
        resolve_for_load(raw, &[&self.base_dir, &self.docs_dir])
    }

    pub fn load_file(&mut self, raw: &str) -> Result<Reply> {
        let target = match self.resolve(raw) {
            Some(p) if p.is_file() && is_supported(&p) => p,
            _ => return Ok(Reply::Text("File not found or unsupported. Use .txt/.md/.log".to_string())),
        };
        let n = self.corpus.add_file(&target)?;
        if self.auto_rebuild {
            self.corpus.rebuild();
        }
        let name = target.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        tracing::info!(path = %target.display(), chunks = n, "loaded file");
        Ok(Reply::Text(format!("Loaded {name} with {n} chunks. Ask with: ask <question>")))
    }

    pub fn load_folder(&mut self, raw: &str) -> Result<Reply> {
        let folder = match self.resolve(raw) {
            Some(p) if p.is_dir() => p,
            _ => return Ok(Reply::Text("Folder not found.".to_string())),
        };
        let (n_files, n_chunks) = self.corpus.add_folder(&folder);
        if n_files == 0 {
            return Ok(Reply::Text("No .txt/.md/.log files found in that folder.".to_string()));
        }
        if self.auto_rebuild {
            self.corpus.rebuild();
        }
        tracing::info!(folder = %folder.display(), files = n_files, chunks = n_chunks, "loaded folder");
        Ok(Reply::Text(format!("Indexed {n_files} files, {n_chunks} chunks. Ask with: ask <question>")))
    }

    pub fn ask(&self, question: &str) -> Reply {
        let q = question.trim();
        let hits = self.corpus.query(q, self.top_k);
        if hits.is_empty() {
            return Reply::Text("No good matches found. Try rephrasing or loading more files.".to_string());
        }
        let mut lines = vec![format!("Top matches for: {q}")];
        for hit in hits {
            lines.push(format!(
                "- [{}] ({:.3}) {}",
                hit.chunk.file_name(),
                hit.score,
                hit.chunk.snippet(SNIPPET_CHARS)
            ));
        }
        Reply::Text(lines.join("\n"))
    }

    pub fn list_docs(&self) -> Reply {
        let docs = self.corpus.documents();
        if docs.is_empty() {
            return Reply::Text("No docs loaded. Use: load <file> or load folder <path>".to_string());
        }
        let mut lines = vec!["Docs:".to_string()];
        for (i, d) in docs.iter().enumerate() {
            lines.push(format!("  {:>2}. {}  ({} chunks)", i + 1, d.file_name(), d.n_chunks));
        }
        Reply::Text(lines.join("\n"))
    }

    pub fn clear_docs(&mut self) -> Reply {
        self.corpus.clear();
        Reply::Text("Cleared all docs.".to_string())
    }
}
