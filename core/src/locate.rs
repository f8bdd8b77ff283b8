//! Helpers for callers that turn user-typed paths into files to ingest.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extensions accepted for ingestion, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "log"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Resolve a user-supplied path. Surrounding whitespace and double quotes are
/// stripped and a leading `~` expands to `$HOME`. The path is tried as given,
/// then joined onto each of `roots` in order; the first candidate that exists
/// is returned in canonical form.
pub fn resolve_for_load<P: AsRef<Path>>(raw: &str, roots: &[P]) -> Option<PathBuf> {
    let raw = raw.trim().trim_matches('"');
    if raw.is_empty() {
        return None;
    }
    let mut candidates = vec![PathBuf::from(shellexpand::tilde(raw).as_ref())];
    candidates.extend(roots.iter().map(|r| r.as_ref().join(raw)));
    candidates
        .into_iter()
        .find(|c| c.exists())
        .and_then(|c| c.canonicalize().ok())
}

/// Read a file as UTF-8, silently dropping byte sequences that do not decode.
pub fn read_text_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => decode_dropping_invalid(e.as_bytes()),
    })
}

fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|c| c.valid()).collect()
}
