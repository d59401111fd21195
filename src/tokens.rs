use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Rough estimate: GPT-style token ≈ 4 chars (good enough for UI)
pub fn approx_tokens(s: &str) -> usize {
    s.chars().count() / 4
}

/// Memoized per-file token counts for the selection list. Entries are keyed
/// by path and invalidated on mtime or size change; there is no eviction.
/// Owned by the session controller so tests get fresh instances.
#[derive(Default)]
pub struct TokenCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

struct CacheEntry {
    mtime: Option<SystemTime>,
    size: u64,
    tokens: usize,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token count for a file, `None` when the file cannot be stat'd or
    /// read. Display-only; failures never propagate.
    pub fn file_tokens(&mut self, path: &Path) -> Option<usize> {
        let meta = fs::metadata(path).ok()?;
        let mtime = meta.modified().ok();
        let size = meta.len();

        if let Some(entry) = self.entries.get(path) {
            if entry.mtime == mtime && entry.size == size {
                return Some(entry.tokens);
            }
        }

        let content = fs::read_to_string(path).ok()?;
        let tokens = approx_tokens(&content);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                mtime,
                size,
                tokens,
            },
        );
        Some(tokens)
    }
}
