use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Inclusion state for a file that appears in the output document. Absence
/// from the map means unselected, so `compressed ⊆ selected` holds by
/// construction: a compressed file is always a selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Selected,
    Compressed,
}

/// The three overlapping state sets of an interactive session: which files
/// are included, which of those go in compressed, and which folders are
/// collapsed in the view. Owned exclusively by the event-loop thread.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    files: BTreeMap<PathBuf, FileState>,
    collapsed: BTreeSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted path lists. Compressed paths win over plain
    /// selected ones; stale paths are filtered by the caller.
    pub fn seed(selected: &[PathBuf], compressed: &[PathBuf], collapsed: &[String]) -> Self {
        let mut state = SelectionState::new();
        for path in selected {
            state.files.insert(path.clone(), FileState::Selected);
        }
        for path in compressed {
            state.files.insert(path.clone(), FileState::Compressed);
        }
        state.collapsed = collapsed.iter().cloned().collect();
        state
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn is_compressed(&self, path: &Path) -> bool {
        self.files.get(path) == Some(&FileState::Compressed)
    }

    pub fn is_collapsed(&self, key: &str) -> bool {
        self.collapsed.contains(key)
    }

    /// Flip membership in the selected set. Deselecting also drops the
    /// compressed flag.
    pub fn toggle_file(&mut self, path: &Path) {
        if self.files.remove(path).is_none() {
            self.files.insert(path.to_path_buf(), FileState::Selected);
        }
    }

    /// Flip compressed mode. Compressing an unselected file selects it as a
    /// side effect; uncompressing keeps it selected.
    pub fn toggle_compressed(&mut self, path: &Path) {
        let next = match self.files.get(path) {
            Some(FileState::Compressed) => FileState::Selected,
            _ => FileState::Compressed,
        };
        self.files.insert(path.to_path_buf(), next);
    }

    pub fn toggle_folder_collapse(&mut self, key: &str) {
        if !self.collapsed.remove(key) {
            self.collapsed.insert(key.to_string());
        }
    }

    /// Bulk toggle over a file set (a folder's descendants, or the whole
    /// candidate set). If every file is already selected the action
    /// deselects all of them; otherwise it selects all of them — a mixed
    /// set is brought to full coverage, never partially toggled.
    pub fn bulk_toggle(&mut self, files: &[PathBuf]) {
        if files.is_empty() {
            return;
        }
        if files.iter().all(|p| self.is_selected(p)) {
            for path in files {
                self.files.remove(path);
            }
        } else {
            for path in files {
                self.files
                    .entry(path.clone())
                    .or_insert(FileState::Selected);
            }
        }
    }

    /// Remove collapse state for every key in `keys` (expand-all over a
    /// subtree).
    pub fn expand_folders(&mut self, keys: &[String]) {
        for key in keys {
            self.collapsed.remove(key);
        }
    }

    /// Collapse every key in `keys`. Callers pass descendant keys only, so
    /// the target folder itself stays open.
    pub fn collapse_folders(&mut self, keys: &[String]) {
        for key in keys {
            self.collapsed.insert(key.clone());
        }
    }

    /// Drop entries not present in the current candidate set (files deleted
    /// or newly ignored since the state was persisted).
    pub fn retain_known(&mut self, known: &BTreeSet<PathBuf>) {
        self.files.retain(|path, _| known.contains(path));
    }

    /// Replace the selected/compressed sets wholesale (configuration load).
    /// Collapse state is untouched; it belongs to the view, not the config.
    pub fn replace_selection(&mut self, selected: &[PathBuf], compressed: &[PathBuf]) {
        self.files.clear();
        for path in selected {
            self.files.insert(path.clone(), FileState::Selected);
        }
        for path in compressed {
            self.files.insert(path.clone(), FileState::Compressed);
        }
    }

    /// All selected files (compressed included), sorted.
    pub fn selected_paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// The compressed subset, sorted.
    pub fn compressed_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|(_, s)| **s == FileState::Compressed)
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.files.len()
    }

    pub fn compressed_count(&self) -> usize {
        self.files
            .values()
            .filter(|s| **s == FileState::Compressed)
            .count()
    }

    pub fn collapsed_keys(&self) -> &BTreeSet<String> {
        &self.collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn compressed_is_always_a_subset_of_selected() {
        let mut state = SelectionState::new();
        state.toggle_compressed(&p("/a"));
        assert!(state.is_selected(&p("/a")));
        assert!(state.is_compressed(&p("/a")));

        // Deselecting removes the compressed flag too.
        state.toggle_file(&p("/a"));
        assert!(!state.is_selected(&p("/a")));
        assert!(!state.is_compressed(&p("/a")));
        assert!(state.compressed_paths().is_empty());
    }

    #[test]
    fn toggle_file_is_idempotent_over_two_applications() {
        let mut state = SelectionState::new();
        state.toggle_file(&p("/x"));
        state.toggle_file(&p("/x"));
        assert!(!state.is_selected(&p("/x")));

        state.toggle_file(&p("/x"));
        assert!(state.is_selected(&p("/x")));
    }

    #[test]
    fn uncompressing_keeps_selection() {
        let mut state = SelectionState::new();
        state.toggle_compressed(&p("/a"));
        state.toggle_compressed(&p("/a"));
        assert!(state.is_selected(&p("/a")));
        assert!(!state.is_compressed(&p("/a")));
    }

    #[test]
    fn bulk_toggle_full_coverage_semantics() {
        let mut state = SelectionState::new();
        let files = vec![p("/src/a.py"), p("/src/b.py")];

        state.bulk_toggle(&files);
        assert!(state.is_selected(&p("/src/a.py")));
        assert!(state.is_selected(&p("/src/b.py")));

        // All selected: second invocation deselects everything.
        state.bulk_toggle(&files);
        assert_eq!(state.selected_count(), 0);

        // Mixed set is selected to full coverage, not partially toggled.
        state.toggle_file(&p("/src/a.py"));
        state.bulk_toggle(&files);
        assert_eq!(state.selected_count(), 2);
    }

    #[test]
    fn bulk_toggle_preserves_compressed_flags_when_selecting() {
        let mut state = SelectionState::new();
        state.toggle_compressed(&p("/a"));
        state.bulk_toggle(&[p("/a"), p("/b")]);
        assert!(state.is_compressed(&p("/a")));
        assert!(state.is_selected(&p("/b")));
        assert!(!state.is_compressed(&p("/b")));
    }

    #[test]
    fn collapse_toggle_does_not_touch_selection() {
        let mut state = SelectionState::new();
        state.toggle_file(&p("/src/a.py"));
        state.toggle_folder_collapse("src");
        assert!(state.is_collapsed("src"));
        assert!(state.is_selected(&p("/src/a.py")));

        state.toggle_folder_collapse("src");
        assert!(!state.is_collapsed("src"));
    }

    #[test]
    fn expand_and_collapse_bulk() {
        let mut state = SelectionState::new();
        let keys = vec!["a".to_string(), "a/b".to_string()];
        state.collapse_folders(&keys);
        assert!(state.is_collapsed("a") && state.is_collapsed("a/b"));

        state.expand_folders(&keys);
        assert!(!state.is_collapsed("a") && !state.is_collapsed("a/b"));
    }

    #[test]
    fn seed_and_retain_known() {
        let mut state = SelectionState::seed(
            &[p("/a"), p("/gone")],
            &[p("/b")],
            &["src".to_string()],
        );
        assert!(state.is_selected(&p("/a")));
        assert!(state.is_compressed(&p("/b")));
        assert!(state.is_collapsed("src"));

        let known = BTreeSet::from([p("/a"), p("/b")]);
        state.retain_known(&known);
        assert!(!state.is_selected(&p("/gone")));
        assert_eq!(state.selected_count(), 2);
    }

    #[test]
    fn replace_selection_keeps_collapse_state() {
        let mut state = SelectionState::new();
        state.toggle_file(&p("/old"));
        state.toggle_folder_collapse("src");

        state.replace_selection(&[p("/new")], &[p("/new")]);
        assert!(!state.is_selected(&p("/old")));
        assert!(state.is_compressed(&p("/new")));
        assert!(state.is_collapsed("src"));
    }

    #[test]
    fn path_lists_are_sorted() {
        let mut state = SelectionState::new();
        state.toggle_file(&p("/z"));
        state.toggle_file(&p("/a"));
        state.toggle_compressed(&p("/m"));
        assert_eq!(state.selected_paths(), vec![p("/a"), p("/m"), p("/z")]);
        assert_eq!(state.compressed_paths(), vec![p("/m")]);
    }
}
