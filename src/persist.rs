use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const STATE_DIR_NAME: &str = ".summary_files";
const SELECTION_FILE: &str = "previous_selection.json";
const COLLAPSED_FILE: &str = "collapsed_folders.json";
const CONFIGS_FILE: &str = "named_configs.json";
const SUMMARY_FILE: &str = "code_summary.md";

/// A persisted `(selected, compressed)` snapshot. Also the value type of the
/// named-configuration map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSelection {
    #[serde(default)]
    pub selected: Vec<PathBuf>,
    #[serde(default)]
    pub compressed: Vec<PathBuf>,
}

/// Per-project session state under `.summary_files/`: the last-used
/// selection and the last-used collapse set, each in its own JSON file.
/// Callers treat the on-disk layout as opaque.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Opens (and creates if needed) the state directory for a project root.
    pub fn open(project_root: &Path) -> Result<Self> {
        let dir = project_root.join(STATE_DIR_NAME);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating state directory {}", dir.display()))?;
        Ok(SessionStore { dir })
    }

    /// Last confirmed selection; missing or corrupt files read as empty.
    pub fn load_selection(&self) -> StoredSelection {
        read_json(&self.dir.join(SELECTION_FILE)).unwrap_or_default()
    }

    pub fn save_selection(&self, selection: &StoredSelection) -> Result<()> {
        write_json(&self.dir.join(SELECTION_FILE), selection)
    }

    /// `None` when no collapse state was ever saved (first run expands all).
    pub fn load_collapsed(&self) -> Option<Vec<String>> {
        read_json(&self.dir.join(COLLAPSED_FILE))
    }

    pub fn save_collapsed(&self, collapsed: &[String]) -> Result<()> {
        write_json(&self.dir.join(COLLAPSED_FILE), &collapsed)
    }

    /// The rendered document from the last confirmed session, kept on disk
    /// next to the clipboard copy so it can be inspected or re-used.
    pub fn save_summary(&self, document: &str) -> Result<()> {
        let path = self.dir.join(SUMMARY_FILE);
        fs::write(&path, document).with_context(|| format!("writing {}", path.display()))
    }

    pub fn config_registry(&self) -> ConfigRegistry {
        ConfigRegistry::load(self.dir.join(CONFIGS_FILE))
    }
}

/// Named, persisted `(selected, compressed)` snapshots. Every mutating call
/// writes straight through to disk, so a crash loses at most the one
/// uncommitted change.
pub struct ConfigRegistry {
    path: PathBuf,
    configs: BTreeMap<String, StoredSelection>,
}

impl ConfigRegistry {
    fn load(path: PathBuf) -> Self {
        let configs = read_json(&path).unwrap_or_default();
        ConfigRegistry { path, configs }
    }

    /// Upsert; an existing name is overwritten silently.
    pub fn save(&mut self, name: &str, selection: StoredSelection) -> Result<()> {
        self.configs.insert(name.to_string(), selection);
        self.persist()
    }

    pub fn get(&self, name: &str) -> Option<&StoredSelection> {
        self.configs.get(name)
    }

    /// Fails (no-op) when `old` is absent; overwrites `new` if it exists.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<bool> {
        match self.configs.remove(old) {
            Some(selection) => {
                self.configs.insert(new.to_string(), selection);
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// No-op when the name is absent.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.configs.remove(name).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    /// Names in map order (sorted); the overlay indexes into this list.
    pub fn names(&self) -> Vec<&str> {
        self.configs.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    fn persist(&self) -> Result<()> {
        write_json(&self.path, &self.configs)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn selection_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();

        let selection = StoredSelection {
            selected: vec![p("/a"), p("/b")],
            compressed: vec![p("/b")],
        };
        store.save_selection(&selection).unwrap();

        // Re-open from disk to prove nothing lives only in memory.
        let store = SessionStore::open(tmp.path()).unwrap();
        assert_eq!(store.load_selection(), selection);
    }

    #[test]
    fn missing_state_reads_as_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        assert_eq!(store.load_selection(), StoredSelection::default());
        assert_eq!(store.load_collapsed(), None);
    }

    #[test]
    fn corrupt_state_reads_as_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        fs::write(
            tmp.path().join(STATE_DIR_NAME).join("previous_selection.json"),
            "{not json",
        )
        .unwrap();
        assert_eq!(store.load_selection(), StoredSelection::default());
    }

    #[test]
    fn collapsed_state_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        store
            .save_collapsed(&["src".to_string(), "src/tui".to_string()])
            .unwrap();
        assert_eq!(
            store.load_collapsed(),
            Some(vec!["src".to_string(), "src/tui".to_string()])
        );
    }

    #[test]
    fn summary_document_is_written_to_state_dir() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        store.save_summary("Project Structure:\n```\n.\n```\n").unwrap();

        let on_disk =
            fs::read_to_string(tmp.path().join(STATE_DIR_NAME).join("code_summary.md")).unwrap();
        assert_eq!(on_disk, "Project Structure:\n```\n.\n```\n");
    }

    #[test]
    fn config_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        let mut registry = store.config_registry();

        let snapshot = StoredSelection {
            selected: vec![p("/a.py")],
            compressed: vec![],
        };
        registry.save("feature-x", snapshot.clone()).unwrap();

        // Fresh registry instance reads from disk.
        let registry = store.config_registry();
        assert_eq!(registry.get("feature-x"), Some(&snapshot));
    }

    #[test]
    fn rename_moves_and_misses_report_failure() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        let mut registry = store.config_registry();

        let snapshot = StoredSelection {
            selected: vec![p("/a.py")],
            compressed: vec![],
        };
        registry.save("feature-x", snapshot.clone()).unwrap();
        assert!(registry.rename("feature-x", "feature-y").unwrap());

        assert_eq!(registry.get("feature-x"), None);
        assert_eq!(registry.get("feature-y"), Some(&snapshot));

        // Renaming a missing name is a reported no-op.
        assert!(!registry.rename("feature-x", "feature-z").unwrap());
    }

    #[test]
    fn rename_collision_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        let mut registry = store.config_registry();

        let a = StoredSelection {
            selected: vec![p("/a")],
            compressed: vec![],
        };
        let b = StoredSelection {
            selected: vec![p("/b")],
            compressed: vec![],
        };
        registry.save("one", a.clone()).unwrap();
        registry.save("two", b).unwrap();

        assert!(registry.rename("one", "two").unwrap());
        assert_eq!(registry.get("two"), Some(&a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_is_noop_when_absent() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::open(tmp.path()).unwrap();
        let mut registry = store.config_registry();

        registry.delete("ghost").unwrap();
        assert!(registry.is_empty());

        registry
            .save("real", StoredSelection::default())
            .unwrap();
        registry.delete("real").unwrap();
        assert!(registry.is_empty());
    }
}
