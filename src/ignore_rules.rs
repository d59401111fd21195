use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Directories and files that are never worth showing, regardless of .gitignore.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".summary_files",
    "__pycache__",
    "node_modules",
    "target",
    "venv",
    ".venv",
    ".idea",
    ".vscode",
    "dist",
    "build",
    ".DS_Store",
];

/// Combined ignore-rule resolver: .gitignore patterns, the default ignore
/// list, and binary-content sniffing for files. The tree builder consults
/// this through `is_ignored` and prunes directories before descending.
pub struct IgnoreRules {
    gitignore: Option<Gitignore>,
    include_ignored: bool,
    type_filter: Vec<String>,
}

impl IgnoreRules {
    pub fn load(root: &Path, include_ignored: bool, type_filter: &[String]) -> Self {
        let gitignore_path = root.join(".gitignore");
        let gitignore = if gitignore_path.exists() {
            let mut builder = GitignoreBuilder::new(root);
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!("Could not parse {}: {}", gitignore_path.display(), e);
            }
            match builder.build() {
                Ok(gi) => Some(gi),
                Err(e) => {
                    log::warn!("Ignoring .gitignore rules: {}", e);
                    None
                }
            }
        } else {
            None
        };

        IgnoreRules {
            gitignore,
            include_ignored,
            type_filter: type_filter.to_vec(),
        }
    }

    /// Predicate handed to the tree builder. `relative_path` is relative to
    /// the scan root; directories returning true are pruned entirely.
    pub fn is_ignored(&self, relative_path: &Path, is_dir: bool) -> bool {
        if relative_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| DEFAULT_IGNORES.contains(&name))
        {
            return true;
        }

        if !self.include_ignored {
            if let Some(gitignore) = &self.gitignore {
                if gitignore
                    .matched_path_or_any_parents(relative_path, is_dir)
                    .is_ignore()
                {
                    return true;
                }
            }
        }

        if !is_dir {
            if !self.type_filter.is_empty() {
                let keep = relative_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| self.type_filter.iter().any(|t| t == ext));
                if !keep {
                    return true;
                }
            }
        }

        false
    }
}

/// Sniff the first chunk of a file for NUL bytes. Unreadable files count as
/// binary so the tree builder skips them instead of failing later.
pub fn is_binary(path: &Path) -> bool {
    let mut buf = [0u8; 1024];
    match File::open(path).and_then(|mut f| f.read(&mut buf)) {
        Ok(n) => buf[..n].contains(&0),
        Err(e) => {
            log::debug!("Could not sniff {}: {}", path.display(), e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn default_ignores_apply_without_gitignore() {
        let tmp = TempDir::new().unwrap();
        let rules = IgnoreRules::load(tmp.path(), false, &[]);

        assert!(rules.is_ignored(Path::new(".git"), true));
        assert!(rules.is_ignored(Path::new("node_modules"), true));
        assert!(!rules.is_ignored(Path::new("src"), true));
        assert!(!rules.is_ignored(Path::new("main.rs"), false));
    }

    #[test]
    fn gitignore_patterns_are_honored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\nsecret/\n").unwrap();
        let rules = IgnoreRules::load(tmp.path(), false, &[]);

        assert!(rules.is_ignored(Path::new("debug.log"), false));
        assert!(rules.is_ignored(Path::new("secret"), true));
        assert!(!rules.is_ignored(Path::new("main.rs"), false));
    }

    #[test]
    fn include_ignored_bypasses_gitignore_but_not_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\n").unwrap();
        let rules = IgnoreRules::load(tmp.path(), true, &[]);

        assert!(!rules.is_ignored(Path::new("debug.log"), false));
        assert!(rules.is_ignored(Path::new(".git"), true));
    }

    #[test]
    fn type_filter_only_restricts_files() {
        let tmp = TempDir::new().unwrap();
        let rules = IgnoreRules::load(tmp.path(), false, &["rs".to_string()]);

        assert!(!rules.is_ignored(Path::new("main.rs"), false));
        assert!(rules.is_ignored(Path::new("notes.md"), false));
        assert!(!rules.is_ignored(Path::new("docs"), true));
    }

    #[test]
    fn binary_sniffing() {
        let tmp = TempDir::new().unwrap();
        let text = tmp.path().join("a.txt");
        fs::write(&text, "hello world\n").unwrap();
        let bin = tmp.path().join("a.bin");
        let mut f = File::create(&bin).unwrap();
        f.write_all(&[0u8, 159, 146, 150]).unwrap();

        assert!(!is_binary(&text));
        assert!(is_binary(&bin));
        assert!(is_binary(&tmp.path().join("missing.bin")));
    }
}
