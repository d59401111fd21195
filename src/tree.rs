use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// A directory tree with empty folders pruned. Folder children are keyed by
/// name; ordering is a view concern handled by `flatten`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File(PathBuf),
    Folder(BTreeMap<String, TreeNode>),
}

impl TreeNode {
    /// True when this subtree contains no file at any depth.
    fn is_empty_subtree(&self) -> bool {
        match self {
            TreeNode::File(_) => false,
            TreeNode::Folder(children) => children.values().all(|c| c.is_empty_subtree()),
        }
    }
}

/// One line of the rendered selection list after collapse-state projection
/// and single-file-folder elision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    /// Display label, e.g. `src/` or `src/main.rs`.
    pub label: String,
    /// Folder key (root-relative, `/`-separated) for folders; the absolute
    /// path string for files. Stable across redraws.
    pub key: String,
    pub is_folder: bool,
    pub file_path: Option<PathBuf>,
}

impl VisibleRow {
    fn file(label: String, path: PathBuf) -> Self {
        VisibleRow {
            label,
            key: path.to_string_lossy().into_owned(),
            is_folder: false,
            file_path: Some(path),
        }
    }

    fn folder(label: String, key: String) -> Self {
        VisibleRow {
            label,
            key,
            is_folder: true,
            file_path: None,
        }
    }
}

/// Walk `root`, consulting `is_ignored(relative_path, is_dir)` for every
/// entry. Ignored directories are pruned before descending; unreadable
/// entries are skipped. Folders with no surviving file anywhere in their
/// subtree are removed in a post-pass.
pub fn build(root: &Path, is_ignored: &dyn Fn(&Path, bool) -> bool) -> TreeNode {
    let mut children = BTreeMap::new();
    build_into(root, root, is_ignored, &mut children);
    let mut tree = TreeNode::Folder(children);
    prune_empty(&mut tree);
    tree
}

fn build_into(
    root: &Path,
    dir: &Path,
    is_ignored: &dyn Fn(&Path, bool) -> bool,
    out: &mut BTreeMap<String, TreeNode>,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let is_dir = match entry.file_type() {
            Ok(ft) => ft.is_dir(),
            Err(e) => {
                log::debug!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        let relative = path.strip_prefix(root).unwrap_or(&path);

        if is_ignored(relative, is_dir) {
            continue;
        }

        if is_dir {
            let mut sub = BTreeMap::new();
            build_into(root, &path, is_ignored, &mut sub);
            out.insert(name, TreeNode::Folder(sub));
        } else {
            if crate::ignore_rules::is_binary(&path) {
                continue;
            }
            out.insert(name, TreeNode::File(path));
        }
    }
}

fn prune_empty(node: &mut TreeNode) {
    if let TreeNode::Folder(children) = node {
        for child in children.values_mut() {
            prune_empty(child);
        }
        children.retain(|_, c| !c.is_empty_subtree());
    }
}

/// Project the tree into the ordered list of visible rows. Files sort before
/// subfolders at each level; both groups are name-ordered. A subfolder whose
/// entire content is a single file is elided into one combined file row.
/// Folders listed in `collapsed` emit their row but none of their children.
pub fn flatten(tree: &TreeNode, collapsed: &BTreeSet<String>) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    if let TreeNode::Folder(children) = tree {
        flatten_level(children, "", collapsed, &mut rows);
    }
    rows
}

fn flatten_level(
    children: &BTreeMap<String, TreeNode>,
    prefix: &str,
    collapsed: &BTreeSet<String>,
    rows: &mut Vec<VisibleRow>,
) {
    for (name, node) in children {
        if let TreeNode::File(path) = node {
            rows.push(VisibleRow::file(format!("{prefix}{name}"), path.clone()));
        }
    }
    for (name, node) in children {
        let TreeNode::Folder(sub) = node else {
            continue;
        };
        if let Some((file_name, path)) = sole_file(sub) {
            rows.push(VisibleRow::file(
                format!("{prefix}{name}/{file_name}"),
                path.clone(),
            ));
            continue;
        }
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}{name}")
        };
        let label = format!("{prefix}{name}/");
        rows.push(VisibleRow::folder(label.clone(), key.clone()));
        if !collapsed.contains(&key) {
            flatten_level(sub, &label, collapsed, rows);
        }
    }
}

/// `Some((name, path))` when the folder holds exactly one file and nothing else.
fn sole_file(children: &BTreeMap<String, TreeNode>) -> Option<(&String, &PathBuf)> {
    if children.len() != 1 {
        return None;
    }
    match children.iter().next() {
        Some((name, TreeNode::File(path))) => Some((name, path)),
        _ => None,
    }
}

fn navigate<'a>(tree: &'a TreeNode, key: &str) -> Option<&'a TreeNode> {
    if key.is_empty() {
        return Some(tree);
    }
    let mut current = tree;
    for part in key.split('/') {
        match current {
            TreeNode::Folder(children) => current = children.get(part)?,
            TreeNode::File(_) => return None,
        }
    }
    Some(current)
}

/// All file paths in the subtree rooted at `key` (empty key = whole tree),
/// sorted by path.
pub fn files_under(tree: &TreeNode, key: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(node) = navigate(tree, key) {
        collect_files(node, &mut files);
    }
    files.sort();
    files
}

fn collect_files(node: &TreeNode, out: &mut Vec<PathBuf>) {
    match node {
        TreeNode::File(path) => out.push(path.clone()),
        TreeNode::Folder(children) => {
            for child in children.values() {
                collect_files(child, out);
            }
        }
    }
}

/// Folder keys strictly below `key` (the target itself is excluded so that
/// collapse-all never hides the folder the user is sitting on). Elided
/// single-file folders never produce keys; they have no folder row to toggle.
pub fn folder_keys_under(tree: &TreeNode, key: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(TreeNode::Folder(children)) = navigate(tree, key) {
        collect_folder_keys(children, key, &mut keys);
    }
    keys
}

fn collect_folder_keys(children: &BTreeMap<String, TreeNode>, prefix: &str, out: &mut Vec<String>) {
    for (name, node) in children {
        let TreeNode::Folder(sub) = node else {
            continue;
        };
        if sole_file(sub).is_some() {
            continue;
        }
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        out.push(key.clone());
        collect_folder_keys(sub, &key, out);
    }
}
