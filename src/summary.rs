use crate::tree::TreeNode;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Render the final context document: a project-structure block followed by
/// one section per selected file. Files marked compressed get a stub section
/// instead of their content; the downstream AI step replaces those stubs.
/// Pure with respect to the selection — unreadable files become error notes,
/// never failures.
pub fn render_summary(
    tree: &TreeNode,
    root: &Path,
    selected: &[PathBuf],
    compressed: &[PathBuf],
) -> String {
    let compressed_set: BTreeSet<&PathBuf> = compressed.iter().collect();
    let mut out = String::new();

    out.push_str("Project Structure:\n```\n");
    out.push_str(&render_tree(tree));
    out.push_str("```\n\n---\n");

    for path in selected {
        let relative = path.strip_prefix(root).unwrap_or(path);
        out.push_str(&format!("\n## File: {}\n\n", relative.display()));

        if compressed_set.contains(path) {
            out.push_str("*(marked for compressed inclusion: content omitted)*\n\n---\n");
            continue;
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                let lang = relative
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default();
                out.push_str(&format!("```{lang}\n"));
                out.push_str(content.trim_end());
                out.push_str("\n```\n---\n");
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                out.push_str(&format!("Error reading file: {e}\n\n---\n"));
            }
        }
    }

    out
}

/// Indented listing of the whole candidate tree, original `|--` style.
fn render_tree(tree: &TreeNode) -> String {
    let mut out = String::from(".\n");
    if let TreeNode::Folder(children) = tree {
        render_level(children, 0, &mut out);
    }
    out
}

fn render_level(
    children: &std::collections::BTreeMap<String, TreeNode>,
    level: usize,
    out: &mut String,
) {
    let indent = "    ".repeat(level);
    for (name, node) in children {
        out.push_str(&format!("{indent}|-- {name}\n"));
        if let TreeNode::Folder(sub) = node {
            render_level(sub, level + 1, out);
        }
    }
}
