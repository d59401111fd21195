use crate::persist::{SessionStore, StoredSelection};
use crate::selection::SelectionState;
use crate::tui::{self, SessionOutcome};
use crate::{cli, clipboard, ignore_rules, summary, tokens, tree};
use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn run_codesum(cli_args: cli::Cli) -> Result<()> {
    init_logging(cli_args.verbose);

    let root = cli_args
        .root
        .canonicalize()
        .with_context(|| format!("resolving project root {}", cli_args.root.display()))?;
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    // Ctrl+C during the TUI must restore the terminal, so the handler only
    // raises a flag that the event loop checks between frames.
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
            log::warn!("Could not install Ctrl+C handler: {e}");
        }
    }

    let rules = ignore_rules::IgnoreRules::load(&root, cli_args.include_ignored, &cli_args.types);
    let tree = tree::build(&root, &|rel, is_dir| rules.is_ignored(rel, is_dir));
    let candidates: BTreeSet<_> = tree::files_under(&tree, "").into_iter().collect();
    if candidates.is_empty() {
        println!("No selectable files found under {}.", root.display());
        return Ok(());
    }

    let store = SessionStore::open(&root)?;
    let previous = store.load_selection();
    let collapsed = store.load_collapsed().unwrap_or_default();
    let mut selection = SelectionState::seed(&previous.selected, &previous.compressed, &collapsed);
    selection.retain_known(&candidates);

    let result = tui::run_selector(
        &tree,
        &root,
        selection,
        store.config_registry(),
        interrupted,
    );

    let stored = persist_session_state(&store, &result)?;

    match result.outcome {
        SessionOutcome::Cancelled => {
            println!("Selection cancelled; nothing copied.");
            Ok(())
        }
        SessionOutcome::Confirmed => {
            if stored.selected.is_empty() {
                println!("No files selected; nothing copied.");
                return Ok(());
            }

            let document =
                summary::render_summary(&tree, &root, &stored.selected, &stored.compressed);
            store.save_summary(&document)?;
            report_selection(&root, &stored);

            if cli_args.no_clipboard {
                print!("{document}");
            } else {
                let token_estimate = tokens::approx_tokens(&document);
                clipboard::copy_text_to_clipboard(document)?;
                println!(
                    "✅ Copied {} files (≈ {} tokens) to the clipboard.",
                    stored.selected.len(),
                    token_estimate
                );
            }
            Ok(())
        }
    }
}

/// Collapse state is a view preference, worth keeping however the session
/// ended; the selection itself is only written back when the user confirmed.
fn persist_session_state(
    store: &SessionStore,
    result: &tui::SessionResult,
) -> Result<StoredSelection> {
    let collapsed: Vec<String> = result.selection.collapsed_keys().iter().cloned().collect();
    if let Err(e) = store.save_collapsed(&collapsed) {
        log::warn!("Could not save collapse state: {e}");
    }

    let stored = StoredSelection {
        selected: result.selection.selected_paths(),
        compressed: result.selection.compressed_paths(),
    };
    if result.outcome == SessionOutcome::Confirmed {
        store.save_selection(&stored)?;
    }
    Ok(stored)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn report_selection(root: &std::path::Path, stored: &StoredSelection) {
    let compressed: BTreeSet<_> = stored.compressed.iter().collect();
    println!("Selected files:");
    for path in &stored.selected {
        let rel = path.strip_prefix(root).unwrap_or(path);
        if compressed.contains(path) {
            println!("  {} (compressed)", rel.display());
        } else {
            println!("  {}", rel.display());
        }
    }
}
