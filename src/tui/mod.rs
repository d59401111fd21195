mod app_logic;
mod app_state;
mod event_handler;
mod ui_renderer;

pub use app_state::SessionOutcome;

use crate::persist::ConfigRegistry;
use crate::selection::SelectionState;
use crate::tree::TreeNode;
use anyhow::Result;
use app_logic::App;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    },
};
use ratatui::prelude::*;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What the interactive session produced. The selection is handed back even
/// on cancel so the caller can persist collapse state.
pub struct SessionResult {
    pub outcome: SessionOutcome,
    pub selection: SelectionState,
}

/// Runs the selector over a prepared tree. Terminal setup failure is not
/// fatal to the program: the session is reported as cancelled with the
/// selection untouched.
pub fn run_selector(
    tree: &TreeNode,
    root: &Path,
    selection: SelectionState,
    registry: ConfigRegistry,
    interrupted: Arc<AtomicBool>,
) -> SessionResult {
    let mut terminal = match init_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            log::warn!("Could not initialize terminal UI: {e}");
            return SessionResult {
                outcome: SessionOutcome::Cancelled,
                selection,
            };
        }
    };

    let mut app = App::new(tree, root, selection, registry);
    let outcome = loop {
        if interrupted.load(Ordering::SeqCst) {
            app.cancel();
        }
        if let Some(outcome) = app.outcome {
            break outcome;
        }
        if let Err(e) = terminal.draw(|frame| ui_renderer::ui_frame(frame, &mut app)) {
            log::warn!("Draw failed: {e}");
        }
        if let Err(e) = event_handler::handle_events(&mut app) {
            log::warn!("Event handling failed: {e}");
        }
    };

    if let Err(e) = restore_terminal(&mut terminal) {
        log::warn!("Could not restore terminal: {e}");
    }

    SessionResult {
        outcome,
        selection: app.selection,
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
