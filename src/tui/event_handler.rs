use super::app_logic::App;
use super::app_state::Mode;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;

pub(super) fn handle_events(app: &mut App) -> Result<()> {
    // The modal text prompt is the one deliberately blocking read; every
    // other state polls so resize and interrupts stay responsive. The loop
    // still redraws after each key because read returns per event.
    let ready = matches!(app.mode, Mode::ConfigTextInput(_))
        || event::poll(Duration::from_millis(50))?;
    if !ready {
        return Ok(());
    }

    match event::read()? {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
            app.handle_key(key_event);
        }
        Event::Mouse(mouse_event) => app.handle_mouse(mouse_event),
        Event::Resize(_, _) => {
            // Page geometry is recomputed on the next draw; just make sure
            // the cursor stays in range.
            app.clamp_cursor();
        }
        _ => {}
    }
    Ok(())
}
