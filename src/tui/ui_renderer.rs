use super::app_logic::App;
use super::app_state::Mode;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use std::path::Path;

const WIDE_TERMINAL: u16 = 80;
const TOKEN_COLUMN_MIN_WIDTH: u16 = 60;

fn draw_header(f: &mut Frame, app: &mut App, area: Rect) {
    let wide = area.width >= WIDE_TERMINAL;
    let tokens = app.total_tokens();
    let title = if wide {
        format!(
            "codesum │ {} selected ({} compressed) │ ≈ {} tokens",
            app.selection.selected_count(),
            app.selection.compressed_count(),
            tokens
        )
    } else {
        "codesum".to_string()
    };

    let mut lines = vec![Line::from(
        "Space: select/fold │ S: compress │ F: folder │ A: all │ Enter: confirm │ H: help",
    )];
    if !wide {
        // Narrow terminals get the token count on its own line instead of
        // squeezing it into the title.
        lines.push(Line::from(format!(
            "{} selected ({} compressed) │ ≈ {} tokens",
            app.selection.selected_count(),
            app.selection.compressed_count(),
            tokens
        )));
    }

    let header =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(header, area);
}

fn draw_file_list(f: &mut Frame, app: &mut App, area: Rect) {
    app.page_size = area.height.saturating_sub(2) as usize;
    app.list_top = area.y + 1;
    app.clamp_cursor();

    let page_size = app.page_size.max(1);
    let start = app.page * page_size;
    let end = (start + page_size).min(app.rows.len());
    let show_tokens = area.width >= TOKEN_COLUMN_MIN_WIDTH;
    let label_width = area.width.saturating_sub(10) as usize;

    let mut list_items: Vec<ListItem> = Vec::with_capacity(end.saturating_sub(start));
    for idx in start..end {
        let row = app.rows[idx].clone();
        let item = if row.is_folder {
            let marker = if app.selection.is_collapsed(&row.key) {
                "[+] "
            } else {
                "[-] "
            };
            let line = format!("{marker}{}", ellipsize(&row.label, label_width));
            ListItem::new(line).style(Style::default().fg(Color::Cyan))
        } else {
            let path = row.file_path.as_deref().unwrap_or(Path::new(&row.key));
            let (marker, style) = if app.selection.is_compressed(path) {
                ("[c] ", Style::default().fg(Color::Yellow))
            } else if app.selection.is_selected(path) {
                ("[x] ", Style::default().fg(Color::Green))
            } else {
                ("[ ] ", Style::default())
            };
            let mut line = format!("{marker}{}", ellipsize(&row.label, label_width));
            if show_tokens {
                match app.tokens.file_tokens(path) {
                    Some(n) => line.push_str(&format!("  (≈{n} tok)")),
                    None => line.push_str("  (? tok)"),
                }
            }
            ListItem::new(line).style(style)
        };
        list_items.push(item);
    }

    let title = app
        .root
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| format!("Select files ({n})"))
        .unwrap_or_else(|| "Select files".to_string());
    let list_widget = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state = ratatui::widgets::ListState::default();
    if app.cursor < end.saturating_sub(start) {
        list_state.select(Some(app.cursor));
    }
    f.render_stateful_widget(list_widget, area, &mut list_state);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Some(message) => Line::from(message.clone()).style(Style::default().fg(Color::Yellow)),
        None => Line::from(format!(
            "Page {}/{} │ {} files │ ↑↓ move  ←→ folders  PgUp/PgDn page  M: configs  Q: quit",
            app.page + 1,
            app.total_pages(),
            app.rows.len()
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_help_overlay(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("Navigation"),
        Line::from("  ↑/↓            move cursor (crosses pages)"),
        Line::from("  ←/→            jump to previous/next folder row"),
        Line::from("  PgUp/PgDn      move by one page"),
        Line::from(""),
        Line::from("Selection"),
        Line::from("  Space          toggle file, or fold/unfold folder"),
        Line::from("  S              toggle compressed inclusion (implies select)"),
        Line::from("  F              select/deselect every file in the folder"),
        Line::from("  A              select/deselect every file in the project"),
        Line::from("  E / C          expand / collapse all under the folder"),
        Line::from(""),
        Line::from("Session"),
        Line::from("  M              saved configurations"),
        Line::from("  Enter          confirm selection"),
        Line::from("  Q / Esc        cancel"),
        Line::from(""),
        Line::from("Press any key to return."),
    ];
    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

fn draw_config_overlay(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    if app.registry.is_empty() {
        lines.push(Line::from("No saved configurations yet."));
    } else {
        for (i, name) in app.registry.names().iter().enumerate() {
            let entry = app
                .registry
                .get(name)
                .map(|s| (s.selected.len(), s.compressed.len()))
                .unwrap_or_default();
            lines.push(Line::from(format!(
                "{:>3}. {}  ({} files, {} compressed)",
                i + 1,
                name,
                entry.0,
                entry.1
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        "S: save current │ L: load │ R: rename │ D: delete │ Esc: back",
    ));

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Saved configurations"),
    );
    f.render_widget(Clear, area);
    f.render_widget(block, area);
}

fn draw_input_prompt(f: &mut Frame, app: &App, prompt: &str, area: Rect) {
    let input = Paragraph::new(format!("{}: {}", prompt, app.input_buffer)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Enter to confirm, Esc to cancel"),
    );
    f.render_widget(Clear, area);
    f.render_widget(input, area);
    let cursor_x = area.x + 1 + prompt.len() as u16 + 2 + app.input_buffer.len() as u16;
    f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut App) {
    let header_height = if frame.area().width >= WIDE_TERMINAL { 3 } else { 4 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_file_list(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);

    match app.mode.clone() {
        Mode::Browsing => {}
        Mode::HelpOverlay => draw_help_overlay(frame, chunks[1]),
        Mode::ConfigOverlay => draw_config_overlay(frame, app, chunks[1]),
        Mode::ConfigTextInput(purpose) => {
            draw_config_overlay(frame, app, chunks[1]);
            let prompt_area = Rect {
                x: chunks[1].x,
                y: chunks[1].bottom().saturating_sub(3),
                width: chunks[1].width,
                height: 3.min(chunks[1].height),
            };
            draw_input_prompt(frame, app, purpose.prompt(), prompt_area);
        }
    }
}

/// Keep the tail of over-long labels; the filename end is the useful part.
fn ellipsize(label: &str, max_width: usize) -> String {
    let count = label.chars().count();
    if max_width == 0 || count <= max_width {
        return label.to_string();
    }
    let tail: String = label
        .chars()
        .skip(count.saturating_sub(max_width.saturating_sub(1)))
        .collect();
    format!("…{tail}")
}

#[cfg(test)]
mod tests {
    use super::ellipsize;

    #[test]
    fn ellipsize_keeps_short_labels() {
        assert_eq!(ellipsize("src/a.py", 20), "src/a.py");
    }

    #[test]
    fn ellipsize_keeps_tail_of_long_labels() {
        let out = ellipsize("very/long/path/to/file.rs", 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.starts_with('…'));
        assert!(out.ends_with("file.rs"));
    }
}
