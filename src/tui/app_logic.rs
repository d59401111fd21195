use super::app_state::{InputPurpose, Mode, SessionOutcome};
use crate::persist::{ConfigRegistry, StoredSelection};
use crate::selection::SelectionState;
use crate::tokens::TokenCache;
use crate::tree::{self, TreeNode, VisibleRow};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use std::path::{Path, PathBuf};

/// Session controller state: the tree, the projected rows, the selection
/// sets, and the paginated cursor. All mutation happens through the
/// per-mode key handlers; the renderer only reads (and feeds back the
/// current page geometry).
pub(super) struct App<'a> {
    pub(super) tree: &'a TreeNode,
    pub(super) root: PathBuf,
    pub(super) candidate_files: Vec<PathBuf>,
    pub(super) selection: SelectionState,
    pub(super) registry: ConfigRegistry,
    pub(super) rows: Vec<VisibleRow>,
    pub(super) mode: Mode,
    pub(super) page: usize,
    pub(super) cursor: usize,
    /// Rows per page; written by the renderer every frame so resize is
    /// picked up on the next draw.
    pub(super) page_size: usize,
    /// Screen row where the first list row is drawn, for mouse hit testing.
    pub(super) list_top: u16,
    pub(super) input_buffer: String,
    pub(super) status: Option<String>,
    pub(super) tokens: TokenCache,
    pub(super) outcome: Option<SessionOutcome>,
}

impl<'a> App<'a> {
    pub(super) fn new(
        tree: &'a TreeNode,
        root: &Path,
        selection: SelectionState,
        registry: ConfigRegistry,
    ) -> Self {
        let candidate_files = tree::files_under(tree, "");
        let rows = tree::flatten(tree, selection.collapsed_keys());
        App {
            tree,
            root: root.to_path_buf(),
            candidate_files,
            selection,
            registry,
            rows,
            mode: Mode::Browsing,
            page: 0,
            cursor: 0,
            page_size: 0,
            list_top: 0,
            input_buffer: String::new(),
            status: None,
            tokens: TokenCache::new(),
            outcome: None,
        }
    }

    // --- view geometry -----------------------------------------------------

    fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }

    pub(super) fn total_pages(&self) -> usize {
        self.rows.len().div_ceil(self.effective_page_size()).max(1)
    }

    pub(super) fn abs_index(&self) -> usize {
        self.page * self.effective_page_size() + self.cursor
    }

    fn set_abs_index(&mut self, idx: usize) {
        let size = self.effective_page_size();
        self.page = idx / size;
        self.cursor = idx % size;
    }

    /// Called by the renderer after page_size changes and by every handler
    /// that mutates the row list.
    pub(super) fn clamp_cursor(&mut self) {
        if self.rows.is_empty() {
            self.page = 0;
            self.cursor = 0;
            return;
        }
        let idx = self.abs_index().min(self.rows.len() - 1);
        self.set_abs_index(idx);
    }

    pub(super) fn current_row(&self) -> Option<&VisibleRow> {
        self.rows.get(self.abs_index())
    }

    fn refresh_rows(&mut self) {
        self.rows = tree::flatten(self.tree, self.selection.collapsed_keys());
        self.clamp_cursor();
    }

    // --- cursor movement ---------------------------------------------------

    fn move_cursor(&mut self, delta: i64) {
        if self.rows.is_empty() {
            return;
        }
        let idx = (self.abs_index() as i64 + delta).clamp(0, self.rows.len() as i64 - 1);
        self.set_abs_index(idx as usize);
    }

    fn page_move(&mut self, delta: i64) {
        let pages = self.total_pages() as i64;
        let new_page = (self.page as i64 + delta).clamp(0, pages - 1);
        self.page = new_page as usize;
        self.cursor = 0;
        self.clamp_cursor();
    }

    /// Jump to the previous/next folder row in the flattened list.
    fn jump_to_folder(&mut self, forward: bool) {
        if self.rows.is_empty() {
            return;
        }
        let start = self.abs_index();
        let found = if forward {
            self.rows
                .iter()
                .enumerate()
                .skip(start + 1)
                .find(|(_, r)| r.is_folder)
                .map(|(i, _)| i)
        } else {
            self.rows[..start]
                .iter()
                .enumerate()
                .rev()
                .find(|(_, r)| r.is_folder)
                .map(|(i, _)| i)
        };
        if let Some(idx) = found {
            self.set_abs_index(idx);
        }
    }

    // --- selection actions -------------------------------------------------

    /// Space: toggle a file (and advance), or fold/unfold a folder.
    fn activate_current(&mut self, advance_on_file: bool) {
        let Some(row) = self.current_row().cloned() else {
            return;
        };
        if row.is_folder {
            self.selection.toggle_folder_collapse(&row.key);
            self.refresh_rows();
            // Keep the cursor on the toggled folder row.
            if let Some(idx) = self.rows.iter().position(|r| r.key == row.key) {
                self.set_abs_index(idx);
            }
        } else if let Some(path) = &row.file_path {
            self.selection.toggle_file(path);
            if advance_on_file {
                self.move_cursor(1);
            }
        }
    }

    fn toggle_compressed_current(&mut self) {
        let Some(row) = self.current_row().cloned() else {
            return;
        };
        match &row.file_path {
            Some(path) => {
                self.selection.toggle_compressed(path);
                self.move_cursor(1);
            }
            None => self.status = Some("Folders cannot be compressed".to_string()),
        }
    }

    /// Folder the row belongs to: the row itself when it is a folder,
    /// otherwise its parent derived from the display label (elided rows
    /// resolve to the elided folder, which still exists in the tree).
    fn target_folder_key(&self) -> Option<String> {
        let row = self.current_row()?;
        if row.is_folder {
            return Some(row.key.clone());
        }
        match row.label.rfind('/') {
            Some(idx) => Some(row.label[..idx].to_string()),
            None => Some(String::new()), // root-level file: target is the root
        }
    }

    fn bulk_toggle_folder(&mut self) {
        if let Some(key) = self.target_folder_key() {
            let files = tree::files_under(self.tree, &key);
            self.selection.bulk_toggle(&files);
        }
    }

    fn bulk_toggle_global(&mut self) {
        let files = self.candidate_files.clone();
        self.selection.bulk_toggle(&files);
    }

    fn expand_descendants(&mut self) {
        if let Some(key) = self.target_folder_key() {
            let mut keys = tree::folder_keys_under(self.tree, &key);
            if !key.is_empty() {
                keys.push(key);
            }
            self.selection.expand_folders(&keys);
            self.refresh_rows();
        }
    }

    /// Collapses descendants only; the target folder itself stays open so
    /// the user doesn't lose their place.
    fn collapse_descendants(&mut self) {
        if let Some(key) = self.target_folder_key() {
            let keys = tree::folder_keys_under(self.tree, &key);
            self.selection.collapse_folders(&keys);
            self.refresh_rows();
        }
    }

    /// Total token estimate over selected-but-not-compressed files. The
    /// size of compressed output is unknown until compression runs, so
    /// those are left out.
    pub(super) fn total_tokens(&mut self) -> usize {
        let mut total = 0;
        for path in self.selection.selected_paths() {
            if self.selection.is_compressed(&path) {
                continue;
            }
            total += self.tokens.file_tokens(&path).unwrap_or(0);
        }
        total
    }

    // --- event dispatch ----------------------------------------------------

    pub(super) fn cancel(&mut self) {
        self.outcome = Some(SessionOutcome::Cancelled);
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        // Inline messages live for exactly one key press.
        self.status = None;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.cancel();
            return;
        }

        match self.mode.clone() {
            Mode::Browsing => self.handle_browsing_key(key),
            Mode::HelpOverlay => self.mode = Mode::Browsing,
            Mode::ConfigOverlay => self.handle_config_key(key),
            Mode::ConfigTextInput(purpose) => self.handle_input_key(key, purpose),
        }
    }

    fn handle_browsing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Left => self.jump_to_folder(false),
            KeyCode::Right => self.jump_to_folder(true),
            KeyCode::PageUp => self.page_move(-1),
            KeyCode::PageDown => self.page_move(1),
            KeyCode::Char(' ') => self.activate_current(true),
            KeyCode::Char('s') | KeyCode::Char('S') => self.toggle_compressed_current(),
            KeyCode::Char('f') | KeyCode::Char('F') => self.bulk_toggle_folder(),
            KeyCode::Char('a') | KeyCode::Char('A') => self.bulk_toggle_global(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.expand_descendants(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.collapse_descendants(),
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                self.mode = Mode::HelpOverlay;
            }
            KeyCode::Char('m') | KeyCode::Char('M') => self.mode = Mode::ConfigOverlay,
            KeyCode::Enter => self.outcome = Some(SessionOutcome::Confirmed),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.cancel(),
            _ => {}
        }
    }

    fn handle_config_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') => self.start_input(InputPurpose::SaveName),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                if self.registry.is_empty() {
                    self.status = Some("No saved configurations".to_string());
                } else {
                    self.start_input(InputPurpose::LoadIndex);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.registry.is_empty() {
                    self.status = Some("No saved configurations".to_string());
                } else {
                    self.start_input(InputPurpose::RenameIndex);
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if self.registry.is_empty() {
                    self.status = Some("No saved configurations".to_string());
                } else {
                    self.start_input(InputPurpose::DeleteIndex);
                }
            }
            KeyCode::Char('m') | KeyCode::Char('M') | KeyCode::Esc => {
                self.mode = Mode::Browsing;
            }
            _ => {}
        }
    }

    fn start_input(&mut self, purpose: InputPurpose) {
        self.input_buffer.clear();
        self.mode = Mode::ConfigTextInput(purpose);
    }

    fn handle_input_key(&mut self, key: KeyEvent, purpose: InputPurpose) {
        match key.code {
            KeyCode::Esc => {
                self.input_buffer.clear();
                self.mode = Mode::ConfigOverlay;
            }
            KeyCode::Enter => {
                let entry = std::mem::take(&mut self.input_buffer);
                self.commit_input(purpose, entry.trim());
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) => self.input_buffer.push(c),
            _ => {}
        }
    }

    fn commit_input(&mut self, purpose: InputPurpose, entry: &str) {
        self.mode = Mode::ConfigOverlay;
        match purpose {
            InputPurpose::SaveName => {
                if entry.is_empty() {
                    self.status = Some("Name cannot be empty".to_string());
                    return;
                }
                let snapshot = StoredSelection {
                    selected: self.selection.selected_paths(),
                    compressed: self.selection.compressed_paths(),
                };
                match self.registry.save(entry, snapshot) {
                    Ok(()) => self.status = Some(format!("Saved '{entry}'")),
                    Err(e) => self.status = Some(format!("Save failed: {e}")),
                }
            }
            InputPurpose::LoadIndex => {
                let Some(name) = self.resolve_index(entry) else {
                    return;
                };
                let Some(stored) = self.registry.get(&name).cloned() else {
                    self.status = Some(format!("'{name}' not found"));
                    return;
                };
                self.selection
                    .replace_selection(&stored.selected, &stored.compressed);
                let known = self.candidate_files.iter().cloned().collect();
                self.selection.retain_known(&known);
                self.status = Some(format!("Loaded '{name}'"));
                self.mode = Mode::Browsing;
            }
            InputPurpose::RenameIndex => {
                if let Some(name) = self.resolve_index(entry) {
                    self.start_input(InputPurpose::RenameNewName { old: name });
                }
            }
            InputPurpose::RenameNewName { old } => {
                if entry.is_empty() {
                    self.status = Some("Name cannot be empty".to_string());
                    return;
                }
                match self.registry.rename(&old, entry) {
                    Ok(true) => self.status = Some(format!("Renamed '{old}' to '{entry}'")),
                    Ok(false) => self.status = Some(format!("'{old}' not found")),
                    Err(e) => self.status = Some(format!("Rename failed: {e}")),
                }
            }
            InputPurpose::DeleteIndex => {
                if let Some(name) = self.resolve_index(entry) {
                    match self.registry.delete(&name) {
                        Ok(()) => self.status = Some(format!("Deleted '{name}'")),
                        Err(e) => self.status = Some(format!("Delete failed: {e}")),
                    }
                }
            }
        }
    }

    /// 1-based index into the sorted config name list; errors become inline
    /// messages and leave the overlay open.
    fn resolve_index(&mut self, entry: &str) -> Option<String> {
        let names = self.registry.names();
        match entry.parse::<usize>() {
            Ok(n) if n >= 1 && n <= names.len() => Some(names[n - 1].to_string()),
            _ => {
                self.status = Some(format!(
                    "Enter a number between 1 and {}",
                    names.len().max(1)
                ));
                None
            }
        }
    }

    pub(super) fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode != Mode::Browsing {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(offset) = mouse.row.checked_sub(self.list_top) else {
                    return;
                };
                let offset = offset as usize;
                if offset >= self.effective_page_size() {
                    return;
                }
                let idx = self.page * self.effective_page_size() + offset;
                if idx < self.rows.len() {
                    self.set_abs_index(idx);
                    // Click toggles in place; the space-style cursor advance
                    // would move the row out from under the pointer.
                    self.activate_current(false);
                }
            }
            MouseEventKind::ScrollUp => self.move_cursor(-1),
            MouseEventKind::ScrollDown => self.move_cursor(1),
            _ => {}
        }
    }
}
