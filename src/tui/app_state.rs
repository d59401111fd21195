/// States of the session controller. `ConfigTextInput` is the modal prompt
/// nested under the configuration overlay; the terminal states live in
/// `SessionOutcome` instead of here because they end the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Mode {
    Browsing,
    HelpOverlay,
    ConfigOverlay,
    ConfigTextInput(InputPurpose),
}

/// What the modal text prompt is collecting. Rename is two-step: first an
/// index, then the new name (carrying the resolved old name along).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum InputPurpose {
    SaveName,
    LoadIndex,
    RenameIndex,
    RenameNewName { old: String },
    DeleteIndex,
}

impl InputPurpose {
    pub(super) fn prompt(&self) -> &'static str {
        match self {
            InputPurpose::SaveName => "Save as",
            InputPurpose::LoadIndex => "Load #",
            InputPurpose::RenameIndex => "Rename #",
            InputPurpose::RenameNewName { .. } => "New name",
            InputPurpose::DeleteIndex => "Delete #",
        }
    }
}

/// How the session ended. Cancellation still persists collapse state; only
/// a confirmed session reports a non-empty selection to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Confirmed,
    Cancelled,
}
