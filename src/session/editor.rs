//! Inline field-edit state machine.
//!
//! Each editable field of the detail view (title, description, a comment
//! body, the assignee line) moves through an explicit `Viewing -> Editing`
//! cycle. The machine is deliberately free of any UI binding: transitions
//! take the current state plus an input and return the next state plus an
//! outcome, so the same logic backs the TUI and headless tests.

/// The fields that support inline editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Description,
    /// A comment body, addressed by position in the comment list.
    Comment(usize),
    Assignee,
}

impl EditField {
    /// Whether a committed value must be non-empty after trimming.
    ///
    /// Titles and comment bodies are required; descriptions may be empty
    /// and an empty assignee means "unassign".
    pub fn requires_non_empty(&self) -> bool {
        matches!(self, EditField::Title | EditField::Comment(_))
    }
}

/// The outcome of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The trimmed value differs from the original; the caller should
    /// apply it to the working snapshot.
    Committed { field: EditField, value: String },
    /// The value is unchanged; treated as a cancel.
    Noop,
    /// Validation failed; the editor stays in `Editing`.
    Rejected(&'static str),
}

/// One in-place edit session.
///
/// At most one field is in `Editing` at a time; starting a new session
/// auto-commits any open one (see [`FieldEditor::begin`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing {
        field: EditField,
        /// The pre-edit value, restored on cancel.
        original: String,
        buffer: String,
    },
}

/// The field editor owned by an issue session.
#[derive(Debug, Clone, Default)]
pub struct FieldEditor {
    state: EditState,
}

impl FieldEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The field currently being edited, if any.
    pub fn editing_field(&self) -> Option<EditField> {
        match &self.state {
            EditState::Editing { field, .. } => Some(*field),
            EditState::Viewing => None,
        }
    }

    /// The live edit buffer, if a session is open.
    pub fn buffer(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { buffer, .. } => Some(buffer),
            EditState::Viewing => None,
        }
    }

    /// Replace the edit buffer (driven by the text input widget).
    pub fn set_buffer(&mut self, value: impl Into<String>) {
        if let EditState::Editing { buffer, .. } = &mut self.state {
            *buffer = value.into();
        }
    }

    /// Begin editing `field`, capturing `current` as the restore point.
    ///
    /// If another field's session is open it is committed first and its
    /// outcome returned, so no edit is silently lost. A rejected
    /// auto-commit aborts the new session and keeps the old one active.
    pub fn begin(&mut self, field: EditField, current: &str) -> Option<CommitOutcome> {
        let pending = if self.is_editing() {
            let outcome = self.commit();
            if matches!(outcome, CommitOutcome::Rejected(_)) {
                return Some(outcome);
            }
            Some(outcome)
        } else {
            None
        };

        self.state = EditState::Editing {
            field,
            original: current.to_string(),
            buffer: current.to_string(),
        };
        pending
    }

    /// Commit the open session.
    ///
    /// An empty required field is rejected and the session stays open; a
    /// value equal to the original is a no-op cancel; anything else
    /// returns the trimmed value for the caller to apply.
    pub fn commit(&mut self) -> CommitOutcome {
        let EditState::Editing {
            field,
            original,
            buffer,
        } = &self.state
        else {
            return CommitOutcome::Noop;
        };

        let trimmed = buffer.trim();
        if trimmed.is_empty() && field.requires_non_empty() {
            return CommitOutcome::Rejected(match field {
                EditField::Title => "Title cannot be empty",
                EditField::Comment(_) => "Comment text cannot be empty",
                _ => "Value cannot be empty",
            });
        }

        let outcome = if trimmed == original.trim() {
            CommitOutcome::Noop
        } else {
            CommitOutcome::Committed {
                field: *field,
                value: trimmed.to_string(),
            }
        };
        self.state = EditState::Viewing;
        outcome
    }

    /// Cancel the open session, discarding the buffer.
    ///
    /// Returns the original value so the caller can restore the rendered
    /// field.
    pub fn cancel(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            EditState::Editing { original, .. } => Some(original),
            EditState::Viewing => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_captures_original() {
        let mut editor = FieldEditor::new();
        assert!(editor.begin(EditField::Title, "Old title").is_none());
        assert_eq!(editor.editing_field(), Some(EditField::Title));
        assert_eq!(editor.buffer(), Some("Old title"));
    }

    #[test]
    fn test_commit_changed_value() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Title, "Old title");
        editor.set_buffer("  New title  ");

        let outcome = editor.commit();
        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                field: EditField::Title,
                value: "New title".to_string()
            }
        );
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_commit_unchanged_is_noop() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Description, "same");
        editor.set_buffer("same");

        assert_eq!(editor.commit(), CommitOutcome::Noop);
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_commit_whitespace_only_change_is_noop() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Title, "same");
        editor.set_buffer("  same ");

        assert_eq!(editor.commit(), CommitOutcome::Noop);
    }

    #[test]
    fn test_empty_title_commit_rejected_and_stays_editing() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Title, "Old title");
        editor.set_buffer("   ");

        let outcome = editor.commit();
        assert!(matches!(outcome, CommitOutcome::Rejected(_)));
        // The session survives the rejection; focus stays on the field.
        assert!(editor.is_editing());
        assert_eq!(editor.editing_field(), Some(EditField::Title));
    }

    #[test]
    fn test_empty_comment_commit_rejected() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Comment(1), "old text");
        editor.set_buffer("");

        assert!(matches!(editor.commit(), CommitOutcome::Rejected(_)));
        assert!(editor.is_editing());
    }

    #[test]
    fn test_empty_description_commit_allowed() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Description, "text");
        editor.set_buffer("");

        assert_eq!(
            editor.commit(),
            CommitOutcome::Committed {
                field: EditField::Description,
                value: String::new()
            }
        );
    }

    #[test]
    fn test_cancel_restores_original() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Title, "Old title");
        editor.set_buffer("half-typed nonsense");

        assert_eq!(editor.cancel(), Some("Old title".to_string()));
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_cancel_without_session() {
        let mut editor = FieldEditor::new();
        assert_eq!(editor.cancel(), None);
    }

    #[test]
    fn test_begin_auto_commits_open_session() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Title, "Old title");
        editor.set_buffer("New title");

        // Starting a description edit commits the pending title edit.
        let pending = editor.begin(EditField::Description, "desc");
        assert_eq!(
            pending,
            Some(CommitOutcome::Committed {
                field: EditField::Title,
                value: "New title".to_string()
            })
        );
        assert_eq!(editor.editing_field(), Some(EditField::Description));
    }

    #[test]
    fn test_begin_blocked_by_rejected_auto_commit() {
        let mut editor = FieldEditor::new();
        editor.begin(EditField::Title, "Old title");
        editor.set_buffer("");

        // The invalid title edit refuses to yield.
        let pending = editor.begin(EditField::Description, "desc");
        assert!(matches!(pending, Some(CommitOutcome::Rejected(_))));
        assert_eq!(editor.editing_field(), Some(EditField::Title));
    }

    #[test]
    fn test_commit_without_session_is_noop() {
        let mut editor = FieldEditor::new();
        assert_eq!(editor.commit(), CommitOutcome::Noop);
    }
}
