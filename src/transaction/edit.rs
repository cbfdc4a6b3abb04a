//! The inline row editor for changing a transaction's category and deleting
//! transactions.
//!
//! Only one row can be edited, saved or pending deletion at a time. Starting
//! an action on another row abandons whatever the previous row was doing
//! without saving it.

use crate::Error;

use super::TransactionId;

/// What the active row, if any, is doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RowMode {
    /// No row is being edited.
    #[default]
    Viewing,
    /// A row shows a category input.
    Editing {
        /// The row being edited.
        id: TransactionId,
        /// The text currently in the category input.
        buffer: String,
        /// The category before editing started.
        original: String,
        /// A message from the last failed confirm or save.
        error: Option<String>,
    },
    /// A save request for a row is in flight.
    Saving {
        /// The row being saved.
        id: TransactionId,
        /// The category sent to the backend.
        category: String,
        /// The category before editing started.
        original: String,
    },
    /// A row is waiting for the user to confirm deletion.
    PendingDelete {
        /// The row to delete.
        id: TransactionId,
    },
}

/// A validated request to change a transaction's category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// The transaction to update.
    pub id: TransactionId,
    /// The new category, trimmed and non-empty.
    pub category: String,
}

/// Tracks the single active row of the transactions table.
#[derive(Debug, Clone, Default)]
pub struct RowEditor {
    mode: RowMode,
}

impl RowEditor {
    /// The current mode.
    pub fn mode(&self) -> &RowMode {
        &self.mode
    }

    /// Whether `id` is the row currently being edited or saved.
    pub fn is_editing(&self, id: &TransactionId) -> bool {
        match &self.mode {
            RowMode::Editing { id: active, .. } | RowMode::Saving { id: active, .. } => {
                active == id
            }
            _ => false,
        }
    }

    /// Whether `id` is waiting for delete confirmation.
    pub fn is_pending_delete(&self, id: &TransactionId) -> bool {
        matches!(&self.mode, RowMode::PendingDelete { id: pending } if pending == id)
    }

    /// Start editing `id`, seeding the input with `current_category`.
    ///
    /// Any other in-progress edit or delete prompt is discarded.
    pub fn begin_edit(&mut self, id: TransactionId, current_category: &str) {
        self.mode = RowMode::Editing {
            id,
            buffer: current_category.to_owned(),
            original: current_category.to_owned(),
            error: None,
        };
    }

    /// Replace the edit buffer for `id`.
    ///
    /// # Errors
    /// Returns [Error::NotEditing] if `id` is not the row being edited.
    pub fn update_buffer(&mut self, id: &TransactionId, text: &str) -> Result<(), Error> {
        match &mut self.mode {
            RowMode::Editing {
                id: active, buffer, ..
            } if active == id => {
                *buffer = text.to_owned();
                Ok(())
            }
            _ => Err(Error::NotEditing),
        }
    }

    /// Validate the edit buffer and move to saving.
    ///
    /// # Errors
    /// Returns [Error::EmptyCategory] if the trimmed buffer is empty, the row
    /// stays in editing with the error attached. Returns [Error::NotEditing]
    /// if no row is being edited.
    pub fn confirm(&mut self) -> Result<SaveRequest, Error> {
        let RowMode::Editing {
            id,
            buffer,
            original,
            error,
        } = &mut self.mode
        else {
            return Err(Error::NotEditing);
        };

        let category = buffer.trim();

        if category.is_empty() {
            *error = Some(Error::EmptyCategory.to_string());
            return Err(Error::EmptyCategory);
        }

        let request = SaveRequest {
            id: id.clone(),
            category: category.to_owned(),
        };
        let original = std::mem::take(original);

        self.mode = RowMode::Saving {
            id: request.id.clone(),
            category: request.category.clone(),
            original,
        };

        Ok(request)
    }

    /// Return to viewing after the backend accepted the save for `id`.
    pub fn save_succeeded(&mut self, id: &TransactionId) {
        if matches!(&self.mode, RowMode::Saving { id: saving, .. } if saving == id) {
            self.mode = RowMode::Viewing;
        }
    }

    /// Return `id` to editing with `message` after the backend refused the save.
    ///
    /// The submitted text stays in the input so the user can retry.
    pub fn save_failed(&mut self, id: &TransactionId, message: &str) {
        let RowMode::Saving {
            id: saving,
            category,
            original,
        } = &mut self.mode
        else {
            return;
        };

        if saving != id {
            return;
        }

        let id = saving.clone();
        let buffer = std::mem::take(category);
        let original = std::mem::take(original);

        self.mode = RowMode::Editing {
            id,
            buffer,
            original,
            error: Some(message.to_owned()),
        };
    }

    /// Abandon the current edit.
    ///
    /// Returns the pre-edit category if a row was being edited.
    pub fn cancel(&mut self) -> Option<String> {
        match std::mem::take(&mut self.mode) {
            RowMode::Editing { original, .. } => Some(original),
            other => {
                self.mode = other;
                None
            }
        }
    }

    /// Ask for confirmation before deleting `id`.
    ///
    /// Any in-progress edit is discarded.
    pub fn request_delete(&mut self, id: TransactionId) {
        self.mode = RowMode::PendingDelete { id };
    }

    /// Confirm deletion of `id`.
    ///
    /// # Errors
    /// Returns [Error::DeleteNotConfirmed] if `id` was not pending deletion.
    pub fn confirm_delete(&mut self, id: &TransactionId) -> Result<TransactionId, Error> {
        if !self.is_pending_delete(id) {
            return Err(Error::DeleteNotConfirmed);
        }

        self.mode = RowMode::Viewing;
        Ok(id.clone())
    }

    /// Dismiss the delete prompt.
    pub fn cancel_delete(&mut self) {
        if matches!(self.mode, RowMode::PendingDelete { .. }) {
            self.mode = RowMode::Viewing;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, transaction::TransactionId};

    use super::{RowEditor, RowMode, SaveRequest};

    fn id(raw: &str) -> TransactionId {
        TransactionId::new(raw)
    }

    #[test]
    fn begin_edit_seeds_buffer_with_current_category() {
        let mut editor = RowEditor::default();

        editor.begin_edit(id("1"), "Groceries");

        assert_eq!(
            editor.mode(),
            &RowMode::Editing {
                id: id("1"),
                buffer: "Groceries".to_owned(),
                original: "Groceries".to_owned(),
                error: None,
            }
        );
        assert!(editor.is_editing(&id("1")));
        assert!(!editor.is_editing(&id("2")));
    }

    #[test]
    fn confirm_trims_and_moves_to_saving() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");
        editor.update_buffer(&id("1"), "  Dining Out ").unwrap();

        let request = editor.confirm().unwrap();

        assert_eq!(
            request,
            SaveRequest {
                id: id("1"),
                category: "Dining Out".to_owned()
            }
        );
        assert!(matches!(editor.mode(), RowMode::Saving { .. }));
        assert!(editor.is_editing(&id("1")));
    }

    #[test]
    fn confirm_rejects_empty_category() {
        for text in ["", "   ", "\t\n"] {
            let mut editor = RowEditor::default();
            editor.begin_edit(id("1"), "Groceries");
            editor.update_buffer(&id("1"), text).unwrap();

            assert_eq!(editor.confirm(), Err(Error::EmptyCategory));

            let RowMode::Editing { error, buffer, .. } = editor.mode() else {
                panic!("want editing mode after rejected confirm, got {:?}", editor.mode());
            };
            assert_eq!(error.as_deref(), Some("Category cannot be empty"));
            assert_eq!(buffer, text);
        }
    }

    #[test]
    fn cancel_restores_original_category() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");
        editor.update_buffer(&id("1"), "Something else").unwrap();

        let original = editor.cancel();

        assert_eq!(original.as_deref(), Some("Groceries"));
        assert_eq!(editor.mode(), &RowMode::Viewing);
    }

    #[test]
    fn cancel_without_edit_is_a_no_op() {
        let mut editor = RowEditor::default();
        editor.request_delete(id("3"));

        assert_eq!(editor.cancel(), None);
        assert!(editor.is_pending_delete(&id("3")));
    }

    #[test]
    fn starting_another_edit_abandons_the_first() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");
        editor.update_buffer(&id("1"), "Unsaved").unwrap();

        editor.begin_edit(id("2"), "Rent");

        assert!(!editor.is_editing(&id("1")));
        assert!(editor.is_editing(&id("2")));
        assert_eq!(
            editor.update_buffer(&id("1"), "Late typing"),
            Err(Error::NotEditing)
        );
    }

    #[test]
    fn save_success_returns_to_viewing() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");
        let request = editor.confirm().unwrap();

        editor.save_succeeded(&request.id);

        assert_eq!(editor.mode(), &RowMode::Viewing);
    }

    #[test]
    fn save_failure_returns_to_editing_with_error() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");
        editor.update_buffer(&id("1"), "Food").unwrap();
        let request = editor.confirm().unwrap();

        editor.save_failed(&request.id, "Database is locked");

        assert_eq!(
            editor.mode(),
            &RowMode::Editing {
                id: id("1"),
                buffer: "Food".to_owned(),
                original: "Groceries".to_owned(),
                error: Some("Database is locked".to_owned()),
            }
        );
    }

    #[test]
    fn outcome_for_a_different_row_is_ignored() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");
        editor.confirm().unwrap();

        editor.save_succeeded(&id("2"));
        editor.save_failed(&id("2"), "nope");

        assert!(matches!(editor.mode(), RowMode::Saving { .. }));
    }

    #[test]
    fn confirm_without_edit_fails() {
        let mut editor = RowEditor::default();

        assert_eq!(editor.confirm(), Err(Error::NotEditing));
    }

    #[test]
    fn delete_needs_two_steps() {
        let mut editor = RowEditor::default();

        assert_eq!(
            editor.confirm_delete(&id("1")),
            Err(Error::DeleteNotConfirmed)
        );

        editor.request_delete(id("1"));
        assert_eq!(
            editor.confirm_delete(&id("2")),
            Err(Error::DeleteNotConfirmed)
        );
        assert_eq!(editor.confirm_delete(&id("1")), Ok(id("1")));
        assert_eq!(editor.mode(), &RowMode::Viewing);
    }

    #[test]
    fn request_delete_abandons_edit() {
        let mut editor = RowEditor::default();
        editor.begin_edit(id("1"), "Groceries");

        editor.request_delete(id("2"));

        assert!(!editor.is_editing(&id("1")));
        assert!(editor.is_pending_delete(&id("2")));
    }

    #[test]
    fn cancel_delete_returns_to_viewing() {
        let mut editor = RowEditor::default();
        editor.request_delete(id("1"));

        editor.cancel_delete();

        assert_eq!(editor.mode(), &RowMode::Viewing);
        assert_eq!(
            editor.confirm_delete(&id("1")),
            Err(Error::DeleteNotConfirmed)
        );
    }
}
