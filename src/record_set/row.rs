//! Submodule defining a change-tracked row.

use crate::value::Value;

/// Lifecycle state of a row relative to the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    /// The row matches its stored counterpart.
    Unchanged,
    /// The row has no stored counterpart yet.
    Added,
    /// At least one value changed since the row was loaded.
    Modified,
    /// The row is pending removal from the store.
    Deleted,
}

/// A row of a [`RecordSet`](super::RecordSet).
///
/// Values are positional, matching the record set columns. The values a
/// loaded row had when it was read are kept until changes are accepted, so
/// that Modified and Deleted rows can still be located in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
    /// Load-time values, captured on the first mutation or deletion.
    original: Option<Vec<Value>>,
    state: RowState,
}

impl Row {
    pub(super) fn new(values: Vec<Value>, state: RowState) -> Self {
        Self {
            values,
            original: None,
            state,
        }
    }

    /// The lifecycle state.
    #[must_use]
    pub fn state(&self) -> RowState {
        self.state
    }

    /// The current value at `col_idx`.
    #[must_use]
    pub fn get(&self, col_idx: usize) -> Option<&Value> {
        self.values.get(col_idx)
    }

    /// The current values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value at `col_idx` as it was when the row was loaded.
    ///
    /// Rows without pending changes return their current value.
    #[must_use]
    pub fn original(&self, col_idx: usize) -> Option<&Value> {
        self.original_values().get(col_idx)
    }

    /// The values as they were when the row was loaded.
    #[must_use]
    pub fn original_values(&self) -> &[Value] {
        self.original.as_deref().unwrap_or(&self.values)
    }

    /// Assigns a value, moving Unchanged rows to Modified.
    pub(super) fn set(&mut self, col_idx: usize, value: Value) {
        if self.state == RowState::Unchanged {
            self.capture_original();
            self.state = RowState::Modified;
        }
        self.values[col_idx] = value;
    }

    /// Marks a stored row for deletion.
    pub(super) fn mark_deleted(&mut self) {
        debug_assert_ne!(self.state, RowState::Added);
        self.capture_original();
        self.state = RowState::Deleted;
    }

    /// Resets the row to match the store.
    pub(super) fn accept(&mut self) {
        self.original = None;
        self.state = RowState::Unchanged;
    }

    fn capture_original(&mut self) {
        if self.original.is_none() {
            self.original = Some(self.values.clone());
        }
    }
}
