//! In-memory, change-tracked tabular data.
//!
//! A [`RecordSet`] is an ordered list of [`Row`]s sharing one list of columns,
//! plus an optional primary key. Each row carries a [`RowState`]; the only
//! way to move a row back to [`RowState::Unchanged`] is
//! [`RecordSet::accept_changes`].
//!
//! # Example
//!
//! ```
//! use recordset_adapter::{RecordSet, RowState, Value};
//!
//! let mut rs = RecordSet::new(["id", "name"]);
//! rs.set_primary_key(&["id"]).unwrap();
//! rs.load(vec![Value::Integer(1), Value::from("Alice")]).unwrap();
//!
//! rs.row_mut(0).unwrap().set("name", "Alicia").unwrap();
//! assert_eq!(rs.row(0).unwrap().state(), RowState::Modified);
//! assert_eq!(rs.row(0).unwrap().original(1), Some(&Value::from("Alice")));
//! ```

mod row;

pub use row::{Row, RowState};

use indexmap::IndexSet;

use crate::errors::Error;
use crate::value::Value;

/// Ordered, change-tracked rows sharing one list of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    columns: IndexSet<String>,
    rows: Vec<Row>,
    /// Column indices of the primary key, in key order.
    primary_key: Option<Vec<usize>>,
}

impl RecordSet {
    /// Creates an empty record set with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            primary_key: None,
        }
    }

    /// The column names, in order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// The number of columns.
    #[must_use]
    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    /// The column name at `col_idx`.
    #[must_use]
    pub fn column_name(&self, col_idx: usize) -> Option<&str> {
        self.columns.get_index(col_idx).map(String::as_str)
    }

    /// The index of the column named `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    fn require_column(&self, name: &str) -> Result<usize, Error> {
        self.column_index(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Sets the columns uniquely identifying a stored record.
    ///
    /// An empty slice clears the primary key.
    ///
    /// # Errors
    ///
    /// * `UnknownColumn` - If a name is not a column of the record set.
    pub fn set_primary_key(&mut self, columns: &[&str]) -> Result<(), Error> {
        let indices = columns
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.primary_key = (!indices.is_empty()).then_some(indices);
        Ok(())
    }

    /// The primary key column indices, if a key is set.
    #[must_use]
    pub fn primary_key(&self) -> Option<&[usize]> {
        self.primary_key.as_deref()
    }

    /// The primary key column names; empty if no key is set.
    #[must_use]
    pub fn primary_key_names(&self) -> Vec<&str> {
        self.primary_key()
            .unwrap_or_default()
            .iter()
            .filter_map(|&col_idx| self.column_name(col_idx))
            .collect()
    }

    fn push(&mut self, values: Vec<Value>, state: RowState) -> Result<usize, Error> {
        if values.len() != self.columns.len() {
            return Err(Error::ValueCountMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        self.rows.push(Row::new(values, state));
        Ok(self.rows.len() - 1)
    }

    /// Appends a new row that has no stored counterpart yet.
    ///
    /// Returns the index of the row.
    ///
    /// # Errors
    ///
    /// * `ValueCountMismatch` - If `values` does not have one value per column.
    pub fn add(&mut self, values: Vec<Value>) -> Result<usize, Error> {
        self.push(values, RowState::Added)
    }

    /// Appends a row read from the store.
    ///
    /// Returns the index of the row.
    ///
    /// # Errors
    ///
    /// * `ValueCountMismatch` - If `values` does not have one value per column.
    pub fn load(&mut self, values: Vec<Value>) -> Result<usize, Error> {
        self.push(values, RowState::Unchanged)
    }

    /// The number of rows, including rows pending deletion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the record set has no row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `row_idx`.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> Option<&Row> {
        self.rows.get(row_idx)
    }

    /// Iterates over the rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &Row> {
        self.rows.iter()
    }

    /// The current value of `column` in row `row_idx`.
    ///
    /// # Errors
    ///
    /// * `RowIndexOutOfBounds` - If there is no row at `row_idx`.
    /// * `UnknownColumn` - If `column` is not a column of the record set.
    pub fn value(&self, row_idx: usize, column: &str) -> Result<&Value, Error> {
        let col_idx = self.require_column(column)?;
        let row = self
            .row(row_idx)
            .ok_or(Error::RowIndexOutOfBounds(row_idx, self.rows.len()))?;
        Ok(&row.values()[col_idx])
    }

    /// Mutable access to the row at `row_idx`.
    ///
    /// # Errors
    ///
    /// * `RowIndexOutOfBounds` - If there is no row at `row_idx`.
    /// * `RowDeleted` - If the row is pending deletion.
    pub fn row_mut(&mut self, row_idx: usize) -> Result<RowMut<'_>, Error> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(row_idx)
            .ok_or(Error::RowIndexOutOfBounds(row_idx, len))?;
        if row.state() == RowState::Deleted {
            return Err(Error::RowDeleted(row_idx));
        }
        Ok(RowMut {
            columns: &self.columns,
            row,
        })
    }

    /// Removes the row at `row_idx`.
    ///
    /// Stored rows are marked [`RowState::Deleted`] and stay in place until
    /// changes are accepted. An [`RowState::Added`] row has no stored
    /// counterpart and is dropped immediately, shifting later rows down.
    /// Deleting a row already pending deletion is a no-op.
    ///
    /// # Errors
    ///
    /// * `RowIndexOutOfBounds` - If there is no row at `row_idx`.
    pub fn delete(&mut self, row_idx: usize) -> Result<(), Error> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(row_idx)
            .ok_or(Error::RowIndexOutOfBounds(row_idx, len))?;
        match row.state() {
            RowState::Added => {
                self.rows.remove(row_idx);
            }
            RowState::Unchanged | RowState::Modified => row.mark_deleted(),
            RowState::Deleted => {}
        }
        Ok(())
    }

    /// Returns whether any row is not [`RowState::Unchanged`].
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.rows.iter().any(|row| row.state() != RowState::Unchanged)
    }

    /// Marks every row as matching the store.
    ///
    /// Deleted rows are dropped and every remaining row becomes
    /// [`RowState::Unchanged`], forgetting its original values.
    pub fn accept_changes(&mut self) {
        self.rows.retain(|row| row.state() != RowState::Deleted);
        for row in &mut self.rows {
            row.accept();
        }
    }
}

/// Mutable handle on one non-deleted row of a [`RecordSet`].
#[derive(Debug)]
pub struct RowMut<'a> {
    columns: &'a IndexSet<String>,
    row: &'a mut Row,
}

impl RowMut<'_> {
    /// Assigns `value` to `column`.
    ///
    /// An Unchanged row becomes Modified; an Added row stays Added.
    ///
    /// # Errors
    ///
    /// * `UnknownColumn` - If `column` is not a column of the record set.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<&mut Self, Error> {
        let col_idx = self
            .columns
            .get_index_of(column)
            .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        self.row.set(col_idx, value.into());
        Ok(self)
    }

    /// Assigns `value` to the column at `col_idx`.
    ///
    /// # Errors
    ///
    /// * `ColumnIndexOutOfBounds` - If `col_idx` is not a column index.
    pub fn set_at(&mut self, col_idx: usize, value: impl Into<Value>) -> Result<&mut Self, Error> {
        if col_idx >= self.columns.len() {
            return Err(Error::ColumnIndexOutOfBounds(col_idx, self.columns.len()));
        }
        self.row.set(col_idx, value.into());
        Ok(self)
    }

    /// Read access to the row.
    #[must_use]
    pub fn row(&self) -> &Row {
        self.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> RecordSet {
        let mut rs = RecordSet::new(["id", "name"]);
        rs.set_primary_key(&["id"]).unwrap();
        rs.load(vec![Value::Integer(1), Value::from("Alice")]).unwrap();
        rs.load(vec![Value::Integer(2), Value::from("Bob")]).unwrap();
        rs
    }

    #[test]
    fn test_loaded_rows_are_unchanged() {
        let rs = users();
        assert_eq!(rs.len(), 2);
        assert!(rs.rows().all(|row| row.state() == RowState::Unchanged));
        assert!(!rs.has_changes());
    }

    #[test]
    fn test_set_moves_unchanged_to_modified_and_keeps_original() {
        let mut rs = users();
        rs.row_mut(0).unwrap().set("name", "Alicia").unwrap();
        let row = rs.row(0).unwrap();
        assert_eq!(row.state(), RowState::Modified);
        assert_eq!(row.get(1), Some(&Value::from("Alicia")));
        assert_eq!(row.original(1), Some(&Value::from("Alice")));
        assert!(rs.has_changes());
    }

    #[test]
    fn test_original_survives_repeated_changes() {
        let mut rs = users();
        rs.row_mut(0).unwrap().set("name", "A1").unwrap().set("name", "A2").unwrap();
        assert_eq!(rs.row(0).unwrap().original(1), Some(&Value::from("Alice")));
    }

    #[test]
    fn test_added_row_stays_added_when_modified() {
        let mut rs = users();
        let idx = rs.add(vec![Value::Integer(3), Value::from("Carol")]).unwrap();
        rs.row_mut(idx).unwrap().set("name", "Caroline").unwrap();
        assert_eq!(rs.row(idx).unwrap().state(), RowState::Added);
    }

    #[test]
    fn test_delete_keeps_row_in_place() {
        let mut rs = users();
        rs.row_mut(0).unwrap().set("name", "Alicia").unwrap();
        rs.delete(0).unwrap();
        assert_eq!(rs.len(), 2);
        let row = rs.row(0).unwrap();
        assert_eq!(row.state(), RowState::Deleted);
        assert_eq!(row.original(1), Some(&Value::from("Alice")));
    }

    #[test]
    fn test_delete_added_row_drops_it() {
        let mut rs = users();
        let idx = rs.add(vec![Value::Integer(3), Value::from("Carol")]).unwrap();
        rs.delete(idx).unwrap();
        assert_eq!(rs.len(), 2);
        assert!(!rs.has_changes());
    }

    #[test]
    fn test_deleted_row_cannot_be_modified() {
        let mut rs = users();
        rs.delete(1).unwrap();
        assert!(matches!(rs.row_mut(1), Err(Error::RowDeleted(1))));
    }

    #[test]
    fn test_accept_changes() {
        let mut rs = users();
        rs.row_mut(0).unwrap().set("name", "Alicia").unwrap();
        rs.delete(1).unwrap();
        rs.add(vec![Value::Integer(3), Value::from("Carol")]).unwrap();

        rs.accept_changes();

        assert_eq!(rs.len(), 2);
        assert!(!rs.has_changes());
        assert_eq!(rs.value(0, "name").unwrap(), &Value::from("Alicia"));
        assert_eq!(rs.row(0).unwrap().original(1), Some(&Value::from("Alicia")));
        assert_eq!(rs.value(1, "id").unwrap(), &Value::Integer(3));
    }

    #[test]
    fn test_value_count_mismatch() {
        let mut rs = users();
        let err = rs.add(vec![Value::Integer(3)]).unwrap_err();
        assert!(matches!(
            err,
            Error::ValueCountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_unknown_columns() {
        let mut rs = users();
        assert!(matches!(
            rs.set_primary_key(&["missing"]),
            Err(Error::UnknownColumn(_))
        ));
        assert!(matches!(
            rs.row_mut(0).unwrap().set("missing", 1i64),
            Err(Error::UnknownColumn(_))
        ));
        assert!(matches!(
            rs.row_mut(0).unwrap().set_at(9, 1i64),
            Err(Error::ColumnIndexOutOfBounds(9, 2))
        ));
    }

    #[test]
    fn test_primary_key_names() {
        let mut rs = RecordSet::new(["a", "b", "c"]);
        assert!(rs.primary_key().is_none());
        rs.set_primary_key(&["c", "a"]).unwrap();
        assert_eq!(rs.primary_key(), Some(&[2, 0][..]));
        assert_eq!(rs.primary_key_names(), vec!["c", "a"]);
        rs.set_primary_key(&[]).unwrap();
        assert!(rs.primary_key().is_none());
    }

    #[test]
    fn test_row_index_out_of_bounds() {
        let mut rs = users();
        assert!(matches!(rs.delete(5), Err(Error::RowIndexOutOfBounds(5, 2))));
        assert!(matches!(rs.value(5, "id"), Err(Error::RowIndexOutOfBounds(5, 2))));
    }
}
