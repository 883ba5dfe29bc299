//! Statement construction.
//!
//! A [`CommandBuilder`] renders a [`Query`] and/or a [`Changeset`] into a
//! parameter-bound [`Command`]. Back-ends differ only in their SQL flavour,
//! captured by a [`Dialect`]; [`SqlCommandBuilder`] is the renderer shared by
//! every dialect.

mod dialect;
mod sql_builder;

pub use dialect::{Dialect, Postgres, Sqlite};
pub use sql_builder::SqlCommandBuilder;

use crate::changeset::Changeset;
use crate::errors::Error;
use crate::query::Query;
use crate::value::{Bindings, Value};

/// An executable statement with its positional parameter bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    sql: String,
    params: Vec<Value>,
}

impl Command {
    /// Creates a command from its text and bindings.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// The statement text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The parameter values, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Displays the parameters as `[1=.., 2=..]`, for diagnostics.
    #[must_use]
    pub fn bindings(&self) -> Bindings<'_> {
        Bindings(&self.params)
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Capability producing executable statements.
///
/// Implementations must bind every literal as a parameter.
pub trait CommandBuilder {
    /// SELECT of the rows matching `query`.
    ///
    /// # Errors
    ///
    /// Implementation specific rendering failures.
    fn select_command(&self, query: &Query) -> Result<Command, Error>;

    /// INSERT of one row into `table`.
    ///
    /// # Errors
    ///
    /// * `EmptyChangeset` - If `changeset` has no column.
    fn insert_command(&self, table: &str, changeset: &Changeset) -> Result<Command, Error>;

    /// UPDATE of the rows matching `query`.
    ///
    /// # Errors
    ///
    /// * `EmptyChangeset` - If `changeset` has no column.
    fn update_command(&self, query: &Query, changeset: &Changeset) -> Result<Command, Error>;

    /// DELETE of the rows matching `query`.
    ///
    /// # Errors
    ///
    /// Implementation specific rendering failures.
    fn delete_command(&self, query: &Query) -> Result<Command, Error>;
}

impl<B: CommandBuilder + ?Sized> CommandBuilder for &B {
    #[inline]
    fn select_command(&self, query: &Query) -> Result<Command, Error> {
        B::select_command(self, query)
    }

    #[inline]
    fn insert_command(&self, table: &str, changeset: &Changeset) -> Result<Command, Error> {
        B::insert_command(self, table, changeset)
    }

    #[inline]
    fn update_command(&self, query: &Query, changeset: &Changeset) -> Result<Command, Error> {
        B::update_command(self, query, changeset)
    }

    #[inline]
    fn delete_command(&self, query: &Query) -> Result<Command, Error> {
        B::delete_command(self, query)
    }
}
