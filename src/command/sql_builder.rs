//! Dialect-parameterized SQL renderer.

use super::{Command, CommandBuilder, Dialect};
use crate::changeset::{Changeset, QueryValue};
use crate::errors::Error;
use crate::query::{Condition, Query};
use crate::value::Value;

/// Renders queries and changesets as parameterized SQL for dialect `D`.
///
/// # Example
///
/// ```
/// use recordset_adapter::{Changeset, CommandBuilder, Condition, Query, SqliteCommandBuilder};
///
/// let builder = SqliteCommandBuilder::default();
/// let cmd = builder
///     .update_command(
///         &Query::new("users").filter(Condition::eq("id", 1i64)),
///         &Changeset::new().set("name", "Alicia"),
///     )
///     .unwrap();
///
/// assert_eq!(cmd.sql(), r#"UPDATE "users" SET "name" = ?1 WHERE "id" = ?2"#);
/// assert_eq!(cmd.params().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlCommandBuilder<D: Dialect> {
    dialect: D,
}

impl<D: Dialect> SqlCommandBuilder<D> {
    /// Creates a builder for the given dialect.
    #[must_use]
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }

    /// The dialect used for rendering.
    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    fn writer(&self) -> StatementWriter<'_, D> {
        StatementWriter {
            dialect: &self.dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

impl<D: Dialect> CommandBuilder for SqlCommandBuilder<D> {
    fn select_command(&self, query: &Query) -> Result<Command, Error> {
        let mut w = self.writer();
        w.push("SELECT ");
        if query.fields().is_empty() {
            w.push("*");
        } else {
            for (i, field) in query.fields().iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.identifier(field);
            }
        }
        w.push(" FROM ");
        w.identifier(query.table());
        w.where_clause(query.condition());

        for (i, sort) in query.sort().iter().enumerate() {
            w.push(if i == 0 { " ORDER BY " } else { ", " });
            w.identifier(&sort.field);
            w.push(if sort.descending { " DESC" } else { " ASC" });
        }
        self.dialect
            .write_paging(&mut w.sql, query.record_offset(), query.record_limit());
        Ok(w.finish())
    }

    fn insert_command(&self, table: &str, changeset: &Changeset) -> Result<Command, Error> {
        if changeset.is_empty() {
            return Err(Error::EmptyChangeset);
        }
        let mut w = self.writer();
        w.push("INSERT INTO ");
        w.identifier(table);

        // Column names
        w.push(" (");
        for (i, column) in changeset.columns().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.identifier(column);
        }
        w.push(") VALUES (");

        // Values
        for (i, (_, value)) in changeset.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.value(value);
        }
        w.push(")");
        Ok(w.finish())
    }

    fn update_command(&self, query: &Query, changeset: &Changeset) -> Result<Command, Error> {
        if changeset.is_empty() {
            return Err(Error::EmptyChangeset);
        }
        let mut w = self.writer();
        w.push("UPDATE ");
        w.identifier(query.table());
        w.push(" SET ");
        for (i, (column, value)) in changeset.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.identifier(column);
            w.push(" = ");
            w.value(value);
        }
        w.where_clause(query.condition());
        Ok(w.finish())
    }

    fn delete_command(&self, query: &Query) -> Result<Command, Error> {
        let mut w = self.writer();
        w.push("DELETE FROM ");
        w.identifier(query.table());
        w.where_clause(query.condition());
        Ok(w.finish())
    }
}

/// Accumulates statement text and parameter bindings.
struct StatementWriter<'d, D: Dialect> {
    dialect: &'d D,
    sql: String,
    params: Vec<Value>,
}

impl<D: Dialect> StatementWriter<'_, D> {
    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn identifier(&mut self, name: &str) {
        self.dialect.write_identifier(&mut self.sql, name);
    }

    fn value(&mut self, value: &QueryValue) {
        match value {
            QueryValue::Const(v) => {
                self.params.push(v.clone());
                self.dialect.write_placeholder(&mut self.sql, self.params.len());
            }
            QueryValue::Field(name) => self.identifier(name),
            QueryValue::Raw(sql) => self.sql.push_str(sql),
        }
    }

    fn where_clause(&mut self, condition: Option<&Condition>) {
        if let Some(condition) = condition {
            self.push(" WHERE ");
            self.condition(condition, false);
        }
    }

    /// Writes a condition; `nested` groups are parenthesized.
    fn condition(&mut self, condition: &Condition, nested: bool) {
        match condition {
            Condition::Compare { left, op, right } => {
                self.value(left);
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
                self.value(right);
            }
            Condition::IsNull(operand) => {
                self.value(operand);
                self.push(" IS NULL");
            }
            Condition::IsNotNull(operand) => {
                self.value(operand);
                self.push(" IS NOT NULL");
            }
            Condition::And(group) => self.group(group, " AND ", "1=1", nested),
            Condition::Or(group) => self.group(group, " OR ", "1=0", nested),
            Condition::Not(inner) => {
                self.push("NOT (");
                self.condition(inner, false);
                self.push(")");
            }
        }
    }

    fn group(&mut self, group: &[Condition], separator: &str, empty: &str, nested: bool) {
        match group {
            [] => self.push(empty),
            [single] => self.condition(single, nested),
            conditions => {
                if nested {
                    self.push("(");
                }
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        self.push(separator);
                    }
                    self.condition(condition, true);
                }
                if nested {
                    self.push(")");
                }
            }
        }
    }

    fn finish(self) -> Command {
        Command::new(self.sql, self.params)
    }
}
