//! SQL flavours understood by [`SqlCommandBuilder`](super::SqlCommandBuilder).

use core::fmt::{Debug, Write};

/// The parts of SQL syntax that vary between back-ends.
pub trait Dialect: Debug + Default + Clone {
    /// Appends the quoted form of a table or column name.
    ///
    /// The default double-quotes the identifier and doubles embedded quotes.
    fn write_identifier(&self, out: &mut String, name: &str) {
        out.push('"');
        for c in name.chars() {
            if c == '"' {
                out.push_str("\"\"");
            } else {
                out.push(c);
            }
        }
        out.push('"');
    }

    /// Appends the placeholder of the 1-based parameter `index`.
    fn write_placeholder(&self, out: &mut String, index: usize);

    /// Appends the paging clause, if any.
    fn write_paging(&self, out: &mut String, offset: usize, limit: Option<usize>) {
        match (limit, offset) {
            (None, 0) => {}
            (Some(limit), 0) => {
                let _ = write!(out, " LIMIT {limit}");
            }
            (Some(limit), offset) => {
                let _ = write!(out, " LIMIT {limit} OFFSET {offset}");
            }
            (None, offset) => {
                let _ = write!(out, " OFFSET {offset}");
            }
        }
    }
}

/// SQLite: numbered `?N` placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "?{index}");
    }

    fn write_paging(&self, out: &mut String, offset: usize, limit: Option<usize>) {
        // SQLite has no standalone OFFSET; a negative LIMIT means unbounded.
        match (limit, offset) {
            (None, 0) => {}
            (None, offset) => {
                let _ = write!(out, " LIMIT -1 OFFSET {offset}");
            }
            (Some(limit), 0) => {
                let _ = write!(out, " LIMIT {limit}");
            }
            (Some(limit), offset) => {
                let _ = write!(out, " LIMIT {limit} OFFSET {offset}");
            }
        }
    }
}

/// PostgreSQL: `$N` placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Postgres;

impl Dialect for Postgres {
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "${index}");
    }
}
