//! Translation of a record set's pending row states into statements.
//!
//! Rows are walked strictly in record set order; no dependency analysis or
//! batching takes place, so callers relying on insertion order (a parent
//! before its children) get exactly that order on the wire.

use crate::changeset::Changeset;
use crate::command::{Command, CommandBuilder};
use crate::errors::Error;
use crate::query::{Condition, Query};
use crate::record_set::{RecordSet, Row, RowState};

/// Capability to run one statement, supplied by the adapter.
///
/// The engine never touches the connection or transaction directly.
pub(crate) trait StatementExecutor {
    /// Executes `command` and returns the affected row count.
    async fn execute(&mut self, command: Command) -> Result<usize, Error>;
}

/// The statement a single pending row translates into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowChange {
    /// An Added row.
    Insert(Changeset),
    /// A Modified row, located by its original key.
    Update { query: Query, changeset: Changeset },
    /// A Deleted row, located by its original key.
    Delete { query: Query },
}

impl RowChange {
    fn command<B: CommandBuilder>(&self, table: &str, builder: &B) -> Result<Command, Error> {
        match self {
            RowChange::Insert(changeset) => builder.insert_command(table, changeset),
            RowChange::Update { query, changeset } => builder.update_command(query, changeset),
            RowChange::Delete { query } => builder.delete_command(query),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RowChange::Insert(_) => "insert",
            RowChange::Update { .. } => "update",
            RowChange::Delete { .. } => "delete",
        }
    }
}

/// Reconciles one record set against one table.
#[derive(Debug)]
pub(crate) struct Reconciler<'a> {
    table: &'a str,
    record_set: &'a RecordSet,
    primary_key: &'a [usize],
}

impl<'a> Reconciler<'a> {
    /// Checks the primary key precondition.
    ///
    /// # Errors
    ///
    /// * `MissingPrimaryKey` - If the record set has no primary key.
    pub(crate) fn new(table: &'a str, record_set: &'a RecordSet) -> Result<Self, Error> {
        let primary_key = record_set
            .primary_key()
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingPrimaryKey)?;
        Ok(Self {
            table,
            record_set,
            primary_key,
        })
    }

    /// The pending changes, in row order, paired with their row index.
    pub(crate) fn changes(&self) -> impl Iterator<Item = (usize, RowChange)> + '_ {
        self.record_set
            .rows()
            .enumerate()
            .filter_map(|(row_idx, row)| self.change_for(row).map(|change| (row_idx, change)))
    }

    fn change_for(&self, row: &Row) -> Option<RowChange> {
        match row.state() {
            RowState::Unchanged => None,
            RowState::Added => Some(RowChange::Insert(self.changeset(row))),
            RowState::Modified => Some(RowChange::Update {
                query: self.key_query(row),
                changeset: self.changeset(row),
            }),
            RowState::Deleted => Some(RowChange::Delete {
                query: self.key_query(row),
            }),
        }
    }

    /// Every current value of the row.
    fn changeset(&self, row: &Row) -> Changeset {
        self.record_set
            .columns()
            .zip(row.values())
            .map(|(column, value)| (column, value.clone()))
            .collect()
    }

    /// Equality filter over the key columns, using the row's original values.
    ///
    /// A key column changed in place is not followed: the filter still
    /// targets the record the row was loaded from.
    fn key_query(&self, row: &Row) -> Query {
        let original = row.original_values();
        let key = self.primary_key.iter().filter_map(|&col_idx| {
            Some((self.record_set.column_name(col_idx)?, original.get(col_idx)?))
        });
        Query::new(self.table).filter(Condition::primary_key(key))
    }

    /// Executes every pending change in order and sums the affected counts.
    ///
    /// The first failure stops the walk; statements already executed are not
    /// undone.
    pub(crate) async fn apply<B, X>(&self, builder: &B, executor: &mut X) -> Result<usize, Error>
    where
        B: CommandBuilder,
        X: StatementExecutor,
    {
        let mut affected = 0;
        for (row_idx, change) in self.changes() {
            let command = change.command(self.table, builder)?;
            tracing::trace!(
                row = row_idx,
                kind = change.kind(),
                sql = %command,
                params = %command.bindings(),
                "applying row change"
            );
            affected += executor.execute(command).await?;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SqlCommandBuilder;
    use crate::value::Value;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
        fail_at: Option<usize>,
    }

    impl StatementExecutor for Recorder {
        async fn execute(&mut self, command: Command) -> Result<usize, Error> {
            if self.fail_at == Some(self.commands.len()) {
                return Err(Error::execution("constraint violation"));
            }
            self.commands.push(command);
            Ok(1)
        }
    }

    fn record_set() -> RecordSet {
        let mut rs = RecordSet::new(["id", "name"]);
        rs.set_primary_key(&["id"]).unwrap();
        rs.load(vec![Value::Integer(5), Value::from("five")]).unwrap();
        rs.load(vec![Value::Integer(9), Value::from("nine")]).unwrap();
        rs.load(vec![Value::Integer(11), Value::from("eleven")]).unwrap();
        rs
    }

    #[test]
    fn test_missing_primary_key() {
        let rs = RecordSet::new(["id"]);
        assert!(matches!(
            Reconciler::new("t", &rs),
            Err(Error::MissingPrimaryKey)
        ));
    }

    #[test]
    fn test_unchanged_rows_produce_no_change() {
        let rs = record_set();
        let reconciler = Reconciler::new("t", &rs).unwrap();
        assert_eq!(reconciler.changes().count(), 0);
    }

    #[test]
    fn test_changes_follow_row_order() {
        let mut rs = record_set();
        rs.delete(1).unwrap();
        rs.row_mut(0).unwrap().set("name", "FIVE").unwrap();
        rs.add(vec![Value::Null, Value::from("new")]).unwrap();

        let reconciler = Reconciler::new("t", &rs).unwrap();
        let changes: Vec<_> = reconciler.changes().collect();

        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[0],
            (
                0,
                RowChange::Update {
                    query: Query::new("t").filter(Condition::and([Condition::eq("id", 5i64)])),
                    changeset: Changeset::new().set("id", 5i64).set("name", "FIVE"),
                }
            )
        );
        assert_eq!(
            changes[1],
            (
                1,
                RowChange::Delete {
                    query: Query::new("t").filter(Condition::and([Condition::eq("id", 9i64)])),
                }
            )
        );
        assert_eq!(
            changes[2],
            (
                3,
                RowChange::Insert(Changeset::new().set("id", Value::Null).set("name", "new"))
            )
        );
    }

    #[test]
    fn test_changed_key_filters_on_original_value() {
        let mut rs = record_set();
        rs.row_mut(0).unwrap().set("id", 50i64).unwrap();

        let reconciler = Reconciler::new("t", &rs).unwrap();
        let (_, change) = reconciler.changes().next().unwrap();
        let RowChange::Update { query, changeset } = change else {
            panic!("expected an update");
        };
        assert_eq!(
            query.condition(),
            Some(&Condition::and([Condition::eq("id", 5i64)]))
        );
        assert_eq!(changeset.get("id"), Some(&Value::Integer(50).into()));
    }

    #[tokio::test]
    async fn test_apply_sums_affected_counts() {
        let mut rs = record_set();
        rs.row_mut(2).unwrap().set("name", "ELEVEN").unwrap();
        rs.delete(0).unwrap();

        let reconciler = Reconciler::new("t", &rs).unwrap();
        let mut recorder = Recorder::default();
        let affected = reconciler
            .apply(&SqlCommandBuilder::<crate::command::Sqlite>::default(), &mut recorder)
            .await
            .unwrap();

        assert_eq!(affected, 2);
        let sql: Vec<_> = recorder.commands.iter().map(Command::sql).collect();
        assert_eq!(
            sql,
            vec![
                r#"DELETE FROM "t" WHERE "id" = ?1"#,
                r#"UPDATE "t" SET "id" = ?1, "name" = ?2 WHERE "id" = ?3"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_stops_at_first_failure() {
        let mut rs = record_set();
        for row_idx in 0..3 {
            rs.delete(row_idx).unwrap();
        }

        let reconciler = Reconciler::new("t", &rs).unwrap();
        let mut recorder = Recorder {
            fail_at: Some(1),
            ..Recorder::default()
        };
        let err = reconciler
            .apply(&SqlCommandBuilder::<crate::command::Sqlite>::default(), &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StatementExecution { .. }));
        assert_eq!(recorder.commands.len(), 1);
    }
}
