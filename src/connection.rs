//! Connection primitive consumed by the adapter.

use core::future::Future;

use serde::de::DeserializeOwned;

use crate::cancel::CancellationToken;
use crate::changeset::PropertyMap;
use crate::command::Command;
use crate::errors::Error;
use crate::value::Value;

/// Whether a connection can currently execute statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// The connection is open.
    Open,
    /// The connection is closed.
    Closed,
}

/// Rows returned by a SELECT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Deserializes every row into a model.
    ///
    /// Each row becomes a map keyed by column name. With a `property_map`
    /// (model property -> column name, as for
    /// [`Changeset::from_model`](crate::Changeset::from_model)) only mapped
    /// columns are kept, under their property name; the model's own serde
    /// attributes decide how missing or extra properties are handled.
    ///
    /// # Errors
    ///
    /// * `InvalidModel` - If a row does not deserialize into `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use recordset_adapter::{PropertyMap, QueryResult, Value};
    ///
    /// #[derive(serde::Deserialize)]
    /// struct User { id: i64, display_name: String }
    ///
    /// let result = QueryResult {
    ///     columns: vec!["id".into(), "name".into()],
    ///     rows: vec![vec![Value::Integer(1), Value::from("Alice")]],
    /// };
    /// let map: PropertyMap = [("id", "id"), ("display_name", "name")]
    ///     .into_iter()
    ///     .map(|(property, column)| (property.to_string(), column.to_string()))
    ///     .collect();
    ///
    /// let users: Vec<User> = result.into_models(Some(&map)).unwrap();
    /// assert_eq!(users[0].display_name, "Alice");
    /// ```
    pub fn into_models<T: DeserializeOwned>(
        self,
        property_map: Option<&PropertyMap>,
    ) -> Result<Vec<T>, Error> {
        let keys: Vec<Option<String>> = self
            .columns
            .iter()
            .map(|column| match property_map {
                None => Some(column.clone()),
                Some(map) => map
                    .iter()
                    .find(|(_, mapped)| *mapped == column)
                    .map(|(property, _)| property.clone()),
            })
            .collect();

        self.rows
            .into_iter()
            .map(|row| {
                let object: serde_json::Map<String, serde_json::Value> = keys
                    .iter()
                    .zip(row)
                    .filter_map(|(key, value)| Some((key.clone()?, value.into())))
                    .collect();
                serde_json::from_value(serde_json::Value::Object(object))
                    .map_err(|e| Error::InvalidModel(e.to_string()))
            })
            .collect()
    }
}

/// A database connection able to run [`Command`]s.
///
/// Every operation may suspend. Implementations over blocking drivers simply
/// complete synchronously. Connections are not shared: the adapter holds the
/// only handle and never issues two statements concurrently.
///
/// `open`, `execute` and `query` receive the caller's cancellation token. A
/// back-end able to abort an in-flight call watches it and fails with its own
/// error; the adapter reports any failure seen after cancellation as
/// [`Error::Cancelled`](crate::Error::Cancelled). Ignoring the token is valid.
pub trait Connection {
    /// Handle of a caller-managed transaction on this connection.
    type Transaction;
    /// Back-end failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The current state.
    fn state(&self) -> ConnectionState;

    /// Opens the connection.
    fn open(&mut self, cancel: &CancellationToken) -> impl Future<Output = Result<(), Self::Error>>;

    /// Closes the connection.
    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Executes a data-modifying statement and returns the affected row count.
    fn execute(
        &mut self,
        command: &Command,
        transaction: Option<&Self::Transaction>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<usize, Self::Error>>;

    /// Executes a SELECT and returns its rows.
    fn query(
        &mut self,
        command: &Command,
        transaction: Option<&Self::Transaction>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<QueryResult, Self::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Item {
        id: i64,
        label: Option<String>,
        #[serde(default)]
        payload: Vec<u8>,
    }

    fn result() -> QueryResult {
        QueryResult {
            columns: vec!["id".into(), "name".into(), "payload".into()],
            rows: vec![
                vec![Value::Integer(1), Value::from("a"), Value::Blob(vec![7])],
                vec![Value::Integer(2), Value::Null, Value::Blob(vec![])],
            ],
        }
    }

    #[test]
    fn test_into_models_without_map_uses_column_names() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Raw {
            id: i64,
            name: Option<String>,
        }
        let rows: Vec<Raw> = result().into_models(None).unwrap();
        assert_eq!(
            rows,
            vec![
                Raw { id: 1, name: Some("a".into()) },
                Raw { id: 2, name: None },
            ]
        );
    }

    #[test]
    fn test_into_models_with_map_renames_and_drops() {
        let map: PropertyMap = [("id", "id"), ("label", "name")]
            .into_iter()
            .map(|(property, column)| (property.to_string(), column.to_string()))
            .collect();
        let items: Vec<Item> = result().into_models(Some(&map)).unwrap();
        assert_eq!(
            items[0],
            Item {
                id: 1,
                label: Some("a".into()),
                payload: vec![],
            }
        );
    }

    #[test]
    fn test_into_models_blob_and_type_errors() {
        let items: Vec<Item> = QueryResult {
            columns: vec!["id".into(), "payload".into()],
            rows: vec![vec![Value::Integer(3), Value::Blob(vec![1, 2])]],
        }
        .into_models(None)
        .unwrap();
        assert_eq!(items[0].payload, vec![1, 2]);

        let err = QueryResult {
            columns: vec!["id".into()],
            rows: vec![vec![Value::from("not a number")]],
        }
        .into_models::<Item>(None)
        .unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }
}
