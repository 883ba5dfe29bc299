//! Prepared, not yet executed SELECT.

use serde::de::DeserializeOwned;

use super::blocking;
use super::session::Session;
use crate::cancel::CancellationToken;
use crate::changeset::PropertyMap;
use crate::command::Command;
use crate::connection::{Connection, QueryResult};
use crate::errors::Error;
use crate::query::Query;
use crate::record_set::RecordSet;

/// A SELECT bound to the adapter's connection and transaction.
///
/// Building it issues nothing; the statement runs when the rows are fetched,
/// under the same connection lifecycle rules as every other adapter call.
pub struct SelectQuery<'a, C: Connection> {
    connection: &'a mut C,
    transaction: Option<&'a C::Transaction>,
    query: Query,
    command: Command,
}

impl<'a, C: Connection> SelectQuery<'a, C> {
    pub(crate) fn new(
        connection: &'a mut C,
        transaction: Option<&'a C::Transaction>,
        query: Query,
        command: Command,
    ) -> Self {
        Self {
            connection,
            transaction,
            query,
            command,
        }
    }

    /// The statement that will run.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The query the statement was built from.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Executes the SELECT and returns the raw rows.
    ///
    /// # Errors
    ///
    /// * `Cancelled` - If `cancel` fires before the statement is sent.
    /// * `Connection` - If the connection cannot be opened or closed.
    /// * `StatementExecution` - If the connection rejects the statement.
    pub async fn fetch_async(self, cancel: &CancellationToken) -> Result<QueryResult, Error> {
        let mut session = Session::new(self.connection, self.transaction, cancel);
        let opened = session.open().await?;
        let result = session.query(&self.command).await;
        session.release(opened, result).await
    }

    /// Executes the SELECT and loads the rows into an unchanged record set.
    ///
    /// The record set has no primary key: set one before reconciling it.
    ///
    /// # Errors
    ///
    /// See [`fetch_async`](Self::fetch_async); additionally
    /// `ValueCountMismatch` if the back-end returns ragged rows.
    pub async fn record_set_async(self, cancel: &CancellationToken) -> Result<RecordSet, Error> {
        let QueryResult { columns, rows } = self.fetch_async(cancel).await?;
        let mut record_set = RecordSet::new(columns);
        for values in rows {
            record_set.load(values)?;
        }
        Ok(record_set)
    }

    /// Executes the SELECT and deserializes every row into a `T`.
    ///
    /// `property_map` maps model properties to column names, the same map
    /// the model writes take; see [`QueryResult::into_models`].
    ///
    /// # Errors
    ///
    /// See [`fetch_async`](Self::fetch_async); additionally `InvalidModel`
    /// if a row does not fit `T`.
    pub async fn models_async<T: DeserializeOwned>(
        self,
        property_map: Option<&PropertyMap>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, Error> {
        self.fetch_async(cancel).await?.into_models(property_map)
    }

    /// Blocking form of [`fetch_async`](Self::fetch_async).
    ///
    /// # Errors
    ///
    /// See [`fetch_async`](Self::fetch_async).
    pub fn fetch(self) -> Result<QueryResult, Error> {
        blocking::block_on(self.fetch_async(&CancellationToken::new()))?
    }

    /// Blocking form of [`record_set_async`](Self::record_set_async).
    ///
    /// # Errors
    ///
    /// See [`record_set_async`](Self::record_set_async).
    pub fn record_set(self) -> Result<RecordSet, Error> {
        blocking::block_on(self.record_set_async(&CancellationToken::new()))?
    }

    /// Blocking form of [`models_async`](Self::models_async).
    ///
    /// # Errors
    ///
    /// See [`models_async`](Self::models_async).
    pub fn models<T: DeserializeOwned>(
        self,
        property_map: Option<&PropertyMap>,
    ) -> Result<Vec<T>, Error> {
        blocking::block_on(self.models_async(property_map, &CancellationToken::new()))?
    }
}

impl<C: Connection> core::fmt::Debug for SelectQuery<'_, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SelectQuery")
            .field("query", &self.query)
            .field("command", &self.command)
            .field("has_transaction", &self.transaction.is_some())
            .finish_non_exhaustive()
    }
}
