//! Explicit transactions.

use std::sync::Arc;

use quarry_core::{DatabaseConfig, Record, Row, Schema};
use tracing::debug;

use crate::batch;
use crate::driver::TxInner;
use crate::error::{Error, Result};
use crate::executor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Committed,
    RolledBack,
}

/// A database transaction started by [`crate::Database::begin`].
///
/// Descriptors executed through it only become visible to other
/// connections after [`Transaction::commit`]. Dropping an open transaction
/// rolls it back.
pub struct Transaction {
    inner: Option<TxInner>,
    config: Arc<DatabaseConfig>,
    state: State,
}

impl Transaction {
    pub(crate) fn new(inner: TxInner, config: Arc<DatabaseConfig>) -> Self {
        Self {
            inner: Some(inner),
            config,
            state: State::Open,
        }
    }

    fn session(&mut self) -> Result<&mut TxInner> {
        let state = self.state;
        self.inner.as_mut().ok_or(Error::TransactionClosed(closed(state)))
    }

    /// Runs an executable descriptor inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn execute(&mut self, schema: &Schema) -> Result<i64> {
        let config = Arc::clone(&self.config);
        executor::execute(self.session()?, &config, schema).await
    }

    /// Runs a select descriptor inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn select_rows(&mut self, schema: &Schema) -> Result<Vec<Row>> {
        let config = Arc::clone(&self.config);
        executor::select_rows(self.session()?, &config, schema).await
    }

    /// Runs a select descriptor and maps each row onto `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn select_records<R: Record>(&mut self, schema: &Schema) -> Result<Vec<R>> {
        let config = Arc::clone(&self.config);
        executor::select_records(self.session()?, &config, schema).await
    }

    /// Counts the rows matching a descriptor's predicates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn select_count(&mut self, schema: &Schema) -> Result<i64> {
        let config = Arc::clone(&self.config);
        executor::select_count(self.session()?, &config, schema).await
    }

    /// Multi-row insert inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn insert_multiple(&mut self, schemas: &[Schema]) -> Result<i64> {
        let config = Arc::clone(&self.config);
        batch::insert_batch(self.session()?, &config, schemas).await
    }

    /// Per-row updates inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn update_multiple(&mut self, schemas: &[Schema]) -> Result<i64> {
        let config = Arc::clone(&self.config);
        batch::update_batch(self.session()?, &config, schemas).await
    }

    /// Multi-row upsert inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] after commit or rollback, otherwise the
    /// same errors as the matching [`crate::Database`] method.
    pub async fn upsert_multiple(&mut self, schemas: &[Schema]) -> Result<i64> {
        let config = Arc::clone(&self.config);
        batch::upsert_batch(self.session()?, &config, schemas).await
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] if the transaction was already
    /// committed or rolled back.
    pub async fn commit(&mut self) -> Result<()> {
        let inner = self.take()?;
        // A failed COMMIT leaves nothing to roll back on our side.
        self.state = State::RolledBack;
        inner
            .commit()
            .await
            .map_err(|e| Error::database("commit", None, e))?;
        self.state = State::Committed;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionClosed`] if the transaction was already
    /// committed or rolled back.
    pub async fn rollback(&mut self) -> Result<()> {
        let inner = self.take()?;
        self.state = State::RolledBack;
        inner
            .rollback()
            .await
            .map_err(|e| Error::database("rollback", None, e))?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Returns true once [`Transaction::commit`] has succeeded.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state == State::Committed
    }

    /// Returns true once the transaction has been rolled back.
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        self.state == State::RolledBack
    }

    fn take(&mut self) -> Result<TxInner> {
        let state = self.state;
        self.inner.take().ok_or(Error::TransactionClosed(closed(state)))
    }
}

const fn closed(state: State) -> &'static str {
    match state {
        State::Committed => "committed",
        State::Open | State::RolledBack => "rolled back",
    }
}
