use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use crate::storage::{Store, UnitOfWork};
use crate::utils::error::{AppError, AppResult};

/// Runs each domain operation as one all-or-nothing unit of work.
///
/// Services open a [`Transaction`], run their checks and writes against it,
/// and hand the outcome to [`Transaction::finish`]: `Ok` commits, `Err`
/// rolls back. A transaction that is dropped unfinished (for example because
/// the request future was cancelled) is rolled back by the store.
#[derive(Clone)]
pub struct TransactionCoordinator {
    store: Arc<dyn Store>,
}

impl TransactionCoordinator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        TransactionCoordinator { store }
    }

    pub async fn begin(&self, operation: &'static str) -> AppResult<Transaction> {
        let work = self.store.begin().await.map_err(|err| {
            tracing::error!(operation, error = %err, "failed to open unit of work");
            AppError::from(err)
        })?;
        tracing::trace!(operation, "unit of work opened");

        Ok(Transaction {
            work,
            operation,
            started: Instant::now(),
        })
    }
}

pub struct Transaction {
    work: Box<dyn UnitOfWork>,
    operation: &'static str,
    started: Instant,
}

impl Transaction {
    /// Commits on success and rolls back on failure, returning `result`
    /// unless the commit itself fails.
    pub async fn finish<T>(self, result: AppResult<T>) -> AppResult<T> {
        let Transaction {
            work,
            operation,
            started,
        } = self;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                work.commit().await.map_err(|err| {
                    tracing::error!(operation, error = %err, "commit failed");
                    AppError::from(err)
                })?;
                tracing::debug!(operation, elapsed_ms, "committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = work.rollback().await {
                    tracing::error!(operation, error = %rollback_err, "rollback failed");
                }
                match &err {
                    AppError::StorageFailure(detail) | AppError::InvariantBroken(detail) => {
                        tracing::error!(operation, elapsed_ms, kind = err.kind(), %detail, "rolled back");
                    }
                    _ => {
                        tracing::info!(operation, elapsed_ms, kind = err.kind(), error = %err, "rolled back");
                    }
                }
                Err(err)
            }
        }
    }
}

impl Deref for Transaction {
    type Target = dyn UnitOfWork;

    fn deref(&self) -> &Self::Target {
        self.work.as_ref()
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.work.as_mut()
    }
}
