//! Units of work spanning several repositories.
//!
//! Every repository obtained from a [Transaction], including the
//! sub-collection repositories of entities it returns, reads and writes
//! through the same store transaction.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use crate::errors::DocMapResult;
use crate::metadata::{get_metadata_storage, MetadataStorage};
use crate::repository::{CustomRepository, Entity, Repository, RepositoryFactory};
use crate::store::StoreTransaction;

/// A handle to an open store transaction. Cheap to clone; clones share the
/// transaction.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<dyn StoreTransaction>,
    factory: RepositoryFactory,
}

impl Transaction {
    /// Opens a transaction on the store bound in `storage`.
    pub async fn begin(storage: MetadataStorage) -> DocMapResult<Transaction> {
        let store = storage.store()?;
        let inner = store.begin_transaction().await?;
        log::debug!("Transaction started");
        Ok(Transaction {
            factory: RepositoryFactory::for_transaction(storage, inner.clone()),
            inner,
        })
    }

    /// Runs `work` in a new transaction on the store bound in `storage`.
    ///
    /// The transaction commits when `work` succeeds and rolls back when it
    /// fails. Commit errors propagate. There is no retry.
    pub async fn run<F, Fut, R>(storage: MetadataStorage, work: F) -> DocMapResult<R>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = DocMapResult<R>>,
    {
        let transaction = Transaction::begin(storage).await?;
        match work(transaction.clone()).await {
            Ok(result) => {
                if transaction.is_active() {
                    transaction.commit().await?;
                }
                Ok(result)
            }
            Err(e) => {
                if transaction.is_active() {
                    if let Err(rollback_error) = transaction.rollback().await {
                        log::error!("Rollback after failed transaction failed: {}", rollback_error);
                    }
                }
                Err(e)
            }
        }
    }

    pub fn repository<T: Entity>(&self) -> DocMapResult<Repository<T>> {
        self.factory.repository::<T>()
    }

    pub fn repository_at<T: Entity>(&self, path: &str) -> DocMapResult<Repository<T>> {
        self.factory.repository_at::<T>(path)
    }

    pub fn custom_repository<R: CustomRepository>(&self) -> DocMapResult<R> {
        self.factory.custom_repository::<R>()
    }

    pub async fn commit(&self) -> DocMapResult<()> {
        self.inner.commit().await?;
        log::debug!("Transaction committed");
        Ok(())
    }

    pub async fn rollback(&self) -> DocMapResult<()> {
        self.inner.rollback().await?;
        log::debug!("Transaction rolled back");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

impl Debug for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Opens a transaction on the process-wide store.
pub async fn begin_transaction() -> DocMapResult<Transaction> {
    Transaction::begin(get_metadata_storage()).await
}

/// Runs `work` in a transaction on the process-wide store, committing on
/// success and rolling back on failure.
///
/// ```rust,ignore
/// let moved = run_transaction(|tx| async move {
///     let accounts = tx.repository::<Account>()?;
///     let mut from = accounts.find_by_id("a").await?.unwrap_or_default();
///     from.balance -= 10;
///     accounts.update(&from).await
/// })
/// .await?;
/// ```
pub async fn run_transaction<F, Fut, R>(work: F) -> DocMapResult<R>
where
    F: FnOnce(Transaction) -> Fut,
    Fut: Future<Output = DocMapResult<R>>,
{
    Transaction::run(get_metadata_storage(), work).await
}
