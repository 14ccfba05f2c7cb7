use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::metadata::CollectionDescriptor;
use crate::query::{QueryExecutor, QuerySpec};
use crate::repository::repository_operations::RepositoryOperations;
use crate::repository::{Entity, RepositoryProvider, ValidationViolation};
use crate::store::{RawDocument, StoreTransaction};

/// Repository strategy routing every read and write through one store
/// transaction. Unusable once the transaction has completed.
pub(crate) struct TransactionRepository<T: Entity> {
    transaction: Arc<dyn StoreTransaction>,
    operations: RepositoryOperations,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> TransactionRepository<T> {
    pub(crate) fn new(transaction: Arc<dyn StoreTransaction>, operations: RepositoryOperations) -> Self {
        TransactionRepository {
            transaction,
            operations,
            _entity: PhantomData,
        }
    }

    fn ensure_active(&self) -> DocMapResult<()> {
        if self.transaction.is_active() {
            Ok(())
        } else {
            log::error!(
                "Transaction on '{}' has already completed",
                self.operations.collection_path()
            );
            Err(DocMapError::new(
                "Transaction has already completed",
                ErrorKind::TransactionError,
            ))
        }
    }

    async fn write(&self, id: String, item: &T) -> DocMapResult<T> {
        let fields = self.operations.to_fields(item)?;
        let path = self.operations.collection_path();
        self.transaction.set_document(path, &id, fields.clone()).await?;
        self.operations.hydrate(RawDocument::new(path, &id, fields))
    }
}

#[async_trait]
impl<T: Entity> QueryExecutor<T> for TransactionRepository<T> {
    async fn execute(&self, spec: &QuerySpec, single: bool) -> DocMapResult<Vec<T>> {
        self.ensure_active()?;
        let query = self.operations.store_query(spec, single);
        log::debug!(
            "Querying '{}' in transaction with {}",
            self.operations.collection_path(),
            spec
        );
        let documents = self
            .transaction
            .run_query(self.operations.collection_path(), &query)
            .await?;
        self.operations.hydrate_all(documents)
    }
}

#[async_trait]
impl<T: Entity> RepositoryProvider<T> for TransactionRepository<T> {
    fn collection_path(&self) -> &str {
        self.operations.collection_path()
    }

    fn descriptor(&self) -> &CollectionDescriptor {
        self.operations.descriptor()
    }

    fn is_transactional(&self) -> bool {
        true
    }

    async fn find_by_id(&self, id: &str) -> DocMapResult<Option<T>> {
        self.ensure_active()?;
        self.operations.require_document_id(id)?;
        match self
            .transaction
            .get_document(self.operations.collection_path(), id)
            .await
        {
            Ok(raw) => Ok(Some(self.operations.hydrate(raw)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, item: &T) -> DocMapResult<T> {
        self.ensure_active()?;
        self.operations.ensure_valid(item)?;
        let id = match self.operations.entity_id(item) {
            Some(id) => id,
            None => {
                self.transaction
                    .generate_id(self.operations.collection_path())
                    .await?
            }
        };
        self.operations.require_document_id(&id)?;
        self.write(id, item).await
    }

    async fn update(&self, item: &T) -> DocMapResult<T> {
        self.ensure_active()?;
        let id = self.operations.require_id(item)?;
        self.operations.require_document_id(&id)?;
        self.operations.ensure_valid(item)?;
        // update never creates; a missing document surfaces as NotFound
        self.transaction
            .get_document(self.operations.collection_path(), &id)
            .await?;
        self.write(id, item).await
    }

    async fn delete(&self, id: &str) -> DocMapResult<()> {
        self.ensure_active()?;
        self.operations.require_document_id(id)?;
        match self
            .transaction
            .delete_document(self.operations.collection_path(), id)
            .await
        {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    fn validate(&self, item: &T) -> DocMapResult<Vec<ValidationViolation>> {
        self.operations.validate(item)
    }
}
