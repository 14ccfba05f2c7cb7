use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DocMapResult;
use crate::metadata::CollectionDescriptor;
use crate::query::{QueryExecutor, QuerySpec};
use crate::repository::repository_operations::RepositoryOperations;
use crate::repository::{Entity, RepositoryProvider, ValidationViolation};
use crate::store::{RawDocument, StoreClient};

/// Repository strategy talking to the store directly.
pub(crate) struct DefaultRepository<T: Entity> {
    client: Arc<dyn StoreClient>,
    operations: RepositoryOperations,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> DefaultRepository<T> {
    pub(crate) fn new(client: Arc<dyn StoreClient>, operations: RepositoryOperations) -> Self {
        DefaultRepository {
            client,
            operations,
            _entity: PhantomData,
        }
    }

    async fn write(&self, id: String, item: &T) -> DocMapResult<T> {
        let fields = self.operations.to_fields(item)?;
        let path = self.operations.collection_path();
        self.client.set_document(path, &id, fields.clone()).await?;
        self.operations.hydrate(RawDocument::new(path, &id, fields))
    }
}

#[async_trait]
impl<T: Entity> QueryExecutor<T> for DefaultRepository<T> {
    async fn execute(&self, spec: &QuerySpec, single: bool) -> DocMapResult<Vec<T>> {
        let query = self.operations.store_query(spec, single);
        log::debug!("Querying '{}' with {}", self.operations.collection_path(), spec);
        let documents = self
            .client
            .run_query(self.operations.collection_path(), &query)
            .await?;
        self.operations.hydrate_all(documents)
    }
}

#[async_trait]
impl<T: Entity> RepositoryProvider<T> for DefaultRepository<T> {
    fn collection_path(&self) -> &str {
        self.operations.collection_path()
    }

    fn descriptor(&self) -> &CollectionDescriptor {
        self.operations.descriptor()
    }

    fn is_transactional(&self) -> bool {
        false
    }

    async fn find_by_id(&self, id: &str) -> DocMapResult<Option<T>> {
        self.operations.require_document_id(id)?;
        match self
            .client
            .get_document(self.operations.collection_path(), id)
            .await
        {
            Ok(raw) => Ok(Some(self.operations.hydrate(raw)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, item: &T) -> DocMapResult<T> {
        self.operations.ensure_valid(item)?;
        let id = match self.operations.entity_id(item) {
            Some(id) => id,
            None => {
                self.client
                    .generate_id(self.operations.collection_path())
                    .await?
            }
        };
        self.operations.require_document_id(&id)?;
        self.write(id, item).await
    }

    async fn update(&self, item: &T) -> DocMapResult<T> {
        let id = self.operations.require_id(item)?;
        self.operations.require_document_id(&id)?;
        self.operations.ensure_valid(item)?;
        // update never creates; a missing document surfaces as NotFound
        self.client
            .get_document(self.operations.collection_path(), &id)
            .await?;
        self.write(id, item).await
    }

    async fn delete(&self, id: &str) -> DocMapResult<()> {
        self.operations.require_document_id(id)?;
        match self
            .client
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
