use std::sync::Arc;

use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::metadata::{
    get_metadata_storage, CollectionDescriptor, CollectionKey, EntityType, MetadataStorage,
    RepositoryType,
};
use crate::repository::default_repository::DefaultRepository;
use crate::repository::repository_operations::RepositoryOperations;
use crate::repository::transaction_repository::TransactionRepository;
use crate::repository::{CustomRepository, Entity, Repository, RepositoryProvider};
use crate::store::{StoreClient, StoreTransaction};

/// Where a repository sends its reads and writes.
#[derive(Clone)]
pub enum StoreScope {
    Direct(Arc<dyn StoreClient>),
    Transaction(Arc<dyn StoreTransaction>),
}

impl StoreScope {
    pub fn is_transactional(&self) -> bool {
        matches!(self, StoreScope::Transaction(_))
    }
}

/// Produces repositories from the registry.
///
/// Without an explicit scope, repositories talk to the store bound in the
/// registry; a factory created for a transaction produces repositories that
/// route everything through it.
#[derive(Clone)]
pub struct RepositoryFactory {
    storage: MetadataStorage,
    scope: Option<StoreScope>,
}

impl RepositoryFactory {
    pub fn new(storage: MetadataStorage) -> Self {
        RepositoryFactory {
            storage,
            scope: None,
        }
    }

    pub fn for_transaction(storage: MetadataStorage, transaction: Arc<dyn StoreTransaction>) -> Self {
        RepositoryFactory::with_scope(storage, StoreScope::Transaction(transaction))
    }

    pub(crate) fn with_scope(storage: MetadataStorage, scope: StoreScope) -> Self {
        RepositoryFactory {
            storage,
            scope: Some(scope),
        }
    }

    /// The repository of `T`'s registered collection.
    ///
    /// # Errors
    ///
    /// `UninitializedStore` when no store is bound, `UnregisteredCollection`
    /// when `T` has no collection.
    pub fn repository<T: Entity>(&self) -> DocMapResult<Repository<T>> {
        let scope = self.scope()?;
        let descriptor = self
            .storage
            .get_collection(&CollectionKey::Entity(EntityType::of::<T>()))?;
        let path = descriptor.name.clone();
        Ok(self.build(descriptor, path, scope))
    }

    /// A repository of `T` bound to a literal collection path. `T` does not
    /// need to be registered; its declared sub-collections are used then.
    pub fn repository_at<T: Entity>(&self, path: &str) -> DocMapResult<Repository<T>> {
        let scope = self.scope()?;
        let mut descriptor = self
            .storage
            .get_collection(&CollectionKey::Path(path.to_string()))?;

        let entity_type = EntityType::of::<T>();
        descriptor.entity_type = Some(entity_type);
        match self.storage.find_collection(&entity_type) {
            Some(registered) => {
                descriptor.sub_collections = if registered.sub_collections.is_empty() {
                    T::sub_collections()
                } else {
                    registered.sub_collections
                };
                descriptor.custom_repository = registered.custom_repository;
            }
            None => descriptor.sub_collections = T::sub_collections(),
        }
        Ok(self.build(descriptor, path.to_string(), scope))
    }

    /// Wraps the repository of `R::Entity` in the custom repository `R`.
    ///
    /// # Errors
    ///
    /// `MetadataError` when a different custom repository is registered for
    /// the entity.
    pub fn custom_repository<R: CustomRepository>(&self) -> DocMapResult<R> {
        let repository = self.repository::<R::Entity>()?;
        let expected = RepositoryType::of::<R>();
        if let Some(registered) = repository.descriptor().custom_repository {
            if registered != expected {
                log::error!(
                    "{} is bound to {:?}, not {:?}",
                    <R::Entity as Entity>::entity_name(),
                    registered,
                    expected
                );
                return Err(DocMapError::new(
                    &format!(
                        "{} is bound to {}, not {}",
                        <R::Entity as Entity>::entity_name(),
                        registered.name(),
                        expected.name()
                    ),
                    ErrorKind::MetadataError,
                ));
            }
        }
        Ok(R::from_repository(repository))
    }

    fn scope(&self) -> DocMapResult<StoreScope> {
        match &self.scope {
            Some(scope) => Ok(scope.clone()),
            None => Ok(StoreScope::Direct(self.storage.store()?)),
        }
    }

    fn build<T: Entity>(
        &self,
        descriptor: CollectionDescriptor,
        path: String,
        scope: StoreScope,
    ) -> Repository<T> {
        log::debug!(
            "Creating {} repository for {} at '{}'",
            if scope.is_transactional() { "transactional" } else { "direct" },
            T::entity_name(),
            path
        );
        let operations = RepositoryOperations::new(self.storage.clone(), descriptor, path, scope.clone());
        match scope {
            StoreScope::Direct(client) => Repository::new(DefaultRepository::<T>::new(client, operations)),
            StoreScope::Transaction(transaction) => {
                Repository::new(TransactionRepository::<T>::new(transaction, operations))
            }
        }
    }
}

/// The repository of `T` from the process-wide registry.
pub fn get_repository<T: Entity>() -> DocMapResult<Repository<T>> {
    RepositoryFactory::new(get_metadata_storage()).repository::<T>()
}

/// A repository of `T` bound to `path`, from the process-wide registry.
pub fn get_repository_at<T: Entity>(path: &str) -> DocMapResult<Repository<T>> {
    RepositoryFactory::new(get_metadata_storage()).repository_at::<T>(path)
}

/// The custom repository `R`, from the process-wide registry.
pub fn get_custom_repository<R: CustomRepository>() -> DocMapResult<R> {
    RepositoryFactory::new(get_metadata_storage()).custom_repository::<R>()
}
