use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::common::{atomic, last_segment, validate_collection_path, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::metadata::{
    validate_collection_name, CollectionDescriptor, CollectionKey, EntityType,
    MetadataStorageConfig, RepositoryType, SubCollectionDescriptor,
};
use crate::repository::{CustomRepository, Entity, Validator};
use crate::store::StoreClient;

static METADATA_STORAGE: LazyLock<MetadataStorage> = LazyLock::new(MetadataStorage::new);

/// Returns the process-wide registry.
pub fn get_metadata_storage() -> MetadataStorage {
    METADATA_STORAGE.clone()
}

/// Registry of collections, configuration, validator and store connection.
///
/// Cloning is cheap and every clone shares the same state. Use
/// [get_metadata_storage] for the process-wide instance or
/// [MetadataStorage::new] for an isolated one.
#[derive(Clone)]
pub struct MetadataStorage {
    inner: Atomic<MetadataStorageInner>,
}

impl Default for MetadataStorage {
    fn default() -> Self {
        MetadataStorage::new()
    }
}

impl MetadataStorage {
    pub fn new() -> Self {
        MetadataStorage {
            inner: atomic(MetadataStorageInner::default()),
        }
    }

    /// Registers a collection, replacing any earlier one for the same type.
    ///
    /// # Errors
    ///
    /// `MetadataError` when the descriptor has no entity type or its name is
    /// not a single path segment.
    pub fn register_collection(&self, descriptor: CollectionDescriptor) -> DocMapResult<()> {
        let entity_type = match descriptor.entity_type {
            Some(entity_type) => entity_type,
            None => {
                log::error!("Collection '{}' has no entity type", descriptor.name);
                return Err(DocMapError::new(
                    &format!("Collection '{}' has no entity type", descriptor.name),
                    ErrorKind::MetadataError,
                ));
            }
        };
        validate_collection_name(&descriptor.name, entity_type.name())?;
        for sub in &descriptor.sub_collections {
            validate_collection_name(&sub.name, sub.entity_type.name())?;
        }

        log::debug!("Registering collection '{}' for {}", descriptor.name, entity_type);
        self.inner.write_with(|inner| {
            inner.collections.insert(entity_type, descriptor);
        });
        Ok(())
    }

    /// Registers a sub-collection under its parent entity type. The parent
    /// does not need to be registered yet; sub-collections are attached
    /// when the parent collection is looked up.
    pub fn register_sub_collection(&self, descriptor: SubCollectionDescriptor) -> DocMapResult<()> {
        validate_collection_name(&descriptor.name, descriptor.entity_type.name())?;
        if descriptor.property_key.is_empty() {
            log::error!("Sub-collection '{}' has an empty property key", descriptor.name);
            return Err(DocMapError::new(
                &format!("Sub-collection '{}' has an empty property key", descriptor.name),
                ErrorKind::MetadataError,
            ));
        }

        log::debug!(
            "Registering sub-collection '{}' of {} under {}.{}",
            descriptor.name,
            descriptor.entity_type,
            descriptor.parent_entity_type,
            descriptor.property_key
        );
        self.inner.write_with(|inner| {
            let subs = inner
                .sub_collections
                .entry(descriptor.parent_entity_type)
                .or_default();
            subs.retain(|s| s.property_key != descriptor.property_key);
            subs.push(descriptor);
        });
        Ok(())
    }

    /// Binds a custom repository type to an entity type.
    pub fn register_custom_repository(&self, entity_type: EntityType, repository_type: RepositoryType) {
        log::debug!("Registering {:?} for {}", repository_type, entity_type);
        self.inner.write_with(|inner| {
            inner.custom_repositories.insert(entity_type, repository_type);
        });
    }

    /// Typed form of [MetadataStorage::register_custom_repository].
    pub fn register_custom_repository_for<R: CustomRepository>(&self) {
        self.register_custom_repository(EntityType::of::<R::Entity>(), RepositoryType::of::<R>());
    }

    /// Registers the collection of `T` and every sub-collection it declares.
    ///
    /// The collection name comes from the entity's declared collection name,
    /// or the pluralized entity name.
    ///
    /// # Errors
    ///
    /// `MetadataError` when a declared sub-collection names a property the
    /// entity does not have.
    pub fn register_entity<T: Entity>(&self) -> DocMapResult<()> {
        let entity_type = EntityType::of::<T>();
        let descriptor = match T::collection_name() {
            Some(name) => CollectionDescriptor::new(name, entity_type),
            None => CollectionDescriptor::with_default_name(entity_type),
        };

        let keys = T::sub_collection_keys();
        let subs = T::sub_collections();
        for sub in &subs {
            if !keys.contains(&sub.property_key.as_str()) {
                log::error!(
                    "{} has no sub-collection property '{}'",
                    entity_type,
                    sub.property_key
                );
                return Err(DocMapError::new(
                    &format!("{} has no sub-collection property '{}'", entity_type, sub.property_key),
                    ErrorKind::MetadataError,
                ));
            }
        }

        self.register_collection(descriptor)?;
        for sub in subs {
            self.register_sub_collection(sub)?;
        }
        Ok(())
    }

    /// Looks up a collection descriptor with its sub-collections attached.
    ///
    /// An entity type resolves to its registered collection, or to the
    /// sub-collection it is registered as. A path resolves to an ad-hoc
    /// descriptor named after its last segment.
    ///
    /// # Errors
    ///
    /// `UnregisteredCollection` when an entity type is unknown.
    pub fn get_collection(&self, key: &CollectionKey) -> DocMapResult<CollectionDescriptor> {
        match key {
            CollectionKey::Entity(entity_type) => {
                self.find_collection(entity_type).ok_or_else(|| {
                    log::error!("No collection is registered for {}", entity_type);
                    DocMapError::new(
                        &format!("No collection is registered for {}", entity_type),
                        ErrorKind::UnregisteredCollection,
                    )
                })
            }
            CollectionKey::Path(path) => {
                validate_collection_path(path)?;
                Ok(CollectionDescriptor::ad_hoc(last_segment(path)))
            }
        }
    }

    /// Entity lookup of [MetadataStorage::get_collection] without the error.
    pub fn find_collection(&self, entity_type: &EntityType) -> Option<CollectionDescriptor> {
        self.inner.read_with(|inner| {
            if let Some(descriptor) = inner.collections.get(entity_type) {
                return Some(inner.resolve(descriptor.clone()));
            }

            inner
                .sub_collections
                .values()
                .flatten()
                .find(|s| &s.entity_type == entity_type)
                .map(|sub| inner.resolve(CollectionDescriptor::new(&sub.name, *entity_type)))
        })
    }

    pub fn is_registered(&self, entity_type: &EntityType) -> bool {
        self.find_collection(entity_type).is_some()
    }

    pub fn set_config(&self, config: MetadataStorageConfig) {
        self.inner.write_with(|inner| inner.config = config);
    }

    pub fn config(&self) -> MetadataStorageConfig {
        self.inner.read_with(|inner| inner.config)
    }

    pub fn set_validator(&self, validator: Arc<dyn Validator>) {
        self.inner.write_with(|inner| inner.validator = Some(validator));
    }

    pub fn clear_validator(&self) {
        self.inner.write_with(|inner| inner.validator = None);
    }

    pub fn validator(&self) -> Option<Arc<dyn Validator>> {
        self.inner.read_with(|inner| inner.validator.clone())
    }

    pub fn set_store(&self, store: Arc<dyn StoreClient>) {
        self.inner.write_with(|inner| inner.store = Some(store));
    }

    /// The bound store connection.
    ///
    /// # Errors
    ///
    /// `UninitializedStore` before a store is bound.
    pub fn store(&self) -> DocMapResult<Arc<dyn StoreClient>> {
        self.inner.read_with(|inner| inner.store.clone()).ok_or_else(|| {
            log::error!("No store is bound, call initialize first");
            DocMapError::new(
                "No store is bound, call initialize first",
                ErrorKind::UninitializedStore,
            )
        })
    }

    /// Forgets every registration, the configuration, the validator and the
    /// store binding.
    pub fn reset(&self) {
        self.inner.write_with(|inner| *inner = MetadataStorageInner::default());
    }
}

#[derive(Default)]
struct MetadataStorageInner {
    collections: HashMap<EntityType, CollectionDescriptor>,
    // keyed by parent entity type
    sub_collections: HashMap<EntityType, Vec<SubCollectionDescriptor>>,
    custom_repositories: HashMap<EntityType, RepositoryType>,
    config: MetadataStorageConfig,
    validator: Option<Arc<dyn Validator>>,
    store: Option<Arc<dyn StoreClient>>,
}

impl MetadataStorageInner {
    fn resolve(&self, mut descriptor: CollectionDescriptor) -> CollectionDescriptor {
        let entity_type = match descriptor.entity_type {
            Some(entity_type) => entity_type,
            None => return descriptor,
        };

        if let Some(subs) = self.sub_collections.get(&entity_type) {
            for sub in subs {
                descriptor
                    .sub_collections
                    .retain(|s| s.property_key != sub.property_key);
                descriptor.sub_collections.push(sub.clone());
            }
        }
        if let Some(repository_type) = self.custom_repositories.get(&entity_type) {
            descriptor.custom_repository = Some(*repository_type);
        }
        descriptor
    }
}
