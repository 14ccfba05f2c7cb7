use std::any::TypeId;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::common::{collection_name_for, PATH_SEPARATOR};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::repository::{CustomRepository, Entity};

/// Runtime identity of an entity type. Two values are equal when they name
/// the same Rust type; the name is carried for messages and defaults.
#[derive(Clone, Copy)]
pub struct EntityType {
    type_id: TypeId,
    name: &'static str,
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        EntityType {
            type_id: TypeId::of::<T>(),
            name: T::entity_name(),
        }
    }

    /// An entity type for any `'static` type under an explicit name.
    pub fn named<T: 'static>(name: &'static str) -> Self {
        EntityType {
            type_id: TypeId::of::<T>(),
            name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl Debug for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Runtime identity of a custom repository type.
#[derive(Clone, Copy)]
pub struct RepositoryType {
    type_id: TypeId,
    name: &'static str,
}

impl RepositoryType {
    pub fn of<R: CustomRepository>() -> Self {
        RepositoryType {
            type_id: TypeId::of::<R>(),
            name: std::any::type_name::<R>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for RepositoryType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RepositoryType {}

impl Debug for RepositoryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RepositoryType({})", self.name)
    }
}

/// Describes a sub-collection living under each document of a parent
/// collection, exposed on the parent entity through `property_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCollectionDescriptor {
    pub name: String,
    pub entity_type: EntityType,
    pub parent_entity_type: EntityType,
    pub property_key: String,
}

impl SubCollectionDescriptor {
    pub fn new(
        name: &str,
        entity_type: EntityType,
        parent_entity_type: EntityType,
        property_key: &str,
    ) -> Self {
        SubCollectionDescriptor {
            name: name.to_string(),
            entity_type,
            parent_entity_type,
            property_key: property_key.to_string(),
        }
    }

    /// A descriptor named after the pluralized child entity name.
    pub fn with_default_name(
        entity_type: EntityType,
        parent_entity_type: EntityType,
        property_key: &str,
    ) -> Self {
        SubCollectionDescriptor::new(
            &collection_name_for(entity_type.name()),
            entity_type,
            parent_entity_type,
            property_key,
        )
    }
}

/// Describes a top-level collection and what lives beneath it.
///
/// `entity_type` is `None` only for ad-hoc descriptors synthesized from a
/// literal collection path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescriptor {
    pub name: String,
    pub entity_type: Option<EntityType>,
    pub sub_collections: Vec<SubCollectionDescriptor>,
    pub custom_repository: Option<RepositoryType>,
}

impl CollectionDescriptor {
    pub fn new(name: &str, entity_type: EntityType) -> Self {
        CollectionDescriptor {
            name: name.to_string(),
            entity_type: Some(entity_type),
            sub_collections: Vec::new(),
            custom_repository: None,
        }
    }

    /// A descriptor named after the pluralized entity name.
    pub fn with_default_name(entity_type: EntityType) -> Self {
        CollectionDescriptor::new(&collection_name_for(entity_type.name()), entity_type)
    }

    pub(crate) fn ad_hoc(name: &str) -> Self {
        CollectionDescriptor {
            name: name.to_string(),
            entity_type: None,
            sub_collections: Vec::new(),
            custom_repository: None,
        }
    }

    pub fn sub_collection(mut self, descriptor: SubCollectionDescriptor) -> Self {
        self.sub_collections.push(descriptor);
        self
    }
}

/// How a collection is looked up in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionKey {
    Entity(EntityType),
    Path(String),
}

impl From<EntityType> for CollectionKey {
    fn from(entity_type: EntityType) -> Self {
        CollectionKey::Entity(entity_type)
    }
}

impl From<&str> for CollectionKey {
    fn from(path: &str) -> Self {
        CollectionKey::Path(path.to_string())
    }
}

pub(crate) fn validate_collection_name(name: &str, owner: &str) -> DocMapResult<()> {
    if name.is_empty() || name.contains(PATH_SEPARATOR) {
        log::error!("Collection name '{}' of {} must be a single non-empty path segment", name, owner);
        return Err(DocMapError::new(
            &format!(
                "Collection name '{}' of {} must be a single non-empty path segment",
                name, owner
            ),
            ErrorKind::MetadataError,
        ));
    }
    Ok(())
}
