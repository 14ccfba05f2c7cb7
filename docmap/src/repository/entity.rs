use std::fmt::{Debug, Formatter};

use crate::common::{Convertible, Document, Value, DEFAULT_ID_FIELD};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::metadata::{MetadataStorage, SubCollectionDescriptor};
use crate::repository::{Repository, RepositoryFactory, RepositoryProvider, StoreScope};

/// A type that maps to documents of a collection.
///
/// Usually derived together with `Convertible`:
///
/// ```rust,ignore
/// #[derive(Entity, Convertible, Default)]
/// #[entity(collection = "articles")]
/// pub struct Post {
///     pub id: Option<String>,
///     pub title: String,
///     pub comments: SubCollection<Comment>,
/// }
/// ```
///
/// The identifier field is never stored as field data; on read it is filled
/// from the document id.
pub trait Entity: Convertible<Output = Self> + Send + Sync + Sized + 'static {
    /// The type name, used for default collection names and validation.
    fn entity_name() -> &'static str;

    /// An explicit collection name overriding the pluralized entity name.
    fn collection_name() -> Option<&'static str> {
        None
    }

    fn id_field() -> &'static str {
        DEFAULT_ID_FIELD
    }

    /// The identifier, if the entity has one.
    fn id(&self) -> Option<&str>;

    /// Names of the properties that hold sub-collections.
    fn sub_collection_keys() -> Vec<&'static str> {
        Vec::new()
    }

    fn sub_collections() -> Vec<SubCollectionDescriptor> {
        Vec::new()
    }

    /// Binds the sub-collection property `property_key` to a repository.
    fn attach_sub_collection(
        &mut self,
        _property_key: &str,
        _binding: SubCollectionBinding,
    ) -> DocMapResult<()> {
        Ok(())
    }
}

/// Field types usable as entity identifiers.
pub trait IdField {
    fn as_id(&self) -> Option<&str>;
}

impl IdField for String {
    fn as_id(&self) -> Option<&str> {
        Some(self.as_str()).filter(|id| !id.is_empty())
    }
}

impl IdField for Option<String> {
    fn as_id(&self) -> Option<&str> {
        self.as_deref().filter(|id| !id.is_empty())
    }
}

/// Everything needed to build the repository of one sub-collection: the
/// registry, the store scope of the parent and the sub-collection path.
#[derive(Clone)]
pub struct SubCollectionBinding {
    storage: MetadataStorage,
    scope: StoreScope,
    path: String,
}

impl SubCollectionBinding {
    pub(crate) fn new(storage: MetadataStorage, scope: StoreScope, path: String) -> Self {
        SubCollectionBinding {
            storage,
            scope,
            path,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Builds a repository for the sub-collection in the parent's scope.
    pub fn bind<U: Entity>(&self) -> DocMapResult<Repository<U>> {
        RepositoryFactory::with_scope(self.storage.clone(), self.scope.clone())
            .repository_at::<U>(&self.path)
    }
}

impl Debug for SubCollectionBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubCollectionBinding")
            .field("path", &self.path)
            .field("transactional", &self.scope.is_transactional())
            .finish()
    }
}

/// Implemented by entity field types that hold a sub-collection.
pub trait SubCollectionField {
    type Entity: Entity;

    fn bind(&mut self, binding: SubCollectionBinding) -> DocMapResult<()>;
}

/// A sub-collection property of an entity.
///
/// Unbound on a freshly constructed entity; bound to a repository at
/// `<parent path>/<parent id>/<name>` whenever the parent is read from or
/// written to the store. Never part of the stored field data.
pub struct SubCollection<U: Entity> {
    repository: Option<Repository<U>>,
}

impl<U: Entity> SubCollection<U> {
    pub fn new() -> Self {
        SubCollection { repository: None }
    }

    pub fn is_bound(&self) -> bool {
        self.repository.is_some()
    }

    pub fn path(&self) -> Option<&str> {
        self.repository.as_ref().map(|r| r.collection_path())
    }

    /// The bound repository.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the parent entity has not been persisted or
    /// loaded yet.
    pub fn repository(&self) -> DocMapResult<&Repository<U>> {
        self.repository.as_ref().ok_or_else(|| {
            log::error!("Sub-collection of {} is not bound to a parent document", U::entity_name());
            DocMapError::new(
                &format!(
                    "Sub-collection of {} is not bound to a parent document",
                    U::entity_name()
                ),
                ErrorKind::InvalidArgument,
            )
        })
    }
}

impl<U: Entity> SubCollectionField for SubCollection<U> {
    type Entity = U;

    fn bind(&mut self, binding: SubCollectionBinding) -> DocMapResult<()> {
        self.repository = Some(binding.bind::<U>()?);
        Ok(())
    }
}

impl<U: Entity> Default for SubCollection<U> {
    fn default() -> Self {
        SubCollection::new()
    }
}

impl<U: Entity> Clone for SubCollection<U> {
    fn clone(&self) -> Self {
        SubCollection {
            repository: self.repository.clone(),
        }
    }
}

impl<U: Entity> PartialEq for SubCollection<U> {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl<U: Entity> Debug for SubCollection<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(path) => write!(f, "SubCollection({})", path),
            None => write!(f, "SubCollection(unbound)"),
        }
    }
}

impl<U: Entity> Convertible for SubCollection<U> {
    type Output = SubCollection<U>;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::Null)
    }

    fn from_value(_value: &Value) -> DocMapResult<Self::Output> {
        Ok(SubCollection::new())
    }
}

/// Untyped access: a plain [Document] is an entity whose id lives in its
/// `id` field.
impl Entity for Document {
    fn entity_name() -> &'static str {
        "Document"
    }

    fn id(&self) -> Option<&str> {
        self.get_ref(DEFAULT_ID_FIELD)
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
    }
}
