use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::common::Value;
use crate::errors::DocMapResult;
use crate::metadata::CollectionDescriptor;
use crate::query::{FieldPath, QueryBuilder, QueryExecutor, QuerySpec};
use crate::repository::{Entity, ValidationViolation};

/// The operations a repository strategy provides over one collection path.
///
/// Two strategies exist: direct store access and transaction-scoped access.
/// Application code uses them through the [Repository] facade.
#[async_trait]
pub trait RepositoryProvider<T: Entity>: QueryExecutor<T> {
    /// Full slash-separated path of the bound collection.
    fn collection_path(&self) -> &str;

    fn descriptor(&self) -> &CollectionDescriptor;

    fn is_transactional(&self) -> bool;

    /// Reads one entity. A missing document is `Ok(None)`.
    async fn find_by_id(&self, id: &str) -> DocMapResult<Option<T>>;

    /// Writes a new entity, generating an id when it has none, and returns
    /// the persisted entity.
    async fn create(&self, item: &T) -> DocMapResult<T>;

    /// Overwrites an existing entity. The entity must carry an id.
    async fn update(&self, item: &T) -> DocMapResult<T>;

    /// Deletes by id. Deleting a missing document succeeds.
    async fn delete(&self, id: &str) -> DocMapResult<()>;

    /// Runs the configured validator without writing anything.
    fn validate(&self, item: &T) -> DocMapResult<Vec<ValidationViolation>>;
}

/// A typed repository bound to one collection path.
///
/// Cheap to clone. Query entry points return a fresh [QueryBuilder]:
///
/// ```rust,ignore
/// let users = get_repository::<User>()?;
/// let created = users.create(&User::new("Ann", 34)).await?;
/// let adults = users.where_greater_or_equal_than("age", 18).find().await?;
/// let found = users.find_by_id(created.id().unwrap_or_default()).await?;
/// ```
pub struct Repository<T: Entity> {
    inner: Arc<dyn RepositoryProvider<T>>,
}

impl<T: Entity> Repository<T> {
    pub fn new<P: RepositoryProvider<T> + 'static>(provider: P) -> Self {
        Repository {
            inner: Arc::new(provider),
        }
    }

    /// An empty query over the whole collection.
    pub fn query(&self) -> QueryBuilder<T, Repository<T>> {
        QueryBuilder::new(self.clone())
    }

    pub fn where_equal_to(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> QueryBuilder<T, Repository<T>> {
        self.query().where_equal_to(field, value)
    }

    pub fn where_greater_than(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> QueryBuilder<T, Repository<T>> {
        self.query().where_greater_than(field, value)
    }

    pub fn where_greater_or_equal_than(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> QueryBuilder<T, Repository<T>> {
        self.query().where_greater_or_equal_than(field, value)
    }

    pub fn where_less_than(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> QueryBuilder<T, Repository<T>> {
        self.query().where_less_than(field, value)
    }

    pub fn where_less_or_equal_than(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> QueryBuilder<T, Repository<T>> {
        self.query().where_less_or_equal_than(field, value)
    }

    pub fn where_array_contains(
        &self,
        field: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> QueryBuilder<T, Repository<T>> {
        self.query().where_array_contains(field, value)
    }

    pub fn limit(&self, limit: i64) -> DocMapResult<QueryBuilder<T, Repository<T>>> {
        self.query().limit(limit)
    }

    pub fn order_by_ascending(&self, field: impl Into<FieldPath>) -> QueryBuilder<T, Repository<T>> {
        self.query().order_by_ascending(field)
    }

    pub fn order_by_descending(&self, field: impl Into<FieldPath>) -> QueryBuilder<T, Repository<T>> {
        self.query().order_by_descending(field)
    }

    /// Every entity of the collection.
    pub async fn find(&self) -> DocMapResult<Vec<T>> {
        self.inner.execute(&QuerySpec::new(), false).await
    }

    /// The first entity of the collection, if any.
    pub async fn find_one(&self) -> DocMapResult<Option<T>> {
        let results = self.inner.execute(&QuerySpec::new(), true).await?;
        Ok(results.into_iter().next())
    }
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Entity> Deref for Repository<T> {
    type Target = Arc<dyn RepositoryProvider<T>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: Entity> Debug for Repository<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &T::entity_name())
            .field("path", &self.inner.collection_path())
            .field("transactional", &self.inner.is_transactional())
            .finish()
    }
}

#[async_trait]
impl<T: Entity> QueryExecutor<T> for Repository<T> {
    async fn execute(&self, spec: &QuerySpec, single: bool) -> DocMapResult<Vec<T>> {
        self.inner.execute(spec, single).await
    }
}

/// A user-defined repository wrapping the typed repository of its entity.
///
/// ```rust,ignore
/// struct UserRepository(Repository<User>);
///
/// impl CustomRepository for UserRepository {
///     type Entity = User;
///
///     fn from_repository(repository: Repository<User>) -> Self {
///         UserRepository(repository)
///     }
/// }
/// ```
pub trait CustomRepository: Sized + Send + Sync + 'static {
    type Entity: Entity;

    fn from_repository(repository: Repository<Self::Entity>) -> Self;
}
