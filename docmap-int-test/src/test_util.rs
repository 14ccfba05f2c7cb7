use std::future::Future;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, TimeZone, Utc};
use docmap::common::Document;
use docmap::errors::DocMapResult;
use docmap::metadata::{get_metadata_storage, MetadataStorage, MetadataStorageConfig};
use docmap::repository::{
    CustomRepository, Entity, Repository, RepositoryFactory, RepositoryProvider, ValidationViolation,
    Validator,
};
use docmap::store::InMemoryStore;
use docmap::transaction::Transaction;

use crate::entities::{Account, Post, User};

/// Serializes tests that touch the process-wide registry.
pub static GLOBAL_REGISTRY_LOCK: LazyLock<tokio::sync::Mutex<()>> =
    LazyLock::new(|| tokio::sync::Mutex::new(()));

/// Runs a test against a fresh context and fails with the error it returns.
pub async fn run_test<B, T, Fut>(before: B, test: T)
where
    B: FnOnce() -> DocMapResult<TestContext>,
    T: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = DocMapResult<()>>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };
    if let Err(e) = test(ctx.clone()).await {
        panic!("Test failed: {:?}", e);
    }
}

/// An isolated registry bound to its own in-memory store.
#[derive(Clone)]
pub struct TestContext {
    store: InMemoryStore,
    storage: MetadataStorage,
}

impl TestContext {
    pub fn new(store: InMemoryStore, storage: MetadataStorage) -> Self {
        TestContext { store, storage }
    }

    pub fn store(&self) -> InMemoryStore {
        self.store.clone()
    }

    pub fn storage(&self) -> MetadataStorage {
        self.storage.clone()
    }

    pub fn factory(&self) -> RepositoryFactory {
        RepositoryFactory::new(self.storage.clone())
    }

    pub fn repository<T: Entity>(&self) -> DocMapResult<Repository<T>> {
        self.factory().repository::<T>()
    }

    pub fn repository_at<T: Entity>(&self, path: &str) -> DocMapResult<Repository<T>> {
        self.factory().repository_at::<T>(path)
    }

    pub fn custom_repository<R: CustomRepository>(&self) -> DocMapResult<R> {
        self.factory().custom_repository::<R>()
    }

    pub async fn begin_transaction(&self) -> DocMapResult<Transaction> {
        Transaction::begin(self.storage.clone()).await
    }
}

fn register_entities(storage: &MetadataStorage) -> DocMapResult<()> {
    storage.register_entity::<User>()?;
    storage.register_entity::<Post>()?;
    storage.register_entity::<Account>()?;
    Ok(())
}

/// A context with validation switched off and the sample entities
/// registered.
pub fn create_test_context() -> DocMapResult<TestContext> {
    create_context_with(MetadataStorageConfig::new().validate_models(false), None)
}

/// A context validating with [user_validator].
pub fn create_validating_context() -> DocMapResult<TestContext> {
    create_context_with(MetadataStorageConfig::new(), Some(user_validator()))
}

pub fn create_context_with(
    config: MetadataStorageConfig,
    validator: Option<Arc<dyn Validator>>,
) -> DocMapResult<TestContext> {
    let store = InMemoryStore::new();
    let storage = MetadataStorage::new();
    storage.set_config(config);
    storage.set_store(Arc::new(store.clone()));
    if let Some(validator) = validator {
        storage.set_validator(validator);
    }
    register_entities(&storage)?;
    Ok(TestContext::new(store, storage))
}

/// Resets the process-wide registry, binds it to a new in-memory store and
/// registers the sample entities. Hold [GLOBAL_REGISTRY_LOCK] while using it.
pub fn initialize_global(config: MetadataStorageConfig) -> DocMapResult<InMemoryStore> {
    let store = InMemoryStore::new();
    let storage = get_metadata_storage();
    storage.reset();
    docmap::initialize(Arc::new(store.clone()), config);
    register_entities(&storage)?;
    Ok(store)
}

/// Requires a non-empty user name and a non-negative age.
pub fn user_validator() -> Arc<dyn Validator> {
    Arc::new(|entity_name: &str, document: &Document| {
        let mut violations = Vec::new();
        if entity_name != "User" {
            return violations;
        }
        if document.get("name").as_str().map_or(true, str::is_empty) {
            violations.push(ValidationViolation::new("name", "not_empty", "name must not be empty"));
        }
        if document.get("age").as_i64().is_some_and(|age| age < 0) {
            violations.push(ValidationViolation::new("age", "min", "age must be at least 0"));
        }
        violations
    })
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn sample_users() -> Vec<User> {
    vec![
        User::new("Ann", 34).with_tags(&["admin", "staff"]).living_in("Oslo"),
        User::new("Bob", 17).with_tags(&["staff"]).living_in("Bergen"),
        User::new("Cid", 52).living_in("Oslo"),
        User::new("Dee", 25).with_tags(&["guest"]),
        User::new("Eve", 41).with_tags(&["admin"]).living_in("Tromso"),
    ]
}

pub async fn insert_sample_users(repository: &Repository<User>) -> DocMapResult<Vec<User>> {
    let mut created = Vec::new();
    for user in sample_users() {
        created.push(repository.create(&user).await?);
    }
    Ok(created)
}

pub fn is_sorted<T: PartialOrd>(items: &[T], ascending: bool) -> bool {
    items.windows(2).all(|pair| {
        if ascending {
            pair[0] <= pair[1]
        } else {
            pair[0] >= pair[1]
        }
    })
}
