use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, FIELD_SEPARATOR};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::query::{Direction, QueryOperator};
use crate::store::{
    RawDocument, StoreClient, StoreFields, StoreFilter, StoreQuery, StoreTransaction, StoreValue,
};

/// In-memory implementation of a document store.
///
/// Collections are addressed by their full slash-separated path, so
/// sub-collections (`posts/p1/comments`) are just further entries of the
/// same registry. Queries support every [QueryOperator] on dotted field
/// paths, multi-key ordering and a server-side limit.
///
/// The store also records every query it runs, which lets tests assert
/// what reached the store.
///
/// ```rust,ignore
/// let store = InMemoryStore::new();
/// docmap::initialize(Arc::new(store.clone()), MetadataStorageConfig::default());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::default()),
        }
    }

    /// Number of documents stored under a collection path.
    pub fn document_count(&self, collection_path: &str) -> usize {
        self.inner
            .collections
            .get(collection_path)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Number of store calls served so far (reads, writes and queries).
    pub fn operation_count(&self) -> usize {
        self.inner.operations.load(AtomicOrdering::SeqCst)
    }

    /// Every query run so far, with the collection path it targeted.
    pub fn executed_queries(&self) -> Vec<(String, StoreQuery)> {
        self.inner.queries.read_with(|queries| queries.clone())
    }

    /// Removes all documents and recorded queries.
    pub fn clear(&self) {
        let _gate = self.inner.commit_gate.write();
        self.inner.collections.clear();
        self.inner.queries.write_with(|queries| queries.clear());
        self.inner.operations.store(0, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn generate_id(&self, _collection_path: &str) -> DocMapResult<String> {
        Ok(self.inner.generate_id())
    }

    async fn get_document(&self, collection_path: &str, id: &str) -> DocMapResult<RawDocument> {
        self.inner.get_document(collection_path, id)
    }

    async fn set_document(
        &self,
        collection_path: &str,
        id: &str,
        fields: StoreFields,
    ) -> DocMapResult<()> {
        self.inner.set_document(collection_path, id, fields)
    }

    async fn delete_document(&self, collection_path: &str, id: &str) -> DocMapResult<()> {
        self.inner.delete_document(collection_path, id)
    }

    async fn run_query(
        &self,
        collection_path: &str,
        query: &StoreQuery,
    ) -> DocMapResult<Vec<RawDocument>> {
        self.inner.run_query(collection_path, query, &BTreeMap::new())
    }

    async fn begin_transaction(&self) -> DocMapResult<Arc<dyn StoreTransaction>> {
        log::debug!("Beginning in-memory transaction");
        Ok(Arc::new(InMemoryTransaction::new(self.clone())))
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    collections: DashMap<String, BTreeMap<String, StoreFields>>,
    // direct calls share the gate, a commit takes it exclusively
    commit_gate: RwLock<()>,
    queries: Atomic<Vec<(String, StoreQuery)>>,
    operations: AtomicUsize,
}

impl InMemoryStoreInner {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn get_document(&self, collection_path: &str, id: &str) -> DocMapResult<RawDocument> {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        let _gate = self.commit_gate.read();
        self.committed(collection_path, id)
            .map(|fields| RawDocument::new(collection_path, id, fields))
            .ok_or_else(|| not_found(collection_path, id))
    }

    fn set_document(&self, collection_path: &str, id: &str, fields: StoreFields) -> DocMapResult<()> {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        let _gate = self.commit_gate.read();
        self.collections
            .entry(collection_path.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    fn delete_document(&self, collection_path: &str, id: &str) -> DocMapResult<()> {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        let _gate = self.commit_gate.read();
        let removed = self
            .collections
            .get_mut(collection_path)
            .and_then(|mut collection| collection.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(not_found(collection_path, id)),
        }
    }

    fn run_query(
        &self,
        collection_path: &str,
        query: &StoreQuery,
        overlay: &BTreeMap<String, Option<StoreFields>>,
    ) -> DocMapResult<Vec<RawDocument>> {
        self.operations.fetch_add(1, AtomicOrdering::SeqCst);
        self.queries
            .write_with(|queries| queries.push((collection_path.to_string(), query.clone())));

        let mut documents = {
            let _gate = self.commit_gate.read();
            self.collections
                .get(collection_path)
                .map(|c| c.clone())
                .unwrap_or_default()
        };
        for (id, write) in overlay {
            match write {
                Some(fields) => {
                    documents.insert(id.clone(), fields.clone());
                }
                None => {
                    documents.remove(id);
                }
            }
        }

        let result = evaluate_query(collection_path, documents, query);
        log::debug!(
            "Query on '{}' with {} filter(s) returned {} document(s)",
            collection_path,
            query.filters.len(),
            result.len()
        );
        Ok(result)
    }

    fn committed(&self, collection_path: &str, id: &str) -> Option<StoreFields> {
        self.collections
            .get(collection_path)
            .and_then(|collection| collection.get(id).cloned())
    }

    fn apply(&self, writes: BTreeMap<(String, String), Option<StoreFields>>) {
        let _gate = self.commit_gate.write();
        for ((path, id), write) in writes {
            match write {
                Some(fields) => {
                    self.collections.entry(path).or_default().insert(id, fields);
                }
                None => {
                    if let Some(mut collection) = self.collections.get_mut(&path) {
                        collection.remove(&id);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// A transaction over an [InMemoryStore].
///
/// Writes are buffered and applied in one step on commit. Reads see the
/// committed state overlaid with the transaction's own writes.
#[derive(Clone)]
pub struct InMemoryTransaction {
    inner: Arc<InMemoryTransactionInner>,
}

struct InMemoryTransactionInner {
    store: InMemoryStore,
    // state and writes share one lock so a write cannot slip past a commit
    buffer: Atomic<TransactionBuffer>,
}

struct TransactionBuffer {
    state: TransactionState,
    // `None` marks a buffered delete
    writes: BTreeMap<(String, String), Option<StoreFields>>,
}

impl TransactionBuffer {
    fn ensure_active(&self) -> DocMapResult<()> {
        if self.state != TransactionState::Active {
            log::error!("Transaction is no longer active ({:?})", self.state);
            return Err(DocMapError::new(
                &format!("Transaction is no longer active ({:?})", self.state),
                ErrorKind::TransactionError,
            ));
        }
        Ok(())
    }

    /// Marks the transaction complete and hands back its writes.
    fn complete(
        &mut self,
        state: TransactionState,
    ) -> DocMapResult<BTreeMap<(String, String), Option<StoreFields>>> {
        self.ensure_active()?;
        self.state = state;
        Ok(std::mem::take(&mut self.writes))
    }
}

impl InMemoryTransaction {
    fn new(store: InMemoryStore) -> Self {
        InMemoryTransaction {
            inner: Arc::new(InMemoryTransactionInner {
                store,
                buffer: atomic(TransactionBuffer {
                    state: TransactionState::Active,
                    writes: BTreeMap::new(),
                }),
            }),
        }
    }
}

impl InMemoryTransactionInner {
    fn ensure_active(&self) -> DocMapResult<()> {
        self.buffer.read_with(|buffer| buffer.ensure_active())
    }

    fn buffered(&self, collection_path: &str, id: &str) -> DocMapResult<Option<Option<StoreFields>>> {
        self.buffer.read_with(|buffer| {
            buffer.ensure_active()?;
            Ok(buffer
                .writes
                .get(&(collection_path.to_string(), id.to_string()))
                .cloned())
        })
    }

    fn buffer_write(&self, collection_path: &str, id: &str, write: Option<StoreFields>) -> DocMapResult<()> {
        self.buffer.write_with(|buffer| {
            buffer.ensure_active()?;
            buffer
                .writes
                .insert((collection_path.to_string(), id.to_string()), write);
            Ok(())
        })
    }

    fn get_document(&self, collection_path: &str, id: &str) -> DocMapResult<RawDocument> {
        let fields = match self.buffered(collection_path, id)? {
            Some(write) => write,
            None => {
                self.store.inner.operations.fetch_add(1, AtomicOrdering::SeqCst);
                self.store.inner.committed(collection_path, id)
            }
        };
        fields
            .map(|fields| RawDocument::new(collection_path, id, fields))
            .ok_or_else(|| not_found(collection_path, id))
    }

    fn set_document(&self, collection_path: &str, id: &str, fields: StoreFields) -> DocMapResult<()> {
        self.buffer_write(collection_path, id, Some(fields))
    }

    fn delete_document(&self, collection_path: &str, id: &str) -> DocMapResult<()> {
        self.get_document(collection_path, id)?;
        self.buffer_write(collection_path, id, None)
    }

    fn run_query(&self, collection_path: &str, query: &StoreQuery) -> DocMapResult<Vec<RawDocument>> {
        let overlay: BTreeMap<String, Option<StoreFields>> = self.buffer.read_with(|buffer| {
            buffer.ensure_active()?;
            Ok::<_, DocMapError>(
                buffer
                    .writes
                    .iter()
                    .filter(|((path, _), _)| path == collection_path)
                    .map(|((_, id), write)| (id.clone(), write.clone()))
                    .collect(),
            )
        })?;
        self.store.inner.run_query(collection_path, query, &overlay)
    }

    fn commit(&self) -> DocMapResult<()> {
        let writes = self
            .buffer
            .write_with(|buffer| buffer.complete(TransactionState::Committed))?;
        log::debug!("Committing in-memory transaction with {} write(s)", writes.len());
        self.store.inner.apply(writes);
        Ok(())
    }

    fn rollback(&self) -> DocMapResult<()> {
        self.buffer
            .write_with(|buffer| buffer.complete(TransactionState::RolledBack))?;
        log::debug!("Rolled back in-memory transaction");
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn generate_id(&self, _collection_path: &str) -> DocMapResult<String> {
        self.inner.ensure_active()?;
        Ok(self.inner.store.inner.generate_id())
    }

    async fn get_document(&self, collection_path: &str, id: &str) -> DocMapResult<RawDocument> {
        self.inner.get_document(collection_path, id)
    }

    async fn set_document(
        &self,
        collection_path: &str,
        id: &str,
        fields: StoreFields,
    ) -> DocMapResult<()> {
        self.inner.set_document(collection_path, id, fields)
    }

    async fn delete_document(&self, collection_path: &str, id: &str) -> DocMapResult<()> {
        self.inner.delete_document(collection_path, id)
    }

    async fn run_query(
        &self,
        collection_path: &str,
        query: &StoreQuery,
    ) -> DocMapResult<Vec<RawDocument>> {
        self.inner.run_query(collection_path, query)
    }

    async fn commit(&self) -> DocMapResult<()> {
        self.inner.commit()
    }

    async fn rollback(&self) -> DocMapResult<()> {
        self.inner.rollback()
    }

    fn is_active(&self) -> bool {
        self.inner
            .buffer
            .read_with(|buffer| buffer.state == TransactionState::Active)
    }
}

fn not_found(collection_path: &str, id: &str) -> DocMapError {
    log::debug!("Document '{}/{}' not found", collection_path, id);
    DocMapError::new(
        &format!("Document '{}/{}' not found", collection_path, id),
        ErrorKind::NotFound,
    )
}

fn evaluate_query(
    collection_path: &str,
    documents: BTreeMap<String, StoreFields>,
    query: &StoreQuery,
) -> Vec<RawDocument> {
    let mut matched: Vec<(String, StoreFields)> = documents
        .into_iter()
        .filter(|(_, fields)| query.filters.iter().all(|filter| matches_filter(fields, filter)))
        .filter(|(_, fields)| {
            query
                .order_by
                .iter()
                .all(|order| lookup_field(fields, &order.field).is_some())
        })
        .collect();

    if !query.order_by.is_empty() {
        // stable, so ties keep document id order
        matched.sort_by(|(_, a), (_, b)| {
            for order in &query.order_by {
                let ordering = match (lookup_field(a, &order.field), lookup_field(b, &order.field)) {
                    (Some(x), Some(y)) => compare_store_values(x, y),
                    _ => Ordering::Equal,
                };
                let ordering = match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    let limit = query.limit.unwrap_or(usize::MAX);
    matched
        .into_iter()
        .take(limit)
        .map(|(id, fields)| RawDocument::new(collection_path, &id, fields))
        .collect()
}

fn lookup_field<'a>(fields: &'a StoreFields, path: &str) -> Option<&'a StoreValue> {
    let mut segments = path.split(FIELD_SEPARATOR);
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            StoreValue::Map(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn matches_filter(fields: &StoreFields, filter: &StoreFilter) -> bool {
    let actual = match lookup_field(fields, &filter.field) {
        Some(value) => value,
        None => return false,
    };

    if filter.operator == QueryOperator::ArrayContains {
        return match actual {
            StoreValue::Array(items) => items.iter().any(|item| {
                type_rank(item) == type_rank(&filter.value)
                    && compare_store_values(item, &filter.value) == Ordering::Equal
            }),
            _ => false,
        };
    }

    // range and equality filters only match values of the same type class
    if type_rank(actual) != type_rank(&filter.value) {
        return false;
    }
    let ordering = compare_store_values(actual, &filter.value);
    match filter.operator {
        QueryOperator::Equal => ordering == Ordering::Equal,
        QueryOperator::LessThan => ordering == Ordering::Less,
        QueryOperator::LessOrEqual => ordering != Ordering::Greater,
        QueryOperator::GreaterThan => ordering == Ordering::Greater,
        QueryOperator::GreaterOrEqual => ordering != Ordering::Less,
        QueryOperator::ArrayContains => false,
    }
}

fn type_rank(value: &StoreValue) -> u8 {
    match value {
        StoreValue::Null => 0,
        StoreValue::Boolean(_) => 1,
        StoreValue::Integer(_) | StoreValue::Double(_) => 2,
        StoreValue::Timestamp(_) => 3,
        StoreValue::String(_) => 4,
        StoreValue::Bytes(_) => 5,
        StoreValue::Reference(_) => 6,
        StoreValue::GeoPoint(_) => 7,
        StoreValue::Array(_) => 8,
        StoreValue::Map(_) => 9,
    }
}

/// Total order over store values: first by type class, then by value.
/// Integers and doubles form one numeric class.
fn compare_store_values(a: &StoreValue, b: &StoreValue) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }

    match (a, b) {
        (StoreValue::Boolean(x), StoreValue::Boolean(y)) => x.cmp(y),
        (StoreValue::Integer(x), StoreValue::Integer(y)) => x.cmp(y),
        (StoreValue::Integer(x), StoreValue::Double(y)) => compare_f64(*x as f64, *y),
        (StoreValue::Double(x), StoreValue::Integer(y)) => compare_f64(*x, *y as f64),
        (StoreValue::Double(x), StoreValue::Double(y)) => compare_f64(*x, *y),
        (StoreValue::Timestamp(x), StoreValue::Timestamp(y)) => x.cmp(y),
        (StoreValue::String(x), StoreValue::String(y)) => x.cmp(y),
        (StoreValue::Bytes(x), StoreValue::Bytes(y)) => x.cmp(y),
        (StoreValue::Reference(x), StoreValue::Reference(y)) => x.path().cmp(y.path()),
        (StoreValue::GeoPoint(x), StoreValue::GeoPoint(y)) => {
            compare_f64(x.latitude(), y.latitude())
                .then_with(|| compare_f64(x.longitude(), y.longitude()))
        }
        (StoreValue::Array(x), StoreValue::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_store_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (StoreValue::Map(x), StoreValue::Map(y)) => {
            for ((left_key, left), (right_key, right)) in x.iter().zip(y.iter()) {
                let ordering = left_key
                    .cmp(right_key)
                    .then_with(|| compare_store_values(left, right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

fn compare_f64(x: f64, y: f64) -> Ordering {
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}
