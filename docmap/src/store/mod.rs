//! The boundary between the mapping layer and a document database client.
//!
//! Everything the core needs from a store is expressed by [StoreClient] and
//! [StoreTransaction]. Values cross the boundary as the tagged [StoreValue]
//! sum type; the [crate::transcoder] converts them to and from entity-side
//! [crate::common::Value]s.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;

use crate::common::{DocumentReference, GeoPoint, Timestamp};
use crate::errors::DocMapResult;
use crate::query::{Direction, QueryOperator};

mod memory;

pub use memory::*;

/// A value as the store represents it.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
    GeoPoint(GeoPoint),
    Reference(DocumentReference),
    Array(Vec<StoreValue>),
    Map(StoreFields),
}

impl StoreValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreValue::Null => "null",
            StoreValue::Boolean(_) => "boolean",
            StoreValue::Integer(_) => "integer",
            StoreValue::Double(_) => "double",
            StoreValue::String(_) => "string",
            StoreValue::Bytes(_) => "bytes",
            StoreValue::Timestamp(_) => "timestamp",
            StoreValue::GeoPoint(_) => "geopoint",
            StoreValue::Reference(_) => "reference",
            StoreValue::Array(_) => "array",
            StoreValue::Map(_) => "map",
        }
    }
}

impl Display for StoreValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreValue::Null => write!(f, "null"),
            StoreValue::Boolean(b) => write!(f, "{}", b),
            StoreValue::Integer(i) => write!(f, "{}", i),
            StoreValue::Double(d) => write!(f, "{}", d),
            StoreValue::String(s) => write!(f, "\"{}\"", s),
            StoreValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            StoreValue::Timestamp(ts) => write!(f, "Timestamp({}, {})", ts.seconds(), ts.nanos()),
            StoreValue::GeoPoint(p) => write!(f, "GeoPoint({}, {})", p.latitude(), p.longitude()),
            StoreValue::Reference(r) => write!(f, "Reference({})", r.path()),
            StoreValue::Array(items) => write!(f, "<array of {}>", items.len()),
            StoreValue::Map(fields) => write!(f, "<map of {}>", fields.len()),
        }
    }
}

/// The field data of one stored document.
pub type StoreFields = BTreeMap<String, StoreValue>;

/// A document as handed back by a store: its id, its full path
/// (`<collection path>/<id>`) and its field data.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub path: String,
    pub fields: StoreFields,
}

impl RawDocument {
    pub fn new(collection_path: &str, id: &str, fields: StoreFields) -> Self {
        RawDocument {
            id: id.to_string(),
            path: format!("{}/{}", collection_path, id),
            fields,
        }
    }
}

/// One filter of a store query. `field` is a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFilter {
    pub field: String,
    pub operator: QueryOperator,
    pub value: StoreValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreOrder {
    pub field: String,
    pub direction: Direction,
}

/// A query against a single collection path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub filters: Vec<StoreFilter>,
    pub order_by: Vec<StoreOrder>,
    pub limit: Option<usize>,
}

/// A connection to a document database.
///
/// `get_document` and `delete_document` report a missing document with an
/// [crate::errors::ErrorKind::NotFound] error.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Returns a fresh document id for the collection.
    async fn generate_id(&self, collection_path: &str) -> DocMapResult<String>;

    async fn get_document(&self, collection_path: &str, id: &str) -> DocMapResult<RawDocument>;

    /// Creates or fully overwrites a document.
    async fn set_document(
        &self,
        collection_path: &str,
        id: &str,
        fields: StoreFields,
    ) -> DocMapResult<()>;

    async fn delete_document(&self, collection_path: &str, id: &str) -> DocMapResult<()>;

    async fn run_query(
        &self,
        collection_path: &str,
        query: &StoreQuery,
    ) -> DocMapResult<Vec<RawDocument>>;

    async fn begin_transaction(&self) -> DocMapResult<Arc<dyn StoreTransaction>>;
}

/// A unit of work against a store. Reads see the transaction's own writes;
/// writes become visible to others only after [StoreTransaction::commit].
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    async fn generate_id(&self, collection_path: &str) -> DocMapResult<String>;

    async fn get_document(&self, collection_path: &str, id: &str) -> DocMapResult<RawDocument>;

    async fn set_document(
        &self,
        collection_path: &str,
        id: &str,
        fields: StoreFields,
    ) -> DocMapResult<()>;

    async fn delete_document(&self, collection_path: &str, id: &str) -> DocMapResult<()>;

    async fn run_query(
        &self,
        collection_path: &str,
        query: &StoreQuery,
    ) -> DocMapResult<Vec<RawDocument>>;

    async fn commit(&self) -> DocMapResult<()>;

    async fn rollback(&self) -> DocMapResult<()>;

    fn is_active(&self) -> bool;
}
