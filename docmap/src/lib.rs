#![allow(clippy::new_without_default)]
//! # DocMap - Typed Object Mapping for Document Databases
//!
//! DocMap maps Rust types onto the collections of a remote document
//! database. It keeps a registry of entity types and their collections,
//! converts values between the application and the store, and exposes typed
//! repositories with an immutable, fluent query builder.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use docmap::metadata::{get_metadata_storage, MetadataStorageConfig};
//! use docmap::repository::get_repository;
//! use docmap::store::InMemoryStore;
//! use docmap_derive::{Convertible, Entity};
//!
//! #[derive(Entity, Convertible, Default)]
//! pub struct User {
//!     pub id: Option<String>,
//!     pub name: String,
//!     pub age: i64,
//! }
//!
//! docmap::initialize(
//!     Arc::new(InMemoryStore::new()),
//!     MetadataStorageConfig::new().validate_models(false),
//! );
//! get_metadata_storage().register_entity::<User>()?;
//!
//! let users = get_repository::<User>()?;
//! users.create(&User { name: "Ann".into(), age: 34, ..Default::default() }).await?;
//! let adults = users.where_greater_or_equal_than("age", 18).find().await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Values, documents, conversion traits and naming helpers
//! - [`errors`] - Error types and result definitions
//! - [`metadata`] - The registry of collections, configuration and store binding
//! - [`query`] - Immutable query composition
//! - [`repository`] - Typed repositories, entities and sub-collections
//! - [`store`] - The store boundary and an in-memory store
//! - [`transaction`] - Transactions spanning several repositories
//! - [`transcoder`] - Conversion between entity values and store values

use std::sync::Arc;

use crate::metadata::{get_metadata_storage, MetadataStorageConfig};
use crate::store::StoreClient;

pub mod common;
pub mod errors;
pub mod metadata;
pub mod query;
pub mod repository;
pub mod store;
pub mod transaction;
pub mod transcoder;

/// Binds the process-wide registry to `store` and applies `config`.
///
/// Registrations are kept; calling it again swaps the store and the
/// configuration.
pub fn initialize(store: Arc<dyn StoreClient>, config: MetadataStorageConfig) {
    let storage = get_metadata_storage();
    storage.set_config(config);
    storage.set_store(store);
    log::info!(
        "DocMap initialized (validate models: {}, millisecond timestamps: {})",
        config.validate_models,
        config.are_timestamps_in_milliseconds
    );
}
