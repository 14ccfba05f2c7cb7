//! The registry binding entity types to collections.
//!
//! One process-wide [MetadataStorage] holds every collection and
//! sub-collection registration, the active configuration, the optional
//! validator and the store connection. Registration happens at startup;
//! afterwards the registry is only read.

mod config;
mod descriptors;
mod metadata_storage;

pub use config::*;
pub use descriptors::*;
pub use metadata_storage::*;
