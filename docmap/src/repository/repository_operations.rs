use std::sync::Arc;

use crate::common::{sub_collection_path, Convertible, Value};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};
use crate::metadata::{CollectionDescriptor, MetadataStorage};
use crate::query::QuerySpec;
use crate::repository::{Entity, StoreScope, SubCollectionBinding, ValidationViolation};
use crate::store::{RawDocument, StoreFields, StoreFilter, StoreOrder, StoreQuery};
use crate::transcoder::{deserialize_from_storage, serialize_for_storage, to_store_value};

/// Mapping logic shared by the repository strategies: serialization,
/// hydration, sub-collection wiring, validation and query translation.
#[derive(Clone)]
pub(crate) struct RepositoryOperations {
    inner: Arc<RepositoryOperationsInner>,
}

struct RepositoryOperationsInner {
    storage: MetadataStorage,
    descriptor: CollectionDescriptor,
    collection_path: String,
    scope: StoreScope,
}

impl RepositoryOperations {
    pub(crate) fn new(
        storage: MetadataStorage,
        descriptor: CollectionDescriptor,
        collection_path: String,
        scope: StoreScope,
    ) -> Self {
        RepositoryOperations {
            inner: Arc::new(RepositoryOperationsInner {
                storage,
                descriptor,
                collection_path,
                scope,
            }),
        }
    }

    pub(crate) fn collection_path(&self) -> &str {
        &self.inner.collection_path
    }

    pub(crate) fn descriptor(&self) -> &CollectionDescriptor {
        &self.inner.descriptor
    }

    /// The id to write `item` under, if it carries one.
    pub(crate) fn entity_id<T: Entity>(&self, item: &T) -> Option<String> {
        item.id().map(str::to_string)
    }

    /// The id `update` needs.
    pub(crate) fn require_id<T: Entity>(&self, item: &T) -> DocMapResult<String> {
        self.entity_id(item).ok_or_else(|| {
            log::error!("Cannot update {} without an id", T::entity_name());
            DocMapError::new(
                &format!("Cannot update {} without an id", T::entity_name()),
                ErrorKind::InvalidId,
            )
        })
    }

    pub(crate) fn require_document_id(&self, id: &str) -> DocMapResult<()> {
        if id.is_empty() || id.contains('/') {
            log::error!("'{}' is not a valid document id", id);
            return Err(DocMapError::new(
                &format!("'{}' is not a valid document id", id),
                ErrorKind::InvalidId,
            ));
        }
        Ok(())
    }

    pub(crate) fn to_fields<T: Entity>(&self, item: &T) -> DocMapResult<StoreFields> {
        let value = item.to_value()?;
        serialize_for_storage(
            &value,
            T::id_field(),
            &self.inner.descriptor.sub_collections,
            &self.inner.storage.config(),
        )
    }

    /// Turns a stored document into an entity: decodes the fields, fills the
    /// id from the document id and binds every sub-collection under it.
    pub(crate) fn hydrate<T: Entity>(&self, raw: RawDocument) -> DocMapResult<T> {
        let mut document = deserialize_from_storage(&raw.fields, &self.inner.storage.config())?;
        document.put_literal(T::id_field(), Value::from(raw.id.as_str()));

        let mut entity = T::from_value(&Value::Document(document)).map_err(|e| {
            log::error!("Failed to map document '{}' to {}", raw.path, T::entity_name());
            DocMapError::new_with_cause(
                &format!("Failed to map document '{}' to {}", raw.path, T::entity_name()),
                ErrorKind::ObjectMappingError,
                e,
            )
        })?;
        self.wire_sub_collections(&mut entity, &raw.id)?;
        Ok(entity)
    }

    fn wire_sub_collections<T: Entity>(&self, entity: &mut T, id: &str) -> DocMapResult<()> {
        for sub in &self.inner.descriptor.sub_collections {
            let path = sub_collection_path(&self.inner.collection_path, id, &sub.name);
            let binding =
                SubCollectionBinding::new(self.inner.storage.clone(), self.inner.scope.clone(), path);
            entity.attach_sub_collection(&sub.property_key, binding)?;
        }
        Ok(())
    }

    /// Runs the configured validator.
    ///
    /// # Errors
    ///
    /// `ValidationSetup` when validation is enabled but no validator is set.
    pub(crate) fn validate<T: Entity>(&self, item: &T) -> DocMapResult<Vec<ValidationViolation>> {
        let config = self.inner.storage.config();
        let validator = match self.inner.storage.validator() {
            Some(validator) => validator,
            None if config.validate_models => {
                log::error!("Validation is enabled but no validator is configured");
                return Err(DocMapError::new(
                    "Validation is enabled but no validator is configured",
                    ErrorKind::ValidationSetup,
                ));
            }
            None => return Ok(Vec::new()),
        };

        match item.to_value()? {
            Value::Document(document) => Ok(validator.validate(T::entity_name(), &document)),
            other => {
                log::error!("{} converted to a {}, not a document", T::entity_name(), other.type_name());
                Err(DocMapError::new(
                    &format!("{} converted to a {}, not a document", T::entity_name(), other.type_name()),
                    ErrorKind::ObjectMappingError,
                ))
            }
        }
    }

    /// Fails with the collected violations when validation is enabled and
    /// the item is invalid.
    pub(crate) fn ensure_valid<T: Entity>(&self, item: &T) -> DocMapResult<()> {
        if !self.inner.storage.config().validate_models {
            return Ok(());
        }
        let violations = self.validate(item)?;
        if violations.is_empty() {
            return Ok(());
        }
        log::error!(
            "{} failed validation with {} violation(s)",
            T::entity_name(),
            violations.len()
        );
        Err(DocMapError::validation_failure(violations))
    }

    /// Translates a query spec for the store. A single-result query asks the
    /// store for one document.
    pub(crate) fn store_query(&self, spec: &QuerySpec, single: bool) -> StoreQuery {
        let config = self.inner.storage.config();
        let filters = spec
            .lines
            .iter()
            .map(|line| StoreFilter {
                field: line.field.as_str().to_string(),
                operator: line.operator,
                value: to_store_value(&line.value, &config),
            })
            .collect();
        let order_by = spec
            .order_by
            .iter()
            .map(|order| StoreOrder {
                field: order.field.as_str().to_string(),
                direction: order.direction,
            })
            .collect();
        let limit = if single {
            Some(spec.limit.map_or(1, |limit| limit.min(1)))
        } else {
            spec.limit
        };

        StoreQuery {
            filters,
            order_by,
            limit,
        }
    }

    pub(crate) fn hydrate_all<T: Entity>(&self, documents: Vec<RawDocument>) -> DocMapResult<Vec<T>> {
        documents.into_iter().map(|raw| self.hydrate(raw)).collect()
    }
}
