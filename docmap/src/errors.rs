use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};
use crate::repository::ValidationViolation;

/// Error kinds for docmap operations
///
/// Each kind names one category of failure so callers can branch on
/// [`DocMapError::kind`] instead of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use docmap::errors::{DocMapError, ErrorKind, DocMapResult};
///
/// fn example() -> DocMapResult<()> {
///     Err(DocMapError::new("limit must not be negative", ErrorKind::InvalidArgument))
/// }
/// ```
#[derive(Debug, PartialEq, Clone)]
pub enum ErrorKind {
    // Setup errors
    /// A repository was requested before a store client was bound
    UninitializedStore,
    /// No collection descriptor exists for the requested entity type
    UnregisteredCollection,
    /// Registration data is inconsistent (unknown property key, empty name, ...)
    MetadataError,
    /// Validation is enabled but no validator is configured
    ValidationSetup,

    // Call errors
    /// An argument was rejected before any store call was made
    InvalidArgument,
    /// The entity id is missing or malformed for the requested operation
    InvalidId,
    /// The entity failed validation; carries every violation reported
    ValidationFailure(Vec<ValidationViolation>),
    /// Error mapping an entity to or from its document form
    ObjectMappingError,

    // Store errors
    /// The requested document does not exist
    NotFound,
    /// The store refused the operation
    PermissionDenied,
    /// Generic failure reported by the store client
    StoreError,
    /// The transaction is no longer usable or failed to commit
    TransactionError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UninitializedStore => write!(f, "Uninitialized store"),
            ErrorKind::UnregisteredCollection => write!(f, "Unregistered collection"),
            ErrorKind::MetadataError => write!(f, "Metadata error"),
            ErrorKind::ValidationSetup => write!(f, "Validation setup error"),
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::ValidationFailure(violations) => {
                write!(f, "Validation failed with {} violation(s)", violations.len())
            }
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::TransactionError => write!(f, "Transaction error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docmap error type.
///
/// `DocMapError` carries the error message, its kind and an optional cause.
/// It captures a backtrace at creation time for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use docmap::errors::{DocMapError, ErrorKind};
///
/// let cause = DocMapError::new("connection reset", ErrorKind::StoreError);
/// let err = DocMapError::new_with_cause("query failed", ErrorKind::StoreError, cause);
/// ```
#[derive(Clone)]
pub struct DocMapError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocMapError>>,
    backtrace: Atomic<Backtrace>,
}

impl DocMapError {
    /// Creates a new `DocMapError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocMapError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `DocMapError` wrapping a cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocMapError) -> Self {
        DocMapError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a validation failure carrying every reported violation.
    pub fn validation_failure(violations: Vec<ValidationViolation>) -> Self {
        let message = violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        DocMapError::new(
            &format!("Entity validation failed: {}", message),
            ErrorKind::ValidationFailure(violations),
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocMapError> {
        self.cause.as_deref()
    }

    /// Returns the violations when this error is a validation failure.
    pub fn violations(&self) -> Option<&[ValidationViolation]> {
        match &self.error_kind {
            ErrorKind::ValidationFailure(violations) => Some(violations),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }
}

impl Display for DocMapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocMapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for DocMapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docmap operations.
pub type DocMapResult<T> = Result<T, DocMapError>;

impl From<std::fmt::Error> for DocMapError {
    fn from(err: std::fmt::Error) -> Self {
        DocMapError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for DocMapError {
    fn from(msg: String) -> Self {
        DocMapError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocMapError {
    fn from(msg: &str) -> Self {
        DocMapError::new(msg, ErrorKind::InternalError)
    }
}
