//! Error taxonomy for the document repository.
//!
//! Two tiers:
//!
//! - **Business failures** ([`RepositoryError`]): a closed set of
//!   [`ErrorKind`]s detected before or instead of a store call. Meant
//!   to be translated by an outer layer into a user-facing response.
//!   Retrying rarely helps.
//! - **Infrastructure failures** ([`StoreError`]): the store was
//!   unavailable or answered nonsense. Propagated unchanged; a higher
//!   layer may retry.
//!
//! The one deliberate crossing between tiers: a conditional write that
//! fails its version check surfaces from the adapter as the structural
//! [`StoreError::ConditionFailed`] and is reclassified by the
//! repository into [`ErrorKind::OptimisticLock`]. No error-text
//! matching anywhere.

use crate::version::Version;
use thiserror::Error;

/// Closed set of business failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required input was absent.
    MissingParameter,
    /// The entity payload is not a JSON object.
    InvalidEntity,
    /// An update target lacks id or version.
    UnidentifiedEntity,
    /// No record exists at the given key.
    NotFound,
    /// Version mismatch on a conditional write.
    OptimisticLock,
    /// A caller-stated rule was broken (e.g. mismatched ids in patch).
    BusinessRuleViolation,
    /// Retained for backward compatibility with existing callers.
    InvalidPaymentMethod,
}

/// Canonical failure class of a business error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The request itself is malformed.
    MalformedRequest,
    /// The addressed resource does not exist.
    AbsentResource,
    /// A concurrent writer won the race.
    Conflict,
}

impl ErrorKind {
    /// The kind's canonical failure class.
    pub fn class(&self) -> FailureClass {
        match self {
            ErrorKind::MissingParameter
            | ErrorKind::InvalidEntity
            | ErrorKind::UnidentifiedEntity
            | ErrorKind::BusinessRuleViolation
            | ErrorKind::InvalidPaymentMethod => FailureClass::MalformedRequest,
            ErrorKind::NotFound => FailureClass::AbsentResource,
            ErrorKind::OptimisticLock => FailureClass::Conflict,
        }
    }

    /// Default human-readable message for the kind.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::MissingParameter => "A required parameter is missing in the request",
            ErrorKind::InvalidEntity => {
                "The provided entity is malformed or missing required attributes"
            }
            ErrorKind::UnidentifiedEntity => "Updated entity must provide valid id and version",
            ErrorKind::NotFound => "No entity with the given id currently exists",
            ErrorKind::OptimisticLock => {
                "This entity has already been updated by another process"
            }
            ErrorKind::BusinessRuleViolation => {
                "The provided entity could not be updated as it would violate one or more validation rules"
            }
            ErrorKind::InvalidPaymentMethod => "Payment denied",
        }
    }
}

/// A typed business failure: a kind plus an optional caller-supplied
/// message override and an optional machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.message())]
pub struct RepositoryError {
    kind: ErrorKind,
    message: Option<String>,
    code: Option<String>,
}

impl RepositoryError {
    /// Business error of `kind` with its default message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            code: None,
        }
    }

    /// Override the default message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The failure kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The kind's canonical failure class.
    pub fn class(&self) -> FailureClass {
        self.kind.class()
    }

    /// The machine-readable code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The effective message: the caller override if present, the
    /// kind's default otherwise.
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message())
    }
}

/// Failure raised by a store adapter.
///
/// Everything here except [`StoreError::ConditionFailed`] is an
/// infrastructure failure and passes through the repository unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A conditional write found a different stored version than the
    /// condition demanded. `actual` is `None` when the record is gone.
    #[error("condition failed: expected version {expected}, found {actual:?}")]
    ConditionFailed {
        /// Version the condition demanded.
        expected: Version,
        /// Version actually stored, if the record still exists.
        actual: Option<Version>,
    },

    /// A query named an index the store does not know.
    #[error("unknown index: {0}")]
    UnknownIndex(String),

    /// The store could not be reached or refused the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with a record that does not parse.
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

/// All repository errors.
///
/// The public failure surface of every repository operation: exactly
/// the business kinds of [`ErrorKind`], plus unmodified store
/// failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Typed business failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Infrastructure failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand: business error of `kind` with its default message.
    pub fn business(kind: ErrorKind) -> Self {
        Error::Repository(RepositoryError::new(kind))
    }

    /// The business kind, if this is a business failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Repository(e) => Some(e.kind()),
            Error::Store(_) => None,
        }
    }

    /// The canonical failure class, if this is a business failure.
    pub fn class(&self) -> Option<FailureClass> {
        self.kind().map(|k| k.class())
    }

    /// Check if this is a typed business failure.
    pub fn is_business(&self) -> bool {
        matches!(self, Error::Repository(_))
    }

    /// Check if this is an infrastructure failure.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    /// Check if this is an OCC conflict.
    pub fn is_conflict(&self) -> bool {
        self.kind() == Some(ErrorKind::OptimisticLock)
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    /// Check if a retry may succeed.
    ///
    /// Conflicts may succeed after re-reading; infrastructure failures
    /// may clear up. Other business failures will not change on retry.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict() || self.is_infrastructure()
    }
}
