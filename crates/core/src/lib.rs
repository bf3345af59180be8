//! Core types for the document repository.
//!
//! This crate defines the fundamental types shared across the system:
//! - [`Document`]: a schemaless JSON record with reserved identity fields
//! - [`Key`]: plain or composite primary key
//! - [`Version`] / [`VersionClock`]: monotonic version tokens for
//!   optimistic concurrency control
//! - [`Error`]: the closed business-error taxonomy plus infrastructure
//!   passthrough
//! - [`ContextPropagator`]: per-request correlation context for tracing

pub mod context;
pub mod document;
pub mod error;
pub mod version;

pub use context::{ContextMap, ContextPropagator, CORRELATION_PREFIX};
pub use document::{Document, IndexDescriptor, Key, CREATION_FIELD, ID_FIELD, VERSION_FIELD};
pub use error::{Error, ErrorKind, FailureClass, RepositoryError, Result, StoreError};
pub use version::{Version, VersionClock};
