//! Convenient imports for Docbase.
//!
//! Re-exports the most commonly used types so you can get started with
//! a single import:
//!
//! ```ignore
//! use docbase::prelude::*;
//!
//! let repo = Repository::new("orders", Arc::new(MemoryStore::new()));
//! let doc = repo.create(json!({ "status": "open" }))?;
//! ```

// Main entry point
pub use crate::Repository;

// Error handling
pub use crate::{Error, ErrorKind, FailureClass, RepositoryError, Result, StoreError};

// Core types
pub use crate::{ContextPropagator, Document, IndexDescriptor, Key, Version};

// Store adapter contract
pub use crate::{ContinuationToken, DocumentStore, MemoryStore, Page, StoreResult, VersionCondition};

// Re-export serde_json for convenience
pub use serde_json::json;
