//! # Docbase
//!
//! Schema-agnostic document repository with optimistic concurrency
//! control.
//!
//! A [`Repository`] binds one collection name to a pluggable
//! [`DocumentStore`] and offers create / read / update / patch /
//! delete over schemaless JSON documents. Writes are guarded by
//! versioned compare-and-swap: every stored document carries a
//! monotonic version token, and an update commits only if the caller
//! still holds the stored version. Failures surface as a closed
//! taxonomy of typed business errors, kept strictly apart from
//! infrastructure failures.
//!
//! ## Quick start
//!
//! ```ignore
//! use docbase::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let repo = Repository::new("orders", store);
//!
//! let order = repo.create(serde_json::json!({ "status": "open" }))?;
//! let mut order = repo.get(order.id().unwrap())?;
//! order.insert("status", serde_json::json!("shipped"));
//! let order = repo.update(order)?; // fails OptimisticLock if raced
//! ```
//!
//! ## Error tiers
//!
//! - Business failures ([`ErrorKind`]): typed, closed set, translated
//!   by an outer layer into user-facing responses.
//! - Infrastructure failures ([`StoreError`]): passed through
//!   unchanged so callers can decide to retry.

#![warn(missing_docs)]

mod repository;

pub mod prelude;

pub use repository::Repository;

// Core types
pub use docbase_core::{
    ContextMap, ContextPropagator, Document, Error, ErrorKind, FailureClass, IndexDescriptor,
    Key, RepositoryError, Result, StoreError, Version, VersionClock,
};

// Store adapter contract
pub use docbase_storage::{
    ContinuationToken, DocumentStore, MemoryStore, Page, StoreResult, VersionCondition,
};
