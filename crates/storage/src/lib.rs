//! Store adapter contract for the document repository.
//!
//! [`DocumentStore`] is the seam between the repository and whatever
//! actually holds the data. Five primitives: get-by-key, conditional
//! put, delete-by-key, scan-all, query-by-index. Scan and query are
//! paginated: each call returns one bounded [`Page`] plus an opaque
//! [`ContinuationToken`] when more data remains, and callers must
//! follow tokens until exhausted.
//!
//! # Conditional writes
//!
//! A put may carry a [`VersionCondition`]. The adapter commits the
//! write only if the currently stored version equals the condition's
//! expected version, and otherwise fails with the structural
//! [`StoreError::ConditionFailed`]. This is the primitive the
//! repository builds optimistic concurrency control on; adapters must
//! report it as the typed variant, never as a message to be parsed.

pub mod memory;

pub use docbase_core::error::StoreError;
pub use memory::MemoryStore;

use docbase_core::document::{Document, Key};
use docbase_core::version::Version;
use serde_json::Value;

/// Result type for store adapter calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Precondition on a conditional put: the stored version must equal
/// `expected` for the write to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCondition {
    /// Version the store must currently hold.
    pub expected: Version,
}

impl VersionCondition {
    /// Condition requiring the stored version to equal `expected`.
    pub fn expects(expected: Version) -> Self {
        Self { expected }
    }
}

/// Opaque resume point for paginated scan and query calls.
///
/// Produced by an adapter, meaningful only to the adapter that issued
/// it. Callers pass it back verbatim to fetch the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Wrap an adapter-internal resume point.
    pub fn new(token: impl Into<String>) -> Self {
        ContinuationToken(token.into())
    }

    /// The adapter-internal resume point.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One bounded page of scan or query results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Documents in this page, in the store's native order.
    pub items: Vec<Document>,
    /// Resume point for the next page; `None` when exhausted.
    pub continuation: Option<ContinuationToken>,
}

/// The underlying document store's primitives.
///
/// Implementations must be shareable across concurrent callers; all
/// atomicity the repository relies on lives behind this trait. The
/// trait is object-safe so a repository can hold `Arc<dyn
/// DocumentStore>` when the backend is chosen at runtime.
pub trait DocumentStore: Send + Sync {
    /// Fetch the document stored at `key`, if any.
    fn get(&self, key: &Key) -> StoreResult<Option<Document>>;

    /// Persist `document` under its primary key.
    ///
    /// With a condition, the write commits only if the stored version
    /// equals the expected one; otherwise it fails with
    /// [`StoreError::ConditionFailed`] and nothing is written. Without
    /// a condition the write is unconditional (create or overwrite).
    fn put(&self, document: Document, condition: Option<VersionCondition>) -> StoreResult<()>;

    /// Delete the document at `key`. Idempotent: deleting an absent
    /// key succeeds.
    fn delete(&self, key: &Key) -> StoreResult<()>;

    /// One page of a full-collection scan, resuming at `continuation`.
    fn scan(&self, continuation: Option<&ContinuationToken>) -> StoreResult<Page>;

    /// One page of an equality query on `field`, resuming at
    /// `continuation`.
    ///
    /// With `index`, the named secondary index is consulted; unknown
    /// names fail with [`StoreError::UnknownIndex`]. Without, the
    /// primary key is used. Results come back in the store's native
    /// sort order, descending.
    fn query(
        &self,
        field: &str,
        value: &Value,
        index: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> StoreResult<Page>;
}
