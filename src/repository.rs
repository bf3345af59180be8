//! Generic document repository with optimistic concurrency control.
//!
//! ## Design: stateless gateway
//!
//! [`Repository`] binds an immutable collection name to a store
//! adapter and holds nothing else. It validates inputs, issues one
//! store call per operation (version-conditioned for updates),
//! classifies the outcome, and returns a [`Document`] or a typed
//! error. No in-process locks, no caches: all write safety derives
//! from the store's conditional put, so one concurrent writer to a
//! given record+version wins and the rest fail [`ErrorKind::OptimisticLock`]
//! immediately. Conflicts are surfaced, never retried here.
//!
//! ## Thread safety
//!
//! `Repository` is `Send + Sync` and safe to share across concurrent
//! callers; operations on different records are fully independent.

use docbase_core::context::ContextPropagator;
use docbase_core::document::{Document, Key};
use docbase_core::error::{Error, ErrorKind, RepositoryError, Result, StoreError};
use docbase_core::version::VersionClock;
use docbase_storage::{DocumentStore, VersionCondition};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Stateless gateway over one collection of a document store.
pub struct Repository<S> {
    collection: String,
    store: Arc<S>,
    context: ContextPropagator,
}

impl<S: DocumentStore> Repository<S> {
    /// Bind a repository to `collection` on `store`.
    pub fn new(collection: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            collection: collection.into(),
            store,
            context: ContextPropagator::new(),
        }
    }

    /// Attach the request's correlation context. Consumed only by log
    /// emissions, never persisted.
    pub fn with_context(mut self, context: ContextPropagator) -> Self {
        self.context = context;
        self
    }

    /// The bound collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Retrieve the document stored at `key`.
    ///
    /// Accepts plain ids and composite keys. Fails
    /// [`ErrorKind::MissingParameter`] on an empty key before any
    /// store contact, [`ErrorKind::NotFound`] when no record matches.
    pub fn get(&self, key: impl Into<Key>) -> Result<Document> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::business(ErrorKind::MissingParameter));
        }

        debug!(
            collection = %self.collection,
            key = %key,
            context = ?self.context.get(),
            "store get request"
        );
        self.store
            .get(&key)?
            .ok_or_else(|| Error::business(ErrorKind::NotFound))
    }

    /// Retrieve every document in the collection.
    ///
    /// Follows store continuation tokens until the scan is exhausted,
    /// so large collections come back complete.
    pub fn get_all(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut continuation = None;

        loop {
            debug!(
                collection = %self.collection,
                resuming = continuation.is_some(),
                context = ?self.context.get(),
                "store scan request"
            );
            let page = self.store.scan(continuation.as_ref())?;
            documents.extend(page.items);
            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        debug!(
            collection = %self.collection,
            count = documents.len(),
            "store scan complete"
        );
        Ok(documents)
    }

    /// Query documents whose `field` equals `value`.
    ///
    /// Runs against the named secondary index when `index` is given,
    /// else against the primary key. Results arrive in the store's
    /// native sort order, descending, complete across page boundaries.
    /// Fails [`ErrorKind::MissingParameter`] on an empty field name or
    /// null value before any store contact.
    pub fn query(
        &self,
        value: &Value,
        field: &str,
        index: Option<&str>,
    ) -> Result<Vec<Document>> {
        if field.is_empty() || value.is_null() {
            return Err(Error::business(ErrorKind::MissingParameter));
        }

        let mut documents = Vec::new();
        let mut continuation = None;

        loop {
            debug!(
                collection = %self.collection,
                field,
                index = index.unwrap_or("<primary>"),
                resuming = continuation.is_some(),
                context = ?self.context.get(),
                "store query request"
            );
            let page = self
                .store
                .query(field, value, index, continuation.as_ref())?;
            documents.extend(page.items);
            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Create a new document.
    ///
    /// `value` must be a JSON object ([`ErrorKind::InvalidEntity`]
    /// otherwise). Assigns a v4 UUID id when absent — collision
    /// probability is treated as negligible, so the write is
    /// unconditional with no existence pre-check. Stamps `version` and
    /// `creation`, persists, and returns the stored document.
    pub fn create(&self, value: Value) -> Result<Document> {
        let mut document =
            Document::from_value(value).ok_or(Error::business(ErrorKind::InvalidEntity))?;

        if document.id().is_none() {
            document.set_id(Uuid::new_v4().to_string());
        }
        document.set_version(VersionClock::next());
        document.set_creation(chrono::Utc::now().to_rfc3339());

        debug!(
            collection = %self.collection,
            id = document.id(),
            context = ?self.context.get(),
            "store put request (create)"
        );
        self.store.put(document.clone(), None)?;
        Ok(document)
    }

    /// Overwrite an existing document, guarded by its version.
    ///
    /// The document must carry both `id` and `version`
    /// ([`ErrorKind::UnidentifiedEntity`] otherwise). The write
    /// commits only if the stored version still equals the one the
    /// caller observed; on mismatch it fails
    /// [`ErrorKind::OptimisticLock`] and nothing is written. On
    /// success the returned document carries a strictly greater
    /// version.
    pub fn update(&self, document: Document) -> Result<Document> {
        let observed = match (document.id(), document.version()) {
            (Some(_), Some(version)) => version,
            _ => return Err(Error::business(ErrorKind::UnidentifiedEntity)),
        };

        let mut updated = document;
        updated.set_version(VersionClock::next_after(observed));

        debug!(
            collection = %self.collection,
            id = updated.id(),
            observed = %observed,
            context = ?self.context.get(),
            "store put request (update)"
        );
        match self
            .store
            .put(updated.clone(), Some(VersionCondition::expects(observed)))
        {
            Ok(()) => Ok(updated),
            Err(StoreError::ConditionFailed { expected, actual }) => {
                debug!(
                    collection = %self.collection,
                    id = updated.id(),
                    %expected,
                    ?actual,
                    "update aborted: conditional version check failed"
                );
                Err(Error::business(ErrorKind::OptimisticLock))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Overwrite or add some fields of an existing document.
    ///
    /// Loads the current document ([`ErrorKind::NotFound`]
    /// propagates), shallow-merges `partial` over it (named fields
    /// override, others untouched) and delegates to [`Repository::update`].
    /// A conflicting `id` inside `partial` fails
    /// [`ErrorKind::BusinessRuleViolation`]. The read-then-write race
    /// can lose only at the final update, whose conflict is surfaced,
    /// never silently retried.
    pub fn patch(&self, key: impl Into<Key>, partial: Value) -> Result<Document> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::business(ErrorKind::MissingParameter));
        }
        let partial =
            Document::from_value(partial).ok_or(Error::business(ErrorKind::InvalidEntity))?;

        let mut current = self.get(key)?;
        if let Some(patch_id) = partial.id() {
            if current.id() != Some(patch_id) {
                return Err(Error::Repository(
                    RepositoryError::new(ErrorKind::BusinessRuleViolation)
                        .with_message("Mismatching entity identifiers"),
                ));
            }
        }

        current.merge(partial.fields());
        self.update(current)
    }

    /// Unconditionally delete the document at `key`.
    ///
    /// Composite primary keys are expressed with
    /// [`Key::with_range`]. Deleting an absent key is a no-op.
    pub fn delete(&self, key: impl Into<Key>) -> Result<()> {
        let key = key.into();
        debug!(
            collection = %self.collection,
            key = %key,
            context = ?self.context.get(),
            "store delete request"
        );
        self.store.delete(&key)?;
        Ok(())
    }
}
