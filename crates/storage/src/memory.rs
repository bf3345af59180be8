//! In-memory reference adapter.
//!
//! [`MemoryStore`] implements [`DocumentStore`] over a single ordered
//! map behind a `parking_lot::RwLock`. It exists to back the test
//! suites and to pin down the adapter contract for real backends:
//! structural condition failures, idempotent deletes, and honest
//! pagination (the page size is configurable precisely so tests can
//! force continuation tokens on small data sets).
//!
//! The native sort key is the encoded primary key, so scans come back
//! ascending by key and queries descending.

use crate::{ContinuationToken, DocumentStore, Page, StoreResult, VersionCondition};
use docbase_core::document::{Document, IndexDescriptor, Key, ID_FIELD};
use docbase_core::error::StoreError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Separator between encoded key attributes. Unit separator keeps the
/// encoding unambiguous for any printable field name.
const KEY_SEPARATOR: char = '\u{1f}';

/// In-memory [`DocumentStore`] implementation.
pub struct MemoryStore {
    key_fields: Vec<String>,
    page_size: usize,
    indexes: Vec<IndexDescriptor>,
    records: RwLock<BTreeMap<String, Document>>,
}

impl MemoryStore {
    /// Store keyed by the `id` field with the default page size.
    pub fn new() -> Self {
        Self {
            key_fields: vec![ID_FIELD.to_string()],
            page_size: DEFAULT_PAGE_SIZE,
            indexes: Vec::new(),
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Replace the primary key fields (composite keys list several).
    pub fn with_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Bound the number of items per scan/query page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Register a secondary index.
    pub fn with_index(mut self, descriptor: IndexDescriptor) -> Self {
        self.indexes.push(descriptor);
        self
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn encode_attrs<'a, I>(attrs: I) -> StoreResult<String>
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut pairs: Vec<(&str, &Value)> = attrs.into_iter().collect();
        pairs.sort_by_key(|(name, _)| *name);

        let mut encoded = String::new();
        for (i, (name, value)) in pairs.iter().enumerate() {
            if i > 0 {
                encoded.push(KEY_SEPARATOR);
            }
            let rendered = serde_json::to_string(value)
                .map_err(|e| StoreError::Corrupted(format!("unencodable key attribute: {}", e)))?;
            encoded.push_str(name);
            encoded.push('=');
            encoded.push_str(&rendered);
        }
        Ok(encoded)
    }

    /// Encoded primary key of a stored document.
    fn key_of_document(&self, document: &Document) -> StoreResult<String> {
        let mut attrs = Vec::with_capacity(self.key_fields.len());
        for field in &self.key_fields {
            let value = document.get(field).ok_or_else(|| {
                StoreError::Corrupted(format!("document missing key field '{}'", field))
            })?;
            attrs.push((field.as_str(), value));
        }
        Self::encode_attrs(attrs)
    }

    /// Encoded form of a lookup key. A plain id addresses the first
    /// key field; composite keys are encoded attribute by attribute.
    fn encode_key(&self, key: &Key) -> StoreResult<String> {
        match key {
            Key::Id(id) => {
                let value = Value::String(id.clone());
                Self::encode_attrs([(self.key_fields[0].as_str(), &value)])
            }
            Key::Composite(attrs) => {
                Self::encode_attrs(attrs.iter().map(|(n, v)| (n.as_str(), v)))
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &Key) -> StoreResult<Option<Document>> {
        let encoded = self.encode_key(key)?;
        Ok(self.records.read().get(&encoded).cloned())
    }

    fn put(&self, document: Document, condition: Option<VersionCondition>) -> StoreResult<()> {
        let encoded = self.key_of_document(&document)?;
        let mut records = self.records.write();

        if let Some(condition) = condition {
            let actual = records.get(&encoded).and_then(Document::version);
            if actual != Some(condition.expected) {
                return Err(StoreError::ConditionFailed {
                    expected: condition.expected,
                    actual,
                });
            }
        }

        records.insert(encoded, document);
        Ok(())
    }

    fn delete(&self, key: &Key) -> StoreResult<()> {
        let encoded = self.encode_key(key)?;
        self.records.write().remove(&encoded);
        Ok(())
    }

    fn scan(&self, continuation: Option<&ContinuationToken>) -> StoreResult<Page> {
        let records = self.records.read();

        let mut items = Vec::new();
        let mut last_key: Option<String> = None;
        let range = match continuation {
            Some(token) => records.range((
                Bound::Excluded(token.as_str().to_string()),
                Bound::Unbounded,
            )),
            None => records.range::<String, _>(..),
        };
        for (key, document) in range.take(self.page_size) {
            items.push(document.clone());
            last_key = Some(key.clone());
        }

        let continuation = last_key.filter(|key| {
            records
                .range((Bound::Excluded(key.clone()), Bound::Unbounded))
                .next()
                .is_some()
        });

        Ok(Page {
            items,
            continuation: continuation.map(ContinuationToken::new),
        })
    }

    fn query(
        &self,
        field: &str,
        value: &Value,
        index: Option<&str>,
        continuation: Option<&ContinuationToken>,
    ) -> StoreResult<Page> {
        if let Some(name) = index {
            if !self.indexes.iter().any(|d| d.index == name) {
                return Err(StoreError::UnknownIndex(name.to_string()));
            }
        }

        let records = self.records.read();

        // Native sort key descending, resuming strictly below the token.
        let matches: Vec<(&String, &Document)> = records
            .iter()
            .rev()
            .filter(|(_, document)| document.get(field) == Some(value))
            .filter(|(key, _)| match continuation {
                Some(token) => key.as_str() < token.as_str(),
                None => true,
            })
            .collect();

        let items: Vec<Document> = matches
            .iter()
            .take(self.page_size)
            .map(|(_, document)| (*document).clone())
            .collect();

        let continuation = if matches.len() > self.page_size {
            matches
                .get(self.page_size - 1)
                .map(|(key, _)| ContinuationToken::new((*key).clone()))
        } else {
            None
        };

        Ok(Page {
            items,
            continuation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbase_core::version::Version;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).expect("test document must be an object")
    }

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new();
        store
            .put(doc(json!({ "id": "u1", "version": 1, "name": "A" })), None)
            .unwrap();

        let found = store.get(&Key::from("u1")).unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&json!("A")));
    }

    #[test]
    fn test_get_absent_is_none() {
        let store = MemoryStore::new();
        assert!(store.get(&Key::from("nope")).unwrap().is_none());
    }

    #[test]
    fn test_conditional_put_matches() {
        let store = MemoryStore::new();
        store
            .put(doc(json!({ "id": "u1", "version": 3 })), None)
            .unwrap();

        let updated = doc(json!({ "id": "u1", "version": 4 }));
        store
            .put(updated, Some(VersionCondition::expects(Version::from(3))))
            .unwrap();

        let stored = store.get(&Key::from("u1")).unwrap().unwrap();
        assert_eq!(stored.version(), Some(Version::from(4)));
    }

    #[test]
    fn test_conditional_put_mismatch_is_structural_and_writes_nothing() {
        let store = MemoryStore::new();
        store
            .put(doc(json!({ "id": "u1", "version": 3, "name": "A" })), None)
            .unwrap();

        let stale = doc(json!({ "id": "u1", "version": 9, "name": "B" }));
        let err = store
            .put(stale, Some(VersionCondition::expects(Version::from(2))))
            .unwrap_err();

        match err {
            StoreError::ConditionFailed { expected, actual } => {
                assert_eq!(expected, Version::from(2));
                assert_eq!(actual, Some(Version::from(3)));
            }
            other => panic!("expected ConditionFailed, got {:?}", other),
        }

        let stored = store.get(&Key::from("u1")).unwrap().unwrap();
        assert_eq!(stored.get("name"), Some(&json!("A")));
    }

    #[test]
    fn test_conditional_put_on_absent_record_fails() {
        let store = MemoryStore::new();
        let err = store
            .put(
                doc(json!({ "id": "ghost", "version": 2 })),
                Some(VersionCondition::expects(Version::from(1))),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConditionFailed { actual: None, .. }
        ));
    }

    #[test]
    fn test_put_without_key_field_is_rejected() {
        let store = MemoryStore::new();
        let err = store.put(doc(json!({ "name": "no id" })), None).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .put(doc(json!({ "id": "u1", "version": 1 })), None)
            .unwrap();

        store.delete(&Key::from("u1")).unwrap();
        assert!(store.get(&Key::from("u1")).unwrap().is_none());
        // Second delete of the same key also succeeds.
        store.delete(&Key::from("u1")).unwrap();
    }

    #[test]
    fn test_composite_keys() {
        let store = MemoryStore::new().with_key_fields(["order", "line"]);
        store
            .put(
                doc(json!({ "order": "o-1", "line": 2, "version": 1, "sku": "X" })),
                None,
            )
            .unwrap();

        let key = Key::with_range("order", json!("o-1"), "line", json!(2));
        let found = store.get(&key).unwrap().unwrap();
        assert_eq!(found.get("sku"), Some(&json!("X")));

        store.delete(&key).unwrap();
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_scan_pages_until_exhausted() {
        let store = MemoryStore::new().with_page_size(3);
        for i in 0..10 {
            store
                .put(doc(json!({ "id": format!("u{:02}", i), "version": 1 })), None)
                .unwrap();
        }

        let mut all = Vec::new();
        let mut token = None;
        let mut pages = 0;
        loop {
            let page = store.scan(token.as_ref()).unwrap();
            assert!(page.items.len() <= 3);
            all.extend(page.items);
            pages += 1;
            match page.continuation {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        assert_eq!(all.len(), 10);
        assert_eq!(pages, 4);
    }

    #[test]
    fn test_scan_empty_store() {
        let store = MemoryStore::new();
        let page = store.scan(None).unwrap();
        assert!(page.items.is_empty());
        assert!(page.continuation.is_none());
    }

    #[test]
    fn test_query_filters_and_sorts_descending() {
        let store = MemoryStore::new();
        for (id, status) in [("a", "open"), ("b", "closed"), ("c", "open"), ("d", "open")] {
            store
                .put(doc(json!({ "id": id, "version": 1, "status": status })), None)
                .unwrap();
        }

        let page = store.query("status", &json!("open"), None, None).unwrap();
        let ids: Vec<&str> = page
            .items
            .iter()
            .map(|d| d.id().unwrap())
            .collect();
        assert_eq!(ids, vec!["d", "c", "a"]);
    }

    #[test]
    fn test_query_pages_until_exhausted() {
        let store = MemoryStore::new()
            .with_page_size(2)
            .with_index(IndexDescriptor::new("status", "status-index"));
        for i in 0..7 {
            store
                .put(
                    doc(json!({ "id": format!("u{}", i), "version": 1, "status": "open" })),
                    None,
                )
                .unwrap();
        }

        let mut all = Vec::new();
        let mut token = None;
        loop {
            let page = store
                .query("status", &json!("open"), Some("status-index"), token.as_ref())
                .unwrap();
            all.extend(page.items);
            match page.continuation {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        assert_eq!(all.len(), 7);
        // Still descending across page boundaries.
        let ids: Vec<&str> = all.iter().map(|d| d.id().unwrap()).collect();
        assert_eq!(ids, vec!["u6", "u5", "u4", "u3", "u2", "u1", "u0"]);
    }

    #[test]
    fn test_query_unknown_index() {
        let store = MemoryStore::new();
        let err = store
            .query("status", &json!("open"), Some("missing-index"), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex(name) if name == "missing-index"));
    }
}
