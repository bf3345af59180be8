//! Document and key types.
//!
//! A [`Document`] is a schemaless JSON object. The repository reserves
//! three fields on every stored document:
//!
//! - [`ID_FIELD`]: globally unique string identifier
//! - [`VERSION_FIELD`]: monotonic version token, assigned only by the
//!   repository
//! - [`CREATION_FIELD`]: RFC 3339 timestamp, set once at creation
//!
//! Everything else is opaque payload owned by the caller.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved field holding the document's unique identifier.
pub const ID_FIELD: &str = "id";

/// Reserved field holding the document's version token.
pub const VERSION_FIELD: &str = "version";

/// Reserved field holding the document's creation timestamp.
pub const CREATION_FIELD: &str = "creation";

/// A schemaless document: a JSON object keyed by field name.
///
/// Documents are plain data. All identity and versioning rules are
/// enforced by the repository, not here; this type only provides typed
/// access to the reserved fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document(Map::new())
    }

    /// Interpret a JSON value as a document.
    ///
    /// Returns `None` unless the value is an object. Null, arrays and
    /// scalars are not documents.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Document(fields)),
            _ => None,
        }
    }

    /// The document's identifier, if assigned.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Assign the document's identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.into()));
    }

    /// The document's version token, if assigned.
    pub fn version(&self) -> Option<Version> {
        self.0
            .get(VERSION_FIELD)
            .and_then(Value::as_u64)
            .map(Version::from)
    }

    /// Assign the document's version token.
    pub fn set_version(&mut self, version: Version) {
        self.0
            .insert(VERSION_FIELD.to_string(), Value::from(version.as_u64()));
    }

    /// The creation timestamp, if assigned.
    pub fn creation(&self) -> Option<&str> {
        self.0.get(CREATION_FIELD).and_then(Value::as_str)
    }

    /// Stamp the creation timestamp. Set once by the repository at
    /// create time, never altered afterwards.
    pub fn set_creation(&mut self, timestamp: impl Into<String>) {
        self.0
            .insert(CREATION_FIELD.to_string(), Value::String(timestamp.into()));
    }

    /// Read an arbitrary field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Write an arbitrary field.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Shallow-merge `patch` over this document: fields named in the
    /// patch override, all other fields are untouched.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (field, value) in patch {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Primary key derived from the document's id, if assigned.
    pub fn primary_key(&self) -> Option<Key> {
        self.id().map(Key::from)
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document carries no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document(fields)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

/// Primary key of a document: either a plain id string, or a composite
/// map of key attributes (hash key, optional range key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Key {
    /// Plain identifier matched against the store's id field.
    Id(String),
    /// Multi-attribute key matched field by field.
    Composite(BTreeMap<String, Value>),
}

impl Key {
    /// Composite key with a single hash attribute.
    pub fn composite(hash_name: impl Into<String>, hash_value: Value) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(hash_name.into(), hash_value);
        Key::Composite(attrs)
    }

    /// Composite key with hash and range attributes.
    pub fn with_range(
        hash_name: impl Into<String>,
        hash_value: Value,
        range_name: impl Into<String>,
        range_value: Value,
    ) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(hash_name.into(), hash_value);
        attrs.insert(range_name.into(), range_value);
        Key::Composite(attrs)
    }

    /// Whether the key carries no usable identity: an empty id string
    /// or a composite with no attributes.
    pub fn is_empty(&self) -> bool {
        match self {
            Key::Id(id) => id.is_empty(),
            Key::Composite(attrs) => attrs.is_empty(),
        }
    }
}

impl From<&str> for Key {
    fn from(id: &str) -> Self {
        Key::Id(id.to_string())
    }
}

impl From<String> for Key {
    fn from(id: String) -> Self {
        Key::Id(id)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Id(id) => write!(f, "{}", id),
            Key::Composite(attrs) => {
                let mut first = true;
                for (name, value) in attrs {
                    if !first {
                        write!(f, ",")?;
                    }
                    write!(f, "{}={}", name, value)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Binding of a document field to a named secondary index.
///
/// Registered on a store adapter; consulted only by query lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Field the index is built over.
    pub field: String,
    /// Store-side name of the index.
    pub index: String,
}

impl IndexDescriptor {
    /// Describe an index over `field` named `index`.
    pub fn new(field: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            index: index.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Document::from_value(Value::Null).is_none());
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!("text")).is_none());
        assert!(Document::from_value(json!(42)).is_none());
        assert!(Document::from_value(json!({})).is_some());
    }

    #[test]
    fn test_reserved_field_accessors() {
        let mut d = Document::new();
        assert!(d.id().is_none());
        assert!(d.version().is_none());
        assert!(d.creation().is_none());

        d.set_id("abc");
        d.set_version(Version::from(7));
        d.set_creation("2024-01-01T00:00:00Z");

        assert_eq!(d.id(), Some("abc"));
        assert_eq!(d.version(), Some(Version::from(7)));
        assert_eq!(d.creation(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_version_must_be_numeric() {
        let d = doc(json!({ "version": "not-a-number" }));
        assert!(d.version().is_none());
    }

    #[test]
    fn test_merge_overrides_named_fields_only() {
        let mut d = doc(json!({ "id": "u1", "name": "A", "size": 3 }));
        let patch = doc(json!({ "name": "B" }));
        d.merge(patch.fields());

        assert_eq!(d.get("name"), Some(&json!("B")));
        assert_eq!(d.get("size"), Some(&json!(3)));
        assert_eq!(d.id(), Some("u1"));
    }

    #[test]
    fn test_key_emptiness() {
        assert!(Key::from("").is_empty());
        assert!(!Key::from("u1").is_empty());
        assert!(Key::Composite(BTreeMap::new()).is_empty());
        assert!(!Key::composite("order_id", json!("o-9")).is_empty());
    }

    #[test]
    fn test_composite_key_display_is_stable() {
        let k = Key::with_range("order", json!("o-9"), "line", json!(2));
        // BTreeMap ordering: "line" before "order".
        assert_eq!(k.to_string(), "line=2,order=\"o-9\"");
    }

    #[test]
    fn test_document_serde_is_transparent() {
        let d = doc(json!({ "id": "u1", "n": 1 }));
        let text = serde_json::to_string(&d).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(d, back);
    }

    proptest! {
        // Shallow merge: patched fields take the patch value, every
        // other field keeps its stored value.
        #[test]
        fn prop_merge_touches_only_named_fields(
            base in prop::collection::btree_map("[a-z]{1,6}", 0i64..100, 1..8),
            patch in prop::collection::btree_map("[a-z]{1,6}", 100i64..200, 1..8),
        ) {
            let mut d = Document::new();
            for (k, v) in &base {
                d.insert(k.clone(), json!(v));
            }
            let mut p = Map::new();
            for (k, v) in &patch {
                p.insert(k.clone(), json!(v));
            }
            d.merge(&p);

            for (k, v) in &patch {
                prop_assert_eq!(d.get(k), Some(&json!(v)));
            }
            for (k, v) in &base {
                if !patch.contains_key(k) {
                    prop_assert_eq!(d.get(k), Some(&json!(v)));
                }
            }
        }
    }
}
