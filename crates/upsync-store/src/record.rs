//! Record and value types for store operations.
//!
//! Records, field payloads, natural keys, filters, and update sets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::ids::RecordId;

/// A value for a record field, untyped from the store's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value (null).
    Null,
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// A floating-point value.
    Float(f64),
    /// Multiple values.
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Get as a string if this is a string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Compare a scalar value against a string representation.
    ///
    /// Arrays match when any element matches. Used by [`Filter::matches`].
    pub fn matches_str(&self, other: &str) -> bool {
        match self {
            FieldValue::String(s) => s == other,
            FieldValue::Integer(i) => i.to_string() == other,
            FieldValue::Boolean(b) => b.to_string() == other,
            FieldValue::Float(f) => f.to_string() == other,
            FieldValue::Array(values) => values.iter().any(|v| v.matches_str(other)),
            FieldValue::Null => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i64::from(i))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<&RecordId> for FieldValue {
    fn from(id: &RecordId) -> Self {
        FieldValue::String(id.as_str().to_string())
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(vec: Vec<T>) -> Self {
        FieldValue::Array(vec.into_iter().map(Into::into).collect())
    }
}

/// A mapping of field name to value, used as the opaque record payload
/// and as the update set for write operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(flatten)]
    fields: HashMap<String, FieldValue>,
}

impl FieldSet {
    /// Create a new empty field set.
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Set a field using builder pattern.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a single-valued string field.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_string)
    }

    /// Check if a field exists.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Overwrite fields in this set with the fields of `other`.
    pub fn apply(&mut self, other: &FieldSet) {
        for (name, value) in other.iter() {
            self.fields.insert(name.clone(), value.clone());
        }
    }
}

impl FromIterator<(String, FieldValue)> for FieldSet {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A business-meaningful matching key, as opposed to a store-assigned
/// surrogate identifier.
///
/// A key is an ordered, non-empty tuple of string components; a single
/// name is the common case, composite keys (e.g. last name + region)
/// are supported. Keys with no components or blank components cannot be
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct NaturalKey(Vec<String>);

impl NaturalKey {
    /// Create a single-component key. Returns `None` for a blank value.
    pub fn single(value: impl Into<String>) -> Option<Self> {
        Self::composite(vec![value.into()])
    }

    /// Create a composite key. Returns `None` if the component list is
    /// empty or any component is blank.
    pub fn composite(components: Vec<String>) -> Option<Self> {
        if components.is_empty() || components.iter().any(|c| c.trim().is_empty()) {
            None
        } else {
            Some(Self(components))
        }
    }

    /// Get the key components in order.
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Return a copy of this key with all components lowercased.
    #[must_use]
    pub fn to_lowercase(&self) -> Self {
        Self(self.0.iter().map(|c| c.to_lowercase()).collect())
    }
}

impl TryFrom<Vec<String>> for NaturalKey {
    type Error = String;

    // deserialization goes through the same guard as the constructors
    fn try_from(components: Vec<String>) -> Result<Self, Self::Error> {
        Self::composite(components)
            .ok_or_else(|| "natural key requires at least one non-blank component".to_string())
    }
}

impl From<NaturalKey> for Vec<String> {
    fn from(key: NaturalKey) -> Self {
        key.0
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("|"))
    }
}

/// A logical entity held in, or destined for, a record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Surrogate identifier; present only after creation or when the
    /// record was read from a store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Explicit natural key. May be omitted when the key is derived
    /// from fields by the caller's key specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<NaturalKey>,

    /// Opaque field payload.
    #[serde(default)]
    pub fields: FieldSet,
}

impl Record {
    /// Create a record with the given field payload.
    pub fn new(fields: FieldSet) -> Self {
        Self {
            id: None,
            key: None,
            fields,
        }
    }

    /// Set the explicit natural key.
    #[must_use]
    pub fn with_key(mut self, key: NaturalKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the surrogate identifier.
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Filter for query-by-field snapshot reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Match records where the field equals the value.
    Equals { field: String, value: String },

    /// Match records where the field exists with any non-null value.
    Present { field: String },

    /// Logical AND of multiple filters.
    And { filters: Vec<Filter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<Filter> },
}

impl Filter {
    /// Create an equals filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a present (field exists) filter.
    pub fn present(field: impl Into<String>) -> Self {
        Filter::Present {
            field: field.into(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Combine this filter with another using AND.
    #[must_use]
    pub fn and_with(self, other: Filter) -> Self {
        match self {
            Filter::And { mut filters } => {
                filters.push(other);
                Filter::And { filters }
            }
            _ => Filter::And {
                filters: vec![self, other],
            },
        }
    }

    /// Evaluate this filter against a field payload.
    pub fn matches(&self, fields: &FieldSet) -> bool {
        match self {
            Filter::Equals { field, value } => fields
                .get(field)
                .map(|v| v.matches_str(value))
                .unwrap_or(false),
            Filter::Present { field } => fields.get(field).map(|v| !v.is_null()).unwrap_or(false),
            Filter::And { filters } => filters.iter().all(|f| f.matches(fields)),
            Filter::Or { filters } => filters.iter().any(|f| f.matches(fields)),
        }
    }
}

/// A single entry of a batch update call: target identifier plus the
/// fields to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Identifier of the record to update.
    pub id: RecordId,
    /// Fields to write.
    pub fields: FieldSet,
}

impl RecordUpdate {
    /// Create a new update entry.
    pub fn new(id: RecordId, fields: FieldSet) -> Self {
        Self { id, fields }
    }
}
