//! Attribute values and bounded attribute sets.
//!
//! [`AttrValue`] is the tagged value stored against an attribute name. It
//! serializes untagged, so `{"n": 1, "s": "x", "b": true}` is the wire shape
//! regardless of kind.
//!
//! [`AttributeSet`] enforces the validation rules on insert. A rejected
//! attribute is not stored; instead the first violation of each
//! [`ErrorKind`] is kept and serialized under that kind's diagnostic key.
//! Diagnostics do not count toward the attribute bound.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::ReservedAttribute;
use crate::validation::{self, AttributeScope, ErrorKind, Violation};

/// A single attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),
    /// Integral number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
}

impl AttrValue {
    /// Convert to a JSON value. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    /// Borrow the text if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

/// A user attribute as stored and sent: the value and when it was set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAttribute {
    /// The attribute value.
    pub value: AttrValue,
    /// Epoch ms of the last change.
    pub set_timestamp: i64,
}

/// The full user attribute store, keyed by name.
pub type UserAttributes = BTreeMap<String, UserAttribute>;

/// Reduced user view attached to ordinary events: only the user id and the
/// first-touch timestamp.
pub fn simple_user_view(all: &UserAttributes) -> UserAttributes {
    [
        ReservedAttribute::USER_ID,
        ReservedAttribute::USER_FIRST_TOUCH_TIMESTAMP,
    ]
    .into_iter()
    .filter_map(|key| all.get(key).map(|attr| (key.to_owned(), attr.clone())))
    .collect()
}

/// A bounded, validated set of attributes.
#[derive(Clone, Debug)]
pub struct AttributeSet {
    scope: AttributeScope,
    values: BTreeMap<String, AttrValue>,
    diagnostics: BTreeMap<ErrorKind, Violation>,
}

impl AttributeSet {
    /// Empty set with the given scope's limits.
    pub fn new(scope: AttributeScope) -> Self {
        Self {
            scope,
            values: BTreeMap::new(),
            diagnostics: BTreeMap::new(),
        }
    }

    /// Seed a set from an already-validated snapshot (e.g. global attributes).
    pub fn from_snapshot(scope: AttributeScope, values: BTreeMap<String, AttrValue>) -> Self {
        Self {
            scope,
            values,
            diagnostics: BTreeMap::new(),
        }
    }

    /// Validate and insert. On rejection the attribute is dropped, the
    /// violation is remembered (first per kind), and a copy is returned.
    pub fn insert(&mut self, name: &str, value: AttrValue) -> Result<(), Violation> {
        let current = if self.values.contains_key(name) {
            self.values.len() - 1
        } else {
            self.values.len()
        };
        match validation::validate_attribute(self.scope, current, name, &value) {
            Ok(()) => {
                let _ = self.values.insert(name.to_owned(), value);
                Ok(())
            }
            Err(violation) => {
                let _ = self
                    .diagnostics
                    .entry(violation.kind)
                    .or_insert_with(|| violation.clone());
                Err(violation)
            }
        }
    }

    /// Insert an SDK-owned attribute without validation.
    pub fn insert_reserved(&mut self, name: &str, value: AttrValue) {
        let _ = self.values.insert(name.to_owned(), value);
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// Number of stored attributes (diagnostics excluded).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no attributes are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored attributes, by name.
    pub fn values(&self) -> &BTreeMap<String, AttrValue> {
        &self.values
    }

    /// Recorded diagnostics, one per kind.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Violation> {
        self.diagnostics.values()
    }

    /// Wire form: attributes plus one `_error_*` entry per recorded kind.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        for violation in self.diagnostics.values() {
            let _ = map.insert(
                violation.kind.diagnostic_key().to_owned(),
                Value::String(violation.message.clone()),
            );
        }
        map
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
