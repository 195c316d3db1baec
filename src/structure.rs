//! Ordered attribute container
//!
//! [`Structure`] is an insertion-ordered mapping from name to value. It is used
//! stand-alone as a lightweight dynamic record (with the default [`Value`]
//! payload) and as the storage substrate for node attributes.
//! Records nest through [`Value::Record`] and can be addressed with dotted
//! paths.
//!
//! ```
//! use nodegraph::{Structure, Value};
//!
//! let mut person: Structure = [("John", "Doe"), ("Jane", "Doe")]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), Value::from(v)))
//!     .collect();
//!
//! person.insert("age", Value::Integer(42));
//! assert_eq!(person.keys().collect::<Vec<_>>(), ["John", "Jane", "age"]);
//! assert_eq!(person.get_as::<i64>("age").unwrap(), 42);
//! assert_eq!(person.keys_of(&Value::from("Doe")), ["John", "Jane"]);
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Dynamically typed payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Record(Structure<Value>),
}

impl Value {
    /// Name of the payload kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(record) => {
                write!(f, "{{")?;
                for (i, (name, item)) in record.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Structure<Value>> for Value {
    fn from(record: Structure<Value>) -> Self {
        Value::Record(record)
    }
}

/// Typed extraction from a [`Value`], failing with the expected kind name
pub trait FromValue<'a>: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: &'a Value) -> Option<Self>;
}

impl<'a> FromValue<'a> for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for &'a str {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> FromValue<'a> for &'a [Value] {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for &'a Structure<Value> {
    const EXPECTED: &'static str = "record";

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Insertion-ordered name → value mapping
///
/// Removal keeps the relative order of the remaining entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Structure<V = Value> {
    entries: IndexMap<String, V>,
}

impl<V> Structure<V> {
    /// Create an empty container
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Set `name` to `value`, returning the previous value
    ///
    /// Overwriting keeps the entry at its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.entries.get_mut(name)
    }

    /// Get `name` or fail with [`GraphError::MissingAttribute`]
    pub fn require(&self, name: &str) -> Result<&V, GraphError> {
        self.get(name).ok_or_else(|| GraphError::missing(name))
    }

    /// Remove `name`, failing with [`GraphError::MissingAttribute`] if absent
    pub fn remove(&mut self, name: &str) -> Result<V, GraphError> {
        self.entries
            .shift_remove(name)
            .ok_or_else(|| GraphError::missing(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: PartialEq> Structure<V> {
    /// First name (in insertion order) holding a value equal to `value`
    pub fn first_key_of(&self, value: &V) -> Option<&str> {
        self.iter().find(|(_, v)| *v == value).map(|(k, _)| k)
    }

    /// Every name holding a value equal to `value`, in insertion order
    pub fn keys_of(&self, value: &V) -> Vec<&str> {
        self.iter()
            .filter(|(_, v)| *v == value)
            .map(|(k, _)| k)
            .collect()
    }
}

impl Structure<Value> {
    /// Get `name` converted to `T`
    ///
    /// A missing name and a payload of the wrong kind are distinct errors.
    pub fn get_as<'a, T: FromValue<'a>>(&'a self, name: &str) -> Result<T, GraphError> {
        let value = self.require(name)?;
        T::from_value(value).ok_or_else(|| GraphError::invalid_kind(name, T::EXPECTED, value.kind_name()))
    }

    /// Value at a dotted path such as `camera.lens.focal`
    ///
    /// Every segment but the last must name a [`Value::Record`].
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut value = self.get(segments.next()?)?;
        for segment in segments {
            match value {
                Value::Record(record) => value = record.get(segment)?,
                _ => return None,
            }
        }
        Some(value)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    /// Set the value at a dotted path, creating intermediate records
    ///
    /// Fails with [`GraphError::InvalidValueKind`] when an intermediate
    /// segment already holds something other than a record. Returns the
    /// previous value at the path.
    pub fn set_path(&mut self, path: &str, value: Value) -> Result<Option<Value>, GraphError> {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };

        let mut current = self;
        let mut walked = String::new();
        for segment in parents.into_iter().flat_map(|p| p.split('.')) {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let slot = current
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Value::Record(Structure::new()));
            current = match slot {
                Value::Record(record) => record,
                other => return Err(GraphError::invalid_kind(walked, "record", other.kind_name())),
            };
        }

        Ok(current.insert(last, value))
    }
}

impl<V> Default for Structure<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Structure<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<V> IntoIterator for Structure<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Structure {
        [("personA", "John"), ("personB", "Jane"), ("personC", "Luke")]
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect()
    }

    #[test]
    fn test_ordered_keys() {
        let mut structure = people();
        assert_eq!(
            structure.keys().collect::<Vec<_>>(),
            ["personA", "personB", "personC"]
        );

        structure.insert("personA", Value::from("Anakin"));
        assert_eq!(structure.get("personA"), Some(&Value::from("Anakin")));
        assert_eq!(structure.keys().next(), Some("personA"));

        structure.remove("personA").unwrap();
        assert!(!structure.contains("personA"));
        assert_eq!(structure.keys().collect::<Vec<_>>(), ["personB", "personC"]);
    }

    #[test]
    fn test_missing_and_wrong_kind_are_distinct() {
        let mut structure = people();
        structure.insert("age", Value::Integer(30));

        assert_eq!(structure.get_as::<i64>("age").unwrap(), 30);
        assert_eq!(structure.get_as::<&str>("personB").unwrap(), "Jane");

        match structure.get_as::<i64>("personA") {
            Err(GraphError::InvalidValueKind { expected, found, .. }) => {
                assert_eq!(expected, "integer");
                assert_eq!(found, "text");
            }
            other => panic!("unexpected: {:?}", other),
        }

        assert!(matches!(
            structure.get_as::<i64>("nobody"),
            Err(GraphError::MissingAttribute { .. })
        ));
        assert!(matches!(
            structure.remove("nobody"),
            Err(GraphError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_reverse_lookup() {
        let lookup: Structure = [("firstName", "Doe"), ("lastName", "John"), ("gender", "male")]
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();
        assert_eq!(lookup.first_key_of(&Value::from("Doe")), Some("firstName"));
        assert_eq!(lookup.first_key_of(&Value::from("Skywalker")), None);

        let lookup: Structure = [("John", "Doe"), ("Jane", "Doe"), ("Luke", "Skywalker")]
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();
        assert_eq!(lookup.keys_of(&Value::from("Doe")), ["John", "Jane"]);
    }

    #[test]
    fn test_structure_serde_keeps_order() {
        let structure: Structure = serde_json::from_str(r#"{"zeta": 1, "alpha": "a", "mid": [true]}"#).unwrap();
        assert_eq!(structure.keys().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
        assert_eq!(
            serde_json::to_string(&structure).unwrap(),
            r#"{"zeta":1,"alpha":"a","mid":[true]}"#
        );
    }

    #[test]
    fn test_nested_paths() {
        let mut nest = Structure::new();
        assert_eq!(nest.set_path("my.deeply.nested.attribute", Value::Integer(64)), Ok(None));

        assert!(nest.contains_path("my.deeply.nested.attribute"));
        assert_eq!(
            nest.get_path("my.deeply.nested.attribute"),
            Some(&Value::Integer(64))
        );
        assert!(matches!(nest.get_path("my.deeply"), Some(Value::Record(_))));
        assert_eq!(nest.get_as::<&Structure>("my").unwrap().len(), 1);

        // Siblings join the existing records
        nest.set_path("my.deeply.shallow", Value::from("x")).unwrap();
        assert_eq!(
            nest.get_path("my.deeply").map(|v| v.to_string()).as_deref(),
            Some("{nested: {attribute: 64}, shallow: x}")
        );
        assert_eq!(
            nest.set_path("my.deeply.shallow", Value::from("y")),
            Ok(Some(Value::from("x")))
        );
    }

    #[test]
    fn test_missing_and_blocked_paths() {
        let mut nest = Structure::new();
        nest.set_path("a.b", Value::Integer(1)).unwrap();

        assert!(!nest.contains_path("a.c"));
        assert!(!nest.contains_path("a.b.c"));
        assert!(!nest.contains_path("missing.path"));
        assert_eq!(nest.get_path("a.b.c"), None);

        match nest.set_path("a.b.c", Value::Null) {
            Err(GraphError::InvalidValueKind { context, expected, found }) => {
                assert_eq!(context, "a.b");
                assert_eq!(expected, "record");
                assert_eq!(found, "integer");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(nest.get_path("a.b"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_record_serde() {
        let value: Value = serde_json::from_str(r#"{"lens": {"focal": 35}, "on": true}"#).unwrap();
        let Value::Record(record) = &value else {
            panic!("expected a record, got {:?}", value);
        };
        assert_eq!(record.keys().collect::<Vec<_>>(), ["lens", "on"]);
        assert_eq!(record.get_path("lens.focal"), Some(&Value::Integer(35)));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"lens":{"focal":35},"on":true}"#
        );
    }

    #[test]
    fn test_value_serde() {
        let value: Value = serde_json::from_str(r#"[1, "two", 3.5, true, null]"#).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Integer(1),
                Value::from("two"),
                Value::Float(3.5),
                Value::Bool(true),
                Value::Null,
            ])
        );
        assert_eq!(value.to_string(), "[1, two, 3.5, true, null]");
    }
}
