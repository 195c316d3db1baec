//! Graph nodes carrying a family tag, a unique identity, a name and attributes
//!
//! A node's kind is a zero-sized marker implementing [`NodeKind`]; the kind
//! fixes the family tag and selects the identity counter:
//!
//! ```
//! use nodegraph::{Attribute, Node, NodeKind};
//!
//! struct Shader;
//!
//! impl NodeKind for Shader {
//!     const FAMILY: &'static str = "Shader";
//! }
//!
//! let mut node: Node<Shader> = Node::new();
//! assert!(node.name().starts_with("Shader"));
//!
//! node.add_attribute("roughness", Attribute::new(0.4)).unwrap();
//! assert_eq!(node.list_attribute_names(), ["roughness"]);
//! ```

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::registry::{Handle, Identity, Registration, Registry, Residence};
use crate::structure::{Structure, Value};

/// Fields that exist on every node and cannot be set or deleted dynamically
const READ_ONLY: [&str; 3] = ["family", "identity", "children"];

/// Marker for a concrete node kind
///
/// Each kind has its own identity counter and registry table, even when two
/// kinds share a [`FAMILY`](NodeKind::FAMILY) tag. An empty tag is rejected
/// at compile time:
///
/// ```compile_fail
/// use nodegraph::{Node, NodeKind};
///
/// struct Blank;
///
/// impl NodeKind for Blank {
///     const FAMILY: &'static str = "";
/// }
///
/// let _node: Node<Blank> = Node::new();
/// ```
pub trait NodeKind: 'static {
    /// Family tag, never empty
    const FAMILY: &'static str;

    /// Registry issuing identities for this kind
    fn registry() -> &'static Registry {
        Registry::global()
    }
}

/// The base node kind
#[derive(Debug, Clone, Copy)]
pub struct Abstract;

impl NodeKind for Abstract {
    const FAMILY: &'static str = "Abstract";
}

/// The default kind for nodes owned by a [`Tree`](crate::Tree)
#[derive(Debug, Clone, Copy)]
pub struct AbstractComposite;

impl NodeKind for AbstractComposite {
    const FAMILY: &'static str = "AbstractComposite";
}

/// Attribute payload: a value plus an optional display hint (icon, swatch...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Attribute {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A named entry on a node: either an attribute or a plain field
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Attribute(Attribute),
    Value(Value),
}

impl Field {
    fn kind_name(&self) -> &'static str {
        match self {
            Field::Attribute(_) => "attribute",
            Field::Value(v) => v.kind_name(),
        }
    }

    /// The carried value, for attributes their `value`
    pub fn value(&self) -> &Value {
        match self {
            Field::Attribute(a) => &a.value,
            Field::Value(v) => v,
        }
    }
}

impl From<Attribute> for Field {
    fn from(attribute: Attribute) -> Self {
        Field::Attribute(attribute)
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

/// Base graph node
pub struct Node<K: NodeKind = Abstract> {
    registration: Registration,
    name: String,
    fields: Structure<Field>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: NodeKind> Node<K> {
    /// Create a node named after its family and identity, e.g. `Abstract2`
    pub fn new() -> Self {
        const { assert!(!K::FAMILY.is_empty(), "node family tags must not be empty") };
        let registration = K::registry().register(TypeId::of::<K>(), K::FAMILY);
        let name = format!("{}{}", K::FAMILY, registration.identity());

        tracing::debug!(
            family = K::FAMILY,
            identity = %registration.identity(),
            "Initializing '{}' node",
            K::FAMILY
        );

        Self {
            registration,
            name,
            fields: Structure::new(),
            _kind: PhantomData,
        }
    }

    /// Create a node with an explicit name; an empty name falls back to the default
    pub fn named(name: impl Into<String>) -> Self {
        let mut node = Self::new();
        node.set_name(name);
        node
    }

    /// Create a node with an optional name and initial fields
    ///
    /// Fields may mix attributes and plain values. Read-only names and
    /// repeated names are rejected.
    pub fn with_fields<I, S>(name: Option<&str>, fields: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        let mut node = match name {
            Some(name) => Self::named(name),
            None => Self::new(),
        };
        for (field_name, field) in fields {
            let field_name = field_name.into();
            node.check_writable(&field_name)?;
            if node.fields.contains(&field_name) {
                return Err(GraphError::duplicate(field_name));
            }
            node.fields.insert(field_name, field);
        }
        Ok(node)
    }

    /// Find a live node of this kind by identity
    pub fn lookup(identity: i64) -> Option<Handle> {
        K::registry().lookup(TypeId::of::<K>(), identity)
    }

    pub fn family(&self) -> &'static str {
        K::FAMILY
    }

    pub fn identity(&self) -> Identity {
        self.registration.identity()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node; an empty name leaves the current one in place
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
    }

    fn check_writable(&self, name: &str) -> Result<(), GraphError> {
        if READ_ONLY.contains(&name) {
            return Err(GraphError::immutable(K::FAMILY, name));
        }
        Ok(())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(Field::Attribute(_)))
    }

    /// Add an attribute
    ///
    /// Fails if `field` is not an attribute payload, or if `name` is already
    /// used by any attribute or field of this node.
    pub fn add_attribute(&mut self, name: &str, field: impl Into<Field>) -> Result<(), GraphError> {
        let attribute = match field.into() {
            Field::Attribute(attribute) => attribute,
            other => return Err(GraphError::invalid_kind(name, "attribute", other.kind_name())),
        };
        self.check_writable(name)?;
        if self.fields.contains(name) {
            return Err(GraphError::duplicate(name));
        }
        self.fields.insert(name, Field::Attribute(attribute));
        Ok(())
    }

    /// Remove an attribute, returning it
    pub fn remove_attribute(&mut self, name: &str) -> Result<Attribute, GraphError> {
        if !self.has_attribute(name) {
            return Err(GraphError::missing(name));
        }
        match self.fields.remove(name)? {
            Field::Attribute(attribute) => Ok(attribute),
            Field::Value(_) => Err(GraphError::missing(name)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        match self.fields.get(name) {
            Some(Field::Attribute(a)) => Some(a),
            _ => None,
        }
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        match self.fields.get_mut(name) {
            Some(Field::Attribute(a)) => Some(a),
            _ => None,
        }
    }

    /// Attribute names in insertion order; plain fields are excluded
    pub fn list_attribute_names(&self) -> Vec<&str> {
        self.attributes().map(|(name, _)| name).collect()
    }

    /// Attribute payloads in insertion order; plain fields are excluded
    pub fn list_attribute_values(&self) -> Vec<&Attribute> {
        self.attributes().map(|(_, a)| a).collect()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.fields.iter().filter_map(|(name, field)| match field {
            Field::Attribute(a) => Some((name, a)),
            Field::Value(_) => None,
        })
    }

    /// Every field, attributes and plain values, in insertion order
    pub fn fields(&self) -> &Structure<Field> {
        &self.fields
    }

    /// Read a property by name: `family`, `identity`, `name` or any field
    pub fn property(&self, name: &str) -> Result<Value, GraphError> {
        match name {
            "family" => Ok(Value::from(K::FAMILY)),
            "identity" => Ok(Value::Integer(self.identity().get() as i64)),
            "name" => Ok(Value::from(self.name.as_str())),
            _ => self.fields.require(name).map(|f| f.value().clone()),
        }
    }

    /// Set a property by name from a dynamic value
    ///
    /// `name` must be text (an empty text is ignored). Setting an attribute
    /// updates its value and keeps its hint; any other name sets a plain field.
    pub fn set_property(&mut self, name: &str, value: Value) -> Result<(), GraphError> {
        self.check_writable(name)?;
        if name == "name" {
            return match value {
                Value::Text(text) => {
                    self.set_name(text);
                    Ok(())
                }
                other => Err(GraphError::invalid_kind("name", "text", other.kind_name())),
            };
        }
        match self.fields.get_mut(name) {
            Some(Field::Attribute(attribute)) => attribute.value = value,
            _ => {
                self.fields.insert(name, Field::Value(value));
            }
        }
        Ok(())
    }

    /// Delete a property by name; built-in properties cannot be deleted
    pub fn delete_property(&mut self, name: &str) -> Result<Field, GraphError> {
        if name == "name" {
            return Err(GraphError::immutable(K::FAMILY, name));
        }
        self.check_writable(name)?;
        self.fields.remove(name)
    }

    pub(crate) fn relocate(&self, residence: Residence) {
        self.registration.relocate(residence);
    }
}

impl<K: NodeKind> Default for Node<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKind> fmt::Debug for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("family", &K::FAMILY)
            .field("identity", &self.identity())
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<K: NodeKind> fmt::Display for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Isolated;

    impl NodeKind for Isolated {
        const FAMILY: &'static str = "Isolated";

        fn registry() -> &'static Registry {
            static REGISTRY: Registry = Registry::new();
            &REGISTRY
        }
    }

    struct Counted;

    impl NodeKind for Counted {
        const FAMILY: &'static str = "Counted";
    }

    struct Mesh;

    impl NodeKind for Mesh {
        const FAMILY: &'static str = "Shared";

        fn registry() -> &'static Registry {
            static REGISTRY: Registry = Registry::new();
            &REGISTRY
        }
    }

    struct Light;

    impl NodeKind for Light {
        const FAMILY: &'static str = "Shared";

        fn registry() -> &'static Registry {
            Mesh::registry()
        }
    }

    #[test]
    fn test_default_and_explicit_names() {
        let a: Node = Node::named("MyNodeA");
        assert_eq!(a.name(), "MyNodeA");
        assert_eq!(a.family(), "Abstract");

        let b: Node = Node::new();
        assert_eq!(b.name(), format!("Abstract{}", b.identity()));
        assert!(b.identity() > a.identity());

        let c: Node = Node::named("");
        assert_eq!(c.name(), format!("Abstract{}", c.identity()));
    }

    #[test]
    fn test_kinds_sharing_a_family_count_separately() {
        let mesh: Node<Mesh> = Node::new();
        let _mesh2: Node<Mesh> = Node::new();
        let light: Node<Light> = Node::new();

        assert_eq!(mesh.family(), light.family());
        assert_eq!(mesh.identity().get(), 1);
        assert_eq!(light.identity().get(), 1);
        assert_eq!(light.name(), "Shared1");

        assert!(Node::<Light>::lookup(2).is_none());
        let handle = Node::<Light>::lookup(1).unwrap();
        assert_eq!(handle.kind, TypeId::of::<Light>());

        drop(light);
        assert!(Node::<Light>::lookup(1).is_none());
        assert!(Node::<Mesh>::lookup(1).is_some());
    }

    #[test]
    fn test_rename_keeps_identity() {
        let mut node: Node = Node::named("before");
        let identity = node.identity();
        node.set_name("after");
        assert_eq!(node.name(), "after");
        node.set_name("");
        assert_eq!(node.name(), "after");
        assert_eq!(node.identity(), identity);
    }

    #[test]
    fn test_identities_are_never_reused() {
        let a: Node<Isolated> = Node::new();
        let b: Node<Isolated> = Node::new();
        let c: Node<Isolated> = Node::new();
        let b_identity = b.identity().get() as i64;
        drop(b);
        let d: Node<Isolated> = Node::new();

        assert!(a.identity() < c.identity());
        assert!(d.identity() > c.identity());
        assert!(Node::<Isolated>::lookup(b_identity).is_none());
        assert_eq!(
            Node::<Isolated>::lookup(d.identity().get() as i64).map(|h| h.identity),
            Some(d.identity())
        );
        assert!(Node::<Isolated>::lookup(0).is_none());
        assert!(Node::<Isolated>::lookup(-4).is_none());
        let beyond = Isolated::registry().highest_issued(TypeId::of::<Isolated>()) as i64 + 1;
        assert!(Node::<Isolated>::lookup(beyond).is_none());
    }

    #[test]
    fn test_attributes() {
        let mut node: Node = Node::named("MyNodeA");
        node.add_attribute("attributeA", Attribute::new("A")).unwrap();
        node.add_attribute("attributeB", Attribute::new("B").with_hint("icon.png"))
            .unwrap();

        assert!(node.has_attribute("attributeA"));
        assert!(!node.has_attribute("attributeC"));
        assert_eq!(node.list_attribute_names(), ["attributeA", "attributeB"]);
        assert_eq!(
            node.list_attribute_values()[1].hint.as_deref(),
            Some("icon.png")
        );

        let err = node.add_attribute("attributeA", Attribute::new("again")).unwrap_err();
        assert_eq!(err, GraphError::duplicate("attributeA"));
        assert_eq!(node.attribute("attributeA").unwrap().value, Value::from("A"));

        let removed = node.remove_attribute("attributeA").unwrap();
        assert_eq!(removed.value, Value::from("A"));
        assert_eq!(node.list_attribute_names(), ["attributeB"]);
        assert_eq!(
            node.remove_attribute("attributeA").unwrap_err(),
            GraphError::missing("attributeA")
        );
    }

    #[test]
    fn test_attribute_requires_attribute_payload() {
        let mut node: Node = Node::new();
        let err = node.add_attribute("plain", Value::Integer(3)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValueKind { expected: "attribute", .. }));
        assert!(node.fields().is_empty());
    }

    #[test]
    fn test_fields_are_not_attributes() {
        let node: Node = Node::with_fields(
            Some("mixed"),
            [
                ("weight", Field::Value(Value::Integer(3))),
                ("color", Field::Attribute(Attribute::new("red"))),
            ],
        )
        .unwrap();

        assert_eq!(node.list_attribute_names(), ["color"]);
        assert!(!node.has_attribute("weight"));
        assert_eq!(node.property("weight").unwrap(), Value::Integer(3));
        assert_eq!(node.fields().len(), 2);
    }

    #[test]
    fn test_with_fields_rejects_reserved_and_repeated_names() {
        let err = Node::<Abstract>::with_fields(None, [("identity", Field::Value(Value::Null))])
            .unwrap_err();
        assert!(matches!(err, GraphError::ImmutableAttribute { .. }));

        let err = Node::<Abstract>::with_fields(
            None,
            [
                ("a", Field::Value(Value::Null)),
                ("a", Field::Value(Value::Null)),
            ],
        )
        .unwrap_err();
        assert_eq!(err, GraphError::duplicate("a"));
    }

    #[test]
    fn test_read_only_properties() {
        let mut node: Node = Node::new();
        for name in ["family", "identity", "children"] {
            assert!(matches!(
                node.set_property(name, Value::Integer(1)),
                Err(GraphError::ImmutableAttribute { .. })
            ));
            assert!(matches!(
                node.delete_property(name),
                Err(GraphError::ImmutableAttribute { .. })
            ));
        }
        assert!(matches!(
            node.delete_property("name"),
            Err(GraphError::ImmutableAttribute { .. })
        ));
        assert!(matches!(
            node.add_attribute("family", Attribute::default()),
            Err(GraphError::ImmutableAttribute { .. })
        ));
        assert_eq!(node.property("family").unwrap(), Value::from("Abstract"));
    }

    #[test]
    fn test_set_property() {
        let mut node: Node = Node::new();
        node.set_property("name", Value::from("renamed")).unwrap();
        assert_eq!(node.name(), "renamed");

        let err = node.set_property("name", Value::Integer(7)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidValueKind { expected: "text", .. }));

        node.add_attribute("color", Attribute::new("red").with_hint("swatch"))
            .unwrap();
        node.set_property("color", Value::from("blue")).unwrap();
        let color = node.attribute("color").unwrap();
        assert_eq!(color.value, Value::from("blue"));
        assert_eq!(color.hint.as_deref(), Some("swatch"));

        node.set_property("weight", Value::Float(1.5)).unwrap();
        assert!(!node.has_attribute("weight"));
        node.delete_property("weight").unwrap();
        assert!(matches!(
            node.delete_property("weight"),
            Err(GraphError::MissingAttribute { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_attribute_names_keep_insertion_order(
            names in proptest::collection::hash_set("[a-z]{1,8}", 0..16)
        ) {
            let names: Vec<String> = names
                .into_iter()
                .filter(|n| !READ_ONLY.contains(&n.as_str()))
                .collect();
            let mut node: Node = Node::new();
            for name in &names {
                node.add_attribute(name, Attribute::new(name.as_str())).unwrap();
            }
            prop_assert_eq!(node.list_attribute_names(), names.iter().map(String::as_str).collect::<Vec<_>>());

            if let Some(first) = names.first() {
                prop_assert!(node.add_attribute(first, Attribute::default()).is_err());
                prop_assert_eq!(node.list_attribute_names().len(), names.len());
            }
        }

        #[test]
        fn prop_identities_strictly_increase(count in 1usize..32) {
            let nodes: Vec<Node<Counted>> = (0..count).map(|_| Node::new()).collect();
            for pair in nodes.windows(2) {
                prop_assert!(pair[0].identity() < pair[1].identity());
            }
        }
    }
}
