//! Parameter-state trees: the declarative specification consumed by both
//! generation and verification.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Forces a concrete implementing class.
pub const ATTR_CLASS: &str = "class";
/// Explicit element count for containers and arrays.
pub const ATTR_SIZE: &str = "size";
/// Names an externally stored fragment to merge in as a base.
pub const ATTR_DEFINITION: &str = "definition";
/// Names a previously generated object to reuse by identity.
pub const ATTR_REFERENCE: &str = "reference";

/// The `class` attribute value requesting a synthesized dynamic implementation.
pub const DYNAMIC_CLASS: &str = "dynamic";

const RECOGNIZED_ATTRIBUTES: [&str; 4] = [ATTR_CLASS, ATTR_SIZE, ATTR_DEFINITION, ATTR_REFERENCE];

/// One unit of the declarative parameter-state tree.
///
/// A node with no element map is a scalar/null leaf; a node with an element
/// map (possibly empty) is a structured node. Children are `Arc`-shared so
/// the traversal context can hold the current node without copying subtrees.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamNode {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    elements: Option<BTreeMap<String, Arc<ParamNode>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    attributes: BTreeMap<String, String>,
}

impl ParamNode {
    /// A leaf carrying no value: generates and verifies as null.
    pub fn null_leaf() -> Self {
        Self::default()
    }

    /// A leaf carrying a literal textual scalar.
    pub fn value_leaf(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A structured node with no children yet.
    pub fn structured() -> Self {
        Self {
            elements: Some(BTreeMap::new()),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, name: impl Into<String>, child: ParamNode) -> Self {
        self.elements
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), Arc::new(child));
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether this node is a scalar/null leaf (no element map at all).
    pub fn is_leaf(&self) -> bool {
        self.elements.is_none()
    }

    /// Child keys, in stored order. Empty for leaves.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements
            .iter()
            .flat_map(|elements| elements.keys())
            .map(String::as_str)
    }

    pub fn element(&self, name: &str) -> Option<&Arc<ParamNode>> {
        self.elements.as_ref().and_then(|e| e.get(name))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The explicit `size` attribute when present and numeric, else the
    /// element count of a structured node, else `None`. The generator's
    /// "structurally empty leaf" rule and container sizing both key on this.
    pub fn size_param(&self) -> Option<usize> {
        if let Some(size) = self.attributes.get(ATTR_SIZE) {
            if let Ok(size) = size.parse() {
                return Some(size);
            }
        }
        self.elements.as_ref().map(BTreeMap::len)
    }

    /// Deep merge: `over` wins over `base` on the value, on conflicting
    /// attributes, and recursively on conflicting children; names are
    /// unioned. Used when resolving a `definition` attribute, with the
    /// inline node as `over`.
    pub fn merged(base: &ParamNode, over: &ParamNode) -> ParamNode {
        let mut attributes = base.attributes.clone();
        attributes.extend(over.attributes.clone());
        let elements = match (&base.elements, &over.elements) {
            (None, None) => None,
            (Some(elements), None) | (None, Some(elements)) => Some(elements.clone()),
            (Some(base_elements), Some(over_elements)) => {
                let mut merged = base_elements.clone();
                for (name, child) in over_elements {
                    let child = match base_elements.get(name) {
                        Some(base_child) => Arc::new(Self::merged(base_child, child)),
                        None => Arc::clone(child),
                    };
                    merged.insert(name.clone(), child);
                }
                Some(merged)
            }
        };
        ParamNode {
            value: over.value.clone().or_else(|| base.value.clone()),
            elements,
            attributes,
        }
    }

    /// Builds a specification tree from a JSON literal.
    ///
    /// Objects become structured nodes; the keys `class`, `size`,
    /// `definition` and `reference` (with or without a leading `@`) become
    /// attributes and every other key a child. Arrays become structured
    /// nodes keyed by decimal index, scalars become value leaves, and
    /// `null` becomes an empty leaf.
    pub fn from_json(json: &JsonValue) -> ParamNode {
        match json {
            JsonValue::Null => ParamNode::null_leaf(),
            JsonValue::Bool(value) => ParamNode::value_leaf(value.to_string()),
            JsonValue::Number(value) => ParamNode::value_leaf(value.to_string()),
            JsonValue::String(value) => ParamNode::value_leaf(value.clone()),
            JsonValue::Array(items) => {
                let mut node = ParamNode::structured();
                for (index, item) in items.iter().enumerate() {
                    node = node.with_element(index.to_string(), Self::from_json(item));
                }
                node
            }
            JsonValue::Object(map) => {
                let mut node = ParamNode::structured();
                for (key, value) in map {
                    let bare = key.strip_prefix('@').unwrap_or(key);
                    if RECOGNIZED_ATTRIBUTES.contains(&bare) {
                        node = node.with_attribute(bare, json_attribute_text(value));
                    } else {
                        node = node.with_element(key.clone(), Self::from_json(value));
                    }
                }
                node
            }
        }
    }
}

fn json_attribute_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}
