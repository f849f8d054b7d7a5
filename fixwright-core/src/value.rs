//! The dynamic value model: object graphs produced by generation.
//!
//! Composite values are `Arc`-shared, so clones observe identity — the
//! `reference` attribute resolves to the same instance, never a structural
//! copy. Equality is structural for scalars and identity for composites.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::class::{ClassId, ClassRegistry};
use crate::error::GenerateError;

/// A generated or observed value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    /// Milliseconds since the epoch, full `i64` range.
    Date(i64),
    /// A constant of a registered enum class.
    Enum { class: ClassId, constant: String },
    Seq(Arc<SeqValue>),
    Map(Arc<MapValue>),
    Object(Arc<ObjectValue>),
    Synthetic(Arc<SyntheticValue>),
    /// A deferred assignment recorded for later external resolution.
    Pending(String),
}

/// Distinguishes the sequence natures sharing one representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqKind {
    Array,
    List,
    Set,
}

/// An array, list or set.
///
/// `class` is the container class for lists and sets, and the component
/// class for arrays (arrays have no registered class of their own).
#[derive(Debug)]
pub struct SeqValue {
    pub class: ClassId,
    pub kind: SeqKind,
    pub items: Vec<Value>,
}

/// An associative container with final-membership semantics: inserting an
/// equal key replaces the earlier entry, and lookup order is irrelevant.
#[derive(Debug)]
pub struct MapValue {
    pub class: ClassId,
    pub entries: Vec<(Value, Value)>,
}

impl MapValue {
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An instance of a registered struct class.
#[derive(Debug)]
pub struct ObjectValue {
    pub class: ClassId,
    pub fields: BTreeMap<String, Value>,
}

impl ObjectValue {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A synthesized implementation of a registered interface: capability
/// results precomputed at construction time, keyed by qualified signature.
#[derive(Debug)]
pub struct SyntheticValue {
    pub class: ClassId,
    pub results: BTreeMap<String, Value>,
}

impl SyntheticValue {
    /// Returns the precomputed result for a capability, failing for any
    /// capability no value was ever generated for.
    pub fn invoke(
        &self,
        registry: &ClassRegistry,
        signature: &str,
    ) -> Result<&Value, GenerateError> {
        self.results.get(signature).ok_or_else(|| {
            GenerateError::method_execution(format!(
                "implementation of {}.{signature} not provided",
                registry.name(self.class)
            ))
        })
    }
}

impl Value {
    pub fn seq(class: ClassId, kind: SeqKind, items: Vec<Value>) -> Self {
        Value::Seq(Arc::new(SeqValue { class, kind, items }))
    }

    pub fn map(class: ClassId, entries: Vec<(Value, Value)>) -> Self {
        Value::Map(Arc::new(MapValue { class, entries }))
    }

    pub fn object(class: ClassId, fields: BTreeMap<String, Value>) -> Self {
        Value::Object(Arc::new(ObjectValue { class, fields }))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The class a textual comparison value should be converted to; `None`
    /// for null, arrays and pending assignments.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Value::Null | Value::Pending(_) => None,
            Value::Bool(_) => Some(ClassId::BOOL),
            Value::I32(_) => Some(ClassId::I32),
            Value::I64(_) => Some(ClassId::I64),
            Value::F32(_) => Some(ClassId::F32),
            Value::F64(_) => Some(ClassId::F64),
            Value::Char(_) => Some(ClassId::CHAR),
            Value::Str(_) => Some(ClassId::STR),
            Value::Date(_) => Some(ClassId::DATE),
            Value::Enum { class, .. } => Some(*class),
            Value::Seq(seq) => match seq.kind {
                SeqKind::Array => None,
                _ => Some(seq.class),
            },
            Value::Map(map) => Some(map.class),
            Value::Object(object) => Some(object.class),
            Value::Synthetic(synthetic) => Some(synthetic.class),
        }
    }

    /// The runtime class name used by `class`-attribute verification;
    /// `None` for null.
    pub fn class_label(&self, registry: &ClassRegistry) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Pending(_) => Some("pending".to_string()),
            Value::Seq(seq) if seq.kind == SeqKind::Array => {
                Some(format!("{}[]", registry.name(seq.class)))
            }
            other => other
                .class_id()
                .map(|class| registry.name(class).to_string()),
        }
    }

    /// A JSON rendering for reports and diagnostics.
    pub fn to_json(&self, registry: &ClassRegistry) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(value) => json!(value),
            Value::I32(value) => json!(value),
            Value::I64(value) => json!(value),
            Value::F32(value) => json!(value),
            Value::F64(value) => json!(value),
            Value::Char(value) => json!(value.to_string()),
            Value::Str(value) => json!(value),
            Value::Date(millis) => json!(millis),
            Value::Enum { constant, .. } => json!(constant),
            Value::Seq(seq) => JsonValue::Array(
                seq.items
                    .iter()
                    .map(|item| item.to_json(registry))
                    .collect(),
            ),
            Value::Map(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in &map.entries {
                    object.insert(key.render(registry), value.to_json(registry));
                }
                JsonValue::Object(object)
            }
            Value::Object(object) => {
                let mut fields = serde_json::Map::new();
                for (name, value) in &object.fields {
                    fields.insert(name.clone(), value.to_json(registry));
                }
                JsonValue::Object(fields)
            }
            Value::Synthetic(synthetic) => {
                let mut results = serde_json::Map::new();
                for (signature, value) in &synthetic.results {
                    results.insert(signature.clone(), value.to_json(registry));
                }
                JsonValue::Object(results)
            }
            Value::Pending(target) => json!(format!("<pending:{target}>")),
        }
    }

    /// A short textual rendering: scalars print bare, composites as JSON.
    pub fn render(&self, registry: &ClassRegistry) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::I32(value) => value.to_string(),
            Value::I64(value) => value.to_string(),
            Value::F32(value) => value.to_string(),
            Value::F64(value) => value.to_string(),
            Value::Char(value) => value.to_string(),
            Value::Str(value) => value.clone(),
            Value::Date(millis) => millis.to_string(),
            Value::Enum { constant, .. } => constant.clone(),
            other => other.to_json(registry).to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (
                Value::Enum {
                    class: ca,
                    constant: a,
                },
                Value::Enum {
                    class: cb,
                    constant: b,
                },
            ) => ca == cb && a == b,
            (Value::Seq(a), Value::Seq(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Synthetic(a), Value::Synthetic(b)) => Arc::ptr_eq(a, b),
            (Value::Pending(a), Value::Pending(b)) => a == b,
            _ => false,
        }
    }
}
