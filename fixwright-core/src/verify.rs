//! Structural verification of produced values against parameter-state
//! trees.
//!
//! Verification mirrors the generator's structural recognition but is
//! read-only and total: a failed comparison at one path never prevents
//! sibling or ancestor paths from being checked, and shape mismatches abort
//! only the subtree they occur in.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::param::{ParamNode, ATTR_CLASS, ATTR_SIZE};
use crate::value::Value;

/// One path-scoped outcome comparing expected against actual.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    name: String,
    expected: Option<String>,
    actual: Option<String>,
    success: bool,
    message: Option<String>,
}

impl VerificationResult {
    pub fn new(
        name: impl Into<String>,
        expected: Option<String>,
        actual: Option<String>,
        success: bool,
        message: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            expected,
            actual,
            success,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub fn actual(&self) -> Option<&str> {
        self.actual.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "Success {}.", self.name)?;
        } else {
            write!(
                f,
                "Failure {}. Expected: {} actual: {}",
                self.name,
                self.expected.as_deref().unwrap_or("null"),
                self.actual.as_deref().unwrap_or("null"),
            )?;
        }
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

/// Walks a produced object graph against an expected specification node,
/// emitting one result per checked path.
pub struct ExecutionVerifier {
    config: EngineConfig,
}

impl ExecutionVerifier {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Verifies `actual` against `expected`; an absent specification checks
    /// nothing.
    pub fn verify(
        &self,
        name: &str,
        actual: &Value,
        expected: Option<&ParamNode>,
    ) -> Vec<VerificationResult> {
        let mut results = Vec::new();
        if let Some(expected) = expected {
            self.verify_node(&mut results, name, actual, expected);
        }
        debug!(
            "verified '{name}': {} checks, {} failed",
            results.len(),
            results.iter().filter(|result| !result.is_success()).count()
        );
        results
    }

    fn verify_node(
        &self,
        results: &mut Vec<VerificationResult>,
        name: &str,
        actual: &Value,
        expected: &ParamNode,
    ) {
        self.verify_class(results, name, expected.attribute(ATTR_CLASS), actual);

        if expected.is_leaf() {
            self.verify_leaf(results, name, actual, expected);
            return;
        }
        match actual {
            Value::Seq(seq) => {
                self.check_size(results, name, expected, seq.items.len());
                for child in expected.names() {
                    let sub = expected.element(child).expect("named element");
                    let index: usize = match child.parse() {
                        Ok(index) => index,
                        Err(_) => {
                            results.push(VerificationResult::new(
                                format!("{name}.{child}"),
                                Some("integer index".to_string()),
                                Some(child.to_string()),
                                false,
                                None,
                            ));
                            continue;
                        }
                    };
                    if index >= seq.items.len() {
                        results.push(VerificationResult::new(
                            format!("{name}.size()"),
                            Some((index + 1).to_string()),
                            Some(seq.items.len().to_string()),
                            false,
                            None,
                        ));
                    } else {
                        self.verify_node(
                            results,
                            &format!("{name}.{child}"),
                            &seq.items[index],
                            sub,
                        );
                    }
                }
            }
            Value::Map(map) => {
                self.check_size(results, name, expected, map.len());
                for child in expected.names() {
                    let entry = expected.element(child).expect("named element");
                    if entry.is_leaf() {
                        results.push(VerificationResult::new(
                            name,
                            Some("key,value for map".to_string()),
                            None,
                            false,
                            None,
                        ));
                        continue;
                    }
                    let mut key_text: Option<String> = None;
                    let mut value_state = None;
                    for entry_name in entry.names() {
                        match entry_name {
                            "key" => {
                                key_text = entry
                                    .element("key")
                                    .and_then(|key| key.value())
                                    .map(str::to_string);
                            }
                            "value" => value_state = entry.element("value"),
                            other => {
                                results.push(VerificationResult::new(
                                    name,
                                    Some("'key' or 'value' entries allowed".to_string()),
                                    Some(other.to_string()),
                                    false,
                                    None,
                                ));
                                break;
                            }
                        }
                    }
                    let Some(key_text) = key_text else {
                        results.push(VerificationResult::new(
                            name,
                            Some("key entry".to_string()),
                            None,
                            false,
                            None,
                        ));
                        continue;
                    };
                    // only simple textual keys are supported
                    let probe = Value::Str(key_text.clone());
                    match value_state {
                        None => {
                            let contains = map.contains_key(&probe);
                            results.push(VerificationResult::new(
                                format!("{name}[{key_text}]"),
                                Some("containsKey".to_string()),
                                Some(if contains { "contains" } else { "missing" }.to_string()),
                                contains,
                                None,
                            ));
                            // a presence check ends the scan of the
                            // remaining entries
                            break;
                        }
                        Some(value_node) => {
                            let value = map.get(&probe).unwrap_or(&Value::Null);
                            self.verify_node(
                                results,
                                &format!("{name}[{key_text}]"),
                                value,
                                value_node,
                            );
                        }
                    }
                }
            }
            Value::Object(object) => {
                for child in expected.names() {
                    let sub = expected.element(child).expect("named element");
                    match object.field(child) {
                        Some(field_value) => {
                            self.verify_node(results, &format!("{name}.{child}"), field_value, sub);
                        }
                        None => {
                            results.push(VerificationResult::new(
                                format!("{name}.{child}"),
                                Some(render_node(sub)),
                                None,
                                false,
                                Some(format!(
                                    "field '{child}' not found in '{}'",
                                    self.config.registry().name(object.class)
                                )),
                            ));
                        }
                    }
                }
            }
            other => {
                // the shape mismatch fails every declared child and aborts
                // this subtree
                let label = other
                    .class_label(self.config.registry())
                    .unwrap_or_else(|| "null".to_string());
                for child in expected.names() {
                    let sub = expected.element(child).expect("named element");
                    results.push(VerificationResult::new(
                        format!("{name}.{child}"),
                        Some(render_node(sub)),
                        None,
                        false,
                        Some(format!("cannot read field '{child}' from '{label}'")),
                    ));
                }
            }
        }
    }

    fn verify_leaf(
        &self,
        results: &mut Vec<VerificationResult>,
        name: &str,
        actual: &Value,
        expected: &ParamNode,
    ) {
        let registry = self.config.registry();
        match expected.value() {
            None => {
                let success = actual.is_null();
                let rendered = (!actual.is_null()).then(|| actual.render(registry));
                results.push(VerificationResult::new(name, None, rendered, success, None));
            }
            Some(text) if actual.is_null() => {
                results.push(VerificationResult::new(
                    name,
                    Some(text.to_string()),
                    None,
                    false,
                    None,
                ));
            }
            Some(text) => {
                let Some(class) = actual.class_id() else {
                    results.push(VerificationResult::new(
                        name,
                        Some(text.to_string()),
                        Some(actual.render(registry)),
                        false,
                        Some("actual value has no comparable class".to_string()),
                    ));
                    return;
                };
                match self.config.converter().convert(registry, class, text) {
                    Ok(converted) => {
                        let success = &converted == actual;
                        results.push(VerificationResult::new(
                            name,
                            Some(text.to_string()),
                            Some(actual.render(registry)),
                            success,
                            None,
                        ));
                    }
                    Err(error) => {
                        results.push(VerificationResult::new(
                            name,
                            Some(text.to_string()),
                            Some(actual.render(registry)),
                            false,
                            Some(error.to_string()),
                        ));
                    }
                }
            }
        }
    }

    fn verify_class(
        &self,
        results: &mut Vec<VerificationResult>,
        name: &str,
        class_attribute: Option<&str>,
        actual: &Value,
    ) {
        let Some(class_attribute) = class_attribute else {
            return;
        };
        let label = actual.class_label(self.config.registry());
        let success = label.as_deref() == Some(class_attribute);
        results.push(VerificationResult::new(
            format!("{name}.class"),
            Some(class_attribute.to_string()),
            label,
            success,
            None,
        ));
    }

    fn check_size(
        &self,
        results: &mut Vec<VerificationResult>,
        name: &str,
        expected: &ParamNode,
        actual_len: usize,
    ) {
        let Some(text) = expected.attribute(ATTR_SIZE) else {
            return;
        };
        match text.parse::<usize>() {
            Ok(size) => {
                results.push(VerificationResult::new(
                    format!("{name}@{ATTR_SIZE}"),
                    Some(size.to_string()),
                    Some(actual_len.to_string()),
                    size == actual_len,
                    None,
                ));
            }
            Err(_) => {
                results.push(VerificationResult::new(
                    format!("{name}@{ATTR_SIZE}"),
                    Some(text.to_string()),
                    Some(actual_len.to_string()),
                    false,
                    Some("size attribute is not numeric".to_string()),
                ));
            }
        }
    }
}

fn render_node(node: &ParamNode) -> String {
    serde_json::to_string(node).expect("serialize specification node")
}
