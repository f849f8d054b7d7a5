//! Textual scalar conversion into typed values.

use chrono::DateTime;

use crate::class::{ClassId, ClassKind, ClassRegistry, ScalarKind};
use crate::error::GenerateError;
use crate::value::Value;

/// Converts a literal textual scalar into a value of a target class.
pub trait ValueConverter: Send + Sync {
    fn convert(
        &self,
        registry: &ClassRegistry,
        class: ClassId,
        input: &str,
    ) -> Result<Value, GenerateError>;
}

/// The stock converter: scalar parsing, enum constants by name, dates as
/// epoch-millis or RFC 3339. Converting to the universal `object` class
/// yields the raw string.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultValueConverter;

impl DefaultValueConverter {
    pub fn new() -> Self {
        Self
    }
}

impl ValueConverter for DefaultValueConverter {
    fn convert(
        &self,
        registry: &ClassRegistry,
        class: ClassId,
        input: &str,
    ) -> Result<Value, GenerateError> {
        let def = registry.get(class);
        let fail = |message: &str| {
            Err(GenerateError::conversion(
                def.name.clone(),
                input,
                message.to_string(),
            ))
        };
        match &def.kind {
            ClassKind::Object => Ok(Value::Str(input.to_string())),
            ClassKind::Scalar(ScalarKind::Bool) => match input.parse() {
                Ok(value) => Ok(Value::Bool(value)),
                Err(_) => fail("expected true or false"),
            },
            ClassKind::Scalar(ScalarKind::I32) => match input.parse() {
                Ok(value) => Ok(Value::I32(value)),
                Err(_) => fail("invalid integer"),
            },
            ClassKind::Scalar(ScalarKind::I64) => match input.parse() {
                Ok(value) => Ok(Value::I64(value)),
                Err(_) => fail("invalid integer"),
            },
            ClassKind::Scalar(ScalarKind::F32) => match input.parse() {
                Ok(value) => Ok(Value::F32(value)),
                Err(_) => fail("invalid number"),
            },
            ClassKind::Scalar(ScalarKind::F64) => match input.parse() {
                Ok(value) => Ok(Value::F64(value)),
                Err(_) => fail("invalid number"),
            },
            ClassKind::Scalar(ScalarKind::Char) => match input.chars().next() {
                Some(value) => Ok(Value::Char(value)),
                None => fail("empty input"),
            },
            ClassKind::Scalar(ScalarKind::Str) => Ok(Value::Str(input.to_string())),
            ClassKind::Scalar(ScalarKind::Date) => {
                if let Ok(millis) = input.parse() {
                    return Ok(Value::Date(millis));
                }
                match DateTime::parse_from_rfc3339(input) {
                    Ok(instant) => Ok(Value::Date(instant.timestamp_millis())),
                    Err(_) => fail("expected epoch millis or RFC 3339"),
                }
            }
            ClassKind::Enum { constants } => {
                if constants.iter().any(|constant| constant == input) {
                    Ok(Value::Enum {
                        class,
                        constant: input.to_string(),
                    })
                } else {
                    fail("no such enum constant")
                }
            }
            ClassKind::Void
            | ClassKind::List { .. }
            | ClassKind::Set { .. }
            | ClassKind::Map { .. }
            | ClassKind::Interface { .. }
            | ClassKind::Struct(_) => fail("class has no textual form"),
        }
    }
}
