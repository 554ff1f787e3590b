//! Argument validation against an [`InputSchema`]
//!
//! Validation runs in two passes over the declared properties:
//!
//! 1. every required property must be present, non-null and, for strings,
//!    non-empty; the first one that is not yields [`DispatchError::MissingArguments`];
//! 2. every present property must have the declared JSON type and, when a
//!    pattern is declared, match it; the first mismatch yields
//!    [`DispatchError::ValidationFailed`].
//!
//! Properties the schema does not declare are dropped.

use crate::descriptor::{FieldSchema, FieldType, InputSchema};
use crate::error::{DispatchError, DispatchResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A type-checked argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ArgumentValue {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl ArgumentValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            ArgumentValue::String(_) => FieldType::String,
            ArgumentValue::Number(_) => FieldType::Number,
            ArgumentValue::Integer(_) => FieldType::Integer,
            ArgumentValue::Boolean(_) => FieldType::Boolean,
            ArgumentValue::Object(_) => FieldType::Object,
            ArgumentValue::Array(_) => FieldType::Array,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgumentValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgumentValue::Number(n) => Some(*n),
            ArgumentValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgumentValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            ArgumentValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            ArgumentValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Arguments that passed validation, keyed by property name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    values: HashMap<String, ArgumentValue>,
}

impl ValidatedArguments {
    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgumentValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgumentValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgumentValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgumentValue::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn whole_number(value: &serde_json::Number) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn coerce(name: &str, schema: &FieldSchema, value: &Value) -> DispatchResult<ArgumentValue> {
    let expected = schema.field_type();
    let coerced = match (expected, value) {
        (FieldType::String, Value::String(s)) => Some(ArgumentValue::String(s.clone())),
        (FieldType::Number, Value::Number(n)) => n.as_f64().map(ArgumentValue::Number),
        (FieldType::Integer, Value::Number(n)) => whole_number(n).map(ArgumentValue::Integer),
        (FieldType::Boolean, Value::Bool(b)) => Some(ArgumentValue::Boolean(*b)),
        (FieldType::Object, Value::Object(map)) => Some(ArgumentValue::Object(map.clone())),
        (FieldType::Array, Value::Array(items)) => Some(ArgumentValue::Array(items.clone())),
        _ => None,
    };

    let coerced = coerced.ok_or_else(|| {
        DispatchError::invalid(
            name,
            format!("类型错误：应为 {expected}，实际为 {}", json_kind(value)),
        )
    })?;

    if let (Some(matcher), ArgumentValue::String(s)) = (schema.matcher(), &coerced) {
        if !matcher.is_match(s) {
            let reason = match schema.description() {
                Some(description) => format!("格式无效（{description}）"),
                None => format!("格式无效，应匹配 {}", matcher.as_str()),
            };
            return Err(DispatchError::invalid(name, reason));
        }
    }

    Ok(coerced)
}

/// Validate raw JSON arguments against `schema`.
///
/// # Errors
///
/// Returns [`DispatchError::MissingArguments`] for the first required property
/// (in declaration order) that is absent, and otherwise
/// [`DispatchError::ValidationFailed`] for the first property with a wrong
/// type or a pattern mismatch.
pub fn validate(
    schema: &InputSchema,
    arguments: &Map<String, Value>,
) -> DispatchResult<ValidatedArguments> {
    for (name, _) in schema.properties() {
        if schema.is_required(name) && is_missing(arguments.get(name)) {
            return Err(DispatchError::missing(name));
        }
    }

    let mut values = HashMap::new();
    for (name, field) in schema.properties() {
        match arguments.get(name) {
            None | Some(Value::Null) => continue,
            Some(value) => {
                values.insert(name.to_string(), coerce(name, field, value)?);
            }
        }
    }

    Ok(ValidatedArguments { values })
}
