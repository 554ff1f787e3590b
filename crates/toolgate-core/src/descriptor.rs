//! Tool descriptors and their input schemas
//!
//! A [`ToolDescriptor`] is what callers see when they list tools: a name, a
//! human-readable description and an object-shaped [`InputSchema`]. Property
//! declaration order is significant; it drives both serialization and the
//! order in which arguments are validated.

use crate::error::SchemaError;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// JSON type an argument is expected to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for a single property of an input object
#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(skip)]
    matcher: Option<Regex>,
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            description: None,
            pattern: None,
            matcher: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    pub fn array() -> Self {
        Self::new(FieldType::Array)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a regular expression the string value must match.
    ///
    /// The pattern is compiled when the enclosing [`InputSchema`] is built.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.matcher = None;
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub(crate) fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }
}

/// Object-shaped schema describing a tool's arguments
#[derive(Debug, Clone)]
pub struct InputSchema {
    properties: Vec<(String, FieldSchema)>,
    required: Vec<String>,
}

impl InputSchema {
    pub fn builder() -> InputSchemaBuilder {
        InputSchemaBuilder::default()
    }

    /// Schema for tools that take no arguments.
    pub fn empty() -> Self {
        Self {
            properties: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.properties.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn property(&self, name: &str) -> Option<&FieldSchema> {
        self.properties
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, schema)| schema)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|field| field == name)
    }
}

struct OrderedProperties<'a>(&'a [(String, FieldSchema)]);

impl Serialize for OrderedProperties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl Serialize for InputSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &OrderedProperties(&self.properties))?;
        map.serialize_entry("required", &self.required)?;
        map.end()
    }
}

/// Builder for [`InputSchema`]
#[derive(Debug, Default)]
pub struct InputSchemaBuilder {
    properties: Vec<(String, FieldSchema)>,
    required: Vec<String>,
}

impl InputSchemaBuilder {
    /// Declare an optional property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.properties.push((name.into(), schema));
        self
    }

    /// Declare a property and mark it required.
    #[must_use]
    pub fn required_property(self, name: impl Into<String>, schema: FieldSchema) -> Self {
        let name = name.into();
        self.property(name.clone(), schema).required(name)
    }

    /// Mark an already declared (or later declared) property as required.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Check the schema and compile its patterns.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if a property is declared twice, a required name
    /// is not a declared property, or a pattern fails to compile.
    pub fn build(self) -> Result<InputSchema, SchemaError> {
        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(self.properties.len());

        for (name, mut schema) in self.properties {
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateProperty(name));
            }
            if let Some(pattern) = &schema.pattern {
                let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                    field: name.clone(),
                    source,
                })?;
                schema.matcher = Some(regex);
            }
            properties.push((name, schema));
        }

        if let Some(missing) = self.required.iter().find(|name| !seen.contains(*name)) {
            return Err(SchemaError::UndeclaredRequired(missing.clone()));
        }

        Ok(InputSchema {
            properties,
            required: self.required,
        })
    }
}

/// Public description of a registered tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: InputSchema,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date_schema() -> InputSchema {
        InputSchema::builder()
            .required_property(
                "date",
                FieldSchema::string()
                    .with_description("report date")
                    .with_pattern(r"^\d{4}-\d{2}-\d{2}$"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_serializes_as_object_schema() {
        let json = serde_json::to_value(date_schema()).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "report date",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
                    }
                },
                "required": ["date"]
            })
        );
    }

    #[test]
    fn test_property_order_is_preserved() {
        let schema = InputSchema::builder()
            .property("zeta", FieldSchema::string())
            .property("alpha", FieldSchema::integer())
            .property("mid", FieldSchema::boolean())
            .build()
            .unwrap();

        let names: Vec<_> = schema.properties().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);

        let rendered = serde_json::to_string(&schema).unwrap();
        let zeta = rendered.find("zeta").unwrap();
        let alpha = rendered.find("alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_required_must_be_declared() {
        let err = InputSchema::builder()
            .property("a", FieldSchema::string())
            .required("b")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UndeclaredRequired(name) if name == "b"));
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let err = InputSchema::builder()
            .property("a", FieldSchema::string())
            .property("a", FieldSchema::number())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateProperty(_)));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = InputSchema::builder()
            .property("a", FieldSchema::string().with_pattern("(unclosed"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("invalid pattern for property 'a'"));
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let descriptor = ToolDescriptor::new("downloadReport", "desc", date_schema());
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["name"], "downloadReport");
        assert_eq!(json["description"], "desc");
        assert_eq!(json["inputSchema"]["required"], json!(["date"]));
    }
}
