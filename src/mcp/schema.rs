//! Tool input shapes and the validator that interprets them
//!
//! A [`ToolSpec`] is rendered as JSON Schema for `tools/list` and checked
//! against incoming arguments for `tools/call`, so the advertised shape and
//! the enforced one cannot drift apart.

use super::protocol::{InputSchema, ToolDefinition};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// Primitive type of a tool argument
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    StringArray,
    /// Free-form JSON object
    Object,
    /// String restricted to the listed values
    Enum(&'static [&'static str]),
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Enum(_) => "expected string",
            FieldKind::Integer => "expected integer",
            FieldKind::Boolean => "expected boolean",
            FieldKind::StringArray => "expected array of strings",
            FieldKind::Object => "expected object",
        }
    }
}

/// One declared argument of a tool
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::String, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Integer, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean, description)
    }

    pub fn string_array(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::StringArray, description)
    }

    pub fn object(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Object, description)
    }

    pub fn one_of(
        name: &'static str,
        values: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self::new(name, FieldKind::Enum(values), description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// JSON Schema fragment for this field
    fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        let schema_type = match self.kind {
            FieldKind::String | FieldKind::Enum(_) => "string",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::StringArray => "array",
            FieldKind::Object => "object",
        };
        schema.insert("type".into(), json!(schema_type));
        schema.insert("description".into(), json!(self.description));
        match self.kind {
            FieldKind::Enum(values) => {
                schema.insert("enum".into(), json!(values));
            }
            FieldKind::StringArray => {
                schema.insert("items".into(), json!({"type": "string"}));
            }
            FieldKind::Object => {
                schema.insert("additionalProperties".into(), json!(true));
            }
            _ => {}
        }
        if let Some(minimum) = self.minimum {
            schema.insert("minimum".into(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            schema.insert("maximum".into(), json!(maximum));
        }
        if let Some(default) = &self.default {
            schema.insert("default".into(), default.clone());
        }
        Value::Object(schema)
    }

    /// Check a present value, returning it in canonical form or the reason
    /// it is rejected. Integral floats such as `10.0` become integers.
    fn check(&self, value: &Value) -> Result<Value, String> {
        let value = match self.kind {
            FieldKind::Integer => integral(value).unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        };

        let type_ok = match &self.kind {
            FieldKind::String | FieldKind::Enum(_) => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::StringArray => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            FieldKind::Object => value.is_object(),
        };
        if !type_ok {
            return Err(self.kind.expected().to_string());
        }

        if let (FieldKind::Enum(allowed), Some(s)) = (&self.kind, value.as_str()) {
            if !allowed.contains(&s) {
                return Err(format!("must be one of: {}", allowed.join(", ")));
            }
        }

        if let Some(n) = value.as_i64() {
            if let Some(minimum) = self.minimum.filter(|m| n < *m) {
                return Err(format!("must be at least {}", minimum));
            }
            if let Some(maximum) = self.maximum.filter(|m| n > *m) {
                return Err(format!("must be at most {}", maximum));
            }
        } else if let (Some(maximum), true) = (self.maximum, value.is_u64()) {
            // Larger than i64::MAX
            return Err(format!("must be at most {}", maximum));
        }

        Ok(value)
    }
}

/// A float with no fractional part, as an integer value
fn integral(value: &Value) -> Option<Value> {
    if !value.is_f64() {
        return None;
    }
    let f = value.as_f64()?;
    if f.fract() != 0.0 || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(Value::from(f as i64))
}

/// A rejected argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Name, description and input shape of one tool
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl ToolSpec {
    pub fn new(name: &'static str, description: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name,
            description,
            fields,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.to_json_schema()))
            .collect();
        let required: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.to_string())
            .collect();

        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: InputSchema {
                schema_type: "object".to_string(),
                properties: Some(Value::Object(properties)),
                required: if required.is_empty() {
                    None
                } else {
                    Some(required)
                },
            },
        }
    }

    /// Validate raw arguments.
    ///
    /// Returns only the declared fields, with defaults filled in for absent
    /// optional ones. Undeclared keys are dropped. Every violation is
    /// reported, not just the first. An explicit `null` counts as absent.
    pub fn validate(&self, args: Option<&Value>) -> Result<Map<String, Value>, Vec<FieldViolation>> {
        let empty = Map::new();
        let args = match args {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(vec![FieldViolation {
                    field: "arguments".to_string(),
                    reason: "expected object".to_string(),
                }])
            }
        };

        let mut validated = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match args.get(field.name).filter(|v| !v.is_null()) {
                Some(value) => match field.check(value) {
                    Ok(value) => {
                        validated.insert(field.name.to_string(), value);
                    }
                    Err(reason) => violations.push(FieldViolation {
                        field: field.name.to_string(),
                        reason,
                    }),
                },
                None if field.required => violations.push(FieldViolation {
                    field: field.name.to_string(),
                    reason: "required".to_string(),
                }),
                None => {
                    if let Some(default) = &field.default {
                        validated.insert(field.name.to_string(), default.clone());
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            Err(violations)
        }
    }
}
