//! Codec JSON de schemas (convención estilo Avro del host).
//!
//! ```text
//! {"type":"record","name":"etlSchemaBody","fields":[
//!     {"name":"age","type":"int"},
//!     {"name":"city","type":["string","null"]}]}
//! ```
//!
//! Nullable se expresa como unión de dos ramas con `"null"`. Otras uniones no
//! están soportadas. Los `logicalType` se ignoran y se usa el tipo base.

use serde_json::{json, Map, Value};

use super::types::{Field, FieldType, Schema};
use crate::errors::ConfigError;

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSchemaJson(msg.into())
}

/// Parsea un schema de record desde texto JSON.
pub fn parse_schema(text: &str) -> Result<Schema, ConfigError> {
    let value: Value = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
    schema_from_value(&value)
}

/// Parsea un schema de record desde un `Value` ya decodificado.
pub fn schema_from_value(value: &Value) -> Result<Schema, ConfigError> {
    match parse_type(value)? {
        FieldType::Record(schema) => Ok(schema),
        other => Err(invalid(format!("top-level schema must be a record, found {other}"))),
    }
}

fn primitive(name: &str) -> Option<FieldType> {
    Some(match name {
        "null" => FieldType::Null,
        "boolean" => FieldType::Boolean,
        "int" => FieldType::Int,
        "long" => FieldType::Long,
        "float" => FieldType::Float,
        "double" => FieldType::Double,
        "bytes" => FieldType::Bytes,
        "string" => FieldType::String,
        _ => return None,
    })
}

fn parse_type(value: &Value) -> Result<FieldType, ConfigError> {
    match value {
        Value::String(name) => primitive(name).ok_or_else(|| invalid(format!("unknown type '{name}'"))),
        Value::Array(branches) => parse_union(branches),
        Value::Object(obj) => parse_complex(obj),
        other => Err(invalid(format!("unexpected type declaration: {other}"))),
    }
}

fn parse_union(branches: &[Value]) -> Result<FieldType, ConfigError> {
    if branches.len() != 2 {
        return Err(invalid("only two-branch unions with 'null' are supported"));
    }
    let is_null = |v: &Value| v.as_str() == Some("null");
    match (is_null(&branches[0]), is_null(&branches[1])) {
        (true, false) => Ok(FieldType::nullable(parse_type(&branches[1])?)),
        (false, true) => Ok(FieldType::nullable(parse_type(&branches[0])?)),
        _ => Err(invalid("only two-branch unions with 'null' are supported")),
    }
}

fn parse_complex(obj: &Map<String, Value>) -> Result<FieldType, ConfigError> {
    let type_name = obj.get("type")
                       .and_then(Value::as_str)
                       .ok_or_else(|| invalid("missing 'type' attribute"))?;
    match type_name {
        "record" => {
            let name = obj.get("name").and_then(Value::as_str).unwrap_or("record");
            let raw_fields = obj.get("fields")
                                .and_then(Value::as_array)
                                .ok_or_else(|| invalid(format!("record '{name}' has no 'fields' array")))?;
            let mut fields = Vec::with_capacity(raw_fields.len());
            for raw in raw_fields {
                let field_name = raw.get("name")
                                    .and_then(Value::as_str)
                                    .ok_or_else(|| invalid("field without 'name'"))?;
                let field_type = raw.get("type")
                                    .ok_or_else(|| invalid(format!("field '{field_name}' without 'type'")))?;
                fields.push(Field::of(field_name, parse_type(field_type)?));
            }
            let schema = Schema::record(name, fields).map_err(|e| invalid(e.to_string()))?;
            Ok(FieldType::Record(schema))
        }
        "array" => {
            let items = obj.get("items").ok_or_else(|| invalid("array without 'items'"))?;
            Ok(FieldType::Array(Box::new(parse_type(items)?)))
        }
        "map" => {
            if let Some(keys) = obj.get("keys") {
                if keys.as_str() != Some("string") {
                    return Err(invalid("only string map keys are supported"));
                }
            }
            let values = obj.get("values").ok_or_else(|| invalid("map without 'values'"))?;
            Ok(FieldType::Map(Box::new(parse_type(values)?)))
        }
        "enum" => {
            let symbols = obj.get("symbols")
                             .and_then(Value::as_array)
                             .ok_or_else(|| invalid("enum without 'symbols'"))?
                             .iter()
                             .map(|s| s.as_str().map(str::to_string).ok_or_else(|| invalid("enum symbols must be strings")))
                             .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldType::Enum(symbols))
        }
        other => primitive(other).ok_or_else(|| invalid(format!("unknown type '{other}'"))),
    }
}

/// Serializa un schema a su forma JSON.
pub fn schema_to_value(schema: &Schema) -> Value {
    let fields: Vec<Value> = schema.fields()
                                   .iter()
                                   .map(|f| json!({ "name": f.name(), "type": type_to_value(f.field_type()) }))
                                   .collect();
    json!({ "type": "record", "name": schema.name(), "fields": fields })
}

fn type_to_value(t: &FieldType) -> Value {
    match t {
        FieldType::Enum(symbols) => json!({ "type": "enum", "symbols": symbols }),
        FieldType::Array(items) => json!({ "type": "array", "items": type_to_value(items) }),
        FieldType::Map(values) => json!({ "type": "map", "keys": "string", "values": type_to_value(values) }),
        FieldType::Record(schema) => schema_to_value(schema),
        FieldType::Nullable(inner) => json!([type_to_value(inner), "null"]),
        primitive => Value::String(primitive.type_name().to_string()),
    }
}

impl Schema {
    pub fn parse_json(text: &str) -> Result<Schema, ConfigError> {
        parse_schema(text)
    }

    pub fn to_json(&self) -> Value {
        schema_to_value(self)
    }
}
