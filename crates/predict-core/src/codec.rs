//! Conversión `FieldValue` ↔ JSON siguiendo la convención de records del host:
//! orden de campos preservado, `null` explícito, números y strings naturales.
//!
//! Los binarios no tienen representación JSON natural; se rechazan salvo que
//! se declare `BytesEncoding::Base64` (forma `{"b64": "..."}` del servicio de
//! predicción).

use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::errors::EncodingError;
use crate::record::{FieldValue, Record};
use crate::schema::{FieldType, Schema};

/// Estrategia para campos `bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BytesEncoding {
    #[default]
    Reject,
    Base64,
}

impl FromStr for BytesEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(BytesEncoding::Reject),
            "base64" | "b64" => Ok(BytesEncoding::Base64),
            other => Err(format!("unknown bytes encoding '{other}'")),
        }
    }
}

fn unrepresentable(field: &str, reason: impl Into<String>) -> EncodingError {
    EncodingError::Unrepresentable { field: field.to_string(),
                                     reason: reason.into() }
}

/// Serializa un record a un objeto JSON en el orden de su schema.
pub fn record_to_json(record: &Record, bytes: BytesEncoding) -> Result<Value, EncodingError> {
    let mut obj = Map::with_capacity(record.schema().len());
    for (name, value) in record.iter() {
        obj.insert(name.to_string(), value_to_json(name, value, bytes)?);
    }
    Ok(Value::Object(obj))
}

/// Serializa un valor. `path` sólo se usa para los mensajes de error.
pub fn value_to_json(path: &str, value: &FieldValue, bytes: BytesEncoding) -> Result<Value, EncodingError> {
    Ok(match value {
        FieldValue::Null => Value::Null,
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Int(v) => Value::from(*v),
        FieldValue::Long(v) => Value::from(*v),
        FieldValue::Float(v) => finite(path, widen(*v))?,
        FieldValue::Double(v) => finite(path, *v)?,
        FieldValue::String(s) | FieldValue::Enum(s) => Value::String(s.clone()),
        FieldValue::Bytes(b) => match bytes {
            BytesEncoding::Base64 => serde_json::json!({ "b64": STANDARD.encode(b) }),
            BytesEncoding::Reject => return Err(unrepresentable(path, "binary value without a declared codec")),
        },
        FieldValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(value_to_json(&format!("{path}.{i}"), item, bytes)?);
            }
            Value::Array(out)
        }
        FieldValue::Map(entries) => {
            let mut obj = Map::with_capacity(entries.len());
            for (k, v) in entries {
                obj.insert(k.clone(), value_to_json(&format!("{path}.{k}"), v, bytes)?);
            }
            Value::Object(obj)
        }
        FieldValue::Record(r) => record_to_json(r, bytes)?,
    })
}

/// `f32` -> `f64` por su representación decimal más corta: `0.1f32` se
/// serializa `0.1` y no `0.10000000149011612`.
fn widen(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

fn finite(path: &str, v: f64) -> Result<Value, EncodingError> {
    Number::from_f64(v).map(Value::Number)
                       .ok_or_else(|| unrepresentable(path, format!("non-finite number {v}")))
}

/// Convierte JSON en un valor tipado según `t`.
pub fn value_from_json(path: &str, json: &Value, t: &FieldType) -> Result<FieldValue, EncodingError> {
    let mismatch = || unrepresentable(path, format!("expected {t}, found {json}"));
    Ok(match t {
        FieldType::Nullable(inner) => {
            if json.is_null() {
                FieldValue::Null
            } else {
                value_from_json(path, json, inner)?
            }
        }
        FieldType::Null => {
            if !json.is_null() {
                return Err(mismatch());
            }
            FieldValue::Null
        }
        FieldType::Boolean => FieldValue::Boolean(json.as_bool().ok_or_else(mismatch)?),
        FieldType::Int => {
            let v = json.as_i64().ok_or_else(mismatch)?;
            FieldValue::Int(i32::try_from(v).map_err(|_| mismatch())?)
        }
        FieldType::Long => FieldValue::Long(json.as_i64().ok_or_else(mismatch)?),
        FieldType::Float => FieldValue::Float(json.as_f64().ok_or_else(mismatch)? as f32),
        FieldType::Double => FieldValue::Double(json.as_f64().ok_or_else(mismatch)?),
        FieldType::String => FieldValue::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        FieldType::Bytes => FieldValue::Bytes(bytes_from_json(json).ok_or_else(mismatch)?),
        FieldType::Enum(symbols) => {
            let s = json.as_str().ok_or_else(mismatch)?;
            if !symbols.iter().any(|sym| sym == s) {
                return Err(mismatch());
            }
            FieldValue::Enum(s.to_string())
        }
        FieldType::Array(items) => {
            let arr = json.as_array().ok_or_else(mismatch)?;
            let mut out = Vec::with_capacity(arr.len());
            for (i, item) in arr.iter().enumerate() {
                out.push(value_from_json(&format!("{path}.{i}"), item, items)?);
            }
            FieldValue::Array(out)
        }
        FieldType::Map(values) => {
            let obj = json.as_object().ok_or_else(mismatch)?;
            let mut out = IndexMap::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(k.clone(), value_from_json(&format!("{path}.{k}"), v, values)?);
            }
            FieldValue::Map(out)
        }
        FieldType::Record(schema) => FieldValue::Record(record_from_json(json, &Arc::new(schema.clone()))?),
    })
}

/// Decodifica un objeto JSON como record de `schema`. Claves desconocidas se
/// ignoran; claves ausentes se tratan como `null`.
pub fn record_from_json(json: &Value, schema: &Arc<Schema>) -> Result<Record, EncodingError> {
    let obj = json.as_object()
                  .ok_or_else(|| unrepresentable(schema.name(), format!("expected object, found {json}")))?;
    let mut builder = Record::builder(Arc::clone(schema));
    for field in schema.fields() {
        let raw = obj.get(field.name()).unwrap_or(&Value::Null);
        if raw.is_null() && !field.field_type().is_nullable() {
            continue; // `build` reporta MissingValue
        }
        let value = value_from_json(field.name(), raw, field.field_type())?;
        builder.set(field.name(), value)?;
    }
    Ok(builder.build()?)
}

fn bytes_from_json(json: &Value) -> Option<Vec<u8>> {
    match json {
        Value::Object(obj) => obj.get("b64")
                                 .and_then(Value::as_str)
                                 .and_then(|s| STANDARD.decode(s).ok()),
        Value::Array(items) => items.iter()
                                    .map(|i| i.as_u64().and_then(|b| u8::try_from(b).ok()))
                                    .collect(),
        _ => None,
    }
}
