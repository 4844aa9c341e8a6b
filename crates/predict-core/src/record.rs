//! Records estructurados: valores tipados asociados a un `Schema`.
//!
//! Invariante: un `Record` sólo puede construirse con valores que conforman
//! al tipo declarado de cada campo (ver `RecordBuilder`). Así un record nunca
//! declara un tipo que no puede aportar.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::SchemaError;
use crate::schema::{FieldType, Schema};

/// Valor de un campo.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Enum(String),
    Array(Vec<FieldValue>),
    Map(IndexMap<String, FieldValue>),
    Record(Record),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// `true` si el valor puede ocupar un campo del tipo `t`.
    pub fn conforms(&self, t: &FieldType) -> bool {
        match (self, t) {
            (FieldValue::Null, t) => t.is_nullable(),
            (v, FieldType::Nullable(inner)) => v.conforms(inner),
            (FieldValue::Boolean(_), FieldType::Boolean)
            | (FieldValue::Int(_), FieldType::Int)
            | (FieldValue::Long(_), FieldType::Long)
            | (FieldValue::Float(_), FieldType::Float)
            | (FieldValue::Double(_), FieldType::Double)
            | (FieldValue::Bytes(_), FieldType::Bytes)
            | (FieldValue::String(_), FieldType::String) => true,
            (FieldValue::Enum(s), FieldType::Enum(symbols)) => symbols.contains(s),
            (FieldValue::Array(items), FieldType::Array(t)) => items.iter().all(|i| i.conforms(t)),
            (FieldValue::Map(values), FieldType::Map(t)) => values.values().all(|v| v.conforms(t)),
            (FieldValue::Record(r), FieldType::Record(schema)) => r.schema.as_ref() == schema,
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(f64::from(*v)),
            FieldValue::Long(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(f64::from(*v)),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) | FieldValue::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self { FieldValue::Int(v) }
}
impl From<i64> for FieldValue {
    fn from(v: i64) -> Self { FieldValue::Long(v) }
}
impl From<f64> for FieldValue {
    fn from(v: f64) -> Self { FieldValue::Double(v) }
}
impl From<bool> for FieldValue {
    fn from(v: bool) -> Self { FieldValue::Boolean(v) }
}
impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::String(v.to_string()) }
}
impl From<String> for FieldValue {
    fn from(v: String) -> Self { FieldValue::String(v) }
}
impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self { FieldValue::Bytes(v) }
}
impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Record inmutable construido contra un schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: IndexMap<String, FieldValue>, // en el orden del schema
}

impl Record {
    pub fn builder(schema: Arc<Schema>) -> RecordBuilder {
        RecordBuilder { schema,
                        values: IndexMap::new() }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Pares (nombre, valor) en el orden del schema.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Proyecta este record sobre `target`: un record nuevo con exactamente
    /// los campos de `target`, copiando los valores por nombre.
    pub fn project(&self, target: &Arc<Schema>) -> Result<Record, SchemaError> {
        let mut builder = Record::builder(Arc::clone(target));
        for field in target.fields() {
            let value = self.values
                            .get(field.name())
                            .ok_or_else(|| SchemaError::FieldNotFound(field.name().to_string()))?;
            builder.set(field.name(), value.clone())?;
        }
        builder.build()
    }
}

/// Builder de `Record` que valida nombres y tipos en cada `set`.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    schema: Arc<Schema>,
    values: IndexMap<String, FieldValue>,
}

impl RecordBuilder {
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<&mut Self, SchemaError> {
        let value = value.into();
        let field = self.schema
                        .field(name)
                        .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))?;
        if !value.conforms(field.field_type()) {
            return Err(SchemaError::TypeMismatch { field: name.to_string(),
                                                   expected: field.field_type().to_string() });
        }
        self.values.insert(name.to_string(), value);
        Ok(self)
    }

    /// Copia los valores de `source` cuyos nombres existen en el schema destino.
    pub fn copy_from(&mut self, source: &Record) -> Result<&mut Self, SchemaError> {
        for (name, value) in source.iter() {
            if self.schema.contains(name) {
                self.set(name, value.clone())?;
            }
        }
        Ok(self)
    }

    /// Campos nullable sin valor quedan en `Null`; los no-nullable fallan.
    pub fn build(mut self) -> Result<Record, SchemaError> {
        let mut ordered = IndexMap::with_capacity(self.schema.len());
        for field in self.schema.fields() {
            match self.values.swap_remove(field.name()) {
                Some(v) => {
                    ordered.insert(field.name().to_string(), v);
                }
                None if field.field_type().is_nullable() => {
                    ordered.insert(field.name().to_string(), FieldValue::Null);
                }
                None => return Err(SchemaError::MissingValue(field.name().to_string())),
            }
        }
        Ok(Record { schema: self.schema,
                    values: ordered })
    }
}
