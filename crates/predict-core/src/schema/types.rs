//! Tipos de schema: `FieldType`, `Field` y `Schema`.
//!
//! Un `Schema` es una secuencia ordenada de campos con nombre único. El orden
//! forma parte del contrato (consumidores downstream pueden indexar por
//! posición).

use std::fmt;

use crate::errors::SchemaError;

/// Tipo de un campo.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Enum(Vec<String>),
    Array(Box<FieldType>),
    /// Mapa con claves string.
    Map(Box<FieldType>),
    Record(Schema),
    Nullable(Box<FieldType>),
}

impl FieldType {
    pub fn nullable(inner: FieldType) -> Self {
        match inner {
            // `nullable(nullable(T))` colapsa a `nullable(T)`
            FieldType::Nullable(_) | FieldType::Null => inner,
            other => FieldType::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::Nullable(_) | FieldType::Null)
    }

    /// Tipo efectivo sin el wrapper nullable.
    pub fn non_nullable(&self) -> &FieldType {
        match self {
            FieldType::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Nombre corto del tipo (sin parámetros), útil en mensajes.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Null => "null",
            FieldType::Boolean => "boolean",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bytes => "bytes",
            FieldType::String => "string",
            FieldType::Enum(_) => "enum",
            FieldType::Array(_) => "array",
            FieldType::Map(_) => "map",
            FieldType::Record(_) => "record",
            FieldType::Nullable(_) => "union",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Enum(symbols) => write!(f, "enum[{}]", symbols.join(",")),
            FieldType::Array(items) => write!(f, "array<{items}>"),
            FieldType::Map(values) => write!(f, "map<string,{values}>"),
            FieldType::Record(schema) => write!(f, "record {}", schema.name()),
            FieldType::Nullable(inner) => write!(f, "nullable {inner}"),
            other => f.write_str(other.type_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    field_type: FieldType,
}

impl Field {
    pub fn of(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(),
               field_type }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }
}

/// Schema de record: nombre + campos ordenados.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Construye un schema validando que los nombres de campo sean únicos.
    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        for (i, f) in fields.iter().enumerate() {
            if fields[..i].iter().any(|prev| prev.name == f.name) {
                return Err(SchemaError::DuplicateField(f.name.clone()));
            }
        }
        Ok(Self { name: name.into(),
                  fields })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_names_are_rejected() {
        let err = Schema::record("r", vec![Field::of("a", FieldType::Int), Field::of("a", FieldType::String)]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("a".into()));
    }

    #[test]
    fn nullable_collapses_and_unwraps() {
        let t = FieldType::nullable(FieldType::nullable(FieldType::Double));
        assert_eq!(t, FieldType::Nullable(Box::new(FieldType::Double)));
        assert_eq!(t.non_nullable(), &FieldType::Double);
        assert!(t.is_nullable());
        assert!(!FieldType::Double.is_nullable());
    }

    #[test]
    fn display_is_readable() {
        let t = FieldType::nullable(FieldType::Array(Box::new(FieldType::Long)));
        assert_eq!(t.to_string(), "nullable array<long>");
    }
}
