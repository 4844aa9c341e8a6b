//! Taxonomía de errores del núcleo.
//!
//! - `ConfigError`: configuración inválida; fatal en la fase donde se detecta.
//! - `SchemaError`: inconsistencias entre schemas y records.
//! - `EncodingError`: un valor no puede representarse en el envelope JSON.
//! - `ResponseError`: la respuesta del servicio no contiene una predicción usable.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("field '{0}' does not exist in the input schema")]
    FieldNotFound(String),
    #[error("input schema already contains output field '{0}', please provide a different name")]
    NameCollision(String),
    #[error("missing identifier: '{0}' must be known and non-empty")]
    MissingIdentifier(&'static str),
    #[error("invalid schema: {0}")]
    InvalidSchemaJson(String),
    #[error("schema must be specified")]
    MissingSchema,
    #[error("field '{field}' has unsupported type '{found}'")]
    UnsupportedFieldType { field: String, found: String },
    #[error("declared output schema has no field '{0}'")]
    OutputFieldNotDeclared(String),
    #[error("declared output field '{field}' must be {expected}, found {found}")]
    InvalidOutputType { field: String, expected: String, found: String },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SchemaError {
    #[error("field '{0}' not found in schema")]
    FieldNotFound(String),
    #[error("duplicate field '{0}' in schema")]
    DuplicateField(String),
    #[error("value for field '{field}' does not conform to type {expected}")]
    TypeMismatch { field: String, expected: String },
    #[error("non-nullable field '{0}' has no value")]
    MissingValue(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EncodingError {
    #[error("field '{field}' cannot be encoded: {reason}")]
    Unrepresentable { field: String, reason: String },
    #[error("json: {0}")]
    Json(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<serde_json::Error> for EncodingError {
    fn from(e: serde_json::Error) -> Self {
        EncodingError::Json(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ResponseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("prediction service returned an error: {0}")]
    Remote(String),
    #[error("expected exactly one prediction, found {0}")]
    PredictionCount(usize),
    #[error("prediction path '{0}' not found in response")]
    PathNotFound(String),
    #[error("prediction value does not conform to {expected}: {found}")]
    TypeMismatch { expected: String, found: String },
}
