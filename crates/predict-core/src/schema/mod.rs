//! Modelo de schema (campos ordenados con tipo) y su codec JSON.

pub mod json;
mod types;

pub use json::{parse_schema, schema_from_value, schema_to_value};
pub use types::{Field, FieldType, Schema};
