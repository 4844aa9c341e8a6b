//! Derivación estática de schemas.
//!
//! - `instance_schema`: qué se envía por request (record completo o un campo).
//! - `output_schema`: schema de entrada + un campo de predicción al final.
//!
//! Funciones puras y deterministas: mismas entradas producen schemas
//! estructuralmente idénticos. El orden de campos es parte del contrato.

use crate::config::DEFAULT_OUTPUT_FIELD;
use crate::errors::SchemaError;
use crate::schema::{Field, FieldType, Schema};

/// Nombre del record que describe una instancia.
pub const INSTANCE_RECORD_NAME: &str = "instance";
/// Nombre del record de salida.
pub const OUTPUT_RECORD_NAME: &str = "record";

/// Schema de la instancia enviada al servicio.
///
/// Sin selector se copian todos los campos (un schema de entrada vacío produce
/// una instancia vacía, que se acepta). Con selector la instancia contiene
/// exactamente ese campo; si no existe falla con `FieldNotFound`.
pub fn instance_schema(input: &Schema, selected_field: Option<&str>) -> Result<Schema, SchemaError> {
    let fields = match selected_field {
        None => input.fields().to_vec(),
        Some(name) => {
            let field = input.field(name)
                             .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))?;
            vec![field.clone()]
        }
    };
    Schema::record(INSTANCE_RECORD_NAME, fields)
}

/// Schema de salida con el campo de predicción `nullable double`.
pub fn output_schema(input: &Schema, output_field: Option<&str>) -> Result<Schema, SchemaError> {
    output_schema_with_type(input, output_field, FieldType::Double)
}

/// Igual que `output_schema` pero con un tipo de predicción explícito; el
/// campo añadido siempre es nullable.
pub fn output_schema_with_type(input: &Schema,
                               output_field: Option<&str>,
                               prediction_type: FieldType)
                               -> Result<Schema, SchemaError> {
    let name = output_field.unwrap_or(DEFAULT_OUTPUT_FIELD);
    let mut fields = input.fields().to_vec();
    fields.push(Field::of(name, FieldType::nullable(prediction_type)));
    // `Schema::record` detecta la colisión con un campo existente.
    Schema::record(OUTPUT_RECORD_NAME, fields)
}

/// Tipo de predicción: el record declarado para el campo de salida dentro del
/// schema configurado, o `double` en cualquier otro caso.
pub fn prediction_type(declared: Option<&Schema>, output_field: &str) -> FieldType {
    declared.and_then(|s| s.field(output_field))
            .map(|f| f.field_type().non_nullable())
            .filter(|t| matches!(t, FieldType::Record(_)))
            .cloned()
            .unwrap_or(FieldType::Double)
}
