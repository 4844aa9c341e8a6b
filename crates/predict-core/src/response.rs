//! Extracción de la predicción desde la respuesta cruda del servicio.
//!
//! La raíz de la predicción es `predictions[0]` si el documento trae el array
//! `predictions` (se envía una sola instancia), o el documento completo en
//! otro caso. `prediction_field` es un path con puntos relativo a esa raíz;
//! los segmentos numéricos indexan arrays.

use serde_json::Value;

use crate::codec::value_from_json;
use crate::errors::ResponseError;
use crate::record::FieldValue;
use crate::schema::FieldType;

pub const PREDICTIONS_FIELD: &str = "predictions";

/// Parsea `body` y devuelve el valor tipado de la predicción.
pub fn extract_prediction(body: &[u8],
                          prediction_field: Option<&str>,
                          prediction_type: &FieldType)
                          -> Result<FieldValue, ResponseError> {
    let doc: Value = serde_json::from_slice(body).map_err(|e| ResponseError::InvalidJson(e.to_string()))?;
    let selected = select_prediction(&doc, prediction_field)?;
    value_from_json(prediction_field.unwrap_or(PREDICTIONS_FIELD),
                    selected,
                    &FieldType::nullable(prediction_type.clone()))
        .map_err(|_| ResponseError::TypeMismatch { expected: prediction_type.to_string(),
                                                   found: selected.to_string() })
}

/// Navega el documento hasta el valor de la predicción.
pub fn select_prediction<'a>(doc: &'a Value, prediction_field: Option<&str>) -> Result<&'a Value, ResponseError> {
    if let Some(err) = doc.get("error") {
        let msg = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(ResponseError::Remote(msg));
    }

    let root = match doc.get(PREDICTIONS_FIELD).and_then(Value::as_array) {
        Some(preds) if preds.len() == 1 => &preds[0],
        Some(preds) => return Err(ResponseError::PredictionCount(preds.len())),
        None => doc,
    };

    let Some(path) = prediction_field else {
        return Ok(root);
    };
    let mut current = root;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(obj) => obj.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| ResponseError::PathNotFound(path.to_string()))?;
    }
    Ok(current)
}
