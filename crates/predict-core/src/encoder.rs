//! Encoder Record → envelope de predicción.
//!
//! Produce `{"instances": [<instancia>]}` con exactamente un elemento: la
//! proyección del record sobre el schema de instancia. Todo se construye en
//! memoria (un record por request).

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec::{record_from_json, record_to_json, BytesEncoding};
use crate::errors::EncodingError;
use crate::record::Record;
use crate::schema::Schema;

/// Clave del envelope.
pub const INSTANCES_FIELD: &str = "instances";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Cuerpo listo para enviar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

impl EncodedRequest {
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestEncoder {
    bytes: BytesEncoding,
}

impl RequestEncoder {
    pub fn new(bytes: BytesEncoding) -> Self {
        Self { bytes }
    }

    /// Proyecta `record` sobre `instance_schema` y lo envuelve en el envelope.
    pub fn encode(&self, record: &Record, instance_schema: &Arc<Schema>) -> Result<EncodedRequest, EncodingError> {
        let instance = record.project(instance_schema)?;
        let mut envelope = Map::with_capacity(1);
        envelope.insert(INSTANCES_FIELD.to_string(),
                        Value::Array(vec![record_to_json(&instance, self.bytes)?]));
        let body = serde_json::to_vec(&Value::Object(envelope))?;
        Ok(EncodedRequest { body,
                            content_type: JSON_CONTENT_TYPE })
    }

    /// Operación inversa: decodifica la única instancia de un envelope.
    pub fn decode(&self, body: &[u8], instance_schema: &Arc<Schema>) -> Result<Record, EncodingError> {
        let doc: Value = serde_json::from_slice(body)?;
        let instances = doc.get(INSTANCES_FIELD)
                           .and_then(Value::as_array)
                           .filter(|a| a.len() == 1)
                           .ok_or_else(|| EncodingError::Json("envelope must hold exactly one instance".into()))?;
        record_from_json(&instances[0], instance_schema)
    }
}
