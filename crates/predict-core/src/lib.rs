//! predict-core: lógica pura del stage de predicción.
//!
//! Sin I/O. Agrupa:
//! - `schema` / `record`: modelo de datos estructurado y su codec JSON.
//! - `config`: `StageConfig` con settings en tres estados.
//! - `validator`: chequeos de configuración contra el schema de entrada.
//! - `planner`: derivación de schemas de instancia y de salida.
//! - `encoder`: construcción del envelope `{"instances": [...]}`.
//! - `response`: extracción de la predicción desde la respuesta.

pub mod codec;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod planner;
pub mod record;
pub mod response;
pub mod schema;
pub mod validator;

pub use codec::BytesEncoding;
pub use config::{CredentialSource, RuntimeArguments, Setting, StageConfig, DEFAULT_OUTPUT_FIELD};
pub use encoder::{EncodedRequest, RequestEncoder};
pub use errors::{ConfigError, EncodingError, ResponseError, SchemaError};
pub use planner::{instance_schema, output_schema, output_schema_with_type, prediction_type};
pub use record::{FieldValue, Record, RecordBuilder};
pub use response::extract_prediction;
pub use schema::{Field, FieldType, Schema};
pub use validator::{validate, validate_declared_output, validate_identifiers};
