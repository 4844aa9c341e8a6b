//! Errores del stage.
//!
//! `Config`, `Schema` e `InvalidState` son siempre fatales. `Encoding`,
//! `Client` y `Response` afectan a un record y se tratan según `ErrorPolicy`.

use predict_client::ClientError;
use predict_core::{ConfigError, EncodingError, ResponseError, SchemaError};
use thiserror::Error;

use crate::state::StageState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Client(ClientError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error("stage is {found}, expected {expected}")]
    InvalidState { expected: &'static str, found: StageState },
}

impl From<ClientError> for StageError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Config(c) => StageError::Config(c),
            other => StageError::Client(other),
        }
    }
}

impl StageError {
    /// `true` si el error invalida la ejecución completa sin importar la política.
    pub fn is_fatal(&self) -> bool {
        matches!(self,
                 StageError::Config(_) | StageError::Schema(_) | StageError::InvalidState { .. })
    }
}
