//! Errores del cliente de predicción.
//! Los errores de transporte se convierten a texto para poder clonarlos y
//! compararlos en tests.

use predict_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("prediction service responded {status}: {body}")]
    Http { status: u16, body: String },
    #[error("prediction client is shut down")]
    Closed,
    #[error("prediction request was cancelled")]
    Cancelled,
    #[error("prediction task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Network(format!("timeout: {e}"))
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
