use predict_core::{ConfigError, EncodingError};
use predict_stage::StageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Configuración del stage inválida: {0}")]
    StageConfig(#[from] ConfigError),
    #[error("Error del stage: {0}")]
    Stage(#[from] StageError),
    #[error("Error de codificación: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}
