//! Opciones de ejecución del stage (no forman parte de la configuración del
//! pipeline).

use std::str::FromStr;
use std::time::Duration;

use predict_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use predict_core::BytesEncoding;

/// Qué hacer cuando un record individual no puede enriquecerse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// El primer fallo aborta la ejecución.
    #[default]
    FailFast,
    /// El record se emite con la predicción en null y se continúa.
    SkipEnrichment,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail_fast" | "failfast" => Ok(ErrorPolicy::FailFast),
            "skip" | "skip_enrichment" | "skipenrichment" => Ok(ErrorPolicy::SkipEnrichment),
            other => Err(format!("unknown error policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOptions {
    pub error_policy: ErrorPolicy,
    /// Máximo de requests en vuelo en `transform_batch` (mínimo efectivo 1).
    pub max_in_flight: usize,
    pub bytes_encoding: BytesEncoding,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self { error_policy: ErrorPolicy::default(),
               max_in_flight: 1,
               bytes_encoding: BytesEncoding::default(),
               base_url: DEFAULT_BASE_URL.to_string(),
               request_timeout: DEFAULT_TIMEOUT }
    }
}
