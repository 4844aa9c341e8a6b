//! Tipos de evento del ciclo de vida del stage.
//!
//! Cada transición relevante deja un `StageEvent`; el `seq` lo asigna el log.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageEventKind {
    /// Configuración validada. `output_fields` es `None` si el schema se
    /// difiere a ejecución.
    Configured { output_fields: Option<Vec<String>> },
    /// Cliente construido y schemas fijados.
    Initialized { model_url: String, instance_fields: Option<Vec<String>> },
    /// Record emitido con la predicción del request `correlation_id`.
    RecordEnriched { correlation_id: Uuid },
    /// Record emitido sin predicción. `correlation_id` es `None` si no se
    /// llegó a despachar un request.
    RecordSkipped { correlation_id: Option<Uuid>, reason: String },
    Destroyed,
}

impl StageEventKind {
    /// Eventos que se producen una vez por record procesado.
    pub fn is_per_record(&self) -> bool {
        matches!(self,
                 StageEventKind::RecordEnriched { .. } | StageEventKind::RecordSkipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub seq: u64,
    pub stage_id: Uuid,
    pub kind: StageEventKind,
    pub ts: DateTime<Utc>, // metadato
}
