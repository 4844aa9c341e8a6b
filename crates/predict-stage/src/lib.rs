//! predict-stage: stage de transformación que enriquece records con la
//! predicción de un modelo remoto.
//!
//! - `stage`: `PredictTransform` y su ciclo de vida.
//! - `options`: política de errores, concurrencia y transporte.
//! - `event`: bitácora append-only de transiciones (acotada para eventos por record).
//! - `emitter`: destino de los records de salida.

pub mod emitter;
pub mod error;
pub mod event;
pub mod options;
pub mod stage;
pub mod state;

pub use emitter::{Emitter, VecEmitter};
pub use error::StageError;
pub use event::{EventLog, InMemoryEventLog, StageEvent, StageEventKind, DEFAULT_RECORD_CAPACITY};
pub use options::{ErrorPolicy, StageOptions};
pub use stage::{InitContext, PredictTransform, StageStats};
pub use state::StageState;
