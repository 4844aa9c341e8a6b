//! Ejecución del stage sobre records JSON-lines.

use std::io::{BufRead, Write};
use std::sync::Arc;

use log::{debug, info};
use predict_client::{CredentialResolver, PredictTransport};
use predict_core::codec::{record_from_json, record_to_json};
use predict_core::{BytesEncoding, Record, Schema};
use predict_stage::{InitContext, PredictTransform, VecEmitter};
use serde_json::Value;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Lee un record por línea; las líneas en blanco se ignoran.
pub fn read_records<R: BufRead>(reader: R, schema: &Arc<Schema>) -> Result<Vec<Record>, AppError> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)?;
        records.push(record_from_json(&value, schema)?);
    }
    debug!("runner:read count={}", records.len());
    Ok(records)
}

pub fn write_records<W: Write>(writer: &mut W, records: &[Record], bytes: BytesEncoding) -> Result<(), AppError> {
    for record in records {
        serde_json::to_writer(&mut *writer, &record_to_json(record, bytes)?)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Configura, inicializa y ejecuta el stage sobre `input`; siempre lo destruye.
pub async fn run_stage(config: &AppConfig,
                       transport: Option<Arc<dyn PredictTransport>>,
                       resolver: &dyn CredentialResolver,
                       input: Vec<Record>)
                       -> Result<Vec<Record>, AppError> {
    let schema = config.input_schema()?;
    let mut stage = PredictTransform::new(config.stage_config()?).with_options(config.options.clone());
    stage.configure(Some(schema.as_ref()))?;

    let mut ctx = InitContext::new(resolver).with_input_schema(schema)
                                            .with_arguments(config.arguments.clone());
    if let Some(t) = transport {
        ctx = ctx.with_transport(t);
    }
    stage.initialize(ctx)?;

    let mut out = VecEmitter::default();
    let result = stage.transform_batch(input, &mut out).await;
    stage.destroy();
    let emitted = result?;
    info!("runner:done stage={} emitted={emitted}", stage.id());
    Ok(out.into_records())
}
