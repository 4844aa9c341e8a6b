//! Binario de ejemplo: enriquece records JSON-lines de stdin y escribe el
//! resultado en stdout. Configuración vía variables `PREDICT_*` (o `.env`).

use std::io;

use log::{error, info};
use predict_client::EnvCredentialResolver;
use predictflow_rust::runner::{read_records, run_stage, write_records};
use predictflow_rust::{AppConfig, AppError};

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        error!("predictflow:failed err={e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let schema = config.input_schema()?;
    let records = read_records(io::stdin().lock(), &schema)?;
    info!("predictflow:start records={} base_url={}", records.len(), config.options.base_url);

    let resolver = EnvCredentialResolver::default();
    let output = run_stage(&config, None, &resolver, records).await?;

    let mut stdout = io::stdout().lock();
    write_records(&mut stdout, &output, config.options.bytes_encoding)?;
    Ok(())
}
