//! PredictFlow Rust Library
//!
//! Ensambla los crates del workspace en una aplicación:
//! - `config`: `AppConfig` cargada desde variables de entorno (.env).
//! - `errors`: `AppError`, error de nivel aplicación.
//! - `runner`: lectura/escritura JSON-lines y ejecución del stage.
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod config;
pub mod errors;
pub mod runner;

pub use config::AppConfig;
pub use errors::AppError;
