//! predict-client: llamada remota al verbo `:predict`.
//!
//! - `endpoint`: URL del modelo versionado.
//! - `credentials`: costura para credenciales (resueltas por el host).
//! - `transport`: costura HTTP (`reqwest` por defecto).
//! - `client`: `PredictionClient` con despacho no bloqueante.

pub mod client;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use client::{PredictionClient, PredictionHandle};
pub use credentials::{AccessToken, CredentialProvider, CredentialResolver, EnvCredentialResolver, StaticCredential};
pub use endpoint::{ModelEndpoint, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use transport::{HttpTransport, PredictTransport, RawResponse, DEFAULT_TIMEOUT};
