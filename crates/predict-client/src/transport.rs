//! Transporte HTTP del cliente.
//!
//! `PredictTransport` es la costura con la red: la implementación por defecto
//! usa `reqwest`; los tests usan transportes en memoria. Reintentos y backoff
//! son responsabilidad del transporte, no del cliente.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use predict_core::EncodedRequest;
use reqwest::header::CONTENT_TYPE;

use crate::credentials::AccessToken;
use crate::error::ClientError;

/// Timeout por defecto de cada request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Respuesta cruda: status + cuerpo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200,
               body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait PredictTransport: Send + Sync + fmt::Debug {
    /// Envía `request` por POST a `url`.
    async fn post(&self, url: &str, request: &EncodedRequest, token: Option<&AccessToken>)
                  -> Result<RawResponse, ClientError>;

    /// Libera recursos. Debe ser idempotente.
    fn shutdown(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Transporte `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PredictTransport for HttpTransport {
    async fn post(&self, url: &str, request: &EncodedRequest, token: Option<&AccessToken>)
                  -> Result<RawResponse, ClientError> {
        let mut builder = self.client
                              .post(url)
                              .header(CONTENT_TYPE, request.content_type)
                              .body(request.body.clone());
        if let Some(token) = token {
            builder = builder.bearer_auth(token.secret());
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}
