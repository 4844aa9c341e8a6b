//! Credenciales como capacidad opaca inyectada en el cliente.
//!
//! La obtención real del token es externa: el host provee un
//! `CredentialResolver` que, a partir del `CredentialSource` configurado,
//! devuelve un `CredentialProvider`. El cliente sólo pide un token por request.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use predict_core::CredentialSource;
use serde::Deserialize;

use crate::error::ClientError;

/// Variable de entorno usada por `EnvCredentialResolver`.
pub const DEFAULT_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Token bearer. `Debug` no expone el secreto.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Token para el próximo request. `None` envía el request sin autorización.
    async fn access_token(&self) -> Result<Option<AccessToken>, ClientError>;
}

pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, source: &CredentialSource) -> Result<Arc<dyn CredentialProvider>, ClientError>;
}

/// Token fijo (emuladores, tests, hosts que ya resolvieron el token).
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<AccessToken>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(AccessToken::new(token)))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn access_token(&self) -> Result<Option<AccessToken>, ClientError> {
        Ok(self.0.clone())
    }
}

impl CredentialResolver for StaticCredential {
    fn resolve(&self, _source: &CredentialSource) -> Result<Arc<dyn CredentialProvider>, ClientError> {
        Ok(Arc::new(self.clone()))
    }
}

/// Credencial ambiente: lee el token de una variable de entorno en cada request.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredential {
    async fn access_token(&self) -> Result<Option<AccessToken>, ClientError> {
        match std::env::var(&self.var) {
            Ok(v) if !v.trim().is_empty() => Ok(Some(AccessToken::new(v.trim()))),
            _ => Err(ClientError::Auth(format!("no access token available in {}", self.var))),
        }
    }
}

/// Campos relevantes de un archivo de clave de service account.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
                                                    ClientError::Auth(format!("cannot read service account file {}: {e}",
                                                                              path.display()))
                                                })?;
        let key: ServiceAccountKey = serde_json::from_str(&text).map_err(|e| {
                                         ClientError::Auth(format!("invalid service account file {}: {e}",
                                                                   path.display()))
                                     })?;
        if key.key_type != "service_account" {
            return Err(ClientError::Auth(format!("{} is not a service account key (type={})",
                                                 path.display(),
                                                 key.key_type)));
        }
        Ok(key)
    }
}

/// Credencial asociada a una service account cuya clave ya fue validada; el
/// token lo provee el entorno (emitido externamente para esa cuenta).
#[derive(Debug, Clone)]
pub struct ServiceAccountCredential {
    key: ServiceAccountKey,
    token: EnvCredential,
}

impl ServiceAccountCredential {
    pub fn account(&self) -> &str {
        &self.key.client_email
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountCredential {
    async fn access_token(&self) -> Result<Option<AccessToken>, ClientError> {
        self.token.access_token().await
    }
}

/// Resolver por defecto basado en variables de entorno.
#[derive(Debug, Clone)]
pub struct EnvCredentialResolver {
    token_var: String,
}

impl Default for EnvCredentialResolver {
    fn default() -> Self {
        Self { token_var: DEFAULT_TOKEN_VAR.to_string() }
    }
}

impl EnvCredentialResolver {
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { token_var: var.into() }
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self, source: &CredentialSource) -> Result<Arc<dyn CredentialProvider>, ClientError> {
        match source {
            CredentialSource::ApplicationDefault => Ok(Arc::new(EnvCredential::new(&self.token_var))),
            CredentialSource::ServiceAccountFile(path) => {
                let key = ServiceAccountKey::from_file(path)?;
                info!("credentials:service_account account={} file={}", key.client_email, path.display());
                Ok(Arc::new(ServiceAccountCredential { key,
                                                       token: EnvCredential::new(&self.token_var) }))
            }
        }
    }
}
