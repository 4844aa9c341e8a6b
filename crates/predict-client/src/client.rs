//! Cliente de la API de predicción.
//!
//! `predict` no bloquea: lanza una tarea tokio y devuelve un
//! `PredictionHandle` de inmediato. El llamador decide si y cuándo esperar.
//! El endpoint, el transporte y la credencial son inmutables tras la
//! construcción y se comparten sólo en lectura entre tareas.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use predict_core::{validate_identifiers, EncodedRequest, StageConfig};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::credentials::{CredentialProvider, CredentialResolver};
use crate::endpoint::ModelEndpoint;
use crate::error::ClientError;
use crate::transport::{PredictTransport, RawResponse};

#[derive(Debug)]
pub struct PredictionClient {
    endpoint: Arc<ModelEndpoint>,
    transport: Arc<dyn PredictTransport>,
    credentials: Arc<dyn CredentialProvider>,
    closed: AtomicBool,
}

impl PredictionClient {
    pub fn new(endpoint: ModelEndpoint,
               transport: Arc<dyn PredictTransport>,
               credentials: Arc<dyn CredentialProvider>)
               -> Self {
        Self { endpoint: Arc::new(endpoint),
               transport,
               credentials,
               closed: AtomicBool::new(false) }
    }

    /// Construye el cliente desde una configuración ya resuelta. Falla con
    /// `MissingIdentifier` si project/model/version no son conocidos.
    pub fn from_config(config: &StageConfig,
                       base_url: &str,
                       transport: Arc<dyn PredictTransport>,
                       resolver: &dyn CredentialResolver)
                       -> Result<Self, ClientError> {
        validate_identifiers(config)?;
        let endpoint = ModelEndpoint::new(base_url,
                                          config.project().unwrap_or_default(),
                                          config.model().unwrap_or_default(),
                                          config.model_version().unwrap_or_default())?;
        let credentials = resolver.resolve(&config.credential_source())?;
        Ok(Self::new(endpoint, transport, credentials))
    }

    pub fn model_url(&self) -> &str {
        self.endpoint.url()
    }

    /// Despacha un request. Devuelve error sólo si el cliente está cerrado o
    /// no hay runtime; fallos de red/autenticación llegan por el handle.
    pub fn predict(&self, request: EncodedRequest) -> Result<PredictionHandle, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| ClientError::Task(e.to_string()))?;
        let id = Uuid::new_v4();
        let endpoint = Arc::clone(&self.endpoint);
        let transport = Arc::clone(&self.transport);
        let credentials = Arc::clone(&self.credentials);
        debug!("predict:dispatch id={id} url={}", endpoint.url());

        let task = runtime.spawn(async move {
                              let token = credentials.access_token().await?;
                              let response = transport.post(endpoint.url(), &request, token.as_ref()).await?;
                              check_status(id, response)
                          });
        Ok(PredictionHandle { id, task })
    }

    /// Libera el transporte. Idempotente; no espera requests pendientes y
    /// nunca propaga errores.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.transport.shutdown() {
            warn!("shutdown:transport error ignored err={e}");
        }
        debug!("shutdown:done url={}", self.endpoint.url());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn check_status(id: Uuid, response: RawResponse) -> Result<RawResponse, ClientError> {
    debug!("predict:response id={id} status={}", response.status);
    match response.status {
        s if (200..300).contains(&s) => Ok(response),
        401 | 403 => Err(ClientError::Auth(response.text())),
        status => Err(ClientError::Http { status,
                                          body: response.text() }),
    }
}

/// Predicción en vuelo, identificada por un id de correlación.
#[derive(Debug)]
pub struct PredictionHandle {
    id: Uuid,
    task: JoinHandle<Result<RawResponse, ClientError>>,
}

impl PredictionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Espera la respuesta.
    pub async fn wait(self) -> Result<RawResponse, ClientError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Cancelled),
            Err(e) => Err(ClientError::Task(e.to_string())),
        }
    }

    /// Abandona el request: la tarea sigue sola y su resultado se descarta.
    pub fn abandon(self) {
        debug!("predict:abandon id={}", self.id);
        drop(self.task);
    }

    /// Aborta la tarea; un `wait` posterior devuelve `Cancelled`.
    pub fn cancel(&self) {
        self.task.abort();
    }
}
