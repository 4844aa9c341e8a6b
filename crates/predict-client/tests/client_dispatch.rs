//! Despacho no bloqueante, mapeo de status y shutdown del cliente sobre un
//! transporte en memoria.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use predict_client::{AccessToken, ClientError, ModelEndpoint, PredictTransport, PredictionClient, RawResponse,
                     StaticCredential, DEFAULT_BASE_URL};
use predict_core::{ConfigError, EncodedRequest, Setting, StageConfig};

#[derive(Debug, Default)]
struct RecordingTransport {
    status: u16,
    body: String,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String, Option<String>)>>,
    shutdowns: AtomicUsize,
    fail_shutdown: bool,
}

impl RecordingTransport {
    fn responding(status: u16, body: &str) -> Self {
        Self { status,
               body: body.to_string(),
               ..Default::default() }
    }
}

#[async_trait]
impl PredictTransport for RecordingTransport {
    async fn post(&self, url: &str, request: &EncodedRequest, token: Option<&AccessToken>)
                  -> Result<RawResponse, ClientError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.calls.lock().unwrap().push((url.to_string(),
                                         request.as_str().unwrap_or_default().to_string(),
                                         token.map(|t| t.secret().to_string())));
        Ok(RawResponse { status: self.status,
                         body: self.body.clone().into_bytes() })
    }

    fn shutdown(&self) -> Result<(), ClientError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(ClientError::Network("socket already closed".into()));
        }
        Ok(())
    }
}

fn request() -> EncodedRequest {
    EncodedRequest { body: br#"{"instances":[{"age":29}]}"#.to_vec(),
                     content_type: "application/json" }
}

fn client_with(transport: Arc<RecordingTransport>) -> PredictionClient {
    let endpoint = ModelEndpoint::new(DEFAULT_BASE_URL, "proj", "census", "v1").unwrap();
    PredictionClient::new(endpoint, transport, Arc::new(StaticCredential::new("tok")))
}

#[tokio::test]
async fn predict_posts_envelope_with_bearer_token() {
    let transport = Arc::new(RecordingTransport::responding(200, r#"{"predictions":[0.5]}"#));
    let client = client_with(Arc::clone(&transport));

    let response = client.predict(request()).unwrap().wait().await.unwrap();
    assert_eq!(response.text(), r#"{"predictions":[0.5]}"#);

    let calls = transport.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "https://ml.googleapis.com/v1/projects/proj/models/census/versions/v1:predict");
    assert_eq!(calls[0].1, r#"{"instances":[{"age":29}]}"#);
    assert_eq!(calls[0].2.as_deref(), Some("tok"));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let unauthorized = client_with(Arc::new(RecordingTransport::responding(401, "denied")));
    assert_eq!(unauthorized.predict(request()).unwrap().wait().await.unwrap_err(),
               ClientError::Auth("denied".into()));

    let unavailable = client_with(Arc::new(RecordingTransport::responding(503, "busy")));
    assert_eq!(unavailable.predict(request()).unwrap().wait().await.unwrap_err(),
               ClientError::Http { status: 503,
                                   body: "busy".into() });
}

#[tokio::test]
async fn dispatch_returns_before_response() {
    let transport = Arc::new(RecordingTransport { status: 200,
                                                  body: "{}".into(),
                                                  delay: Some(Duration::from_millis(50)),
                                                  ..Default::default() });
    let client = client_with(Arc::clone(&transport));
    let handles: Vec<_> = (0..4).map(|_| client.predict(request()).unwrap()).collect();
    assert!(handles.iter().all(|h| !h.is_finished()));

    let ids: HashSet<_> = handles.iter().map(|h| h.id()).collect();
    assert_eq!(ids.len(), 4);

    for h in handles {
        h.wait().await.unwrap();
    }
    assert_eq!(transport.calls.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn cancelled_handle_reports_cancelled() {
    let transport = Arc::new(RecordingTransport { status: 200,
                                                  delay: Some(Duration::from_secs(5)),
                                                  ..Default::default() });
    let client = client_with(transport);
    let handle = client.predict(request()).unwrap();
    handle.cancel();
    assert_eq!(handle.wait().await.unwrap_err(), ClientError::Cancelled);
}

#[tokio::test]
async fn shutdown_is_idempotent_and_does_not_wait_for_pending() {
    let transport = Arc::new(RecordingTransport { status: 200,
                                                  delay: Some(Duration::from_secs(5)),
                                                  fail_shutdown: true,
                                                  ..Default::default() });
    let client = client_with(Arc::clone(&transport));
    client.predict(request()).unwrap().abandon();

    tokio::time::timeout(Duration::from_millis(200), async {
        client.shutdown();
        client.shutdown();
    }).await
      .expect("shutdown must not hang");

    assert_eq!(transport.shutdowns.load(Ordering::SeqCst), 1);
    assert!(client.is_closed());
    assert_eq!(client.predict(request()).unwrap_err(), ClientError::Closed);
}

#[test]
fn shutdown_without_requests_is_safe() {
    let client = client_with(Arc::new(RecordingTransport::default()));
    client.shutdown();
    assert!(client.is_closed());
}

#[test]
fn from_config_requires_identifiers_before_any_call() {
    let transport = Arc::new(RecordingTransport::default());
    let config = StageConfig { project: Setting::Known("proj".into()),
                               model: Setting::Absent,
                               model_version: Setting::Known("v1".into()),
                               ..Default::default() };
    let err = PredictionClient::from_config(&config,
                                            DEFAULT_BASE_URL,
                                            Arc::clone(&transport) as Arc<dyn PredictTransport>,
                                            &StaticCredential::anonymous()).unwrap_err();
    assert_eq!(err, ClientError::Config(ConfigError::MissingIdentifier("model")));
    assert!(transport.calls.lock().unwrap().is_empty());
}

#[test]
fn from_config_builds_url() {
    let config = StageConfig { project: Setting::Known("proj".into()),
                               model: Setting::Known("census".into()),
                               model_version: Setting::Known("v2".into()),
                               ..Default::default() };
    let client = PredictionClient::from_config(&config,
                                               "http://localhost:9000/v1",
                                               Arc::new(RecordingTransport::default()),
                                               &StaticCredential::anonymous()).unwrap();
    assert_eq!(client.model_url(), "http://localhost:9000/v1/projects/proj/models/census/versions/v2:predict");
}

#[test]
fn predict_outside_runtime_is_an_error() {
    let client = client_with(Arc::new(RecordingTransport::default()));
    assert!(matches!(client.predict(request()), Err(ClientError::Task(_))));
}
