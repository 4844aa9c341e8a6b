//! `PredictTransform`: stage que enriquece cada record con la predicción de un
//! modelo remoto.
//!
//! Ciclo de vida: `configure` -> `initialize` -> `transform`* -> `destroy`.
//! Cada record de entrada produce exactamente un record de salida, con los
//! campos de entrada intactos y el campo de predicción al final.
//!
//! `transform` procesa un record a la vez. `transform_batch` mantiene hasta
//! `max_in_flight` requests abiertos; cada record viaja junto a su handle
//! (id de correlación) y las salidas se emiten en el orden de entrada.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, info, warn};
use predict_client::{CredentialResolver, HttpTransport, PredictTransport, PredictionClient, PredictionHandle};
use predict_core::{extract_prediction, instance_schema, output_schema_with_type, prediction_type, validate,
                   validate_declared_output, validate_identifiers, ConfigError, EncodingError, FieldType, FieldValue, Record, RequestEncoder,
                   RuntimeArguments, Schema, StageConfig};
use uuid::Uuid;

use crate::emitter::Emitter;
use crate::error::StageError;
use crate::event::{EventLog, InMemoryEventLog, StageEventKind};
use crate::options::{ErrorPolicy, StageOptions};
use crate::state::StageState;

/// Entradas de `initialize` provistas por el host.
pub struct InitContext<'a> {
    /// Schema concreto de entrada; `None` en pipelines dinámicos.
    pub input_schema: Option<Arc<Schema>>,
    pub arguments: RuntimeArguments,
    pub credentials: &'a dyn CredentialResolver,
    /// Transporte alternativo; por defecto `HttpTransport`.
    pub transport: Option<Arc<dyn PredictTransport>>,
}

impl<'a> InitContext<'a> {
    pub fn new(credentials: &'a dyn CredentialResolver) -> Self {
        Self { input_schema: None,
               arguments: RuntimeArguments::default(),
               credentials,
               transport: None }
    }

    pub fn with_input_schema(mut self, schema: Arc<Schema>) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_arguments(mut self, arguments: RuntimeArguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn PredictTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// Estado fijado en `initialize`, de sólo lectura durante la ejecución.
#[derive(Debug)]
struct RuntimePlan {
    output_field: String,
    selector: Option<String>,
    prediction_field: Option<String>,
    prediction_type: FieldType,
    output_schema: Option<Arc<Schema>>,
    instance_schema: Option<Arc<Schema>>,
    encoder: RequestEncoder,
    client: PredictionClient,
}

enum Prediction {
    Value { id: Uuid, value: FieldValue },
    Unavailable { id: Option<Uuid>, error: StageError },
}

enum Pending {
    Dispatched(PredictionHandle),
    Settled(Prediction),
}

/// Record de entrada junto a su request.
struct InFlight {
    record: Record,
    target: Arc<Schema>,
    pending: Pending,
}

#[derive(Debug)]
pub struct PredictTransform<L = InMemoryEventLog>
    where L: EventLog
{
    id: Uuid,
    config: StageConfig,
    options: StageOptions,
    state: StageState,
    published_schema: Option<Arc<Schema>>,
    runtime: Option<RuntimePlan>,
    stats: StageStats,
    events: L,
}

/// Contadores de resultados por record desde la creación del stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub enriched: u64,
    pub skipped: u64,
}

impl StageStats {
    fn record(&mut self, kind: &StageEventKind) {
        match kind {
            StageEventKind::RecordEnriched { .. } => self.enriched += 1,
            StageEventKind::RecordSkipped { .. } => self.skipped += 1,
            _ => {}
        }
    }
}

impl PredictTransform<InMemoryEventLog> {
    pub fn new(config: StageConfig) -> Self {
        Self::with_log(config, StageOptions::default(), InMemoryEventLog::default())
    }
}

impl<L> PredictTransform<L> where L: EventLog
{
    pub fn with_log(config: StageConfig, options: StageOptions, events: L) -> Self {
        Self { id: Uuid::new_v4(),
               config,
               options,
               state: StageState::Unconfigured,
               published_schema: None,
               runtime: None,
               stats: StageStats::default(),
               events }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    pub fn events(&self) -> &L {
        &self.events
    }

    pub fn stats(&self) -> StageStats {
        self.stats
    }

    /// Schema de salida vigente: el calculado en `initialize` o, antes, el
    /// publicado por `configure`.
    pub fn output_schema(&self) -> Option<&Arc<Schema>> {
        self.runtime
            .as_ref()
            .and_then(|p| p.output_schema.as_ref())
            .or(self.published_schema.as_ref())
    }

    /// URL del modelo, disponible tras `initialize`.
    pub fn model_url(&self) -> Option<&str> {
        self.runtime.as_ref().map(|p| p.client.model_url())
    }

    /// Valida la configuración en tiempo de diseño y publica el schema de
    /// salida declarado (`None` si está diferido).
    pub fn configure(&mut self, input_schema: Option<&Schema>) -> Result<Option<Arc<Schema>>, StageError> {
        self.expect_state(&[StageState::Unconfigured, StageState::Configured], "unconfigured")?;
        validate(&self.config, input_schema)?;
        let published = self.config.declared_schema()?.map(Arc::new);
        check_declared(&self.config, published.as_deref())?;
        debug!("configure:ok stage={} deferred_schema={}", self.id, published.is_none());

        self.published_schema = published.clone();
        self.state = StageState::Configured;
        let output_fields = published.as_ref()
                                     .map(|s| s.field_names().map(str::to_string).collect());
        self.events
            .append_kind(self.id, StageEventKind::Configured { output_fields });
        Ok(published)
    }

    /// Revalida con los argumentos de ejecución ya conocidos.
    pub fn prepare_run(&self, input_schema: Option<&Schema>, arguments: &RuntimeArguments) -> Result<(), StageError> {
        if self.state == StageState::Destroyed {
            return Err(StageError::InvalidState { expected: "configured",
                                                  found: self.state });
        }
        let config = self.config.resolve(arguments);
        validate(&config, input_schema)?;
        check_declared(&config, declared_for_typing(&config)?.as_ref())?;
        Ok(())
    }

    /// Schema de salida para un schema de entrada dado. Sin estado.
    ///
    /// `None` si el nombre o el tipo del campo de salida dependen de un valor
    /// diferido (`outputField` o `schema`).
    pub fn get_schema(&self, input_schema: &Schema) -> Result<Option<Schema>, StageError> {
        if self.config.output_field.is_deferred() || self.config.schema.is_deferred() {
            return Ok(None);
        }
        let declared = declared_for_typing(&self.config)?;
        let ptype = prediction_type(declared.as_ref(), self.config.output_field_name());
        Ok(Some(output_schema_with_type(input_schema, self.config.output_field(), ptype)?))
    }

    /// Resuelve la configuración, fija los schemas y construye el cliente.
    /// No modifica el stage si algo falla.
    pub fn initialize(&mut self, ctx: InitContext<'_>) -> Result<(), StageError> {
        self.expect_state(&[StageState::Configured], "configured")?;
        let config = self.config.resolve(&ctx.arguments);
        let input = ctx.input_schema.as_deref();
        validate(&config, input)?;
        validate_identifiers(&config)?;

        let declared = declared_for_typing(&config)?;
        check_declared(&config, declared.as_ref())?;
        let output_field = config.output_field_name().to_string();
        let ptype = prediction_type(declared.as_ref(), &output_field);
        let output_schema = match input {
            Some(s) => Some(Arc::new(output_schema_with_type(s, config.output_field(), ptype.clone())?)),
            None => declared.map(Arc::new),
        };
        let instance = input.map(|s| instance_schema(s, config.instances_field()))
                            .transpose()?
                            .map(Arc::new);

        let transport: Arc<dyn PredictTransport> = match ctx.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(self.options.request_timeout)?),
        };
        let client = PredictionClient::from_config(&config, &self.options.base_url, transport, ctx.credentials)?;
        let model_url = client.model_url().to_string();
        info!("initialize:ok stage={} url={} selector={:?} policy={:?} max_in_flight={}",
              self.id,
              model_url,
              config.instances_field(),
              self.options.error_policy,
              self.options.max_in_flight);

        let instance_fields = instance.as_ref()
                                      .map(|s| s.field_names().map(str::to_string).collect());
        self.runtime = Some(RuntimePlan { output_field,
                                          selector: config.instances_field().map(str::to_string),
                                          prediction_field: config.prediction_field().map(str::to_string),
                                          prediction_type: ptype,
                                          output_schema,
                                          instance_schema: instance,
                                          encoder: RequestEncoder::new(self.options.bytes_encoding),
                                          client });
        self.state = StageState::Initialized;
        self.events
            .append_kind(self.id, StageEventKind::Initialized { model_url, instance_fields });
        Ok(())
    }

    /// Enriquece un record y emite la salida antes de retornar.
    pub async fn transform(&mut self, input: Record, emitter: &mut dyn Emitter) -> Result<(), StageError> {
        self.enter_running()?;
        let flight = self.dispatch(input)?;
        self.complete(flight, emitter).await
    }

    /// Enriquece una secuencia con hasta `max_in_flight` requests abiertos.
    /// Devuelve la cantidad de records emitidos. Ante un error fatal los
    /// requests pendientes se abandonan.
    pub async fn transform_batch<I>(&mut self, records: I, emitter: &mut dyn Emitter) -> Result<usize, StageError>
        where I: IntoIterator<Item = Record>
    {
        self.enter_running()?;
        let mut window = VecDeque::new();
        let result = self.drive(records, emitter, &mut window).await;
        if result.is_err() {
            for flight in window {
                if let Pending::Dispatched(handle) = flight.pending {
                    handle.abandon();
                }
            }
        }
        result
    }

    /// Cierra el cliente. Idempotente; nunca falla.
    pub fn destroy(&mut self) {
        if self.state == StageState::Destroyed {
            return;
        }
        if let Some(plan) = self.runtime.take() {
            plan.client.shutdown();
        }
        info!("destroy:ok stage={}", self.id);
        self.state = StageState::Destroyed;
        self.events.append_kind(self.id, StageEventKind::Destroyed);
    }

    async fn drive<I>(&mut self,
                      records: I,
                      emitter: &mut dyn Emitter,
                      window: &mut VecDeque<InFlight>)
                      -> Result<usize, StageError>
        where I: IntoIterator<Item = Record>
    {
        let limit = self.options.max_in_flight.max(1);
        let mut emitted = 0;
        for record in records {
            if window.len() >= limit {
                if let Some(oldest) = window.pop_front() {
                    self.complete(oldest, emitter).await?;
                    emitted += 1;
                }
            }
            window.push_back(self.dispatch(record)?);
        }
        while let Some(oldest) = window.pop_front() {
            self.complete(oldest, emitter).await?;
            emitted += 1;
        }
        Ok(emitted)
    }

    fn expect_state(&self, allowed: &[StageState], expected: &'static str) -> Result<(), StageError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(StageError::InvalidState { expected,
                                           found: self.state })
        }
    }

    fn enter_running(&mut self) -> Result<(), StageError> {
        self.expect_state(&[StageState::Initialized, StageState::Running], "initialized")?;
        self.state = StageState::Running;
        Ok(())
    }

    fn plan(&self) -> Result<&RuntimePlan, StageError> {
        self.runtime.as_ref().ok_or(StageError::InvalidState { expected: "initialized",
                                                               found: self.state })
    }

    /// Aplica la política a un error de un record.
    fn recover(&self, id: Option<Uuid>, error: StageError) -> Result<Prediction, StageError> {
        if error.is_fatal() || self.options.error_policy == ErrorPolicy::FailFast {
            return Err(error);
        }
        Ok(Prediction::Unavailable { id, error })
    }

    /// Codifica y despacha el request de un record sin esperar la respuesta.
    fn dispatch(&self, record: Record) -> Result<InFlight, StageError> {
        let plan = self.plan()?;
        let target = plan.output_schema
                         .clone()
                         .unwrap_or_else(|| Arc::clone(record.schema()));
        if !target.contains(&plan.output_field) {
            let error = EncodingError::Unrepresentable { field: plan.output_field.clone(),
                                                         reason: "record schema has no output field".into() };
            let pending = Pending::Settled(self.recover(None, error.into())?);
            return Ok(InFlight { record,
                                 target,
                                 pending });
        }

        let instance = match &plan.instance_schema {
            Some(s) => Arc::clone(s),
            None => Arc::new(instance_schema(record.schema(), plan.selector.as_deref())?),
        };
        let sent = plan.encoder
                       .encode(&record, &instance)
                       .map_err(StageError::from)
                       .and_then(|req| plan.client.predict(req).map_err(StageError::from));
        let pending = match sent {
            Ok(handle) => Pending::Dispatched(handle),
            Err(error) => Pending::Settled(self.recover(None, error)?),
        };
        Ok(InFlight { record,
                      target,
                      pending })
    }

    async fn settle(&self, pending: Pending) -> Result<Prediction, StageError> {
        let handle = match pending {
            Pending::Settled(p) => return Ok(p),
            Pending::Dispatched(handle) => handle,
        };
        let plan = self.plan()?;
        let id = handle.id();
        let outcome = match handle.wait().await {
            Ok(response) => {
                extract_prediction(&response.body, plan.prediction_field.as_deref(), &plan.prediction_type)
                    .map_err(StageError::from)
            }
            Err(e) => Err(StageError::from(e)),
        };
        match outcome {
            Ok(value) => Ok(Prediction::Value { id, value }),
            Err(error) => self.recover(Some(id), error),
        }
    }

    async fn complete(&mut self, flight: InFlight, emitter: &mut dyn Emitter) -> Result<(), StageError> {
        let InFlight { record, target, pending } = flight;
        let prediction = self.settle(pending).await?;

        let (output, kind) = {
            let plan = self.plan()?;
            let mut builder = Record::builder(target);
            builder.copy_from(&record)?;
            let kind = match prediction {
                Prediction::Value { id, value } => {
                    builder.set(&plan.output_field, value)?;
                    debug!("transform:enriched stage={} id={id}", self.id);
                    StageEventKind::RecordEnriched { correlation_id: id }
                }
                Prediction::Unavailable { id, error } => {
                    warn!("transform:skipped stage={} id={id:?} err={error}", self.id);
                    StageEventKind::RecordSkipped { correlation_id: id,
                                                    reason: error.to_string() }
                }
            };
            (builder.build()?, kind)
        };

        self.stats.record(&kind);
        self.events.append_kind(self.id, kind);
        emitter.emit(output);
        Ok(())
    }
}

/// Un schema declarado conocido debe poder alojar la predicción. Con
/// `outputField` diferido se revisa al resolverlo en `initialize`.
fn check_declared(config: &StageConfig, declared: Option<&Schema>) -> Result<(), ConfigError> {
    match declared {
        Some(schema) if !config.output_field.is_deferred() => {
            validate_declared_output(schema, config.output_field_name())
        }
        _ => Ok(()),
    }
}

/// Schema declarado para tipar la predicción; su ausencia no es error aquí.
fn declared_for_typing(config: &StageConfig) -> Result<Option<Schema>, ConfigError> {
    match config.declared_schema() {
        Err(ConfigError::MissingSchema) => Ok(None),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predict_core::{Field, Setting};

    fn config() -> StageConfig {
        StageConfig { project: Setting::Known("proj".into()),
                      model: Setting::Known("census".into()),
                      model_version: Setting::Known("v1".into()),
                      schema: Setting::Known(r#"{"type":"record","name":"out","fields":[]}"#.into()),
                      ..Default::default() }
    }

    #[test]
    fn transform_before_initialize_is_rejected() {
        let mut stage = PredictTransform::new(config());
        let err = tokio_test::block_on(async {
            let schema = Arc::new(Schema::record("in", vec![Field::of("age", FieldType::Int)]).unwrap());
            let mut b = Record::builder(schema);
            b.set("age", 1).unwrap();
            let mut out = crate::emitter::VecEmitter::default();
            stage.transform(b.build().unwrap(), &mut out).await.unwrap_err()
        });
        assert_eq!(err,
                   StageError::InvalidState { expected: "initialized",
                                              found: StageState::Unconfigured });
    }

    #[test]
    fn initialize_requires_configure() {
        let resolver = predict_client::StaticCredential::anonymous();
        let mut stage = PredictTransform::new(config());
        let err = stage.initialize(InitContext::new(&resolver)).unwrap_err();
        assert!(matches!(err, StageError::InvalidState { expected: "configured", .. }));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut stage = PredictTransform::new(config());
        stage.destroy();
        stage.destroy();
        assert_eq!(stage.state(), StageState::Destroyed);
        assert_eq!(stage.events().len(), 1);
    }

    #[test]
    fn get_schema_appends_nullable_double() {
        let stage = PredictTransform::new(config());
        let input = Schema::record("in", vec![Field::of("age", FieldType::Int)]).unwrap();
        let out = stage.get_schema(&input).unwrap().unwrap();
        assert_eq!(out.field("prediction").unwrap().field_type(),
                   &FieldType::nullable(FieldType::Double));
    }

    #[test]
    fn get_schema_is_unknown_while_output_field_is_deferred() {
        let stage = PredictTransform::new(StageConfig { output_field: Setting::Deferred("${out}".into()),
                                                        ..config() });
        let input = Schema::record("in", vec![Field::of("age", FieldType::Int)]).unwrap();
        assert_eq!(stage.get_schema(&input).unwrap(), None);
    }
}
