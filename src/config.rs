//! Configuración de la aplicación.
//! Carga variables de entorno (.env) una sola vez y las traduce a las
//! propiedades del stage, los argumentos de ejecución y las opciones.
//!
//! Variables `PREDICT_*` reconocidas: ver `PROPERTY_VARS` y `AppConfig::from_vars`.
//! Las variables `PREDICT_ARG_<nombre>` se exponen como argumentos de ejecución
//! para resolver macros `${nombre}`.
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use predict_core::{RuntimeArguments, Schema, StageConfig};
use predict_stage::StageOptions;

use crate::errors::AppError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Variable de entorno -> propiedad del stage.
const PROPERTY_VARS: &[(&str, &str)] = &[("PREDICT_PROJECT", "project"),
                                         ("PREDICT_SERVICE_ACCOUNT_FILE", "serviceAccountFilePath"),
                                         ("PREDICT_MODEL", "model"),
                                         ("PREDICT_MODEL_VERSION", "modelVersion"),
                                         ("PREDICT_SCHEMA", "schema"),
                                         ("PREDICT_INSTANCES_FIELD", "instancesField"),
                                         ("PREDICT_OUTPUT_FIELD", "outputField"),
                                         ("PREDICT_PREDICTION_FIELD", "predictionField")];

const ARG_PREFIX: &str = "PREDICT_ARG_";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Propiedades del stage (claves camelCase).
    pub properties: IndexMap<String, String>,
    /// Schema JSON de los records de entrada.
    pub input_schema: Option<String>,
    pub arguments: RuntimeArguments,
    pub options: StageOptions,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_vars(env::vars())
    }

    /// Construye desde pares (variable, valor) arbitrarios.
    pub fn from_vars<I>(vars: I) -> Result<Self, AppError>
        where I: IntoIterator<Item = (String, String)>
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let properties = PROPERTY_VARS.iter()
                                      .filter_map(|(var, key)| vars.get(*var).map(|v| (key.to_string(), v.clone())))
                                      .collect();
        let arguments = vars.iter()
                            .filter_map(|(k, v)| k.strip_prefix(ARG_PREFIX).map(|name| (name.to_string(), v.clone())))
                            .collect();

        let mut options = StageOptions::default();
        if let Some(url) = vars.get("PREDICT_BASE_URL") {
            options.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(n) = parse_var::<usize>(&vars, "PREDICT_MAX_IN_FLIGHT")? {
            if n == 0 {
                return Err(AppError::Config("PREDICT_MAX_IN_FLIGHT debe ser mayor que 0".into()));
            }
            options.max_in_flight = n;
        }
        if let Some(secs) = parse_var::<u64>(&vars, "PREDICT_TIMEOUT_SECS")? {
            options.request_timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = vars.get("PREDICT_ERROR_POLICY") {
            options.error_policy = policy.parse().map_err(AppError::Config)?;
        }
        if let Some(enc) = vars.get("PREDICT_BYTES_ENCODING") {
            options.bytes_encoding = enc.parse().map_err(|e| AppError::Config(format!("PREDICT_BYTES_ENCODING: {e}")))?;
        }

        Ok(Self { properties,
                  input_schema: vars.get("PREDICT_INPUT_SCHEMA").cloned(),
                  arguments,
                  options })
    }

    pub fn stage_config(&self) -> Result<StageConfig, AppError> {
        Ok(StageConfig::from_properties(&self.properties)?)
    }

    /// Schema de entrada parseado; obligatorio para leer JSON-lines.
    pub fn input_schema(&self) -> Result<Arc<Schema>, AppError> {
        let text = self.input_schema
                       .as_deref()
                       .ok_or_else(|| AppError::Config("PREDICT_INPUT_SCHEMA no definido".into()))?;
        Ok(Arc::new(Schema::parse_json(text)?))
    }
}

fn parse_var<T>(vars: &HashMap<String, String>, name: &str) -> Result<Option<T>, AppError>
    where T: std::str::FromStr,
          T::Err: std::fmt::Display
{
    vars.get(name)
        .map(|v| v.trim().parse::<T>().map_err(|e| AppError::Config(format!("{name}: {e}"))))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use predict_core::{BytesEncoding, Setting};
    use predict_stage::ErrorPolicy;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn maps_variables_to_stage_properties() {
        let cfg = AppConfig::from_vars(vars(&[("PREDICT_PROJECT", "proj"),
                                              ("PREDICT_MODEL", "${model}"),
                                              ("PREDICT_ARG_model", "census"),
                                              ("PREDICT_OUTPUT_FIELD", "score"),
                                              ("UNRELATED", "x")])).unwrap();
        assert_eq!(cfg.properties.get("project").map(String::as_str), Some("proj"));
        assert_eq!(cfg.arguments.get("model"), Some("census"));

        let stage = cfg.stage_config().unwrap();
        assert_eq!(stage.model, Setting::Deferred("${model}".into()));
        assert_eq!(stage.resolve(&cfg.arguments).model(), Some("census"));
        assert_eq!(stage.output_field_name(), "score");
    }

    #[test]
    fn parses_options() {
        let cfg = AppConfig::from_vars(vars(&[("PREDICT_MAX_IN_FLIGHT", "8"),
                                              ("PREDICT_ERROR_POLICY", "skip"),
                                              ("PREDICT_TIMEOUT_SECS", "5"),
                                              ("PREDICT_BYTES_ENCODING", "base64"),
                                              ("PREDICT_BASE_URL", "http://localhost:8080/v1/")])).unwrap();
        assert_eq!(cfg.options.max_in_flight, 8);
        assert_eq!(cfg.options.error_policy, ErrorPolicy::SkipEnrichment);
        assert_eq!(cfg.options.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.options.bytes_encoding, BytesEncoding::Base64);
        assert_eq!(cfg.options.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(AppConfig::from_vars(vars(&[("PREDICT_MAX_IN_FLIGHT", "0")])),
                         Err(AppError::Config(_))));
        assert!(matches!(AppConfig::from_vars(vars(&[("PREDICT_TIMEOUT_SECS", "soon")])),
                         Err(AppError::Config(_))));
    }

    #[test]
    fn input_schema_is_required() {
        let cfg = AppConfig::from_vars(Vec::new()).unwrap();
        assert!(matches!(cfg.input_schema(), Err(AppError::Config(_))));
    }
}
