//! Configuración del stage de predicción.
//!
//! Cada opción es un `Setting`: `Known(valor)`, `Deferred(expresión)` (macro
//! aún no resuelta) o `Absent`. Toda validación decide sobre este tag; la
//! sintaxis de macros (`${...}`) sólo se inspecciona al leer las propiedades
//! crudas en `StageConfig::from_properties`.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::schema::Schema;

/// Nombre por defecto del campo de salida.
pub const DEFAULT_OUTPUT_FIELD: &str = "prediction";

/// Valor de configuración en tres estados.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Setting<T> {
    Known(T),
    /// Expresión sin resolver (p. ej. `${model}`).
    Deferred(String),
    #[default]
    Absent,
}

impl<T> Setting<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Setting::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Setting::Deferred(_))
    }
}

impl Setting<String> {
    /// Clasifica un valor crudo: vacío → `Absent`, con macro → `Deferred`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Setting::Absent,
            Some(v) if v.contains("${") => Setting::Deferred(v.to_string()),
            Some(v) => Setting::Known(v.to_string()),
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.known().map(String::as_str)
    }

    /// Sustituye referencias `${name}` con `args`. Si alguna referencia queda
    /// sin valor el setting sigue `Deferred`.
    fn resolve(&self, args: &RuntimeArguments) -> Self {
        let Setting::Deferred(expr) = self else {
            return self.clone();
        };
        match args.substitute(expr) {
            Some(v) => Setting::from_raw(Some(&v)),
            None => self.clone(),
        }
    }
}

/// Argumentos de ejecución usados para resolver macros.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeArguments(HashMap<String, String>);

impl RuntimeArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn substitute(&self, expr: &str) -> Option<String> {
        let mut out = String::with_capacity(expr.len());
        let mut rest = expr;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}')?;
            out.push_str(self.get(&after[..end])?);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Some(out)
    }
}

impl FromIterator<(String, String)> for RuntimeArguments {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Origen de la credencial para el cliente remoto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    ServiceAccountFile(PathBuf),
    ApplicationDefault,
}

/// Propiedades crudas tal como las entrega el orquestador (claves camelCase).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStageProperties {
    pub project: Option<String>,
    pub service_account_file_path: Option<String>,
    pub model: Option<String>,
    pub model_version: Option<String>,
    pub schema: Option<String>,
    pub instances_field: Option<String>,
    pub output_field: Option<String>,
    pub prediction_field: Option<String>,
}

/// Configuración inmutable del stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageConfig {
    pub project: Setting<String>,
    pub service_account_file_path: Setting<String>,
    pub model: Setting<String>,
    pub model_version: Setting<String>,
    /// Schema de salida declarado (JSON).
    pub schema: Setting<String>,
    pub instances_field: Setting<String>,
    pub output_field: Setting<String>,
    /// Sub-path (con puntos) dentro de la predicción.
    pub prediction_field: Setting<String>,
}

impl From<RawStageProperties> for StageConfig {
    fn from(raw: RawStageProperties) -> Self {
        let s = |v: &Option<String>| Setting::from_raw(v.as_deref());
        Self { project: s(&raw.project),
               service_account_file_path: s(&raw.service_account_file_path),
               model: s(&raw.model),
               model_version: s(&raw.model_version),
               schema: s(&raw.schema),
               instances_field: s(&raw.instances_field),
               output_field: s(&raw.output_field),
               prediction_field: s(&raw.prediction_field) }
    }
}

impl StageConfig {
    /// Construye desde el mapa de propiedades del orquestador.
    pub fn from_properties(props: &IndexMap<String, String>) -> Result<Self, ConfigError> {
        let value = serde_json::to_value(props).map_err(|e| ConfigError::InvalidSchemaJson(e.to_string()))?;
        let raw: RawStageProperties =
            serde_json::from_value(value).map_err(|e| ConfigError::InvalidSchemaJson(e.to_string()))?;
        Ok(raw.into())
    }

    /// Resuelve los settings diferidos con los argumentos de ejecución.
    pub fn resolve(&self, args: &RuntimeArguments) -> Self {
        Self { project: self.project.resolve(args),
               service_account_file_path: self.service_account_file_path.resolve(args),
               model: self.model.resolve(args),
               model_version: self.model_version.resolve(args),
               schema: self.schema.resolve(args),
               instances_field: self.instances_field.resolve(args),
               output_field: self.output_field.resolve(args),
               prediction_field: self.prediction_field.resolve(args) }
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }

    pub fn instances_field(&self) -> Option<&str> {
        self.instances_field.as_deref()
    }

    /// Nombre configurado del campo de salida (sin default).
    pub fn output_field(&self) -> Option<&str> {
        self.output_field.as_deref()
    }

    /// Nombre efectivo del campo de salida.
    pub fn output_field_name(&self) -> &str {
        self.output_field().unwrap_or(DEFAULT_OUTPUT_FIELD)
    }

    pub fn prediction_field(&self) -> Option<&str> {
        self.prediction_field.as_deref()
    }

    pub fn credential_source(&self) -> CredentialSource {
        match self.service_account_file_path.as_deref() {
            Some(path) => CredentialSource::ServiceAccountFile(PathBuf::from(path)),
            None => CredentialSource::ApplicationDefault,
        }
    }

    /// Schema declarado. `Ok(None)` si está diferido.
    pub fn declared_schema(&self) -> Result<Option<Schema>, ConfigError> {
        match &self.schema {
            Setting::Known(text) => Schema::parse_json(text).map(Some),
            Setting::Deferred(_) => Ok(None),
            Setting::Absent => Err(ConfigError::MissingSchema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn raw_values_are_classified() {
        assert_eq!(Setting::from_raw(None), Setting::<String>::Absent);
        assert_eq!(Setting::from_raw(Some("  ")), Setting::<String>::Absent);
        assert_eq!(Setting::from_raw(Some("${m}")), Setting::<String>::Deferred("${m}".into()));
        assert_eq!(Setting::from_raw(Some("census")), Setting::Known("census".to_string()));
    }

    #[test]
    fn from_properties_reads_camel_case_keys() {
        let cfg = StageConfig::from_properties(&props(&[("project", "p1"),
                                                        ("modelVersion", "v1"),
                                                        ("instancesField", "audio"),
                                                        ("model", "${model}")])).unwrap();
        assert_eq!(cfg.project(), Some("p1"));
        assert_eq!(cfg.model_version(), Some("v1"));
        assert_eq!(cfg.instances_field(), Some("audio"));
        assert_eq!(cfg.model(), None);
        assert!(cfg.model.is_deferred());
        assert_eq!(cfg.output_field_name(), "prediction");
    }

    #[test]
    fn resolve_substitutes_known_arguments_only() {
        let cfg = StageConfig { model: Setting::Deferred("${model}".into()),
                                model_version: Setting::Deferred("v${ver}".into()),
                                project: Setting::Deferred("${missing}".into()),
                                ..Default::default() };
        let args = RuntimeArguments::new().with("model", "census").with("ver", "2");
        let resolved = cfg.resolve(&args);
        assert_eq!(resolved.model(), Some("census"));
        assert_eq!(resolved.model_version(), Some("v2"));
        assert!(resolved.project.is_deferred());
    }

    #[test]
    fn resolve_to_empty_string_is_absent() {
        let cfg = StageConfig { model: Setting::Deferred("${model}".into()),
                                ..Default::default() };
        let resolved = cfg.resolve(&RuntimeArguments::new().with("model", ""));
        assert_eq!(resolved.model, Setting::Absent);
    }

    #[test]
    fn declared_schema_states() {
        let mut cfg = StageConfig::default();
        assert_eq!(cfg.declared_schema(), Err(ConfigError::MissingSchema));
        cfg.schema = Setting::Deferred("${schema}".into());
        assert_eq!(cfg.declared_schema(), Ok(None));
        cfg.schema = Setting::Known("{bad".into());
        assert!(matches!(cfg.declared_schema(), Err(ConfigError::InvalidSchemaJson(_))));
    }

    #[test]
    fn credential_source_prefers_key_file() {
        let mut cfg = StageConfig::default();
        assert_eq!(cfg.credential_source(), CredentialSource::ApplicationDefault);
        cfg.service_account_file_path = Setting::Known("/keys/sa.json".into());
        assert_eq!(cfg.credential_source(), CredentialSource::ServiceAccountFile("/keys/sa.json".into()));
    }
}
