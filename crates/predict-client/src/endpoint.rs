//! URL del verbo `:predict` de un modelo versionado.

use std::fmt;

use predict_core::ConfigError;

/// Base por defecto de la API v1.
pub const DEFAULT_BASE_URL: &str = "https://ml.googleapis.com/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEndpoint {
    url: String,
}

impl ModelEndpoint {
    /// `<base>/projects/<project>/models/<model>/versions/<version>:predict`.
    /// Los cuatro componentes deben ser no vacíos.
    pub fn new(base_url: &str, project: &str, model: &str, version: &str) -> Result<Self, ConfigError> {
        let require = |name: &'static str, v: &str| {
            let v = v.trim();
            if v.is_empty() {
                Err(ConfigError::MissingIdentifier(name))
            } else {
                Ok(v.to_string())
            }
        };
        let base = require("baseUrl", base_url)?;
        let project = require("project", project)?;
        let model = require("model", model)?;
        let version = require("modelVersion", version)?;
        let url = format!("{}/projects/{project}/models/{model}/versions/{version}:predict",
                          base.trim_end_matches('/'));
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ModelEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_predict_url() {
        let e = ModelEndpoint::new(DEFAULT_BASE_URL, "adammagaluk-iot", "census", "v1").unwrap();
        assert_eq!(e.url(), "https://ml.googleapis.com/v1/projects/adammagaluk-iot/models/census/versions/v1:predict");
        let trailing = ModelEndpoint::new("http://localhost:8080/v1/", "p", "m", "v").unwrap();
        assert_eq!(trailing.url(), "http://localhost:8080/v1/projects/p/models/m/versions/v:predict");
    }

    #[test]
    fn empty_components_are_missing_identifiers() {
        assert_eq!(ModelEndpoint::new(DEFAULT_BASE_URL, "p", "", "v1").unwrap_err(),
                   ConfigError::MissingIdentifier("model"));
        assert_eq!(ModelEndpoint::new(DEFAULT_BASE_URL, "p", "m", " ").unwrap_err(),
                   ConfigError::MissingIdentifier("modelVersion"));
    }
}
