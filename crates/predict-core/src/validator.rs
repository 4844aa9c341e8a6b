//! Validación de configuración contra el schema de entrada.
//!
//! Chequeo puro: no muta config ni schema. Sin schema de entrada (diseño
//! dinámico) la validación se pospone al runtime. Los settings diferidos se
//! omiten en lugar de tratarse como error.

use log::debug;

use crate::config::{Setting, StageConfig};
use crate::errors::ConfigError;
use crate::planner::prediction_type;
use crate::schema::{FieldType, Schema};

/// Valida la configuración frente a `input` si está disponible.
pub fn validate(config: &StageConfig, input: Option<&Schema>) -> Result<(), ConfigError> {
    let Some(input) = input else {
        debug!("validate:deferred reason=no input schema");
        return Ok(());
    };

    if let Some(name) = config.instances_field() {
        let field = input.field(name)
                         .ok_or_else(|| ConfigError::FieldNotFound(name.to_string()))?;
        let field_type = field.field_type().non_nullable();
        if !is_valid_input_type(field_type) {
            return Err(ConfigError::UnsupportedFieldType { field: name.to_string(),
                                                           found: field_type.to_string() });
        }
    }

    if !config.output_field.is_deferred() {
        let output = config.output_field_name();
        if input.contains(output) {
            return Err(ConfigError::NameCollision(output.to_string()));
        }
    }
    Ok(())
}

/// Predicado de aceptación de tipos para el campo de instancias. Hoy acepta
/// todos los tipos.
pub fn is_valid_input_type(_field_type: &FieldType) -> bool {
    true
}

/// El schema de salida declarado debe contener el campo de salida con el tipo
/// que el stage va a escribir: nullable y del tipo de predicción.
pub fn validate_declared_output(declared: &Schema, output_field: &str) -> Result<(), ConfigError> {
    let field = declared.field(output_field)
                        .ok_or_else(|| ConfigError::OutputFieldNotDeclared(output_field.to_string()))?;
    let expected = FieldType::nullable(prediction_type(Some(declared), output_field));
    if field.field_type() != &expected {
        return Err(ConfigError::InvalidOutputType { field: output_field.to_string(),
                                                    expected: expected.to_string(),
                                                    found: field.field_type().to_string() });
    }
    Ok(())
}

/// Verifica que los identificadores del endpoint estén resueltos. Se llama en
/// tiempo de ejecución, antes de cualquier llamada de red.
pub fn validate_identifiers(config: &StageConfig) -> Result<(), ConfigError> {
    let required: [(&'static str, &Setting<String>); 3] =
        [("project", &config.project), ("model", &config.model), ("modelVersion", &config.model_version)];
    for (name, setting) in required {
        if setting.as_deref().is_none() {
            return Err(ConfigError::MissingIdentifier(name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn audio() -> Schema {
        Schema::record("in", vec![Field::of("audio", FieldType::Bytes), Field::of("city", FieldType::String)]).unwrap()
    }

    fn with_selector(name: &str) -> StageConfig {
        StageConfig { instances_field: Setting::Known(name.into()),
                      ..Default::default() }
    }

    #[test]
    fn declared_output_must_be_nullable_prediction() {
        let ok = Schema::record("out",
                                vec![Field::of("age", FieldType::Int),
                                     Field::of("prediction", FieldType::nullable(FieldType::Double))]).unwrap();
        assert_eq!(validate_declared_output(&ok, "prediction"), Ok(()));
        assert_eq!(validate_declared_output(&ok, "score"),
                   Err(ConfigError::OutputFieldNotDeclared("score".into())));

        let text = Schema::record("out", vec![Field::of("prediction", FieldType::String)]).unwrap();
        assert_eq!(validate_declared_output(&text, "prediction"),
                   Err(ConfigError::InvalidOutputType { field: "prediction".into(),
                                                        expected: "nullable double".into(),
                                                        found: "string".into() }));

        let required = Schema::record("out", vec![Field::of("prediction", FieldType::Double)]).unwrap();
        assert!(matches!(validate_declared_output(&required, "prediction"),
                         Err(ConfigError::InvalidOutputType { .. })));
    }

    #[test]
    fn declared_record_prediction_is_accepted() {
        let scores = Schema::record("scores", vec![Field::of("label", FieldType::String)]).unwrap();
        let out = Schema::record("out",
                                 vec![Field::of("prediction", FieldType::nullable(FieldType::Record(scores)))]).unwrap();
        assert_eq!(validate_declared_output(&out, "prediction"), Ok(()));
    }

    #[test]
    fn no_schema_is_a_no_op() {
        assert_eq!(validate(&with_selector("missing"), None), Ok(()));
    }

    #[test]
    fn selector_must_exist() {
        assert_eq!(validate(&with_selector("audio"), Some(&audio())), Ok(()));
        assert_eq!(validate(&with_selector("missing"), Some(&audio())),
                   Err(ConfigError::FieldNotFound("missing".into())));
    }

    #[test]
    fn deferred_selector_is_skipped() {
        let cfg = StageConfig { instances_field: Setting::Deferred("${f}".into()),
                                ..Default::default() };
        assert_eq!(validate(&cfg, Some(&audio())), Ok(()));
    }

    #[test]
    fn output_collision_is_rejected() {
        let cfg = StageConfig { output_field: Setting::Known("city".into()),
                                ..Default::default() };
        assert_eq!(validate(&cfg, Some(&audio())), Err(ConfigError::NameCollision("city".into())));
        let deferred = StageConfig { output_field: Setting::Deferred("${out}".into()),
                                     ..Default::default() };
        assert_eq!(validate(&deferred, Some(&audio())), Ok(()));
    }

    #[test]
    fn identifiers_must_be_known() {
        let mut cfg = StageConfig { project: Setting::Known("p".into()),
                                    model: Setting::Known("m".into()),
                                    model_version: Setting::Known("v1".into()),
                                    ..Default::default() };
        assert_eq!(validate_identifiers(&cfg), Ok(()));
        cfg.model = Setting::Deferred("${model}".into());
        assert_eq!(validate_identifiers(&cfg), Err(ConfigError::MissingIdentifier("model")));
        cfg.model = Setting::Known("m".into());
        cfg.model_version = Setting::Absent;
        assert_eq!(validate_identifiers(&cfg), Err(ConfigError::MissingIdentifier("modelVersion")));
    }
}
