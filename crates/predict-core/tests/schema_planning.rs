//! Propiedades de planificación de schemas y del envelope sobre varios
//! schemas de entrada representativos.

use std::sync::Arc;

use predict_core::{instance_schema, output_schema, validate, ConfigError, Field, FieldType, FieldValue, Record,
                   RequestEncoder, Schema, SchemaError, Setting, StageConfig};

fn sample_schemas() -> Vec<Schema> {
    vec![Schema::record("empty", vec![]).unwrap(),
         Schema::record("people", vec![Field::of("age", FieldType::Int), Field::of("city", FieldType::String)]).unwrap(),
         Schema::record("speech",
                        vec![Field::of("transcript", FieldType::String),
                             Field::of("confidence", FieldType::Double),
                             Field::of("speaker", FieldType::nullable(FieldType::String))]).unwrap()]
}

#[test]
fn instance_schema_without_selector_mirrors_input() {
    for s in sample_schemas() {
        let inst = instance_schema(&s, None).unwrap();
        assert_eq!(inst.fields(), s.fields(), "schema {}", s.name());
    }
}

#[test]
fn instance_schema_with_selector_holds_exactly_that_field() {
    for s in sample_schemas() {
        for f in s.fields() {
            let inst = instance_schema(&s, Some(f.name())).unwrap();
            assert_eq!(inst.fields(), std::slice::from_ref(f));
        }
        assert_eq!(instance_schema(&s, Some("missing")).unwrap_err(),
                   SchemaError::FieldNotFound("missing".into()));
    }
}

#[test]
fn output_schema_appends_one_nullable_double() {
    for s in sample_schemas() {
        for name in [None, Some("score")] {
            let out = output_schema(&s, name).unwrap();
            assert_eq!(out.len(), s.len() + 1);
            let last = out.fields().last().unwrap();
            assert_eq!(last.name(), name.unwrap_or("prediction"));
            assert_eq!(last.field_type(), &FieldType::nullable(FieldType::Double));
            assert_eq!(&out.fields()[..s.len()], s.fields());
            // determinista
            assert_eq!(out, output_schema(&s, name).unwrap());
        }
    }
}

#[test]
fn validation_rejects_every_colliding_output_name() {
    for s in sample_schemas() {
        for f in s.fields() {
            let cfg = StageConfig { output_field: Setting::Known(f.name().to_string()),
                                    ..Default::default() };
            assert_eq!(validate(&cfg, Some(&s)), Err(ConfigError::NameCollision(f.name().to_string())));
        }
    }
}

#[test]
fn scenario_people_envelope_and_output() {
    let s = Arc::new(sample_schemas().remove(1));
    let mut b = Record::builder(Arc::clone(&s));
    b.set("age", 29).unwrap().set("city", "Detroit").unwrap();
    let record = b.build().unwrap();

    let inst = Arc::new(instance_schema(&s, None).unwrap());
    let req = RequestEncoder::default().encode(&record, &inst).unwrap();
    assert_eq!(req.as_str(), Some(r#"{"instances":[{"age":29,"city":"Detroit"}]}"#));

    let out = output_schema(&s, None).unwrap();
    let types: Vec<(&str, &FieldType)> = out.fields().iter().map(|f| (f.name(), f.field_type())).collect();
    assert_eq!(types,
               vec![("age", &FieldType::Int),
                    ("city", &FieldType::String),
                    ("prediction", &FieldType::nullable(FieldType::Double))]);
}

#[test]
fn scenario_speech_envelope_round_trips() {
    let s = Arc::new(Schema::record("record",
                                    vec![Field::of("transcript", FieldType::String),
                                         Field::of("confidence", FieldType::Double)]).unwrap());
    let mut b = Record::builder(Arc::clone(&s));
    b.set("transcript", "test").unwrap().set("confidence", 21.2).unwrap();
    let record = b.build().unwrap();

    let enc = RequestEncoder::default();
    let req = enc.encode(&record, &s).unwrap();
    assert_eq!(req.as_str(), Some(r#"{"instances":[{"transcript":"test","confidence":21.2}]}"#));
    let back = enc.decode(&req.body, &s).unwrap();
    assert_eq!(back.get("confidence"), Some(&FieldValue::Double(21.2)));
    assert_eq!(back, record);
}

#[test]
fn scenario_audio_selector() {
    let s = Schema::record("record", vec![Field::of("audio", FieldType::Bytes)]).unwrap();
    assert_eq!(instance_schema(&s, Some("audio")).unwrap().fields(), s.fields());

    let cfg = StageConfig { instances_field: Setting::Known("missing".into()),
                            ..Default::default() };
    assert_eq!(validate(&cfg, Some(&s)), Err(ConfigError::FieldNotFound("missing".into())));
}
