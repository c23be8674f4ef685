use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crate::adapters::template::{Template, TemplateComposer};
use crate::domain::field::parse_fields;

#[test]
fn test_single_record_is_a_mapping() {
    let fields = parse_fields(&json!({ "id": "uuid", "ok": "boolean" }));
    let mut rng = StdRng::seed_from_u64(1);

    let template = TemplateComposer::new().compose(&fields, 1, &mut rng);
    assert!(matches!(template, Template::Record(ref entries) if entries.len() == 2));

    let value = template.materialize(&mut rng);
    assert!(value.is_object());
    assert!(value["ok"].is_boolean());
}

#[test]
fn test_zero_count_yields_one_record() {
    let fields = parse_fields(&json!({ "ok": "boolean" }));
    let value = TemplateComposer::new().generate(&fields, 0);
    assert!(value.is_object());
}

#[test]
fn test_many_records_are_independent() {
    let fields = parse_fields(&json!({ "id": "uuid" }));
    let value = TemplateComposer::new().generate(&fields, 5);
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 5);

    let mut ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[test]
fn test_field_order_follows_declaration() {
    let fields = parse_fields(&json!({ "zulu": "boolean", "alpha": "color", "mike": null }));
    let value = TemplateComposer::new().generate(&fields, 1);
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    assert_eq!(value["mike"], Value::Null);
}

#[test]
fn test_literal_is_materialized_verbatim() {
    let mut rng = StdRng::seed_from_u64(3);
    let template = Template::List(vec![
        Template::Literal(json!({ "fixed": [1, 2] })),
        Template::Record(vec![("k".to_string(), Template::Literal(json!("v")))]),
    ]);
    assert_eq!(
        template.materialize(&mut rng),
        json!([{ "fixed": [1, 2] }, { "k": "v" }])
    );
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let fields = parse_fields(&json!({
        "n": { "type": "number", "min": 0, "max": 1000000 },
        "s": { "type": "string", "length": 8 }
    }));
    let composer = TemplateComposer::new();
    let a = composer.generate_with(&fields, 3, &mut StdRng::seed_from_u64(42));
    let b = composer.generate_with(&fields, 3, &mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
}
