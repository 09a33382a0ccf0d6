//! Value converter tests: type converters, member overrides, failures.

use crate::error::Error;
use crate::value::Value;

use super::common::{NS, TestEnv, assert_roundtrip};

fn temperature(env: &TestEnv, degrees: f64) -> Value {
    let t = env.object("Temperature");
    t.set("Degrees", degrees).unwrap();
    Value::Object(t)
}

fn degrees(value: &Value, member: &str) -> Option<f64> {
    value.as_object()?.get(member)?.as_object()?.get("Degrees")?.as_f64()
}

#[test]
fn member_converter_overrides_type_converter() {
    let env = TestEnv::new();
    let thermostat = env.object("Thermostat");
    thermostat.set("Target", temperature(&env, 21.5)).unwrap();
    thermostat.set("Limit", temperature(&env, 100.0)).unwrap();
    thermostat.set("Count", 7).unwrap();

    assert_eq!(
        env.compact(&Value::Object(thermostat.clone())),
        r##"<Thermostat xmlns="urn:markup-graph:test" Target="21.5C" Limit="212F" Count="#7"/>"##
    );
    let back = assert_roundtrip(&env, &Value::Object(thermostat));
    assert_eq!(degrees(&back, "Target"), Some(21.5));
    assert_eq!(degrees(&back, "Limit"), Some(100.0));
}

#[test]
fn converted_root_uses_initialization_text() {
    let env = TestEnv::new();
    let root = temperature(&env, -4.0);
    assert_eq!(
        env.compact(&root),
        r#"<Temperature xmlns="urn:markup-graph:test">-4C</Temperature>"#
    );
    assert_roundtrip(&env, &root);
}

#[test]
fn converter_applies_only_to_declared_type() {
    // `Holder.Content` is `x:Object`, so the temperature stays an element
    // and converts through its own initialization text.
    let env = TestEnv::new();
    let holder = env.object("Holder");
    holder.set("Content", temperature(&env, 30.0)).unwrap();
    assert_eq!(
        env.compact(&Value::Object(holder.clone())),
        r#"<Holder xmlns="urn:markup-graph:test"><Temperature>30C</Temperature></Holder>"#
    );
    assert_roundtrip(&env, &Value::Object(holder));
}

#[test]
fn converter_failure_is_conversion_error() {
    let env = TestEnv::new();
    let err = env
        .deserialize(r#"<Thermostat xmlns="urn:markup-graph:test" Count="7"/>"#)
        .unwrap_err();
    match err.innermost() {
        Error::Conversion { text, source, .. } => {
            assert_eq!(text, "7");
            assert!(source.to_string().contains('#'), "{source}");
        }
        other => panic!("expected a conversion error, got {other:?}"),
    }

    let err = env
        .deserialize(r#"<Thermostat xmlns="urn:markup-graph:test" Target="warm"/>"#)
        .unwrap_err();
    assert!(matches!(err.innermost(), Error::Conversion { .. }), "{err:?}");
}

#[test]
fn int_overflow_through_member_converter() {
    let env = TestEnv::new();
    let err = env
        .deserialize(r##"<Thermostat xmlns="urn:markup-graph:test" Count="#99999999999"/>"##)
        .unwrap_err();
    assert!(matches!(err.innermost(), Error::Conversion { .. }), "{err:?}");
}

#[test]
fn object_without_converter_needs_element() {
    let env = TestEnv::new();
    let err = env
        .deserialize(r#"<Person xmlns="urn:markup-graph:test" Friend="Bob"/>"#)
        .unwrap_err();
    match err.innermost() {
        Error::Conversion { target, .. } => assert_eq!(target, "Person"),
        other => panic!("expected a conversion error, got {other:?}"),
    }
    assert!(env.ctx.resolve(NS, "Person").unwrap().converter().is_none());
}
