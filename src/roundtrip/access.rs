//! Access grant tests: internal members and types.

use crate::error::Error;
use crate::value::Value;

use super::common::{NS, TestEnv, assert_roundtrip};

#[test]
fn internal_member_skipped_when_writing() {
    let env = TestEnv::new();
    let account = env.object("Account");
    account.set("Owner", "bo").unwrap();
    account.set("Pin", "1234").unwrap();
    assert_eq!(
        env.compact(&Value::Object(account)),
        r#"<Account xmlns="urn:markup-graph:test" Owner="bo"/>"#
    );
}

#[test]
fn internal_member_denied_when_reading() {
    let env = TestEnv::new();
    let err = env
        .deserialize(r#"<Account xmlns="urn:markup-graph:test" Owner="bo" Pin="1234"/>"#)
        .unwrap_err();
    match err.innermost() {
        Error::AccessDenied { ty, member } => {
            assert_eq!(ty, "Account");
            assert_eq!(member.as_deref(), Some("Pin"));
        }
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

#[test]
fn internal_grant_includes_member() {
    let env = TestEnv::internal();
    let account = env.object("Account");
    account.set("Owner", "bo").unwrap();
    account.set("Pin", "1234").unwrap();
    assert_eq!(
        env.compact(&Value::Object(account.clone())),
        r#"<Account xmlns="urn:markup-graph:test" Owner="bo" Pin="1234"/>"#
    );
    assert_roundtrip(&env, &Value::Object(account));
}

#[test]
fn internal_type() {
    let public = TestEnv::new();
    let vault = public.object("Vault");
    vault.set("Code", "0000").unwrap();
    let value = Value::Object(vault);

    let err = public.serialize(&value).unwrap_err();
    assert!(
        matches!(&err, Error::AccessDenied { member: None, ty } if ty == "Vault"),
        "{err:?}"
    );

    let doc = r#"<Vault xmlns="urn:markup-graph:test" Code="0000"/>"#;
    let err = public.deserialize(doc).unwrap_err();
    assert!(matches!(err.innermost(), Error::AccessDenied { member: None, .. }), "{err:?}");

    let internal = TestEnv::internal();
    let back = internal.deserialize(doc).unwrap();
    assert_eq!(back.as_object().unwrap().get("Code"), Some(Value::from("0000")));
}

#[test]
fn internal_type_nested_in_public_graph() {
    let env = TestEnv::new();
    let holder = env.object("Holder");
    let vault = env.object("Vault");
    holder.set("Content", vault).unwrap();
    let err = env.serialize(&Value::Object(holder.clone())).unwrap_err();
    assert!(matches!(err, Error::AccessDenied { .. }), "{err:?}");

    let internal = TestEnv::internal();
    let holder = internal.object("Holder");
    holder.set("Content", internal.object("Vault")).unwrap();
    assert_roundtrip(&internal, &Value::Object(holder));
    assert!(internal.ctx.resolve(NS, "Vault").is_ok());
}
