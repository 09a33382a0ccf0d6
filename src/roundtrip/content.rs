//! Content property tests: inline text, object content, implicit collections.

use crate::error::Error;
use crate::value::Value;

use super::common::{TestEnv, assert_roundtrip};

#[test]
fn text_content_inline() {
    let env = TestEnv::new();
    let note = env.object("Note");
    note.set("Title", "Todo").unwrap();
    note.set("Body", "buy milk").unwrap();
    assert_eq!(
        env.compact(&Value::Object(note.clone())),
        r#"<Note xmlns="urn:markup-graph:test" Title="Todo">buy milk</Note>"#
    );
    assert_roundtrip(&env, &Value::Object(note));
}

#[test]
fn text_content_with_edge_whitespace() {
    let env = TestEnv::new();
    for body in ["  indented", "trailing\n", " ", "line one\nline two"] {
        let note = env.object("Note");
        note.set("Body", body).unwrap();
        let back = assert_roundtrip(&env, &Value::Object(note));
        assert_eq!(back.as_object().unwrap().get("Body"), Some(Value::from(body)));
    }
}

#[test]
fn text_content_trimmed_when_hand_written() {
    let env = TestEnv::new();
    let note = env.deserialize(&env.document("Note", "", "\n    buy milk\n")).unwrap();
    assert_eq!(note.as_object().unwrap().get("Body"), Some(Value::from("buy milk")));

    let preserved = env
        .deserialize(&env.document("Note", r#"xml:space="preserve""#, "  buy milk "))
        .unwrap();
    assert_eq!(
        preserved.as_object().unwrap().get("Body"),
        Some(Value::from("  buy milk "))
    );
}

#[test]
fn object_content() {
    let env = TestEnv::new();
    let holder = env.object("Holder");
    holder.set("Label", "boxed").unwrap();
    let ada = env.object("Person");
    ada.set("Name", "Ada").unwrap();
    holder.set("Content", ada).unwrap();
    assert_eq!(
        env.compact(&Value::Object(holder.clone())),
        r#"<Holder xmlns="urn:markup-graph:test" Label="boxed"><Person Name="Ada"/></Holder>"#
    );
    assert_roundtrip(&env, &Value::Object(holder));
}

#[test]
fn content_property_as_property_element() {
    let env = TestEnv::new();
    let doc = env.document(
        "Holder",
        "",
        r#"<Holder.Content><Note Title="inner"/></Holder.Content>"#,
    );
    let holder = env.deserialize(&doc).unwrap();
    let content = holder.as_object().unwrap().get("Content").unwrap();
    assert_eq!(content.as_object().unwrap().get("Title"), Some(Value::from("inner")));
}

#[test]
fn content_collection_implicit() {
    let env = TestEnv::new();
    let panel = env.object("Panel");
    let children = panel.get("Children").unwrap().as_object().unwrap().clone();
    let ada = env.object("Person");
    ada.set("Name", "A").unwrap();
    let note = env.object("Note");
    note.set("Body", "hi").unwrap();
    children.push(ada).unwrap();
    children.push(note).unwrap();

    assert_eq!(
        env.compact(&Value::Object(panel.clone())),
        r#"<Panel xmlns="urn:markup-graph:test"><Person Name="A"/><Note>hi</Note></Panel>"#
    );
    let back = assert_roundtrip(&env, &Value::Object(panel));
    let back_children = back.as_object().unwrap().get("Children").unwrap();
    assert_eq!(back_children.as_object().unwrap().len(), 2);
}

#[test]
fn content_written_after_other_members() {
    let env = TestEnv::new();
    let doc = env.document("Note", "", "<Note.Title>T</Note.Title>body");
    let note = env.deserialize(&doc).unwrap();
    let note = note.as_object().unwrap();
    assert_eq!(note.get("Title"), Some(Value::from("T")));
    assert_eq!(note.get("Body"), Some(Value::from("body")));
}

#[test]
fn content_twice_is_duplicate() {
    let env = TestEnv::new();
    let doc = env.document("Note", "", "<Note.Body>one</Note.Body>two");
    let err = env.deserialize(&doc).unwrap_err();
    assert!(
        matches!(err.innermost(), Error::DuplicateMember { member, key: None, .. } if member == "Body"),
        "{err:?}"
    );
}

#[test]
fn text_on_object_without_content_rejected() {
    let env = TestEnv::new();
    let err = env.deserialize(&env.document("Person", "", "stray")).unwrap_err();
    assert!(matches!(err.innermost(), Error::UnexpectedContent { .. }), "{err:?}");
}
