//! Duplicate dictionary key tests.

use crate::error::Error;
use crate::value::Value;

use super::common::{TestEnv, assert_roundtrip};

fn duplicate(err: &Error) -> (&str, &str) {
    match err.innermost() {
        Error::DuplicateMember {
            ty,
            member,
            key: Some(key),
        } => {
            assert_eq!(member, "x:Key");
            (ty.as_str(), key.as_str())
        }
        other => panic!("expected a duplicate key, got {other:?}"),
    }
}

#[test]
fn flat_dictionary() {
    let env = TestEnv::new();
    let doc = env.document(
        "Scores",
        "",
        r#"<x:Int32 x:Key="ada">1</x:Int32><x:Int32 x:Key="bob">2</x:Int32><x:Int32 x:Key="ada">3</x:Int32>"#,
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert_eq!(duplicate(&err), ("Scores", "ada"));
    assert!(err.location().is_some());
    assert!(err.to_string().contains("'ada'"), "{err}");
}

#[test]
fn case_sensitive_keys_are_distinct() {
    let env = TestEnv::new();
    let doc = env.document(
        "Scores",
        "",
        r#"<x:Int32 x:Key="ada">1</x:Int32><x:Int32 x:Key="Ada">2</x:Int32>"#,
    );
    let scores = env.deserialize(&doc).unwrap();
    assert_eq!(scores.as_object().unwrap().len(), 2);
}

#[test]
fn case_insensitive_keys_collide() {
    let env = TestEnv::new();
    let doc = env.document(
        "Shelf",
        "",
        concat!(
            "<Shelf.Books>",
            r#"<x:String x:Key="Dune">first</x:String>"#,
            r#"<x:String x:Key="DUNE">again</x:String>"#,
            "</Shelf.Books>",
        ),
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert_eq!(duplicate(&err), ("Lookup", "DUNE"));
}

#[test]
fn nested_dictionary_names_inner_type() {
    let env = TestEnv::new();
    let doc = env.document(
        "Shelf",
        "",
        concat!(
            "<Shelf.Sections>",
            r#"<Lookup x:Key="fiction">"#,
            r#"<x:String x:Key="a">Anathem</x:String>"#,
            r#"<x:String x:Key="A">again</x:String>"#,
            "</Lookup>",
            "</Shelf.Sections>",
        ),
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert_eq!(duplicate(&err), ("Lookup", "A"));
}

#[test]
fn nested_dictionary_outer_duplicate() {
    let env = TestEnv::new();
    let doc = env.document(
        "Shelf",
        "",
        concat!(
            "<Shelf.Sections>",
            r#"<Lookup x:Key="fiction"/>"#,
            r#"<Lookup x:Key="fiction"/>"#,
            "</Shelf.Sections>",
        ),
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert_eq!(duplicate(&err), ("Catalog", "fiction"));
}

#[test]
fn key_given_twice_on_one_entry() {
    let env = TestEnv::new();
    let doc = env.document(
        "Scores",
        "",
        r#"<x:Int32 x:Key="a"><x:Key>b</x:Key>1</x:Int32>"#,
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert!(
        matches!(err.innermost(), Error::DuplicateMember { key: None, .. }),
        "{err:?}"
    );
}

#[test]
fn distinct_keys_round_trip() {
    let env = TestEnv::new();
    let scores = env.object("Scores");
    scores.insert("ada", 1).unwrap();
    scores.insert("Ada", 2).unwrap();
    scores.insert("", 3).unwrap();
    assert_roundtrip(&env, &Value::Object(scores.clone()));

    let err = scores.insert("ada", 4).unwrap_err();
    assert_eq!(duplicate(&err), ("Scores", "ada"));
}
