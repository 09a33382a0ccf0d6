//! Markup surface tests: escaping, layout, raw capture, streams, diagnostics.

use std::fs::File;
use std::io::{Seek, SeekFrom};

use crate::config::ConfigBuilder;
use crate::diagnostic::{DiagnosticOptions, render};
use crate::document::{deserialize_from_reader_with, serialize_to_writer_with};
use crate::error::Error;
use crate::value::Value;

use super::common::{TestEnv, assert_roundtrip};

#[test]
fn leading_brace_escaped() {
    let env = TestEnv::new();
    let p = env.object("Person");
    p.set("Name", "{not an extension}").unwrap();
    assert_eq!(
        env.compact(&Value::Object(p.clone())),
        r#"<Person xmlns="urn:markup-graph:test" Name="{}{not an extension}"/>"#
    );
    let back = assert_roundtrip(&env, &Value::Object(p));
    assert_eq!(
        back.as_object().unwrap().get("Name"),
        Some(Value::from("{not an extension}"))
    );

    // Braces after the first character need no escape.
    let p = env.object("Person");
    p.set("Name", "a{b}").unwrap();
    assert_eq!(
        env.compact(&Value::Object(p)),
        r#"<Person xmlns="urn:markup-graph:test" Name="a{b}"/>"#
    );
}

#[test]
fn indented_layout() {
    let env = TestEnv::new();
    let p = env.object("Person");
    p.set("Name", "Ada").unwrap();
    p.get("Tags").unwrap().as_object().unwrap().push("math").unwrap();
    assert_eq!(
        env.serialize(&Value::Object(p)).unwrap(),
        concat!(
            "<Person xmlns=\"urn:markup-graph:test\" Name=\"Ada\">\n",
            "  <Person.Tags>\n",
            "    <x:String xmlns:x=\"http://schemas.microsoft.com/winfx/2006/xaml\">math</x:String>\n",
            "  </Person.Tags>\n",
            "</Person>"
        )
    );
}

#[test]
fn sibling_items_share_prefix_declaration() {
    let env = TestEnv::new();
    let p = env.object("Person");
    p.set("Name", "Ada").unwrap();
    let tags = p.get("Tags").unwrap().as_object().unwrap().clone();
    tags.push("math").unwrap();
    tags.push("logic").unwrap();
    assert_eq!(
        env.compact(&Value::Object(p.clone())),
        concat!(
            r#"<Person xmlns="urn:markup-graph:test" Name="Ada">"#,
            r#"<Person.Tags xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">"#,
            "<x:String>math</x:String><x:String>logic</x:String>",
            "</Person.Tags></Person>"
        )
    );
    assert_roundtrip(&env, &Value::Object(p));
}

#[test]
fn xml_declaration() {
    let env = TestEnv::with_config(ConfigBuilder::new().compact().xml_declaration(true).build());
    let text = env.serialize(&Value::Int32(5)).unwrap();
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="utf-8"?><Int32"#), "{text}");
    assert_eq!(env.deserialize(&text).unwrap(), Value::Int32(5));
}

#[test]
fn explicit_prefixes_accepted() {
    let env = TestEnv::new();
    let doc = r#"<t:Person xmlns:t="urn:markup-graph:test" Name="Ada"><t:Person.Friend><t:Person Name="Bob"/></t:Person.Friend></t:Person>"#;
    let p = env.deserialize(doc).unwrap();
    let friend = p.as_object().unwrap().get("Friend").unwrap();
    assert_eq!(friend.as_object().unwrap().get("Name"), Some(Value::from("Bob")));
}

#[test]
fn comments_and_processing_instructions_ignored() {
    let env = TestEnv::new();
    let doc = env.document("Note", "", "<!-- draft --><?render fast?>hello<!-- end -->");
    let note = env.deserialize(&doc).unwrap();
    assert_eq!(note.as_object().unwrap().get("Body"), Some(Value::from("hello")));
}

#[test]
fn raw_members_captured() {
    let env = TestEnv::new();
    let snippet = env.object("Snippet");
    snippet.set("Markup", "<b>bold</b><i/>").unwrap();
    snippet.set("Script", "if a < b && c { go(); }").unwrap();
    let back = assert_roundtrip(&env, &Value::Object(snippet));
    let back = back.as_object().unwrap();
    assert_eq!(back.get("Markup"), Some(Value::from("<b>bold</b><i/>")));
    assert_eq!(back.get("Script"), Some(Value::from("if a < b && c { go(); }")));
}

#[test]
fn raw_markup_hand_written() {
    let env = TestEnv::new();
    let doc = env.document(
        "Snippet",
        "",
        r#"<Snippet.Markup><p class="x">hi <em>there</em></p></Snippet.Markup>"#,
    );
    let snippet = env.deserialize(&doc).unwrap();
    assert_eq!(
        snippet.as_object().unwrap().get("Markup"),
        Some(Value::from(r#"<p class="x">hi <em>there</em></p>"#))
    );
}

#[test]
fn raw_text_with_cdata_terminator() {
    let env = TestEnv::new();
    let snippet = env.object("Snippet");
    snippet.set("Script", "a[b[0]]>c").unwrap();
    assert_roundtrip(&env, &Value::Object(snippet));
}

#[test]
fn unknown_members_tolerated() {
    let env = TestEnv::new();
    let doc = env.document(
        "Loose",
        r#"Known="k" Extra="e""#,
        "<Loose.Other><Person/></Loose.Other>",
    );
    let loose = env.deserialize(&doc).unwrap();
    assert_eq!(loose.as_object().unwrap().get("Known"), Some(Value::from("k")));
}

#[test]
fn unknown_member_rejected() {
    let env = TestEnv::new();
    let err = env
        .deserialize(r#"<Person xmlns="urn:markup-graph:test" Nmae="Ada"/>"#)
        .unwrap_err();
    assert!(
        matches!(err.innermost(), Error::UnknownMember { member, .. } if member == "Nmae"),
        "{err:?}"
    );
    assert_eq!(err.location(), Some((1, 1)));
}

#[test]
fn unknown_type_rejected() {
    let env = TestEnv::new();
    let err = env
        .deserialize(&env.document("Team", "", "<Team.Lead><Robot/></Team.Lead>"))
        .unwrap_err();
    assert!(
        matches!(err.innermost(), Error::UnknownType { name, .. } if name == "Robot"),
        "{err:?}"
    );

    let err = env
        .deserialize(r#"<Segment xmlns="urn:markup-graph:test" Start="{Vector 1, 2}"/>"#)
        .unwrap_err();
    assert!(matches!(err.innermost(), Error::UnknownType { .. }), "{err:?}");
}

#[test]
fn malformed_documents() {
    let env = TestEnv::new();
    for doc in [
        "<Person xmlns=\"urn:markup-graph:test\">\n  <Person.Name>\n</Person>",
        "<Person xmlns=\"urn:markup-graph:test\" Name=\"unterminated/>",
        "<p:Person/>",
        "<!DOCTYPE Person><Person xmlns=\"urn:markup-graph:test\"/>",
        "",
    ] {
        let err = env.deserialize(doc).unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup { .. }), "{doc:?}: {err:?}");
        assert!(err.location().is_some());
    }

    let err = env
        .deserialize(r#"<Person xmlns="urn:markup-graph:test" Name="{x:Null"/>"#)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedMarkup { .. }), "{err:?}");
}

#[test]
fn file_streams() {
    let env = TestEnv::new();
    let p = env.object("Person");
    p.set("Name", "Ada").unwrap();
    p.set("Age", 36).unwrap();
    let value = Value::Object(p);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("person.xaml");
    serialize_to_writer_with(&value, &env.ctx, &env.config, File::create(&path).unwrap()).unwrap();
    let back = deserialize_from_reader_with(File::open(&path).unwrap(), &env.ctx, &env.config).unwrap();
    assert_eq!(back, value);

    let mut file = tempfile::tempfile().unwrap();
    serialize_to_writer_with(&value, &env.ctx, &env.config, &mut file).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let back = deserialize_from_reader_with(&file, &env.ctx, &env.config).unwrap();
    assert_eq!(back, value);
}

#[test]
fn rendered_diagnostics() {
    let env = TestEnv::new();
    let doc = r#"<Person xmlns="urn:markup-graph:test" Nmae="Ada"/>"#;
    let err = env.deserialize(doc).unwrap_err();

    let short = render(&err, Some(doc), &DiagnosticOptions::short());
    assert_eq!(short, "1:1: type 'Person' has no member 'Nmae'");

    let rich = render(&err, Some(doc), &DiagnosticOptions::plain());
    assert!(rich.starts_with("error: type 'Person' has no member 'Nmae'"), "{rich}");
    assert!(rich.contains("┌─ 1:1"), "{rich}");
    assert!(rich.contains("1 │ <Person"), "{rich}");
    assert!(rich.ends_with("│ ^"), "{rich}");
}

#[test]
fn rendered_conversion_cause() {
    let env = TestEnv::new();
    let doc = "<Numbers xmlns=\"urn:markup-graph:test\"\n         Int=\"many\"/>";
    let err = env.deserialize(doc).unwrap_err();
    let rich = render(&err, Some(doc), &DiagnosticOptions::plain());
    assert!(rich.contains("cannot convert 'many' to x:Int32"), "{rich}");
    assert!(rich.contains("= caused by: invalid digit found in string"), "{rich}");
}

#[test]
fn derived_instance_in_base_member() {
    let env = TestEnv::new();
    let ada = env.object("Person");
    let boss = env.object("Employee");
    boss.set("Name", "Grace").unwrap();
    boss.set("Title", "Rear Admiral").unwrap();
    ada.set("Friend", boss).unwrap();

    let text = env.compact(&Value::Object(ada.clone()));
    assert!(text.contains(r#"<Employee Name="Grace" Title="Rear Admiral"/>"#), "{text}");
    assert_roundtrip(&env, &Value::Object(ada));
}

#[test]
fn inherited_member_qualified_by_base() {
    let env = TestEnv::new();
    let doc = env.document("Employee", "", "<Person.Name>Grace</Person.Name><Employee.Title>CTO</Employee.Title>");
    let e = env.deserialize(&doc).unwrap();
    let e = e.as_object().unwrap();
    assert_eq!(e.get("Name"), Some(Value::from("Grace")));
    assert_eq!(e.get("Title"), Some(Value::from("CTO")));

    let err = env
        .deserialize(&env.document("Person", "", "<Employee.Title>CTO</Employee.Title>"))
        .unwrap_err();
    assert!(matches!(err.innermost(), Error::UnknownMember { .. }), "{err:?}");
}

fn friend_chain(env: &TestEnv, len: usize) -> Value {
    let root = env.object("Person");
    let mut tail = root.clone();
    for _ in 1..len {
        let next = env.object("Person");
        tail.set("Friend", next.clone()).unwrap();
        tail = next;
    }
    Value::Object(root)
}

#[test]
fn nesting_limit_both_directions() {
    let env = TestEnv::with_config(ConfigBuilder::new().max_depth(8).build());
    let fits = friend_chain(&env, 8);
    assert_roundtrip(&env, &fits);

    let err = env.serialize(&friend_chain(&env, 9)).unwrap_err();
    assert!(matches!(err, Error::TooDeep { limit: 8 }), "{err:?}");

    // Nine objects nest 17 elements, which is still within 2 * 8 + 1.
    let text = TestEnv::new().serialize(&friend_chain(&env, 10)).unwrap();
    let err = env.deserialize(&text).unwrap_err();
    assert!(matches!(err.innermost(), Error::TooDeep { limit: 8 }), "{err:?}");
    assert!(err.location().is_some());
}

#[test]
fn deep_graphs_fail_cleanly() {
    let env = TestEnv::new();
    let err = env.serialize(&friend_chain(&env, 600)).unwrap_err();
    assert!(matches!(err, Error::TooDeep { limit: 64 }), "{err:?}");

    let levels = 600;
    let doc = format!(
        r#"<Person xmlns="urn:markup-graph:test">{}{}</Person>"#,
        "<Person.Friend><Person>".repeat(levels),
        "</Person></Person.Friend>".repeat(levels)
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert!(matches!(err.innermost(), Error::TooDeep { limit: 64 }), "{err:?}");
}
