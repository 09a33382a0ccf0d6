//! Shared instance tests: names, back-references, cycles.

use crate::config::ConfigBuilder;
use crate::error::Error;
use crate::value::{ObjectRef, Value};

use super::common::{TestEnv, assert_roundtrip};

fn object_member(value: &Value, member: &str) -> ObjectRef {
    value
        .as_object()
        .and_then(|o| o.get(member))
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_else(|| panic!("'{member}' is not an object"))
}

#[test]
fn shared_instance_written_once() {
    let env = TestEnv::new();
    let team = env.object("Team");
    let ada = env.object("Person");
    ada.set("Name", "Ada").unwrap();
    team.set("Lead", ada.clone()).unwrap();
    let members = team.get("Members").unwrap().as_object().unwrap().clone();
    members.push(ada).unwrap();

    let text = env.compact(&Value::Object(team.clone()));
    assert_eq!(text.matches(r#"Name="Ada""#).count(), 1, "{text}");
    assert!(text.contains(r#"x:Name="__Reference_ID_0""#), "{text}");

    let back = assert_roundtrip(&env, &Value::Object(team));
    let lead = object_member(&back, "Lead");
    let first = object_member(&back, "Members").items()[0].clone();
    assert!(ObjectRef::ptr_eq(&lead, first.as_object().unwrap()));
}

#[test]
fn shared_member_uses_reference_extension() {
    let env = TestEnv::new();
    let ada = env.object("Person");
    let bob = env.object("Person");
    bob.set("Name", "Bob").unwrap();
    ada.set("Friend", bob.clone()).unwrap();
    let tags_holder = env.object("Team");
    tags_holder.set("Lead", ada).unwrap();
    let members = tags_holder.get("Members").unwrap().as_object().unwrap().clone();
    members.push(bob).unwrap();

    assert_roundtrip(&env, &Value::Object(tags_holder));
}

#[test]
fn self_cycle() {
    let env = TestEnv::new();
    let narcissus = env.object("Person");
    narcissus.set("Name", "Narcissus").unwrap();
    narcissus.set("Friend", narcissus.clone()).unwrap();

    assert_eq!(
        env.compact(&Value::Object(narcissus.clone())),
        concat!(
            r#"<Person xmlns="urn:markup-graph:test" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml" "#,
            r#"x:Name="__Reference_ID_0" Name="Narcissus" Friend="{x:Reference __Reference_ID_0}"/>"#
        )
    );
    let back = assert_roundtrip(&env, &Value::Object(narcissus));
    let friend = object_member(&back, "Friend");
    assert!(ObjectRef::ptr_eq(back.as_object().unwrap(), &friend));
}

#[test]
fn mutual_cycle() {
    let env = TestEnv::new();
    let a = env.object("Person");
    let b = env.object("Person");
    a.set("Name", "A").unwrap();
    b.set("Name", "B").unwrap();
    a.set("Friend", b.clone()).unwrap();
    b.set("Friend", a.clone()).unwrap();

    let back = assert_roundtrip(&env, &Value::Object(a));
    let b_back = object_member(&back, "Friend");
    let a_again = b_back.get("Friend").unwrap();
    assert!(ObjectRef::ptr_eq(back.as_object().unwrap(), a_again.as_object().unwrap()));
}

#[test]
fn custom_reference_prefix() {
    let env = TestEnv::with_config(ConfigBuilder::new().reference_prefix("ref").build());
    let p = env.object("Person");
    p.set("Friend", p.clone()).unwrap();
    let text = env.compact(&Value::Object(p.clone()));
    assert!(text.contains(r#"x:Name="ref0""#), "{text}");
    assert_roundtrip(&env, &Value::Object(p));
}

#[test]
fn unresolved_reference() {
    let env = TestEnv::new();
    let doc = env.document("Person", r#"Friend="{x:Reference ghost}""#, "");
    let err = env.deserialize(&doc).unwrap_err();
    assert!(
        matches!(err.innermost(), Error::UnresolvedReference { name } if name == "ghost"),
        "{err:?}"
    );
}

#[test]
fn forward_reference_is_unresolved() {
    let env = TestEnv::new();
    let doc = env.document(
        "Team",
        "",
        concat!(
            r#"<Team.Lead><x:Reference Name="later"/></Team.Lead>"#,
            r#"<Team.Members><Person x:Name="later"/></Team.Members>"#,
        ),
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert!(matches!(err.innermost(), Error::UnresolvedReference { .. }), "{err:?}");
}

#[test]
fn explicit_names_resolved() {
    let env = TestEnv::new();
    let doc = env.document(
        "Team",
        "",
        concat!(
            r#"<Team.Lead><Person x:Name="boss" Name="Ada"/></Team.Lead>"#,
            r#"<Team.Members><x:Reference>boss</x:Reference></Team.Members>"#,
        ),
    );
    let team = env.deserialize(&doc).unwrap();
    let lead = object_member(&team, "Lead");
    let member = object_member(&team, "Members").items()[0].clone();
    assert!(ObjectRef::ptr_eq(&lead, member.as_object().unwrap()));
}

#[test]
fn name_registered_twice() {
    let env = TestEnv::new();
    let doc = env.document(
        "Team",
        "",
        r#"<Team.Members><Person x:Name="twin"/><Person x:Name="twin"/></Team.Members>"#,
    );
    let err = env.deserialize(&doc).unwrap_err();
    assert!(matches!(err.innermost(), Error::DuplicateMember { .. }), "{err:?}");
}

#[test]
fn shared_read_only_collection_rejected() {
    let env = TestEnv::new();
    let team = env.object("Team");
    let members = team.get("Members").unwrap().as_object().unwrap().clone();
    members.push(1).unwrap();
    team.set("Extras", members.clone()).unwrap();

    let err = env.serialize(&Value::Object(team.clone())).unwrap_err();
    match &err {
        Error::SharedReadOnly { ty, member } => {
            assert_eq!(ty, "Team");
            assert_eq!(member, "Members");
        }
        other => panic!("expected SharedReadOnly, got {other:?}"),
    }

    // Items of the collection may still be shared.
    let team = env.object("Team");
    let ada = env.object("Person");
    let members = team.get("Members").unwrap().as_object().unwrap().clone();
    members.push(ada.clone()).unwrap();
    let extras = env.object("Items");
    extras.push(ada).unwrap();
    team.set("Extras", extras).unwrap();
    assert_roundtrip(&env, &Value::Object(team));
}
