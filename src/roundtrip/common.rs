//! Test infrastructure for roundtrip tests.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::config::{AccessGrant, Config, ConfigBuilder};
use crate::error::{BoxedCause, Result};
use crate::schema::{
    Capability, GenericDefinition, MemberBuilder, RawCapture, SchemaContext, TypeBuilder,
    TypeDescriptor, TypeName,
};
use crate::value::{Converter, ObjectRef, Value, ValueConverter, to_json};
use crate::{deserialize_with, serialize_with};

pub const NS: &str = "urn:markup-graph:test";

pub fn t(name: &str) -> TypeName {
    TypeName::new(NS, name)
}

pub fn x(name: &str) -> TypeName {
    TypeName::xaml(name)
}

/// `Temperature` ↔ `"21.5C"`.
struct Celsius;

impl ValueConverter for Celsius {
    fn to_text(&self, value: &Value) -> std::result::Result<String, BoxedCause> {
        let degrees = value
            .as_object()
            .and_then(|o| o.get("Degrees"))
            .and_then(|d| d.as_f64())
            .ok_or("not a temperature")?;
        Ok(format!("{degrees}C"))
    }

    fn from_text(
        &self,
        text: &str,
        target: &Arc<TypeDescriptor>,
        ctx: &SchemaContext,
    ) -> std::result::Result<Value, BoxedCause> {
        let degrees: f64 = text.strip_suffix('C').ok_or("missing 'C' suffix")?.parse()?;
        temperature(ctx, target, degrees)
    }

    fn name(&self) -> &str {
        "Celsius"
    }
}

/// Member-level override writing `Temperature` in Fahrenheit.
struct Fahrenheit;

impl ValueConverter for Fahrenheit {
    fn to_text(&self, value: &Value) -> std::result::Result<String, BoxedCause> {
        let degrees = value
            .as_object()
            .and_then(|o| o.get("Degrees"))
            .and_then(|d| d.as_f64())
            .ok_or("not a temperature")?;
        Ok(format!("{}F", degrees * 9.0 / 5.0 + 32.0))
    }

    fn from_text(
        &self,
        text: &str,
        target: &Arc<TypeDescriptor>,
        ctx: &SchemaContext,
    ) -> std::result::Result<Value, BoxedCause> {
        let fahrenheit: f64 = text.strip_suffix('F').ok_or("missing 'F' suffix")?.parse()?;
        temperature(ctx, target, (fahrenheit - 32.0) * 5.0 / 9.0)
    }
}

fn temperature(
    ctx: &SchemaContext,
    target: &Arc<TypeDescriptor>,
    degrees: f64,
) -> std::result::Result<Value, BoxedCause> {
    let object = ctx.create(target)?;
    object.set("Degrees", degrees)?;
    Ok(Value::Object(object))
}

/// Test environment holding a populated schema.
pub struct TestEnv {
    pub ctx: SchemaContext,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(ConfigBuilder::new().build())
    }

    pub fn with_config(config: Config) -> Self {
        let ctx = SchemaContext::new();
        register_schema(&ctx).unwrap();
        Self { ctx, config }
    }

    /// Environment granted access to internal types and members.
    pub fn internal() -> Self {
        Self::with_config(ConfigBuilder::new().access(AccessGrant::Internal).build())
    }

    pub fn object(&self, name: &str) -> ObjectRef {
        self.ctx.instantiate(NS, name).unwrap()
    }

    pub fn generic(&self, name: &str, args: &[TypeName]) -> ObjectRef {
        let ty = self.ctx.resolve_generic(NS, name, args).unwrap();
        self.ctx.create(&ty).unwrap()
    }

    pub fn serialize(&self, value: &Value) -> Result<String> {
        serialize_with(value, &self.ctx, &self.config)
    }

    pub fn deserialize(&self, text: &str) -> Result<Value> {
        deserialize_with(text, &self.ctx, &self.config)
    }

    /// Serialize with a compact layout, for exact output checks.
    pub fn compact(&self, value: &Value) -> String {
        let config = Config {
            indent: None,
            ..self.config.clone()
        };
        serialize_with(value, &self.ctx, &config).unwrap()
    }

    /// Wrap a markup body in a root element declaring the test namespaces.
    pub fn document(&self, root: &str, attrs: &str, body: &str) -> String {
        format!(
            r#"<{root} xmlns="{NS}" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml" {attrs}>{body}</{root}>"#
        )
    }
}

fn register_schema(ctx: &SchemaContext) -> Result<()> {
    ctx.set_preferred_prefix(NS, "t");

    // Collections
    ctx.register(
        TypeBuilder::new(NS, "StringList")
            .capability(Capability::List)
            .item_type(x("String")),
    )?;
    ctx.register(TypeBuilder::new(NS, "Items").capability(Capability::List))?;
    ctx.register(
        TypeBuilder::new(NS, "Sequence")
            .capability(Capability::Enumerable)
            .item_type(x("Int32")),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Lookup")
            .dictionary(x("String"), x("Object"))
            .ignore_case_keys(),
    )?;
    ctx.register(TypeBuilder::new(NS, "Scores").dictionary(x("String"), x("Int32")))?;
    ctx.register(TypeBuilder::new(NS, "Catalog").dictionary(x("String"), t("Lookup")))?;

    // Plain objects
    let person = ctx.register(
        TypeBuilder::new(NS, "Person")
            .member(MemberBuilder::new("Name", x("String")))
            .member(MemberBuilder::new("Age", x("Int32")).default_value(0))
            .member(MemberBuilder::new("Friend", t("Person")))
            .member(MemberBuilder::new("Tags", t("StringList")).read_only().initialized()),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Employee")
            .extends(&person)
            .member(MemberBuilder::new("Title", x("String"))),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Team")
            .member(MemberBuilder::new("Lead", t("Person")))
            .member(MemberBuilder::new("Members", t("Items")).read_only().initialized())
            .member(MemberBuilder::new("Extras", t("Items"))),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Stream")
            .member(MemberBuilder::new("Values", t("Sequence")).read_only().initialized()),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Shelf")
            .member(MemberBuilder::new("Books", t("Lookup")).read_only().initialized())
            .member(MemberBuilder::new("Sections", t("Catalog")).read_only().initialized()),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Note")
            .member(MemberBuilder::new("Title", x("String")))
            .member(MemberBuilder::new("Body", x("String")))
            .content_property("Body"),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Holder")
            .member(MemberBuilder::new("Label", x("String")))
            .member(MemberBuilder::new("Content", x("Object")).content()),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Panel")
            .member(MemberBuilder::new("Children", t("Items")).read_only().initialized().content()),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Loose")
            .member(MemberBuilder::new("Known", x("String")))
            .tolerate_unknown_members(),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Numbers")
            .member(MemberBuilder::new("Byte", x("Byte")))
            .member(MemberBuilder::new("Short", x("Int16")))
            .member(MemberBuilder::new("Int", x("Int32")))
            .member(MemberBuilder::new("Long", x("Int64")))
            .member(MemberBuilder::new("Single", x("Single")))
            .member(MemberBuilder::new("Double", x("Double")))
            .member(MemberBuilder::new("Flag", x("Boolean")))
            .member(MemberBuilder::new("Letter", x("Char")))
            .member(MemberBuilder::new("Text", x("String")))
            .member(MemberBuilder::new("When", x("DateTime"))),
    )?;

    // Construction
    ctx.register(
        TypeBuilder::new(NS, "Point")
            .member(MemberBuilder::new("X", x("Int32")).read_only().ctor_arg(0))
            .member(MemberBuilder::new("Y", x("Int32")).read_only().ctor_arg(1).default_value(0)),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Segment")
            .member(MemberBuilder::new("Start", t("Point")))
            .member(MemberBuilder::new("End", t("Point"))),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Range")
            .member(MemberBuilder::new("Min", x("Int32")))
            .member(MemberBuilder::new("Max", x("Int32")))
            .constructor(["Min", "Max"])
            .no_default_constructor(),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Color")
            .member(MemberBuilder::new("R", x("Byte")))
            .member(MemberBuilder::new("G", x("Byte")))
            .member(MemberBuilder::new("B", x("Byte")))
            .factory("FromGray", [x("Byte")], |ctx, args| {
                let ty = ctx.resolve(NS, "Color")?;
                let color = ctx.create(&ty)?;
                for channel in ["R", "G", "B"] {
                    color.set(channel, args[0].clone())?;
                }
                Ok(Value::Object(color))
            }),
    )?;

    // Converters
    ctx.register(
        TypeBuilder::new(NS, "Temperature")
            .member(MemberBuilder::new("Degrees", x("Double")))
            .converter(Celsius),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Thermostat")
            .member(MemberBuilder::new("Target", t("Temperature")))
            .member(MemberBuilder::new("Limit", t("Temperature")).converter(Fahrenheit))
            .member(
                MemberBuilder::new("Count", x("Int32")).with_converter(Converter::from_fns(
                    |v| Ok(format!("#{}", v.as_i32().ok_or("not an Int32")?)),
                    |text, _, _| {
                        let digits = text.strip_prefix('#').ok_or("missing '#'")?;
                        Ok(Value::Int32(digits.parse()?))
                    },
                )),
            ),
    )?;

    // Access
    ctx.register(
        TypeBuilder::new(NS, "Account")
            .member(MemberBuilder::new("Owner", x("String")))
            .member(MemberBuilder::new("Pin", x("String")).internal()),
    )?;
    ctx.register(
        TypeBuilder::new(NS, "Vault")
            .member(MemberBuilder::new("Code", x("String")))
            .internal(),
    )?;

    // Raw capture
    ctx.register(
        TypeBuilder::new(NS, "Snippet")
            .member(MemberBuilder::new("Markup", x("String")).raw(RawCapture::Xml))
            .member(MemberBuilder::new("Script", x("String")).raw(RawCapture::Text)),
    )?;

    // Generics
    ctx.register_generic(GenericDefinition::dictionary(NS, "Map"))?;
    ctx.register_generic(GenericDefinition::list(NS, "Seq"))?;
    ctx.register_generic(GenericDefinition::boxed(NS, "Cell"))?;
    ctx.register_generic(GenericDefinition::new(NS, "Outer", 1, |args| {
        Ok(TypeBuilder::new(NS, "").member(MemberBuilder::new("Value", args[0].clone())))
    }))?;
    ctx.register_generic(
        GenericDefinition::new(NS, "Inner", 1, |args| {
            Ok(TypeBuilder::new(NS, "")
                .member(MemberBuilder::new("First", args[0].clone()))
                .member(MemberBuilder::new("Second", args[1].clone())))
        })
        .nested_in("Outer"),
    )?;
    Ok(())
}

/// Compare JSON values, ignoring key order.
pub fn json_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            let keys_a: std::collections::HashSet<_> = a.keys().collect();
            let keys_b: std::collections::HashSet<_> = b.keys().collect();
            keys_a == keys_b && keys_a.iter().all(|k| json_eq(&a[*k], &b[*k]))
        }
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| json_eq(x, y))
        }
        _ => a == b,
    }
}

/// Test value → markup → value roundtrip; returns the rebuilt value.
///
/// Also checks that writing the rebuilt value gives the same markup.
pub fn assert_roundtrip(env: &TestEnv, value: &Value) -> Value {
    let text = env.serialize(value).expect("serialize failed");
    let back = match env.deserialize(&text) {
        Ok(back) => back,
        Err(e) => panic!("deserialize failed: {e}\nMarkup:\n{text}"),
    };

    let expected = to_json(value);
    let actual = to_json(&back);
    assert!(
        json_eq(&expected, &actual),
        "Roundtrip mismatch:\nMarkup:\n{text}\nInput:  {}\nOutput: {}",
        serde_json::to_string_pretty(&expected).unwrap(),
        serde_json::to_string_pretty(&actual).unwrap()
    );
    assert_eq!(value, &back, "structural mismatch for markup:\n{text}");

    let again = env.serialize(&back).expect("second serialize failed");
    assert_eq!(text, again, "markup is not stable across a roundtrip");
    back
}
