//! Built-in text codecs for primitive values.
//!
//! Every primitive has exactly one canonical text form, chosen so that
//! `parse_primitive(kind, &format_primitive(v))` yields a bit-identical value:
//! - Booleans: `True` / `False` (parsing is case-insensitive)
//! - Integers: decimal
//! - Floats: shortest round-trip digits; exponent form outside `[1e-5, 1e16)`;
//!   `NaN`, `Infinity`, `-Infinity`
//! - DateTime: RFC 3339
//!
//! Parse failures keep the underlying `std`/`chrono` error as the cause.

use chrono::{DateTime, SecondsFormat};

use super::Value;
use crate::error::{Error, Result};

/// Primitive value kinds with a built-in codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Boolean,
    /// `u8`
    Byte,
    /// `i16`
    Int16,
    /// `i32`
    Int32,
    /// `i64`
    Int64,
    /// `f32`
    Single,
    /// `f64`
    Double,
    /// `char`
    Char,
    /// `String`
    String,
    /// Date and time with UTC offset.
    DateTime,
}

impl PrimitiveKind {
    /// All kinds, in intrinsic registration order.
    pub const ALL: [PrimitiveKind; 10] = [
        Self::String,
        Self::Boolean,
        Self::Byte,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Single,
        Self::Double,
        Self::Char,
        Self::DateTime,
    ];

    /// Local name of the intrinsic type in the reserved namespace.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Char => "Char",
            Self::String => "String",
            Self::DateTime => "DateTime",
        }
    }

    /// Value used when an intrinsic element has no initialization text.
    pub fn default_value(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Byte => Value::Byte(0),
            Self::Int16 => Value::Int16(0),
            Self::Int32 => Value::Int32(0),
            Self::Int64 => Value::Int64(0),
            Self::Single => Value::Single(0.0),
            Self::Double => Value::Double(0.0),
            Self::Char => Value::Char('\0'),
            Self::String => Value::String(String::new()),
            Self::DateTime => Value::DateTime(DateTime::UNIX_EPOCH.fixed_offset()),
        }
    }
}

/// Format a primitive value as text.
///
/// Returns `None` for `Null` and object values.
pub fn format_primitive(value: &Value) -> Option<String> {
    let text = match value {
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Value::Byte(n) => n.to_string(),
        Value::Int16(n) => n.to_string(),
        Value::Int32(n) => n.to_string(),
        Value::Int64(n) => n.to_string(),
        Value::Single(f) => format_single(*f),
        Value::Double(f) => format_double(*f),
        Value::Char(c) => c.to_string(),
        Value::String(s) => s.clone(),
        Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Value::Null | Value::Object(_) => return None,
    };
    Some(text)
}

/// Parse text as a primitive of the given kind.
///
/// # Examples
/// ```ignore
/// parse_primitive(PrimitiveKind::Int32, "42")         // Ok(Value::Int32(42))
/// parse_primitive(PrimitiveKind::Double, "-Infinity") // Ok(Value::Double(f64::NEG_INFINITY))
/// parse_primitive(PrimitiveKind::Byte, "256")         // Err(Error::Conversion { .. })
/// ```
pub fn parse_primitive(kind: PrimitiveKind, text: &str) -> Result<Value> {
    let fail = |cause: crate::error::BoxedCause| {
        Error::conversion(text, format!("x:{}", kind.type_name()), cause)
    };
    let trimmed = text.trim();

    match kind {
        PrimitiveKind::String => Ok(Value::String(text.to_string())),
        PrimitiveKind::Boolean => parse_bool(trimmed)
            .map(Value::Bool)
            .ok_or_else(|| fail("expected 'True' or 'False'".into())),
        PrimitiveKind::Byte => trimmed.parse().map(Value::Byte).map_err(|e| fail(e.into())),
        PrimitiveKind::Int16 => trimmed.parse().map(Value::Int16).map_err(|e| fail(e.into())),
        PrimitiveKind::Int32 => trimmed.parse().map(Value::Int32).map_err(|e| fail(e.into())),
        PrimitiveKind::Int64 => trimmed.parse().map(Value::Int64).map_err(|e| fail(e.into())),
        PrimitiveKind::Single => trimmed.parse().map(Value::Single).map_err(|e| fail(e.into())),
        PrimitiveKind::Double => trimmed.parse().map(Value::Double).map_err(|e| fail(e.into())),
        // Chars are not trimmed: a single space is a valid value.
        PrimitiveKind::Char => text.parse().map(Value::Char).map_err(|e| fail(e.into())),
        PrimitiveKind::DateTime => DateTime::parse_from_rfc3339(trimmed)
            .map(Value::DateTime)
            .map_err(|e| fail(e.into())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Format a `f64` with its shortest round-trip representation.
pub fn format_double(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-5..1e16).contains(&abs) {
        format!("{f:e}")
    } else {
        format!("{f}")
    }
}

/// Format a `f32` with its shortest round-trip representation.
pub fn format_single(f: f32) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-5..1e16).contains(&abs) {
        format!("{f:e}")
    } else {
        format!("{f}")
    }
}
