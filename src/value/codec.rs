//! Value ↔ text conversion for members, items, keys and initialization text.
//!
//! Precedence is member converter, then type converter, then the built-in
//! primitive codec.

use std::sync::Arc;

use super::{Converter, Value, format_primitive, parse_primitive};
use crate::error::{Error, Result};
use crate::schema::{MemberDescriptor, SchemaContext, TypeDescriptor, intrinsic};

/// Text codec bound to a schema.
#[derive(Clone, Copy)]
pub struct ValueCodec<'a> {
    ctx: &'a SchemaContext,
}

impl<'a> ValueCodec<'a> {
    /// Create a codec.
    pub fn new(ctx: &'a SchemaContext) -> Self {
        Self { ctx }
    }

    /// Encode a member value as text.
    ///
    /// Fails with a conversion error when the value has no text form under
    /// the member's declared type.
    pub fn encode(&self, value: &Value, member: &MemberDescriptor) -> Result<String> {
        let declared = self.ctx.resolve_name(member.value_type())?;
        self.try_encode(value, &declared, member.converter())?
            .ok_or_else(|| {
                Error::conversion(
                    value.describe(),
                    declared.name().to_string(),
                    "value has no text form for this type",
                )
            })
    }

    /// Decode member text.
    pub fn decode(&self, text: &str, member: &MemberDescriptor) -> Result<Value> {
        let declared = self.ctx.resolve_name(member.value_type())?;
        self.decode_as(text, &declared, member.converter())
    }

    /// Text form of `value` where `declared` is expected, if it has one.
    ///
    /// `None` means the value must be written as an object.
    pub fn try_encode(
        &self,
        value: &Value,
        declared: &TypeDescriptor,
        member_converter: Option<&Converter>,
    ) -> Result<Option<String>> {
        if value.is_null() {
            return Ok(None);
        }
        let target = || declared.name().to_string();

        if let Some(converter) = member_converter
            && converter.can_convert(value)
        {
            return converter
                .to_text(value)
                .map(Some)
                .map_err(|e| Error::conversion(value.describe(), target(), e));
        }

        match value {
            Value::Object(object) => {
                // A type converter applies only when the runtime type is the
                // declared one; otherwise the text would decode as the wrong type.
                let runtime = object.descriptor();
                if runtime.name() == declared.name()
                    && let Some(converter) = runtime.converter()
                    && converter.can_convert(value)
                {
                    return converter
                        .to_text(value)
                        .map(Some)
                        .map_err(|e| Error::conversion(value.describe(), target(), e));
                }
                Ok(None)
            }
            primitive if declared.primitive().is_some() && declared.primitive() == primitive.kind() => {
                Ok(format_primitive(primitive))
            }
            _ => Ok(None),
        }
    }

    /// Decode text as a value of `declared`.
    pub fn decode_as(
        &self,
        text: &str,
        declared: &Arc<TypeDescriptor>,
        member_converter: Option<&Converter>,
    ) -> Result<Value> {
        let target = || declared.name().to_string();

        if let Some(converter) = member_converter.or(declared.converter()) {
            return converter
                .from_text(text, declared, self.ctx)
                .map_err(|e| Error::conversion(text, target(), e));
        }
        if let Some(kind) = declared.primitive() {
            return parse_primitive(kind, text);
        }
        if declared.is_intrinsic(intrinsic::OBJECT) {
            return Ok(Value::String(text.to_string()));
        }
        Err(Error::conversion(text, target(), "type has no text converter"))
    }
}
