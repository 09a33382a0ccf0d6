//! Pluggable text converters.

use std::fmt;
use std::sync::Arc;

use super::Value;
use crate::error::BoxedCause;
use crate::schema::{SchemaContext, TypeDescriptor};

/// Converts values of one type to and from text.
///
/// Attached either to a type (applies wherever the type appears) or to a
/// member (overrides the type's converter for that member only).
pub trait ValueConverter: Send + Sync {
    /// Whether `value` can be written as text by this converter.
    fn can_convert(&self, value: &Value) -> bool {
        !value.is_null()
    }

    /// Format a value.
    fn to_text(&self, value: &Value) -> Result<String, BoxedCause>;

    /// Parse text into a value of `target`.
    fn from_text(
        &self,
        text: &str,
        target: &Arc<TypeDescriptor>,
        ctx: &SchemaContext,
    ) -> Result<Value, BoxedCause>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared converter handle.
#[derive(Clone)]
pub struct Converter(Arc<dyn ValueConverter>);

impl Converter {
    /// Wrap a converter.
    pub fn new(converter: impl ValueConverter + 'static) -> Self {
        Self(Arc::new(converter))
    }

    /// Build a converter from a pair of closures.
    pub fn from_fns<F, G>(to_text: F, from_text: G) -> Self
    where
        F: Fn(&Value) -> Result<String, BoxedCause> + Send + Sync + 'static,
        G: Fn(&str, &Arc<TypeDescriptor>, &SchemaContext) -> Result<Value, BoxedCause>
            + Send
            + Sync
            + 'static,
    {
        Self::new(FnConverter { to_text, from_text })
    }
}

impl std::ops::Deref for Converter {
    type Target = dyn ValueConverter;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Converter").field(&self.0.name()).finish()
    }
}

struct FnConverter<F, G> {
    to_text: F,
    from_text: G,
}

impl<F, G> ValueConverter for FnConverter<F, G>
where
    F: Fn(&Value) -> Result<String, BoxedCause> + Send + Sync,
    G: Fn(&str, &Arc<TypeDescriptor>, &SchemaContext) -> Result<Value, BoxedCause> + Send + Sync,
{
    fn to_text(&self, value: &Value) -> Result<String, BoxedCause> {
        (self.to_text)(value)
    }

    fn from_text(
        &self,
        text: &str,
        target: &Arc<TypeDescriptor>,
        ctx: &SchemaContext,
    ) -> Result<Value, BoxedCause> {
        (self.from_text)(text, target, ctx)
    }

    fn name(&self) -> &str {
        "closure"
    }
}
