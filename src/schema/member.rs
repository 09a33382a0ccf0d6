//! Member descriptors.

use std::fmt;

use super::TypeName;
use crate::value::{Converter, Value, ValueConverter};

/// Whether a member can be assigned after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberAccess {
    /// Settable.
    #[default]
    ReadWrite,
    /// Only readable; populated by a constructor or by appending items.
    ReadOnly,
}

/// Visibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Visible under every grant.
    #[default]
    Public,
    /// Visible only under an internal grant.
    Internal,
}

/// How a member captures its markup content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawCapture {
    /// Concatenated character data, untrimmed.
    Text,
    /// Inner markup verbatim, including comments, PIs and CDATA.
    Xml,
}

/// One member of a type.
#[derive(Clone)]
pub struct MemberDescriptor {
    pub(super) name: String,
    pub(super) value_type: TypeName,
    pub(super) declaring_type: TypeName,
    pub(super) access: MemberAccess,
    pub(super) ctor_arg: Option<usize>,
    pub(super) default: Option<Value>,
    pub(super) content: bool,
    pub(super) converter: Option<Converter>,
    pub(super) visibility: Visibility,
    pub(super) raw: Option<RawCapture>,
    pub(super) initialized: bool,
}

impl MemberDescriptor {
    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn value_type(&self) -> &TypeName {
        &self.value_type
    }

    /// Type that declares the member (an ancestor for inherited members).
    pub fn declaring_type(&self) -> &TypeName {
        &self.declaring_type
    }

    /// Access mode.
    pub fn access(&self) -> MemberAccess {
        self.access
    }

    /// Whether the member is read-only.
    pub fn is_read_only(&self) -> bool {
        self.access == MemberAccess::ReadOnly
    }

    /// Position in the argument constructor, if bound to one.
    pub fn ctor_arg(&self) -> Option<usize> {
        self.ctor_arg
    }

    /// Declared default.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether this is the type's content property.
    pub fn is_content(&self) -> bool {
        self.content
    }

    /// Member-level converter.
    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// Visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Raw capture mode.
    pub fn raw_capture(&self) -> Option<RawCapture> {
        self.raw
    }

    /// Whether new instances hold a fresh instance of the value type here.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether `value` equals the value a freshly created instance holds.
    ///
    /// Members without a declared default start out null, or as an empty
    /// instance when [`is_initialized`](Self::is_initialized).
    pub fn is_default(&self, value: &Value) -> bool {
        match (&self.default, value) {
            (Some(default), value) => default == value,
            (None, Value::Null) => !self.initialized,
            (None, Value::Object(o)) => self.initialized && o.read().is_empty_collection(),
            (None, _) => false,
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("access", &self.access)
            .field("ctor_arg", &self.ctor_arg)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for a member, consumed by
/// [`TypeBuilder::member`](super::TypeBuilder::member).
///
/// # Example
///
/// ```ignore
/// MemberBuilder::new("Items", TypeName::new(NS, "ItemList"))
///     .read_only()
///     .initialized()
/// ```
#[derive(Clone)]
pub struct MemberBuilder {
    pub(super) name: String,
    pub(super) value_type: TypeName,
    pub(super) access: MemberAccess,
    pub(super) ctor_arg: Option<usize>,
    pub(super) default: Option<Value>,
    pub(super) content: bool,
    pub(super) converter: Option<Converter>,
    pub(super) visibility: Visibility,
    pub(super) raw: Option<RawCapture>,
    pub(super) initialized: bool,
}

impl MemberBuilder {
    /// Start a read-write member.
    pub fn new(name: impl Into<String>, value_type: TypeName) -> Self {
        Self {
            name: name.into(),
            value_type,
            access: MemberAccess::ReadWrite,
            ctor_arg: None,
            default: None,
            content: false,
            converter: None,
            visibility: Visibility::Public,
            raw: None,
            initialized: false,
        }
    }

    /// Make the member read-only.
    pub fn read_only(mut self) -> Self {
        self.access = MemberAccess::ReadOnly;
        self
    }

    /// Bind the member to the argument constructor at `index`.
    pub fn ctor_arg(mut self, index: usize) -> Self {
        self.ctor_arg = Some(index);
        self
    }

    /// Declare a default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark as the type's content property.
    pub fn content(mut self) -> Self {
        self.content = true;
        self
    }

    /// Attach a member-level converter.
    pub fn converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Some(Converter::new(converter));
        self
    }

    /// Attach an already shared converter.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Make the member internal.
    pub fn internal(mut self) -> Self {
        self.visibility = Visibility::Internal;
        self
    }

    /// Capture markup content raw.
    pub fn raw(mut self, mode: RawCapture) -> Self {
        self.raw = Some(mode);
        self
    }

    /// New instances hold a fresh, empty instance of the value type.
    pub fn initialized(mut self) -> Self {
        self.initialized = true;
        self
    }

    pub(super) fn build(self, declaring_type: &TypeName) -> MemberDescriptor {
        MemberDescriptor {
            name: self.name,
            value_type: self.value_type,
            declaring_type: declaring_type.clone(),
            access: self.access,
            ctor_arg: self.ctor_arg,
            default: self.default,
            content: self.content,
            converter: self.converter,
            visibility: self.visibility,
            raw: self.raw,
            initialized: self.initialized,
        }
    }
}
