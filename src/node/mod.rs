//! Markup node stream: the intermediate form between object graphs and text.
//!
//! ```text
//! StartObject(Person)
//!   StartMember(Name)  Value("Ada")  EndMember
//!   StartMember(_Items)
//!     StartObject(x:Int32) StartMember(_Initialization) Value("1") EndMember EndObject
//!   EndMember
//! EndObject
//! ```

mod list;

use std::fmt;
use std::sync::Arc;

pub use list::{NodeList, Position};

use crate::schema::{MemberDescriptor, TypeDescriptor};

/// Member from the reserved namespace, or an implicit member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `x:Key`: dictionary key of the enclosing object.
    Key,
    /// `x:Name`: registers the object for back-references.
    Name,
    /// `x:TypeArguments`: closed type arguments of a generic element.
    TypeArguments,
    /// `x:Arguments`: constructor or factory arguments.
    Arguments,
    /// `x:FactoryMethod`: name of the factory creating the object.
    FactoryMethod,
    /// `_Items`: collection items.
    Items,
    /// `_Initialization`: text creating the object through its converter.
    Initialization,
    /// `_PositionalParameters`: markup-extension positional arguments.
    PositionalParameters,
}

impl Directive {
    /// Name as written; implicit members start with `_`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Key => "Key",
            Self::Name => "Name",
            Self::TypeArguments => "TypeArguments",
            Self::Arguments => "Arguments",
            Self::FactoryMethod => "FactoryMethod",
            Self::Items => "_Items",
            Self::Initialization => "_Initialization",
            Self::PositionalParameters => "_PositionalParameters",
        }
    }

    /// Look up a directive written in the reserved namespace.
    pub fn from_markup(local_name: &str) -> Option<Self> {
        Some(match local_name {
            "Key" => Self::Key,
            "Name" => Self::Name,
            "TypeArguments" => Self::TypeArguments,
            "Arguments" => Self::Arguments,
            "FactoryMethod" => Self::FactoryMethod,
            _ => return None,
        })
    }

    /// Whether the member is implicit (never written as `x:` markup).
    pub fn is_implicit(self) -> bool {
        matches!(self, Self::Items | Self::Initialization | Self::PositionalParameters)
    }
}

/// Member addressed by a `StartMember` node.
#[derive(Debug, Clone)]
pub enum XamlMember {
    /// Member of the object's type.
    Member(Arc<MemberDescriptor>),
    /// Directive or implicit member.
    Directive(Directive),
}

impl XamlMember {
    /// Whether this is the given directive.
    pub fn is_directive(&self, directive: Directive) -> bool {
        matches!(self, Self::Directive(d) if *d == directive)
    }
}

impl fmt::Display for XamlMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(m) => f.write_str(m.name()),
            Self::Directive(d) if d.is_implicit() => f.write_str(d.name()),
            Self::Directive(d) => write!(f, "x:{}", d.name()),
        }
    }
}

/// One node of the stream.
#[derive(Debug, Clone)]
pub enum MarkupNode {
    /// `xmlns` declaration in effect from the next object on.
    NamespaceDeclaration {
        /// Prefix; empty for the default namespace.
        prefix: String,
        /// Namespace URI.
        uri: String,
    },
    /// Begin a new object of the given type.
    StartObject(Arc<TypeDescriptor>),
    /// Begin the object already held by the enclosing member.
    GetObject,
    /// End the current object.
    EndObject,
    /// Begin a member of the current object.
    StartMember(XamlMember),
    /// End the current member.
    EndMember,
    /// Text value of the current member.
    Value(String),
}

impl fmt::Display for MarkupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamespaceDeclaration { prefix, uri } => write!(f, "NS {prefix}={uri}"),
            Self::StartObject(ty) => write!(f, "SO {}", ty.name()),
            Self::GetObject => f.write_str("GO"),
            Self::EndObject => f.write_str("EO"),
            Self::StartMember(m) => write!(f, "SM {m}"),
            Self::EndMember => f.write_str("EM"),
            Self::Value(text) => write!(f, "V {text:?}"),
        }
    }
}
