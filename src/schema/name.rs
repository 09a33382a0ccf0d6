//! Qualified type names.

use std::fmt;

/// URI of the reserved namespace holding directives and intrinsic types.
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

/// URI bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace URI, local name and closed type arguments of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    namespace: String,
    name: String,
    args: Vec<TypeName>,
}

impl TypeName {
    /// A non-generic type name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A closed generic type name.
    pub fn generic(
        namespace: impl Into<String>,
        name: impl Into<String>,
        args: impl IntoIterator<Item = TypeName>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// A type in the reserved namespace, e.g. `TypeName::xaml("Int32")`.
    pub fn xaml(name: impl Into<String>) -> Self {
        Self::new(XAML_NAMESPACE, name)
    }

    /// Namespace URI.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Local name without type arguments.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closed type arguments, outer arguments first.
    pub fn args(&self) -> &[TypeName] {
        &self.args
    }

    /// Whether the name carries type arguments.
    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Whether this is the named type in the reserved namespace.
    pub fn is_xaml(&self, name: &str) -> bool {
        self.namespace == XAML_NAMESPACE && self.name == name && self.args.is_empty()
    }

    /// Same namespace and local name, ignoring type arguments.
    pub fn same_definition(&self, other: &TypeName) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

impl fmt::Display for TypeName {
    /// `Name` or `Name(Arg1, Arg2)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "({first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
