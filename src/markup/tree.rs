//! Element tree assembled from a node stream before it is written out.

use crate::schema::TypeName;

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub ns: String,
    pub local: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Child>,
    /// Adds `xml:space="preserve"`.
    pub preserve_space: bool,
}

impl Element {
    pub fn new(ns: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            local: local.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            preserve_space: false,
        }
    }

    pub fn with_children(mut self, children: Vec<Child>) -> Self {
        self.children = children;
        self
    }

    pub fn is_bare(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty() && !self.preserve_space
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Attr {
    /// `None` for an unqualified attribute.
    pub ns: Option<String>,
    pub local: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn local(local: impl Into<String>, value: AttrValue) -> Self {
        Self {
            ns: None,
            local: local.into(),
            value,
        }
    }

    pub fn qualified(ns: impl Into<String>, local: impl Into<String>, value: AttrValue) -> Self {
        Self {
            ns: Some(ns.into()),
            local: local.into(),
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum AttrValue {
    /// Literal text; a leading `{` is escaped on output.
    Text(String),
    /// `x:TypeArguments` list; prefixes are chosen while writing.
    TypeList(Vec<TypeName>),
    /// Markup extension with positional text arguments.
    Extension {
        ns: String,
        local: String,
        args: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum Child {
    Element(Element),
    Text(String),
    /// Written verbatim.
    Raw(String),
    CData(String),
}
