//! Node stream → markup text.
//!
//! Nodes are first folded into an element tree, choosing attribute,
//! property-element or content form for each member. The tree is then
//! written with namespace prefixes assigned on first use.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::node::{Directive, MarkupNode, NodeList, XamlMember};
use crate::schema::{
    RawCapture, SchemaContext, TypeDescriptor, TypeName, XAML_NAMESPACE, XML_NAMESPACE, intrinsic,
};

use super::escape::{escape_attr, escape_braces, escape_cdata, escape_text, is_whitespace_safe};
use super::extension;
use super::tree::{Attr, AttrValue, Child, Element};

/// Writes a node list as markup text.
pub struct MarkupEmitter<'a> {
    ctx: &'a SchemaContext,
    config: &'a Config,
}

impl<'a> MarkupEmitter<'a> {
    /// Create an emitter.
    pub fn new(ctx: &'a SchemaContext, config: &'a Config) -> Self {
        Self { ctx, config }
    }

    /// Render `nodes`, which must hold exactly one root object.
    pub fn emit(&self, nodes: &NodeList) -> Result<String> {
        let mut cursor = Cursor::new(nodes);
        cursor.skip_declarations();
        let root = self.object(&mut cursor)?.element;
        cursor.skip_declarations();
        if let Some(node) = cursor.peek() {
            return Err(Error::node_sequence(format!("unexpected '{node}' after the root object")));
        }

        let mut writer = TextWriter::new(self.ctx, self.config, root.ns.clone());
        writer.plan_declarations(&root);
        if self.config.xml_declaration {
            writer.out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
            if self.config.indent.is_some() {
                writer.out.push('\n');
            }
        }
        writer.element(&root, 0)?;
        Ok(writer.out)
    }

    // =========================================================================
    // Tree building
    // =========================================================================

    fn object(&self, cursor: &mut Cursor<'_>) -> Result<Built> {
        let ty = match cursor.next() {
            Some(MarkupNode::StartObject(ty)) => ty.clone(),
            other => return Err(unexpected(other, "StartObject")),
        };
        let name = ty.name();
        let mut element = Element::new(name.namespace(), name.name());
        if name.is_generic() {
            element.attrs.push(Attr::qualified(
                XAML_NAMESPACE,
                "TypeArguments",
                AttrValue::TypeList(name.args().to_vec()),
            ));
        }

        let mut content = Vec::new();
        let mut positional = None;
        loop {
            match cursor.next() {
                Some(MarkupNode::NamespaceDeclaration { .. }) => {}
                Some(MarkupNode::StartMember(member)) => {
                    let body = self.member_body(cursor)?;
                    if member.is_directive(Directive::PositionalParameters) {
                        positional = body
                            .iter()
                            .map(|b| match b {
                                Body::Text(text) => Some(text.clone()),
                                _ => None,
                            })
                            .collect::<Option<Vec<_>>>();
                    }
                    self.place(&ty, &mut element, &mut content, member, body)?;
                }
                Some(MarkupNode::EndObject) => break,
                other => return Err(unexpected(other, "StartMember or EndObject")),
            }
        }
        element.children.extend(content);

        let extension = extension_form(&ty, &element, positional);
        Ok(Built { element, extension })
    }

    /// Values up to the matching `EndMember`.
    fn member_body(&self, cursor: &mut Cursor<'_>) -> Result<Vec<Body>> {
        let mut body = Vec::new();
        loop {
            match cursor.peek() {
                Some(MarkupNode::Value(text)) => {
                    body.push(Body::Text(text.clone()));
                    cursor.advance();
                }
                Some(MarkupNode::StartObject(_)) => body.push(Body::Object(self.object(cursor)?)),
                Some(MarkupNode::GetObject) => {
                    cursor.advance();
                    body.push(Body::Items(self.get_object(cursor)?));
                }
                Some(MarkupNode::NamespaceDeclaration { .. }) => cursor.advance(),
                Some(MarkupNode::EndMember) => {
                    cursor.advance();
                    return Ok(body);
                }
                other => return Err(unexpected(other, "a member value or EndMember")),
            }
        }
    }

    fn get_object(&self, cursor: &mut Cursor<'_>) -> Result<Vec<Body>> {
        let mut items = Vec::new();
        loop {
            match cursor.next() {
                Some(MarkupNode::StartMember(member)) if member.is_directive(Directive::Items) => {
                    items.extend(self.member_body(cursor)?);
                }
                Some(MarkupNode::EndObject) => return Ok(items),
                Some(MarkupNode::StartMember(member)) => {
                    return Err(Error::node_sequence(format!(
                        "member '{member}' of a GetObject cannot be written as markup"
                    )));
                }
                other => return Err(unexpected(other, "_Items or EndObject")),
            }
        }
    }

    fn place(
        &self,
        ty: &TypeDescriptor,
        element: &mut Element,
        content: &mut Vec<Child>,
        member: &XamlMember,
        body: Vec<Body>,
    ) -> Result<()> {
        match member {
            XamlMember::Directive(Directive::TypeArguments) => {}
            XamlMember::Directive(
                directive @ (Directive::Key | Directive::Name | Directive::FactoryMethod),
            ) => {
                let local = directive.name();
                match single_attribute(&body) {
                    Some(value) => element
                        .attrs
                        .push(Attr::qualified(XAML_NAMESPACE, local, value)),
                    None => element.children.push(Child::Element(
                        Element::new(XAML_NAMESPACE, local).with_children(children(body)),
                    )),
                }
            }
            XamlMember::Directive(Directive::Arguments | Directive::PositionalParameters) => {
                let args = match body.as_slice() {
                    [Body::Text(text)] if is_whitespace_safe(text) => vec![Child::Text(text.clone())],
                    _ => body
                        .into_iter()
                        .flat_map(|b| match b {
                            Body::Text(text) => vec![Child::Element(string_element(text))],
                            other => children(vec![other]),
                        })
                        .collect(),
                };
                element.children.insert(
                    0,
                    Child::Element(Element::new(XAML_NAMESPACE, "Arguments").with_children(args)),
                );
            }
            XamlMember::Directive(Directive::Initialization) => {
                for b in body {
                    match b {
                        Body::Text(text) => {
                            if !is_whitespace_safe(&text) {
                                element.preserve_space = true;
                            }
                            content.push(Child::Text(text));
                        }
                        _ => {
                            return Err(Error::node_sequence(
                                "_Initialization must hold text only",
                            ));
                        }
                    }
                }
            }
            XamlMember::Directive(Directive::Items) => content.extend(children(body)),
            XamlMember::Member(member) => {
                let property = || {
                    let name = ty.name();
                    Element::new(name.namespace(), format!("{}.{}", name.name(), member.name()))
                };
                if let Some(mode) = member.raw_capture()
                    && let [Body::Text(text)] = body.as_slice()
                {
                    let raw = match mode {
                        RawCapture::Xml => Child::Element(
                            Element::new(XAML_NAMESPACE, intrinsic::XDATA)
                                .with_children(vec![Child::Raw(text.clone())]),
                        ),
                        RawCapture::Text => Child::CData(text.clone()),
                    };
                    element.children.push(Child::Element(property().with_children(vec![raw])));
                    return Ok(());
                }
                match body.as_slice() {
                    [Body::Text(text)]
                        if member.is_content()
                            && content.is_empty()
                            && !text.is_empty()
                            && is_whitespace_safe(text) =>
                    {
                        content.push(Child::Text(text.clone()));
                    }
                    _ => match single_attribute(&body) {
                        Some(value) => element.attrs.push(Attr::local(member.name(), value)),
                        None if member.is_content() => content.extend(children(body)),
                        None => element
                            .children
                            .push(Child::Element(property().with_children(children(body)))),
                    },
                }
            }
        }
        Ok(())
    }
}

/// An object folded into an element, plus its attribute form when it has one.
struct Built {
    element: Element,
    extension: Option<AttrValue>,
}

enum Body {
    Text(String),
    Object(Built),
    /// Items added through `GetObject`.
    Items(Vec<Body>),
}

fn single_attribute(body: &[Body]) -> Option<AttrValue> {
    match body {
        [Body::Text(text)] => Some(AttrValue::Text(text.clone())),
        [Body::Object(built)] => built.extension.clone(),
        _ => None,
    }
}

fn children(body: Vec<Body>) -> Vec<Child> {
    let mut out = Vec::with_capacity(body.len());
    for b in body {
        match b {
            Body::Text(text) => out.push(Child::Text(text)),
            Body::Object(built) => out.push(Child::Element(built.element)),
            Body::Items(items) => out.extend(children(items)),
        }
    }
    out
}

fn string_element(text: String) -> Element {
    let mut element = Element::new(XAML_NAMESPACE, "String");
    element.preserve_space = !is_whitespace_safe(&text);
    element.children.push(Child::Text(text));
    element
}

/// `{x:Null}`, `{x:Reference name}` and objects built only from positional
/// text arguments fit in an attribute.
fn extension_form(
    ty: &TypeDescriptor,
    element: &Element,
    positional: Option<Vec<String>>,
) -> Option<AttrValue> {
    if let Some(args) = positional
        && element.attrs.is_empty()
        && element.children.len() == 1
        && !element.preserve_space
    {
        return Some(AttrValue::Extension {
            ns: ty.name().namespace().to_string(),
            local: ty.name().name().to_string(),
            args,
        });
    }
    if ty.is_intrinsic(intrinsic::NULL) && element.is_bare() {
        return Some(AttrValue::Extension {
            ns: XAML_NAMESPACE.to_string(),
            local: intrinsic::NULL.to_string(),
            args: Vec::new(),
        });
    }
    if !ty.is_intrinsic(intrinsic::REFERENCE) {
        return None;
    }
    // The name is either the content text or a `Name` attribute.
    let name = match (element.attrs.as_slice(), element.children.as_slice()) {
        ([], [Child::Text(name)]) => name,
        ([Attr { ns: None, local, value: AttrValue::Text(name) }], []) if local == "Name" => name,
        _ => return None,
    };
    Some(AttrValue::Extension {
        ns: XAML_NAMESPACE.to_string(),
        local: intrinsic::REFERENCE.to_string(),
        args: vec![name.clone()],
    })
}

fn unexpected(node: Option<&MarkupNode>, expected: &str) -> Error {
    match node {
        Some(node) => Error::node_sequence(format!("expected {expected}, found '{node}'")),
        None => Error::node_sequence(format!("expected {expected}, found end of nodes")),
    }
}

struct Cursor<'n> {
    nodes: &'n [MarkupNode],
    index: usize,
}

impl<'n> Cursor<'n> {
    fn new(list: &'n NodeList) -> Self {
        Self {
            nodes: list.nodes(),
            index: 0,
        }
    }

    fn peek(&self) -> Option<&'n MarkupNode> {
        self.nodes.get(self.index)
    }

    fn next(&mut self) -> Option<&'n MarkupNode> {
        let node = self.peek()?;
        self.index += 1;
        Some(node)
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn skip_declarations(&mut self) {
        while matches!(self.peek(), Some(MarkupNode::NamespaceDeclaration { .. })) {
            self.index += 1;
        }
    }
}

// =============================================================================
// Text output
// =============================================================================

struct TextWriter<'a> {
    ctx: &'a SchemaContext,
    indent: Option<&'a str>,
    out: String,
    default_ns: String,
    /// Stable prefix per namespace URI.
    prefixes: FxHashMap<String, String>,
    taken: FxHashSet<String>,
    /// URIs declared on each open element.
    scopes: Vec<Vec<String>>,
    /// Per URI in first-use order, the path of the deepest element
    /// enclosing all of its uses.
    declare_at: Vec<(String, Vec<usize>)>,
    /// Child indices from the root to the element being written.
    path: Vec<usize>,
    generated: usize,
}

impl<'a> TextWriter<'a> {
    fn new(ctx: &'a SchemaContext, config: &'a Config, default_ns: String) -> Self {
        Self {
            ctx,
            indent: config.indent.as_deref(),
            out: String::new(),
            default_ns,
            prefixes: FxHashMap::default(),
            taken: FxHashSet::default(),
            scopes: Vec::new(),
            declare_at: Vec::new(),
            path: Vec::new(),
            generated: 0,
        }
    }

    /// Place each prefix declaration on the element enclosing every use of
    /// its namespace, so siblings share one declaration.
    fn plan_declarations(&mut self, root: &Element) {
        let mut path = Vec::new();
        self.collect_uses(root, &mut path);
    }

    fn collect_uses(&mut self, element: &Element, path: &mut Vec<usize>) {
        if element.ns != self.default_ns {
            self.use_at(&element.ns, path);
        }
        for attr in &element.attrs {
            if let Some(ns) = &attr.ns {
                self.use_at(ns, path);
            }
            match &attr.value {
                AttrValue::Text(_) => {}
                AttrValue::TypeList(args) => {
                    for arg in args {
                        self.collect_type_uses(arg, path);
                    }
                }
                AttrValue::Extension { ns, .. } => {
                    if *ns != self.default_ns {
                        self.use_at(ns, path);
                    }
                }
            }
        }
        for (i, child) in element.children.iter().enumerate() {
            if let Child::Element(el) = child {
                path.push(i);
                self.collect_uses(el, path);
                path.pop();
            }
        }
    }

    fn collect_type_uses(&mut self, name: &TypeName, path: &[usize]) {
        if name.namespace() != self.default_ns {
            self.use_at(name.namespace(), path);
        }
        for arg in name.args() {
            self.collect_type_uses(arg, path);
        }
    }

    fn use_at(&mut self, uri: &str, path: &[usize]) {
        if uri.is_empty() || uri == XML_NAMESPACE {
            return;
        }
        match self.declare_at.iter_mut().find(|(u, _)| u == uri) {
            Some((_, at)) => {
                let common = at.iter().zip(path).take_while(|(a, b)| a == b).count();
                at.truncate(common);
            }
            None => self.declare_at.push((uri.to_string(), path.to_vec())),
        }
    }

    fn element(&mut self, element: &Element, depth: usize) -> Result<()> {
        let mut declared: Vec<String> = self
            .declare_at
            .iter()
            .filter(|(_, at)| *at == self.path)
            .map(|(uri, _)| uri.clone())
            .collect();
        for uri in &declared {
            self.prefix(uri);
        }
        let tag = self.qualified(&element.ns, &element.local, &mut declared)?;

        let mut attrs = Vec::with_capacity(element.attrs.len() + 1);
        for attr in &element.attrs {
            let name = match &attr.ns {
                Some(ns) => self.prefixed(ns, &attr.local, &mut declared)?,
                None => attr.local.clone(),
            };
            let value = self.attr_value(&attr.value, &mut declared)?;
            attrs.push((name, value));
        }
        if element.preserve_space {
            attrs.push(("xml:space".to_string(), "preserve".to_string()));
        }

        self.out.push('<');
        self.out.push_str(&tag);
        if depth == 0 && !self.default_ns.is_empty() {
            self.out.push_str(" xmlns=\"");
            escape_attr(&self.default_ns.clone(), &mut self.out);
            self.out.push('"');
        }
        for uri in &declared {
            let prefix = self.prefixes.get(uri).cloned().unwrap_or_default();
            self.out.push_str(" xmlns:");
            self.out.push_str(&prefix);
            self.out.push_str("=\"");
            escape_attr(uri, &mut self.out);
            self.out.push('"');
        }
        for (name, value) in &attrs {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            escape_attr(value, &mut self.out);
            self.out.push('"');
        }

        if element.children.is_empty() {
            self.out.push_str("/>");
            return Ok(());
        }
        self.out.push('>');
        self.scopes.push(declared);

        let inline = element
            .children
            .iter()
            .any(|c| !matches!(c, Child::Element(_)));
        for (i, child) in element.children.iter().enumerate() {
            if !inline {
                self.newline(depth + 1);
            }
            match child {
                Child::Element(el) => {
                    self.path.push(i);
                    self.element(el, depth + 1)?;
                    self.path.pop();
                }
                Child::Text(text) => escape_text(text, &mut self.out),
                Child::Raw(raw) => self.out.push_str(raw),
                Child::CData(text) => {
                    self.out.push_str("<![CDATA[");
                    self.out.push_str(&escape_cdata(text));
                    self.out.push_str("]]>");
                }
            }
        }
        if !inline {
            self.newline(depth);
        }

        self.scopes.pop();
        self.out.push_str("</");
        self.out.push_str(&tag);
        self.out.push('>');
        Ok(())
    }

    fn newline(&mut self, depth: usize) {
        if let Some(indent) = self.indent {
            self.out.push('\n');
            for _ in 0..depth {
                self.out.push_str(indent);
            }
        }
    }

    fn attr_value(&mut self, value: &AttrValue, declared: &mut Vec<String>) -> Result<String> {
        Ok(match value {
            AttrValue::Text(text) => escape_braces(text).into_owned(),
            AttrValue::TypeList(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.type_reference(arg, declared)?);
                }
                parts.join(", ")
            }
            AttrValue::Extension { ns, local, args } => {
                let name = self.qualified(ns, local, declared)?;
                extension::format(&name, args)
            }
        })
    }

    /// `p:Name` or `p:Name(p:Arg, ...)`.
    fn type_reference(&mut self, name: &TypeName, declared: &mut Vec<String>) -> Result<String> {
        let mut out = self.qualified(name.namespace(), name.name(), declared)?;
        if name.is_generic() {
            let mut parts = Vec::with_capacity(name.args().len());
            for arg in name.args() {
                parts.push(self.type_reference(arg, declared)?);
            }
            out.push('(');
            out.push_str(&parts.join(", "));
            out.push(')');
        }
        Ok(out)
    }

    /// Element or type name; the default namespace needs no prefix.
    fn qualified(&mut self, uri: &str, local: &str, declared: &mut Vec<String>) -> Result<String> {
        if uri == self.default_ns {
            return Ok(local.to_string());
        }
        self.prefixed(uri, local, declared)
    }

    /// Namespaced attributes always carry a prefix.
    fn prefixed(&mut self, uri: &str, local: &str, declared: &mut Vec<String>) -> Result<String> {
        if uri.is_empty() {
            return Err(Error::invalid_schema(format!(
                "'{local}' has no namespace but the document default is '{}'",
                self.default_ns
            )));
        }
        if uri == XML_NAMESPACE {
            return Ok(format!("xml:{local}"));
        }
        let prefix = self.prefix(uri);
        let in_scope = self.scopes.iter().any(|s| s.iter().any(|u| u == uri))
            || declared.iter().any(|u| u == uri);
        if !in_scope {
            declared.push(uri.to_string());
        }
        Ok(format!("{prefix}:{local}"))
    }

    fn prefix(&mut self, uri: &str) -> String {
        if let Some(prefix) = self.prefixes.get(uri) {
            return prefix.clone();
        }
        let prefix = self
            .ctx
            .preferred_prefix(uri)
            .filter(|p| !p.is_empty() && !p.starts_with("xml") && !self.taken.contains(p))
            .unwrap_or_else(|| loop {
                let candidate = format!("ns{}", self.generated);
                self.generated += 1;
                if !self.taken.contains(&candidate) {
                    break candidate;
                }
            });
        log::trace!("prefix {prefix} -> {uri}");
        self.taken.insert(prefix.clone());
        self.prefixes.insert(uri.to_string(), prefix.clone());
        prefix
    }
}
