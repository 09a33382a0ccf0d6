//! Markup text → node stream.

use std::sync::Arc;

use roxmltree::{Document, Node};

use crate::config;
use crate::error::{Error, Result};
use crate::node::{Directive, MarkupNode, NodeList, Position, XamlMember};
use crate::schema::{
    MemberDescriptor, RawCapture, SchemaContext, TypeDescriptor, TypeName, XAML_NAMESPACE,
    XML_NAMESPACE, intrinsic,
};

use super::extension::{self, ExtArg, Extension};

/// Reads one markup document into nodes.
pub struct MarkupParser<'a> {
    ctx: &'a SchemaContext,
    source: &'a str,
    max_depth: usize,
    nodes: NodeList,
}

impl<'a> MarkupParser<'a> {
    /// Create a parser over `source` with the process default nesting limit.
    pub fn new(ctx: &'a SchemaContext, source: &'a str) -> Self {
        Self {
            ctx,
            source,
            max_depth: config::get().max_depth,
            nodes: NodeList::new(),
        }
    }

    /// Limit object nesting, see [`Config::max_depth`](crate::config::Config::max_depth).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole document.
    pub fn parse(mut self) -> Result<NodeList> {
        check_nesting(self.source, self.max_depth)?;
        let doc = Document::parse(self.source).map_err(|e| {
            let pos = e.pos();
            Error::MalformedMarkup {
                line: pos.row,
                column: pos.col,
                message: e.to_string(),
            }
        })?;
        self.object_element(doc.root_element())?;
        log::trace!("parsed {} nodes", self.nodes.len());
        Ok(self.nodes)
    }

    // =========================================================================
    // Object elements
    // =========================================================================

    fn object_element(&mut self, node: Node<'_, '_>) -> Result<()> {
        let pos = position(node);
        let at = |e: Error| e.located(pos.line, pos.column);
        let ty = self.element_type(node).map_err(at)?;
        let preserve = preserves_space(node);

        self.namespace_declarations(node, pos);
        self.nodes.push_at(MarkupNode::StartObject(ty.clone()), pos);

        // Directives first, so the builder sees them before any member.
        for attr in node.attributes() {
            if attr.namespace() != Some(XAML_NAMESPACE) {
                continue;
            }
            match Directive::from_markup(attr.name()) {
                Some(Directive::TypeArguments) => {}
                Some(directive) => self
                    .attribute_member(node, XamlMember::Directive(directive), attr.value(), pos)
                    .map_err(at)?,
                None => {
                    return Err(at(Error::unknown_member(
                        ty.name().to_string(),
                        format!("x:{}", attr.name()),
                    )));
                }
            }
        }

        for args in node.children().filter(|c| is_xaml_element(*c, "Arguments")) {
            self.nodes
                .push_at(MarkupNode::StartMember(XamlMember::Directive(Directive::Arguments)), pos);
            let children = significant_children(args, preserve);
            self.values(&children, preserve)?;
            self.nodes.push_at(MarkupNode::EndMember, pos);
        }

        for attr in node.attributes() {
            if matches!(attr.namespace(), Some(XAML_NAMESPACE | XML_NAMESPACE)) {
                continue;
            }
            let Some(member) = lookup_member(&ty, attr.name()).map_err(at)? else {
                continue;
            };
            self.attribute_member(node, XamlMember::Member(member), attr.value(), pos)
                .map_err(at)?;
        }

        let mut content = Vec::new();
        for child in significant_children(node, preserve) {
            if !child.is_element() {
                content.push(child);
                continue;
            }
            let name = child.tag_name();
            if name.namespace() == Some(XAML_NAMESPACE)
                && let Some(directive) = Directive::from_markup(name.name())
            {
                match directive {
                    Directive::Arguments | Directive::TypeArguments => {}
                    _ => self.directive_element(child, directive, preserve)?,
                }
            } else if name.name().contains('.') {
                self.property_element(&ty, child, preserve)?;
            } else {
                content.push(child);
            }
        }
        if !content.is_empty() {
            self.content(&ty, node, &content, preserve, pos)?;
        }

        self.nodes.push_at(MarkupNode::EndObject, pos);
        Ok(())
    }

    fn element_type(&self, node: Node<'_, '_>) -> Result<Arc<TypeDescriptor>> {
        let name = node.tag_name();
        let namespace = name.namespace().unwrap_or_default();
        match node.attribute((XAML_NAMESPACE, "TypeArguments")) {
            Some(text) => {
                if nesting(text, '(', ')') > self.max_depth {
                    return Err(Error::TooDeep {
                        limit: self.max_depth,
                    });
                }
                let args = parse_type_list(node, text)?;
                self.ctx.resolve_generic(namespace, name.name(), &args)
            }
            None => self.ctx.resolve(namespace, name.name()),
        }
    }

    fn namespace_declarations(&mut self, node: Node<'_, '_>, pos: Position) {
        let parent = node.parent_element();
        for ns in node.namespaces() {
            if ns.uri() == XML_NAMESPACE {
                continue;
            }
            let inherited = parent.is_some_and(|p| {
                p.namespaces()
                    .any(|pn| pn.name() == ns.name() && pn.uri() == ns.uri())
            });
            if !inherited {
                self.nodes.push_at(
                    MarkupNode::NamespaceDeclaration {
                        prefix: ns.name().unwrap_or_default().to_string(),
                        uri: ns.uri().to_string(),
                    },
                    pos,
                );
            }
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn attribute_member(
        &mut self,
        node: Node<'_, '_>,
        member: XamlMember,
        text: &str,
        pos: Position,
    ) -> Result<()> {
        self.nodes.push_at(MarkupNode::StartMember(member), pos);
        if let Some(literal) = text.strip_prefix("{}") {
            self.nodes.push_at(MarkupNode::Value(literal.to_string()), pos);
        } else if text.starts_with('{') {
            let ext = extension::parse(text, self.max_depth).map_err(|message| Error::MalformedMarkup {
                line: pos.line,
                column: pos.column,
                message,
            })?;
            self.extension(node, &ext, pos)?;
        } else {
            self.nodes.push_at(MarkupNode::Value(text.to_string()), pos);
        }
        self.nodes.push_at(MarkupNode::EndMember, pos);
        Ok(())
    }

    fn extension(&mut self, node: Node<'_, '_>, ext: &Extension, pos: Position) -> Result<()> {
        let (prefix, local) = ext.split_name();
        let namespace = lookup_prefix(node, prefix)?;
        let ty = match self.ctx.resolve(namespace, local) {
            Ok(ty) => ty,
            Err(e) => self
                .ctx
                .resolve(namespace, &format!("{local}Extension"))
                .map_err(|_| e)?,
        };
        self.nodes.push_at(MarkupNode::StartObject(ty.clone()), pos);
        if !ext.positional.is_empty() {
            self.nodes.push_at(
                MarkupNode::StartMember(XamlMember::Directive(Directive::PositionalParameters)),
                pos,
            );
            for arg in &ext.positional {
                self.extension_arg(node, arg, pos)?;
            }
            self.nodes.push_at(MarkupNode::EndMember, pos);
        }
        for (name, arg) in &ext.named {
            let Some(member) = lookup_member(&ty, name)? else {
                continue;
            };
            self.nodes
                .push_at(MarkupNode::StartMember(XamlMember::Member(member)), pos);
            self.extension_arg(node, arg, pos)?;
            self.nodes.push_at(MarkupNode::EndMember, pos);
        }
        self.nodes.push_at(MarkupNode::EndObject, pos);
        Ok(())
    }

    fn extension_arg(&mut self, node: Node<'_, '_>, arg: &ExtArg, pos: Position) -> Result<()> {
        match arg {
            ExtArg::Text(text) => {
                self.nodes.push_at(MarkupNode::Value(text.clone()), pos);
                Ok(())
            }
            ExtArg::Extension(ext) => self.extension(node, ext, pos),
        }
    }

    fn directive_element(
        &mut self,
        node: Node<'_, '_>,
        directive: Directive,
        preserve: bool,
    ) -> Result<()> {
        let pos = position(node);
        self.nodes
            .push_at(MarkupNode::StartMember(XamlMember::Directive(directive)), pos);
        let children = significant_children(node, preserve);
        self.values(&children, preserve)?;
        self.nodes.push_at(MarkupNode::EndMember, pos);
        Ok(())
    }

    fn property_element(
        &mut self,
        ty: &Arc<TypeDescriptor>,
        node: Node<'_, '_>,
        preserve: bool,
    ) -> Result<()> {
        let pos = position(node);
        let at = |e: Error| e.located(pos.line, pos.column);
        let Some(member) = lookup_member(ty, node.tag_name().name()).map_err(at)? else {
            return Ok(());
        };

        self.nodes
            .push_at(MarkupNode::StartMember(XamlMember::Member(member.clone())), pos);
        if let Some(mode) = member.raw_capture() {
            let raw = self.raw_text(node, mode);
            self.nodes.push_at(MarkupNode::Value(raw), pos);
        } else {
            let children = significant_children(node, preserve);
            self.member_values(&member, &children, preserve, pos)?;
        }
        self.nodes.push_at(MarkupNode::EndMember, pos);
        Ok(())
    }

    /// Values of a type member: the whole value, or the items of the
    /// collection it already holds.
    fn member_values(
        &mut self,
        member: &MemberDescriptor,
        children: &[Node<'_, '_>],
        preserve: bool,
        pos: Position,
    ) -> Result<()> {
        let member_ty = self
            .ctx
            .resolve_name(member.value_type())
            .map_err(|e| e.located(pos.line, pos.column))?;
        if self.assigns_whole_value(member, &member_ty, children)? {
            return self.values(children, preserve);
        }
        self.nodes.push_at(MarkupNode::GetObject, pos);
        self.nodes.push_at(
            MarkupNode::StartMember(XamlMember::Directive(Directive::Items)),
            pos,
        );
        self.values(children, preserve)?;
        self.nodes.push_at(MarkupNode::EndMember, pos);
        self.nodes.push_at(MarkupNode::EndObject, pos);
        Ok(())
    }

    fn assigns_whole_value(
        &self,
        member: &MemberDescriptor,
        member_ty: &TypeDescriptor,
        children: &[Node<'_, '_>],
    ) -> Result<bool> {
        if !member_ty.collection_kind().is_collection() {
            return Ok(true);
        }
        if member.is_read_only() && member.ctor_arg().is_none() {
            return Ok(false);
        }
        let [only] = children else {
            return Ok(false);
        };
        if !only.is_element() {
            return Ok(false);
        }
        let ty = self
            .element_type(*only)
            .map_err(|e| e.located(position(*only).line, position(*only).column))?;
        Ok(ty.is_intrinsic(intrinsic::NULL)
            || ty.is_intrinsic(intrinsic::REFERENCE)
            || ty.is_assignable_to(member_ty.name()))
    }

    fn content(
        &mut self,
        ty: &Arc<TypeDescriptor>,
        node: Node<'_, '_>,
        content: &[Node<'_, '_>],
        preserve: bool,
        pos: Position,
    ) -> Result<()> {
        if ty.collection_kind().is_collection() {
            self.nodes.push_at(
                MarkupNode::StartMember(XamlMember::Directive(Directive::Items)),
                pos,
            );
            self.values(content, preserve)?;
            self.nodes.push_at(MarkupNode::EndMember, pos);
            return Ok(());
        }

        if let Some(member) = ty.content_property() {
            self.nodes
                .push_at(MarkupNode::StartMember(XamlMember::Member(member.clone())), pos);
            if let Some(mode) = member.raw_capture() {
                let raw = self.raw_text(node, mode);
                self.nodes.push_at(MarkupNode::Value(raw), pos);
            } else {
                self.member_values(member, content, preserve, pos)?;
            }
            self.nodes.push_at(MarkupNode::EndMember, pos);
            return Ok(());
        }

        if ty.is_text_initializable() && content.iter().all(|c| c.is_text()) {
            let joined: String = content.iter().filter_map(|c| c.text()).collect();
            let text = if preserve { joined } else { joined.trim().to_string() };
            self.nodes.push_at(
                MarkupNode::StartMember(XamlMember::Directive(Directive::Initialization)),
                pos,
            );
            self.nodes.push_at(MarkupNode::Value(text), pos);
            self.nodes.push_at(MarkupNode::EndMember, pos);
            return Ok(());
        }

        Err(Error::UnexpectedContent {
            ty: ty.name().to_string(),
        }
        .located(pos.line, pos.column))
    }

    fn values(&mut self, children: &[Node<'_, '_>], preserve: bool) -> Result<()> {
        for child in children {
            if child.is_element() {
                self.object_element(*child)?;
            } else if let Some(text) = child.text() {
                let text = if preserve { text } else { text.trim() };
                self.nodes
                    .push_at(MarkupNode::Value(text.to_string()), position(*child));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Raw capture
    // =========================================================================

    fn raw_text(&self, node: Node<'_, '_>, mode: RawCapture) -> String {
        match mode {
            RawCapture::Text => node
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect(),
            RawCapture::Xml => {
                let elements: Vec<_> = node.children().filter(|c| c.is_element()).collect();
                let only_text_around = node
                    .children()
                    .filter(|c| c.is_text())
                    .all(|c| c.text().is_none_or(|t| t.trim().is_empty()));
                let target = match elements.as_slice() {
                    [xdata] if only_text_around && is_xaml_element(*xdata, "XData") => *xdata,
                    _ => node,
                };
                self.inner_markup(target).to_string()
            }
        }
    }

    /// Source text between the start and end tags of `node`.
    fn inner_markup(&self, node: Node<'_, '_>) -> &'a str {
        let range = node.range();
        let outer = &self.source[range.clone()];
        if outer.ends_with("/>") {
            return "";
        }
        let Some(open_end) = start_tag_end(outer) else {
            return "";
        };
        let close_start = outer.rfind("</").unwrap_or(outer.len());
        if close_start <= open_end {
            return "";
        }
        &self.source[range.start + open_end + 1..range.start + close_start]
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn position(node: Node<'_, '_>) -> Position {
    let pos = node.document().text_pos_at(node.range().start);
    Position {
        line: pos.row,
        column: pos.col,
    }
}

fn is_xaml_element(node: Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XAML_NAMESPACE)
        && node.tag_name().name() == local
}

/// `xml:space` of the nearest element declaring it.
fn preserves_space(node: Node<'_, '_>) -> bool {
    node.ancestors()
        .find_map(|n| n.attribute((XML_NAMESPACE, "space")))
        .is_some_and(|v| v == "preserve")
}

/// Element and text children, minus comments and ignorable whitespace.
fn significant_children<'a, 'i>(node: Node<'a, 'i>, preserve: bool) -> Vec<Node<'a, 'i>> {
    node.children()
        .filter(|c| {
            if c.is_element() {
                return true;
            }
            if c.is_text() {
                return c.text().is_some_and(|t| preserve || !t.trim().is_empty());
            }
            if c.is_pi() {
                log::warn!("ignoring processing instruction in '{}'", node.tag_name().name());
            }
            false
        })
        .collect()
}

/// `Member` or `Owner.Member`; `None` when the type skips unknown members.
fn lookup_member(ty: &TypeDescriptor, name: &str) -> Result<Option<Arc<MemberDescriptor>>> {
    let found = match name.split_once('.') {
        Some((owner, member)) => ty.resolve_qualified_member(owner, member),
        None => ty.resolve_member(name),
    };
    match found {
        Ok(member) => Ok(Some(member)),
        Err(_) if ty.tolerates_unknown_members() => {
            log::debug!("skipping unknown member '{name}' of '{}'", ty.name());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn lookup_prefix<'a>(node: Node<'a, '_>, prefix: Option<&str>) -> Result<&'a str> {
    match node.lookup_namespace_uri(prefix) {
        Some(uri) => Ok(uri),
        None if prefix.is_none() => Ok(""),
        None => {
            let pos = position(node);
            Err(Error::MalformedMarkup {
                line: pos.line,
                column: pos.column,
                message: format!("unknown namespace prefix '{}'", prefix.unwrap_or_default()),
            })
        }
    }
}

/// Parse `x:Int32, p:Map(x:String, x:Int32)`.
fn parse_type_list(node: Node<'_, '_>, text: &str) -> Result<Vec<TypeName>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(parse_type_ref(node, &text[start..i])?);
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(parse_type_ref(node, &text[start..])?);
    Ok(args)
}

fn parse_type_ref(node: Node<'_, '_>, text: &str) -> Result<TypeName> {
    let text = text.trim();
    let malformed = |message: String| {
        let pos = position(node);
        Error::MalformedMarkup {
            line: pos.line,
            column: pos.column,
            message,
        }
    };
    let (head, args) = match text.find('(') {
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| malformed(format!("unbalanced type argument list '{text}'")))?;
            (&text[..open], parse_type_list(node, inner)?)
        }
        None => (text, Vec::new()),
    };
    if head.is_empty() {
        return Err(malformed(format!("empty type name in '{text}'")));
    }
    let (prefix, local) = match head.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, head),
    };
    let namespace = lookup_prefix(node, prefix)?;
    Ok(TypeName::generic(namespace, local, args))
}

/// Byte offset of the `>` closing the start tag, skipping quoted values.
fn start_tag_end(outer: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in outer.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Deepest `open`/`close` nesting in `text`.
fn nesting(text: &str, open: char, close: char) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for c in text.chars() {
        if c == open {
            depth += 1;
            deepest = deepest.max(depth);
        } else if c == close {
            depth = depth.saturating_sub(1);
        }
    }
    deepest
}

/// Reject documents whose elements nest deeper than `max_depth` objects
/// allow, before roxmltree and the element walk recurse into them.
fn check_nesting(source: &str, max_depth: usize) -> Result<()> {
    let limit = max_depth.saturating_mul(2).saturating_add(1);
    let skip_past = |rest: &str, end: &str| rest.find(end).map_or(rest.len(), |i| i + end.len());
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(offset) = source[i..].find('<') {
        i += offset;
        let rest = &source[i..];
        if rest.starts_with("<!--") {
            i += skip_past(rest, "-->");
        } else if rest.starts_with("<![CDATA[") {
            i += skip_past(rest, "]]>");
        } else if rest.starts_with("<?") {
            i += skip_past(rest, "?>");
        } else if rest.starts_with("<!") {
            i += skip_past(rest, ">");
        } else if rest.starts_with("</") {
            depth = depth.saturating_sub(1);
            i += skip_past(rest, ">");
        } else {
            let Some(end) = start_tag_end(rest) else {
                // Unterminated tag; roxmltree reports it.
                return Ok(());
            };
            if !rest[..end].ends_with('/') {
                depth += 1;
                if depth > limit {
                    let before = &source[..i];
                    let line = before.matches('\n').count() + 1;
                    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
                    return Err(Error::TooDeep { limit: max_depth }.located(line as u32, column as u32));
                }
            }
            i += end + 1;
        }
    }
    Ok(())
}
