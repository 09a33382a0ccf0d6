//! Object graph → node stream.
//!
//! A pre-pass counts how often each instance is reached. Instances reached
//! more than once get an `x:Name` on first emission and are written as
//! `x:Reference` afterwards, which also terminates cycles.

mod reference;

use std::sync::Arc;

pub use reference::ReferenceTable;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::node::{Directive, MarkupNode, NodeList, XamlMember};
use crate::schema::{
    MemberDescriptor, SchemaContext, TypeDescriptor, Visibility, XAML_NAMESPACE, intrinsic,
};
use crate::value::{Content, ObjectRef, Value, ValueCodec, format_primitive};

/// Writes one object graph as a node list.
pub struct ObjectWriter<'a> {
    ctx: &'a SchemaContext,
    codec: ValueCodec<'a>,
    config: &'a Config,
    refs: ReferenceTable,
    nodes: NodeList,
    depth: usize,
}

impl<'a> ObjectWriter<'a> {
    /// Create a writer.
    pub fn new(ctx: &'a SchemaContext, config: &'a Config) -> Self {
        Self {
            ctx,
            codec: ValueCodec::new(ctx),
            config,
            refs: ReferenceTable::new(config.reference_prefix.clone()),
            nodes: NodeList::new(),
            depth: 0,
        }
    }

    /// Write the graph rooted at `root`.
    pub fn write(mut self, root: &Value) -> Result<NodeList> {
        self.scan(root);
        log::debug!("writing graph, {} shared instance(s)", self.refs.shared_count());
        self.write_value(root, None)?;
        Ok(self.nodes)
    }

    // =========================================================================
    // Pre-pass
    // =========================================================================

    fn scan(&mut self, root: &Value) {
        let mut stack = vec![root.clone()];
        while let Some(value) = stack.pop() {
            let Value::Object(object) = value else {
                continue;
            };
            if !self.refs.visit(&object) {
                continue;
            }
            let (_, members, content) = object.snapshot();
            stack.extend(members);
            match content {
                Content::None => {}
                Content::Items(items) => stack.extend(items),
                Content::Entries(entries) => {
                    for (k, v) in entries {
                        stack.push(k);
                        stack.push(v);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Write a value in object position, with an optional dictionary key.
    fn write_value(&mut self, value: &Value, key: Option<(&Value, &TypeDescriptor)>) -> Result<()> {
        match value {
            Value::Object(object) => self.write_object(object, key),
            Value::Null => {
                let null = self.intrinsic(intrinsic::NULL)?;
                self.push(MarkupNode::StartObject(null));
                self.write_key(key)?;
                self.push(MarkupNode::EndObject);
                Ok(())
            }
            primitive => {
                let Some(kind) = primitive.kind() else {
                    return Ok(());
                };
                let ty = self.ctx.resolve_name(&intrinsic::primitive_name(kind))?;
                self.push(MarkupNode::StartObject(ty));
                self.write_key(key)?;
                if let Some(text) = format_primitive(primitive) {
                    self.write_text_member(XamlMember::Directive(Directive::Initialization), text);
                }
                self.push(MarkupNode::EndObject);
                Ok(())
            }
        }
    }

    fn write_object(
        &mut self,
        object: &ObjectRef,
        key: Option<(&Value, &TypeDescriptor)>,
    ) -> Result<()> {
        if let Some(name) = self.refs.name_of(object) {
            let name = name.to_string();
            return self.write_reference(name, key);
        }
        self.nested(|this| this.write_object_body(object, key))
    }

    /// Run `write` one nesting level deeper.
    fn nested(&mut self, write: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(Error::TooDeep {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = write(self);
        self.depth -= 1;
        result
    }

    fn write_object_body(
        &mut self,
        object: &ObjectRef,
        key: Option<(&Value, &TypeDescriptor)>,
    ) -> Result<()> {
        let (ty, members, content) = object.snapshot();
        if ty.visibility() == Visibility::Internal && !self.config.access.allows_internal() {
            return Err(Error::AccessDenied {
                ty: ty.name().to_string(),
                member: None,
            });
        }

        self.push(MarkupNode::StartObject(ty.clone()));
        if self.refs.is_shared(object) {
            let name = self.refs.assign(object);
            self.write_text_member(XamlMember::Directive(Directive::Name), name);
        }
        self.write_key(key)?;

        let whole = Value::Object(object.clone());
        if let Some(converter) = ty.converter()
            && converter.can_convert(&whole)
        {
            let text = converter
                .to_text(&whole)
                .map_err(|e| Error::conversion(whole.describe(), ty.name().to_string(), e))?;
            self.write_text_member(XamlMember::Directive(Directive::Initialization), text);
            self.push(MarkupNode::EndObject);
            return Ok(());
        }

        let content_index = ty.content_property().and_then(|c| ty.member_index(c.name()));
        for (i, (member, value)) in ty.members().iter().zip(&members).enumerate() {
            if Some(i) != content_index {
                self.write_member(&ty, member, value)?;
            }
        }
        if ty.collection_kind().is_collection() {
            self.write_items(&ty, &content)?;
        }
        if let Some(i) = content_index {
            self.write_member(&ty, &ty.members()[i], &members[i])?;
        }

        self.push(MarkupNode::EndObject);
        Ok(())
    }

    fn write_reference(&mut self, name: String, key: Option<(&Value, &TypeDescriptor)>) -> Result<()> {
        let reference = self.intrinsic(intrinsic::REFERENCE)?;
        let name_member = reference.resolve_member("Name")?;
        self.push(MarkupNode::StartObject(reference));
        self.write_key(key)?;
        self.write_text_member(XamlMember::Member(name_member), name);
        self.push(MarkupNode::EndObject);
        Ok(())
    }

    fn write_key(&mut self, key: Option<(&Value, &TypeDescriptor)>) -> Result<()> {
        let Some((key, key_ty)) = key else {
            return Ok(());
        };
        let member = XamlMember::Directive(Directive::Key);
        if let Some(text) = self.codec.try_encode(key, key_ty, None)? {
            self.write_text_member(member, text);
        } else {
            self.push(MarkupNode::StartMember(member));
            self.write_value(key, None)?;
            self.push(MarkupNode::EndMember);
        }
        Ok(())
    }

    fn write_items(&mut self, ty: &TypeDescriptor, content: &Content) -> Result<()> {
        match content {
            Content::None => Ok(()),
            Content::Items(items) if items.is_empty() => Ok(()),
            Content::Entries(entries) if entries.is_empty() => Ok(()),
            Content::Items(items) => {
                self.push(MarkupNode::StartMember(XamlMember::Directive(Directive::Items)));
                for item in items {
                    self.write_value(item, None)?;
                }
                self.push(MarkupNode::EndMember);
                Ok(())
            }
            Content::Entries(entries) => {
                let key_ty = self.ctx.resolve_name(ty.key_type())?;
                self.push(MarkupNode::StartMember(XamlMember::Directive(Directive::Items)));
                for (key, value) in entries {
                    self.write_value(value, Some((key, &key_ty)))?;
                }
                self.push(MarkupNode::EndMember);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn write_member(
        &mut self,
        owner: &TypeDescriptor,
        member: &Arc<MemberDescriptor>,
        value: &Value,
    ) -> Result<()> {
        if member.visibility() == Visibility::Internal && !self.config.access.allows_internal() {
            log::trace!("skip {}.{}: internal", owner.name(), member.name());
            return Ok(());
        }
        if member.is_default(value) {
            log::trace!("skip {}.{}: default", owner.name(), member.name());
            return Ok(());
        }

        let collection = value
            .as_object()
            .filter(|o| o.descriptor().collection_kind().is_collection());
        if member.is_read_only() && member.ctor_arg().is_none() {
            match collection {
                Some(collection) if self.refs.is_shared(collection) => {
                    return Err(Error::SharedReadOnly {
                        ty: owner.name().to_string(),
                        member: member.name().to_string(),
                    });
                }
                Some(collection) => return self.write_get_object(member, collection),
                None => {
                    log::trace!("skip {}.{}: read-only", owner.name(), member.name());
                    return Ok(());
                }
            }
        }

        let shared = value.as_object().is_some_and(|o| self.refs.is_shared(o));
        let declared = self.ctx.resolve_name(member.value_type())?;
        let text = if shared {
            None
        } else {
            self.codec.try_encode(value, &declared, member.converter())?
        };

        match text {
            Some(text) => self.write_text_member(XamlMember::Member(member.clone()), text),
            None => {
                self.push(MarkupNode::StartMember(XamlMember::Member(member.clone())));
                self.write_value(value, None)?;
                self.push(MarkupNode::EndMember);
            }
        }
        Ok(())
    }

    fn write_get_object(&mut self, member: &Arc<MemberDescriptor>, collection: &ObjectRef) -> Result<()> {
        let (ty, _, content) = collection.snapshot();
        self.push(MarkupNode::StartMember(XamlMember::Member(member.clone())));
        self.push(MarkupNode::GetObject);
        self.nested(|this| this.write_items(&ty, &content))?;
        self.push(MarkupNode::EndObject);
        self.push(MarkupNode::EndMember);
        Ok(())
    }

    fn write_text_member(&mut self, member: XamlMember, text: String) {
        self.push(MarkupNode::StartMember(member));
        self.push(MarkupNode::Value(text));
        self.push(MarkupNode::EndMember);
    }

    fn intrinsic(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
        self.ctx.resolve(XAML_NAMESPACE, name)
    }

    fn push(&mut self, node: MarkupNode) {
        self.nodes.push(node);
    }
}
