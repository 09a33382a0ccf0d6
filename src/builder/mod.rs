//! Node stream → object graph.
//!
//! ```text
//! StartObject  push frame (instance created eagerly when the type allows)
//! StartMember  open member, check access and duplicates
//! Value        collect text
//! EndMember    decode and assign, or defer constructor-bound values
//! EndObject    construct (factory / arguments / init text / bound ctor /
//!              default), apply deferred members, hand value to parent
//! ```

mod frame;
mod scope;

use std::sync::Arc;

pub use scope::NameScope;

use frame::{Frame, MemberState, Slot};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::node::{Directive, MarkupNode, NodeList, XamlMember};
use crate::schema::{
    Constructor, MemberDescriptor, SchemaContext, TypeDescriptor, Visibility, intrinsic,
};
use crate::value::{Converter, Value, ValueCodec};

/// Builds one object graph from a node list.
pub struct ObjectBuilder<'a> {
    ctx: &'a SchemaContext,
    codec: ValueCodec<'a>,
    config: &'a Config,
    scope: NameScope,
    frames: Vec<Frame>,
    root: Option<Value>,
}

impl<'a> ObjectBuilder<'a> {
    /// Create a builder.
    pub fn new(ctx: &'a SchemaContext, config: &'a Config) -> Self {
        Self {
            ctx,
            codec: ValueCodec::new(ctx),
            config,
            scope: NameScope::default(),
            frames: Vec::new(),
            root: None,
        }
    }

    /// Build the graph. Errors carry the position of the offending node
    /// when the list came from a parsed document.
    pub fn build(mut self, nodes: &NodeList) -> Result<Value> {
        for (i, node) in nodes.iter().enumerate() {
            if let Err(e) = self.step(node) {
                return Err(match nodes.position(i) {
                    Some(p) => e.located(p.line, p.column),
                    None => e,
                });
            }
        }
        if !self.frames.is_empty() {
            return Err(Error::node_sequence("node list ends inside an object"));
        }
        self.root
            .ok_or_else(|| Error::node_sequence("node list has no root object"))
    }

    fn step(&mut self, node: &MarkupNode) -> Result<()> {
        match node {
            MarkupNode::NamespaceDeclaration { .. } => Ok(()),
            MarkupNode::StartObject(ty) => self.start_object(ty),
            MarkupNode::GetObject => self.get_object(),
            MarkupNode::EndObject => self.end_object(),
            MarkupNode::StartMember(member) => self.start_member(member),
            MarkupNode::EndMember => self.end_member(),
            MarkupNode::Value(text) => self.deliver(Slot::Text(text.clone())),
        }
    }

    // =========================================================================
    // Objects
    // =========================================================================

    fn start_object(&mut self, ty: &Arc<TypeDescriptor>) -> Result<()> {
        match self.frames.last() {
            Some(parent) if parent.member.is_none() => {
                return Err(Error::node_sequence(format!(
                    "object '{}' outside a member of '{}'",
                    ty.name(),
                    parent.ty.name()
                )));
            }
            None if self.root.is_some() => {
                return Err(Error::node_sequence("more than one root object"));
            }
            _ => {}
        }
        if ty.visibility() == Visibility::Internal && !self.config.access.allows_internal() {
            return Err(Error::AccessDenied {
                ty: ty.name().to_string(),
                member: None,
            });
        }
        self.frames.push(Frame::new(ty.clone()));
        Ok(())
    }

    fn get_object(&mut self) -> Result<()> {
        let index = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::node_sequence("GetObject without an enclosing object"))?;
        let member = match self.frames[index].member.as_ref().map(|s| &s.member) {
            Some(XamlMember::Member(m)) => m.clone(),
            _ => return Err(Error::node_sequence("GetObject outside a type member")),
        };
        self.construct(index)?;

        let frame = &mut self.frames[index];
        let read_only = || Error::ReadOnlyMember {
            ty: frame.ty.name().to_string(),
            member: member.name().to_string(),
        };
        let owner = frame.object().cloned().ok_or_else(read_only)?;
        let target = match owner.get(member.name()) {
            Some(Value::Object(existing)) => existing,
            Some(Value::Null) if !member.is_read_only() => {
                let ty = self.ctx.resolve_name(member.value_type())?;
                if !ty.collection_kind().is_collection() {
                    return Err(read_only());
                }
                let fresh = self.ctx.create(&ty)?;
                owner.set(member.name(), fresh.clone())?;
                fresh
            }
            _ => return Err(read_only()),
        };
        if !target.descriptor().collection_kind().accepts_items() {
            return Err(read_only());
        }

        if let Some(state) = frame.member.as_mut() {
            state.get_object = true;
        }
        self.frames.push(Frame::get_object(target));
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::node_sequence("EndObject without StartObject"))?;
        if frame.member.is_some() {
            return Err(Error::node_sequence(format!(
                "object '{}' ends inside a member",
                frame.ty.name()
            )));
        }
        if frame.is_get_object {
            return Ok(());
        }

        let mut frame = frame;
        let value = self.finish(&mut frame)?;
        if self.frames.is_empty() {
            self.root = Some(value);
            return Ok(());
        }
        self.deliver(Slot::Value {
            value,
            key: frame.key.take().map(Box::new),
        })
    }

    /// Produce the value of a completed frame.
    fn finish(&mut self, frame: &mut Frame) -> Result<Value> {
        if frame.ty.is_intrinsic(intrinsic::NULL) {
            return Ok(Value::Null);
        }
        if frame.ty.is_intrinsic(intrinsic::REFERENCE) {
            let name = reference_name(frame)?;
            return self.scope.resolve(&name);
        }
        construct_frame(self.ctx, &self.codec, frame)?;
        register_name(&mut self.scope, frame)?;
        frame.instance.clone().ok_or_else(|| {
            Error::node_sequence(format!("object '{}' was not constructed", frame.ty.name()))
        })
    }

    /// Construct the instance of the frame at `index` if not done yet.
    fn construct(&mut self, index: usize) -> Result<()> {
        let frame = &mut self.frames[index];
        construct_frame(self.ctx, &self.codec, frame)?;
        register_name(&mut self.scope, frame)
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn start_member(&mut self, member: &XamlMember) -> Result<()> {
        let index = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::node_sequence(format!("member '{member}' outside an object")))?;
        let allows_internal = self.config.access.allows_internal();
        let frame = &mut self.frames[index];
        if frame.member.is_some() {
            return Err(Error::node_sequence(format!(
                "member '{member}' opened inside another member of '{}'",
                frame.ty.name()
            )));
        }

        let eager = match member {
            XamlMember::Member(m) => {
                if m.visibility() == Visibility::Internal && !allows_internal {
                    return Err(Error::AccessDenied {
                        ty: frame.type_name(),
                        member: Some(m.name().to_string()),
                    });
                }
                if !frame.assigned.insert(m.name().to_string()) {
                    return Err(Error::duplicate_member(frame.type_name(), m.name()));
                }
                m.ctor_arg().is_none()
            }
            XamlMember::Directive(Directive::Items) => true,
            XamlMember::Directive(d) => {
                if !frame.assigned.insert(member.to_string()) {
                    return Err(Error::duplicate_member(frame.type_name(), format!("x:{}", d.name())));
                }
                false
            }
        };
        if eager && frame.is_eager() {
            self.construct(index)?;
        }
        self.frames[index].member = Some(MemberState::new(member.clone()));
        Ok(())
    }

    fn end_member(&mut self) -> Result<()> {
        let index = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::node_sequence("EndMember outside an object"))?;
        let state = self.frames[index]
            .member
            .take()
            .ok_or_else(|| Error::node_sequence("EndMember without StartMember"))?;
        let frame = &mut self.frames[index];

        match state.member {
            XamlMember::Directive(Directive::Key) => {
                frame.key = Some(single_slot(state.slots, frame, "x:Key")?);
            }
            XamlMember::Directive(Directive::Name) => {
                frame.name = Some(single_text(state.slots, frame, "x:Name")?);
                register_name(&mut self.scope, frame)?;
            }
            XamlMember::Directive(Directive::TypeArguments) => {}
            XamlMember::Directive(Directive::Arguments) => frame.args = Some(state.slots),
            XamlMember::Directive(Directive::PositionalParameters) => {
                frame.positional = Some(state.slots);
            }
            XamlMember::Directive(Directive::FactoryMethod) => {
                frame.factory = Some(single_text(state.slots, frame, "x:FactoryMethod")?);
            }
            XamlMember::Directive(Directive::Initialization) => {
                frame.init_text = Some(single_text(state.slots, frame, "_Initialization")?);
            }
            XamlMember::Directive(Directive::Items) => {
                // Objects were added as they completed; only text remains.
                for slot in state.slots {
                    self.add_item(index, slot)?;
                }
            }
            XamlMember::Member(member) => {
                if !state.get_object {
                    let value = self.member_value(index, &member, state.slots)?;
                    assign(&mut self.frames[index], &member, value)?;
                }
            }
        }
        Ok(())
    }

    /// Hand a value to the open member of the top frame.
    fn deliver(&mut self, slot: Slot) -> Result<()> {
        let index = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::node_sequence("value outside an object"))?;
        let Some(state) = self.frames[index].member.as_mut() else {
            return Err(Error::node_sequence("value outside a member"));
        };
        if state.member.is_directive(Directive::Items) && matches!(slot, Slot::Value { .. }) {
            return self.add_item(index, slot);
        }
        state.slots.push(slot);
        Ok(())
    }

    fn member_value(
        &self,
        index: usize,
        member: &MemberDescriptor,
        mut slots: Vec<Slot>,
    ) -> Result<Value> {
        if slots.len() > 1 {
            return Err(Error::duplicate_member(
                self.frames[index].type_name(),
                member.name(),
            ));
        }
        match slots.pop() {
            None => self.codec.decode("", member),
            Some(Slot::Text(text)) => self.codec.decode(&text, member),
            Some(Slot::Value { value, .. }) => Ok(value),
        }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    fn add_item(&mut self, index: usize, slot: Slot) -> Result<()> {
        self.construct(index)?;
        let frame = &self.frames[index];
        let Some(collection) = frame.object().cloned() else {
            return Err(Error::UnexpectedContent {
                ty: frame.type_name(),
            });
        };
        let ty = collection.descriptor();
        let kind = ty.collection_kind();
        if !kind.is_collection() {
            return Err(Error::UnexpectedContent {
                ty: ty.name().to_string(),
            });
        }
        if !kind.accepts_items() {
            return Err(Error::ReadOnlyMember {
                ty: ty.name().to_string(),
                member: Directive::Items.name().to_string(),
            });
        }

        if kind.is_dictionary() {
            let Slot::Value {
                value,
                key: Some(key),
            } = slot
            else {
                return Err(Error::MissingKey {
                    ty: ty.name().to_string(),
                });
            };
            let key_ty = self.ctx.resolve_name(ty.key_type())?;
            let key = self.decode_slot(*key, &key_ty)?;
            collection.insert(key, value)
        } else {
            let item_ty = self.ctx.resolve_name(ty.item_type())?;
            let item = self.decode_slot(slot, &item_ty)?;
            collection.push(item)
        }
    }

    fn decode_slot(&self, slot: Slot, ty: &Arc<TypeDescriptor>) -> Result<Value> {
        match slot {
            Slot::Text(text) => self.codec.decode_as(&text, ty, None),
            Slot::Value { value, .. } => Ok(value),
        }
    }
}

// =============================================================================
// Frame helpers
// =============================================================================

fn single_slot(mut slots: Vec<Slot>, frame: &Frame, what: &str) -> Result<Slot> {
    match slots.len() {
        1 => Ok(slots.remove(0)),
        0 => Ok(Slot::Text(String::new())),
        _ => Err(Error::duplicate_member(frame.type_name(), what)),
    }
}

fn single_text(slots: Vec<Slot>, frame: &Frame, what: &str) -> Result<String> {
    match single_slot(slots, frame, what)? {
        Slot::Text(text) => Ok(text),
        Slot::Value { value: Value::String(text), .. } => Ok(text),
        Slot::Value { .. } => Err(Error::node_sequence(format!(
            "{what} of '{}' must be text",
            frame.ty.name()
        ))),
    }
}

/// Name of an `x:Reference`: its `Name` member, positional argument or text.
fn reference_name(frame: &mut Frame) -> Result<String> {
    if let Some((_, value)) = frame.pending.iter().find(|(m, _)| m.name() == "Name")
        && let Some(name) = value.as_str()
    {
        return Ok(name.to_string());
    }
    let slot = frame
        .positional
        .take()
        .or_else(|| frame.args.take())
        .and_then(|mut slots| (!slots.is_empty()).then(|| slots.remove(0)));
    match slot {
        Some(Slot::Text(name)) => Ok(name),
        Some(Slot::Value { value: Value::String(name), .. }) => Ok(name),
        _ => match frame.init_text.take() {
            Some(name) => Ok(name),
            None => Err(Error::MissingConstructorArgument {
                ty: frame.type_name(),
                member: "Name".to_string(),
            }),
        },
    }
}

fn register_name(scope: &mut NameScope, frame: &mut Frame) -> Result<()> {
    if frame.registered {
        return Ok(());
    }
    if let (Some(name), Some(instance)) = (&frame.name, &frame.instance) {
        scope.register(name.clone(), instance.clone(), &frame.type_name())?;
        frame.registered = true;
    }
    Ok(())
}

/// Assign a decoded member value, deferring it while the instance does not exist.
fn assign(frame: &mut Frame, member: &Arc<MemberDescriptor>, value: Value) -> Result<()> {
    if frame.instance.is_none() {
        frame.pending.push((member.clone(), value));
        return Ok(());
    }
    set_member(frame, member, value)
}

fn set_member(frame: &Frame, member: &MemberDescriptor, value: Value) -> Result<()> {
    if member.is_read_only() {
        return Err(Error::ReadOnlyMember {
            ty: frame.type_name(),
            member: member.name().to_string(),
        });
    }
    let Some(object) = frame.object() else {
        return Err(Error::unknown_member(frame.type_name(), member.name()));
    };
    object.set(member.name(), value)
}

/// Create the frame's instance from whatever was collected.
fn construct_frame(ctx: &SchemaContext, codec: &ValueCodec<'_>, frame: &mut Frame) -> Result<()> {
    if frame.instance.is_some() {
        return Ok(());
    }
    let ty = frame.ty.clone();

    let instance = if let Some(factory_name) = frame.factory.take() {
        let args = frame.args.take().unwrap_or_default();
        let factory = ty.factory(&factory_name, args.len()).ok_or_else(|| {
            Error::unknown_member(
                ty.name().to_string(),
                format!("x:FactoryMethod '{factory_name}' with {} argument(s)", args.len()),
            )
        })?;
        let mut decoded = Vec::with_capacity(args.len());
        for (slot, param) in args.into_iter().zip(factory.params()) {
            let param_ty = ctx.resolve_name(param)?;
            decoded.push(decode(codec, slot, &param_ty, None)?);
        }
        factory
            .invoke(ctx, &decoded)
            .map_err(|e| Error::conversion(factory_name, ty.name().to_string(), e))?
    } else if let Some(args) = frame.args.take().or_else(|| frame.positional.take()) {
        let ctor = ty.constructor_with_arity(args.len()).ok_or_else(|| {
            Error::MissingConstructorArgument {
                ty: ty.name().to_string(),
                member: format!("(constructor with {} argument(s))", args.len()),
            }
        })?;
        let object = ctx.create(&ty)?;
        for (slot, param) in args.into_iter().zip(ctor.params()) {
            let member = ty.resolve_member(param)?;
            let member_ty = ctx.resolve_name(member.value_type())?;
            let value = decode(codec, slot, &member_ty, member.converter())?;
            object.set(param, value)?;
        }
        Value::Object(object)
    } else if let Some(text) = frame.init_text.take() {
        codec.decode_as(&text, &ty, None)?
    } else if let Some(ctor) = ty
        .bound_constructor()
        .or_else(|| supplied_constructor(&ty, &frame.pending))
    {
        let object = ctx.create(&ty)?;
        for param in ctor.params() {
            let value = match frame.pending.iter().position(|(m, _)| m.name() == param) {
                Some(i) => frame.pending.remove(i).1,
                None => {
                    let member = ty.resolve_member(param)?;
                    match member.default_value() {
                        Some(default) => default.deep_clone(),
                        None => {
                            return Err(Error::MissingConstructorArgument {
                                ty: ty.name().to_string(),
                                member: param.clone(),
                            });
                        }
                    }
                }
            };
            object.set(param, value)?;
        }
        Value::Object(object)
    } else if ty.is_default_constructible() {
        ctx.create_value(&ty)?
    } else {
        let member = ty
            .constructors()
            .first()
            .and_then(|c| {
                c.params()
                    .iter()
                    .find(|p| !frame.pending.iter().any(|(m, _)| m.name() == p.as_str()))
            })
            .cloned()
            .unwrap_or_else(|| "(constructor)".to_string());
        return Err(Error::MissingConstructorArgument {
            ty: ty.name().to_string(),
            member,
        });
    };

    frame.instance = Some(instance);
    for (member, value) in std::mem::take(&mut frame.pending) {
        set_member(frame, &member, value)?;
    }
    Ok(())
}

/// For types without a default constructor: the first constructor whose
/// parameters were all given as members.
fn supplied_constructor<'t>(
    ty: &'t TypeDescriptor,
    pending: &[(Arc<MemberDescriptor>, Value)],
) -> Option<&'t Constructor> {
    if ty.is_default_constructible() {
        return None;
    }
    ty.constructors().iter().find(|ctor| {
        ctor.params()
            .iter()
            .all(|p| pending.iter().any(|(m, _)| m.name() == p))
    })
}

fn decode(
    codec: &ValueCodec<'_>,
    slot: Slot,
    ty: &Arc<TypeDescriptor>,
    converter: Option<&Converter>,
) -> Result<Value> {
    match slot {
        Slot::Text(text) => codec.decode_as(&text, ty, converter),
        Slot::Value { value, .. } => Ok(value),
    }
}
