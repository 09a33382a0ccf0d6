//! Per-object build state.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::node::XamlMember;
use crate::schema::{MemberDescriptor, TypeDescriptor, intrinsic};
use crate::value::{ObjectRef, Value};

/// A value collected for a member, not yet decoded.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    /// Raw text, decoded against the member or item type.
    Text(String),
    /// A completed object, with the `x:Key` it carried.
    Value {
        value: Value,
        key: Option<Box<Slot>>,
    },
}

/// The member currently open on a frame.
#[derive(Debug)]
pub(crate) struct MemberState {
    pub member: XamlMember,
    pub slots: Vec<Slot>,
    pub get_object: bool,
}

impl MemberState {
    pub fn new(member: XamlMember) -> Self {
        Self {
            member,
            slots: Vec::new(),
            get_object: false,
        }
    }
}

/// One open `StartObject` or `GetObject`.
#[derive(Debug)]
pub(crate) struct Frame {
    pub ty: Arc<TypeDescriptor>,
    /// Built instance; set early for eagerly constructed types.
    pub instance: Option<Value>,
    /// `GetObject` frames target the existing member value.
    pub is_get_object: bool,
    /// Member values waiting for construction.
    pub pending: Vec<(Arc<MemberDescriptor>, Value)>,
    pub args: Option<Vec<Slot>>,
    pub positional: Option<Vec<Slot>>,
    pub factory: Option<String>,
    pub init_text: Option<String>,
    pub key: Option<Slot>,
    pub name: Option<String>,
    pub registered: bool,
    /// Members and directives already set, for duplicate detection.
    pub assigned: FxHashSet<String>,
    pub member: Option<MemberState>,
}

impl Frame {
    pub fn new(ty: Arc<TypeDescriptor>) -> Self {
        Self {
            ty,
            instance: None,
            is_get_object: false,
            pending: Vec::new(),
            args: None,
            positional: None,
            factory: None,
            init_text: None,
            key: None,
            name: None,
            registered: false,
            assigned: FxHashSet::default(),
            member: None,
        }
    }

    pub fn get_object(target: ObjectRef) -> Self {
        let mut frame = Self::new(target.descriptor());
        frame.instance = Some(Value::Object(target));
        frame.is_get_object = true;
        frame
    }

    /// Whether the instance can be created before `EndObject`.
    ///
    /// Only types built by their default constructor qualify; everything
    /// else needs information that may still follow.
    pub fn is_eager(&self) -> bool {
        self.instance.is_none()
            && self.factory.is_none()
            && self.args.is_none()
            && self.positional.is_none()
            && self.init_text.is_none()
            && self.ty.bound_constructor().is_none()
            && self.ty.is_default_constructible()
            && !self.ty.is_text_initializable()
            && !self.ty.is_intrinsic(intrinsic::NULL)
    }

    pub fn object(&self) -> Option<&ObjectRef> {
        self.instance.as_ref().and_then(Value::as_object)
    }

    pub fn type_name(&self) -> String {
        self.ty.name().to_string()
    }
}
