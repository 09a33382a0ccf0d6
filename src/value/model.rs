//! Dynamic object model: values, shared object handles and their state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::{FxHashMap, FxHashSet};

use super::primitive::{PrimitiveKind, format_primitive};
use crate::error::{Error, Result};
use crate::schema::{CollectionKind, KeyComparison, TypeDescriptor};

// =============================================================================
// Value
// =============================================================================

/// A value in an object graph.
///
/// Equality is structural: objects compare by type, member values and content,
/// floats compare bit-exact (any two NaNs are equal), and cycles are guarded.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null reference.
    Null,
    /// Boolean.
    Bool(bool),
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 32-bit float.
    Single(f32),
    /// 64-bit float.
    Double(f64),
    /// Single character.
    Char(char),
    /// String.
    String(String),
    /// Date and time with offset.
    DateTime(DateTime<FixedOffset>),
    /// Shared object instance.
    Object(ObjectRef),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Primitive kind of this value, `None` for null and objects.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::Bool(_) => PrimitiveKind::Boolean,
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::Int16(_) => PrimitiveKind::Int16,
            Self::Int32(_) => PrimitiveKind::Int32,
            Self::Int64(_) => PrimitiveKind::Int64,
            Self::Single(_) => PrimitiveKind::Single,
            Self::Double(_) => PrimitiveKind::Double,
            Self::Char(_) => PrimitiveKind::Char,
            Self::String(_) => PrimitiveKind::String,
            Self::DateTime(_) => PrimitiveKind::DateTime,
            Self::Null | Self::Object(_) => return None,
        })
    }

    /// Check for null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the object handle.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow the string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get an `i32`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// Get an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Get a `bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Copy the value, giving every reachable object a fresh instance.
    ///
    /// Sharing inside the copied graph is kept.
    pub fn deep_clone(&self) -> Value {
        let mut copies = FxHashMap::default();
        deep_clone_with(self, &mut copies)
    }

    /// Short text for messages: primitive text or the object's type.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Null => "{x:Null}".to_string(),
            Self::Object(o) => format!("instance of {}", o.descriptor().name()),
            other => format_primitive(other).unwrap_or_default(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut seen = FxHashSet::default();
        eq_with(self, other, &mut seen)
    }
}

fn eq_with(a: &Value, b: &Value, seen: &mut FxHashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Byte(x), Value::Byte(y)) => x == y,
        (Value::Int16(x), Value::Int16(y)) => x == y,
        (Value::Int32(x), Value::Int32(y)) => x == y,
        (Value::Int64(x), Value::Int64(y)) => x == y,
        (Value::Single(x), Value::Single(y)) => {
            x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
        }
        (Value::Double(x), Value::Double(y)) => {
            x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
        }
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::DateTime(x), Value::DateTime(y)) => x == y && x.offset() == y.offset(),
        (Value::Object(x), Value::Object(y)) => objects_eq(x, y, seen),
        _ => false,
    }
}

fn objects_eq(a: &ObjectRef, b: &ObjectRef, seen: &mut FxHashSet<(usize, usize)>) -> bool {
    // A pair already under comparison is assumed equal; any difference is
    // reported by the outer comparison.
    if ObjectRef::ptr_eq(a, b) || !seen.insert((a.id(), b.id())) {
        return true;
    }
    let (ta, ma, ca) = a.snapshot();
    let (tb, mb, cb) = b.snapshot();
    if ta.name() != tb.name() || ma.len() != mb.len() {
        return false;
    }
    if !ma.iter().zip(&mb).all(|(x, y)| eq_with(x, y, seen)) {
        return false;
    }
    match (&ca, &cb) {
        (Content::None, Content::None) => true,
        (Content::Items(x), Content::Items(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| eq_with(p, q, seen))
        }
        (Content::Entries(x), Content::Entries(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y)
                    .all(|((k1, v1), (k2, v2))| eq_with(k1, k2, seen) && eq_with(v1, v2, seen))
        }
        _ => false,
    }
}

fn deep_clone_with(value: &Value, copies: &mut FxHashMap<usize, ObjectRef>) -> Value {
    let Value::Object(src) = value else {
        return value.clone();
    };
    if let Some(copy) = copies.get(&src.id()) {
        return Value::Object(copy.clone());
    }
    let (ty, members, content) = src.snapshot();
    let copy = ObjectRef::new(Object {
        ty,
        members: Vec::new(),
        content: Content::None,
    });
    copies.insert(src.id(), copy.clone());

    let members = members.iter().map(|v| deep_clone_with(v, copies)).collect();
    let content = match content {
        Content::None => Content::None,
        Content::Items(items) => {
            Content::Items(items.iter().map(|v| deep_clone_with(v, copies)).collect())
        }
        Content::Entries(entries) => Content::Entries(
            entries
                .iter()
                .map(|(k, v)| (deep_clone_with(k, copies), deep_clone_with(v, copies)))
                .collect(),
        ),
    };
    {
        let mut guard = copy.write();
        guard.members = members;
        guard.content = content;
    }
    Value::Object(copy)
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u8 => Byte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Single,
    f64 => Double,
    char => Char,
    String => String,
    DateTime<FixedOffset> => DateTime,
    ObjectRef => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// Object
// =============================================================================

/// Collection state of an object.
#[derive(Clone, Debug, Default)]
pub enum Content {
    /// Not a collection.
    #[default]
    None,
    /// Ordered items of a list, collection or enumerable.
    Items(Vec<Value>),
    /// Ordered entries of a dictionary.
    Entries(Vec<(Value, Value)>),
}

/// State of one object instance.
///
/// Member values are stored in the descriptor's flattened member order.
#[derive(Debug)]
pub struct Object {
    ty: Arc<TypeDescriptor>,
    members: Vec<Value>,
    content: Content,
}

impl Object {
    /// Create an instance with every member at its declared default.
    pub fn new(ty: Arc<TypeDescriptor>) -> Self {
        let members = ty
            .members()
            .iter()
            .map(|m| m.default_value().map_or(Value::Null, Value::deep_clone))
            .collect();
        let content = match ty.collection_kind() {
            CollectionKind::None => Content::None,
            CollectionKind::Dictionary => Content::Entries(Vec::new()),
            _ => Content::Items(Vec::new()),
        };
        Self {
            ty,
            members,
            content,
        }
    }

    /// Descriptor of the object's runtime type.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    /// Member values in flattened declaration order.
    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Value of a member by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.ty.member_index(name).map(|i| &self.members[i])
    }

    /// Set a member by position in the flattened member list.
    pub fn set_member_at(&mut self, index: usize, value: Value) {
        self.members[index] = value;
    }

    /// Collection state.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Items of a non-dictionary collection; empty otherwise.
    pub fn items(&self) -> &[Value] {
        match &self.content {
            Content::Items(items) => items,
            _ => &[],
        }
    }

    /// Entries of a dictionary; empty otherwise.
    pub fn entries(&self) -> &[(Value, Value)] {
        match &self.content {
            Content::Entries(entries) => entries,
            _ => &[],
        }
    }

    /// Whether this is a collection with no items.
    pub fn is_empty_collection(&self) -> bool {
        match &self.content {
            Content::None => false,
            Content::Items(items) => items.is_empty(),
            Content::Entries(entries) => entries.is_empty(),
        }
    }

    /// Append an item.
    pub fn push_item(&mut self, value: Value) -> Result<()> {
        match &mut self.content {
            Content::Items(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(Error::UnexpectedContent {
                ty: self.ty.name().to_string(),
            }),
        }
    }

    /// Add a dictionary entry; a key already present under the dictionary's
    /// comparison is a duplicate.
    pub fn insert_entry(&mut self, key: Value, value: Value) -> Result<()> {
        let comparison = self.ty.key_comparison();
        let Content::Entries(entries) = &mut self.content else {
            return Err(Error::UnexpectedContent {
                ty: self.ty.name().to_string(),
            });
        };
        if entries.iter().any(|(k, _)| keys_match(k, &key, comparison)) {
            return Err(Error::duplicate_key(self.ty.name().to_string(), key.describe()));
        }
        entries.push((key, value));
        Ok(())
    }

    /// Look up a dictionary entry under the dictionary's comparison.
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        let comparison = self.ty.key_comparison();
        self.entries()
            .iter()
            .find(|(k, _)| keys_match(k, key, comparison))
            .map(|(_, v)| v)
    }
}

fn keys_match(a: &Value, b: &Value, comparison: KeyComparison) -> bool {
    match (comparison, a, b) {
        (KeyComparison::IgnoreCase, Value::String(x), Value::String(y)) => {
            x.to_lowercase() == y.to_lowercase()
        }
        _ => a == b,
    }
}

// =============================================================================
// ObjectRef
// =============================================================================

/// Shared handle to an object; pointer identity is object identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Wrap an object.
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Whether both handles point to the same instance.
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Identity key, stable while the object is alive.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    /// Descriptor of the runtime type.
    pub fn descriptor(&self) -> Arc<TypeDescriptor> {
        self.read().ty.clone()
    }

    /// Copy out the type, member values and content without holding the lock.
    pub(crate) fn snapshot(&self) -> (Arc<TypeDescriptor>, Vec<Value>, Content) {
        let guard = self.read();
        (guard.ty.clone(), guard.members.clone(), guard.content.clone())
    }

    /// Get a member value by name.
    pub fn get(&self, member: &str) -> Option<Value> {
        self.read().member(member).cloned()
    }

    /// Set a member value by name.
    pub fn set(&self, member: &str, value: impl Into<Value>) -> Result<()> {
        let mut guard = self.write();
        let index = guard
            .ty
            .member_index(member)
            .ok_or_else(|| Error::unknown_member(guard.ty.name().to_string(), member))?;
        guard.members[index] = value.into();
        Ok(())
    }

    /// Append a collection item.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.write().push_item(value.into())
    }

    /// Add a dictionary entry.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.write().insert_entry(key.into(), value.into())
    }

    /// Look up a dictionary entry.
    pub fn lookup(&self, key: &Value) -> Option<Value> {
        self.read().lookup(key).cloned()
    }

    /// Collection items, copied.
    pub fn items(&self) -> Vec<Value> {
        self.read().items().to_vec()
    }

    /// Dictionary entries, copied.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.read().entries().to_vec()
    }

    /// Number of items or entries.
    pub fn len(&self) -> usize {
        let guard = self.read();
        guard.items().len() + guard.entries().len()
    }

    /// Whether the collection holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never recurses into members, so cyclic graphs print.
        match self.0.try_read() {
            Some(guard) => write!(f, "{}@{:x}", guard.ty.name(), self.id()),
            None => write!(f, "<locked>@{:x}", self.id()),
        }
    }
}
