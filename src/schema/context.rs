//! Shared type registry with a cache of closed generic descriptors.
//!
//! # Caching Strategy
//!
//! ```text
//! SchemaContext (Arc, shared by clone)
//! ├── types:    (ns, name) -> TypeDescriptor     registered up front
//! ├── generics: (ns, name) -> GenericDefinition  registered up front
//! └── closed:   TypeName   -> TypeDescriptor     filled on first use
//! ```
//!
//! A cache miss builds the closed descriptor outside any lock and inserts it
//! with entry-or-existing semantics, so concurrent first use of the same
//! closed type yields one shared descriptor.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{
    GenericDefinition, MemberDescriptor, TypeBuilder, TypeDescriptor, TypeName, XAML_NAMESPACE,
    intrinsic,
};
use crate::error::{Error, Result};
use crate::value::{Object, ObjectRef, Value};

type Key = (String, String);

#[derive(Default)]
struct Registry {
    types: RwLock<FxHashMap<Key, Arc<TypeDescriptor>>>,
    generics: RwLock<FxHashMap<Key, Arc<GenericDefinition>>>,
    closed: RwLock<FxHashMap<TypeName, Arc<TypeDescriptor>>>,
    prefixes: RwLock<FxHashMap<String, String>>,
}

/// Registry of native types, shared by every operation that uses it.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct SchemaContext {
    inner: Arc<Registry>,
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaContext {
    /// Create a context holding the intrinsic types.
    pub fn new() -> Self {
        let ctx = Self {
            inner: Arc::new(Registry::default()),
        };
        {
            let mut types = ctx.inner.types.write();
            for ty in intrinsic::descriptors() {
                let key = (ty.name().namespace().to_string(), ty.name().name().to_string());
                types.insert(key, Arc::new(ty));
            }
        }
        ctx.set_preferred_prefix(XAML_NAMESPACE, "x");
        ctx
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Build and register a type.
    pub fn register(&self, builder: TypeBuilder) -> Result<Arc<TypeDescriptor>> {
        if builder.type_name().is_generic() {
            return Err(Error::invalid_schema(format!(
                "'{}' has type arguments; register a GenericDefinition instead",
                builder.type_name()
            )));
        }
        let ty = Arc::new(builder.build()?);
        let key = (ty.name().namespace().to_string(), ty.name().name().to_string());

        let mut types = self.inner.types.write();
        if types.contains_key(&key) {
            return Err(Error::invalid_schema(format!(
                "type '{}' is already registered in '{}'",
                key.1, key.0
            )));
        }
        log::trace!("registered type {} ({})", key.1, key.0);
        types.insert(key, ty.clone());
        Ok(ty)
    }

    /// Register an open generic definition.
    pub fn register_generic(&self, definition: GenericDefinition) -> Result<()> {
        let key = (definition.namespace.clone(), definition.name.clone());
        let mut generics = self.inner.generics.write();
        if let Some(outer) = &definition.outer
            && !generics.contains_key(&(definition.namespace.clone(), outer.clone()))
        {
            return Err(Error::invalid_schema(format!(
                "outer generic '{outer}' of '{}' is not registered",
                definition.name
            )));
        }
        if generics.contains_key(&key) {
            return Err(Error::invalid_schema(format!(
                "generic '{}' is already registered in '{}'",
                key.1, key.0
            )));
        }
        generics.insert(key, Arc::new(definition));
        Ok(())
    }

    /// Prefer `prefix` when emitting elements of namespace `uri`.
    pub fn set_preferred_prefix(&self, uri: impl Into<String>, prefix: impl Into<String>) {
        self.inner.prefixes.write().insert(uri.into(), prefix.into());
    }

    /// Preferred prefix for a namespace.
    pub fn preferred_prefix(&self, uri: &str) -> Option<String> {
        self.inner.prefixes.read().get(uri).cloned()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a non-generic type.
    pub fn resolve(&self, namespace: &str, name: &str) -> Result<Arc<TypeDescriptor>> {
        self.inner
            .types
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::unknown_type(namespace, name))
    }

    /// Resolve a closed generic type, building and caching it on first use.
    pub fn resolve_generic(
        &self,
        namespace: &str,
        name: &str,
        args: &[TypeName],
    ) -> Result<Arc<TypeDescriptor>> {
        if args.is_empty() {
            return self.resolve(namespace, name);
        }
        let closed = TypeName::generic(namespace, name, args.iter().cloned());
        if let Some(ty) = self.inner.closed.read().get(&closed) {
            return Ok(ty.clone());
        }

        let unknown = || Error::unknown_type(namespace, closed.to_string());
        let definition = self
            .inner
            .generics
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(unknown)?;
        if self.composed_arity(&definition) != args.len() {
            return Err(unknown());
        }
        for arg in args {
            self.resolve_name(arg)?;
        }

        let builder = (definition.build)(args)?.rename(closed.clone());
        let ty = Arc::new(builder.build()?);
        log::trace!("closed generic {closed}");
        Ok(self
            .inner
            .closed
            .write()
            .entry(closed)
            .or_insert(ty)
            .clone())
    }

    /// Resolve either a plain or a closed generic name.
    pub fn resolve_name(&self, name: &TypeName) -> Result<Arc<TypeDescriptor>> {
        self.resolve_generic(name.namespace(), name.name(), name.args())
    }

    /// Resolve a member of a type.
    pub fn resolve_member(&self, ty: &TypeDescriptor, name: &str) -> Result<Arc<MemberDescriptor>> {
        ty.resolve_member(name)
    }

    /// Number of closed generic descriptors built so far.
    pub fn closed_type_count(&self) -> usize {
        self.inner.closed.read().len()
    }

    fn composed_arity(&self, definition: &GenericDefinition) -> usize {
        let generics = self.inner.generics.read();
        let mut arity = definition.arity;
        let mut outer = definition.outer.clone();
        while let Some(name) = outer {
            match generics.get(&(definition.namespace.clone(), name)) {
                Some(parent) => {
                    arity += parent.arity;
                    outer = parent.outer.clone();
                }
                None => break,
            }
        }
        arity
    }

    // =========================================================================
    // Instantiation
    // =========================================================================

    /// Create an instance with defaults applied and initialized members filled.
    pub fn create(&self, ty: &Arc<TypeDescriptor>) -> Result<ObjectRef> {
        let mut object = Object::new(ty.clone());
        for (i, member) in ty.members().iter().enumerate() {
            if member.is_initialized() && object.members()[i].is_null() {
                let member_ty = self.resolve_name(member.value_type())?;
                object.set_member_at(i, self.create_value(&member_ty)?);
            }
        }
        Ok(ObjectRef::new(object))
    }

    /// Create the default value of a type: zero for primitives, null for
    /// `x:Null`, a fresh instance otherwise.
    pub fn create_value(&self, ty: &Arc<TypeDescriptor>) -> Result<Value> {
        if let Some(kind) = ty.primitive() {
            return Ok(kind.default_value());
        }
        if ty.is_intrinsic(intrinsic::NULL) {
            return Ok(Value::Null);
        }
        self.create(ty).map(Value::Object)
    }

    /// Resolve and create in one step.
    pub fn instantiate(&self, namespace: &str, name: &str) -> Result<ObjectRef> {
        let ty = self.resolve(namespace, name)?;
        self.create(&ty)
    }
}
