//! Open generic type definitions.
//!
//! A definition is a closure from closed type arguments to a [`TypeBuilder`].
//! For a definition nested in another generic the argument list is the outer
//! arguments followed by its own, so `Outer<int>.Inner<string>` closes with
//! `[Int32, String]`.

use std::fmt;
use std::sync::Arc;

use super::{Capability, MemberBuilder, TypeBuilder, TypeName};
use crate::error::Result;

/// Builds a closed type from its type arguments.
pub type GenericFn = Arc<dyn Fn(&[TypeName]) -> Result<TypeBuilder> + Send + Sync>;

/// Open generic definition.
#[derive(Clone)]
pub struct GenericDefinition {
    pub(super) namespace: String,
    pub(super) name: String,
    pub(super) arity: usize,
    pub(super) outer: Option<String>,
    pub(super) build: GenericFn,
}

impl GenericDefinition {
    /// Define a generic with `arity` own type parameters.
    pub fn new<F>(namespace: impl Into<String>, name: impl Into<String>, arity: usize, build: F) -> Self
    where
        F: Fn(&[TypeName]) -> Result<TypeBuilder> + Send + Sync + 'static,
    {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            arity,
            outer: None,
            build: Arc::new(build),
        }
    }

    /// Nest inside the generic `outer` of the same namespace; its parameters
    /// come first.
    pub fn nested_in(mut self, outer: impl Into<String>) -> Self {
        self.outer = Some(outer.into());
        self
    }

    /// A list of `T` with the given name.
    pub fn list(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let ns = namespace.clone();
        Self::new(namespace, name, 1, move |args| {
            Ok(TypeBuilder::new(ns.clone(), "")
                .capability(Capability::List)
                .item_type(args[0].clone()))
        })
    }

    /// A dictionary from `K` to `V` with the given name.
    pub fn dictionary(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let ns = namespace.clone();
        Self::new(namespace, name, 2, move |args| {
            Ok(TypeBuilder::new(ns.clone(), "").dictionary(args[0].clone(), args[1].clone()))
        })
    }

    /// A single-slot box with a `Value` member of type `T`.
    pub fn boxed(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let ns = namespace.clone();
        Self::new(namespace, name, 1, move |args| {
            Ok(TypeBuilder::new(ns.clone(), "")
                .member(MemberBuilder::new("Value", args[0].clone()))
                .content_property("Value"))
        })
    }

    /// Namespace URI.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own type parameter count, excluding any outer definition's.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for GenericDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericDefinition")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("outer", &self.outer)
            .finish_non_exhaustive()
    }
}
