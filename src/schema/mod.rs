//! Type schema: descriptors of native types and the registry resolving them.
//!
//! ```text
//! SchemaContext
//! ├── resolve(ns, name)              -> TypeDescriptor
//! ├── resolve_generic(ns, name, args) -> TypeDescriptor (closed, cached)
//! └── TypeDescriptor::resolve_member -> MemberDescriptor
//! ```
//!
//! Descriptors are built with [`TypeBuilder`] / [`MemberBuilder`] and never
//! change once registered.

mod context;
mod generic;
pub mod intrinsic;
mod member;
mod name;
mod types;

pub use context::SchemaContext;
pub use generic::{GenericDefinition, GenericFn};
pub use member::{MemberAccess, MemberBuilder, MemberDescriptor, RawCapture, Visibility};
pub use name::{TypeName, XAML_NAMESPACE, XML_NAMESPACE};
pub use types::{
    Capability, CollectionKind, Constructor, FactoryFn, FactoryMethod, KeyComparison,
    TypeBuilder, TypeDescriptor,
};
