//! # markup-graph
//!
//! A bidirectional object graph ↔ markup document serializer in the style
//! of XAML.
//!
//! Types are described once in a shared [`SchemaContext`]: members,
//! constructor arguments, content properties, collection capabilities and
//! value converters. Any graph of [`Value`]s built from those types can be
//! written as markup and read back into a structurally equal graph:
//!
//! - **Defaults**: members equal to their default are not written
//! - **Shared objects**: written once with `x:Name`, later as `{x:Reference}`
//! - **Collections**: items as child elements, read-only collections populated in place
//! - **Generics**: closed generic types via `x:TypeArguments`
//!
//! ## Quick Start
//!
//! ```
//! use markup_graph::{MemberBuilder, SchemaContext, TypeBuilder, TypeName, Value};
//!
//! let ctx = SchemaContext::new();
//! ctx.register(
//!     TypeBuilder::new("urn:people", "Person")
//!         .member(MemberBuilder::new("Name", TypeName::xaml("String")))
//!         .member(MemberBuilder::new("Age", TypeName::xaml("Int32"))),
//! )?;
//!
//! let ada = ctx.instantiate("urn:people", "Person")?;
//! ada.set("Name", "Ada")?;
//! ada.set("Age", 36)?;
//!
//! let text = markup_graph::serialize(&Value::Object(ada), &ctx)?;
//! assert_eq!(text, r#"<Person xmlns="urn:people" Name="Ada" Age="36"/>"#);
//!
//! let back = markup_graph::deserialize(&text, &ctx)?;
//! assert_eq!(back.as_object().and_then(|p| p.get("Age")), Some(Value::Int32(36)));
//! # Ok::<(), markup_graph::Error>(())
//! ```
//!
//! ## Layers
//!
//! - [`writer`]: object graph → node stream
//! - [`markup`]: node stream ↔ markup text
//! - [`builder`]: node stream → object graph
//! - [`schema`]: type descriptors and the shared context
//! - [`value`]: runtime values, primitives and converters
//! - [`config`]: runtime configuration (indentation, access grant, ...)
//! - [`diagnostic`]: error formatting

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod markup;
pub mod node;
pub mod prelude;
pub mod schema;
pub mod value;
pub mod writer;

#[cfg(feature = "batch")]
pub mod batch;

#[cfg(test)]
mod roundtrip;

// =============================================================================
// High-Level API (recommended for most use cases)
// =============================================================================

pub use document::{
    deserialize, deserialize_from_reader, deserialize_from_reader_with, deserialize_with,
    serialize, serialize_to_writer, serialize_to_writer_with, serialize_with,
};

// =============================================================================
// Schema & Values
// =============================================================================

pub use schema::{
    Capability, GenericDefinition, MemberBuilder, RawCapture, SchemaContext, TypeBuilder,
    TypeDescriptor, TypeName, XAML_NAMESPACE,
};
pub use value::{Converter, ObjectRef, PrimitiveKind, Value, ValueConverter, to_json};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{AccessGrant, Config, ConfigBuilder};
pub use diagnostic::{DiagnosticOptions, DisplayStyle};
pub use error::{Error, Result};
