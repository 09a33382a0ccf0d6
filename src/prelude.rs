//! Prelude module for convenient imports.
//!
//! ```ignore
//! use markup_graph::prelude::*;
//! ```

// Serialize / deserialize
pub use crate::document::{
    deserialize, deserialize_from_reader, deserialize_with, serialize, serialize_to_writer,
    serialize_with,
};
#[cfg(feature = "batch")]
pub use crate::batch::{deserialize_all, serialize_all};

// Schema
pub use crate::schema::{
    Capability, GenericDefinition, MemberBuilder, RawCapture, SchemaContext, TypeBuilder,
    TypeName, XAML_NAMESPACE,
};

// Values
pub use crate::value::{Converter, ObjectRef, Value, ValueConverter};

// Configuration & errors
pub use crate::config::{AccessGrant, Config, ConfigBuilder};
pub use crate::diagnostic::{DiagnosticOptions, render};
pub use crate::error::{Error, Result};
