//! Parallel serialize and deserialize over one shared context.
//!
//! Each item is an independent operation; results keep input order and
//! one failure does not affect the others.
//!
//! ```ignore
//! let texts = batch::serialize_all(&values, &ctx);
//! let values = batch::deserialize_all(&documents, &ctx);
//! ```

use rayon::prelude::*;

use crate::config::{self, Config};
use crate::document;
use crate::error::Result;
use crate::schema::SchemaContext;
use crate::value::Value;

/// Serialize every value in parallel.
pub fn serialize_all(values: &[Value], ctx: &SchemaContext) -> Vec<Result<String>> {
    serialize_all_with(values, ctx, config::get())
}

/// Serialize every value in parallel with explicit configuration.
pub fn serialize_all_with(
    values: &[Value],
    ctx: &SchemaContext,
    config: &Config,
) -> Vec<Result<String>> {
    values
        .par_iter()
        .map(|value| document::serialize_with(value, ctx, config))
        .collect()
}

/// Deserialize every document in parallel.
pub fn deserialize_all<S: AsRef<str> + Sync>(texts: &[S], ctx: &SchemaContext) -> Vec<Result<Value>> {
    deserialize_all_with(texts, ctx, config::get())
}

/// Deserialize every document in parallel with explicit configuration.
pub fn deserialize_all_with<S: AsRef<str> + Sync>(
    texts: &[S],
    ctx: &SchemaContext,
    config: &Config,
) -> Vec<Result<Value>> {
    texts
        .par_iter()
        .map(|text| document::deserialize_with(text.as_ref(), ctx, config))
        .collect()
}
