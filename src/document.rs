//! Whole-document serialize and deserialize.
//!
//! ```text
//! serialize:   Value ──ObjectWriter──▶ NodeList ──MarkupEmitter──▶ text
//! deserialize: text ──MarkupParser──▶ NodeList ──ObjectBuilder──▶ Value
//! ```
//!
//! The functions without a `_with` suffix use the process default from
//! [`config::get`](crate::config::get).

use std::io::{Read, Write};

use crate::builder::ObjectBuilder;
use crate::config::{self, Config};
use crate::error::Result;
use crate::markup;
use crate::schema::SchemaContext;
use crate::value::Value;
use crate::writer::ObjectWriter;

/// Serialize a value into a markup document.
pub fn serialize(value: &Value, ctx: &SchemaContext) -> Result<String> {
    serialize_with(value, ctx, config::get())
}

/// Serialize with explicit configuration.
pub fn serialize_with(value: &Value, ctx: &SchemaContext, config: &Config) -> Result<String> {
    let nodes = ObjectWriter::new(ctx, config).write(value)?;
    let text = markup::emit(&nodes, ctx, config)?;
    log::debug!("serialized {} nodes into {} bytes", nodes.len(), text.len());
    Ok(text)
}

/// Serialize into a byte sink as UTF-8.
pub fn serialize_to_writer(value: &Value, ctx: &SchemaContext, out: impl Write) -> Result<()> {
    serialize_to_writer_with(value, ctx, config::get(), out)
}

/// Serialize into a byte sink with explicit configuration.
pub fn serialize_to_writer_with(
    value: &Value,
    ctx: &SchemaContext,
    config: &Config,
    mut out: impl Write,
) -> Result<()> {
    let text = serialize_with(value, ctx, config)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Deserialize a markup document into a value.
pub fn deserialize(text: &str, ctx: &SchemaContext) -> Result<Value> {
    deserialize_with(text, ctx, config::get())
}

/// Deserialize with explicit configuration.
pub fn deserialize_with(text: &str, ctx: &SchemaContext, config: &Config) -> Result<Value> {
    let nodes = markup::parse(text, ctx, config)?;
    log::debug!("parsed {} bytes into {} nodes", text.len(), nodes.len());
    ObjectBuilder::new(ctx, config).build(&nodes)
}

/// Deserialize from a UTF-8 byte source.
pub fn deserialize_from_reader(input: impl Read, ctx: &SchemaContext) -> Result<Value> {
    deserialize_from_reader_with(input, ctx, config::get())
}

/// Deserialize from a UTF-8 byte source with explicit configuration.
pub fn deserialize_from_reader_with(
    mut input: impl Read,
    ctx: &SchemaContext,
    config: &Config,
) -> Result<Value> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    deserialize_with(&text, ctx, config)
}
