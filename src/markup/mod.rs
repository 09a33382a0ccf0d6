//! Markup text ↔ node stream.
//!
//! # Syntax
//!
//! ```text
//! <Person xmlns="urn:app" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
//!         x:Name="__Reference_ID_0" Name="Ada" Friend="{x:Reference __Reference_ID_0}">
//!   <Person.Tags>
//!     <x:String>first</x:String>
//!   </Person.Tags>
//! </Person>
//! ```
//!
//! - attribute values starting with `{` are markup extensions; `{}` escapes a literal `{`
//! - `Owner.Member` elements are property elements, other child elements are content
//! - text is trimmed unless `xml:space="preserve"` is in effect

mod emitter;
mod escape;
mod extension;
mod parser;
mod tree;

pub use emitter::MarkupEmitter;
pub use parser::MarkupParser;

use crate::config::Config;
use crate::error::Result;
use crate::node::NodeList;
use crate::schema::SchemaContext;

/// Parse markup text into nodes.
pub fn parse(text: &str, ctx: &SchemaContext, config: &Config) -> Result<NodeList> {
    MarkupParser::new(ctx, text)
        .with_max_depth(config.max_depth)
        .parse()
}

/// Render nodes as markup text.
pub fn emit(nodes: &NodeList, ctx: &SchemaContext, config: &Config) -> Result<String> {
    MarkupEmitter::new(ctx, config).emit(nodes)
}
