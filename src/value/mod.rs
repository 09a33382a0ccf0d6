//! Object model and value codecs.

mod codec;
mod converter;
mod json;
mod model;
mod primitive;

pub use codec::ValueCodec;
pub use converter::{Converter, ValueConverter};
pub use json::to_json;
pub use model::{Content, Object, ObjectRef, Value};
pub use primitive::{PrimitiveKind, format_double, format_primitive, format_single, parse_primitive};
