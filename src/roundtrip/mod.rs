//! Roundtrip tests for object graph ↔ markup.
//!
//! Tests verify that:
//! - Value → markup → Value produces a structurally equal graph
//! - Writing the rebuilt graph gives the same markup again
//! - Hand-written documents that cannot round-trip fail with the right error

#[cfg(test)]
pub(crate) mod common;

#[cfg(test)]
mod access;


#[cfg(test)]
mod content;

#[cfg(test)]
mod converter;


#[cfg(test)]
mod duplicate_key;


#[cfg(test)]
mod markup;


#[cfg(test)]
mod reference;
