//! Names registered with `x:Name` during one deserialize operation.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Flat name scope; names resolve only after they were registered.
#[derive(Debug, Default)]
pub struct NameScope {
    names: FxHashMap<String, Value>,
}

impl NameScope {
    /// Register a built object under `name`.
    pub fn register(&mut self, name: String, value: Value, ty: &str) -> Result<()> {
        if self.names.contains_key(&name) {
            return Err(Error::duplicate_member(ty, format!("x:Name '{name}'")));
        }
        log::trace!("registered name {name}");
        self.names.insert(name, value);
        Ok(())
    }

    /// Resolve a back-reference.
    pub fn resolve(&self, name: &str) -> Result<Value> {
        self.names
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnresolvedReference {
                name: name.to_string(),
            })
    }
}
