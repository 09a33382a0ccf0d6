//! Configuration for serialize and deserialize operations.
//!
//! Use [`ConfigBuilder`] at application startup to set the process default,
//! or pass a [`Config`] to the `*_with` functions per call.

use std::sync::OnceLock;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Which visibility levels an operation may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessGrant {
    /// Public types and members only.
    #[default]
    Public,
    /// Public and internal types and members.
    Internal,
}

impl AccessGrant {
    /// Whether internal types and members are reachable.
    pub fn allows_internal(self) -> bool {
        self == Self::Internal
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Indentation per nesting level; `None` writes everything on one line.
    pub indent: Option<String>,
    /// Emit `<?xml version="1.0" encoding="utf-8"?>` before the root element.
    pub xml_declaration: bool,
    /// Access grant for types and members.
    pub access: AccessGrant,
    /// Prefix of generated reference names.
    /// Example: "__Reference_ID_" gives `__Reference_ID_0`, `__Reference_ID_1`, ...
    pub reference_prefix: String,
    /// Deepest object nesting accepted when writing or reading.
    ///
    /// Markup may nest two elements per object (the object element and a
    /// property element), so documents are limited to `2 * max_depth + 1`
    /// element levels.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: Some("  ".to_string()),
            xml_declaration: false,
            access: AccessGrant::Public,
            reference_prefix: "__Reference_ID_".to_string(),
            max_depth: 64,
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    indent: Option<Option<String>>,
    xml_declaration: Option<bool>,
    access: Option<AccessGrant>,
    reference_prefix: Option<String>,
    max_depth: Option<usize>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation string.
    ///
    /// Default: two spaces
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(Some(indent.into()));
        self
    }

    /// Write documents on a single line.
    pub fn compact(mut self) -> Self {
        self.indent = Some(None);
        self
    }

    /// Emit an XML declaration.
    ///
    /// Default: false
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = Some(enabled);
        self
    }

    /// Set the access grant.
    ///
    /// Default: [`AccessGrant::Public`]
    ///
    /// # Example
    ///
    /// ```
    /// use markup_graph::config::{AccessGrant, ConfigBuilder};
    ///
    /// let config = ConfigBuilder::new().access(AccessGrant::Internal).build();
    /// assert!(config.access.allows_internal());
    /// ```
    pub fn access(mut self, grant: AccessGrant) -> Self {
        self.access = Some(grant);
        self
    }

    /// Set the prefix of generated reference names.
    ///
    /// Default: "__Reference_ID_"
    pub fn reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = Some(prefix.into());
        self
    }

    /// Set the deepest object nesting accepted.
    ///
    /// Default: 64
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Build a configuration without touching the global default.
    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            indent: self.indent.unwrap_or(default.indent),
            xml_declaration: self.xml_declaration.unwrap_or(default.xml_declaration),
            access: self.access.unwrap_or(default.access),
            reference_prefix: self.reference_prefix.unwrap_or(default.reference_prefix),
            max_depth: self.max_depth.unwrap_or(default.max_depth),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        CONFIG.set(self.build()).is_ok()
    }
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
