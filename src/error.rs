//! Error types for serialize and deserialize operations.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed inner cause of a failed conversion.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error raised by any serialize or deserialize operation.
///
/// Every error aborts the whole operation; no partial object graph is ever
/// returned. Errors raised while reading a parsed document are wrapped in
/// [`Error::Located`], use [`Error::innermost`] to match on the cause.
///
/// # Example
///
/// ```ignore
/// match markup_graph::deserialize(text, &ctx) {
///     Ok(value) => { /* success */ }
///     Err(e) => match e.innermost() {
///         Error::DuplicateMember { ty, member, .. } => eprintln!("{member} twice on {ty}"),
///         other => eprintln!("{other}"),
///     },
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// No native type is registered for the namespace/name combination.
    #[error("unknown type '{name}' in namespace '{namespace}'")]
    UnknownType {
        /// Namespace URI.
        namespace: String,
        /// Local type name (with type arguments, if any).
        name: String,
    },

    /// The type does not declare the member.
    #[error("type '{ty}' has no member '{member}'")]
    UnknownMember {
        /// Owning type name.
        ty: String,
        /// Member name as written.
        member: String,
    },

    /// Text could not be converted to the target type.
    #[error("cannot convert '{text}' to {target}")]
    Conversion {
        /// The offending text.
        text: String,
        /// Target type name.
        target: String,
        /// Underlying parse or converter failure.
        #[source]
        source: BoxedCause,
    },

    /// An object ended before all required constructor arguments were bound.
    #[error("type '{ty}' is missing required constructor argument '{member}'")]
    MissingConstructorArgument {
        /// Type being constructed.
        ty: String,
        /// Unbound constructor parameter.
        member: String,
    },

    /// A member (or dictionary key) was assigned more than once.
    #[error("{}", describe_duplicate(.ty, .member, .key.as_deref()))]
    DuplicateMember {
        /// Type that owns the member (the dictionary type for keys).
        ty: String,
        /// Member name, `x:Key` for dictionary keys.
        member: String,
        /// The duplicated dictionary key, when applicable.
        key: Option<String>,
    },

    /// A back-reference names an object that was never registered.
    #[error("unresolved reference '{name}'")]
    UnresolvedReference {
        /// Referenced name.
        name: String,
    },

    /// The document violates markup syntax.
    #[error("malformed markup at {line}:{column}: {message}")]
    MalformedMarkup {
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
        /// Parser message.
        message: String,
    },

    /// A type or member is not reachable under the caller's access grant.
    #[error("{}", describe_access(.ty, .member.as_deref()))]
    AccessDenied {
        /// Type name.
        ty: String,
        /// Member name, if the member (not the type) is internal.
        member: Option<String>,
    },

    /// The document populates state that cannot be reconstructed.
    #[error("member '{member}' of type '{ty}' is read-only and cannot be populated")]
    ReadOnlyMember {
        /// Owning type.
        ty: String,
        /// Member name.
        member: String,
    },

    /// A read-only collection is reachable from more than one place.
    ///
    /// Its items are written in place, which leaves no element to carry an
    /// `x:Name`, so the other occurrences could not refer back to it.
    #[error("read-only member '{member}' of type '{ty}' holds a collection that is shared with another member")]
    SharedReadOnly {
        /// Owning type.
        ty: String,
        /// Member name.
        member: String,
    },

    /// Objects or elements are nested deeper than the configured limit.
    #[error("nesting exceeds the limit of {limit} levels")]
    TooDeep {
        /// The configured [`max_depth`](crate::config::Config::max_depth).
        limit: usize,
    },

    /// Element content was given to a type that cannot accept it.
    #[error("type '{ty}' does not accept content")]
    UnexpectedContent {
        /// Type name.
        ty: String,
    },

    /// A dictionary entry was given without `x:Key`.
    #[error("dictionary '{ty}' entry has no x:Key")]
    MissingKey {
        /// Dictionary type.
        ty: String,
    },

    /// A node sequence handed to the builder or emitter is not well nested.
    #[error("invalid node sequence: {0}")]
    NodeSequence(String),

    /// A type descriptor violates a schema invariant.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Stream I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error tied to a position in the source document.
    #[error("{source} (line {line}, column {column})")]
    Located {
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
        /// The cause.
        source: Box<Error>,
    },
}

impl Error {
    /// Create an unknown type error.
    pub fn unknown_type(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownType {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create an unknown member error.
    pub fn unknown_member(ty: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            ty: ty.into(),
            member: member.into(),
        }
    }

    /// Create a conversion error wrapping its cause.
    pub fn conversion(
        text: impl Into<String>,
        target: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Self::Conversion {
            text: text.into(),
            target: target.into(),
            source: source.into(),
        }
    }

    /// Create a duplicate member error.
    pub fn duplicate_member(ty: impl Into<String>, member: impl Into<String>) -> Self {
        Self::DuplicateMember {
            ty: ty.into(),
            member: member.into(),
            key: None,
        }
    }

    /// Create a duplicate dictionary key error.
    pub fn duplicate_key(ty: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateMember {
            ty: ty.into(),
            member: "x:Key".into(),
            key: Some(key.into()),
        }
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema(message.into())
    }

    /// Create a node sequence error.
    pub fn node_sequence(message: impl Into<String>) -> Self {
        Self::NodeSequence(message.into())
    }

    /// Attach a source position. Already located errors keep their position.
    pub fn located(self, line: u32, column: u32) -> Self {
        match self {
            located @ Self::Located { .. } => located,
            located @ Self::MalformedMarkup { .. } => located,
            other => Self::Located {
                line,
                column,
                source: Box::new(other),
            },
        }
    }

    /// The innermost cause, skipping location wrappers.
    pub fn innermost(&self) -> &Error {
        match self {
            Self::Located { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// The source position, if known.
    pub fn location(&self) -> Option<(u32, u32)> {
        match self {
            Self::Located { line, column, .. } | Self::MalformedMarkup { line, column, .. } => {
                Some((*line, *column))
            }
            _ => None,
        }
    }
}

fn describe_duplicate(ty: &str, member: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("key '{key}' is added more than once to dictionary '{ty}'"),
        None => format!("member '{member}' is set more than once on type '{ty}'"),
    }
}

fn describe_access(ty: &str, member: Option<&str>) -> String {
    match member {
        Some(member) => format!("member '{member}' of type '{ty}' is not accessible"),
        None => format!("type '{ty}' is not accessible"),
    }
}
