//! Error types for property set modelling, schema resolution and document output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while building or loading a property set model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("duplicate property \"{name}\" in property set {set}")]
    DuplicateProperty { set: String, name: String },

    #[error("property set {set} contains a property with an empty name")]
    EmptyPropertyName { set: String },

    #[error("property set declared without a name")]
    UnnamedPropertySet,

    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },
}

impl ModelError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ModelError::FileNotFound { .. } | ModelError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ModelError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during schema resolution.
///
/// Unrecognized value types never surface here: they degrade to an untyped
/// object schema inside the resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no property set named \"{name}\" (referenced by {declaration})")]
    UnknownPropertySet { name: String, declaration: String },

    #[error(
        "property set reference \"{name}\" in {declaration} is ambiguous: declared {count} times"
    )]
    AmbiguousPropertySet {
        name: String,
        declaration: String,
        count: usize,
    },

    #[error("named schema cycle: {}", chain.join(" -> "))]
    NamedSchemaCycle { chain: Vec<String> },

    #[error("property set cycle: {}", chain.join(" -> "))]
    RecordCycle { chain: Vec<String> },

    #[error("a resolution context is already attached to this thread")]
    ContextAlreadyAttached,

    #[error("no resolution context is attached to this thread")]
    NoActiveContext,

    #[error("the attached resolution context is already in use")]
    ContextBusy,

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::Model(e) => e.exit_code(),
            _ => 2,
        }
    }

    /// Returns true for errors that invalidate the whole documentation pass
    /// rather than a single type resolution.
    pub fn is_pass_fatal(&self) -> bool {
        !matches!(
            self,
            ResolveError::UnknownPropertySet { .. } | ResolveError::AmbiguousPropertySet { .. }
        )
    }
}

/// Errors while serializing a document to its wire format.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("cannot serialize JSON: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize YAML: {source}")]
    Yaml {
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors found when checking an assembled document for self-consistency.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("document is inconsistent: {} issue(s)", issues.len())]
    Invalid { issues: Vec<DocumentIssue> },
}

/// Single document problem with its location.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DocumentIssue {
    /// JSON Pointer (RFC 6901) to the offending schema.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for DocumentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Emit(_) => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
