//! Document emission to JSON or YAML.

use serde::Serialize;

use crate::error::EmitError;

/// Wire format of an emitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Parse a format name (`json`, `yaml`, `yml`) or media type.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" | "application/json" => Some(Format::Json),
            "yaml" | "yml" | "application/yaml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Yaml => "application/yaml",
        }
    }
}

/// Serialize a document (or any schema value) in the given format.
///
/// `pretty` only affects JSON; YAML is always block-formatted.
///
/// # Errors
///
/// Returns `EmitError` if serialization fails.
pub fn emit<T: Serialize + ?Sized>(
    value: &T,
    format: Format,
    pretty: bool,
) -> Result<String, EmitError> {
    match format {
        Format::Json if pretty => {
            serde_json::to_string_pretty(value).map_err(|source| EmitError::Json { source })
        }
        Format::Json => serde_json::to_string(value).map_err(|source| EmitError::Json { source }),
        Format::Yaml => serde_yaml::to_string(value).map_err(|source| EmitError::Yaml { source }),
    }
}
