//! Model loading from files, strings and HTTP URLs.
//!
//! A model file declares property sets, localization messages and the API
//! operations to document. JSON and YAML are both accepted.

use std::path::Path;

use serde::Deserialize;

use crate::assembler::ApiDefinition;
use crate::catalog::ModelCatalog;
use crate::error::ModelError;
use crate::localize::MessageCatalog;
use crate::property::{Constraint, Property, PropertySet};
use crate::types::TypeDescriptor;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw contents of a model file, before any validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub property_sets: Vec<PropertySetDecl>,
    #[serde(default)]
    pub messages: MessageCatalog,
    #[serde(default)]
    pub api: Option<ApiDefinition>,
}

/// Declaration of a named property set.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertySetDecl {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
}

/// Declaration of a single property.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Localization key for the title.
    #[serde(default)]
    pub message_code: Option<String>,
    /// Title used when the key has no translation.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PropertyDecl {
    fn into_property(self) -> Property {
        let mut property = Property::new(self.name, self.ty).read_only(self.read_only);
        for constraint in self.constraints {
            property = property.constraint(constraint);
        }
        property = match self.message_code {
            Some(key) => property.localized(key, self.title),
            None => match self.title {
                Some(title) => property.title(title),
                None => property,
            },
        };
        match self.description {
            Some(description) => property.description(description),
            None => property,
        }
    }
}

impl PropertySetDecl {
    /// Build the property set this declaration describes.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for duplicate or empty property names.
    pub fn build(self) -> Result<PropertySet, ModelError> {
        let properties = self
            .properties
            .into_iter()
            .map(PropertyDecl::into_property)
            .collect();
        let mut set = PropertySet::named(self.name, properties)?;
        if let Some(title) = self.title {
            set = set.with_title(title);
        }
        if let Some(description) = self.description {
            set = set.with_description(description);
        }
        Ok(set)
    }
}

/// A loaded, validated model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub catalog: ModelCatalog,
    pub messages: MessageCatalog,
    pub api: ApiDefinition,
}

impl ModelFile {
    /// Validate declarations and build the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if any property set is malformed.
    pub fn into_model(self) -> Result<Model, ModelError> {
        let mut catalog = ModelCatalog::new();
        for decl in self.property_sets {
            catalog.declare(decl.build()?)?;
        }
        Ok(Model {
            catalog,
            messages: self.messages,
            api: self.api.unwrap_or_default(),
        })
    }
}

/// Parse a model file without validating it.
///
/// Files ending in `.yaml` or `.yml` are read as YAML, everything else as JSON.
///
/// # Errors
///
/// Returns `ModelError::FileNotFound`, `ModelError::ReadError`, or a parse error.
pub fn parse_model_file(path: &Path) -> Result<ModelFile, ModelError> {
    if !path.exists() {
        return Err(ModelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ModelError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    if is_yaml_path(&path.to_string_lossy()) {
        parse_model_yaml(&content)
    } else {
        parse_model_json(&content)
    }
}

/// Load and validate a model file.
pub fn load_model(path: &Path) -> Result<Model, ModelError> {
    parse_model_file(path)?.into_model()
}

/// Parse a model from a JSON string.
pub fn parse_model_json(content: &str) -> Result<ModelFile, ModelError> {
    serde_json::from_str(content).map_err(|source| ModelError::InvalidJson { source })
}

/// Parse a model from a YAML string.
pub fn parse_model_yaml(content: &str) -> Result<ModelFile, ModelError> {
    serde_yaml::from_str(content).map_err(|source| ModelError::InvalidYaml { source })
}

/// Load and validate a model from a JSON string.
pub fn load_model_str(content: &str) -> Result<Model, ModelError> {
    parse_model_json(content)?.into_model()
}

/// Load a model from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ModelError::NetworkError` if the request fails, or a parse error.
#[cfg(feature = "remote")]
pub fn load_model_url(url: &str) -> Result<Model, ModelError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| ModelError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| ModelError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| ModelError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let content = response.text().map_err(|source| ModelError::NetworkError {
        url: url.to_string(),
        source,
    })?;

    let file = if is_yaml_path(url) {
        parse_model_yaml(&content)?
    } else {
        parse_model_json(&content)?
    };
    file.into_model()
}

/// Load a model from a file path or, with the `remote` feature, a URL.
pub fn load_model_auto(source: &str) -> Result<Model, ModelError> {
    #[cfg(feature = "remote")]
    if is_url(source) {
        return load_model_url(source);
    }
    load_model(Path::new(source))
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn is_yaml_path(path: &str) -> bool {
    let path = path.to_lowercase();
    path.ends_with(".yaml") || path.ends_with(".yml")
}
