//! Property model: named, typed field descriptors grouped into property sets.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::TypeDescriptor;

/// A numeric bound. Applies to values, string lengths or collection sizes
/// depending on the type of the property it constrains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    #[serde(default)]
    pub exclusive: bool,
}

impl Bound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: true,
        }
    }

    /// Smallest admissible count for a lower bound on a length or size.
    pub fn lower_count(&self) -> u64 {
        let base = self.value.max(0.0).ceil() as u64;
        if self.exclusive {
            base.saturating_add(1)
        } else {
            base
        }
    }

    /// Largest admissible count for an upper bound on a length or size.
    pub fn upper_count(&self) -> u64 {
        let base = self.value.max(0.0).floor() as u64;
        if self.exclusive {
            base.saturating_sub(1)
        } else {
            base
        }
    }
}

/// Validation constraint attached to a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Required,
    /// Non-empty string or collection.
    NotEmpty,
    Min(Bound),
    Max(Bound),
    Pattern { regex: String },
    Email,
}

impl Constraint {
    /// Whether the constraint bounds a size (length or cardinality).
    pub fn is_size(&self) -> bool {
        matches!(
            self,
            Constraint::NotEmpty | Constraint::Min(_) | Constraint::Max(_)
        )
    }
}

/// A single field of a property set.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    value_type: TypeDescriptor,
    read_only: bool,
    constraints: Vec<Constraint>,
    localization_key: Option<String>,
    default_title: Option<String>,
    description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, value_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            value_type,
            read_only: false,
            constraints: Vec::new(),
            localization_key: None,
            default_title: None,
            description: None,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn required(self) -> Self {
        self.constraint(Constraint::Required)
    }

    /// Localization key for the title, with the text used when no translation exists.
    pub fn localized(mut self, key: impl Into<String>, default_title: Option<String>) -> Self {
        self.localization_key = Some(key.into());
        self.default_title = default_title;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.default_title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value_type
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_required(&self) -> bool {
        self.constraints.contains(&Constraint::Required)
    }

    pub fn localization_key(&self) -> Option<&str> {
        self.localization_key.as_deref()
    }

    pub fn default_title(&self) -> Option<&str> {
        self.default_title.as_deref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Ordered collection of properties with unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet {
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    properties: Vec<Property>,
}

impl PropertySet {
    /// Build an anonymous property set.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DuplicateProperty` if two properties share a name,
    /// or `ModelError::EmptyPropertyName` for a blank name.
    pub fn new(properties: Vec<Property>) -> Result<Self, ModelError> {
        Self::build(None, properties)
    }

    /// Build a property set declared under `name`.
    pub fn named(name: impl Into<String>, properties: Vec<Property>) -> Result<Self, ModelError> {
        Self::build(Some(name.into()), properties)
    }

    fn build(name: Option<String>, properties: Vec<Property>) -> Result<Self, ModelError> {
        let label = || name.clone().unwrap_or_else(|| "<inline>".to_string());

        for (i, prop) in properties.iter().enumerate() {
            if prop.name.split('.').all(|segment| segment.trim().is_empty()) {
                return Err(ModelError::EmptyPropertyName { set: label() });
            }
            if properties[..i].iter().any(|p| p.name == prop.name) {
                return Err(ModelError::DuplicateProperty {
                    set: label(),
                    name: prop.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            title: None,
            description: None,
            properties,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
