//! Catalog of property sets declared by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ModelError, ResolveError};
use crate::property::PropertySet;

/// Declared property sets, looked up by name when a record type refers to one.
///
/// Declaring the same name twice is allowed; looking it up is then ambiguous.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    sets: BTreeMap<String, Vec<Arc<PropertySet>>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named property set.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnnamedPropertySet` if the set has no name.
    pub fn declare(&mut self, set: PropertySet) -> Result<Arc<PropertySet>, ModelError> {
        let name = set
            .name()
            .map(String::from)
            .ok_or(ModelError::UnnamedPropertySet)?;
        let set = Arc::new(set);
        self.sets.entry(name).or_default().push(Arc::clone(&set));
        Ok(set)
    }

    /// Find the single property set declared as `name`.
    ///
    /// `declaration` names the site that asked for it and is carried into errors.
    ///
    /// # Errors
    ///
    /// `UnknownPropertySet` if nothing is declared under `name`,
    /// `AmbiguousPropertySet` if more than one set is.
    pub fn lookup(&self, name: &str, declaration: &str) -> Result<Arc<PropertySet>, ResolveError> {
        match self.sets.get(name).map(Vec::as_slice) {
            Some([set]) => Ok(Arc::clone(set)),
            Some(sets) if sets.len() > 1 => Err(ResolveError::AmbiguousPropertySet {
                name: name.to_string(),
                declaration: declaration.to_string(),
                count: sets.len(),
            }),
            _ => Err(ResolveError::UnknownPropertySet {
                name: name.to_string(),
                declaration: declaration.to_string(),
            }),
        }
    }

    /// Number of declarations under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.sets.get(name).map_or(0, Vec::len)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
