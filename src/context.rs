//! Resolution context: per-pass registry of named schemas.
//!
//! A context lives for exactly one documentation pass. It accumulates the
//! named schemas discovered while resolving, tracks which names are still
//! being expanded (for cycle detection), and finally merges the named
//! schemas into the pass's document.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::ResolveError;
use crate::schema::{Schema, SchemaMap};
use crate::types::Direction;

/// Named-schema registry scoped to one documentation pass.
#[derive(Debug)]
pub struct ResolutionContext {
    document: Document,
    named: SchemaMap,
    directions: HashMap<String, Direction>,
    pending: Vec<String>,
}

impl ResolutionContext {
    /// Open a context around the document stub the pass will fill.
    pub fn open(document: Document) -> Self {
        debug!(title = %document.info.title, "opened resolution context");
        Self {
            document,
            named: SchemaMap::new(),
            directions: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Whether a schema has been defined under `name` in this pass.
    pub fn is_defined(&self, name: &str) -> bool {
        self.named.contains(name) || self.document.definitions().contains(name)
    }

    /// Register `schema` under `name`.
    ///
    /// Returns false and leaves the registry untouched if the name is
    /// already defined, whatever shape the existing definition has.
    pub fn define(&mut self, name: &str, schema: Schema) -> bool {
        let existing = self
            .named
            .get(name)
            .or_else(|| self.document.definitions().get(name));
        if let Some(existing) = existing {
            if *existing != schema {
                warn!(name, "schema name already defined with a different shape, keeping first");
            }
            return false;
        }
        debug!(name, "defined named schema");
        self.named.insert(name, schema);
        true
    }

    /// Register `schema` under `name` as resolved for `direction`.
    pub fn define_for(&mut self, name: &str, direction: Direction, schema: Schema) -> bool {
        let added = self.define(name, schema);
        if added {
            self.directions.insert(name.to_string(), direction);
        }
        added
    }

    /// The direction a named schema was resolved for, if recorded.
    pub fn defined_direction(&self, name: &str) -> Option<Direction> {
        self.directions.get(name).copied()
    }

    /// Number of named schemas accumulated and not yet merged.
    pub fn named_len(&self) -> usize {
        self.named.len()
    }

    /// Drop every unmerged named schema registered after the first `len`.
    pub fn truncate_named(&mut self, len: usize) {
        let dropped: Vec<String> = self.named.names().skip(len).map(String::from).collect();
        if dropped.is_empty() {
            return;
        }
        for name in &dropped {
            self.directions.remove(name);
        }
        self.named.truncate(len);
        debug!(?dropped, "rolled back named schemas");
    }

    /// A reference to the schema named `name`.
    pub fn reference(&self, name: &str) -> Schema {
        Schema::reference(name, self.document.spec_version().ref_prefix())
    }

    /// The schema defined under `name`, if any.
    pub fn named_schema(&self, name: &str) -> Option<&Schema> {
        self.named
            .get(name)
            .or_else(|| self.document.definitions().get(name))
    }

    /// Mark `name` as being expanded.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::NamedSchemaCycle` if `name` is already being
    /// expanded further up the current resolution.
    pub fn begin(&mut self, name: &str) -> Result<(), ResolveError> {
        if let Some(start) = self.pending.iter().position(|p| p == name) {
            let mut chain = self.pending[start..].to_vec();
            chain.push(name.to_string());
            return Err(ResolveError::NamedSchemaCycle { chain });
        }
        self.pending.push(name.to_string());
        Ok(())
    }

    /// Mark `name` as no longer being expanded.
    pub fn finish(&mut self, name: &str) {
        if let Some(index) = self.pending.iter().rposition(|p| p == name) {
            self.pending.remove(index);
        }
    }

    /// Copy accumulated named schemas into the document, skipping names it
    /// already defines. Returns the number of schemas added.
    pub fn merge(&mut self) -> usize {
        let mut added = 0;
        for (name, schema) in self.named.iter() {
            if self.document.add_definition(name, schema.clone()) {
                added += 1;
            }
        }
        self.named.clear();
        debug!(added, "merged named schemas into document");
        added
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Tear the context down and hand back its document.
    ///
    /// Unmerged named schemas are discarded. Safe after a failed pass.
    pub fn close(mut self) -> Document {
        if !self.named.is_empty() {
            debug!(discarded = self.named.len(), "closing context with unmerged schemas");
        }
        self.pending.clear();
        self.named.clear();
        self.directions.clear();
        debug!(title = %self.document.info.title, "closed resolution context");
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Info;
    use crate::schema::{SchemaObject, SchemaType};
    use crate::types::SpecVersion;

    fn context(version: SpecVersion) -> ResolutionContext {
        ResolutionContext::open(Document::new(
            version,
            Info {
                title: "Test".into(),
                version: "1".into(),
                description: None,
            },
        ))
    }

    #[test]
    fn define_is_idempotent_by_name() {
        let mut ctx = context(SpecVersion::OpenApi3);
        assert!(ctx.define("A", Schema::inline(SchemaObject::object())));
        assert!(!ctx.define(
            "A",
            Schema::inline(SchemaObject::of_type(SchemaType::String))
        ));
        assert_eq!(
            ctx.named_schema("A"),
            Some(&Schema::inline(SchemaObject::object()))
        );
    }

    #[test]
    fn reference_uses_version_prefix() {
        let ctx = context(SpecVersion::Swagger2);
        assert_eq!(
            ctx.reference("A"),
            Schema::reference("A", "#/definitions/")
        );
    }

    #[test]
    fn merge_skips_names_already_in_document() {
        let mut ctx = context(SpecVersion::OpenApi3);
        ctx.define("A", Schema::inline(SchemaObject::object()));
        assert_eq!(ctx.merge(), 1);

        // Already in the document: define is a no-op and merge adds nothing.
        assert!(!ctx.define("A", Schema::inline(SchemaObject::object())));
        ctx.define("B", Schema::inline(SchemaObject::object()));
        assert_eq!(ctx.merge(), 1);

        let doc = ctx.close();
        assert_eq!(doc.definitions().names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn begin_detects_cycle() {
        let mut ctx = context(SpecVersion::OpenApi3);
        ctx.begin("A").unwrap();
        ctx.begin("B").unwrap();
        let err = ctx.begin("A").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NamedSchemaCycle { chain } if chain == ["A", "B", "A"]
        ));
    }

    #[test]
    fn finish_allows_reentry() {
        let mut ctx = context(SpecVersion::OpenApi3);
        ctx.begin("A").unwrap();
        ctx.finish("A");
        assert!(ctx.begin("A").is_ok());
    }

    #[test]
    fn truncate_named_rolls_back_later_definitions() {
        let mut ctx = context(SpecVersion::OpenApi3);
        ctx.define_for("A", Direction::Request, Schema::inline(SchemaObject::object()));
        let mark = ctx.named_len();
        ctx.define_for("B", Direction::Response, Schema::inline(SchemaObject::object()));
        ctx.define_for("C", Direction::Response, Schema::inline(SchemaObject::object()));

        ctx.truncate_named(mark);
        assert!(ctx.is_defined("A"));
        assert!(!ctx.is_defined("B"));
        assert!(!ctx.is_defined("C"));
        assert_eq!(ctx.defined_direction("A"), Some(Direction::Request));
        assert_eq!(ctx.defined_direction("B"), None);
        assert_eq!(ctx.merge(), 1);
    }

    #[test]
    fn close_discards_unmerged() {
        let mut ctx = context(SpecVersion::OpenApi3);
        ctx.define("A", Schema::inline(SchemaObject::object()));
        let doc = ctx.close();
        assert!(doc.definitions().is_empty());
    }
}
