//! Schema resolution - turns property sets and value types into schemas.
//!
//! Records expand through the serialization tree into object schemas.
//! Constraints translate into schema keywords on each leaf, required-ness
//! lands on the parent object, and records carrying an explicit model name
//! are registered once in the [`ResolutionContext`] and referenced from
//! every use site.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::ModelCatalog;
use crate::classify::{classify, Shape};
use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::localize::{Localizer, NoLocalization};
use crate::property::{Bound, Constraint, Property, PropertySet};
use crate::schema::{number, Schema, SchemaObject, SchemaType};
use crate::tree::{build_tree, SerializationNode};
use crate::types::{
    Direction, RecordSource, RecordType, ScalarType, TemporalKind, TypeDescriptor,
};

static NO_LOCALIZATION: NoLocalization = NoLocalization;

/// Resolves types against a catalog, registering named schemas in a context.
pub struct Resolver<'a> {
    catalog: &'a ModelCatalog,
    localizer: &'a dyn Localizer,
    context: &'a mut ResolutionContext,
    expanding: Vec<Expansion>,
}

/// A property set currently being expanded.
struct Expansion {
    label: String,
    /// Declared sets can refer back to themselves; inline ones cannot.
    declared: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a ModelCatalog, context: &'a mut ResolutionContext) -> Self {
        Self {
            catalog,
            localizer: &NO_LOCALIZATION,
            context,
            expanding: Vec::new(),
        }
    }

    /// Use `localizer` to turn property localization keys into titles.
    pub fn with_localizer(mut self, localizer: &'a dyn Localizer) -> Self {
        self.localizer = localizer;
        self
    }

    /// Resolve a value type for the given direction.
    ///
    /// When `explicit_name` is given and the type is (or holds) a record, the
    /// record is registered under that name and a reference is returned.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` for unknown or ambiguous property set
    /// references and for cycles. Unrecognized types never error.
    pub fn resolve_type(
        &mut self,
        ty: &TypeDescriptor,
        direction: Direction,
        explicit_name: Option<&str>,
    ) -> Result<Schema, ResolveError> {
        self.resolve_value(ty, direction, explicit_name)
    }

    /// Resolve a property set directly.
    pub fn resolve_property_set(
        &mut self,
        set: &Arc<PropertySet>,
        direction: Direction,
        explicit_name: Option<&str>,
    ) -> Result<Schema, ResolveError> {
        let record = RecordType {
            source: RecordSource::Inline(Arc::clone(set)),
            model: None,
        };
        self.resolve_record(&record, direction, explicit_name)
    }

    /// Resolve serialization nodes into an object schema.
    pub fn resolve_tree(
        &mut self,
        nodes: &[SerializationNode<'_>],
        direction: Direction,
    ) -> Result<SchemaObject, ResolveError> {
        let mut object = SchemaObject::object();

        for node in nodes {
            match node {
                SerializationNode::Leaf { name, property } => {
                    if property.is_read_only() && !direction.includes_read_only() {
                        continue;
                    }
                    let schema = self.resolve_property(property, direction)?;
                    object.properties.insert(name.as_str(), schema);
                    if property.is_required() {
                        object.mark_required(name);
                    }
                }
                SerializationNode::Group { name, children } => {
                    let nested = self.resolve_tree(children, direction)?;
                    // Every child filtered out for this direction.
                    if nested.properties.is_empty() {
                        continue;
                    }
                    object.properties.insert(name.as_str(), Schema::inline(nested));
                }
            }
        }

        Ok(object)
    }

    // --- Internal implementation ---

    fn resolve_value(
        &mut self,
        ty: &TypeDescriptor,
        direction: Direction,
        model: Option<&str>,
    ) -> Result<Schema, ResolveError> {
        let class = classify(ty);
        match class.shape {
            Shape::Scalar(scalar) => Ok(Schema::inline(scalar_schema(scalar))),
            Shape::Opaque(opaque) => {
                warn!(ty = %opaque, "unrecognized type, describing as untyped object");
                Ok(Schema::inline(SchemaObject::untyped()))
            }
            Shape::Record(record) => self.resolve_record(record, direction, model),
            Shape::Array(element) => {
                let items = self.resolve_value(element, direction, model)?;
                Ok(Schema::inline(SchemaObject::array(items, false)))
            }
            Shape::Set(element) => {
                let items = self.resolve_value(element, direction, model)?;
                Ok(Schema::inline(SchemaObject::array(items, true)))
            }
            Shape::Map(value) => {
                let value = self.resolve_value(value, direction, model)?;
                Ok(Schema::inline(SchemaObject::map(value)))
            }
        }
    }

    fn resolve_record(
        &mut self,
        record: &RecordType,
        direction: Direction,
        model: Option<&str>,
    ) -> Result<Schema, ResolveError> {
        let model = model.or(record.model.as_deref());

        // A defined name short-circuits before any catalog lookup.
        if let Some(name) = model {
            if self.context.is_defined(name) {
                match self.context.defined_direction(name) {
                    Some(first) if first != direction => warn!(
                        name,
                        resolved_for = ?first,
                        used_for = ?direction,
                        "reusing named schema resolved for the other direction"
                    ),
                    _ => debug!(name, "reusing named schema"),
                }
                return Ok(self.context.reference(name));
            }
        }

        let set = match &record.source {
            RecordSource::Inline(set) => Arc::clone(set),
            RecordSource::Declared(name) => {
                let declaration = self.declaration_site(name);
                self.catalog.lookup(name, &declaration)?
            }
        };

        match model {
            Some(name) => self.resolve_named(name, &set, direction),
            None => {
                let declared = matches!(record.source, RecordSource::Declared(_));
                let object = self.expand(record.label(), declared, &set, direction)?;
                Ok(Schema::inline(object))
            }
        }
    }

    fn resolve_named(
        &mut self,
        name: &str,
        set: &PropertySet,
        direction: Direction,
    ) -> Result<Schema, ResolveError> {
        self.context.begin(name)?;
        // Named cycles are caught by the context.
        let expanded = self.expand(name.to_string(), false, set, direction);
        self.context.finish(name);

        let mut object = expanded?;
        if let Some(title) = set.title() {
            object.title = Some(title.to_string());
        }
        if let Some(description) = set.description() {
            object.description = Some(description.to_string());
        }

        self.context.define_for(name, direction, Schema::inline(object));
        Ok(self.context.reference(name))
    }

    fn expand(
        &mut self,
        label: String,
        declared: bool,
        set: &PropertySet,
        direction: Direction,
    ) -> Result<SchemaObject, ResolveError> {
        if declared {
            if let Some(start) = self
                .expanding
                .iter()
                .position(|e| e.declared && e.label == label)
            {
                let mut chain: Vec<String> = self.expanding[start..]
                    .iter()
                    .map(|e| e.label.clone())
                    .collect();
                chain.push(label);
                return Err(ResolveError::RecordCycle { chain });
            }
        }

        self.expanding.push(Expansion { label, declared });
        // Rebuilt every time; trees are never cached.
        let tree = build_tree(set);
        let result = self.resolve_tree(&tree, direction);
        self.expanding.pop();
        result
    }

    fn resolve_property(
        &mut self,
        property: &Property,
        direction: Direction,
    ) -> Result<Schema, ResolveError> {
        let ty = property.value_type();
        let class = classify(ty);

        let mut schema = match class.element() {
            Some(element) => {
                let mut items = self.resolve_value(element, direction, None)?;
                // Size constraints bound the collection, never its elements.
                let element_constraints: Vec<Constraint> = property
                    .constraints()
                    .iter()
                    .filter(|c| !c.is_size())
                    .cloned()
                    .collect();
                if let Some(object) = items.as_object_mut() {
                    apply_value_constraints(object, &element_constraints);
                }
                let mut wrapper = match class.shape {
                    Shape::Map(_) => SchemaObject::map(items),
                    Shape::Set(_) => SchemaObject::array(items, true),
                    _ => SchemaObject::array(items, false),
                };
                apply_size_constraints(&mut wrapper, property.constraints());
                Schema::inline(wrapper)
            }
            None => {
                let mut schema = self.resolve_value(ty, direction, None)?;
                if let Some(object) = schema.as_object_mut() {
                    apply_value_constraints(object, property.constraints());
                }
                schema
            }
        };

        if let Some(object) = schema.as_object_mut() {
            if property.is_read_only() {
                object.read_only = true;
            }
            if let Some(title) = self.title_for(property) {
                object.title = Some(title);
            }
            if let Some(description) = property.description_text() {
                object.description = Some(description.to_string());
            }
        }

        Ok(schema)
    }

    fn title_for(&self, property: &Property) -> Option<String> {
        property
            .localization_key()
            .and_then(|key| self.localizer.localize(key))
            .or_else(|| property.default_title().map(String::from))
    }

    fn declaration_site(&self, name: &str) -> String {
        match self.expanding.last() {
            Some(parent) => format!("a property of {}", parent.label),
            None => format!("record:{}", name),
        }
    }
}

/// Base schema for a scalar, temporal or enumerated type.
fn scalar_schema(ty: &TypeDescriptor) -> SchemaObject {
    match ty {
        TypeDescriptor::Scalar(scalar) => match scalar {
            ScalarType::String => SchemaObject::of_type(SchemaType::String),
            ScalarType::Int32 => SchemaObject::with_format(SchemaType::Integer, "int32"),
            ScalarType::Int64 => SchemaObject::with_format(SchemaType::Integer, "int64"),
            ScalarType::Float => SchemaObject::with_format(SchemaType::Number, "float"),
            ScalarType::Double => SchemaObject::with_format(SchemaType::Number, "double"),
            ScalarType::Decimal => SchemaObject::of_type(SchemaType::Number),
            ScalarType::Boolean => SchemaObject::of_type(SchemaType::Boolean),
            ScalarType::Uuid => SchemaObject::with_format(SchemaType::String, "uuid"),
            ScalarType::Bytes => SchemaObject::with_format(SchemaType::String, "byte"),
        },
        TypeDescriptor::Temporal(kind) => {
            let mut object = SchemaObject::default();
            apply_temporal_format(&mut object, *kind);
            object
        }
        TypeDescriptor::Enum(values) => SchemaObject {
            enum_values: values.clone(),
            ..SchemaObject::of_type(SchemaType::String)
        },
        _ => SchemaObject::untyped(),
    }
}

/// Temporal values are strings; structural keywords never apply to them.
fn apply_temporal_format(object: &mut SchemaObject, kind: TemporalKind) {
    object.schema_type = Some(SchemaType::String);
    object.format = Some(kind.format().to_string());
    if kind == TemporalKind::Time {
        object.properties.clear();
        object.required.clear();
    }
}

/// Translate constraints that describe the value itself.
fn apply_value_constraints(object: &mut SchemaObject, constraints: &[Constraint]) {
    let numeric = matches!(
        object.schema_type,
        Some(SchemaType::Integer) | Some(SchemaType::Number)
    );
    let string = object.schema_type == Some(SchemaType::String);
    let mut lower: Option<Bound> = None;
    let mut upper: Option<Bound> = None;

    for constraint in constraints {
        match constraint {
            Constraint::Min(bound) if numeric => {
                if tighter_lower(bound, lower.as_ref()) {
                    object.minimum = number(bound.value);
                    object.exclusive_minimum = bound.exclusive;
                    lower = Some(*bound);
                }
            }
            Constraint::Max(bound) if numeric => {
                if tighter_upper(bound, upper.as_ref()) {
                    object.maximum = number(bound.value);
                    object.exclusive_maximum = bound.exclusive;
                    upper = Some(*bound);
                }
            }
            Constraint::Min(bound) if string => raise(&mut object.min_length, bound.lower_count()),
            Constraint::Max(bound) if string => lower_to(&mut object.max_length, bound.upper_count()),
            Constraint::NotEmpty if string => raise(&mut object.min_length, 1),
            Constraint::Pattern { regex } if string => object.pattern = Some(regex.clone()),
            Constraint::Email if string => object.format = Some("email".to_string()),
            _ => {}
        }
    }
}

/// Translate cardinality constraints onto a collection wrapper.
fn apply_size_constraints(wrapper: &mut SchemaObject, constraints: &[Constraint]) {
    let is_map = wrapper.is_map();
    for constraint in constraints {
        let (min, max) = if is_map {
            (&mut wrapper.min_properties, &mut wrapper.max_properties)
        } else {
            (&mut wrapper.min_items, &mut wrapper.max_items)
        };
        match constraint {
            Constraint::Min(bound) => raise(min, bound.lower_count()),
            Constraint::Max(bound) => lower_to(max, bound.upper_count()),
            Constraint::NotEmpty => raise(min, 1),
            _ => {}
        }
    }
}

// Several bounds on the same side combine to the tightest one.
fn raise(slot: &mut Option<u64>, count: u64) {
    *slot = Some(slot.map_or(count, |current| current.max(count)));
}

fn lower_to(slot: &mut Option<u64>, count: u64) {
    *slot = Some(slot.map_or(count, |current| current.min(count)));
}

fn tighter_lower(bound: &Bound, current: Option<&Bound>) -> bool {
    match current {
        None => true,
        Some(current) => {
            bound.value > current.value || (bound.value == current.value && bound.exclusive)
        }
    }
}

fn tighter_upper(bound: &Bound, current: Option<&Bound>) -> bool {
    match current {
        None => true,
        Some(current) => {
            bound.value < current.value || (bound.value == current.value && bound.exclusive)
        }
    }
}
