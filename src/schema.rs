//! Output schema model, serializable as a JSON Schema / OpenAPI Schema Object.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Number;

/// JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
}

/// A schema: either described inline or a reference to a named schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Reference(Reference),
    Inline(Box<SchemaObject>),
}

/// Reference to a schema registered under `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    /// JSON Pointer rendered as `$ref`, e.g. `#/components/schemas/Customer`.
    pub path: String,
}

impl Schema {
    pub fn inline(object: SchemaObject) -> Self {
        Schema::Inline(Box::new(object))
    }

    pub fn reference(name: impl Into<String>, prefix: &str) -> Self {
        let name = name.into();
        Schema::Reference(Reference {
            path: format!("{}{}", prefix, name),
            name,
        })
    }

    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Inline(object) => Some(object),
            Schema::Reference(_) => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut SchemaObject> {
        match self {
            Schema::Inline(object) => Some(object),
            Schema::Reference(_) => None,
        }
    }

    /// Name of the referenced schema, if this is a reference.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Schema::Reference(reference) => Some(&reference.name),
            Schema::Inline(_) => None,
        }
    }

    /// Visit every schema nested in this one (including itself) with its
    /// JSON Pointer relative to `base`.
    pub fn walk<'a>(&'a self, base: &str, visit: &mut impl FnMut(&str, &'a Schema)) {
        visit(base, self);
        let Some(object) = self.as_object() else {
            return;
        };
        for (name, child) in object.properties.iter() {
            child.walk(&format!("{}/properties/{}", base, escape_pointer(name)), visit);
        }
        if let Some(items) = &object.items {
            items.walk(&format!("{}/items", base), visit);
        }
        if let Some(value) = &object.additional_properties {
            value.walk(&format!("{}/additionalProperties", base), visit);
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Schema::Reference(reference) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", &reference.path)?;
                map.end()
            }
            Schema::Inline(object) => object.serialize(serializer),
        }
    }
}

/// Escape a name for use as a JSON Pointer segment.
pub fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Ordered name → schema map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMap(Vec<(String, Schema)>);

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Keep the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl Serialize for SchemaMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(n, s)| (n, s)))
    }
}

/// An inline schema description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "SchemaMap::is_empty")]
    pub properties: SchemaMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SchemaObject {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// An object schema with no properties yet.
    pub fn object() -> Self {
        Self::of_type(SchemaType::Object)
    }

    /// Untyped fallback for values that cannot be described.
    pub fn untyped() -> Self {
        Self::object()
    }

    pub fn with_format(schema_type: SchemaType, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::of_type(schema_type)
        }
    }

    pub fn array(items: Schema, unique: bool) -> Self {
        Self {
            items: Some(Box::new(items)),
            unique_items: unique,
            ..Self::of_type(SchemaType::Array)
        }
    }

    pub fn map(value: Schema) -> Self {
        Self {
            additional_properties: Some(Box::new(value)),
            ..Self::of_type(SchemaType::Object)
        }
    }

    /// Add `name` to `required`. Ignored unless `name` is one of this
    /// schema's own properties.
    pub fn mark_required(&mut self, name: &str) -> bool {
        if !self.properties.contains(name) || self.required.iter().any(|r| r == name) {
            return false;
        }
        self.required.push(name.to_string());
        true
    }

    pub fn is_map(&self) -> bool {
        self.additional_properties.is_some()
    }
}

/// Convert a bound value to a JSON number, keeping integral values integral.
pub fn number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_serializes_as_ref() {
        let schema = Schema::reference("Customer", "#/definitions/");
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "$ref": "#/definitions/Customer" })
        );
        assert_eq!(schema.reference_name(), Some("Customer"));
    }

    #[test]
    fn object_serializes_in_order() {
        let mut object = SchemaObject::object();
        object
            .properties
            .insert("name", Schema::inline(SchemaObject::of_type(SchemaType::String)));
        object
            .properties
            .insert("id", Schema::inline(SchemaObject::of_type(SchemaType::Integer)));
        let text = serde_json::to_string(&Schema::inline(object)).unwrap();
        assert_eq!(
            text,
            r#"{"type":"object","properties":{"name":{"type":"string"},"id":{"type":"integer"}}}"#
        );
    }

    #[test]
    fn mark_required_only_for_own_properties() {
        let mut object = SchemaObject::object();
        object
            .properties
            .insert("email", Schema::inline(SchemaObject::of_type(SchemaType::String)));
        assert!(object.mark_required("email"));
        assert!(!object.mark_required("email"));
        assert!(!object.mark_required("missing"));
        assert_eq!(object.required, vec!["email".to_string()]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = SchemaMap::new();
        map.insert("a", Schema::inline(SchemaObject::object()));
        map.insert("b", Schema::inline(SchemaObject::object()));
        map.insert("a", Schema::inline(SchemaObject::of_type(SchemaType::String)));
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            map.get("a").and_then(Schema::as_object).and_then(|o| o.schema_type),
            Some(SchemaType::String)
        );
    }

    #[test]
    fn number_keeps_integers_integral() {
        assert_eq!(json!(number(5.0)), json!(5));
        assert_eq!(json!(number(2.5)), json!(2.5));
        assert_eq!(number(f64::NAN), None);
    }

    #[test]
    fn walk_reports_pointers() {
        let mut object = SchemaObject::object();
        object.properties.insert(
            "tags",
            Schema::inline(SchemaObject::array(
                Schema::reference("Tag", "#/definitions/"),
                true,
            )),
        );
        let schema = Schema::inline(object);
        let mut refs = Vec::new();
        schema.walk("/definitions/Post", &mut |path, s| {
            if let Some(name) = s.reference_name() {
                refs.push((path.to_string(), name.to_string()));
            }
        });
        assert_eq!(
            refs,
            vec![(
                "/definitions/Post/properties/tags/items".to_string(),
                "Tag".to_string()
            )]
        );
    }
}
