//! Core types for property set schema resolution.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::property::PropertySet;

/// Direction of the schema being resolved.
///
/// Read-only properties only appear in response schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Whether read-only properties belong in schemas of this direction.
    pub fn includes_read_only(&self) -> bool {
        matches!(self, Direction::Response)
    }

    /// Create direction from a request flag (true = Request, false = Response).
    pub fn from_request_flag(is_request: bool) -> Self {
        if is_request {
            Direction::Request
        } else {
            Direction::Response
        }
    }
}

/// Scalar value types with a fixed schema mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    Boolean,
    Uuid,
    Bytes,
}

/// Temporal value types, all rendered as formatted strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
}

impl TemporalKind {
    /// The string `format` this temporal kind maps to.
    pub fn format(&self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::DateTime => "date-time",
            TemporalKind::Time => "time",
        }
    }
}

/// Where the property set of a record-typed value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSource {
    /// The property set itself, expanded in place.
    Inline(Arc<PropertySet>),
    /// A property set declared by name in the model catalog.
    Declared(String),
}

/// A record-typed value, optionally carrying the model name to publish it under.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub source: RecordSource,
    /// Explicit model name: when present the record becomes a named schema
    /// and use sites receive a reference.
    pub model: Option<String>,
}

impl RecordType {
    /// Human-readable identity of the record, used in errors and cycle chains.
    pub fn label(&self) -> String {
        match &self.source {
            RecordSource::Inline(set) => set.name().unwrap_or("<inline>").to_string(),
            RecordSource::Declared(name) => name.clone(),
        }
    }
}

/// Value kind of a property: a closed variant resolved once at model construction.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarType),
    Temporal(TemporalKind),
    /// String restricted to a fixed set of values.
    Enum(Vec<String>),
    Record(RecordType),
    Optional(Box<TypeDescriptor>),
    Array(Box<TypeDescriptor>),
    /// Array with unique items.
    Set(Box<TypeDescriptor>),
    /// String-keyed map; the descriptor is the value type.
    Map(Box<TypeDescriptor>),
    /// A type nothing knows how to describe.
    Opaque(String),
}

impl TypeDescriptor {
    pub fn string() -> Self {
        TypeDescriptor::Scalar(ScalarType::String)
    }

    pub fn int32() -> Self {
        TypeDescriptor::Scalar(ScalarType::Int32)
    }

    pub fn int64() -> Self {
        TypeDescriptor::Scalar(ScalarType::Int64)
    }

    pub fn boolean() -> Self {
        TypeDescriptor::Scalar(ScalarType::Boolean)
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn set(element: TypeDescriptor) -> Self {
        TypeDescriptor::Set(Box::new(element))
    }

    pub fn map(value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(value))
    }

    /// A record expanded from the given property set.
    pub fn record(set: impl Into<Arc<PropertySet>>) -> Self {
        TypeDescriptor::Record(RecordType {
            source: RecordSource::Inline(set.into()),
            model: None,
        })
    }

    /// A record whose property set is declared by name in the catalog.
    pub fn declared(name: impl Into<String>) -> Self {
        TypeDescriptor::Record(RecordType {
            source: RecordSource::Declared(name.into()),
            model: None,
        })
    }

    /// Attach an explicit model name to a record type. No-op for other kinds.
    pub fn with_model(self, model: impl Into<String>) -> Self {
        match self {
            TypeDescriptor::Record(record) => TypeDescriptor::Record(RecordType {
                model: Some(model.into()),
                ..record
            }),
            other => other,
        }
    }

    /// Parse a type expression such as `list<record:Address>` or `optional<date>`.
    ///
    /// Never fails: anything unrecognized becomes [`TypeDescriptor::Opaque`].
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim();

        if let Some(record) = expr.strip_prefix("record:") {
            let (name, model) = match record.split_once('@') {
                Some((name, model)) => (name.trim(), Some(model.trim())),
                None => (record.trim(), None),
            };
            if name.is_empty() {
                return TypeDescriptor::Opaque(expr.to_string());
            }
            let declared = TypeDescriptor::declared(name);
            return match model {
                Some(model) if !model.is_empty() => declared.with_model(model),
                _ => declared,
            };
        }

        if let Some(values) = expr
            .strip_prefix("enum(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let values: Vec<String> = values
                .split('|')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            return TypeDescriptor::Enum(values);
        }

        if let Some((head, inner)) = expr
            .strip_suffix('>')
            .and_then(|rest| rest.split_once('<'))
        {
            let inner = TypeDescriptor::parse(inner);
            return match head.trim() {
                "list" | "array" => TypeDescriptor::array(inner),
                "set" => TypeDescriptor::set(inner),
                "map" => TypeDescriptor::map(inner),
                "optional" => TypeDescriptor::optional(inner),
                _ => TypeDescriptor::Opaque(expr.to_string()),
            };
        }

        match expr {
            "string" => TypeDescriptor::Scalar(ScalarType::String),
            "int" | "int32" | "integer" => TypeDescriptor::Scalar(ScalarType::Int32),
            "long" | "int64" => TypeDescriptor::Scalar(ScalarType::Int64),
            "float" => TypeDescriptor::Scalar(ScalarType::Float),
            "double" => TypeDescriptor::Scalar(ScalarType::Double),
            "decimal" | "number" => TypeDescriptor::Scalar(ScalarType::Decimal),
            "boolean" | "bool" => TypeDescriptor::Scalar(ScalarType::Boolean),
            "uuid" => TypeDescriptor::Scalar(ScalarType::Uuid),
            "bytes" | "binary" => TypeDescriptor::Scalar(ScalarType::Bytes),
            "date" => TypeDescriptor::Temporal(TemporalKind::Date),
            "date-time" | "datetime" => TypeDescriptor::Temporal(TemporalKind::DateTime),
            "time" => TypeDescriptor::Temporal(TemporalKind::Time),
            other => TypeDescriptor::Opaque(other.to_string()),
        }
    }

    /// Visit this descriptor and every descriptor nested inside it.
    ///
    /// Does not descend into inline property sets.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TypeDescriptor)) {
        visit(self);
        match self {
            TypeDescriptor::Optional(inner)
            | TypeDescriptor::Array(inner)
            | TypeDescriptor::Set(inner)
            | TypeDescriptor::Map(inner) => inner.walk(visit),
            _ => {}
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(scalar) => {
                let name = match scalar {
                    ScalarType::String => "string",
                    ScalarType::Int32 => "int32",
                    ScalarType::Int64 => "int64",
                    ScalarType::Float => "float",
                    ScalarType::Double => "double",
                    ScalarType::Decimal => "decimal",
                    ScalarType::Boolean => "boolean",
                    ScalarType::Uuid => "uuid",
                    ScalarType::Bytes => "bytes",
                };
                f.write_str(name)
            }
            TypeDescriptor::Temporal(kind) => f.write_str(kind.format()),
            TypeDescriptor::Enum(values) => write!(f, "enum({})", values.join("|")),
            TypeDescriptor::Record(record) => {
                write!(f, "record:{}", record.label())?;
                if let Some(model) = &record.model {
                    write!(f, "@{}", model)?;
                }
                Ok(())
            }
            TypeDescriptor::Optional(inner) => write!(f, "optional<{}>", inner),
            TypeDescriptor::Array(inner) => write!(f, "list<{}>", inner),
            TypeDescriptor::Set(inner) => write!(f, "set<{}>", inner),
            TypeDescriptor::Map(inner) => write!(f, "map<{}>", inner),
            TypeDescriptor::Opaque(name) => f.write_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let expr = String::deserialize(deserializer)?;
        Ok(TypeDescriptor::parse(&expr))
    }
}

/// Layout of the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecVersion {
    /// Swagger 2.0: named schemas under `definitions`.
    Swagger2,
    /// OpenAPI 3.0: named schemas under `components/schemas`.
    #[default]
    OpenApi3,
}

impl SpecVersion {
    /// Parse a version from a CLI-style string (`v2`, `2.0`, `v3`, `3.0`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "v2" | "2" | "2.0" | "swagger" => Some(SpecVersion::Swagger2),
            "v3" | "3" | "3.0" | "openapi" => Some(SpecVersion::OpenApi3),
            _ => None,
        }
    }

    /// JSON Pointer prefix under which named schemas live.
    pub fn ref_prefix(&self) -> &'static str {
        match self {
            SpecVersion::Swagger2 => "#/definitions/",
            SpecVersion::OpenApi3 => "#/components/schemas/",
        }
    }
}

/// Options for document generation.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub spec_version: SpecVersion,
    /// Document title (`info.title`).
    pub title: String,
    /// API version (`info.version`).
    pub version: String,
    pub description: Option<String>,
    /// When true, operations whose types reference unknown or ambiguous
    /// property sets are left out instead of failing the pass.
    pub skip_unresolved: bool,
}

impl ResolveOptions {
    /// Create options for the given layout with a placeholder title and version.
    pub fn new(spec_version: SpecVersion) -> Self {
        Self {
            spec_version,
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            skip_unresolved: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn skip_unresolved(mut self, skip: bool) -> Self {
        self.skip_unresolved = skip;
        self
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::new(SpecVersion::default())
    }
}
