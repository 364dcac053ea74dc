//! PropertySet Schema Engine
//!
//! Derives JSON Schema / OpenAPI schema objects from declarative property
//! sets, and assembles them into Swagger 2.0 or OpenAPI 3.0 documents.
//!
//! A property set describes the fields of a model: their value types,
//! validation constraints, read-only flags and localized titles. Property
//! names may be dotted (`address.city`), in which case the serialized form
//! nests them under a group object.
//!
//! # Example
//!
//! ```
//! use propertyset_schema::{
//!     Constraint, Direction, Document, Info, ModelCatalog, Property, PropertySet,
//!     ResolutionContext, Resolver, SpecVersion, TypeDescriptor,
//! };
//! use serde_json::json;
//!
//! let mut catalog = ModelCatalog::new();
//! catalog
//!     .declare(
//!         PropertySet::named(
//!             "Customer",
//!             vec![
//!                 Property::new("id", TypeDescriptor::int64()).read_only(true),
//!                 Property::new("email", TypeDescriptor::string())
//!                     .constraint(Constraint::Required)
//!                     .constraint(Constraint::Email),
//!                 Property::new("address.city", TypeDescriptor::string()),
//!             ],
//!         )
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! let info = Info { title: "Shop".into(), version: "1".into(), description: None };
//! let mut context = ResolutionContext::open(Document::new(SpecVersion::OpenApi3, info));
//! let schema = Resolver::new(&catalog, &mut context)
//!     .resolve_type(&TypeDescriptor::declared("Customer"), Direction::Request, None)
//!     .unwrap();
//!
//! // Read-only fields are left out of request schemas
//! let schema = serde_json::to_value(&schema).unwrap();
//! assert!(schema["properties"].get("id").is_none());
//! assert_eq!(schema["required"], json!(["email"]));
//! assert_eq!(schema["properties"]["address"]["properties"]["city"]["type"], "string");
//! ```
//!
//! # Type mapping
//!
//! | Value type | Schema |
//! |------------|--------|
//! | `string`, `uuid`, `bytes` | `string` (with `format` where one applies) |
//! | `int32`, `int64` | `integer` |
//! | `float`, `double`, `decimal` | `number` |
//! | `date`, `date-time`, `time` | `string` with the matching `format` |
//! | `enum(A\|B)` | `string` with `enum` |
//! | `list<T>`, `set<T>` | `array` (`uniqueItems` for sets) |
//! | `map<T>` | `object` with `additionalProperties` |
//! | `record:Name` | nested `object`, or a `$ref` when a model name is given |

mod ambient;
mod assembler;
mod catalog;
mod classify;
mod context;
mod document;
mod emit;
mod error;
mod linter;
mod loader;
mod localize;
mod property;
mod resolver;
mod schema;
mod tree;
mod types;
mod validator;

pub use ambient::{attach, is_attached, with_current, AttachedContext};
pub use assembler::{
    ApiDefinition, ApiOperation, ApiResponse, DocumentAssembler, DocumentCache, TypeUsage,
};
pub use catalog::ModelCatalog;
pub use classify::{classify, Classification, Shape};
pub use context::ResolutionContext;
pub use document::{Document, Info, Operation, Response};
pub use emit::{emit, Format};
pub use error::{DocumentIssue, EmitError, ModelError, ResolveError, ValidateError};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    is_url, load_model, load_model_auto, load_model_str, parse_model_file, parse_model_json,
    parse_model_yaml, Model, ModelFile, PropertyDecl, PropertySetDecl,
};
pub use localize::{Localizer, MessageCatalog, NoLocalization};
pub use property::{Bound, Constraint, Property, PropertySet};
pub use resolver::Resolver;
pub use schema::{Reference, Schema, SchemaMap, SchemaObject, SchemaType};
pub use tree::{build_tree, SerializationNode};
pub use types::{
    Direction, RecordSource, RecordType, ResolveOptions, ScalarType, SpecVersion, TemporalKind,
    TypeDescriptor,
};
pub use validator::{validate_document, validate_payload};

/// Resolve a type against the context attached to the current thread.
pub use ambient::resolve_type as resolve_attached;

#[cfg(feature = "remote")]
pub use loader::load_model_url;
