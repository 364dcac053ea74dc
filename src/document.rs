//! In-memory API document: info, operation paths and named schema definitions.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::schema::{Schema, SchemaMap};
use crate::types::SpecVersion;

const JSON_MEDIA_TYPE: &str = "application/json";

/// `info` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One response of a resolved operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: String,
    pub description: String,
    pub schema: Option<Schema>,
}

/// A resolved operation, placed under its path and method.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub path: String,
    /// Lowercase HTTP method.
    pub method: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub request_body: Option<Schema>,
    pub responses: Vec<Response>,
}

/// The generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    spec_version: SpecVersion,
    pub info: Info,
    operations: Vec<Operation>,
    definitions: SchemaMap,
}

impl Document {
    /// An empty document stub for a resolution pass.
    pub fn new(spec_version: SpecVersion, info: Info) -> Self {
        Self {
            spec_version,
            info,
            operations: Vec::new(),
            definitions: SchemaMap::new(),
        }
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn add_operation(&mut self, mut operation: Operation) {
        operation.method = operation.method.to_lowercase();
        self.operations.push(operation);
    }

    /// Named schemas merged into the document.
    pub fn definitions(&self) -> &SchemaMap {
        &self.definitions
    }

    /// Add a named schema unless one is already present. Returns whether it was added.
    pub fn add_definition(&mut self, name: &str, schema: Schema) -> bool {
        if self.definitions.contains(name) {
            return false;
        }
        self.definitions.insert(name, schema);
        true
    }

    /// JSON Pointer of the definitions section (`/definitions` or `/components/schemas`).
    pub fn definitions_pointer(&self) -> &'static str {
        match self.spec_version {
            SpecVersion::Swagger2 => "/definitions",
            SpecVersion::OpenApi3 => "/components/schemas",
        }
    }

    /// Operations grouped by path, in first-occurrence order.
    fn paths(&self) -> Vec<(&str, Vec<&Operation>)> {
        let mut paths: Vec<(&str, Vec<&Operation>)> = Vec::new();
        for op in &self.operations {
            match paths.iter_mut().find(|(p, _)| *p == op.path) {
                Some((_, ops)) => ops.push(op),
                None => paths.push((op.path.as_str(), vec![op])),
            }
        }
        paths
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self.spec_version {
            SpecVersion::Swagger2 => map.serialize_entry("swagger", "2.0")?,
            SpecVersion::OpenApi3 => map.serialize_entry("openapi", "3.0.3")?,
        }
        map.serialize_entry("info", &self.info)?;
        map.serialize_entry(
            "paths",
            &PathsView {
                version: self.spec_version,
                paths: self.paths(),
            },
        )?;
        if !self.definitions.is_empty() {
            match self.spec_version {
                SpecVersion::Swagger2 => map.serialize_entry("definitions", &self.definitions)?,
                SpecVersion::OpenApi3 => map.serialize_entry(
                    "components",
                    &Components {
                        schemas: &self.definitions,
                    },
                )?,
            }
        }
        map.end()
    }
}

// --- Serialization views ---

#[derive(Serialize)]
struct Components<'a> {
    schemas: &'a SchemaMap,
}

struct PathsView<'a> {
    version: SpecVersion,
    paths: Vec<(&'a str, Vec<&'a Operation>)>,
}

impl Serialize for PathsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.paths.len()))?;
        for (path, ops) in &self.paths {
            let methods: Vec<(&str, OperationView<'_>)> = ops
                .iter()
                .map(|&op| {
                    (
                        op.method.as_str(),
                        OperationView {
                            version: self.version,
                            op,
                        },
                    )
                })
                .collect();
            map.serialize_entry(path, &MethodsView(methods))?;
        }
        map.end()
    }
}

struct MethodsView<'a>(Vec<(&'a str, OperationView<'a>)>);

impl Serialize for MethodsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(m, op)| (m, op)))
    }
}

struct OperationView<'a> {
    version: SpecVersion,
    op: &'a Operation,
}

#[derive(Serialize)]
struct BodyParameter<'a> {
    #[serde(rename = "in")]
    location: &'static str,
    name: &'static str,
    required: bool,
    schema: &'a Schema,
}

#[derive(Serialize)]
struct MediaType<'a> {
    schema: &'a Schema,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "application/json")]
    json: MediaType<'a>,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    required: bool,
    content: Content<'a>,
}

#[derive(Serialize)]
struct SwaggerResponse<'a> {
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a Schema>,
}

#[derive(Serialize)]
struct OpenApiResponse<'a> {
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Content<'a>>,
}

impl Serialize for OperationView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let op = self.op;
        let mut map = serializer.serialize_map(None)?;
        if let Some(id) = &op.operation_id {
            map.serialize_entry("operationId", id)?;
        }
        if let Some(summary) = &op.summary {
            map.serialize_entry("summary", summary)?;
        }

        match self.version {
            SpecVersion::Swagger2 => {
                if let Some(body) = &op.request_body {
                    map.serialize_entry("consumes", &[JSON_MEDIA_TYPE])?;
                    map.serialize_entry(
                        "parameters",
                        &[BodyParameter {
                            location: "body",
                            name: "body",
                            required: true,
                            schema: body,
                        }],
                    )?;
                }
                if op.responses.iter().any(|r| r.schema.is_some()) {
                    map.serialize_entry("produces", &[JSON_MEDIA_TYPE])?;
                }
                let responses: Vec<(&str, SwaggerResponse<'_>)> = op
                    .responses
                    .iter()
                    .map(|r| {
                        (
                            r.status.as_str(),
                            SwaggerResponse {
                                description: &r.description,
                                schema: r.schema.as_ref(),
                            },
                        )
                    })
                    .collect();
                map.serialize_entry("responses", &ResponsesView(responses))?;
            }
            SpecVersion::OpenApi3 => {
                if let Some(body) = &op.request_body {
                    map.serialize_entry(
                        "requestBody",
                        &RequestBody {
                            required: true,
                            content: Content {
                                json: MediaType { schema: body },
                            },
                        },
                    )?;
                }
                let responses: Vec<(&str, OpenApiResponse<'_>)> = op
                    .responses
                    .iter()
                    .map(|r| {
                        (
                            r.status.as_str(),
                            OpenApiResponse {
                                description: &r.description,
                                content: r.schema.as_ref().map(|schema| Content {
                                    json: MediaType { schema },
                                }),
                            },
                        )
                    })
                    .collect();
                map.serialize_entry("responses", &ResponsesView(responses))?;
            }
        }
        map.end()
    }
}

struct ResponsesView<'a, T>(Vec<(&'a str, T)>);

impl<T: Serialize> Serialize for ResponsesView<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(status, r)| (status, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaObject, SchemaType};
    use serde_json::json;

    fn info() -> Info {
        Info {
            title: "Shop".into(),
            version: "1.0".into(),
            description: None,
        }
    }

    fn create_customer() -> Operation {
        Operation {
            path: "/customers".into(),
            method: "POST".into(),
            operation_id: Some("createCustomer".into()),
            summary: None,
            request_body: Some(Schema::reference("Customer", "#/definitions/")),
            responses: vec![Response {
                status: "201".into(),
                description: "Created".into(),
                schema: None,
            }],
        }
    }

    #[test]
    fn swagger2_layout() {
        let mut doc = Document::new(SpecVersion::Swagger2, info());
        doc.add_operation(create_customer());
        doc.add_definition("Customer", Schema::inline(SchemaObject::object()));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["swagger"], json!("2.0"));
        assert_eq!(
            value["paths"]["/customers"]["post"]["parameters"][0],
            json!({
                "in": "body",
                "name": "body",
                "required": true,
                "schema": { "$ref": "#/definitions/Customer" }
            })
        );
        assert_eq!(
            value["paths"]["/customers"]["post"]["responses"]["201"],
            json!({ "description": "Created" })
        );
        assert_eq!(value["definitions"]["Customer"], json!({ "type": "object" }));
    }

    #[test]
    fn openapi3_layout() {
        let mut doc = Document::new(SpecVersion::OpenApi3, info());
        doc.add_operation(Operation {
            path: "/customers".into(),
            method: "get".into(),
            operation_id: None,
            summary: Some("List customers".into()),
            request_body: None,
            responses: vec![Response {
                status: "200".into(),
                description: "OK".into(),
                schema: Some(Schema::inline(SchemaObject::of_type(SchemaType::String))),
            }],
        });
        doc.add_definition("Customer", Schema::inline(SchemaObject::object()));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["openapi"], json!("3.0.3"));
        assert_eq!(
            value["paths"]["/customers"]["get"],
            json!({
                "summary": "List customers",
                "responses": {
                    "200": {
                        "description": "OK",
                        "content": { "application/json": { "schema": { "type": "string" } } }
                    }
                }
            })
        );
        assert_eq!(
            value["components"]["schemas"]["Customer"],
            json!({ "type": "object" })
        );
    }

    #[test]
    fn add_definition_skips_existing() {
        let mut doc = Document::new(SpecVersion::OpenApi3, info());
        assert!(doc.add_definition("A", Schema::inline(SchemaObject::object())));
        assert!(!doc.add_definition(
            "A",
            Schema::inline(SchemaObject::of_type(SchemaType::String))
        ));
        assert_eq!(doc.definitions().len(), 1);
    }

    #[test]
    fn operations_group_by_path() {
        let mut doc = Document::new(SpecVersion::Swagger2, info());
        doc.add_operation(create_customer());
        let mut get = create_customer();
        get.method = "GET".into();
        get.request_body = None;
        doc.add_operation(get);

        let value = serde_json::to_value(&doc).unwrap();
        let methods: Vec<&String> = value["paths"]["/customers"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(methods, vec!["post", "get"]);
    }
}
