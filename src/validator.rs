//! Consistency checks for generated documents, and payload validation
//! against their named schemas.

use serde_json::{json, Map, Value};

use crate::document::Document;
use crate::error::{DocumentIssue, EmitError, ValidateError};
use crate::schema::{escape_pointer, Schema};
use crate::types::SpecVersion;

/// Check that a document is self-consistent.
///
/// Every `$ref` must point at a registered definition under the document's
/// layout, every `required` name must be a declared property, and each
/// definition must compile as a JSON Schema.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` listing every issue found.
pub fn validate_document(document: &Document) -> Result<(), ValidateError> {
    let mut issues = Vec::new();
    let prefix = document.spec_version().ref_prefix();

    for (base, schema) in schema_roots(document) {
        schema.walk(&base, &mut |path, schema| match schema {
            Schema::Reference(reference) => {
                if !reference.path.starts_with(prefix) {
                    issues.push(issue(
                        path,
                        format!("reference \"{}\" is outside {}", reference.path, prefix),
                    ));
                } else if !document.definitions().contains(&reference.name) {
                    issues.push(issue(
                        path,
                        format!("reference to undefined schema \"{}\"", reference.name),
                    ));
                }
            }
            Schema::Inline(object) => {
                for name in &object.required {
                    if !object.properties.contains(name) {
                        issues.push(issue(
                            path,
                            format!("required property \"{}\" is not declared", name),
                        ));
                    }
                }
            }
        });
    }

    // Compiling only makes sense once references are known to resolve.
    if issues.is_empty() {
        let definitions = serialize_definitions(document)?;
        for (name, definition) in &definitions {
            if let Err(e) = compile(document.spec_version(), definition, &definitions) {
                issues.push(issue(
                    &format!("{}/{}", document.definitions_pointer(), escape_pointer(name)),
                    format!("invalid schema: {}", e),
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { issues })
    }
}

/// Validate a payload against the named schema `name` of a document.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` if the payload doesn't match, or if the
/// document has no schema of that name.
pub fn validate_payload(
    document: &Document,
    name: &str,
    payload: &Value,
) -> Result<(), ValidateError> {
    let definitions = serialize_definitions(document)?;
    let Some(definition) = definitions.get(name) else {
        return Err(ValidateError::Invalid {
            issues: vec![issue(
                document.definitions_pointer(),
                format!("no schema named \"{}\"", name),
            )],
        });
    };

    let validator = compile(document.spec_version(), definition, &definitions).map_err(|e| {
        ValidateError::Invalid {
            issues: vec![issue(
                &format!("{}/{}", document.definitions_pointer(), escape_pointer(name)),
                format!("invalid schema: {}", e),
            )],
        }
    })?;

    let issues: Vec<DocumentIssue> = validator
        .iter_errors(payload)
        .map(|e| DocumentIssue {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { issues })
    }
}

fn issue(path: &str, message: String) -> DocumentIssue {
    DocumentIssue {
        path: path.to_string(),
        message,
    }
}

/// Every top-level schema of the document with its JSON Pointer.
fn schema_roots(document: &Document) -> Vec<(String, &Schema)> {
    let mut roots: Vec<(String, &Schema)> = document
        .definitions()
        .iter()
        .map(|(name, schema)| {
            (
                format!("{}/{}", document.definitions_pointer(), escape_pointer(name)),
                schema,
            )
        })
        .collect();

    for op in document.operations() {
        let base = format!("/paths/{}/{}", escape_pointer(&op.path), op.method);
        if let Some(schema) = &op.request_body {
            let path = match document.spec_version() {
                SpecVersion::Swagger2 => format!("{}/parameters/0/schema", base),
                SpecVersion::OpenApi3 => {
                    format!("{}/requestBody/content/application~1json/schema", base)
                }
            };
            roots.push((path, schema));
        }
        for response in &op.responses {
            if let Some(schema) = &response.schema {
                let base = format!("{}/responses/{}", base, escape_pointer(&response.status));
                let path = match document.spec_version() {
                    SpecVersion::Swagger2 => format!("{}/schema", base),
                    SpecVersion::OpenApi3 => format!("{}/content/application~1json/schema", base),
                };
                roots.push((path, schema));
            }
        }
    }
    roots
}

fn serialize_definitions(document: &Document) -> Result<Map<String, Value>, EmitError> {
    match serde_json::to_value(document.definitions()).map_err(|source| EmitError::Json { source })? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Compile `definition` with the definitions section mounted where its
/// `$ref`s point. OpenAPI schemas use boolean `exclusiveMinimum`, so draft 4
/// semantics apply.
fn compile(
    spec_version: SpecVersion,
    definition: &Value,
    definitions: &Map<String, Value>,
) -> Result<jsonschema::Validator, jsonschema::ValidationError<'static>> {
    let mut root = definition.clone();
    if let Value::Object(map) = &mut root {
        match spec_version {
            SpecVersion::Swagger2 => {
                map.insert("definitions".into(), Value::Object(definitions.clone()));
            }
            SpecVersion::OpenApi3 => {
                map.insert(
                    "components".into(),
                    json!({ "schemas": Value::Object(definitions.clone()) }),
                );
            }
        }
    }
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft4)
        .build(&root)
}
