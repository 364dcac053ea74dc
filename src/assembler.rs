//! Document assembly: one resolution pass per API context.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::ambient;
use crate::catalog::ModelCatalog;
use crate::context::ResolutionContext;
use crate::document::{Document, Info, Operation, Response};
use crate::error::ResolveError;
use crate::localize::{Localizer, NoLocalization};
use crate::resolver::Resolver;
use crate::schema::Schema;
use crate::types::{Direction, ResolveOptions, TypeDescriptor};

/// A type to resolve, with an optional explicit model name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeUsage {
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub model: Option<String>,
}

impl TypeUsage {
    pub fn new(ty: TypeDescriptor) -> Self {
        Self { ty, model: None }
    }

    pub fn named(ty: TypeDescriptor, model: impl Into<String>) -> Self {
        Self {
            ty,
            model: Some(model.into()),
        }
    }
}

/// Response of an operation as supplied by endpoint introspection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub body: Option<TypeUsage>,
}

/// Operation as supplied by endpoint introspection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiOperation {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub request: Option<TypeUsage>,
    #[serde(default)]
    pub responses: Vec<ApiResponse>,
}

/// All operations of one API context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiDefinition {
    /// Identifies the API context; keys the document cache.
    #[serde(default = "default_context_id")]
    pub context_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub operations: Vec<ApiOperation>,
}

fn default_context_id() -> String {
    "default".to_string()
}

impl Default for ApiDefinition {
    fn default() -> Self {
        Self {
            context_id: default_context_id(),
            title: None,
            version: None,
            operations: Vec::new(),
        }
    }
}

static NO_LOCALIZATION: NoLocalization = NoLocalization;

/// Runs documentation passes over a model catalog.
pub struct DocumentAssembler<'a> {
    catalog: &'a ModelCatalog,
    localizer: &'a dyn Localizer,
    options: ResolveOptions,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(catalog: &'a ModelCatalog, options: ResolveOptions) -> Self {
        Self {
            catalog,
            localizer: &NO_LOCALIZATION,
            options,
        }
    }

    pub fn with_localizer(mut self, localizer: &'a dyn Localizer) -> Self {
        self.localizer = localizer;
        self
    }

    /// An empty document for `api`, titled from the API or the options.
    pub fn stub(&self, api: &ApiDefinition) -> Document {
        Document::new(
            self.options.spec_version,
            Info {
                title: api
                    .title
                    .clone()
                    .unwrap_or_else(|| self.options.title.clone()),
                version: api
                    .version
                    .clone()
                    .unwrap_or_else(|| self.options.version.clone()),
                description: self.options.description.clone(),
            },
        )
    }

    /// Generate the document for `api` in a fresh resolution pass.
    ///
    /// The pass's context is attached to the current thread while it runs
    /// and discarded afterwards, whether or not the pass succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first `ResolveError` raised while resolving any operation.
    pub fn generate(&self, api: &ApiDefinition) -> Result<Document, ResolveError> {
        debug!(context_id = %api.context_id, operations = api.operations.len(), "starting documentation pass");

        let guard = ambient::attach(ResolutionContext::open(self.stub(api)))?;

        for op in &api.operations {
            let mark = ambient::with_current(|ctx| Ok(ctx.named_len()))?;
            let operation = match self.resolve_operation(op) {
                Ok(operation) => operation,
                Err(e) if self.options.skip_unresolved && !e.is_pass_fatal() => {
                    // A skipped operation leaves no named schemas behind.
                    ambient::with_current(|ctx| {
                        ctx.truncate_named(mark);
                        Ok(())
                    })?;
                    warn!(path = %op.path, method = %op.method, "skipping unresolvable operation");
                    continue;
                }
                Err(e) => return Err(e),
            };
            ambient::with_current(|ctx| {
                ctx.document_mut().add_operation(operation);
                Ok(())
            })?;
        }

        let mut context = guard.detach().ok_or(ResolveError::NoActiveContext)?;
        context.merge();
        Ok(context.close())
    }

    /// Generate the document for `api`, or return the cached one.
    ///
    /// Only successful passes populate the cache.
    pub fn generate_cached(
        &self,
        api: &ApiDefinition,
        cache: &DocumentCache,
    ) -> Result<Arc<Document>, ResolveError> {
        if let Some(document) = cache.get(&api.context_id) {
            debug!(context_id = %api.context_id, "serving cached document");
            return Ok(document);
        }
        let document = Arc::new(self.generate(api)?);
        cache.insert(&api.context_id, Arc::clone(&document));
        Ok(document)
    }

    fn resolve_operation(&self, op: &ApiOperation) -> Result<Operation, ResolveError> {
        let request_body = op
            .request
            .as_ref()
            .map(|usage| self.resolve_usage(usage, Direction::Request))
            .transpose()
            .map_err(|e| self.report(op, e))?;

        let mut responses = Vec::with_capacity(op.responses.len());
        for response in &op.responses {
            let schema = response
                .body
                .as_ref()
                .map(|usage| self.resolve_usage(usage, Direction::Response))
                .transpose()
                .map_err(|e| self.report(op, e))?;
            responses.push(Response {
                status: response.status.clone(),
                description: response
                    .description
                    .clone()
                    .unwrap_or_else(|| default_description(&response.status).to_string()),
                schema,
            });
        }

        Ok(Operation {
            path: op.path.clone(),
            method: op.method.clone(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            request_body,
            responses,
        })
    }

    fn resolve_usage(
        &self,
        usage: &TypeUsage,
        direction: Direction,
    ) -> Result<Schema, ResolveError> {
        ambient::with_current(|ctx| {
            Resolver::new(self.catalog, ctx)
                .with_localizer(self.localizer)
                .resolve_type(&usage.ty, direction, usage.model.as_deref())
        })
    }

    fn report(&self, op: &ApiOperation, error: ResolveError) -> ResolveError {
        warn!(
            path = %op.path,
            method = %op.method,
            error = %error,
            "failed to resolve operation"
        );
        error
    }
}

fn default_description(status: &str) -> &'static str {
    match status {
        "200" => "OK",
        "201" => "Created",
        "204" => "No Content",
        "400" => "Bad Request",
        "404" => "Not Found",
        _ => "Response",
    }
}

/// Process-wide cache of generated documents keyed by API context id.
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: RwLock<HashMap<String, Arc<Document>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, context_id: &str) -> Option<Arc<Document>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context_id)
            .cloned()
    }

    pub fn insert(&self, context_id: &str, document: Arc<Document>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(context_id.to_string(), document);
    }

    /// Drop the cached document for `context_id`. Returns whether one was cached.
    pub fn invalidate(&self, context_id: &str) -> bool {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(context_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
