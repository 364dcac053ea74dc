//! Model linting - static analysis of model declaration files.
//!
//! Checks model files for:
//! - JSON/YAML syntax errors
//! - Duplicate or empty property names
//! - Record references to undeclared property sets
//! - Property sets declared more than once (ambiguous references)
//! - Types no schema can describe
//! - Property sets no operation ever reaches

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::loader::{parse_model_file, ModelFile};
use crate::types::{RecordSource, TypeDescriptor};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/property_sets/0/properties/2")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json, .yaml and .yml files.
/// If `strict` is true, warnings are treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_model_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single model file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let relative = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let model = match parse_model_file(file) {
        Ok(model) => model,
        Err(e) => {
            return FileResult {
                file: relative,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    code: "E001".to_string(),
                    file: file.to_path_buf(),
                    path: "/".to_string(),
                    message: format!("syntax error: {}", e),
                }],
            };
        }
    };

    let diagnostics = Checker::new(file).run(&model);

    let status = if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    };

    FileResult {
        file: relative,
        status,
        diagnostics,
    }
}

struct Checker<'a> {
    file: &'a Path,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn new(file: &'a Path) -> Self {
        Self {
            file,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, severity: Severity, code: &str, path: String, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path,
            message,
        });
    }

    fn run(mut self, model: &ModelFile) -> Vec<Diagnostic> {
        let mut declared: BTreeMap<&str, usize> = BTreeMap::new();
        for decl in &model.property_sets {
            *declared.entry(decl.name.as_str()).or_default() += 1;
        }

        for (i, decl) in model.property_sets.iter().enumerate() {
            let set_path = format!("/property_sets/{}", i);
            if declared.get(decl.name.as_str()).copied().unwrap_or(0) > 1 {
                self.push(
                    Severity::Error,
                    "E004",
                    set_path.clone(),
                    format!(
                        "property set \"{}\" is declared more than once; references to it are ambiguous",
                        decl.name
                    ),
                );
            }

            let mut seen = BTreeSet::new();
            for (j, property) in decl.properties.iter().enumerate() {
                let path = format!("{}/properties/{}", set_path, j);
                if property.name.split('.').all(|segment| segment.trim().is_empty()) {
                    self.push(
                        Severity::Error,
                        "E005",
                        path.clone(),
                        format!("empty property name in \"{}\"", decl.name),
                    );
                } else if !seen.insert(property.name.as_str()) {
                    self.push(
                        Severity::Error,
                        "E002",
                        path.clone(),
                        format!("duplicate property \"{}\" in \"{}\"", property.name, decl.name),
                    );
                }
                self.check_type(&property.ty, &declared, format!("{}/type", path));
            }
        }

        if let Some(api) = &model.api {
            for (i, op) in api.operations.iter().enumerate() {
                let op_path = format!("/api/operations/{}", i);
                if let Some(usage) = &op.request {
                    self.check_type(&usage.ty, &declared, format!("{}/request/type", op_path));
                }
                for (j, response) in op.responses.iter().enumerate() {
                    if let Some(usage) = &response.body {
                        self.check_type(
                            &usage.ty,
                            &declared,
                            format!("{}/responses/{}/body/type", op_path, j),
                        );
                    }
                }
            }
            if !api.operations.is_empty() {
                self.check_unused(model);
            }
        }

        self.diagnostics
    }

    fn check_type(&mut self, ty: &TypeDescriptor, declared: &BTreeMap<&str, usize>, path: String) {
        let mut found = Vec::new();
        ty.walk(&mut |t| match t {
            TypeDescriptor::Record(record) => {
                if let RecordSource::Declared(name) = &record.source {
                    if !declared.contains_key(name.as_str()) {
                        found.push((
                            Severity::Error,
                            "E003",
                            format!("unknown property set \"{}\"", name),
                        ));
                    }
                }
            }
            TypeDescriptor::Opaque(expr) => found.push((
                Severity::Warning,
                "W001",
                format!("type \"{}\" is not recognized; it will be documented as an untyped object", expr),
            )),
            TypeDescriptor::Optional(inner) if matches!(**inner, TypeDescriptor::Optional(_)) => {
                found.push((
                    Severity::Warning,
                    "W001",
                    "nested optional types are documented as an untyped object".to_string(),
                ))
            }
            _ => {}
        });
        for (severity, code, message) in found {
            self.push(severity, code, path.clone(), message);
        }
    }

    /// Warn about property sets no operation reaches, directly or through other sets.
    fn check_unused(&mut self, model: &ModelFile) {
        let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for decl in &model.property_sets {
            let targets = edges.entry(decl.name.as_str()).or_default();
            for property in &decl.properties {
                collect_declared(&property.ty, targets);
            }
        }

        let mut pending = Vec::new();
        if let Some(api) = &model.api {
            for op in &api.operations {
                let bodies = op
                    .request
                    .iter()
                    .chain(op.responses.iter().filter_map(|r| r.body.as_ref()));
                for usage in bodies {
                    collect_declared(&usage.ty, &mut pending);
                }
            }
        }

        let mut reached = BTreeSet::new();
        while let Some(name) = pending.pop() {
            if reached.insert(name) {
                if let Some(targets) = edges.get(name) {
                    pending.extend(targets.iter().copied());
                }
            }
        }

        for (i, decl) in model.property_sets.iter().enumerate() {
            if !reached.contains(decl.name.as_str()) {
                self.push(
                    Severity::Warning,
                    "W002",
                    format!("/property_sets/{}", i),
                    format!("property set \"{}\" is not used by any operation", decl.name),
                );
            }
        }
    }
}

fn collect_declared<'a>(ty: &'a TypeDescriptor, out: &mut Vec<&'a str>) {
    ty.walk(&mut |t| {
        if let TypeDescriptor::Record(record) = t {
            if let RecordSource::Declared(name) = &record.source {
                out.push(name.as_str());
            }
        }
    });
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e, "json" | "yaml" | "yml"))
        .unwrap_or(false)
}

/// Collect all model files in a path (file or directory).
fn collect_model_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if is_model_file(path) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if is_model_file(&path) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn lint_str(name: &str, content: &str) -> FileResult {
        let dir = tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        lint_file(&path, dir.path())
    }

    #[test]
    fn lint_valid_model() {
        let result = lint_str(
            "model.json",
            r#"{"property_sets": [
                {"name": "Address", "properties": [{"name": "city", "type": "string"}]},
                {"name": "Customer", "properties": [
                    {"name": "id", "type": "int64"},
                    {"name": "address", "type": "record:Address"}
                ]}
            ]}"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.file, PathBuf::from("model.json"));
    }

    #[test]
    fn lint_invalid_syntax() {
        let result = lint_str("model.json", "{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_invalid_yaml_syntax() {
        let result = lint_str("model.yaml", "property_sets: [unclosed");
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_duplicate_property() {
        let result = lint_str(
            "model.json",
            r#"{"property_sets": [{"name": "A", "properties": [
                {"name": "x", "type": "string"}, {"name": "x", "type": "int"}
            ]}]}"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diag = result.diagnostics.iter().find(|d| d.code == "E002").unwrap();
        assert_eq!(diag.path, "/property_sets/0/properties/1");
    }

    #[test]
    fn lint_empty_property_name() {
        let result = lint_str(
            "model.json",
            r#"{"property_sets": [{"name": "A", "properties": [
                {"name": "", "type": "string"},
                {"name": "..", "type": "string"}
            ]}]}"#,
        );
        let empty: Vec<&str> = result
            .diagnostics
            .iter()
            .filter(|d| d.code == "E005")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(
            empty,
            ["/property_sets/0/properties/0", "/property_sets/0/properties/1"]
        );
    }

    #[test]
    fn lint_unknown_record_reference() {
        let result = lint_str(
            "model.json",
            r#"{"property_sets": [{"name": "A", "properties": [
                {"name": "items", "type": "list<record:Missing>"}
            ]}]}"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diag = result.diagnostics.iter().find(|d| d.code == "E003").unwrap();
        assert_eq!(diag.path, "/property_sets/0/properties/0/type");
        assert!(diag.message.contains("Missing"));
    }

    #[test]
    fn lint_ambiguous_declaration() {
        let result = lint_str(
            "model.json",
            r#"{"property_sets": [{"name": "A"}, {"name": "A"}]}"#,
        );
        assert_eq!(
            result.diagnostics.iter().filter(|d| d.code == "E004").count(),
            2
        );
    }

    #[test]
    fn lint_opaque_type_warning() {
        let result = lint_str(
            "model.yaml",
            "property_sets:\n  - name: A\n    properties:\n      - name: blob\n        type: java.lang.Object\n",
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W001"));
    }

    #[test]
    fn lint_unused_set_warning() {
        let result = lint_str(
            "model.json",
            r#"{
                "property_sets": [
                    {"name": "Line", "properties": [{"name": "qty", "type": "int"}]},
                    {"name": "Order", "properties": [{"name": "lines", "type": "list<record:Line>"}]},
                    {"name": "Orphan"}
                ],
                "api": {"operations": [
                    {"path": "/orders", "method": "get",
                     "responses": [{"status": "200", "body": {"type": "record:Order"}}]}
                ]}
            }"#,
        );
        let unused: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.code == "W002")
            .collect();
        assert_eq!(unused.len(), 1);
        assert!(unused[0].message.contains("Orphan"));
    }

    #[test]
    fn lint_no_unused_check_without_api() {
        let result = lint_str("model.json", r#"{"property_sets": [{"name": "Orphan"}]}"#);
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("valid.json"),
            r#"{"property_sets": [{"name": "A"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("invalid.yml"), "property_sets: [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("model.json");
        std::fs::write(
            &file_path,
            r#"{"property_sets": [{"name": "A", "properties": [{"name": "x", "type": "widget"}]}]}"#,
        )
        .unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
