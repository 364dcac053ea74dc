//! CLI integration tests for propertyset-schema binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("propertyset-schema"))
}

// Helper to create a temp model file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const MODEL: &str = r#"{
    "property_sets": [
        {
            "name": "Customer",
            "properties": [
                { "name": "id", "type": "int64", "read_only": true },
                { "name": "email", "type": "string", "constraints": [{ "kind": "required" }] }
            ]
        }
    ],
    "api": {
        "title": "Customers",
        "operations": [
            {
                "path": "/customers",
                "method": "post",
                "request": { "type": "record:Customer", "model": "Customer" },
                "responses": [{ "status": "201" }]
            }
        ]
    }
}"#;

mod generate_command {
    use super::*;

    #[test]
    fn openapi3_by_default() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args(["generate", model.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""openapi":"3.0.3""#))
            .stdout(predicate::str::contains(
                r##""$ref":"#/components/schemas/Customer""##,
            ));
    }

    #[test]
    fn swagger2_layout() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args(["generate", model.to_str().unwrap(), "--spec", "v2"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""swagger":"2.0""#))
            .stdout(predicate::str::contains(r#""definitions""#));
    }

    #[test]
    fn yaml_model_and_output() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.yaml",
            "property_sets:\n  - name: Tag\n    properties:\n      - name: label\n        type: string\napi:\n  operations:\n    - path: /tags\n      method: get\n      responses:\n        - status: \"200\"\n          body:\n            type: list<record:Tag>\n            model: Tag\n",
        );

        cmd()
            .args([
                "generate",
                model.to_str().unwrap(),
                "--format",
                "yaml",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("openapi:"))
            .stdout(predicate::str::contains("Tag:"));
    }

    #[test]
    fn title_override_and_pretty() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"property_sets": [], "api": {"operations": []}}"#,
        );

        cmd()
            .args([
                "generate",
                model.to_str().unwrap(),
                "--title",
                "Inventory",
                "--api-version",
                "3.2",
                "--pretty",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"title\": \"Inventory\""))
            .stdout(predicate::str::contains("\"version\": \"3.2\""));
    }

    #[test]
    fn writes_output_file() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);
        let output = dir.path().join("openapi.json");

        cmd()
            .args([
                "generate",
                model.to_str().unwrap(),
                "--check",
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["info"]["title"], "Customers");
        assert_eq!(
            written["components"]["schemas"]["Customer"]["required"],
            serde_json::json!(["email"])
        );
    }

    #[test]
    fn missing_model_file() {
        cmd()
            .args(["generate", "/nonexistent/model.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn unknown_reference_fails() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"api": {"operations": [{"path": "/x", "method": "get",
                "responses": [{"status": "200", "body": {"type": "record:Ghost"}}]}]}}"#,
        );

        cmd()
            .args(["generate", model.to_str().unwrap()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Ghost"));

        cmd()
            .args(["generate", model.to_str().unwrap(), "--skip-unresolved"])
            .assert()
            .success();
    }

    #[test]
    fn invalid_spec_version() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args(["generate", model.to_str().unwrap(), "--spec", "v9"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown spec version"));
    }
}

mod resolve_command {
    use super::*;

    #[test]
    fn request_omits_read_only() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--set",
                "Customer",
                "--request",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""required":["email"]"#))
            .stdout(predicate::str::contains(r#""id""#).not());
    }

    #[test]
    fn response_includes_read_only() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--set",
                "Customer",
                "--response",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""readOnly":true"#));
    }

    #[test]
    fn named_resolution_lists_definitions() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        let output = cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--set",
                "Customer",
                "--response",
                "--model-name",
                "Client",
                "--spec",
                "v2",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["schema"]["$ref"], "#/definitions/Client");
        assert!(value["definitions"]["Client"]["properties"]["email"].is_object());
    }

    #[test]
    fn requires_direction() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--set", "Customer"])
            .assert()
            .failure();
    }

    #[test]
    fn unknown_set() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--set",
                "Nope",
                "--request",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Nope"));
    }

    #[test]
    fn invalid_json_model() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", "{ not json");

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--set",
                "Customer",
                "--request",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_valid_directory() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "model.json", MODEL);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 files checked, all passed"));
    }

    #[test]
    fn lint_reports_errors() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "broken.json",
            r#"{"property_sets": [{"name": "A", "properties": [
                {"name": "b", "type": "record:Missing"}]}]}"#,
        );

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E003"));
    }

    #[test]
    fn lint_json_output() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "model.json", MODEL);

        let output = cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(result["files_checked"], 1);
        assert_eq!(result["errors"], 0);
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "model.yaml",
            "property_sets:\n  - name: A\n    properties:\n      - name: x\n        type: gadget\n",
        );

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--strict"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn lint_missing_path() {
        cmd()
            .args(["lint", "/nonexistent/models"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}
