//! End-to-end tests: config files on disk through resolution into `Settings`.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use {
    dynconf_config::{Error, ResolveError, Resolver, load_config, load_config_value, validate},
    serde_json::{Value, json},
};

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn resolves_documented_example() {
    let data = json!({
        "plain_str": "plain_value",
        "env_var": "@env TEST_ENV_VAR",
        "math": "@math 3 * 6",
        "format": "@format Hello: {@env TEST_ENV_VAR} - {@math 10 + 2 * 3}",
        "nest": {"math": "@math 4 + 2"},
    });
    let Value::Object(data) = data else {
        unreachable!()
    };

    let resolver = Resolver::new(|name: &str| (name == "TEST_ENV_VAR").then(|| "Jim".to_string()));
    let resolved = resolver.resolve_values(&data).unwrap();

    assert_eq!(
        Value::Object(resolved),
        json!({
            "plain_str": "plain_value",
            "env_var": "Jim",
            "math": 18,
            "format": "Hello: Jim - 16",
            "nest": {"math": 6},
        })
    );
}

#[test]
fn loads_yaml_file_with_directives() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "dynconf.yaml",
        r#"
TIMEZONE: America/Chicago
package: "@env CARGO_PKG_NAME"
api:
  host: "@env DYNCONF_SURELY_UNSET_HOST,127.0.0.1"
  port: "@math 8000 + 80"
  url: "@format http://{@env DYNCONF_SURELY_UNSET_HOST,127.0.0.1}:{@math 8000 + 80}/"
  timeout_secs: "@math 90 / 60"
tags: ["@env CARGO_PKG_NAME", plain]
enabled: true
"#,
    );

    let settings = load_config(&path).unwrap().with_version("0.0.1");

    assert_eq!(settings.get_str("package"), Some(env!("CARGO_PKG_NAME")));
    assert_eq!(settings.get_str("api.host"), Some("127.0.0.1"));
    assert_eq!(settings.get_i64("api.port"), Some(8080));
    assert_eq!(settings.get_str("api.url"), Some("http://127.0.0.1:8080/"));
    assert_eq!(settings.get_f64("api.timeout_secs"), Some(1.5));
    assert_eq!(
        settings.get("tags"),
        Some(&json!(["@env CARGO_PKG_NAME", "plain"]))
    );
    assert_eq!(settings.get_bool("enabled"), Some(true));
    assert_eq!(settings.timezone(), chrono_tz::Tz::America__Chicago);
    assert_eq!(settings.version(), Some("0.0.1"));
}

#[test]
fn loads_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = write(
        &dir,
        "dynconf.toml",
        "[limits]\nmax_bytes = \"@math 4 * 1024\"\n",
    );
    let json_path = write(
        &dir,
        "dynconf.json",
        r#"{"limits": {"max_bytes": "@math 4 * 1024"}}"#,
    );

    let from_toml = load_config(&toml_path).unwrap();
    let from_json = load_config(&json_path).unwrap();
    assert_eq!(from_toml.get_i64("limits.max_bytes"), Some(4096));
    assert_eq!(from_toml, from_json);
}

#[test]
fn resolution_failure_aborts_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "dynconf.yaml",
        "good: \"@math 1 + 1\"\nbad: \"@format {@math 1 << 2}\"\n",
    );

    let err = load_config(&path).unwrap_err();
    let Error::Resolve(resolve) = err else {
        panic!("expected resolve error, got {err:?}");
    };
    assert!(matches!(
        resolve.root_cause(),
        ResolveError::Math {
            source: dynconf_config::MathError::UnsupportedBinaryOperator { .. },
            ..
        }
    ));
}

#[test]
fn raw_loading_leaves_directives_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "dynconf.yml", "value: \"@math 1 / 0\"\n");
    let raw = load_config_value(&path).unwrap();
    assert_eq!(raw["value"], json!("@math 1 / 0"));
}

#[test]
fn validation_reports_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "dynconf.yaml",
        r#"
a: "@math 1 / 0"
b: "@ev HOME"
c:
  d: "@format no spans"
e: ok
f: "@math"
"#,
    );

    let result = validate::validate(Some(&path));
    assert_eq!(result.count(validate::Severity::Error), 3);
    assert_eq!(result.count(validate::Severity::Warning), 1);
    let paths: Vec<&str> = result.diagnostics.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, ["a", "b", "c.d", "f"]);
    assert_eq!(result.diagnostics[1].category, "keyword");
}

#[test]
fn misspelled_directive_aborts_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "dynconf.yaml",
        "port: \"@MATH 8000 + 80\"\nhost: \"@env\\tHOST\"\n",
    );

    let err = load_config(&path).unwrap_err();
    assert!(matches!(
        err,
        Error::Resolve(ResolveError::UnknownDirective {
            suggestion: "@math",
            ..
        })
    ));
}
