use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn optforge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_optforge"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run optforge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

/// Golden-path declarations: every option kind, no diagnostics.
fn build_options_json() -> serde_json::Value {
    serde_json::json!({
        "declarations": [{
            "name": "BuildOptions",
            "annotations": [{ "name": "command", "args": [
                { "name": "name", "value": "build" },
                { "name": "description", "value": "Build the project" }
            ]}],
            "members": [
                {
                    "name": "out_dir",
                    "ty": { "shape": "directory" },
                    "annotations": [
                        { "name": "option", "args": [
                            { "value": "--out-dir" },
                            { "name": "help_name", "value": "DIR" }
                        ]},
                        { "name": "directory", "args": [{ "value": "CreateIfMissing" }] }
                    ]
                },
                {
                    "name": "source_dir",
                    "ty": { "shape": "directory" },
                    "annotations": [
                        { "name": "option", "args": [{ "value": "--source-dir" }] },
                        { "name": "directory", "args": [{ "value": "ExistingOnly" }] }
                    ]
                },
                {
                    "name": "force",
                    "ty": { "shape": "bool" },
                    "annotations": [
                        { "name": "option", "args": [
                            { "value": "--force" },
                            { "name": "aliases", "value": ["-f"] },
                            { "name": "required", "value": true }
                        ]}
                    ]
                },
                { "name": "cache_key", "ty": { "shape": "text" } },
                {
                    "name": "manifest",
                    "ty": { "shape": "file" },
                    "annotations": [
                        { "name": "option", "args": [
                            { "value": "--manifest" },
                            { "name": "hidden", "value": true },
                            { "name": "required", "value": false },
                            { "name": "arity_min", "value": 0 },
                            { "name": "arity_max", "value": "1" }
                        ]},
                        { "name": "file" }
                    ]
                }
            ]
        }]
    })
}

fn write_json(dir: &TempDir, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).expect("failed to write input");
    path
}

#[test]
fn test_generate_writes_one_file_per_input() {
    let dir = TempDir::new().unwrap();
    let input = write_json(&dir, "build.json", &build_options_json());
    let out_dir = dir.path().join("generated");

    let output = optforge(&["generate", path_arg(&input), "--out-dir", path_arg(&out_dir)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Generated 1 file(s)"));

    let source = fs::read_to_string(out_dir.join("build.rs")).unwrap();
    assert!(source.starts_with("// @generated by optforge-codegen "));
    assert!(source.contains("impl BuildOptions {"));
    assert!(source.contains("::clap::Command::new(\"build\")"));
    assert!(source.contains(".visible_short_alias('f')"));
    assert!(source.contains(".hide(true)"));
    assert!(source.contains("::std::fs::create_dir_all(path)"));
    assert!(!source.contains("cache_key"));
}

#[test]
fn test_generate_is_byte_identical_across_runs() {
    let dir = TempDir::new().unwrap();
    let input = write_json(&dir, "build.json", &build_options_json());
    let first_dir = dir.path().join("first");
    let second_dir = dir.path().join("second");

    for out_dir in [&first_dir, &second_dir] {
        let output = optforge(&["generate", path_arg(&input), "--out-dir", path_arg(out_dir)]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    let first = fs::read(first_dir.join("build.rs")).unwrap();
    let second = fs::read(second_dir.join("build.rs")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_generate_accepts_yaml_and_parallel_inputs() {
    let dir = TempDir::new().unwrap();
    let json_input = write_json(&dir, "build.json", &build_options_json());
    let yaml_input = dir.path().join("clean.yaml");
    fs::write(
        &yaml_input,
        r#"declarations:
  - name: CleanOptions
    annotations:
      - name: command
    members:
      - name: all
        ty:
          shape: bool
        annotations:
          - name: option
            args:
              - value: "--all"
"#,
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    let output = optforge(&[
        "generate",
        path_arg(&json_input),
        path_arg(&yaml_input),
        "--out-dir",
        path_arg(&out_dir),
        "--jobs",
        "2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(out_dir.join("build.rs").is_file());
    let clean = fs::read_to_string(out_dir.join("clean.rs")).unwrap();
    assert!(clean.contains("impl CleanOptions {"));
    assert!(clean.contains(".long(\"all\")"));
}

#[test]
fn test_check_reports_warnings_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        &dir,
        "warn.json",
        &serde_json::json!({
            "declarations": [{
                "name": "Options",
                "annotations": [{ "name": "command" }],
                "members": [{
                    "name": "target",
                    "ty": { "shape": "text" },
                    "annotations": [
                        { "name": "option", "args": [{ "value": "--target" }] },
                        { "name": "directory" }
                    ]
                }]
            }]
        }),
    );

    let output = optforge(&["check", path_arg(&input)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("warning[UNC003]: Options.target: "), "{text}");
    assert!(text.contains("Checked 1 file(s): 1 warning."), "{text}");
}

#[test]
fn test_check_exits_with_two_on_error_diagnostics() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        &dir,
        "broken.json",
        &serde_json::json!({
            "declarations": [{
                "name": "Options",
                "annotations": [{ "name": "command" }],
                "members": [{
                    "name": "jobs",
                    "ty": { "shape": "integer" },
                    "annotations": [{ "name": "option", "args": [
                        { "value": "--jobs" },
                        { "name": "arity_min", "value": -1 }
                    ]}]
                }]
            }]
        }),
    );

    let output = optforge(&["check", path_arg(&input)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("error[UNC006]: Options.jobs: "));
}

#[test]
fn test_config_override_blocks_member_in_generated_file() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        &dir,
        "options.json",
        &serde_json::json!({
            "declarations": [{
                "name": "Options",
                "annotations": [{ "name": "command" }],
                "members": [
                    {
                        "name": "force",
                        "ty": { "shape": "bool", "nullable": true },
                        "annotations": [{ "name": "option", "args": [
                            { "value": "--force" },
                            { "name": "required", "value": true }
                        ]}]
                    },
                    {
                        "name": "quiet",
                        "ty": { "shape": "bool" },
                        "annotations": [{ "name": "option", "args": [{ "value": "-q" }] }]
                    }
                ]
            }]
        }),
    );
    let config = dir.path().join("optforge.yaml");
    fs::write(&config, "severity:\n  UNC004: error\nemit:\n  derive_run: false\n").unwrap();
    let out_dir = dir.path().join("out");

    let output = optforge(&[
        "generate",
        path_arg(&input),
        "--out-dir",
        path_arg(&out_dir),
        "--config",
        path_arg(&config),
    ]);
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));

    let source = fs::read_to_string(out_dir.join("options.rs")).unwrap();
    assert!(source.contains("// `force` omitted: blocked by UNC004"));
    assert!(source.contains(".short('q')"));
    assert!(!source.contains("pub fn run<"));
}

#[test]
fn test_check_json_format_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        &dir,
        "helper.json",
        &serde_json::json!({
            "declarations": [{
                "name": "Helper",
                "members": [{
                    "name": "flag",
                    "ty": { "shape": "bool" },
                    "annotations": [{ "name": "option", "args": [{ "value": "--flag" }] }]
                }]
            }]
        }),
    );

    let output = optforge(&["check", path_arg(&input), "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let diagnostics = reports[0]["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["code"], "UNC001");
    assert_eq!(diagnostics[0]["location"]["type_name"], "Helper");
}

#[test]
fn test_rules_lists_every_code() {
    let output = optforge(&["rules"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for code in 1..=8 {
        assert!(text.contains(&format!("UNC00{code}")), "{text}");
    }
    assert!(text.contains("UNC006  error"));
    assert!(text.contains("UNC003  warning"));
}

#[test]
fn test_missing_input_fails_with_exit_one() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");

    let output = optforge(&["check", path_arg(&missing)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: Failed to read"));
}

#[test]
fn test_invalid_config_fails_with_exit_one() {
    let dir = TempDir::new().unwrap();
    let input = write_json(&dir, "build.json", &build_options_json());
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "severity:\n  UNC999: error\n").unwrap();

    let output = optforge(&["check", path_arg(&input), "--config", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load config"));
}
