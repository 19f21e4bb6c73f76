//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn padded(body: &str) -> String {
    let mut out = body.to_string();
    for i in 0..20 {
        out.push_str(&format!("// line {i}\n"));
    }
    out
}

/// Small JS repo: two sources, one test, one stylesheet.
fn fixture_repo() -> TempDir {
    let tmp = TempDir::new().expect("tmp");
    let root = tmp.path();
    fs::create_dir_all(root.join("src/controllers")).expect("mkdir");
    fs::write(
        root.join("src/math.js"),
        padded("export function add(a, b) {\n  return a + b;\n}\nexport const PI = 3.14;\n"),
    )
    .expect("write");
    fs::write(
        root.join("src/app.js"),
        padded("import { add } from './math';\nexport function start() {\n  return add(1, 2);\n}\n"),
    )
    .expect("write");
    fs::write(root.join("src/app.test.js"), padded("test('start', () => {});\n")).expect("write");
    fs::write(
        root.join("src/controllers/user.controller.js"),
        padded("export const getUser = (req, res) => res.json({});\n"),
    )
    .expect("write");
    fs::write(root.join("src/styles.css"), padded("body {}\n")).expect("write");
    fs::write(root.join("package.json"), "{\"name\":\"fixture\",\"dependencies\":{\"express\":\"^4\"}}")
        .expect("write");
    tmp
}

fn replay_file(dir: &Path, responses: &[&str]) -> String {
    let path = dir.join("replay.json");
    fs::write(&path, serde_json::to_string(responses).expect("json")).expect("write");
    path.to_str().expect("utf8 path").to_string()
}

fn repo_forge() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("repo-forge"))
}

#[test]
fn test_cli_version() {
    let mut cmd = repo_forge();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("repo-forge"));
}

#[test]
fn test_cli_help() {
    let mut cmd = repo_forge();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("readme"))
        .stdout(predicate::str::contains("stack"))
        .stdout(predicate::str::contains("docs"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_info_reports_graph_and_tree() {
    let repo = fixture_repo();
    let mut cmd = repo_forge();
    cmd.args(["info", repo.path().to_str().expect("utf8 path"), "--explain", "src/app.js"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Statistics:"))
        .stdout(predicate::str::contains("Edges: 1"))
        .stdout(predicate::str::contains("Generation targets: 3 files in 1 batches"))
        .stdout(predicate::str::contains("src/math.js:"))
        .stdout(predicate::str::contains("└── src/"));
}

#[test]
fn test_info_rejects_missing_path() {
    let mut cmd = repo_forge();
    cmd.args(["info", "/definitely/not/a/repo"]);
    cmd.assert().failure().stderr(predicate::str::contains("Path does not exist"));
}

#[test]
fn test_generate_writes_tests_and_report() {
    let repo = fixture_repo();
    let out = TempDir::new().expect("out");
    let replay = replay_file(
        out.path(),
        &[concat!(
            "```json\n",
            "{\"file\":\"src/app.js\",\"test\":\"expect(start()).toBe(3)\"}\n",
            "{\"file\":\"src/controllers/user.controller.js\",\"test\":\"expect(true).toBe(true)\"}\n",
            "{\"file\":\"src/math.js\",\"test\":\"expect(add(1, 2)).toBe(3)\"}\n",
            "```"
        )],
    );
    let out_dir = out.path().join("generated");

    let mut cmd = repo_forge();
    cmd.args([
        "generate",
        repo.path().to_str().expect("utf8 path"),
        "--replay",
        &replay,
        "--output-dir",
        out_dir.to_str().expect("utf8 path"),
        "--jsonl",
        "--no-timestamp",
    ]);
    cmd.assert().success().stdout(predicate::str::contains("2 tests written"));

    let math = fs::read_to_string(out_dir.join("tests/src/math.test.js")).expect("math test");
    assert!(math.contains("add(1, 2)"));
    assert!(out_dir.join("tests/src/app.test.js").exists());
    assert!(!out_dir.join("tests/src/controllers/user.controller.test.js").exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("report.json")).expect("report"))
            .expect("json");
    assert!(report.get("generated_at").is_none());
    assert_eq!(report["generation"]["validated_tests"], 2);
    assert_eq!(report["batches"][0]["state"], "accepted");

    let jsonl = fs::read_to_string(out_dir.join("tests.jsonl")).expect("jsonl");
    assert_eq!(jsonl.lines().count(), 2);
}

#[test]
fn test_generate_fails_without_eligible_files() {
    let tmp = TempDir::new().expect("tmp");
    fs::write(tmp.path().join("only.test.js"), padded("test('x', () => {});\n")).expect("write");
    let replay = replay_file(tmp.path(), &[]);

    let mut cmd = repo_forge();
    cmd.args(["generate", tmp.path().to_str().expect("utf8 path"), "--replay", &replay]);
    cmd.assert().code(3).stderr(predicate::str::contains("No valid source files found."));
}

#[test]
fn test_generate_fails_when_nothing_validates() {
    let repo = fixture_repo();
    let out = TempDir::new().expect("out");
    let replay = replay_file(out.path(), &["{\"file\":\"src/math.js\",\"test\":\"expect(1).toBe(1)\"}"]);

    let mut cmd = repo_forge();
    cmd.args([
        "generate",
        repo.path().to_str().expect("utf8 path"),
        "--replay",
        &replay,
        "--output-dir",
        out.path().join("gen").to_str().expect("utf8 path"),
    ]);
    cmd.assert().code(4).stderr(predicate::str::contains("AI failed to generate test files."));
}

#[test]
fn test_stack_streams_frames() {
    let repo = fixture_repo();
    let out = TempDir::new().expect("out");
    let replay = replay_file(out.path(), &["{\"languages\": [\"JavaScript\"]}"]);

    let mut cmd = repo_forge();
    cmd.args(["stack", repo.path().to_str().expect("utf8 path"), "--replay", &replay, "--stream"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("data: {\"content\":"))
        .stdout(predicate::str::contains("data: [DONE]"));
}

#[test]
fn test_docs_outputs_controller_json() {
    let repo = fixture_repo();
    let out = TempDir::new().expect("out");
    let replay = replay_file(
        out.path(),
        &["[{\"controller\":\"user.controller.js\",\"routes\":[{\"method\":\"GET\",\"path\":\"/users/:id\"}]}]"],
    );
    let target = out.path().join("api.json");

    let mut cmd = repo_forge();
    cmd.args([
        "docs",
        repo.path().to_str().expect("utf8 path"),
        "--replay",
        &replay,
        "--output",
        target.to_str().expect("utf8 path"),
    ]);
    cmd.assert().success();

    let docs: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(target).expect("docs")).expect("json");
    assert_eq!(docs[0]["routes"][0]["method"], "GET");
    assert_eq!(docs[0]["routes"][0]["authRequired"], false);
}

#[test]
fn test_readme_strips_fences() {
    let repo = fixture_repo();
    let out = TempDir::new().expect("out");
    let replay = replay_file(out.path(), &["```markdown\n# Fixture\n\nA small app.\n```"]);

    let mut cmd = repo_forge();
    cmd.args(["readme", repo.path().to_str().expect("utf8 path"), "--replay", &replay]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("# Fixture"))
        .stdout(predicate::str::contains("```").not());
}

#[test]
fn test_docs_without_controllers_is_bad_input() {
    let tmp = TempDir::new().expect("tmp");
    fs::create_dir_all(tmp.path().join("src")).expect("mkdir");
    fs::write(tmp.path().join("src/math.js"), padded("export function add(a, b) { return a + b; }\n"))
        .expect("write");
    let replay = replay_file(tmp.path(), &[]);

    let mut cmd = repo_forge();
    cmd.args(["docs", tmp.path().to_str().expect("utf8 path"), "--replay", &replay]);
    cmd.assert().code(3).stderr(predicate::str::contains("No controllers found to document."));
}
