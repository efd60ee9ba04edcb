//! Binary-level tests. None of these reach the network: they use
//! `check`, `config`, `import --dry-run`, or fail before any request.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DOC: &str = "---\nteam: Eng\n---\n\n## Add logout\n\n```yaml\nlinear_id:\npriority: 2\nlabels: [auth]\n```\n\nUsers can sign out.\n\n## Remember me\n";

fn storysync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("storysync").expect("storysync binary");
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("LINEAR_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn dry_run_import_reports_skipped_and_writes_nothing() {
    let home = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let path = docs.path().join("stories.md");
    fs::write(&path, DOC).unwrap();

    storysync(home.path())
        .arg("import")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run] 2 stories"))
        .stdout(predicate::str::contains("skipped"));

    assert_eq!(fs::read_to_string(&path).unwrap(), DOC);
}

#[test]
fn dry_run_import_json_lists_every_story() {
    let home = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("a.md"), DOC).unwrap();
    fs::write(docs.path().join("b.md"), "## Solo\n").unwrap();

    let output = storysync(home.path())
        .arg("import")
        .arg(docs.path())
        .arg("--dry-run")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["skipped"], 3);
    assert_eq!(summary["results"][2]["title"], "Solo");
    assert_eq!(summary["results"][0]["action"], "skipped");
}

#[test]
fn import_without_api_key_fails_before_any_request() {
    let home = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let path = docs.path().join("stories.md");
    fs::write(&path, DOC).unwrap();

    storysync(home.path())
        .arg("import")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("LINEAR_API_KEY"));
}

#[test]
fn check_lists_stories() {
    let home = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let path = docs.path().join("stories.md");
    fs::write(&path, DOC).unwrap();

    storysync(home.path())
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Add logout"))
        .stdout(predicate::str::contains("Remember me"))
        .stdout(predicate::str::contains("(2 stories)"));
}

#[test]
fn check_fails_on_document_without_stories() {
    let home = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let path = docs.path().join("prose.md");
    fs::write(&path, "Just some notes.\n").unwrap();

    storysync(home.path())
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("no stories found"))
        .stderr(predicate::str::contains("could not be parsed"));
}

#[test]
fn config_set_then_show_masks_the_key() {
    let home = TempDir::new().unwrap();

    storysync(home.path())
        .args(["config", "set", "--api-key", "lin_api_0123456789wxyz"])
        .args(["--team", "Eng", "--labels", "imported,docs"])
        .assert()
        .success();

    let written = fs::read_to_string(home.path().join(".storysync").join("config.yaml")).unwrap();
    assert!(written.contains("default_team: Eng"));

    storysync(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****wxyz"))
        .stdout(predicate::str::contains("imported, docs"))
        .stdout(predicate::str::contains("lin_api_0123456789wxyz").not());
}

#[test]
fn config_set_requires_a_value() {
    let home = TempDir::new().unwrap();
    storysync(home.path())
        .args(["config", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to set"));
}
