//! End-to-end import runs against an in-memory Linear workspace.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use storysync_core::{parse_document, Config, ImportAction};
use storysync_linear::mock::{mock_issue_id, MockClient};
use storysync_sync::{import_documents, FsStore, ImportOptions};

const LOGOUT_DOC: &str = r#"---
project: "Q1"
team: "Eng"
---

## Add logout

```yaml
linear_id:
linear_url:
priority: 2
```

Users can sign out from the header menu.
"#;

const THREE_STORIES: &str = "---\nteam: Eng\n---\n\n## One\n\nfirst\n\n## Two\n\nsecond\n\n## Three\n\nthird\n";

fn workspace() -> MockClient {
    MockClient::new()
        .with_team("team-eng", "Eng", "ENG")
        .with_project("proj-q1", "team-eng", "Q1")
        .with_label("label-auth", "auth")
        .with_state("state-todo", "team-eng", "Todo")
        .with_user("user-ada", "Ada", "ada@example.com")
}

fn write_doc(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn options(paths: Vec<PathBuf>) -> ImportOptions {
    ImportOptions {
        document_paths: paths,
        ..ImportOptions::default()
    }
}

#[tokio::test]
async fn creates_issue_and_writes_ids_back() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "logout.md", LOGOUT_DOC);
    let mock = workspace();

    let summary = import_documents(&mock, &FsStore, &options(vec![path.clone()])).await;

    assert_eq!(
        (summary.total, summary.created, summary.failed),
        (1, 1, 0)
    );
    assert!(summary.is_success());

    let created = mock.created();
    assert_eq!(created[0].team_id.as_deref(), Some("team-eng"));
    assert_eq!(created[0].project_id.as_deref(), Some("proj-q1"));
    assert_eq!(created[0].priority, Some(2));
    assert_eq!(
        created[0].description.as_deref(),
        Some("Users can sign out from the header menu.")
    );

    let after = fs::read_to_string(&path).unwrap();
    let id = mock_issue_id(1);
    assert!(after.contains(&format!("linear_id: {id}\n")));
    assert!(after.contains("linear_url: https://linear.app/mock/issue/ENG-1\n"));
    assert!(after.contains("\nUsers can sign out from the header menu.\n"));
    assert_eq!(after.lines().count(), LOGOUT_DOC.lines().count());

    let reparsed = parse_document(&after, "logout.md").unwrap();
    assert_eq!(reparsed.stories[0].linear_id.as_deref(), Some(id.as_str()));
    assert_eq!(reparsed.stories[0].priority, Some(2));
}

#[tokio::test]
async fn reimport_with_a_malformed_field_updates_instead_of_duplicating() {
    let dir = TempDir::new().unwrap();
    let text = "---\nteam: Eng\n---\n\n## Blocked story\n\n```yaml\nlinear_id:\nstatus: Blocked: waiting on API\n```\n\nWaiting.\n";
    let path = write_doc(&dir, "blocked.md", text);
    let mock = workspace();

    let first = import_documents(&mock, &FsStore, &options(vec![path.clone()])).await;
    assert_eq!((first.created, first.updated, first.failed), (1, 0, 0));

    let written = fs::read_to_string(&path).unwrap();
    let story = &parse_document(&written, "blocked.md").unwrap().stories[0];
    assert_eq!(story.linear_id.as_deref(), Some(mock_issue_id(1).as_str()));
    assert_eq!(story.status.as_deref(), Some("Blocked: waiting on API"));

    let second = import_documents(&mock, &FsStore, &options(vec![path])).await;
    assert_eq!((second.created, second.updated, second.failed), (0, 1, 0));
    assert_eq!(mock.calls("create_issue"), 1);
    assert_eq!(mock.calls("update_issue"), 1);
}

#[tokio::test]
async fn one_failing_create_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "three.md", THREE_STORIES);
    let mock = workspace().fail_create_for("Two");

    let summary = import_documents(&mock, &FsStore, &options(vec![path.clone()])).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 1);
    let actions: Vec<ImportAction> = summary.results.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            ImportAction::Created,
            ImportAction::Failed,
            ImportAction::Created
        ]
    );
    assert!(summary.results[1]
        .message
        .as_deref()
        .unwrap()
        .contains("connection reset"));

    let doc = parse_document(&fs::read_to_string(&path).unwrap(), "three.md").unwrap();
    assert!(doc.stories[0].linear_id.is_some());
    assert!(doc.stories[1].linear_id.is_none());
    assert!(doc.stories[2].linear_id.is_some());
}

#[tokio::test]
async fn rejected_create_looks_like_any_other_failure() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "three.md", THREE_STORIES);
    let mock = workspace().reject_create_for("One");

    let summary = import_documents(&mock, &FsStore, &options(vec![path])).await;
    assert_eq!(summary.results[0].action, ImportAction::Failed);
    assert!(summary.results[0]
        .message
        .as_deref()
        .unwrap()
        .starts_with("Linear request failed"));
}

#[tokio::test]
async fn dry_run_skips_everything_and_calls_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "three.md", THREE_STORIES);
    let mock = workspace();
    let opts = ImportOptions {
        dry_run: true,
        ..options(vec![path.clone()])
    };

    let summary = import_documents(&mock, &FsStore, &opts).await;

    assert_eq!(summary.skipped, 3);
    assert_eq!(mock.total_calls(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), THREE_STORIES);
}

#[tokio::test]
async fn existing_id_updates_instead_of_creating() {
    let dir = TempDir::new().unwrap();
    let id = mock_issue_id(1);
    let text = format!(
        "## Known\n\n```yaml\nlinear_id: {id}\nstatus: todo\n```\n\nbody\n\n## Fresh\n"
    );
    let path = write_doc(&dir, "mixed.md", &text);
    let mock = workspace().with_issue("Known");
    let opts = ImportOptions {
        team_override: Some("Eng".to_string()),
        ..options(vec![path.clone()])
    };

    let summary = import_documents(&mock, &FsStore, &opts).await;

    assert_eq!(summary.results[0].action, ImportAction::Updated);
    assert_eq!(summary.results[1].action, ImportAction::Created);
    let updated = mock.updated();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0, id);
    assert_eq!(updated[0].1.state_id.as_deref(), Some("state-todo"));

    // Only the created story is written back.
    let after = fs::read_to_string(&path).unwrap();
    assert!(after.starts_with(&format!(
        "## Known\n\n```yaml\nlinear_id: {id}\nstatus: todo\n```\n\nbody\n"
    )));
    assert!(after.contains(&mock_issue_id(2)));
}

#[tokio::test]
async fn team_is_resolved_once_per_run() {
    let dir = TempDir::new().unwrap();
    let a = write_doc(&dir, "a.md", THREE_STORIES);
    let b = write_doc(&dir, "b.md", THREE_STORIES);
    let mock = workspace();

    let summary = import_documents(&mock, &FsStore, &options(vec![a, b])).await;

    assert_eq!(summary.created, 6);
    assert_eq!(mock.calls("teams"), 1);
}

#[tokio::test]
async fn unknown_labels_are_warnings_not_failures() {
    let dir = TempDir::new().unwrap();
    let text = "## Tagged\n\n```yaml\nlabels: [auth, Unknown]\n```\n";
    let path = write_doc(&dir, "labels.md", text);
    let mock = workspace();
    let opts = ImportOptions {
        config: Config {
            default_team: Some("ENG".to_string()),
            default_labels: vec!["auth".to_string()],
            ..Config::default()
        },
        ..options(vec![path])
    };

    let summary = import_documents(&mock, &FsStore, &opts).await;

    assert_eq!(summary.created, 1);
    assert_eq!(mock.created()[0].label_ids, vec!["label-auth"]);
    assert_eq!(
        summary.results[0].warnings,
        vec!["label 'Unknown' not found; skipped"]
    );
    assert_eq!(mock.calls("labels"), 2);
}

#[tokio::test]
async fn missing_team_fails_the_story_only() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "noteam.md", "## Orphan\n\nno team anywhere\n");
    let mock = workspace();

    let summary = import_documents(&mock, &FsStore, &options(vec![path.clone()])).await;

    assert_eq!(summary.failed, 1);
    assert!(summary.results[0]
        .message
        .as_deref()
        .unwrap()
        .contains("no team for story 'Orphan'"));
    assert_eq!(mock.total_calls(), 0);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "## Orphan\n\nno team anywhere\n"
    );
}

#[tokio::test]
async fn unknown_team_fails_with_resolver_message() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "ops.md", "---\nteam: Ops\n---\n\n## Deploy\n");
    let mock = workspace();

    let summary = import_documents(&mock, &FsStore, &options(vec![path])).await;

    assert_eq!(
        summary.results[0].message.as_deref(),
        Some("team 'Ops' not found in Linear")
    );
    assert_eq!(mock.calls("create_issue"), 0);
}

#[tokio::test]
async fn out_of_range_priority_fails_before_any_call() {
    let dir = TempDir::new().unwrap();
    let text = "---\nteam: Eng\n---\n\n## Urgent\n\n```yaml\npriority: 9\n```\n";
    let path = write_doc(&dir, "p.md", text);
    let mock = workspace();

    let summary = import_documents(&mock, &FsStore, &options(vec![path])).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn bad_documents_are_reported_and_the_run_continues() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.md");
    let empty = write_doc(&dir, "empty.md", "just prose, no headings\n");
    let dupes = write_doc(&dir, "dupes.md", "---\nteam: Eng\n---\n\n## Same\n\n## Same\n");
    let good = write_doc(&dir, "good.md", THREE_STORIES);
    let mock = workspace();

    let summary = import_documents(
        &mock,
        &FsStore,
        &options(vec![missing.clone(), empty.clone(), dupes.clone(), good]),
    )
    .await;

    assert_eq!(summary.created, 3);
    let failed: Vec<&PathBuf> = summary
        .document_failures
        .iter()
        .map(|f| &f.document)
        .collect();
    assert_eq!(failed, vec![&missing, &empty, &dupes]);
    assert!(summary.document_failures[2]
        .message
        .contains("duplicate story title 'Same'"));
    assert!(!summary.is_success());
}

#[tokio::test]
async fn no_write_back_leaves_documents_alone() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "logout.md", LOGOUT_DOC);
    let mock = workspace();
    let opts = ImportOptions {
        skip_write_back: true,
        ..options(vec![path.clone()])
    };

    let summary = import_documents(&mock, &FsStore, &opts).await;

    assert_eq!(summary.created, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), LOGOUT_DOC);
}

#[tokio::test]
async fn assignee_and_fractional_estimate() {
    let dir = TempDir::new().unwrap();
    let text = "---\nteam: Eng\n---\n\n## Sized\n\n```yaml\nestimate: 2.5\nassignee: ada@example.com\n```\n\n## Stranger\n\n```yaml\nassignee: nobody@example.com\n```\n";
    let path = write_doc(&dir, "people.md", text);
    let mock = workspace();

    let summary = import_documents(&mock, &FsStore, &options(vec![path])).await;

    let created = mock.created();
    assert_eq!(created[0].assignee_id.as_deref(), Some("user-ada"));
    assert_eq!(created[0].estimate, Some(3));
    assert_eq!(summary.results[0].warnings, vec!["estimate 2.5 rounded to 3"]);
    assert_eq!(created[1].assignee_id, None);
    assert_eq!(
        summary.results[1].warnings,
        vec!["assignee 'nobody@example.com' not found; left unassigned"]
    );
}
