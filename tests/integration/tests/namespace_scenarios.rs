use std::sync::Arc;

use jirafs_integration_tests::MemoryTracker;
use jirafs_namespace::{FsError, Namespace, OpenMode};
use jirafs_tracker::TrackerError;
use jirafs_views::mount;

fn fixture() -> (Arc<MemoryTracker>, Namespace) {
    let tracker = Arc::new(MemoryTracker::new());
    let namespace = mount(tracker.clone(), 50);
    (tracker, namespace)
}

async fn cat(namespace: &Namespace, path: &str) -> String {
    let node = namespace.resolve(path).await.expect("resolve");
    let content = namespace.read_file(&node).await.expect("read");
    String::from_utf8(content).expect("utf8")
}

async fn write(namespace: &Namespace, path: &str, text: &str) -> Result<(), FsError> {
    let node = namespace.resolve(path).await?;
    namespace.write_file(&node, text.as_bytes()).await
}

async fn names(namespace: &Namespace, path: &str) -> Vec<String> {
    let node = namespace.resolve(path).await.expect("resolve");
    namespace
        .list(&node)
        .await
        .expect("list")
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

#[tokio::test]
async fn functional_root_lists_fixed_entries_and_help() {
    let (_tracker, namespace) = fixture();
    assert_eq!(
        names(&namespace, "/").await,
        vec!["projects", "issues", "ctl", "help", "structure"]
    );
    assert!(cat(&namespace, "/help").await.contains("search NAME JQL"));
    assert!(cat(&namespace, "/issues/structure").await.contains("transition"));
    assert_eq!(names(&namespace, "/projects").await, vec!["ABC"]);
    assert_eq!(cat(&namespace, "/projects/abc/issuetypes").await, "Task\nBug\n");
    assert_eq!(cat(&namespace, "/projects/ABC/components").await, "Backend\nWeb\n");
}

#[tokio::test]
async fn integration_project_listing_keys_round_trip_to_key_file() {
    let (_tracker, namespace) = fixture();
    let listed = names(&namespace, "/projects/ABC/issues").await;
    assert_eq!(listed, vec!["ABC-1", "ABC-2", "ABC-3", "new"]);
    for key in listed.iter().filter(|name| name.as_str() != "new") {
        let path = format!("/projects/ABC/issues/{key}/key");
        assert_eq!(cat(&namespace, &path).await, format!("{key}\n"));
    }
    assert_eq!(cat(&namespace, "/projects/ABC/issues/2/key").await, "ABC-2\n");

    let missing = namespace.resolve("/projects/ABC/issues/99").await;
    assert!(matches!(missing, Err(FsError::NotFound(_))));
    let missing = namespace.resolve("/issues/ABC-99").await;
    assert!(matches!(missing, Err(FsError::NotFound(_))));
}

#[tokio::test]
async fn regression_truncating_scalar_fields_never_concatenate() {
    let (tracker, namespace) = fixture();
    let node = namespace.resolve("/issues/ABC-1/assignee").await.expect("resolve");
    assert_eq!(namespace.read_file(&node).await.expect("read"), b"alice\n");

    let mut session = namespace.open(&node, OpenMode::write()).await.expect("open");
    session.write(0, b"bo").await.expect("write");
    session.write(2, b"b\n").await.expect("write");
    session.commit().await.expect("commit");

    assert_eq!(tracker.calls_of("set").await, vec!["set ABC-1 assignee=\"bob\""]);
}

#[tokio::test]
async fn functional_multi_line_fields_are_sent_verbatim() {
    let (tracker, namespace) = fixture();
    let node = namespace
        .resolve("/issues/ABC-1/description")
        .await
        .expect("resolve");
    namespace
        .append_file(&node, b"line two\n")
        .await
        .expect("append");
    write(&namespace, "/issues/ABC-1/labels", "ci\nurgent\n")
        .await
        .expect("labels");
    write(&namespace, "/issues/ABC-1/summary", "Fixed\nbuild\n")
        .await
        .expect("summary");

    assert_eq!(
        tracker.calls_of("set").await,
        vec![
            "set ABC-1 description=\"line one\\nline two\\n\"",
            "set ABC-1 labels=\"ci\\nurgent\\n\"",
            "set ABC-1 summary=\"Fixedbuild\"",
        ]
    );
    assert_eq!(cat(&namespace, "/issues/ABC-1/labels").await, "ci\nurgent\n");
}

#[tokio::test]
async fn integration_draft_commit_creates_once_and_then_rejects() {
    let (tracker, namespace) = fixture();
    let draft = namespace
        .resolve("/projects/ABC/issues/new")
        .await
        .expect("draft");
    assert_eq!(
        namespace
            .list(&draft)
            .await
            .expect("list")
            .into_iter()
            .map(|entry| entry.name)
            .collect::<Vec<_>>(),
        vec!["ctl", "description", "type", "summary", "project"]
    );

    let ctl = namespace.resolve_from(&draft, "ctl").await.expect("ctl");
    let error = namespace
        .write_file(&ctl, b"commit\n")
        .await
        .expect_err("missing type");
    assert!(matches!(error, FsError::InvalidInput(_)));

    let summary = namespace.resolve_from(&draft, "summary").await.expect("summary");
    namespace
        .write_file(&summary, b"Flaky test\n")
        .await
        .expect("summary");
    let issue_type = namespace.resolve_from(&draft, "type").await.expect("type");
    namespace.write_file(&issue_type, b"Bug\n").await.expect("type");
    assert_eq!(
        cat(&namespace, "/projects/ABC/issues/new/summary").await,
        "Flaky test\n"
    );

    let mut session = namespace.open(&ctl, OpenMode::write()).await.expect("open");
    session.write(0, b"commit\n").await.expect("first commit");
    let error = session.write(0, b"commit\n").await.expect_err("second commit");
    assert!(matches!(error, FsError::AlreadyCommitted(ref key) if key == "ABC-4"));
    session.commit().await.expect("close");

    assert_eq!(tracker.calls_of("create").await, vec!["create ABC-4 Flaky test"]);
    let key = namespace.resolve_from(&draft, "key").await.expect("key");
    assert_eq!(namespace.read_file(&key).await.expect("read"), b"ABC-4\n");
    let created = tracker.issue("ABC-4").await.expect("created");
    assert_eq!(created.fields.expect("fields").issuetype.name, "Bug");

    let fresh_ctl = namespace.resolve_from(&draft, "ctl").await.expect("ctl");
    let error = namespace
        .write_file(&fresh_ctl, b"commit\n")
        .await
        .expect_err("committed ctl");
    assert!(matches!(error, FsError::UnknownCommand(_)));

    assert_eq!(cat(&namespace, "/projects/ABC/issues/new/summary").await, "");
}

#[tokio::test]
async fn integration_global_draft_requires_a_project() {
    let (tracker, namespace) = fixture();
    write(&namespace, "/issues/new/type", "Task\n").await.expect("type");
    let error = write(&namespace, "/issues/new/ctl", "commit")
        .await
        .expect_err("no project");
    assert!(matches!(error, FsError::InvalidInput(_)));

    write(&namespace, "/issues/new/project", "ABC\n").await.expect("project");
    write(&namespace, "/issues/new/ctl", "commit").await.expect("commit");
    assert_eq!(tracker.calls_of("create").await.len(), 1);
}

#[tokio::test]
async fn regression_concurrent_draft_commits_create_one_issue() {
    let (tracker, namespace) = fixture();
    write(&namespace, "/projects/ABC/issues/new/type", "Task\n")
        .await
        .expect("type");
    let first = namespace
        .resolve("/projects/ABC/issues/new/ctl")
        .await
        .expect("first ctl");
    let second = namespace
        .resolve("/projects/ABC/issues/new/ctl")
        .await
        .expect("second ctl");

    let (first, second) = tokio::join!(
        namespace.write_file(&first, b"commit\n"),
        namespace.write_file(&second, b"commit\n"),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(FsError::InvalidInput(_) | FsError::AlreadyCommitted(_))
    )));
    assert_eq!(tracker.calls_of("create").await, vec!["create ABC-4 "]);
}

#[tokio::test]
async fn integration_failed_remote_create_leaves_draft_committable() {
    let (tracker, namespace) = fixture();
    write(&namespace, "/issues/new/type", "Task\n").await.expect("type");
    write(&namespace, "/issues/new/project", "XYZ\n").await.expect("project");
    let error = write(&namespace, "/issues/new/ctl", "commit")
        .await
        .expect_err("unknown project");
    assert!(matches!(
        error,
        FsError::Remote(TrackerError::Status { status: 400, .. })
    ));
    assert_eq!(cat(&namespace, "/issues/new/type").await, "Task\n");
    assert_eq!(cat(&namespace, "/issues/new/project").await, "XYZ\n");

    write(&namespace, "/issues/new/project", "ABC\n").await.expect("project");
    write(&namespace, "/issues/new/ctl", "commit").await.expect("retry");
    assert_eq!(tracker.calls_of("create").await, vec!["create ABC-4 "]);
}

#[tokio::test]
async fn regression_independent_sessions_on_one_field_last_commit_wins() {
    let (tracker, namespace) = fixture();
    let first = namespace
        .resolve("/issues/ABC-2/assignee")
        .await
        .expect("first walk");
    let second = namespace
        .resolve("/issues/ABC-2/assignee")
        .await
        .expect("second walk");
    let mut first = namespace.open(&first, OpenMode::write()).await.expect("open");
    let mut second = namespace.open(&second, OpenMode::write()).await.expect("open");
    first.write(0, b"bob\n").await.expect("write");
    second.write(0, b"carol\n").await.expect("write");
    first.commit().await.expect("first commit");
    second.commit().await.expect("second commit");

    assert_eq!(
        tracker.calls_of("set").await,
        vec!["set ABC-2 assignee=\"bob\"", "set ABC-2 assignee=\"carol\""]
    );
    assert_eq!(cat(&namespace, "/issues/ABC-2/assignee").await, "carol\n");
}

#[tokio::test]
async fn functional_link_diff_creates_only_the_missing_link() {
    let (tracker, namespace) = fixture();
    assert_eq!(
        cat(&namespace, "/issues/ABC-1/links").await,
        "ABC-1 ABC-2 Blocks\n"
    );
    let node = namespace.resolve("/issues/ABC-1/links").await.expect("resolve");
    namespace
        .append_file(&node, b"ABC-1 ABC-3 Relates\nnot a link\nXYZ-1 XYZ-2 Blocks\n")
        .await
        .expect("append");

    assert_eq!(tracker.calls_of("link").await, vec!["link ABC-1 ABC-3 Relates"]);
    assert!(tracker.calls_of("unlink").await.is_empty());

    write(&namespace, "/issues/ABC-1/links", "ABC-1 ABC-3 Relates\n")
        .await
        .expect("drop link");
    assert_eq!(tracker.calls_of("unlink").await, vec!["unlink 500"]);
    assert_eq!(tracker.calls_of("link").await.len(), 1);
}

#[tokio::test]
async fn integration_status_write_walks_the_workflow() {
    let (tracker, namespace) = fixture();
    write(&namespace, "/issues/ABC-1/status", "Done\n")
        .await
        .expect("status");
    assert_eq!(
        tracker.calls_of("transition").await,
        vec!["transition ABC-1 Start", "transition ABC-1 Finish"]
    );
    assert_eq!(tracker.calls_of("workflow").await, vec!["workflow ABC 3"]);
    assert_eq!(tracker.status("ABC-1").await.as_deref(), Some("Done"));

    write(&namespace, "/issues/ABC-1/status", "Done\n")
        .await
        .expect("no-op");
    assert_eq!(tracker.calls_of("transition").await.len(), 2);

    let error = write(&namespace, "/issues/ABC-1/status", "Archived\n")
        .await
        .expect_err("unreachable");
    assert!(matches!(error, FsError::NoPathFound(_)));
}

#[tokio::test]
async fn regression_failed_transition_reports_step_and_keeps_earlier_steps() {
    let (tracker, namespace) = fixture();
    tracker.fail_transition("Finish").await;
    let error = write(&namespace, "/issues/ABC-2/status", "Done")
        .await
        .expect_err("blocked");
    match error {
        FsError::StepFailed { step, action, .. } => {
            assert_eq!(step, 2);
            assert!(action.contains("Finish"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(tracker.status("ABC-2").await.as_deref(), Some("In Progress"));
}

#[tokio::test]
async fn functional_transition_file_lists_and_runs_transitions() {
    let (tracker, namespace) = fixture();
    assert_eq!(cat(&namespace, "/issues/ABC-3/transition").await, "Start\n");
    write(&namespace, "/issues/ABC-3/transition", "Start\n")
        .await
        .expect("transition");
    assert_eq!(tracker.status("ABC-3").await.as_deref(), Some("In Progress"));
    assert_eq!(cat(&namespace, "/issues/ABC-3/transition").await, "Stop\nFinish\n");
}

#[tokio::test]
async fn integration_named_searches_refresh_on_list_only() {
    let (tracker, namespace) = fixture();
    write(&namespace, "/ctl", "search mine assignee = alice\n")
        .await
        .expect("search");
    assert_eq!(tracker.calls_of("search").await.len(), 1);
    assert!(names(&namespace, "/").await.contains(&"mine".to_string()));

    tracker.set_search_results(&["ABC-3"]).await;
    let node = namespace.resolve("/mine/ABC-1").await.expect("stale result");
    assert!(node.is_dir());
    assert_eq!(tracker.calls_of("search").await.len(), 1);

    assert_eq!(names(&namespace, "/mine").await, vec!["ABC-3"]);
    assert_eq!(
        tracker.calls_of("search").await[1],
        "search assignee = alice limit=50"
    );
    assert!(matches!(
        namespace.resolve("/mine/ABC-1").await,
        Err(FsError::NotFound(_))
    ));
}

#[tokio::test]
async fn functional_removing_searches_and_structural_entries() {
    let (_tracker, namespace) = fixture();
    write(&namespace, "/ctl", "search mine assignee = alice")
        .await
        .expect("search");
    namespace.remove("/mine").await.expect("remove search");
    assert!(matches!(
        namespace.resolve("/mine").await,
        Err(FsError::NotFound(_))
    ));
    assert!(matches!(
        namespace.remove("/mine").await,
        Err(FsError::NotFound(_))
    ));
    for fixed in ["ctl", "projects", "issues", "help", "structure"] {
        assert!(matches!(
            namespace.remove(&format!("/{fixed}")).await,
            Err(FsError::PermissionDenied(_))
        ));
    }
}

#[tokio::test]
async fn functional_root_ctl_validates_arguments() {
    let (tracker, namespace) = fixture();
    let error = write(&namespace, "/ctl", "search lonely").await.expect_err("no query");
    assert!(matches!(error, FsError::InvalidInput(_)));
    let error = write(&namespace, "/ctl", "set max-listing many")
        .await
        .expect_err("not a number");
    assert!(matches!(error, FsError::InvalidInput(_)));
    let error = write(&namespace, "/ctl", "set colour blue")
        .await
        .expect_err("unknown variable");
    assert!(matches!(error, FsError::InvalidInput(_)));
    let error = write(&namespace, "/ctl", "reboot").await.expect_err("unknown");
    assert!(matches!(error, FsError::UnknownCommand(_)));
    for fixed in ["ctl", "projects", "issues", "help", "structure"] {
        let error = write(&namespace, "/ctl", &format!("search {fixed} assignee = alice"))
            .await
            .expect_err("reserved name");
        assert!(matches!(error, FsError::InvalidInput(_)));
    }
    assert_eq!(
        names(&namespace, "/").await,
        vec!["projects", "issues", "ctl", "help", "structure"]
    );
    assert!(tracker.calls_of("search").await.is_empty());

    write(&namespace, "/ctl", "set max-listing 1").await.expect("set");
    assert_eq!(names(&namespace, "/projects/ABC/issues").await, vec!["ABC-1", "new"]);

    write(&namespace, "/ctl", "pass-login carol hunter2")
        .await
        .expect("login");
    write(&namespace, "/ctl", "pass-login").await.expect("relogin");
    assert_eq!(
        tracker.calls_of("login").await,
        vec!["login carol", "login <stored>"]
    );
}

#[tokio::test]
async fn integration_comments_can_be_added_edited_and_removed() {
    let (tracker, namespace) = fixture();
    assert_eq!(names(&namespace, "/issues/ABC-1/comments").await, vec!["10", "comment"]);
    assert_eq!(cat(&namespace, "/issues/ABC-1/comments/10/author").await, "bob\n");
    assert_eq!(cat(&namespace, "/issues/ABC-1/comments/10/comment").await, "first look\n");

    write(&namespace, "/issues/ABC-1/comments/comment", "second look\n")
        .await
        .expect("add");
    write(&namespace, "/issues/ABC-1/comments/10/comment", "edited\n")
        .await
        .expect("edit");
    assert_eq!(
        tracker.calls_of("comment").await,
        vec!["comment ABC-1 \"second look\\n\""]
    );
    assert_eq!(
        tracker.calls_of("edit-comment").await,
        vec!["edit-comment ABC-1 10 \"edited\\n\""]
    );

    let listed = names(&namespace, "/issues/ABC-1/comments").await;
    assert_eq!(listed.len(), 3);
    namespace
        .remove("/issues/ABC-1/comments/10")
        .await
        .expect("remove");
    assert!(matches!(
        namespace.resolve("/issues/ABC-1/comments/10").await,
        Err(FsError::NotFound(_))
    ));
    assert!(matches!(
        namespace.remove("/issues/ABC-1/comments/comment").await,
        Err(FsError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn functional_worklog_and_progress_render_time_spans() {
    let (_tracker, namespace) = fixture();
    assert_eq!(names(&namespace, "/issues/ABC-1/worklog").await, vec!["20"]);
    assert_eq!(cat(&namespace, "/issues/ABC-1/worklog/20/time").await, "1h30m0s\n");
    assert_eq!(cat(&namespace, "/issues/ABC-1/worklog/20/author").await, "carol\n");
    assert_eq!(
        cat(&namespace, "/issues/ABC-1/worklog/20/started").await,
        "2024-03-01 09:30:00 +0000\n"
    );
    assert_eq!(
        cat(&namespace, "/issues/ABC-1/progress").await,
        "Progress: 30m0s, Remaining: 1h30m0s, Total: 2h0m0s\n"
    );

    let node = namespace.resolve("/issues/ABC-1/progress").await.expect("resolve");
    assert!(matches!(
        namespace.open(&node, OpenMode::write()).await,
        Err(FsError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn functional_raw_is_tab_indented_and_written_back_verbatim() {
    let (tracker, namespace) = fixture();
    let raw = cat(&namespace, "/issues/ABC-2/raw").await;
    assert!(raw.starts_with("{\n\t\"id\""));
    assert!(raw.contains("\t\"key\": \"ABC-2\""));
    write(&namespace, "/issues/ABC-2/raw", &raw).await.expect("raw");
    assert_eq!(tracker.calls_of("raw").await, vec![format!("raw ABC-2 {}", raw.len())]);
}

#[tokio::test]
async fn integration_issue_ctl_deletes_remote_issue() {
    let (tracker, namespace) = fixture();
    write(&namespace, "/issues/ABC-3/ctl", "delete\n")
        .await
        .expect("delete");
    assert!(tracker.issue("ABC-3").await.is_none());
    assert!(matches!(
        namespace.resolve("/issues/ABC-3").await,
        Err(FsError::NotFound(_))
    ));
}
