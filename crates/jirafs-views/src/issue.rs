use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use jirafs_namespace::{
    CommandFile, CommitFile, CommitHandler, DirEntry, FileMode, FsError, FsResult, Node,
    SyntheticFile, View,
};
use jirafs_tracker::{Issue, NewIssue, TrackerError};
use tracing::{debug, info, warn};

use crate::comments::IssueCommentsView;
use crate::context::{found, FsContext};
use crate::render::{
    lines, render_issue_link, render_progress, strip_newlines, tab_indented_json, LinkLine,
};
use crate::worklog::IssueWorklogView;

/// Longest transition chain a status write will attempt.
pub const MAX_WORKFLOW_STEPS: usize = 500;

const DRAFT_FILES: [&str; 5] = ["ctl", "description", "type", "summary", "project"];
const ISSUE_FILES: [&str; 18] = [
    "assignee",
    "creator",
    "ctl",
    "description",
    "type",
    "key",
    "reporter",
    "status",
    "summary",
    "labels",
    "transition",
    "priority",
    "resolution",
    "raw",
    "progress",
    "links",
    "components",
    "project",
];
const ISSUE_DIRS: [&str; 2] = ["comments", "worklog"];
const READ_ONLY_FILES: [&str; 3] = ["key", "project", "progress"];

#[derive(Debug, Default)]
struct IssueRecord {
    key: String,
    new_issue: bool,
    committing: bool,
    values: BTreeMap<String, String>,
}

/// Mutable identity of one issue directory. A draft flips to a committed
/// issue exactly once.
#[derive(Debug)]
pub struct IssueState {
    home_project: String,
    record: Mutex<IssueRecord>,
}

impl IssueState {
    pub(crate) fn draft(home_project: &str) -> Self {
        Self {
            home_project: home_project.to_string(),
            record: Mutex::new(IssueRecord {
                new_issue: true,
                ..IssueRecord::default()
            }),
        }
    }

    pub(crate) fn existing(key: &str, project: &str) -> Self {
        Self {
            home_project: project.to_string(),
            record: Mutex::new(IssueRecord {
                key: key.to_string(),
                ..IssueRecord::default()
            }),
        }
    }

    fn record(&self) -> MutexGuard<'_, IssueRecord> {
        self.record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_new(&self) -> bool {
        self.record().new_issue
    }

    /// Assigned key; `None` while the issue is still a draft.
    pub fn key(&self) -> Option<String> {
        let record = self.record();
        (!record.new_issue).then(|| record.key.clone())
    }
}

/// Marks a draft as being committed; released on drop, so a failed or
/// cancelled create leaves the draft committable again.
struct CommitClaim<'a> {
    state: &'a IssueState,
}

impl Drop for CommitClaim<'_> {
    fn drop(&mut self) {
        self.state.record().committing = false;
    }
}

#[derive(Clone)]
/// Directory of one issue, in draft or committed form.
pub struct IssueView {
    ctx: Arc<FsContext>,
    state: Arc<IssueState>,
    draft_scope: Option<String>,
}

impl IssueView {
    pub fn existing(ctx: Arc<FsContext>, key: &str, project: &str) -> Self {
        Self {
            ctx,
            state: Arc::new(IssueState::existing(key, project)),
            draft_scope: None,
        }
    }

    /// The pending draft for `scope`, shared by every walk of that scope's
    /// `new` entry until it is committed.
    pub fn draft(ctx: Arc<FsContext>, scope: &str, project: &str) -> Self {
        let state = ctx.draft(scope, project);
        Self {
            ctx,
            state,
            draft_scope: Some(scope.to_string()),
        }
    }

    pub fn into_node(self, name: &str) -> Node {
        Node::dir(name, FileMode::DIR_READ_ONLY, self)
    }

    fn draft_walk(&self, name: &str) -> Option<Node> {
        if !DRAFT_FILES.contains(&name) {
            return None;
        }
        if name == "ctl" {
            let view = self.clone();
            let ctl = CommandFile::new("ctl").command("commit", move |_args: Vec<String>| {
                let view = view.clone();
                async move { view.commit_draft().await }
            });
            return Some(Node::file(ctl));
        }
        let seed = self
            .state
            .record()
            .values
            .get(name)
            .cloned()
            .unwrap_or_default();
        let file = CommitFile::new(
            SyntheticFile::with_content(name, FileMode::READ_WRITE, seed),
            DraftFieldCommit {
                state: Arc::clone(&self.state),
                field: name.to_string(),
            },
        );
        Some(Node::file(file))
    }

    fn drafted_issue(&self, record: &IssueRecord) -> FsResult<NewIssue> {
        let single_line = |field: &str| {
            record
                .values
                .get(field)
                .map(|value| strip_newlines(value))
                .unwrap_or_default()
        };
        let mut issue = NewIssue {
            project: single_line("project"),
            issue_type: single_line("type"),
            summary: single_line("summary"),
            description: record.values.get("description").cloned().unwrap_or_default(),
        };
        if issue.project.is_empty() {
            issue.project = self.state.home_project.clone();
        }
        if issue.project.is_empty() {
            return Err(FsError::InvalidInput("new issue has no project".to_string()));
        }
        if issue.issue_type.is_empty() {
            return Err(FsError::InvalidInput("new issue has no type".to_string()));
        }
        Ok(issue)
    }

    /// Creates the drafted issue. The draft is claimed under its lock before
    /// the remote call, so a concurrent commit fails without creating a
    /// second issue.
    async fn commit_draft(&self) -> FsResult<()> {
        let issue = {
            let mut record = self.state.record();
            if !record.new_issue {
                return Err(FsError::AlreadyCommitted(record.key.clone()));
            }
            if record.committing {
                return Err(FsError::InvalidInput(
                    "new issue commit already in progress".to_string(),
                ));
            }
            let issue = self.drafted_issue(&record)?;
            record.committing = true;
            issue
        };
        let claim = CommitClaim { state: &self.state };

        let key = match self.ctx.client().create_issue(&issue).await {
            Ok(key) => key,
            Err(error) => {
                warn!(project = %issue.project, "issue create failed: {error}");
                return Err(error.into());
            }
        };

        {
            let mut record = self.state.record();
            record.key = key.clone();
            record.new_issue = false;
        }
        drop(claim);
        if let Some(scope) = &self.draft_scope {
            self.ctx.release_draft(scope, &self.state);
        }
        info!(key = %key, project = %issue.project, "created issue");
        Ok(())
    }

    async fn issue_walk(&self, key: &str, name: &str) -> FsResult<Option<Node>> {
        if !ISSUE_FILES.contains(&name) && !ISSUE_DIRS.contains(&name) {
            return Ok(None);
        }
        let Some(issue) = found(self.ctx.client().get_issue(key).await)? else {
            return Ok(None);
        };

        let content = match name {
            "comments" => {
                let view = IssueCommentsView::new(Arc::clone(&self.ctx), &issue.key);
                return Ok(Some(Node::dir(name, FileMode::DIR_READ_ONLY, view)));
            }
            "worklog" => {
                let view = IssueWorklogView::new(Arc::clone(&self.ctx), &issue.key);
                return Ok(Some(Node::dir(name, FileMode::DIR_READ_ONLY, view)));
            }
            "ctl" => {
                let ctx = Arc::clone(&self.ctx);
                let key = issue.key.clone();
                let ctl = CommandFile::new("ctl").command("delete", move |_args: Vec<String>| {
                    let ctx = Arc::clone(&ctx);
                    let key = key.clone();
                    async move {
                        ctx.client().delete_issue(&key).await?;
                        info!(key = %key, "deleted issue");
                        FsResult::Ok(())
                    }
                });
                return Ok(Some(Node::file(ctl)));
            }
            "transition" => {
                let transitions = self
                    .ctx
                    .client()
                    .get_transitions_for_issue(&issue.key)
                    .await?;
                lines(transitions.iter().map(|transition| transition.name.as_str())).into_bytes()
            }
            "raw" => tab_indented_json(&issue)
                .map_err(|error| TrackerError::Invalid(format!("cannot render issue: {error}")))?,
            _ => field_text(&issue, name).into_bytes(),
        };

        if READ_ONLY_FILES.contains(&name) {
            return Ok(Some(Node::file(SyntheticFile::with_content(
                name,
                FileMode::READ_ONLY,
                content,
            ))));
        }
        let file = CommitFile::new(
            SyntheticFile::with_content(name, FileMode::READ_WRITE, content),
            IssueFieldCommit {
                ctx: Arc::clone(&self.ctx),
                issue,
                field: name.to_string(),
            },
        )
        .force_trunc(truncates_on_write(name));
        Ok(Some(Node::file(file)))
    }
}

#[async_trait]
impl View for IssueView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        match self.state.key() {
            None => Ok(self.draft_walk(name)),
            Some(key) => self.issue_walk(&key, name).await,
        }
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        if self.state.is_new() {
            return Ok(DRAFT_FILES
                .iter()
                .map(|name| DirEntry::new(name, FileMode::READ_WRITE))
                .collect());
        }
        let files = ISSUE_FILES.iter().map(|name| {
            let mode = if READ_ONLY_FILES.contains(name) {
                FileMode::READ_ONLY
            } else {
                FileMode::READ_WRITE
            };
            DirEntry::new(name, mode)
        });
        let dirs = ISSUE_DIRS
            .iter()
            .map(|name| DirEntry::new(name, FileMode::DIR_READ_ONLY));
        Ok(files.chain(dirs).collect())
    }
}

/// Single-line scalar fields are replaced wholesale on write; multi-line
/// fields are edited in place.
fn truncates_on_write(field: &str) -> bool {
    !matches!(
        field,
        "summary" | "description" | "components" | "labels" | "links"
    )
}

fn field_text(issue: &Issue, field: &str) -> String {
    if field == "key" {
        return format!("{}\n", issue.key);
    }
    let Some(fields) = issue.fields.as_ref() else {
        return String::new();
    };
    let line = |value: &str| format!("{value}\n");
    let text = match field {
        "assignee" => fields.assignee.as_ref().map(|user| line(&user.name)),
        "reporter" => fields.reporter.as_ref().map(|user| line(&user.name)),
        "creator" => fields.creator.as_ref().map(|user| line(&user.name)),
        "summary" => Some(line(&fields.summary)),
        "description" => Some(line(fields.description.as_deref().unwrap_or_default())),
        "type" => Some(line(&fields.issuetype.name)),
        "status" => fields.status.as_ref().map(|status| line(&status.name)),
        "priority" => fields.priority.as_ref().map(|priority| line(&priority.name)),
        "resolution" => fields
            .resolution
            .as_ref()
            .map(|resolution| line(&resolution.name)),
        "progress" => fields.progress.as_ref().map(render_progress),
        "project" => Some(line(&fields.project.key)),
        "components" => Some(lines(
            fields
                .components
                .iter()
                .map(|component| component.name.as_str()),
        )),
        "labels" => Some(lines(&fields.labels)),
        "links" => Some(lines(
            fields
                .issuelinks
                .iter()
                .map(|link| render_issue_link(link, &issue.key))
                .filter(|rendered| !rendered.is_empty()),
        )),
        _ => None,
    };
    text.unwrap_or_default()
}

struct DraftFieldCommit {
    state: Arc<IssueState>,
    field: String,
}

#[async_trait]
impl CommitHandler for DraftFieldCommit {
    async fn commit(&self, content: Vec<u8>) -> FsResult<()> {
        let value = String::from_utf8_lossy(&content).into_owned();
        self.state
            .record()
            .values
            .insert(self.field.clone(), value);
        Ok(())
    }
}

/// Pushes one edited issue file back to the tracker.
struct IssueFieldCommit {
    ctx: Arc<FsContext>,
    issue: Issue,
    field: String,
}

#[async_trait]
impl CommitHandler for IssueFieldCommit {
    async fn commit(&self, content: Vec<u8>) -> FsResult<()> {
        let client = self.ctx.client();
        let key = self.issue.key.as_str();
        let text = String::from_utf8_lossy(&content);
        match self.field.as_str() {
            "raw" => client.set_issue_raw(key, &content).await?,
            "links" => self.apply_links(&text).await?,
            "transition" => client.transition_issue(key, &strip_newlines(&text)).await?,
            "status" => self.move_to_status(&strip_newlines(&text)).await?,
            "description" | "labels" | "components" => {
                client.set_field_in_issue(key, &self.field, &text).await?
            }
            field => {
                client
                    .set_field_in_issue(key, field, &strip_newlines(&text))
                    .await?
            }
        }
        debug!(key, field = %self.field, "issue field committed");
        Ok(())
    }
}

impl IssueFieldCommit {
    /// Diffs the written link lines against the links the file was seeded
    /// with: vanished links are deleted, then new lines naming this issue
    /// are created. Stops at the first failing step.
    async fn apply_links(&self, text: &str) -> FsResult<()> {
        let key = self.issue.key.as_str();
        let mut current: BTreeMap<String, String> = self
            .issue
            .fields
            .iter()
            .flat_map(|fields| fields.issuelinks.iter())
            .map(|link| (render_issue_link(link, key), link.id.clone()))
            .filter(|(rendered, _)| !rendered.is_empty())
            .collect();

        let mut additions = BTreeSet::new();
        for line in text.lines() {
            let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
            if normalized.is_empty() {
                continue;
            }
            if current.remove(&normalized).is_none() {
                additions.insert(normalized);
            }
        }

        let client = self.ctx.client();
        let mut step = 0;
        for (rendered, link_id) in &current {
            step += 1;
            if let Err(source) = client.delete_issue_link(link_id).await {
                warn!(key, link = %rendered, "link delete failed: {source}");
                return Err(FsError::StepFailed {
                    step,
                    action: format!("delete link '{rendered}'"),
                    source,
                });
            }
        }
        for line in &additions {
            let Some(link) = LinkLine::parse(line) else {
                debug!(key, line = %line, "skipping malformed link line");
                continue;
            };
            if !link.mentions(key) {
                debug!(key, line = %line, "skipping link that does not name the issue");
                continue;
            }
            step += 1;
            if let Err(source) = client
                .link_issues(&link.inward, &link.outward, &link.relation)
                .await
            {
                warn!(key, link = %line, "link create failed: {source}");
                return Err(FsError::StepFailed {
                    step,
                    action: format!("create link '{line}'"),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Moves the issue to `target` along the shortest transition chain of
    /// its workflow. Transitions already applied stay applied if a later one
    /// fails.
    async fn move_to_status(&self, target: &str) -> FsResult<()> {
        let client = self.ctx.client();
        let issue = client.get_issue(&self.issue.key).await?;
        let fields = issue.fields.as_ref().ok_or_else(|| {
            TrackerError::Invalid(format!("issue {} is missing its fields", issue.key))
        })?;
        let current = fields.status.as_ref().ok_or_else(|| {
            TrackerError::Invalid(format!("issue {} is missing its status", issue.key))
        })?;

        let workflow = client
            .build_workflow(&fields.project.key, &fields.issuetype.id)
            .await?;
        let path = match workflow.path(&current.name, target, MAX_WORKFLOW_STEPS) {
            Ok(path) => path,
            Err(error) => {
                warn!(key = %issue.key, "{error}\n{}", workflow.dump());
                return Err(error.into());
            }
        };
        info!(key = %issue.key, path = %path.join(", "), "workflow path");

        for (index, transition) in path.iter().enumerate() {
            if let Err(source) = client.transition_issue(&issue.key, transition).await {
                warn!(key = %issue.key, transition = %transition, "transition failed: {source}");
                return Err(FsError::StepFailed {
                    step: index + 1,
                    action: format!("transition '{transition}'"),
                    source,
                });
            }
        }
        Ok(())
    }
}
