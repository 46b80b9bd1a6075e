use std::sync::Arc;

use async_trait::async_trait;
use jirafs_namespace::{strings_to_entries, DirEntry, FileMode, FsResult, Node, SyntheticFile, View};
use jirafs_tracker::TrackerError;
use tracing::debug;

use crate::context::{found, FsContext};
use crate::issue::IssueView;
use crate::render::{lines, tab_indented_json};

/// `/projects`: one directory per project key.
pub struct AllProjectsView {
    ctx: Arc<FsContext>,
}

impl AllProjectsView {
    pub fn new(ctx: Arc<FsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl View for AllProjectsView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        let key = name.to_uppercase();
        let projects = self.ctx.client().get_projects().await?;
        if !projects.iter().any(|project| project.key == key) {
            return Ok(None);
        }
        let view = ProjectView {
            ctx: Arc::clone(&self.ctx),
            project: key,
        };
        Ok(Some(Node::dir(name, FileMode::DIR_READ_ONLY, view)))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let projects = self.ctx.client().get_projects().await?;
        Ok(strings_to_entries(
            projects.iter().map(|project| project.key.as_str()),
            FileMode::DIR_READ_ONLY,
        ))
    }
}

struct ProjectView {
    ctx: Arc<FsContext>,
    project: String,
}

#[async_trait]
impl View for ProjectView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        if name == "issues" {
            let view = ProjectIssuesView {
                ctx: Arc::clone(&self.ctx),
                project: self.project.clone(),
            };
            return Ok(Some(Node::dir(name, FileMode::DIR_READ_ONLY, view)));
        }
        if !matches!(name, "components" | "issuetypes" | "raw") {
            return Ok(None);
        }
        let Some(project) = found(self.ctx.client().get_project(&self.project).await)? else {
            return Ok(None);
        };
        let content = match name {
            "components" => {
                lines(project.components.iter().map(|component| component.name.as_str()))
                    .into_bytes()
            }
            "issuetypes" => {
                lines(project.issue_types.iter().map(|issue_type| issue_type.name.as_str()))
                    .into_bytes()
            }
            _ => tab_indented_json(&project).map_err(|error| {
                TrackerError::Invalid(format!("cannot render project {}: {error}", project.key))
            })?,
        };
        Ok(Some(Node::file(SyntheticFile::with_content(
            name,
            FileMode::READ_ONLY,
            content,
        ))))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let mut entries = vec![DirEntry::new("issues", FileMode::DIR_READ_ONLY)];
        entries.extend(strings_to_entries(
            ["issuetypes", "components", "raw"],
            FileMode::READ_ONLY,
        ));
        Ok(entries)
    }
}

/// `/projects/KEY/issues`: issue keys of one project plus its `new` draft.
struct ProjectIssuesView {
    ctx: Arc<FsContext>,
    project: String,
}

impl ProjectIssuesView {
    /// Accepts `7` as well as `KEY-7`.
    fn issue_key(&self, name: &str) -> Option<String> {
        let number = name
            .to_uppercase()
            .strip_prefix(&format!("{}-", self.project))
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string());
        number
            .parse::<u64>()
            .ok()
            .map(|number| format!("{}-{number}", self.project))
    }
}

#[async_trait]
impl View for ProjectIssuesView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        if name == "new" {
            let scope = format!("projects/{}", self.project);
            let view = IssueView::draft(Arc::clone(&self.ctx), &scope, &self.project);
            return Ok(Some(view.into_node(name)));
        }
        let Some(key) = self.issue_key(name) else {
            return Ok(None);
        };
        let Some(issue) = found(self.ctx.client().get_issue(&key).await)? else {
            debug!(key = %key, "issue not found");
            return Ok(None);
        };
        let view = IssueView::existing(Arc::clone(&self.ctx), &issue.key, &self.project);
        Ok(Some(view.into_node(name)))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let mut keys = self
            .ctx
            .client()
            .get_keys_for_n_issues_in_project(&self.project, self.ctx.max_listing())
            .await?;
        keys.push("new".to_string());
        Ok(strings_to_entries(keys, FileMode::DIR_READ_ONLY))
    }
}
