use std::sync::Arc;

use async_trait::async_trait;
use jirafs_namespace::{strings_to_entries, DirEntry, FileMode, FsResult, Node, SyntheticFile, View};

use crate::context::{found, FsContext};
use crate::render::{format_duration, render_timestamp};

const WORKLOG_FILES: [&str; 4] = ["comment", "author", "time", "started"];

/// Read-only `worklog/` of one issue.
pub struct IssueWorklogView {
    ctx: Arc<FsContext>,
    key: String,
}

impl IssueWorklogView {
    pub fn new(ctx: Arc<FsContext>, key: &str) -> Self {
        Self {
            ctx,
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl View for IssueWorklogView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        let worklogs = self.ctx.client().get_worklog_for_issue(&self.key).await?;
        if !worklogs.iter().any(|worklog| worklog.id == name) {
            return Ok(None);
        }
        let view = WorklogView {
            ctx: Arc::clone(&self.ctx),
            key: self.key.clone(),
            worklog_id: name.to_string(),
        };
        Ok(Some(Node::dir(name, FileMode::DIR_READ_ONLY, view)))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let worklogs = self.ctx.client().get_worklog_for_issue(&self.key).await?;
        Ok(strings_to_entries(
            worklogs.iter().map(|worklog| worklog.id.as_str()),
            FileMode::DIR_READ_ONLY,
        ))
    }
}

struct WorklogView {
    ctx: Arc<FsContext>,
    key: String,
    worklog_id: String,
}

#[async_trait]
impl View for WorklogView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        if !WORKLOG_FILES.contains(&name) {
            return Ok(None);
        }
        let Some(worklog) = found(
            self.ctx
                .client()
                .get_specific_worklog_for_issue(&self.key, &self.worklog_id)
                .await,
        )?
        else {
            return Ok(None);
        };
        let content = match name {
            "comment" => worklog.comment,
            "author" => worklog.author.map(|author| author.name).unwrap_or_default(),
            "time" => format_duration(worklog.time_spent_seconds),
            _ => render_timestamp(&worklog.started),
        };
        Ok(Some(Node::file(SyntheticFile::with_content(
            name,
            FileMode::READ_ONLY,
            format!("{content}\n"),
        ))))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        Ok(strings_to_entries(WORKLOG_FILES, FileMode::READ_ONLY))
    }
}
