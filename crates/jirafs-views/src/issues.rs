use std::sync::Arc;

use async_trait::async_trait;
use jirafs_namespace::{strings_to_entries, DirEntry, FileMode, FsResult, Node, SyntheticFile, View};
use jirafs_tracker::TrackerError;
use tracing::debug;

use crate::context::{found, FsContext};
use crate::help::{ISSUES_HELP, ISSUES_STRUCTURE};
use crate::issue::IssueView;

/// Draft scope of the project-less `new` entry under `/issues`.
const GLOBAL_DRAFT_SCOPE: &str = "issues";

/// `/issues`: recently listed issue keys, the global `new` draft, and help.
pub struct AllIssuesView {
    ctx: Arc<FsContext>,
}

impl AllIssuesView {
    pub fn new(ctx: Arc<FsContext>) -> Self {
        Self { ctx }
    }
}

/// `KEY-N` with a numeric suffix, upper-cased.
pub fn parse_issue_key(name: &str) -> Option<String> {
    let key = name.to_uppercase();
    let (project, number) = key.split_once('-')?;
    if project.is_empty() || number.contains('-') || number.parse::<u64>().is_err() {
        return None;
    }
    Some(key)
}

#[async_trait]
impl View for AllIssuesView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        match name {
            "new" => {
                let view = IssueView::draft(Arc::clone(&self.ctx), GLOBAL_DRAFT_SCOPE, "");
                return Ok(Some(view.into_node(name)));
            }
            "help" => {
                return Ok(Some(Node::file(SyntheticFile::with_content(
                    name,
                    FileMode::READ_ONLY,
                    ISSUES_HELP,
                ))));
            }
            "structure" => {
                return Ok(Some(Node::file(SyntheticFile::with_content(
                    name,
                    FileMode::READ_ONLY,
                    ISSUES_STRUCTURE,
                ))));
            }
            _ => {}
        }

        let Some(key) = parse_issue_key(name) else {
            return Ok(None);
        };
        let Some(issue) = found(self.ctx.client().get_issue(&key).await)? else {
            debug!(key = %key, "issue not found");
            return Ok(None);
        };
        let fields = issue.fields.as_ref().ok_or_else(|| {
            TrackerError::Invalid(format!("issue {} is missing its fields", issue.key))
        })?;
        let view = IssueView::existing(Arc::clone(&self.ctx), &issue.key, &fields.project.key);
        Ok(Some(view.into_node(name)))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let mut keys = self
            .ctx
            .client()
            .get_keys_for_search("", self.ctx.max_listing())
            .await?;
        keys.push("new".to_string());
        let mut entries = strings_to_entries(keys, FileMode::DIR_READ_ONLY);
        entries.extend(strings_to_entries(["help", "structure"], FileMode::READ_ONLY));
        Ok(entries)
    }
}
