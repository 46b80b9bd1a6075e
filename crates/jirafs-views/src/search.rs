use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use jirafs_namespace::{strings_to_entries, DirEntry, FileMode, FsResult, Node, View};
use jirafs_tracker::TrackerError;
use tracing::debug;

use crate::context::{found, FsContext};
use crate::issue::IssueView;

/// A saved query. Listing re-runs it; walking only consults the result set
/// of the last run.
pub struct SearchView {
    ctx: Arc<FsContext>,
    query: String,
    results: Mutex<Vec<String>>,
}

impl SearchView {
    pub fn new(ctx: Arc<FsContext>, query: &str) -> Self {
        Self {
            ctx,
            query: query.to_string(),
            results: Mutex::new(Vec::new()),
        }
    }

    fn results(&self) -> MutexGuard<'_, Vec<String>> {
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs the query and replaces the stored result set.
    pub async fn refresh(&self) -> FsResult<Vec<String>> {
        let keys = self
            .ctx
            .client()
            .get_keys_for_search(&self.query, self.ctx.max_listing())
            .await?;
        debug!(query = %self.query, hits = keys.len(), "search refreshed");
        *self.results() = keys.clone();
        Ok(keys)
    }
}

#[async_trait]
impl View for SearchView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        let known = self.results().iter().any(|key| key == name);
        if !known {
            return Ok(None);
        }
        let Some(issue) = found(self.ctx.client().get_issue(name).await)? else {
            return Ok(None);
        };
        let fields = issue.fields.as_ref().ok_or_else(|| {
            TrackerError::Invalid(format!("issue {} is missing its fields", issue.key))
        })?;
        let view = IssueView::existing(Arc::clone(&self.ctx), &issue.key, &fields.project.key);
        Ok(Some(view.into_node(name)))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let keys = self.refresh().await?;
        Ok(strings_to_entries(keys, FileMode::DIR_READ_ONLY))
    }
}
