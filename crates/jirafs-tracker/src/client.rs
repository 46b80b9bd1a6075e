use async_trait::async_trait;

use crate::error::TrackerResult;
use crate::model::{Comment, Issue, Project, Transition, Worklog};
use crate::workflow::{WorkflowEdge, WorkflowGraph};

#[derive(Clone, PartialEq, Eq)]
/// Username/password pair used for basic authentication.
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Field values for an issue that does not exist yet.
pub struct NewIssue {
    pub project: String,
    pub issue_type: String,
    pub summary: String,
    pub description: String,
}

/// Remote operations the namespace needs from an issue tracker.
///
/// Implementations never retry; every error is surfaced to the caller as-is.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn get_issue(&self, key: &str) -> TrackerResult<Issue>;
    /// Creates an issue and returns its assigned key.
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<String>;
    async fn delete_issue(&self, key: &str) -> TrackerResult<()>;
    /// Updates one field from its text rendering (`labels`, `components`
    /// take one value per line).
    async fn set_field_in_issue(&self, key: &str, field: &str, value: &str) -> TrackerResult<()>;
    async fn set_issue_raw(&self, key: &str, raw: &[u8]) -> TrackerResult<()>;

    async fn get_transitions_for_issue(&self, key: &str) -> TrackerResult<Vec<Transition>>;
    /// Executes the currently available transition named `transition`.
    async fn transition_issue(&self, key: &str, transition: &str) -> TrackerResult<()>;

    async fn link_issues(&self, inward: &str, outward: &str, relation: &str) -> TrackerResult<()>;
    async fn delete_issue_link(&self, link_id: &str) -> TrackerResult<()>;

    async fn get_comment(&self, key: &str, comment_id: &str) -> TrackerResult<Comment>;
    async fn add_comment(&self, key: &str, body: &str) -> TrackerResult<()>;
    async fn set_comment(&self, key: &str, comment_id: &str, body: &str) -> TrackerResult<()>;
    async fn remove_comment(&self, key: &str, comment_id: &str) -> TrackerResult<()>;
    async fn get_comments_for_issue(&self, key: &str) -> TrackerResult<Vec<Comment>>;

    async fn get_worklog_for_issue(&self, key: &str) -> TrackerResult<Vec<Worklog>>;
    async fn get_specific_worklog_for_issue(
        &self,
        key: &str,
        worklog_id: &str,
    ) -> TrackerResult<Worklog>;

    async fn get_project(&self, key: &str) -> TrackerResult<Project>;
    async fn get_projects(&self) -> TrackerResult<Vec<Project>>;

    /// Returns at most `limit` issue keys matching `jql`.
    async fn get_keys_for_search(&self, jql: &str, limit: usize) -> TrackerResult<Vec<String>>;

    async fn get_keys_for_n_issues_in_project(
        &self,
        project: &str,
        limit: usize,
    ) -> TrackerResult<Vec<String>> {
        self.get_keys_for_search(&format!("project = \"{project}\" ORDER BY key ASC"), limit)
            .await
    }

    /// Lists every `(from, transition, to)` edge of the workflow bound to the
    /// issue type in the given project, in tracker order.
    async fn get_workflow_edges(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> TrackerResult<Vec<WorkflowEdge>>;

    async fn build_workflow(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> TrackerResult<WorkflowGraph> {
        let edges = self.get_workflow_edges(project, issue_type_id).await?;
        Ok(WorkflowGraph::from_edges(edges))
    }

    /// Re-authenticates with the stored credentials, or with `credentials`
    /// which then replace the stored ones.
    async fn login(&self, credentials: Option<Credentials>) -> TrackerResult<()>;
}
