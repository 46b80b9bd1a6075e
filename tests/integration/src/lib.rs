//! In-memory tracker used by the cross-crate scenario tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use jirafs_tracker::{
    Comment, Credentials, Issue, IssueFields, IssueLink, IssueLinkType, LinkedIssue, Named,
    NewIssue, Progress, Project, ProjectRef, TrackerClient, TrackerError, TrackerResult,
    Transition, User, WorkflowEdge, Worklog,
};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Default)]
struct TrackerState {
    projects: Vec<Project>,
    issues: BTreeMap<String, Issue>,
    comments: BTreeMap<String, Vec<Comment>>,
    worklogs: BTreeMap<String, Vec<Worklog>>,
    workflow: Vec<WorkflowEdge>,
    search_results: Vec<String>,
    failing_transitions: BTreeSet<String>,
    next_id: u64,
    calls: Vec<String>,
}

impl TrackerState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn issue_mut(&mut self, key: &str) -> TrackerResult<&mut Issue> {
        self.issues
            .get_mut(key)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {key}")))
    }

    fn fields_mut(&mut self, key: &str) -> TrackerResult<&mut IssueFields> {
        self.issue_mut(key)?
            .fields
            .as_mut()
            .ok_or_else(|| TrackerError::Invalid(format!("issue {key} has no fields")))
    }

    fn status_of(&self, key: &str) -> TrackerResult<String> {
        self.issues
            .get(key)
            .and_then(|issue| issue.fields.as_ref())
            .and_then(|fields| fields.status.as_ref())
            .map(|status| status.name.clone())
            .ok_or_else(|| TrackerError::NotFound(format!("issue {key}")))
    }
}

/// Scripted tracker: seeded with one project, three issues, a comment, a
/// worklog and a three-state workflow. Every mutating call is recorded.
pub struct MemoryTracker {
    state: AsyncMutex<TrackerState>,
}

impl Default for MemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTracker {
    pub fn new() -> Self {
        let mut state = TrackerState {
            next_id: 1000,
            ..TrackerState::default()
        };
        state.projects.push(Project {
            id: "100".to_string(),
            key: "ABC".to_string(),
            name: "Alpha".to_string(),
            components: vec![Named::with_name("Backend"), Named::with_name("Web")],
            issue_types: vec![Named::with_name("Task"), Named::with_name("Bug")],
            ..Project::default()
        });
        for key in ["ABC-1", "ABC-2", "ABC-3"] {
            state.issues.insert(key.to_string(), seeded_issue(key));
        }
        if let Some(fields) = state
            .issues
            .get_mut("ABC-1")
            .and_then(|issue| issue.fields.as_mut())
        {
            fields.description = Some("line one".to_string());
            fields.assignee = Some(user("alice"));
            fields.labels = vec!["ci".to_string()];
            fields.progress = Some(Progress {
                progress: 1800,
                total: 7200,
            });
            fields.issuelinks.push(IssueLink {
                id: "500".to_string(),
                link_type: link_type("Blocks"),
                inward_issue: None,
                outward_issue: Some(linked("ABC-2")),
            });
        }
        state.comments.insert(
            "ABC-1".to_string(),
            vec![Comment {
                id: "10".to_string(),
                author: Some(user("bob")),
                body: "first look\n".to_string(),
                created: "2024-01-01T10:00:00.000+0000".to_string(),
                updated: "2024-01-02T10:00:00.000+0000".to_string(),
            }],
        );
        state.worklogs.insert(
            "ABC-1".to_string(),
            vec![Worklog {
                id: "20".to_string(),
                author: Some(user("carol")),
                comment: "pairing".to_string(),
                time_spent_seconds: 5400,
                started: "2024-03-01T09:30:00.000+0000".to_string(),
            }],
        );
        state.workflow = vec![
            WorkflowEdge::new("Open", "Start", "In Progress"),
            WorkflowEdge::new("In Progress", "Stop", "Open"),
            WorkflowEdge::new("In Progress", "Finish", "Done"),
            WorkflowEdge::new("Done", "Reopen", "Open"),
        ];
        state.search_results = vec!["ABC-1".to_string(), "ABC-2".to_string()];
        Self {
            state: AsyncMutex::new(state),
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// Calls whose first word is `verb`.
    pub async fn calls_of(&self, verb: &str) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| call.split(' ').next() == Some(verb))
            .collect()
    }

    pub async fn issue(&self, key: &str) -> Option<Issue> {
        self.state.lock().await.issues.get(key).cloned()
    }

    pub async fn status(&self, key: &str) -> Option<String> {
        self.state.lock().await.status_of(key).ok()
    }

    pub async fn fail_transition(&self, name: &str) {
        self.state
            .lock()
            .await
            .failing_transitions
            .insert(name.to_string());
    }

    pub async fn set_search_results(&self, keys: &[&str]) {
        self.state.lock().await.search_results = keys.iter().map(|key| key.to_string()).collect();
    }
}

fn user(name: &str) -> User {
    User {
        name: name.to_string(),
        display_name: None,
    }
}

fn linked(key: &str) -> LinkedIssue {
    LinkedIssue {
        id: String::new(),
        key: key.to_string(),
    }
}

fn link_type(name: &str) -> IssueLinkType {
    IssueLinkType {
        name: name.to_string(),
        ..IssueLinkType::default()
    }
}

fn seeded_issue(key: &str) -> Issue {
    Issue {
        id: key.replace("ABC-", "1000"),
        key: key.to_string(),
        fields: Some(IssueFields {
            summary: format!("Issue {key}"),
            issuetype: Named {
                id: "3".to_string(),
                name: "Task".to_string(),
            },
            project: ProjectRef {
                id: "100".to_string(),
                key: "ABC".to_string(),
                name: "Alpha".to_string(),
            },
            status: Some(Named::with_name("Open")),
            ..IssueFields::default()
        }),
    }
}

#[async_trait]
impl TrackerClient for MemoryTracker {
    async fn get_issue(&self, key: &str) -> TrackerResult<Issue> {
        self.state
            .lock()
            .await
            .issues
            .get(key)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("issue {key}")))
    }

    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<String> {
        // A real create suspends on the network; let concurrent commits interleave.
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        if !state.projects.iter().any(|project| project.key == issue.project) {
            return Err(TrackerError::Status {
                operation: "create issue".to_string(),
                status: 400,
                body: format!("unknown project {}", issue.project),
            });
        }
        let key = format!("{}-{}", issue.project, state.issues.len() + 1);
        let mut created = seeded_issue(&key);
        if let Some(fields) = created.fields.as_mut() {
            fields.summary = issue.summary.clone();
            fields.description = Some(issue.description.clone());
            fields.issuetype.name = issue.issue_type.clone();
            fields.project.key = issue.project.clone();
        }
        state.issues.insert(key.clone(), created);
        state.calls.push(format!("create {key} {}", issue.summary));
        Ok(key)
    }

    async fn delete_issue(&self, key: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state
            .issues
            .remove(key)
            .ok_or_else(|| TrackerError::NotFound(format!("issue {key}")))?;
        state.calls.push(format!("delete {key}"));
        Ok(())
    }

    async fn set_field_in_issue(&self, key: &str, field: &str, value: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("set {key} {field}={value:?}"));
        let fields = state.fields_mut(key)?;
        match field {
            "summary" => fields.summary = value.to_string(),
            "description" => fields.description = Some(value.to_string()),
            "assignee" => fields.assignee = Some(user(value)),
            "labels" => {
                fields.labels = value
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            _ => {}
        }
        Ok(())
    }

    async fn set_issue_raw(&self, key: &str, raw: &[u8]) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.issue_mut(key)?;
        state.calls.push(format!("raw {key} {}", raw.len()));
        Ok(())
    }

    async fn get_transitions_for_issue(&self, key: &str) -> TrackerResult<Vec<Transition>> {
        let state = self.state.lock().await;
        let status = state.status_of(key)?;
        Ok(state
            .workflow
            .iter()
            .filter(|edge| edge.from == status)
            .map(|edge| Transition {
                id: edge.transition.to_lowercase(),
                name: edge.transition.clone(),
                to: Some(Named::with_name(&edge.to)),
            })
            .collect())
    }

    async fn transition_issue(&self, key: &str, transition: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("transition {key} {transition}"));
        if state.failing_transitions.contains(transition) {
            return Err(TrackerError::Status {
                operation: "transition issue".to_string(),
                status: 409,
                body: format!("{transition} is blocked"),
            });
        }
        let status = state.status_of(key)?;
        let target = state
            .workflow
            .iter()
            .find(|edge| edge.from == status && edge.transition == transition)
            .map(|edge| edge.to.clone())
            .ok_or_else(|| {
                TrackerError::Invalid(format!("transition '{transition}' is not available"))
            })?;
        state.fields_mut(key)?.status = Some(Named::with_name(&target));
        Ok(())
    }

    async fn link_issues(&self, inward: &str, outward: &str, relation: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("link {inward} {outward} {relation}"));
        let id = state.next_id();
        if let Ok(fields) = state.fields_mut(inward) {
            fields.issuelinks.push(IssueLink {
                id: id.clone(),
                link_type: link_type(relation),
                inward_issue: None,
                outward_issue: Some(linked(outward)),
            });
        }
        if let Ok(fields) = state.fields_mut(outward) {
            fields.issuelinks.push(IssueLink {
                id,
                link_type: link_type(relation),
                inward_issue: Some(linked(inward)),
                outward_issue: None,
            });
        }
        Ok(())
    }

    async fn delete_issue_link(&self, link_id: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("unlink {link_id}"));
        for issue in state.issues.values_mut() {
            if let Some(fields) = issue.fields.as_mut() {
                fields.issuelinks.retain(|link| link.id != link_id);
            }
        }
        Ok(())
    }

    async fn get_comment(&self, key: &str, comment_id: &str) -> TrackerResult<Comment> {
        self.state
            .lock()
            .await
            .comments
            .get(key)
            .and_then(|comments| comments.iter().find(|comment| comment.id == comment_id))
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("comment {comment_id}")))
    }

    async fn add_comment(&self, key: &str, body: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("comment {key} {body:?}"));
        let id = state.next_id();
        state.comments.entry(key.to_string()).or_default().push(Comment {
            id,
            author: Some(user("alice")),
            body: body.to_string(),
            ..Comment::default()
        });
        Ok(())
    }

    async fn set_comment(&self, key: &str, comment_id: &str, body: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("edit-comment {key} {comment_id} {body:?}"));
        let comment = state
            .comments
            .get_mut(key)
            .and_then(|comments| comments.iter_mut().find(|comment| comment.id == comment_id))
            .ok_or_else(|| TrackerError::NotFound(format!("comment {comment_id}")))?;
        comment.body = body.to_string();
        Ok(())
    }

    async fn remove_comment(&self, key: &str, comment_id: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        let comments = state.comments.entry(key.to_string()).or_default();
        let before = comments.len();
        comments.retain(|comment| comment.id != comment_id);
        if comments.len() == before {
            return Err(TrackerError::NotFound(format!("comment {comment_id}")));
        }
        state.calls.push(format!("remove-comment {key} {comment_id}"));
        Ok(())
    }

    async fn get_comments_for_issue(&self, key: &str) -> TrackerResult<Vec<Comment>> {
        Ok(self
            .state
            .lock()
            .await
            .comments
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_worklog_for_issue(&self, key: &str) -> TrackerResult<Vec<Worklog>> {
        Ok(self
            .state
            .lock()
            .await
            .worklogs
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_specific_worklog_for_issue(
        &self,
        key: &str,
        worklog_id: &str,
    ) -> TrackerResult<Worklog> {
        self.state
            .lock()
            .await
            .worklogs
            .get(key)
            .and_then(|worklogs| worklogs.iter().find(|worklog| worklog.id == worklog_id))
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("worklog {worklog_id}")))
    }

    async fn get_project(&self, key: &str) -> TrackerResult<Project> {
        self.state
            .lock()
            .await
            .projects
            .iter()
            .find(|project| project.key == key)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(format!("project {key}")))
    }

    async fn get_projects(&self) -> TrackerResult<Vec<Project>> {
        Ok(self.state.lock().await.projects.clone())
    }

    async fn get_keys_for_search(&self, jql: &str, limit: usize) -> TrackerResult<Vec<String>> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("search {jql} limit={limit}"));
        let keys = if jql.starts_with("project = \"ABC\"") {
            state.issues.keys().cloned().collect::<Vec<_>>()
        } else {
            state.search_results.clone()
        };
        Ok(keys.into_iter().take(limit).collect())
    }

    async fn get_workflow_edges(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> TrackerResult<Vec<WorkflowEdge>> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(format!("workflow {project} {issue_type_id}"));
        Ok(state.workflow.clone())
    }

    async fn login(&self, credentials: Option<Credentials>) -> TrackerResult<()> {
        let user = credentials
            .map(|credentials| credentials.user)
            .unwrap_or_else(|| "<stored>".to_string());
        self.state.lock().await.calls.push(format!("login {user}"));
        Ok(())
    }
}
