use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::{Credentials, NewIssue, TrackerClient};
use crate::error::{TrackerError, TrackerResult};
use crate::model::{Comment, Issue, Project, Transition, Worklog};
use crate::transport_helpers::{field_update_payload, truncate_for_error};
use crate::workflow::WorkflowEdge;

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone)]
/// Connection settings for [`JiraClient`].
pub struct JiraClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

#[derive(Debug, Deserialize)]
struct TransitionsPage {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
struct CommentsPage {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    worklogs: Vec<Worklog>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    issues: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatusRef {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowTarget {
    transition_name: String,
    to_status: StatusRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowSource {
    from_status: StatusRef,
    #[serde(default)]
    targets: Vec<WorkflowTarget>,
}

#[derive(Debug, Deserialize)]
struct WorkflowLayout {
    #[serde(default)]
    sources: Vec<WorkflowSource>,
}

/// Jira REST v2 client authenticating with basic credentials.
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    credentials: RwLock<Credentials>,
}

impl JiraClient {
    pub fn new(config: JiraClientConfig) -> TrackerResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("jirafs")
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|source| TrackerError::Transport {
                operation: "client setup".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: RwLock::new(config.credentials),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn credentials(&self) -> Credentials {
        self.credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn send_with(
        &self,
        operation: &str,
        credentials: &Credentials,
        request: reqwest::RequestBuilder,
    ) -> TrackerResult<reqwest::Response> {
        debug!(operation, "tracker request");
        let response = request
            .basic_auth(&credentials.user, Some(&credentials.password))
            .send()
            .await
            .map_err(|source| TrackerError::Transport {
                operation: operation.to_string(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            404 => TrackerError::NotFound(operation.to_string()),
            401 | 403 => TrackerError::Unauthorized {
                operation: operation.to_string(),
                status: status.as_u16(),
            },
            code => TrackerError::Status {
                operation: operation.to_string(),
                status: code,
                body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
            },
        })
    }

    async fn send(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> TrackerResult<reqwest::Response> {
        let credentials = self.credentials();
        self.send_with(operation, &credentials, request).await
    }

    async fn request_json<T>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> TrackerResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(operation, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TrackerError::Transport {
                operation: operation.to_string(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| TrackerError::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    async fn request_empty(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> TrackerResult<()> {
        self.send(operation, request).await.map(|_| ())
    }
}

#[async_trait]
impl TrackerClient for JiraClient {
    async fn get_issue(&self, key: &str) -> TrackerResult<Issue> {
        self.request_json(
            &format!("get issue {key}"),
            self.http.get(self.url(&format!("/rest/api/2/issue/{key}"))),
        )
        .await
    }

    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<String> {
        let payload = json!({
            "fields": {
                "project": { "key": issue.project },
                "issuetype": { "name": issue.issue_type },
                "summary": issue.summary,
                "description": issue.description,
            }
        });
        let created: CreatedIssue = self
            .request_json(
                "create issue",
                self.http.post(self.url("/rest/api/2/issue")).json(&payload),
            )
            .await?;
        Ok(created.key)
    }

    async fn delete_issue(&self, key: &str) -> TrackerResult<()> {
        self.request_empty(
            &format!("delete issue {key}"),
            self.http.delete(self.url(&format!("/rest/api/2/issue/{key}"))),
        )
        .await
    }

    async fn set_field_in_issue(&self, key: &str, field: &str, value: &str) -> TrackerResult<()> {
        let payload = field_update_payload(field, value);
        self.request_empty(
            &format!("set {field} on {key}"),
            self.http
                .put(self.url(&format!("/rest/api/2/issue/{key}")))
                .json(&payload),
        )
        .await
    }

    async fn set_issue_raw(&self, key: &str, raw: &[u8]) -> TrackerResult<()> {
        self.request_empty(
            &format!("raw update of {key}"),
            self.http
                .put(self.url(&format!("/rest/api/2/issue/{key}")))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(raw.to_vec()),
        )
        .await
    }

    async fn get_transitions_for_issue(&self, key: &str) -> TrackerResult<Vec<Transition>> {
        let page: TransitionsPage = self
            .request_json(
                &format!("list transitions of {key}"),
                self.http
                    .get(self.url(&format!("/rest/api/2/issue/{key}/transitions"))),
            )
            .await?;
        Ok(page.transitions)
    }

    async fn transition_issue(&self, key: &str, transition: &str) -> TrackerResult<()> {
        let available = self.get_transitions_for_issue(key).await?;
        let Some(found) = available.iter().find(|candidate| candidate.name == transition) else {
            return Err(TrackerError::Invalid(format!(
                "transition '{transition}' is not available on {key}"
            )));
        };
        let payload = json!({ "transition": { "id": found.id } });
        self.request_empty(
            &format!("transition {key} via {transition}"),
            self.http
                .post(self.url(&format!("/rest/api/2/issue/{key}/transitions")))
                .json(&payload),
        )
        .await
    }

    async fn link_issues(&self, inward: &str, outward: &str, relation: &str) -> TrackerResult<()> {
        let payload = json!({
            "type": { "name": relation },
            "inwardIssue": { "key": inward },
            "outwardIssue": { "key": outward },
        });
        self.request_empty(
            &format!("link {inward} {outward} {relation}"),
            self.http
                .post(self.url("/rest/api/2/issueLink"))
                .json(&payload),
        )
        .await
    }

    async fn delete_issue_link(&self, link_id: &str) -> TrackerResult<()> {
        self.request_empty(
            &format!("delete issue link {link_id}"),
            self.http
                .delete(self.url(&format!("/rest/api/2/issueLink/{link_id}"))),
        )
        .await
    }

    async fn get_comment(&self, key: &str, comment_id: &str) -> TrackerResult<Comment> {
        self.request_json(
            &format!("get comment {comment_id} of {key}"),
            self.http.get(
                self.url(&format!("/rest/api/2/issue/{key}/comment/{comment_id}")),
            ),
        )
        .await
    }

    async fn add_comment(&self, key: &str, body: &str) -> TrackerResult<()> {
        self.request_empty(
            &format!("add comment to {key}"),
            self.http
                .post(self.url(&format!("/rest/api/2/issue/{key}/comment")))
                .json(&json!({ "body": body })),
        )
        .await
    }

    async fn set_comment(&self, key: &str, comment_id: &str, body: &str) -> TrackerResult<()> {
        self.request_empty(
            &format!("update comment {comment_id} of {key}"),
            self.http
                .put(self.url(&format!("/rest/api/2/issue/{key}/comment/{comment_id}")))
                .json(&json!({ "body": body })),
        )
        .await
    }

    async fn remove_comment(&self, key: &str, comment_id: &str) -> TrackerResult<()> {
        self.request_empty(
            &format!("remove comment {comment_id} of {key}"),
            self.http.delete(
                self.url(&format!("/rest/api/2/issue/{key}/comment/{comment_id}")),
            ),
        )
        .await
    }

    async fn get_comments_for_issue(&self, key: &str) -> TrackerResult<Vec<Comment>> {
        let page: CommentsPage = self
            .request_json(
                &format!("list comments of {key}"),
                self.http
                    .get(self.url(&format!("/rest/api/2/issue/{key}/comment"))),
            )
            .await?;
        Ok(page.comments)
    }

    async fn get_worklog_for_issue(&self, key: &str) -> TrackerResult<Vec<Worklog>> {
        let page: WorklogPage = self
            .request_json(
                &format!("list worklog of {key}"),
                self.http
                    .get(self.url(&format!("/rest/api/2/issue/{key}/worklog"))),
            )
            .await?;
        Ok(page.worklogs)
    }

    async fn get_specific_worklog_for_issue(
        &self,
        key: &str,
        worklog_id: &str,
    ) -> TrackerResult<Worklog> {
        self.request_json(
            &format!("get worklog {worklog_id} of {key}"),
            self.http.get(
                self.url(&format!("/rest/api/2/issue/{key}/worklog/{worklog_id}")),
            ),
        )
        .await
    }

    async fn get_project(&self, key: &str) -> TrackerResult<Project> {
        self.request_json(
            &format!("get project {key}"),
            self.http.get(self.url(&format!("/rest/api/2/project/{key}"))),
        )
        .await
    }

    async fn get_projects(&self) -> TrackerResult<Vec<Project>> {
        self.request_json("list projects", self.http.get(self.url("/rest/api/2/project")))
            .await
    }

    async fn get_keys_for_search(&self, jql: &str, limit: usize) -> TrackerResult<Vec<String>> {
        let max_results = limit.to_string();
        let page: SearchPage = self
            .request_json(
                "search issues",
                self.http.get(self.url("/rest/api/2/search")).query(&[
                    ("jql", jql),
                    ("maxResults", max_results.as_str()),
                    ("fields", "key"),
                ]),
            )
            .await?;
        Ok(page.issues.into_iter().map(|hit| hit.key).collect())
    }

    async fn get_workflow_edges(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> TrackerResult<Vec<WorkflowEdge>> {
        let workflow: WorkflowRef = self
            .request_json(
                &format!("resolve workflow of issue type {issue_type_id} in {project}"),
                self.http.get(self.url(&format!(
                    "/rest/projectconfig/1/issuetype/{project}/{issue_type_id}/workflow"
                ))),
            )
            .await?;
        let layout: WorkflowLayout = self
            .request_json(
                &format!("load workflow {}", workflow.name),
                self.http
                    .get(self.url("/rest/projectconfig/1/workflow"))
                    .query(&[
                        ("workflowName", workflow.name.as_str()),
                        ("projectKey", project),
                    ]),
            )
            .await?;

        let mut edges = Vec::new();
        for source in layout.sources {
            for target in source.targets {
                edges.push(WorkflowEdge {
                    from: source.from_status.name.clone(),
                    transition: target.transition_name,
                    to: target.to_status.name,
                });
            }
        }
        Ok(edges)
    }

    async fn login(&self, credentials: Option<Credentials>) -> TrackerResult<()> {
        let candidate = credentials.unwrap_or_else(|| self.credentials());
        self.send_with(
            "login",
            &candidate,
            self.http.get(self.url("/rest/auth/1/session")),
        )
        .await?;
        *self
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = candidate;
        Ok(())
    }
}
