//! Issue-tracker contract and Jira REST client for jirafs.
//!
//! Defines the transfer objects exchanged with the tracker, the async
//! `TrackerClient` operations the namespace views depend on, a reqwest-backed
//! implementation, and the workflow graph used to resolve status changes.

pub mod client;
pub mod error;
pub mod jira_client;
pub mod model;
pub mod transport_helpers;
pub mod workflow;

pub use client::{Credentials, NewIssue, TrackerClient};
pub use error::{TrackerError, TrackerResult};
pub use jira_client::{JiraClient, JiraClientConfig};
pub use model::{
    Comment, Issue, IssueFields, IssueLink, IssueLinkType, LinkedIssue, Named, Progress, Project,
    ProjectRef, Transition, User, Worklog,
};
pub use workflow::{WorkflowEdge, WorkflowError, WorkflowGraph, WorkflowStep};
