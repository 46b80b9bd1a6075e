//! Views that project an issue tracker onto the jirafs namespace.
//!
//! Every directory in the tree is a view over tracker state that is read on
//! demand. Writes land in commit-on-close files whose final contents are
//! pushed back to the tracker.

pub mod comments;
pub mod context;
pub mod help;
pub mod issue;
pub mod issues;
pub mod projects;
pub mod render;
pub mod root;
pub mod search;
pub mod worklog;

use std::sync::Arc;

use jirafs_namespace::Namespace;
use jirafs_tracker::TrackerClient;

pub use context::{FsContext, DEFAULT_MAX_LISTING};
pub use issue::{IssueState, IssueView, MAX_WORKFLOW_STEPS};
pub use root::RootView;
pub use search::SearchView;

/// Builds a namespace rooted at a fresh `RootView` over `client`.
pub fn mount(client: Arc<dyn TrackerClient>, max_listing: usize) -> Namespace {
    let ctx = Arc::new(FsContext::new(client, max_listing));
    Namespace::new(RootView::new(ctx).into_node())
}
