use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use jirafs_namespace::{FsError, FsResult};
use jirafs_tracker::{TrackerClient, TrackerResult};
use tracing::debug;

use crate::issue::IssueState;

pub const DEFAULT_MAX_LISTING: usize = 100;

/// State shared by every view of one mounted namespace.
pub struct FsContext {
    client: Arc<dyn TrackerClient>,
    max_listing: AtomicUsize,
    drafts: Mutex<HashMap<String, Arc<IssueState>>>,
}

impl FsContext {
    pub fn new(client: Arc<dyn TrackerClient>, max_listing: usize) -> Self {
        Self {
            client,
            max_listing: AtomicUsize::new(max_listing),
            drafts: Mutex::new(HashMap::new()),
        }
    }

    pub fn client(&self) -> &dyn TrackerClient {
        self.client.as_ref()
    }

    /// Upper bound on how many items a listing fetches.
    pub fn max_listing(&self) -> usize {
        self.max_listing.load(Ordering::Relaxed)
    }

    pub fn set_max_listing(&self, max_listing: usize) {
        self.max_listing.store(max_listing, Ordering::Relaxed);
    }

    fn drafts(&self) -> MutexGuard<'_, HashMap<String, Arc<IssueState>>> {
        self.drafts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the uncommitted draft for `scope`, creating a blank one the
    /// first time the scope is walked.
    pub(crate) fn draft(&self, scope: &str, project: &str) -> Arc<IssueState> {
        let mut drafts = self.drafts();
        Arc::clone(drafts.entry(scope.to_string()).or_insert_with(|| {
            debug!(scope, "opening issue draft");
            Arc::new(IssueState::draft(project))
        }))
    }

    /// Drops `draft` from the table if it is still the one stored for
    /// `scope`.
    pub(crate) fn release_draft(&self, scope: &str, draft: &Arc<IssueState>) {
        let mut drafts = self.drafts();
        if drafts
            .get(scope)
            .is_some_and(|stored| Arc::ptr_eq(stored, draft))
        {
            drafts.remove(scope);
        }
    }

    pub fn pending_drafts(&self) -> usize {
        self.drafts().len()
    }
}

/// Maps a remote not-found into "no such child" for walks.
pub(crate) fn found<T>(result: TrackerResult<T>) -> FsResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_not_found() => Ok(None),
        Err(error) => Err(FsError::Remote(error)),
    }
}
