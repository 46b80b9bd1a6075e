use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use jirafs_namespace::{
    strings_to_entries, CommandFile, CommandHandler, DirEntry, Directory, FileMode, FsError,
    FsResult, Node, SyntheticFile, View,
};
use jirafs_tracker::Credentials;
use tracing::info;

use crate::context::FsContext;
use crate::help::{ROOT_HELP, ROOT_STRUCTURE};
use crate::issues::AllIssuesView;
use crate::projects::AllProjectsView;
use crate::search::SearchView;

const FIXED_ENTRIES: [&str; 5] = ["ctl", "projects", "issues", "help", "structure"];

type SearchTable = Arc<Mutex<BTreeMap<String, Arc<SearchView>>>>;

fn lock_searches(searches: &SearchTable) -> MutexGuard<'_, BTreeMap<String, Arc<SearchView>>> {
    searches
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
/// The namespace root. Owns the named-search table, so a single instance
/// must back the whole mount.
pub struct RootView {
    ctx: Arc<FsContext>,
    searches: SearchTable,
}

impl RootView {
    pub fn new(ctx: Arc<FsContext>) -> Self {
        Self {
            ctx,
            searches: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn into_node(self) -> Node {
        Node::dir("/", FileMode::DIR_READ_WRITE, self)
    }

    pub fn search_names(&self) -> Vec<String> {
        lock_searches(&self.searches).keys().cloned().collect()
    }

    fn ctl(&self) -> CommandFile {
        CommandFile::new("ctl")
            .command(
                "search",
                SearchCommand {
                    ctx: Arc::clone(&self.ctx),
                    searches: Arc::clone(&self.searches),
                },
            )
            .command(
                "pass-login",
                LoginCommand {
                    ctx: Arc::clone(&self.ctx),
                },
            )
            .command(
                "set",
                SetCommand {
                    ctx: Arc::clone(&self.ctx),
                },
            )
    }
}

#[async_trait]
impl View for RootView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        let node = match name {
            "ctl" => Node::file(self.ctl()),
            "projects" => Node::dir(
                name,
                FileMode::DIR_READ_ONLY,
                AllProjectsView::new(Arc::clone(&self.ctx)),
            ),
            "issues" => Node::dir(
                name,
                FileMode::DIR_READ_ONLY,
                AllIssuesView::new(Arc::clone(&self.ctx)),
            ),
            "help" => Node::file(SyntheticFile::with_content(name, FileMode::READ_ONLY, ROOT_HELP)),
            "structure" => Node::file(SyntheticFile::with_content(
                name,
                FileMode::READ_ONLY,
                ROOT_STRUCTURE,
            )),
            _ => {
                let search = lock_searches(&self.searches).get(name).cloned();
                let Some(search) = search else {
                    return Ok(None);
                };
                Node::Dir(Directory::new(name, FileMode::DIR_READ_WRITE, search))
            }
        };
        Ok(Some(node))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let mut entries = strings_to_entries(["projects", "issues"], FileMode::DIR_READ_ONLY);
        entries.push(DirEntry::new("ctl", FileMode::READ_WRITE));
        entries.extend(strings_to_entries(["help", "structure"], FileMode::READ_ONLY));
        entries.extend(strings_to_entries(self.search_names(), FileMode::DIR_READ_WRITE));
        Ok(entries)
    }

    async fn remove(&self, name: &str) -> FsResult<()> {
        if FIXED_ENTRIES.contains(&name) {
            return Err(FsError::PermissionDenied(format!("'{name}' cannot be removed")));
        }
        match lock_searches(&self.searches).remove(name) {
            Some(_) => {
                info!(search = name, "search removed");
                Ok(())
            }
            None => Err(FsError::NotFound(name.to_string())),
        }
    }
}

/// `search NAME JQL...`
struct SearchCommand {
    ctx: Arc<FsContext>,
    searches: SearchTable,
}

#[async_trait]
impl CommandHandler for SearchCommand {
    async fn run(&self, args: Vec<String>) -> FsResult<()> {
        let Some((name, query)) = args.split_first().filter(|(_, query)| !query.is_empty()) else {
            return Err(FsError::InvalidInput("usage: search NAME QUERY".to_string()));
        };
        if FIXED_ENTRIES.contains(&name.as_str()) {
            return Err(FsError::InvalidInput(format!(
                "'{name}' is reserved and cannot name a search"
            )));
        }
        let search = Arc::new(SearchView::new(Arc::clone(&self.ctx), &query.join(" ")));
        let hits = search.refresh().await?.len();
        lock_searches(&self.searches).insert(name.clone(), search);
        info!(search = %name, hits, "search stored");
        Ok(())
    }
}

/// `pass-login [USER PASS]`
struct LoginCommand {
    ctx: Arc<FsContext>,
}

#[async_trait]
impl CommandHandler for LoginCommand {
    async fn run(&self, args: Vec<String>) -> FsResult<()> {
        let credentials = match args.as_slice() {
            [] => None,
            [user, password] => Some(Credentials::new(user.as_str(), password.as_str())),
            _ => {
                return Err(FsError::InvalidInput(
                    "usage: pass-login [USER PASS]".to_string(),
                ))
            }
        };
        self.ctx.client().login(credentials).await?;
        info!("login refreshed");
        Ok(())
    }
}

/// `set VARIABLE VALUE`
struct SetCommand {
    ctx: Arc<FsContext>,
}

#[async_trait]
impl CommandHandler for SetCommand {
    async fn run(&self, args: Vec<String>) -> FsResult<()> {
        let [variable, value] = args.as_slice() else {
            return Err(FsError::InvalidInput("usage: set VARIABLE VALUE".to_string()));
        };
        match variable.as_str() {
            "max-listing" => {
                let max_listing = value
                    .parse::<usize>()
                    .ok()
                    .filter(|max_listing| *max_listing > 0)
                    .ok_or_else(|| {
                        FsError::InvalidInput(format!(
                            "max-listing expects a positive integer, got '{value}'"
                        ))
                    })?;
                self.ctx.set_max_listing(max_listing);
                info!(max_listing, "max-listing updated");
                Ok(())
            }
            other => Err(FsError::InvalidInput(format!("unknown variable '{other}'"))),
        }
    }
}
