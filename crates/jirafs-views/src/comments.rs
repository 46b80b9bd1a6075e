use std::sync::Arc;

use async_trait::async_trait;
use jirafs_namespace::{
    strings_to_entries, CommitFile, CommitHandler, DirEntry, FileMode, FsError, FsResult, Node,
    SyntheticFile, View,
};
use tracing::debug;

use crate::context::{found, FsContext};

const COMMENT_FILES: [&str; 4] = ["author", "comment", "created", "updated"];

/// `comments/` of one issue: a directory per comment plus the `comment`
/// file that posts a new one.
pub struct IssueCommentsView {
    ctx: Arc<FsContext>,
    key: String,
}

impl IssueCommentsView {
    pub fn new(ctx: Arc<FsContext>, key: &str) -> Self {
        Self {
            ctx,
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl View for IssueCommentsView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        if name == "comment" {
            let file = CommitFile::new(
                SyntheticFile::new(name, FileMode::READ_WRITE),
                CommentCommit::Add {
                    ctx: Arc::clone(&self.ctx),
                    key: self.key.clone(),
                },
            );
            return Ok(Some(Node::file(file)));
        }
        let comment = found(self.ctx.client().get_comment(&self.key, name).await)?;
        Ok(comment.map(|comment| {
            let view = CommentView {
                ctx: Arc::clone(&self.ctx),
                key: self.key.clone(),
                comment_id: comment.id,
            };
            Node::dir(name, FileMode::DIR_READ_WRITE, view)
        }))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let comments = self.ctx.client().get_comments_for_issue(&self.key).await?;
        let mut entries = strings_to_entries(
            comments.iter().map(|comment| comment.id.as_str()),
            FileMode::DIR_READ_WRITE,
        );
        entries.push(DirEntry::new("comment", FileMode::READ_WRITE));
        Ok(entries)
    }

    async fn remove(&self, name: &str) -> FsResult<()> {
        if name == "comment" {
            return Err(FsError::PermissionDenied(
                "the comment file cannot be removed".to_string(),
            ));
        }
        self.ctx.client().remove_comment(&self.key, name).await?;
        debug!(key = %self.key, comment = name, "removed comment");
        Ok(())
    }
}

struct CommentView {
    ctx: Arc<FsContext>,
    key: String,
    comment_id: String,
}

#[async_trait]
impl View for CommentView {
    async fn walk(&self, name: &str) -> FsResult<Option<Node>> {
        if !COMMENT_FILES.contains(&name) {
            return Ok(None);
        }
        let Some(comment) = found(
            self.ctx
                .client()
                .get_comment(&self.key, &self.comment_id)
                .await,
        )?
        else {
            return Ok(None);
        };

        let content = match name {
            "comment" => {
                let file = CommitFile::new(
                    SyntheticFile::with_content(name, FileMode::READ_WRITE, comment.body),
                    CommentCommit::Update {
                        ctx: Arc::clone(&self.ctx),
                        key: self.key.clone(),
                        comment_id: self.comment_id.clone(),
                    },
                );
                return Ok(Some(Node::file(file)));
            }
            "author" => comment.author.map(|author| author.name).unwrap_or_default(),
            "created" => comment.created,
            _ => comment.updated,
        };
        Ok(Some(Node::file(SyntheticFile::with_content(
            name,
            FileMode::READ_ONLY,
            format!("{content}\n"),
        ))))
    }

    async fn list(&self) -> FsResult<Vec<DirEntry>> {
        let mut entries = vec![DirEntry::new("comment", FileMode::READ_WRITE)];
        entries.extend(strings_to_entries(
            ["author", "updated", "created"],
            FileMode::READ_ONLY,
        ));
        Ok(entries)
    }
}

enum CommentCommit {
    Add {
        ctx: Arc<FsContext>,
        key: String,
    },
    Update {
        ctx: Arc<FsContext>,
        key: String,
        comment_id: String,
    },
}

#[async_trait]
impl CommitHandler for CommentCommit {
    async fn commit(&self, content: Vec<u8>) -> FsResult<()> {
        let body = String::from_utf8_lossy(&content);
        match self {
            Self::Add { ctx, key } => ctx.client().add_comment(key, &body).await?,
            Self::Update {
                ctx,
                key,
                comment_id,
            } => ctx.client().set_comment(key, comment_id, &body).await?,
        }
        Ok(())
    }
}
