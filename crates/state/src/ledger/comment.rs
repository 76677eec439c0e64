use gitledger_store::KvRead;
use gitledger_types::{
    Address, Comment, CommentId, PullRequest,
    error::{Result, UnauthorizedSnafu},
    messages::{CreateComment, DeleteComment, UpdateComment},
};
use tracing::{info, instrument};

use super::Ledger;
use crate::{
    collections::{append_unique, remove_by_value},
    entity::EntityStore,
    names::AddressIndex,
};

fn authored_comment(txn: &impl KvRead, requester: &Address, id: CommentId) -> Result<Comment> {
    let comment: Comment = EntityStore::get(txn, id)?;
    if &comment.creator != requester {
        return UnauthorizedSnafu {
            message: format!("{requester} is not the author of comment {}", id.value()),
        }
        .fail();
    }
    Ok(comment)
}

impl Ledger {
    /// Comments on a pull request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid body, and `NotFound` if the
    /// creator has no user or the pull request is missing.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, pull_request_id = msg.parent_id.value()))]
    pub fn create_comment(&self, msg: CreateComment) -> Result<CommentId> {
        msg.validate(&self.config.validation)?;
        let id = self.mutate("create_comment", |txn, now| {
            AddressIndex::resolve_user(&*txn, &msg.creator)?;
            let mut pull_request: PullRequest = EntityStore::get(&*txn, msg.parent_id)?;
            let iid = pull_request.comments_count + 1;
            let comment = Comment {
                creator: msg.creator.clone(),
                parent_id: pull_request.id,
                comment_iid: iid,
                body: msg.body,
                attachments: msg.attachments,
                diff_hunk: msg.diff_hunk,
                path: msg.path,
                system: msg.system,
                created_at: now,
                updated_at: now,
                ..Comment::default()
            };
            let id = EntityStore::append(txn, comment)?;
            append_unique(&mut pull_request.comments, id, "comment")?;
            pull_request.comments_count = iid;
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)?;
            Ok(id)
        })?;
        info!(comment_id = id.value(), "comment created");
        Ok(id)
    }

    /// Replaces a comment's body and attachments. Author only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid body, `NotFound`, or
    /// `Unauthorized`.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, comment_id = msg.id.value()))]
    pub fn update_comment(&self, msg: UpdateComment) -> Result<()> {
        msg.validate(&self.config.validation)?;
        self.mutate("update_comment", |txn, now| {
            let mut comment = authored_comment(&*txn, &msg.creator, msg.id)?;
            comment.body = msg.body;
            comment.attachments = msg.attachments;
            comment.updated_at = now;
            EntityStore::set(txn, &comment)
        })?;
        info!("comment updated");
        Ok(())
    }

    /// Deletes a comment and drops it from its pull request. Author only.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, or `InvalidRequest` if the pull
    /// request's list doesn't contain the comment.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, comment_id = msg.id.value()))]
    pub fn delete_comment(&self, msg: DeleteComment) -> Result<()> {
        self.mutate("delete_comment", |txn, now| {
            let comment = authored_comment(&*txn, &msg.creator, msg.id)?;
            if let Some(mut pull_request) = EntityStore::find::<PullRequest>(&*txn, comment.parent_id)? {
                remove_by_value(&mut pull_request.comments, &comment.id, "comment")?;
                pull_request.updated_at = now;
                EntityStore::set(txn, &pull_request)?;
            }
            EntityStore::delete::<Comment>(txn, comment.id)?;
            Ok(())
        })?;
        info!("comment deleted");
        Ok(())
    }
}
