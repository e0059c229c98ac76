use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DbId, User};

/// A comment on a task.
///
/// Comments are **soft-deleted**: deletion sets `deleted_at` and
/// `deleted_by_user_id` and keeps the row, so the thread can show a
/// placeholder. Clearing both fields recovers the comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: DbId,
    pub text: String,
    pub posted_date: Option<DateTime<Utc>>,
    pub latest_edit_date: Option<DateTime<Utc>>,
    pub task_id: DbId,
    pub user_id: DbId,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<DbId>,
}

impl Comment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// What a reader is allowed to see of this comment.
    pub fn view(&self, author: Option<&User>, deleted_by: Option<&User>) -> CommentView {
        match self.deleted_at {
            Some(deleted_at) => CommentView::Deleted {
                id: self.id,
                deleted_at,
                deleted_by_user_id: self.deleted_by_user_id,
                deleted_by_username: deleted_by.map(|u| u.username.clone()),
            },
            None => CommentView::Visible {
                id: self.id,
                user_id: self.user_id,
                username: author.map(|u| u.username.clone()),
                text: self.text.clone(),
                posted_date: self.posted_date,
            },
        }
    }
}

/// A comment as presented to readers: either its author and text, or only
/// the deletion metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CommentView {
    Visible {
        id: DbId,
        user_id: DbId,
        username: Option<String>,
        text: String,
        posted_date: Option<DateTime<Utc>>,
    },
    Deleted {
        id: DbId,
        deleted_at: DateTime<Utc>,
        deleted_by_user_id: Option<DbId>,
        deleted_by_username: Option<String>,
    },
}

impl CommentView {
    pub fn id(&self) -> DbId {
        match self {
            Self::Visible { id, .. } | Self::Deleted { id, .. } => *id,
        }
    }

    /// One-line text rendering used by the terminal views.
    pub fn render(&self) -> String {
        match self {
            Self::Visible { username, user_id, text, .. } => {
                let who = username.clone().unwrap_or_else(|| format!("user {user_id}"));
                format!("{who}: {text}")
            }
            Self::Deleted { deleted_at, deleted_by_username, deleted_by_user_id, .. } => {
                let who = deleted_by_username
                    .clone()
                    .or_else(|| deleted_by_user_id.map(|id| format!("user {id}")))
                    .unwrap_or_else(|| "unknown".to_string());
                format!("[comment deleted by {who} on {}]", deleted_at.format("%Y-%m-%d %H:%M"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub task_id: DbId,
    pub user_id: DbId,
    pub text: String,
    pub posted_date: Option<DateTime<Utc>>,
}

/// Sets or clears the soft-deletion fields. Sending both as `null` recovers
/// the comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftDeleteCommentInput {
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by_user_id: Option<DbId>,
}
