use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{comment_from_row, to_sql_datetime, COMMENT_COLUMNS};
use super::{tasks, users, Database, StoreError, StoreResult};
use crate::models::*;

impl Database {
    // ============================================================
    // Comment operations
    // ============================================================

    pub fn get_comment(&self, id: DbId) -> StoreResult<Option<Comment>> {
        Ok(load_comment(&self.conn(), id)?)
    }

    pub fn create_comment(&self, input: CreateCommentInput) -> StoreResult<Comment> {
        let conn = self.conn();
        if tasks::load_task(&conn, input.task_id)?.is_none() {
            return Err(StoreError::not_found("task", input.task_id));
        }
        if users::load_user(&conn, input.user_id)?.is_none() {
            return Err(StoreError::not_found("user", input.user_id));
        }

        conn.execute(
            "INSERT INTO comments (text, posted_date, task_id, user_id) VALUES (?, ?, ?, ?)",
            params![
                &input.text,
                to_sql_datetime(input.posted_date),
                input.task_id,
                input.user_id
            ],
        )?;

        Ok(Comment {
            id: conn.last_insert_rowid(),
            text: input.text,
            posted_date: input.posted_date,
            latest_edit_date: None,
            task_id: input.task_id,
            user_id: input.user_id,
            deleted_at: None,
            deleted_by_user_id: None,
        })
    }

    /// Write the soft-deletion fields of a comment. Passing `None` for both
    /// recovers it.
    pub fn soft_delete_comment(
        &self,
        id: DbId,
        input: SoftDeleteCommentInput,
    ) -> StoreResult<Option<Comment>> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE comments SET deleted_at = ?, deleted_by_user_id = ? WHERE id = ?",
            params![to_sql_datetime(input.deleted_at), input.deleted_by_user_id, id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        tracing::debug!(
            comment_id = id,
            deleted = input.deleted_at.is_some(),
            "comment deletion state changed"
        );
        Ok(load_comment(&conn, id)?)
    }
}

fn load_comment(conn: &Connection, id: DbId) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"),
        [id],
        comment_from_row,
    )
    .optional()
}

/// Comments of a task as readers see them, oldest first.
pub(super) fn comment_views_of_task(
    conn: &Connection,
    task_id: DbId,
) -> rusqlite::Result<Vec<CommentView>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE task_id = ? ORDER BY posted_date, id"
    ))?;
    let comments = stmt
        .query_map([task_id], comment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut people: HashMap<DbId, Option<User>> = HashMap::new();
    let mut views = Vec::with_capacity(comments.len());
    for comment in &comments {
        for user_id in [Some(comment.user_id), comment.deleted_by_user_id]
            .into_iter()
            .flatten()
        {
            if !people.contains_key(&user_id) {
                people.insert(user_id, users::load_user(conn, user_id)?);
            }
        }
        let lookup = |id: Option<DbId>| id.and_then(|id| people.get(&id)).and_then(Option::as_ref);
        views.push(comment.view(
            lookup(Some(comment.user_id)),
            lookup(comment.deleted_by_user_id),
        ));
    }
    Ok(views)
}
