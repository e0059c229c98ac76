use std::collections::HashSet;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::rows::{
    attachment_from_row, qualified, task_from_row, to_sql_datetime, ATTACHMENT_COLUMNS,
    TASK_COLUMNS,
};
use super::{comments, layers, projects, users, Database, StoreError, StoreResult};
use crate::hierarchy::rules::{self, Move, TaskPosition};
use crate::hierarchy::ChildIndex;
use crate::models::*;

/// Filters for listing tasks. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<DbId>,
    pub archived: Option<bool>,
    /// Case-insensitive substring of title or description.
    pub query: Option<String>,
}

impl Database {
    // ============================================================
    // Task queries
    // ============================================================

    pub fn get_task(&self, id: DbId) -> StoreResult<Option<Task>> {
        Ok(load_task(&self.conn(), id)?)
    }

    /// Tasks matching `filter`, each with its nested tasks down to
    /// `max_depth` generations.
    pub fn get_tasks(&self, filter: &TaskFilter, max_depth: usize) -> StoreResult<TaskForest> {
        let conn = self.conn();

        let mut clauses = Vec::new();
        let mut args: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(project_id) = filter.project_id {
            clauses.push("project_id = ?");
            args.push(project_id.into());
        }
        if let Some(archived) = filter.archived {
            clauses.push("archived = ?");
            args.push(i64::from(archived).into());
        }
        if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
            clauses.push("(title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')");
            let pattern = like_pattern(query);
            args.push(pattern.clone().into());
            args.push(pattern.into());
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks {where_sql} ORDER BY id"
        ))?;
        let matching = stmt
            .query_map(params_from_iter(args), task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let pool = match filter.project_id {
            Some(project_id) => tasks_of_project(&conn, project_id)?,
            None => all_tasks(&conn)?,
        };
        Ok(crate::hierarchy::build_nodes(&matching, &pool, max_depth))
    }

    /// Full details of one task with nested tasks down to `max_depth`
    /// generations.
    pub fn get_task_detail(&self, id: DbId, max_depth: usize) -> StoreResult<Option<TaskDetail>> {
        let conn = self.conn();
        let Some(task) = load_task(&conn, id)? else {
            return Ok(None);
        };

        // one extra generation tells whether the deepest level was cut off
        let descendants = descendants(&conn, id, max_depth + 1)?;
        let index = ChildIndex::new(&descendants);
        let root = index.subtree(&task, max_depth);
        let truncated = root.any_truncated();

        let author = match task.author_user_id {
            Some(user_id) => users::load_user(&conn, user_id)?,
            None => None,
        };
        let assignee = match task.assigned_user_id {
            Some(user_id) => users::load_user(&conn, user_id)?,
            None => None,
        };
        let task_layer = match task.task_layer_id {
            Some(layer_id) => layers::load_layer(&conn, layer_id)?,
            None => None,
        };

        Ok(Some(TaskDetail {
            author,
            assignee,
            task_layer,
            comments: comments::comment_views_of_task(&conn, id)?,
            attachments: attachments_of_task(&conn, id)?,
            nested_tasks: root.nested_tasks,
            truncated,
            task,
        }))
    }

    /// Tasks a user authored, is assigned to, or created, soonest end date
    /// first.
    pub fn get_user_tasks(&self, user_id: DbId) -> StoreResult<Vec<Task>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE author_user_id = ?1 OR assigned_user_id = ?1 OR created_by_user_id = ?1
             ORDER BY end_date IS NULL, end_date, id"
        ))?;
        let tasks = stmt
            .query_map([user_id], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    // ============================================================
    // Task mutations
    // ============================================================

    /// Create a task, optionally under a parent and inside a layer of the
    /// same project.
    pub fn create_task(&self, input: CreateTaskInput) -> StoreResult<Task> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if projects::load_project(&tx, input.project_id)?.is_none() {
            return Err(StoreError::not_found("project", input.project_id));
        }
        let layer = match input.task_layer_id {
            Some(layer_id) => Some(
                layers::load_layer(&tx, layer_id)?
                    .ok_or(StoreError::not_found("layer", layer_id))?,
            ),
            None => None,
        };
        let parent = match input.parent_task_id {
            Some(parent_id) => Some(require_task(&tx, parent_id)?),
            None => None,
        };
        rules::check_same_project(
            input.project_id,
            layer.as_ref(),
            parent.as_ref().map(TaskPosition::from).as_ref(),
        )?;

        tx.execute(
            "INSERT INTO tasks (title, description, status, priority, tags, posted_date, start_date,
                end_date, size, urls, project_id, archived, parent_task_id, task_layer_id,
                created_by_user_id, author_user_id, assigned_user_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)",
            params![
                &input.title,
                &input.description,
                input.status.map(|s| s.as_str()),
                input.priority.map(|p| p.as_str()),
                &input.tags,
                to_sql_datetime(input.posted_date),
                to_sql_datetime(input.start_date),
                to_sql_datetime(input.end_date),
                &input.size,
                serde_json::to_string(&input.urls)?,
                input.project_id,
                input.parent_task_id,
                input.task_layer_id,
                input.created_by_user_id,
                input.author_user_id,
                input.assigned_user_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let task = require_task(&tx, id)?;
        tx.commit()?;

        tracing::debug!(task_id = id, project_id = task.project_id, "task created");
        Ok(task)
    }

    /// Partial update. A changed `parent_task_id` goes through the same
    /// checks as [`reparent_task`](Self::reparent_task).
    pub fn update_task(&self, id: DbId, input: UpdateTaskInput) -> StoreResult<Option<Task>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let Some(existing) = load_task(&tx, id)? else {
            return Ok(None);
        };

        if let Some(parent_id) = input.parent_task_id {
            check_reparent(&tx, &existing, Some(parent_id))?;
        }

        let task = Task {
            title: input.title.unwrap_or(existing.title),
            description: input.description.or(existing.description),
            status: input.status.or(existing.status),
            priority: input.priority.or(existing.priority),
            tags: input.tags.or(existing.tags),
            latest_edit_date: input.latest_edit_date.or(existing.latest_edit_date),
            start_date: input.start_date.or(existing.start_date),
            end_date: input.end_date.or(existing.end_date),
            urls: input.urls.unwrap_or(existing.urls),
            archived: input.archived.unwrap_or(existing.archived),
            parent_task_id: input.parent_task_id.or(existing.parent_task_id),
            author_user_id: input.author_user_id.or(existing.author_user_id),
            assigned_user_id: input.assigned_user_id.or(existing.assigned_user_id),
            created_by_user_id: input.created_by_user_id.or(existing.created_by_user_id),
            latest_edited_by_user_id: input
                .latest_edited_by_user_id
                .or(existing.latest_edited_by_user_id),
            ..existing
        };

        tx.execute(
            "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, tags = ?,
                latest_edit_date = ?, start_date = ?, end_date = ?, urls = ?, archived = ?,
                parent_task_id = ?, author_user_id = ?, assigned_user_id = ?,
                created_by_user_id = ?, latest_edited_by_user_id = ?
             WHERE id = ?",
            params![
                &task.title,
                &task.description,
                task.status.map(|s| s.as_str()),
                task.priority.map(|p| p.as_str()),
                &task.tags,
                to_sql_datetime(task.latest_edit_date),
                to_sql_datetime(task.start_date),
                to_sql_datetime(task.end_date),
                serde_json::to_string(&task.urls)?,
                task.archived,
                task.parent_task_id,
                task.author_user_id,
                task.assigned_user_id,
                task.created_by_user_id,
                task.latest_edited_by_user_id,
                id,
            ],
        )?;
        tx.commit()?;
        Ok(Some(task))
    }

    pub fn update_task_status(&self, id: DbId, status: TaskStatus) -> StoreResult<Option<Task>> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE tasks SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        Ok(load_task(&conn, id)?)
    }

    /// Move a task to a layer and parent in one write. Both are written as
    /// given; `None` clears them.
    pub fn assign_task_to_layer(&self, id: DbId, input: AssignLayerInput) -> StoreResult<Task> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let task = require_task(&tx, id)?;
        let task = apply_move(&tx, &task, input.task_layer_id, input.parent_task_id)?;
        tx.commit()?;

        tracing::debug!(
            task_id = id,
            layer_id = ?task.task_layer_id,
            parent_id = ?task.parent_task_id,
            "task assigned to layer"
        );
        Ok(task)
    }

    /// Drop a task onto another task: the target becomes the parent and the
    /// task lands in the layer displayed after the target's.
    pub fn drop_task_onto_task(&self, id: DbId, input: DropTaskInput) -> StoreResult<Task> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let task = require_task(&tx, id)?;
        let target = require_task(&tx, input.target_task_id)?;
        let project_layers = layers::layers_of_project(&tx, target.project_id)?;
        let layer_id = rules::drop_layer(task.id, &TaskPosition::from(&target), &project_layers)?;

        let task = apply_move(&tx, &task, layer_id, Some(target.id))?;
        tx.commit()?;

        tracing::debug!(
            task_id = id,
            target_id = input.target_task_id,
            layer_id = ?task.task_layer_id,
            "task dropped onto task"
        );
        Ok(task)
    }

    /// Change only the parent of a task, keeping its layer. `None` detaches
    /// it. A task with nested tasks cannot change parent.
    pub fn reparent_task(&self, id: DbId, input: ReparentTaskInput) -> StoreResult<Task> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let task = require_task(&tx, id)?;
        check_reparent(&tx, &task, input.parent_task_id)?;
        tx.execute(
            "UPDATE tasks SET parent_task_id = ? WHERE id = ?",
            params![input.parent_task_id, id],
        )?;
        let task = require_task(&tx, id)?;
        tx.commit()?;
        Ok(task)
    }

    /// Delete a task with its comments and attachments. Its nested tasks
    /// become roots.
    pub fn delete_task(&self, id: DbId) -> StoreResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Attachments
    // ============================================================

    pub fn add_attachment(
        &self,
        task_id: DbId,
        input: CreateAttachmentInput,
    ) -> StoreResult<Attachment> {
        let conn = self.conn();
        if load_task(&conn, task_id)?.is_none() {
            return Err(StoreError::not_found("task", task_id));
        }
        conn.execute(
            "INSERT INTO attachments (file_url, file_name, task_id, uploaded_by_id)
             VALUES (?, ?, ?, ?)",
            params![&input.file_url, &input.file_name, task_id, input.uploaded_by_id],
        )?;
        Ok(Attachment {
            id: conn.last_insert_rowid(),
            file_url: input.file_url,
            file_name: input.file_name,
            task_id,
            uploaded_by_id: input.uploaded_by_id,
        })
    }
}

/// Guard and write a layer/parent move of `task` inside `conn`'s transaction.
fn apply_move(
    conn: &Connection,
    task: &Task,
    layer_id: Option<DbId>,
    parent_id: Option<DbId>,
) -> StoreResult<Task> {
    let layer = match layer_id {
        Some(layer_id) => Some(
            layers::load_layer(conn, layer_id)?.ok_or(StoreError::not_found("layer", layer_id))?,
        ),
        None => None,
    };
    let parent = match parent_id {
        Some(parent_id) => Some(require_task(conn, parent_id)?),
        None => None,
    };
    let parent_ancestors = match &parent {
        Some(parent) => ancestors(conn, parent.id)?,
        None => Vec::new(),
    };

    rules::check_move(&Move {
        task: TaskPosition::from(task),
        nested_count: nested_count(conn, task.id)?,
        layer: layer.as_ref(),
        parent: parent.as_ref().map(TaskPosition::from),
        parent_ancestors: &parent_ancestors,
    })?;

    conn.execute(
        "UPDATE tasks SET task_layer_id = ?, parent_task_id = ? WHERE id = ?",
        params![layer_id, parent_id, task.id],
    )?;
    require_task(conn, task.id)
}

/// Guard a parent change of `task`. Keeping the current parent is a no-op
/// and always allowed.
fn check_reparent(conn: &Connection, task: &Task, parent_id: Option<DbId>) -> StoreResult<()> {
    if task.parent_task_id == parent_id {
        return Ok(());
    }
    if let Some(parent_id) = parent_id {
        rules::check_not_self(task.id, parent_id)?;
        let parent = require_task(conn, parent_id)?;
        rules::check_no_cycle(task.id, parent_id, &ancestors(conn, parent_id)?)?;
        rules::check_same_project(task.project_id, None, Some(&TaskPosition::from(&parent)))?;
    }
    rules::check_movable(nested_count(conn, task.id)?)?;
    Ok(())
}

pub(super) fn load_task(conn: &Connection, id: DbId) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
        [id],
        task_from_row,
    )
    .optional()
}

fn require_task(conn: &Connection, id: DbId) -> StoreResult<Task> {
    load_task(conn, id)?.ok_or(StoreError::not_found("task", id))
}

fn nested_count(conn: &Connection, id: DbId) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE parent_task_id = ?",
        [id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Parent chain of `id`, nearest first, excluding `id`. Stops at a repeated
/// task so a corrupt chain cannot loop.
pub(super) fn ancestors(conn: &Connection, id: DbId) -> rusqlite::Result<Vec<DbId>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut current = id;
    loop {
        let parent: Option<DbId> = conn
            .query_row(
                "SELECT parent_task_id FROM tasks WHERE id = ?",
                [current],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        match parent {
            Some(parent) if seen.insert(parent) => {
                chain.push(parent);
                current = parent;
            }
            _ => return Ok(chain),
        }
    }
}

/// Tasks below `id`, one query per generation, at most `generations` deep.
fn descendants(conn: &Connection, id: DbId, generations: usize) -> rusqlite::Result<Vec<Task>> {
    let mut found = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut frontier = vec![id];

    for _ in 0..generations {
        if frontier.is_empty() {
            break;
        }
        let placeholders = vec!["?"; frontier.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE parent_task_id IN ({placeholders}) ORDER BY id"
        ))?;
        let generation = stmt
            .query_map(params_from_iter(frontier.iter()), task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        frontier = Vec::new();
        for task in generation {
            if seen.insert(task.id) {
                frontier.push(task.id);
                found.push(task);
            }
        }
    }
    Ok(found)
}

pub(super) fn tasks_of_project(conn: &Connection, project_id: DbId) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ? ORDER BY id"
    ))?;
    let tasks = stmt
        .query_map([project_id], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

fn all_tasks(conn: &Connection) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))?;
    let tasks = stmt
        .query_map([], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

fn attachments_of_task(conn: &Connection, task_id: DbId) -> rusqlite::Result<Vec<Attachment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attachments a WHERE a.task_id = ? ORDER BY a.id",
        qualified(ATTACHMENT_COLUMNS, "a")
    ))?;
    let attachments = stmt
        .query_map([task_id], attachment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(attachments)
}

/// Build a `LIKE` pattern matching `query` anywhere, with wildcards escaped.
pub(super) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
