use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{view_from_row, VIEW_COLUMNS};
use super::{Database, StoreError, StoreResult};
use crate::models::*;

impl Database {
    // ============================================================
    // Project view operations
    // ============================================================

    pub fn get_view(&self, id: DbId) -> StoreResult<Option<ProjectView>> {
        Ok(load_view(&self.conn(), id)?)
    }

    pub fn create_view(&self, input: CreateViewInput) -> StoreResult<ProjectView> {
        let conn = self.conn();
        if super::projects::load_project(&conn, input.project_id)?.is_none() {
            return Err(StoreError::not_found("project", input.project_id));
        }

        conn.execute(
            "INSERT INTO project_views (name, view_type, project_index, project_id)
             VALUES (?, ?, ?, ?)",
            params![
                &input.name,
                input.view_type.as_str(),
                input.project_index,
                input.project_id
            ],
        )?;

        Ok(ProjectView {
            id: conn.last_insert_rowid(),
            name: input.name,
            view_type: input.view_type,
            project_index: input.project_index,
            task_order: None,
            filters: None,
            project_id: input.project_id,
        })
    }

    pub fn update_view(&self, id: DbId, input: UpdateViewInput) -> StoreResult<Option<ProjectView>> {
        let conn = self.conn();
        let Some(existing) = load_view(&conn, id)? else {
            return Ok(None);
        };

        let view = ProjectView {
            name: input.name.unwrap_or(existing.name),
            project_index: input.project_index.unwrap_or(existing.project_index),
            task_order: input.task_order.or(existing.task_order),
            filters: input.filters.or(existing.filters),
            ..existing
        };

        conn.execute(
            "UPDATE project_views SET name = ?, project_index = ?, task_order = ?, filters = ?
             WHERE id = ?",
            params![
                &view.name,
                view.project_index,
                &view.task_order,
                &view.filters,
                id
            ],
        )?;

        Ok(Some(view))
    }

    /// Delete a view, returning it so callers know which project it left.
    pub fn delete_view(&self, id: DbId) -> StoreResult<Option<ProjectView>> {
        let conn = self.conn();
        let Some(view) = load_view(&conn, id)? else {
            return Ok(None);
        };
        conn.execute("DELETE FROM project_views WHERE id = ?", [id])?;
        Ok(Some(view))
    }
}

fn load_view(conn: &Connection, id: DbId) -> rusqlite::Result<Option<ProjectView>> {
    conn.query_row(
        &format!("SELECT {VIEW_COLUMNS} FROM project_views WHERE id = ?"),
        [id],
        view_from_row,
    )
    .optional()
}

pub(super) fn views_of_project(
    conn: &Connection,
    project_id: DbId,
) -> rusqlite::Result<Vec<ProjectView>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VIEW_COLUMNS} FROM project_views WHERE project_id = ? ORDER BY project_index, id"
    ))?;
    let views = stmt
        .query_map([project_id], view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}
