use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{layer_from_row, LAYER_COLUMNS};
use super::{tasks, Database, StoreError, StoreResult};
use crate::hierarchy::{self, rules, HierarchyInstance};
use crate::models::*;

impl Database {
    // ============================================================
    // Task layer operations
    // ============================================================

    pub fn get_layer(&self, id: DbId) -> StoreResult<Option<TaskLayer>> {
        Ok(load_layer(&self.conn(), id)?)
    }

    /// Layers of a project in display order.
    pub fn get_project_layers(&self, project_id: DbId) -> StoreResult<Vec<TaskLayer>> {
        Ok(layers_of_project(&self.conn(), project_id)?)
    }

    /// Every layer of a project with the tasks assigned to it. Each assigned
    /// task carries its nested tasks down to `max_depth` generations,
    /// whichever layer those nested tasks sit in.
    pub fn get_layers_with_tasks(
        &self,
        project_id: DbId,
        max_depth: usize,
    ) -> StoreResult<Vec<LayerWithTasks>> {
        let conn = self.conn();
        let layers = layers_of_project(&conn, project_id)?;
        let pool = tasks::tasks_of_project(&conn, project_id)?;

        let result = layers
            .into_iter()
            .map(|layer| {
                let assigned: Vec<Task> = pool
                    .iter()
                    .filter(|t| t.task_layer_id == Some(layer.id))
                    .cloned()
                    .collect();
                let forest = hierarchy::build_nodes(&assigned, &pool, max_depth);
                LayerWithTasks {
                    layer,
                    tasks: forest.tasks,
                    truncated: forest.truncated,
                }
            })
            .collect();
        Ok(result)
    }

    /// Column geometry of the project's hierarchy view.
    pub fn get_layout(
        &self,
        project_id: DbId,
        max_depth: usize,
    ) -> StoreResult<Vec<HierarchyInstance>> {
        let conn = self.conn();
        let layers = layers_of_project(&conn, project_id)?;
        let pool = tasks::tasks_of_project(&conn, project_id)?;
        Ok(hierarchy::compute_layout_geometry(&pool, &layers, max_depth))
    }

    /// Append a layer to a project. Refused once the project has
    /// [`MAX_LAYERS_PER_PROJECT`](hierarchy::MAX_LAYERS_PER_PROJECT) layers.
    pub fn create_layer(&self, input: CreateLayerInput) -> StoreResult<TaskLayer> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if super::projects::load_project(&tx, input.project_id)?.is_none() {
            return Err(StoreError::not_found("project", input.project_id));
        }
        let (count, next_index): (i64, i64) = tx.query_row(
            "SELECT COUNT(*), COALESCE(MAX(sort_index) + 1, 0) FROM task_layers WHERE project_id = ?",
            [input.project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        rules::check_create_layer(count as usize)?;

        tx.execute(
            "INSERT INTO task_layers (name, project_id, sort_index) VALUES (?, ?, ?)",
            params![&input.name, input.project_id, next_index],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(layer_id = id, project_id = input.project_id, "layer created");
        Ok(TaskLayer {
            id,
            name: input.name,
            project_id: input.project_id,
            sort_index: next_index,
        })
    }

    pub fn rename_layer(&self, id: DbId, input: UpdateLayerInput) -> StoreResult<Option<TaskLayer>> {
        let conn = self.conn();
        let Some(existing) = load_layer(&conn, id)? else {
            return Ok(None);
        };
        conn.execute(
            "UPDATE task_layers SET name = ? WHERE id = ?",
            params![&input.name, id],
        )?;
        Ok(Some(TaskLayer {
            name: input.name,
            ..existing
        }))
    }

    /// Rewrite the display order of a project's layers. `layer_ids` must be
    /// a permutation of the project's layers.
    pub fn reorder_layers(
        &self,
        project_id: DbId,
        input: ReorderLayersInput,
    ) -> StoreResult<Vec<TaskLayer>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if super::projects::load_project(&tx, project_id)?.is_none() {
            return Err(StoreError::not_found("project", project_id));
        }
        let existing: Vec<DbId> = layers_of_project(&tx, project_id)?
            .iter()
            .map(|l| l.id)
            .collect();
        rules::check_reorder(&existing, &input.layer_ids)?;

        for (index, layer_id) in input.layer_ids.iter().enumerate() {
            tx.execute(
                "UPDATE task_layers SET sort_index = ? WHERE id = ?",
                params![index as i64, layer_id],
            )?;
        }
        let layers = layers_of_project(&tx, project_id)?;
        tx.commit()?;
        Ok(layers)
    }

    /// Delete a layer that no task references any more.
    pub fn delete_layer(&self, id: DbId) -> StoreResult<Option<TaskLayer>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let Some(layer) = load_layer(&tx, id)? else {
            return Ok(None);
        };
        let assigned: i64 = tx.query_row(
            "SELECT COUNT(*) FROM tasks WHERE task_layer_id = ?",
            [id],
            |row| row.get(0),
        )?;
        rules::check_delete_layer(assigned as usize)?;

        tx.execute("DELETE FROM task_layers WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(Some(layer))
    }
}

pub(super) fn load_layer(conn: &Connection, id: DbId) -> rusqlite::Result<Option<TaskLayer>> {
    conn.query_row(
        &format!("SELECT {LAYER_COLUMNS} FROM task_layers WHERE id = ?"),
        [id],
        layer_from_row,
    )
    .optional()
}

pub(super) fn layers_of_project(
    conn: &Connection,
    project_id: DbId,
) -> rusqlite::Result<Vec<TaskLayer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LAYER_COLUMNS} FROM task_layers WHERE project_id = ? ORDER BY sort_index, id"
    ))?;
    let layers = stmt
        .query_map([project_id], layer_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layers)
}
