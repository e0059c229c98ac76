use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{project_from_row, to_sql_datetime, PROJECT_COLUMNS};
use super::{layers, orgs, users, views, Database, StoreResult};
use crate::models::*;

impl Database {
    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self) -> StoreResult<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name, id"
        ))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn get_project(&self, id: DbId) -> StoreResult<Option<Project>> {
        Ok(load_project(&self.conn(), id)?)
    }

    /// A project with its views, layers (in display order) and members.
    pub fn get_project_detail(&self, id: DbId) -> StoreResult<Option<ProjectDetail>> {
        let conn = self.conn();
        let Some(project) = load_project(&conn, id)? else {
            return Ok(None);
        };

        let orgs = orgs::orgs_of_project(&conn, id)?
            .into_iter()
            .map(|org| {
                let users = users::users_of_org(&conn, org.id)?;
                Ok(OrgWithUsers { org, users })
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(ProjectDetail {
            project_views: views::views_of_project(&conn, id)?,
            task_layers: layers::layers_of_project(&conn, id)?,
            users: users::users_of_project(&conn, id)?,
            orgs,
            project,
        }))
    }

    /// Create a project and one view per requested view type.
    pub fn create_project(&self, input: CreateProjectInput) -> StoreResult<Project> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO projects (name, description, start_date, end_date, created_by_user_id, archived)
             VALUES (?, ?, ?, ?, ?, 0)",
            params![
                &input.name,
                &input.description,
                to_sql_datetime(input.start_date),
                to_sql_datetime(input.end_date),
                input.created_by_user_id,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for (index, view_type) in input.views.iter().enumerate() {
            tx.execute(
                "INSERT INTO project_views (name, view_type, project_index, project_id)
                 VALUES (?, ?, ?, ?)",
                params![view_type.display_name(), view_type.as_str(), index as i64, id],
            )?;
        }

        tx.commit()?;
        tracing::debug!(project_id = id, views = input.views.len(), "project created");

        Ok(Project {
            id,
            name: input.name,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            created_by_user_id: input.created_by_user_id,
            archived: false,
        })
    }

    pub fn update_project(
        &self,
        id: DbId,
        input: UpdateProjectInput,
    ) -> StoreResult<Option<Project>> {
        let conn = self.conn();
        let Some(existing) = load_project(&conn, id)? else {
            return Ok(None);
        };

        let project = Project {
            id,
            name: input.name.unwrap_or(existing.name),
            description: input.description.or(existing.description),
            start_date: input.start_date.or(existing.start_date),
            end_date: input.end_date.or(existing.end_date),
            created_by_user_id: existing.created_by_user_id,
            archived: input.archived.unwrap_or(existing.archived),
        };

        conn.execute(
            "UPDATE projects SET name = ?, description = ?, start_date = ?, end_date = ?, archived = ?
             WHERE id = ?",
            params![
                &project.name,
                &project.description,
                to_sql_datetime(project.start_date),
                to_sql_datetime(project.end_date),
                project.archived,
                id,
            ],
        )?;

        Ok(Some(project))
    }

    /// Delete a project and everything it owns.
    pub fn delete_project(&self, id: DbId) -> StoreResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM projects WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    /// Replace the user and org members of a project.
    pub fn update_project_members(
        &self,
        id: DbId,
        input: UpdateProjectMembersInput,
    ) -> StoreResult<Option<Project>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let Some(project) = load_project(&tx, id)? else {
            return Ok(None);
        };

        tx.execute("DELETE FROM project_users WHERE project_id = ?", [id])?;
        tx.execute("DELETE FROM project_orgs WHERE project_id = ?", [id])?;
        for user_id in &input.users {
            tx.execute(
                "INSERT OR IGNORE INTO project_users (project_id, user_id) VALUES (?, ?)",
                params![id, user_id],
            )?;
        }
        for org_id in &input.orgs {
            tx.execute(
                "INSERT OR IGNORE INTO project_orgs (project_id, org_id) VALUES (?, ?)",
                params![id, org_id],
            )?;
        }

        tx.commit()?;
        Ok(Some(project))
    }
}

pub(super) fn load_project(conn: &Connection, id: DbId) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"),
        [id],
        project_from_row,
    )
    .optional()
}
