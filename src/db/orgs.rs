use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{org_from_row, project_from_row, qualified, ORG_COLUMNS, PROJECT_COLUMNS};
use super::{users, Database, StoreResult};
use crate::models::*;

impl Database {
    // ============================================================
    // Org operations
    // ============================================================

    /// Orgs by name, with members and owner/manager usernames resolved.
    pub fn get_all_orgs(&self) -> StoreResult<Vec<OrgSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ORG_COLUMNS} FROM orgs ORDER BY org_name"
        ))?;
        let orgs = stmt
            .query_map([], org_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let username = |user_id: Option<DbId>| -> rusqlite::Result<Option<String>> {
            Ok(match user_id {
                Some(id) => users::load_user(&conn, id)?.map(|u| u.username),
                None => None,
            })
        };

        orgs.into_iter()
            .map(|org| {
                Ok(OrgSummary {
                    users: users::users_of_org(&conn, org.id)?,
                    product_owner_username: username(org.product_owner_user_id)?,
                    project_manager_username: username(org.project_manager_user_id)?,
                    org,
                })
            })
            .collect()
    }

    pub fn get_org(&self, id: DbId) -> StoreResult<Option<OrgDetail>> {
        let conn = self.conn();
        let Some(org) = load_org(&conn, id)? else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects p JOIN project_orgs po ON po.project_id = p.id
             WHERE po.org_id = ? ORDER BY p.name",
            qualified(PROJECT_COLUMNS, "p")
        ))?;
        let projects = stmt
            .query_map([id], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(OrgDetail {
            users: users::users_of_org(&conn, id)?,
            projects,
            org,
        }))
    }

    pub fn create_org(&self, input: CreateOrgInput) -> StoreResult<Org> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO orgs (org_name, description, product_owner_user_id, project_manager_user_id, created_by_user_id)
             VALUES (?, ?, ?, ?, ?)",
            params![
                &input.org_name,
                &input.description,
                input.product_owner_user_id,
                input.project_manager_user_id,
                input.created_by_user_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        set_members(&tx, id, &input.users)?;
        tx.commit()?;

        Ok(Org {
            id,
            org_name: input.org_name,
            description: input.description,
            product_owner_user_id: input.product_owner_user_id,
            project_manager_user_id: input.project_manager_user_id,
            created_by_user_id: input.created_by_user_id,
        })
    }

    pub fn update_org(&self, id: DbId, input: UpdateOrgInput) -> StoreResult<Option<Org>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let Some(existing) = load_org(&tx, id)? else {
            return Ok(None);
        };

        let org = Org {
            org_name: input.org_name.unwrap_or(existing.org_name),
            description: input.description.or(existing.description),
            product_owner_user_id: input.product_owner_user_id.or(existing.product_owner_user_id),
            project_manager_user_id: input
                .project_manager_user_id
                .or(existing.project_manager_user_id),
            ..existing
        };
        tx.execute(
            "UPDATE orgs SET org_name = ?, description = ?, product_owner_user_id = ?,
                project_manager_user_id = ?
             WHERE id = ?",
            params![
                &org.org_name,
                &org.description,
                org.product_owner_user_id,
                org.project_manager_user_id,
                id,
            ],
        )?;
        if let Some(members) = &input.users {
            tx.execute("DELETE FROM org_users WHERE org_id = ?", [id])?;
            set_members(&tx, id, members)?;
        }
        tx.commit()?;
        Ok(Some(org))
    }

    pub fn delete_org(&self, id: DbId) -> StoreResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM orgs WHERE id = ?", [id])?;
        Ok(rows > 0)
    }
}

fn load_org(conn: &Connection, id: DbId) -> rusqlite::Result<Option<Org>> {
    conn.query_row(
        &format!("SELECT {ORG_COLUMNS} FROM orgs WHERE id = ?"),
        [id],
        org_from_row,
    )
    .optional()
}

fn set_members(conn: &Connection, org_id: DbId, user_ids: &[DbId]) -> rusqlite::Result<()> {
    for user_id in user_ids {
        conn.execute(
            "INSERT OR IGNORE INTO org_users (org_id, user_id) VALUES (?, ?)",
            params![org_id, user_id],
        )?;
    }
    Ok(())
}

pub(super) fn orgs_of_project(conn: &Connection, project_id: DbId) -> rusqlite::Result<Vec<Org>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM orgs o JOIN project_orgs po ON po.org_id = o.id
         WHERE po.project_id = ? ORDER BY o.org_name",
        qualified(ORG_COLUMNS, "o")
    ))?;
    let orgs = stmt
        .query_map([project_id], org_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(orgs)
}
