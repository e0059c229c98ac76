use rusqlite::{params, Connection, OptionalExtension};

use super::rows::{org_from_row, qualified, user_from_row, ORG_COLUMNS, USER_COLUMNS};
use super::{Database, StoreResult};
use crate::models::*;

impl Database {
    // ============================================================
    // User operations
    // ============================================================

    pub fn get_all_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY user_id"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn get_user(&self, id: DbId) -> StoreResult<Option<UserDetail>> {
        let conn = self.conn();
        let Some(user) = load_user(&conn, id)? else {
            return Ok(None);
        };
        Ok(Some(UserDetail {
            orgs: orgs_of_user(&conn, id)?,
            user,
        }))
    }

    /// Look a user up by the subject id of their identity provider account.
    pub fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<UserDetail>> {
        let conn = self.conn();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?"),
                [external_id],
                user_from_row,
            )
            .optional()?;
        let Some(user) = user else {
            return Ok(None);
        };
        Ok(Some(UserDetail {
            orgs: orgs_of_user(&conn, user.user_id)?,
            user,
        }))
    }

    pub fn create_user(&self, input: CreateUserInput) -> StoreResult<User> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (external_id, username, email, profile_picture_url, roles)
             VALUES (?, ?, ?, ?, '[]')",
            params![
                &input.external_id,
                &input.username,
                &input.email,
                DEFAULT_PROFILE_PICTURE
            ],
        )?;
        Ok(User {
            user_id: conn.last_insert_rowid(),
            external_id: input.external_id,
            username: input.username,
            email: input.email,
            profile_picture_url: Some(DEFAULT_PROFILE_PICTURE.to_string()),
            roles: Vec::new(),
        })
    }

    pub fn update_user(&self, id: DbId, input: UpdateUserInput) -> StoreResult<Option<User>> {
        let conn = self.conn();
        let Some(existing) = load_user(&conn, id)? else {
            return Ok(None);
        };

        let user = User {
            username: input.username.unwrap_or(existing.username),
            roles: input.roles.unwrap_or(existing.roles),
            profile_picture_url: input.profile_picture_url.or(existing.profile_picture_url),
            ..existing
        };
        conn.execute(
            "UPDATE users SET username = ?, roles = ?, profile_picture_url = ? WHERE user_id = ?",
            params![
                &user.username,
                serde_json::to_string(&user.roles)?,
                &user.profile_picture_url,
                id
            ],
        )?;
        Ok(Some(user))
    }

    pub fn delete_user(&self, id: DbId) -> StoreResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM users WHERE user_id = ?", [id])?;
        Ok(rows > 0)
    }
}

pub(super) fn load_user(conn: &Connection, id: DbId) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"),
        [id],
        user_from_row,
    )
    .optional()
}

/// Members of an org, ordered by username.
pub(super) fn users_of_org(conn: &Connection, org_id: DbId) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users u JOIN org_users ou ON ou.user_id = u.user_id
         WHERE ou.org_id = ? ORDER BY u.username",
        qualified(USER_COLUMNS, "u")
    ))?;
    let users = stmt
        .query_map([org_id], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub(super) fn users_of_project(conn: &Connection, project_id: DbId) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users u JOIN project_users pu ON pu.user_id = u.user_id
         WHERE pu.project_id = ? ORDER BY u.username",
        qualified(USER_COLUMNS, "u")
    ))?;
    let users = stmt
        .query_map([project_id], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

fn orgs_of_user(conn: &Connection, user_id: DbId) -> rusqlite::Result<Vec<Org>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM orgs o JOIN org_users ou ON ou.org_id = o.id
         WHERE ou.user_id = ? ORDER BY o.org_name",
        qualified(ORG_COLUMNS, "o")
    ))?;
    let orgs = stmt
        .query_map([user_id], org_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(orgs)
}
