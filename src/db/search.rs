use rusqlite::Connection;

use super::rows::{
    org_from_row, project_from_row, task_from_row, user_from_row, ORG_COLUMNS, PROJECT_COLUMNS,
    TASK_COLUMNS, USER_COLUMNS,
};
use super::tasks::like_pattern;
use super::{Database, StoreResult};
use crate::models::SearchResults;

impl Database {
    /// Case-insensitive substring search over tasks, projects, orgs and
    /// users. A blank query matches nothing.
    pub fn search(&self, query: &str) -> StoreResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }
        let pattern = like_pattern(query);
        let conn = self.conn();

        Ok(SearchResults {
            tasks: matching(
                &conn,
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {}", either("title", "description")),
                &pattern,
                task_from_row,
            )?,
            projects: matching(
                &conn,
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE {}", either("name", "description")),
                &pattern,
                project_from_row,
            )?,
            orgs: matching(
                &conn,
                &format!("SELECT {ORG_COLUMNS} FROM orgs WHERE {}", either("org_name", "description")),
                &pattern,
                org_from_row,
            )?,
            users: matching(
                &conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username LIKE ?1 ESCAPE '\\'"),
                &pattern,
                user_from_row,
            )?,
        })
    }
}

fn either(a: &str, b: &str) -> String {
    format!("{a} LIKE ?1 ESCAPE '\\' OR {b} LIKE ?1 ESCAPE '\\'")
}

fn matching<T>(
    conn: &Connection,
    sql: &str,
    pattern: &str,
    map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([pattern], map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
