//! Column lists and row mappers shared by the entity modules.

use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::models::*;

pub const PROJECT_COLUMNS: &str =
    "id, name, description, start_date, end_date, created_by_user_id, archived";

pub const VIEW_COLUMNS: &str = "id, name, view_type, project_index, task_order, filters, project_id";

pub const LAYER_COLUMNS: &str = "id, name, project_id, sort_index";

pub const TASK_COLUMNS: &str = "id, title, description, status, priority, tags, posted_date, \
     latest_edit_date, start_date, end_date, size, urls, project_id, archived, parent_task_id, \
     task_layer_id, created_by_user_id, latest_edited_by_user_id, author_user_id, assigned_user_id";

pub const USER_COLUMNS: &str =
    "user_id, external_id, username, email, profile_picture_url, roles";

pub const ORG_COLUMNS: &str = "id, org_name, description, product_owner_user_id, \
     project_manager_user_id, created_by_user_id";

pub const COMMENT_COLUMNS: &str = "id, text, posted_date, latest_edit_date, task_id, user_id, \
     deleted_at, deleted_by_user_id";

pub const ATTACHMENT_COLUMNS: &str = "id, file_url, file_name, task_id, uploaded_by_id";

/// Prefix every column in `columns` with `alias.`, for joins.
pub fn qualified(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn to_sql_datetime(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

fn parse_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

fn parse_list(value: String) -> Vec<String> {
    serde_json::from_str(&value).unwrap_or_default()
}

pub fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        start_date: parse_datetime(row.get(3)?),
        end_date: parse_datetime(row.get(4)?),
        created_by_user_id: row.get(5)?,
        archived: row.get(6)?,
    })
}

pub fn view_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectView> {
    let view_type: String = row.get(2)?;
    Ok(ProjectView {
        id: row.get(0)?,
        name: row.get(1)?,
        view_type: ViewType::from_str(&view_type).unwrap_or(ViewType::Board),
        project_index: row.get(3)?,
        task_order: row.get(4)?,
        filters: row.get(5)?,
        project_id: row.get(6)?,
    })
}

pub fn layer_from_row(row: &Row<'_>) -> rusqlite::Result<TaskLayer> {
    Ok(TaskLayer {
        id: row.get(0)?,
        name: row.get(1)?,
        project_id: row.get(2)?,
        sort_index: row.get(3)?,
    })
}

pub fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| TaskStatus::from_str(&s)),
        priority: row
            .get::<_, Option<String>>(4)?
            .and_then(|s| Priority::from_str(&s)),
        tags: row.get(5)?,
        posted_date: parse_datetime(row.get(6)?),
        latest_edit_date: parse_datetime(row.get(7)?),
        start_date: parse_datetime(row.get(8)?),
        end_date: parse_datetime(row.get(9)?),
        size: row.get(10)?,
        urls: parse_list(row.get(11)?),
        project_id: row.get(12)?,
        archived: row.get(13)?,
        parent_task_id: row.get(14)?,
        task_layer_id: row.get(15)?,
        created_by_user_id: row.get(16)?,
        latest_edited_by_user_id: row.get(17)?,
        author_user_id: row.get(18)?,
        assigned_user_id: row.get(19)?,
    })
}

pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        external_id: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        profile_picture_url: row.get(4)?,
        roles: parse_list(row.get(5)?),
    })
}

pub fn org_from_row(row: &Row<'_>) -> rusqlite::Result<Org> {
    Ok(Org {
        id: row.get(0)?,
        org_name: row.get(1)?,
        description: row.get(2)?,
        product_owner_user_id: row.get(3)?,
        project_manager_user_id: row.get(4)?,
        created_by_user_id: row.get(5)?,
    })
}

pub fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        text: row.get(1)?,
        posted_date: parse_datetime(row.get(2)?),
        latest_edit_date: parse_datetime(row.get(3)?),
        task_id: row.get(4)?,
        user_id: row.get(5)?,
        deleted_at: parse_datetime(row.get(6)?),
        deleted_by_user_id: row.get(7)?,
    })
}

pub fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        file_url: row.get(1)?,
        file_name: row.get(2)?,
        task_id: row.get(3)?,
        uploaded_by_id: row.get(4)?,
    })
}
