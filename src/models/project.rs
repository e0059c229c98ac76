use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DbId, OrgWithUsers, ProjectView, TaskLayer, User, ViewType};

/// A project containing views, layers and tasks.
///
/// Projects are the top-level unit of work. Users and orgs are attached as
/// members; deleting a project removes everything it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<DbId>,
    pub archived: bool,
}

/// Input for creating a new project.
///
/// One view is created per entry of `views`, in list order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<DbId>,
    #[serde(default)]
    pub views: Vec<ViewType>,
}

/// Input for updating an existing project. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub archived: Option<bool>,
}

/// Replaces the member sets of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectMembersInput {
    #[serde(default)]
    pub users: Vec<DbId>,
    #[serde(default)]
    pub orgs: Vec<DbId>,
}

/// A project with its views, layers and members, used for detailed responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub project_views: Vec<ProjectView>,
    pub task_layers: Vec<TaskLayer>,
    pub users: Vec<User>,
    pub orgs: Vec<OrgWithUsers>,
}
