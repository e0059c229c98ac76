use serde::{Deserialize, Serialize};

use super::{DbId, Project, User};

/// An organization: a named group of users that can be attached to projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    pub id: DbId,
    pub org_name: String,
    pub description: Option<String>,
    pub product_owner_user_id: Option<DbId>,
    pub project_manager_user_id: Option<DbId>,
    pub created_by_user_id: Option<DbId>,
}

/// Org list entry with its members and the owner/manager usernames resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSummary {
    #[serde(flatten)]
    pub org: Org,
    pub users: Vec<User>,
    pub product_owner_username: Option<String>,
    pub project_manager_username: Option<String>,
}

/// An org with its members, as embedded in project details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgWithUsers {
    #[serde(flatten)]
    pub org: Org,
    pub users: Vec<User>,
}

/// Full org details: members ordered by username, plus the org's projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgDetail {
    #[serde(flatten)]
    pub org: Org,
    pub users: Vec<User>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgInput {
    pub org_name: String,
    pub description: Option<String>,
    pub product_owner_user_id: Option<DbId>,
    pub project_manager_user_id: Option<DbId>,
    pub created_by_user_id: Option<DbId>,
    /// Initial member ids.
    #[serde(default)]
    pub users: Vec<DbId>,
}

/// Partial org update. When `users` is present it replaces the member set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrgInput {
    pub org_name: Option<String>,
    pub description: Option<String>,
    pub product_owner_user_id: Option<DbId>,
    pub project_manager_user_id: Option<DbId>,
    pub users: Option<Vec<DbId>>,
}
