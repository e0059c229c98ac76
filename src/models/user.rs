use serde::{Deserialize, Serialize};

use super::{DbId, Org};

/// Profile picture given to newly created users.
pub const DEFAULT_PROFILE_PICTURE: &str = "profile1.jpg";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: DbId,
    /// Subject identifier from the external identity provider, if any.
    pub external_id: Option<String>,
    pub username: String,
    pub email: String,
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub roles: Option<Vec<String>>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub orgs: Vec<Org>,
}
