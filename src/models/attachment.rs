use serde::{Deserialize, Serialize};

use super::DbId;

/// A file reference attached to a task. The file itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: DbId,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_name: String,
    pub task_id: DbId,
    pub uploaded_by_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttachmentInput {
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_name: String,
    pub uploaded_by_id: Option<DbId>,
}
