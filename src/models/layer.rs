use serde::{Deserialize, Serialize};

use super::{DbId, TaskNode};

/// A named, ordered bucket of tasks within a project.
///
/// Layers are displayed in `(sort_index, id)` order. `sort_index` is assigned
/// on creation (appended last) and rewritten only by an explicit reorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskLayer {
    pub id: DbId,
    pub name: String,
    pub project_id: DbId,
    pub sort_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLayerInput {
    pub name: String,
    pub project_id: DbId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLayerInput {
    pub name: String,
}

/// New display order for a project's layers. Must list every layer once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderLayersInput {
    pub layer_ids: Vec<DbId>,
}

/// A layer together with the tasks assigned to it and their nested tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerWithTasks {
    #[serde(flatten)]
    pub layer: TaskLayer,
    pub tasks: Vec<TaskNode>,
    pub truncated: bool,
}
