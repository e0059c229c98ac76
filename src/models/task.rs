use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Attachment, CommentView, DbId, TaskLayer, User};

/// A unit of work inside a project.
///
/// Tasks form a self-referential forest through `parent_task_id`, and are
/// independently assigned to at most one [`TaskLayer`]. The layer is an
/// advisory coordinate: a child is expected to sit in the layer after its
/// parent's, but nothing rewrites descendants when a parent moves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Comma-joined tag list, e.g. `"backend,urgent"`.
    pub tags: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub latest_edit_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub size: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    pub project_id: DbId,
    pub archived: bool,
    pub parent_task_id: Option<DbId>,
    pub task_layer_id: Option<DbId>,
    pub created_by_user_id: Option<DbId>,
    pub latest_edited_by_user_id: Option<DbId>,
    pub author_user_id: Option<DbId>,
    pub assigned_user_id: Option<DbId>,
}

impl Task {
    /// Split the comma-joined `tags` field into trimmed, non-empty tags.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    ToDo,
    InProgress,
    InReview,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "ToDo",
            Self::InProgress => "InProgress",
            Self::InReview => "InReview",
            Self::Completed => "Completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ToDo" => Some(Self::ToDo),
            "InProgress" => Some(Self::InProgress),
            "InReview" => Some(Self::InReview),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Priority of a task, ordered from `Lowest` to `Critical`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Lowest,
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lowest => "Lowest",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Lowest" => Some(Self::Lowest),
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            "Critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Input for creating a new task.
///
/// A task may be created directly under a parent and/or inside a layer; both
/// must belong to the same project as the task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    pub project_id: DbId,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub tags: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub size: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    pub parent_task_id: Option<DbId>,
    pub task_layer_id: Option<DbId>,
    pub author_user_id: Option<DbId>,
    pub assigned_user_id: Option<DbId>,
    pub created_by_user_id: Option<DbId>,
}

/// Partial update of a task. `None` and a JSON `null` both leave the stored
/// value untouched, so PATCH can never clear a field. The parent is cleared
/// through `PUT /tasks/{id}/parent` with a null `parentTaskId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub tags: Option<String>,
    pub latest_edit_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub urls: Option<Vec<String>>,
    pub archived: Option<bool>,
    pub parent_task_id: Option<DbId>,
    pub author_user_id: Option<DbId>,
    pub assigned_user_id: Option<DbId>,
    pub created_by_user_id: Option<DbId>,
    pub latest_edited_by_user_id: Option<DbId>,
}

/// Move a task to a layer row, optionally under a new parent.
///
/// Both fields are written as given: `null` means "no layer" / "root task".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignLayerInput {
    #[serde(default)]
    pub task_layer_id: Option<DbId>,
    #[serde(default)]
    pub parent_task_id: Option<DbId>,
}

/// Drop a task onto another task, making the target its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTaskInput {
    pub target_task_id: DbId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReparentTaskInput {
    #[serde(default)]
    pub parent_task_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskStatusInput {
    pub status: TaskStatus,
}

/// A task with its nested tasks, used for tree responses.
///
/// `truncated` is set when the task has nested tasks that were cut off by the
/// depth limit of the request, so `nested_tasks` is incomplete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    #[serde(flatten)]
    pub task: Task,
    pub nested_tasks: Vec<TaskNode>,
    #[serde(default)]
    pub truncated: bool,
}

impl TaskNode {
    /// A node with no nested tasks loaded.
    pub fn leaf(task: Task) -> Self {
        Self {
            task,
            nested_tasks: Vec::new(),
            truncated: false,
        }
    }

    /// Whether this node or any node below it was cut off by the depth limit.
    pub fn any_truncated(&self) -> bool {
        self.truncated || self.nested_tasks.iter().any(TaskNode::any_truncated)
    }
}

/// A list of task trees plus a flag telling whether any of them was cut off.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskForest {
    pub tasks: Vec<TaskNode>,
    pub truncated: bool,
}

/// Full task details, used by the single-task endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub author: Option<User>,
    pub assignee: Option<User>,
    pub task_layer: Option<TaskLayer>,
    pub comments: Vec<CommentView>,
    pub attachments: Vec<Attachment>,
    pub nested_tasks: Vec<TaskNode>,
    pub truncated: bool,
}
