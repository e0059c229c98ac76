//! Guards for task placement and layer lifecycle.

use serde::Serialize;
use thiserror::Error;

use crate::models::{DbId, Task, TaskLayer};

/// A project may own at most this many task layers.
pub const MAX_LAYERS_PER_PROJECT: usize = 5;

/// Why a hierarchy or layer mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("a task cannot become its own parent")]
    SelfParent,

    #[error("task {task_id} is an ancestor of task {parent_id} and cannot be placed under it")]
    ParentCycle { task_id: DbId, parent_id: DbId },

    #[error("task has {count} nested task(s); detach them before moving it")]
    HasNestedTasks { count: usize },

    #[error("project already has the maximum of {limit} layers")]
    LayerLimitReached { limit: usize },

    #[error("layer still has {count} task(s) assigned to it")]
    LayerNotEmpty { count: usize },

    #[error("{entity} {id} belongs to a different project")]
    CrossProject { entity: &'static str, id: DbId },

    #[error("target task {target_id} is not in a layer")]
    TargetHasNoLayer { target_id: DbId },

    #[error("layer order must list every layer of the project exactly once")]
    ReorderMismatch,
}

impl Rejection {
    /// Stable machine-readable code, mirrored in API error bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::SelfParent => "self_parent",
            Self::ParentCycle { .. } => "parent_cycle",
            Self::HasNestedTasks { .. } => "has_nested_tasks",
            Self::LayerLimitReached { .. } => "layer_limit_reached",
            Self::LayerNotEmpty { .. } => "layer_not_empty",
            Self::CrossProject { .. } => "cross_project",
            Self::TargetHasNoLayer { .. } => "target_has_no_layer",
            Self::ReorderMismatch => "reorder_mismatch",
        }
    }
}

/// The hierarchy coordinates of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPosition {
    pub id: DbId,
    pub project_id: DbId,
    pub parent_task_id: Option<DbId>,
    pub task_layer_id: Option<DbId>,
}

impl From<&Task> for TaskPosition {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            project_id: task.project_id,
            parent_task_id: task.parent_task_id,
            task_layer_id: task.task_layer_id,
        }
    }
}

/// A requested move of an existing task.
#[derive(Debug, Clone, Copy)]
pub struct Move<'a> {
    pub task: TaskPosition,
    /// Number of tasks currently nested directly under `task`.
    pub nested_count: usize,
    pub layer: Option<&'a TaskLayer>,
    pub parent: Option<TaskPosition>,
    /// Ancestors of `parent`, nearest first, not including `parent` itself.
    pub parent_ancestors: &'a [DbId],
}

/// Guard for assigning a task to a layer and parent in one write.
///
/// Checked in order: self-parenting, nested tasks, cycles, project membership.
pub fn check_move(mv: &Move<'_>) -> Result<(), Rejection> {
    if let Some(parent) = mv.parent {
        check_not_self(mv.task.id, parent.id)?;
    }
    check_movable(mv.nested_count)?;
    if let Some(parent) = mv.parent {
        check_no_cycle(mv.task.id, parent.id, mv.parent_ancestors)?;
    }
    check_same_project(mv.task.project_id, mv.layer, mv.parent.as_ref())
}

/// A task with nested tasks must have them detached before it can move.
pub fn check_movable(nested_count: usize) -> Result<(), Rejection> {
    if nested_count > 0 {
        return Err(Rejection::HasNestedTasks {
            count: nested_count,
        });
    }
    Ok(())
}

pub fn check_not_self(task_id: DbId, parent_id: DbId) -> Result<(), Rejection> {
    if task_id == parent_id {
        return Err(Rejection::SelfParent);
    }
    Ok(())
}

/// `task_id` must not appear among the ancestors of its would-be parent.
pub fn check_no_cycle(
    task_id: DbId,
    parent_id: DbId,
    parent_ancestors: &[DbId],
) -> Result<(), Rejection> {
    if parent_ancestors.contains(&task_id) {
        return Err(Rejection::ParentCycle { task_id, parent_id });
    }
    Ok(())
}

/// Layer and parent, when given, must live in `project_id`.
pub fn check_same_project(
    project_id: DbId,
    layer: Option<&TaskLayer>,
    parent: Option<&TaskPosition>,
) -> Result<(), Rejection> {
    if let Some(layer) = layer {
        if layer.project_id != project_id {
            return Err(Rejection::CrossProject {
                entity: "layer",
                id: layer.id,
            });
        }
    }
    if let Some(parent) = parent {
        if parent.project_id != project_id {
            return Err(Rejection::CrossProject {
                entity: "task",
                id: parent.id,
            });
        }
    }
    Ok(())
}

pub fn check_create_layer(existing_layers: usize) -> Result<(), Rejection> {
    if existing_layers >= MAX_LAYERS_PER_PROJECT {
        return Err(Rejection::LayerLimitReached {
            limit: MAX_LAYERS_PER_PROJECT,
        });
    }
    Ok(())
}

pub fn check_delete_layer(assigned_tasks: usize) -> Result<(), Rejection> {
    if assigned_tasks > 0 {
        return Err(Rejection::LayerNotEmpty {
            count: assigned_tasks,
        });
    }
    Ok(())
}

/// The requested order must be a permutation of the existing layer ids.
pub fn check_reorder(existing: &[DbId], requested: &[DbId]) -> Result<(), Rejection> {
    let mut a = existing.to_vec();
    let mut b = requested.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    if a != b {
        return Err(Rejection::ReorderMismatch);
    }
    Ok(())
}

/// Sort layers into display order.
pub fn sort_layers(layers: &mut [TaskLayer]) {
    layers.sort_by_key(|l| (l.sort_index, l.id));
}

/// The layer displayed right after `layer_id`, or `None` if it is the last
/// one (or unknown).
pub fn layer_after(layers: &[TaskLayer], layer_id: DbId) -> Option<DbId> {
    let mut ordered = layers.to_vec();
    sort_layers(&mut ordered);
    let index = ordered.iter().position(|l| l.id == layer_id)?;
    ordered.get(index + 1).map(|l| l.id)
}

/// Resolve the layer a task lands in when dropped onto `target`.
///
/// The target becomes the parent, and the task goes one layer below it.
pub fn drop_layer(
    task_id: DbId,
    target: &TaskPosition,
    layers: &[TaskLayer],
) -> Result<Option<DbId>, Rejection> {
    check_not_self(task_id, target.id)?;
    let target_layer = target.task_layer_id.ok_or(Rejection::TargetHasNoLayer {
        target_id: target.id,
    })?;
    Ok(layer_after(layers, target_layer))
}
