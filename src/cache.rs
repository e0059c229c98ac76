//! Client-side query cache with tag based invalidation.
//!
//! Every cached read-model declares the [`Tag`]s it provides. Every mutating
//! call is described by a [`Mutation`], whose [`Mutation::invalidates`]
//! lists the tags that become stale once it succeeds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::models::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Projects,
    Tasks,
    Users,
    Orgs,
    TaskLayers,
    ProjectViews,
}

/// A cache tag: a whole kind, or one entity of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: TagKind,
    pub id: Option<DbId>,
}

impl Tag {
    pub fn all(kind: TagKind) -> Self {
        Self { kind, id: None }
    }

    pub fn one(kind: TagKind, id: DbId) -> Self {
        Self { kind, id: Some(id) }
    }

    /// Tags provided by a list read-model: the kind itself plus one tag per
    /// listed id, so an empty list is still evicted by kind-wide changes.
    pub fn list(kind: TagKind, ids: impl IntoIterator<Item = DbId>) -> Vec<Self> {
        std::iter::once(Self::all(kind))
            .chain(ids.into_iter().map(|id| Self::one(kind, id)))
            .collect()
    }

    /// Whether invalidating `self` makes an entry providing `provided` stale.
    fn covers(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match self.id {
            None => true,
            Some(id) => provided.id.is_none() || provided.id == Some(id),
        }
    }
}

/// Every mutating call the client can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateProject,
    UpdateProject { project_id: DbId },
    UpdateProjectUsers { project_id: DbId },
    DeleteProject { project_id: DbId },
    ReorderLayers { project_id: DbId },

    CreateView { project_id: DbId },
    UpdateView { view_id: DbId, project_id: DbId },
    DeleteView { view_id: DbId, project_id: DbId },

    CreateLayer { project_id: DbId },
    RenameLayer { layer_id: DbId },
    DeleteLayer { layer_id: DbId },

    CreateTask,
    /// `parent_id` is the parent after the write, whose detail lists the
    /// task among its nested tasks.
    UpdateTask { task_id: DbId, parent_id: Option<DbId> },
    UpdateTaskStatus { task_id: DbId },
    UpdateTaskLayer { task_id: DbId, parent_id: Option<DbId> },
    DropTask { task_id: DbId, parent_id: Option<DbId> },
    ReparentTask { task_id: DbId, parent_id: Option<DbId> },
    DeleteTask { task_id: DbId },
    AddAttachment { task_id: DbId },

    CreateComment { task_id: DbId },
    SoftDeleteComment { task_id: DbId },

    CreateUser,
    UpdateUser { user_id: DbId },
    DeleteUser { user_id: DbId },

    CreateOrg,
    UpdateOrg { org_id: DbId },
    DeleteOrg { org_id: DbId },
}

impl Mutation {
    /// Tags made stale by this mutation.
    pub fn invalidates(&self) -> Vec<Tag> {
        use TagKind::*;

        match *self {
            Self::CreateProject | Self::DeleteProject { .. } => vec![Tag::all(Projects)],
            Self::UpdateProject { project_id } | Self::UpdateProjectUsers { project_id } => {
                vec![Tag::one(Projects, project_id)]
            }
            Self::ReorderLayers { project_id } => {
                vec![Tag::one(Projects, project_id), Tag::all(TaskLayers)]
            }

            Self::CreateView { .. } => vec![Tag::all(Projects)],
            Self::UpdateView { project_id, .. } => {
                vec![Tag::one(Projects, project_id), Tag::all(ProjectViews)]
            }
            Self::DeleteView { project_id, .. } => vec![Tag::one(Projects, project_id)],

            Self::CreateLayer { .. } | Self::RenameLayer { .. } | Self::DeleteLayer { .. } => {
                vec![Tag::all(TaskLayers)]
            }

            Self::CreateTask | Self::DeleteTask { .. } => vec![Tag::all(Tasks)],
            Self::UpdateTaskStatus { task_id }
            | Self::AddAttachment { task_id }
            | Self::CreateComment { task_id }
            | Self::SoftDeleteComment { task_id } => vec![Tag::one(Tasks, task_id)],
            Self::UpdateTask { task_id, parent_id }
            | Self::ReparentTask { task_id, parent_id } => {
                std::iter::once(Tag::one(Tasks, task_id))
                    .chain(parent_id.map(|id| Tag::one(Tasks, id)))
                    .collect()
            }
            Self::UpdateTaskLayer { task_id, parent_id }
            | Self::DropTask { task_id, parent_id } => std::iter::once(Tag::one(Tasks, task_id))
                .chain(parent_id.map(|id| Tag::one(Tasks, id)))
                .chain(std::iter::once(Tag::all(TaskLayers)))
                .collect(),

            Self::CreateUser | Self::DeleteUser { .. } => vec![Tag::all(Users)],
            Self::UpdateUser { user_id } => vec![Tag::one(Users, user_id)],

            Self::CreateOrg | Self::DeleteOrg { .. } => vec![Tag::all(Orgs)],
            Self::UpdateOrg { org_id } => vec![Tag::one(Orgs, org_id)],
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    tags: Vec<Tag>,
}

/// Read-models keyed by request path.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.lock().get(path).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, path: impl Into<String>, value: Value, tags: Vec<Tag>) {
        self.lock().insert(path.into(), CacheEntry { value, tags });
    }

    /// Evict every entry providing a tag covered by `tags`. Returns the
    /// number of evicted entries.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            !entry
                .tags
                .iter()
                .any(|provided| tags.iter().any(|tag| tag.covers(provided)))
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, ?tags, "cache entries invalidated");
        }
        evicted
    }

    pub fn apply(&self, mutation: Mutation) -> usize {
        self.invalidate(&mutation.invalidates())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
