//! HTTP client for the Orgnocal API.
//!
//! Read-models fetched with GET are kept in a [`QueryCache`] and evicted by
//! the tags of each successful mutation. Configuration is via environment
//! variables:
//! - `ORGNOCAL_URL` - Base URL (default: `http://localhost:3000`)
//! - `ORGNOCAL_API_KEY` - API key for authentication (optional for local)

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cache::{Mutation, QueryCache, Tag, TagKind};
use crate::db::TaskFilter;
use crate::hierarchy::HierarchyInstance;
use crate::models::*;

/// Default URL for local development.
const DEFAULT_URL: &str = "http://localhost:3000";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The server refused a hierarchy mutation.
    #[error("Rejected ({reason}): {message}")]
    Rejected { reason: String, message: String },

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: Option<String>,
}

/// HTTP client for the Orgnocal API.
#[derive(Debug, Clone)]
pub struct OrgnocalClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    cache: Arc<QueryCache>,
}

impl OrgnocalClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("ORGNOCAL_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("ORGNOCAL_API_KEY").ok();
        Self::new(base_url, api_key)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
            cache: Arc::new(QueryCache::new()),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Build a request with optional auth header.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Convert non-success statuses to [`ClientError`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            body
        } else {
            parsed.message
        };
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(message),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::CONFLICT => ClientError::Rejected {
                reason: parsed.reason.unwrap_or_default(),
                message,
            },
            _ => ClientError::Server(format!("{}: {}", status, message)),
        })
    }

    /// GET a read-model, serving it from the cache when present.
    async fn get_cached<T: DeserializeOwned>(
        &self,
        path: &str,
        tags: impl FnOnce(&T) -> Vec<Tag>,
    ) -> Result<T, ClientError> {
        if let Some(value) = self.cache.get(path) {
            return Ok(serde_json::from_value(value)?);
        }
        let response = self.request(Method::GET, path).send().await?;
        let value: Value = Self::check(response).await?.json().await?;
        let parsed: T = serde_json::from_value(value.clone())?;
        self.cache.insert(path, value, tags(&parsed));
        Ok(parsed)
    }

    /// Send a mutation and invalidate what it made stale.
    async fn mutate<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        mutation: impl FnOnce(&T) -> Mutation,
    ) -> Result<T, ClientError> {
        let response = self.request(method, path).json(body).send().await?;
        let parsed: T = Self::check(response).await?.json().await?;
        self.cache.apply(mutation(&parsed));
        Ok(parsed)
    }

    /// DELETE that answers `204 No Content`.
    async fn delete(&self, path: &str, mutation: Mutation) -> Result<(), ClientError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check(response).await?;
        self.cache.apply(mutation);
        Ok(())
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    // ============================================================
    // Project Operations
    // ============================================================

    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.get_cached("/projects", |projects: &Vec<Project>| {
            Tag::list(TagKind::Projects, projects.iter().map(|p| p.id))
        })
        .await
    }

    pub async fn get_project(&self, id: DbId) -> Result<ProjectDetail, ClientError> {
        self.get_cached(&format!("/projects/{id}"), |detail: &ProjectDetail| {
            vec![Tag::one(TagKind::Projects, detail.project.id)]
        })
        .await
    }

    pub async fn create_project(&self, input: &CreateProjectInput) -> Result<Project, ClientError> {
        let body = serde_json::json!({ "project": input });
        self.mutate(Method::POST, "/projects", &body, |_: &Project| {
            Mutation::CreateProject
        })
        .await
    }

    pub async fn update_project(
        &self,
        id: DbId,
        input: &UpdateProjectInput,
    ) -> Result<Project, ClientError> {
        self.mutate(Method::PATCH, &format!("/projects/{id}"), input, |_: &Project| {
            Mutation::UpdateProject { project_id: id }
        })
        .await
    }

    pub async fn update_project_members(
        &self,
        id: DbId,
        input: &UpdateProjectMembersInput,
    ) -> Result<Project, ClientError> {
        self.mutate(
            Method::PATCH,
            &format!("/projects/{id}/update-users"),
            input,
            |_: &Project| Mutation::UpdateProjectUsers { project_id: id },
        )
        .await
    }

    pub async fn reorder_layers(
        &self,
        project_id: DbId,
        layer_ids: Vec<DbId>,
    ) -> Result<Vec<TaskLayer>, ClientError> {
        let input = ReorderLayersInput { layer_ids };
        self.mutate(
            Method::PATCH,
            &format!("/projects/{project_id}/layers"),
            &input,
            |_: &Vec<TaskLayer>| Mutation::ReorderLayers { project_id },
        )
        .await
    }

    pub async fn delete_project(&self, id: DbId) -> Result<(), ClientError> {
        self.delete(
            &format!("/projects/{id}"),
            Mutation::DeleteProject { project_id: id },
        )
        .await
    }

    // ============================================================
    // View Operations
    // ============================================================

    pub async fn create_view(&self, input: &CreateViewInput) -> Result<ProjectView, ClientError> {
        self.mutate(Method::POST, "/views", input, |view: &ProjectView| {
            Mutation::CreateView {
                project_id: view.project_id,
            }
        })
        .await
    }

    pub async fn update_view(
        &self,
        id: DbId,
        input: &UpdateViewInput,
    ) -> Result<ProjectView, ClientError> {
        self.mutate(Method::PATCH, &format!("/views/{id}"), input, |view: &ProjectView| {
            Mutation::UpdateView {
                view_id: view.id,
                project_id: view.project_id,
            }
        })
        .await
    }

    pub async fn delete_view(&self, id: DbId) -> Result<ProjectView, ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/views/{id}"))
            .send()
            .await?;
        let view: ProjectView = Self::check(response).await?.json().await?;
        self.cache.apply(Mutation::DeleteView {
            view_id: view.id,
            project_id: view.project_id,
        });
        Ok(view)
    }

    // ============================================================
    // Layer Operations
    // ============================================================

    /// Layers of a project with their assigned task trees.
    pub async fn list_layers(
        &self,
        project_id: DbId,
        depth: Option<usize>,
    ) -> Result<Vec<LayerWithTasks>, ClientError> {
        let mut path = format!("/layers?projectId={project_id}");
        if let Some(depth) = depth {
            path.push_str(&format!("&depth={depth}"));
        }
        self.get_cached(&path, |layers: &Vec<LayerWithTasks>| {
            let mut tags = Tag::list(TagKind::TaskLayers, layers.iter().map(|l| l.layer.id));
            let mut task_ids = Vec::new();
            for layer in layers {
                collect_ids(&layer.tasks, &mut task_ids);
            }
            tags.extend(Tag::list(TagKind::Tasks, task_ids));
            tags
        })
        .await
    }

    pub async fn get_layout(&self, project_id: DbId) -> Result<Vec<HierarchyInstance>, ClientError> {
        self.get_cached(
            &format!("/layers/layout?projectId={project_id}"),
            |_: &Vec<HierarchyInstance>| {
                vec![Tag::all(TagKind::TaskLayers), Tag::all(TagKind::Tasks)]
            },
        )
        .await
    }

    pub async fn create_layer(&self, input: &CreateLayerInput) -> Result<TaskLayer, ClientError> {
        self.mutate(Method::POST, "/layers", input, |layer: &TaskLayer| {
            Mutation::CreateLayer {
                project_id: layer.project_id,
            }
        })
        .await
    }

    pub async fn rename_layer(&self, id: DbId, name: &str) -> Result<TaskLayer, ClientError> {
        let input = UpdateLayerInput {
            name: name.to_string(),
        };
        self.mutate(Method::PATCH, &format!("/layers/{id}"), &input, |_: &TaskLayer| {
            Mutation::RenameLayer { layer_id: id }
        })
        .await
    }

    pub async fn delete_layer(&self, id: DbId) -> Result<TaskLayer, ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/layers/{id}"))
            .send()
            .await?;
        let layer: TaskLayer = Self::check(response).await?.json().await?;
        self.cache.apply(Mutation::DeleteLayer { layer_id: id });
        Ok(layer)
    }

    // ============================================================
    // Task Operations
    // ============================================================

    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        depth: Option<usize>,
    ) -> Result<TaskForest, ClientError> {
        let mut params = Vec::new();
        if let Some(project_id) = filter.project_id {
            params.push(format!("projectId={project_id}"));
        }
        if let Some(archived) = filter.archived {
            params.push(format!("archived={archived}"));
        }
        if let Some(query) = filter.query.as_deref() {
            params.push(format!("query={}", encode_query_value(query)));
        }
        if let Some(depth) = depth {
            params.push(format!("depth={depth}"));
        }
        let path = if params.is_empty() {
            "/tasks".to_string()
        } else {
            format!("/tasks?{}", params.join("&"))
        };
        self.get_cached(&path, |forest: &TaskForest| {
            let mut ids = Vec::new();
            collect_ids(&forest.tasks, &mut ids);
            Tag::list(TagKind::Tasks, ids)
        })
        .await
    }

    pub async fn get_task(&self, id: DbId) -> Result<TaskDetail, ClientError> {
        self.get_cached(&format!("/tasks/{id}"), |detail: &TaskDetail| {
            let mut ids = vec![detail.task.id];
            collect_ids(&detail.nested_tasks, &mut ids);
            ids.into_iter().map(|id| Tag::one(TagKind::Tasks, id)).collect()
        })
        .await
    }

    /// Tasks authored by, assigned to, or created by a user.
    pub async fn list_user_tasks(&self, user_id: DbId) -> Result<Vec<Task>, ClientError> {
        self.get_cached(&format!("/tasks/user/{user_id}"), |tasks: &Vec<Task>| {
            Tag::list(TagKind::Tasks, tasks.iter().map(|t| t.id))
        })
        .await
    }

    pub async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ClientError> {
        self.mutate(Method::POST, "/tasks", input, |_: &Task| Mutation::CreateTask)
            .await
    }

    pub async fn update_task(&self, id: DbId, input: &UpdateTaskInput) -> Result<Task, ClientError> {
        self.mutate(Method::PATCH, &format!("/tasks/{id}"), input, |task: &Task| {
            Mutation::UpdateTask {
                task_id: id,
                parent_id: task.parent_task_id,
            }
        })
        .await
    }

    pub async fn update_task_status(
        &self,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Task, ClientError> {
        let input = UpdateTaskStatusInput { status };
        self.mutate(Method::PATCH, &format!("/tasks/{id}/status"), &input, |_: &Task| {
            Mutation::UpdateTaskStatus { task_id: id }
        })
        .await
    }

    /// Move a task into a layer row, optionally under a new parent.
    pub async fn assign_task_to_layer(
        &self,
        id: DbId,
        input: &AssignLayerInput,
    ) -> Result<Task, ClientError> {
        self.mutate(Method::PATCH, &format!("/tasks/{id}/layer"), input, |task: &Task| {
            Mutation::UpdateTaskLayer {
                task_id: id,
                parent_id: task.parent_task_id,
            }
        })
        .await
    }

    pub async fn drop_task_onto_task(&self, id: DbId, target_task_id: DbId) -> Result<Task, ClientError> {
        let input = DropTaskInput { target_task_id };
        self.mutate(Method::POST, &format!("/tasks/{id}/drop"), &input, |task: &Task| {
            Mutation::DropTask {
                task_id: id,
                parent_id: task.parent_task_id,
            }
        })
        .await
    }

    pub async fn reparent_task(
        &self,
        id: DbId,
        parent_task_id: Option<DbId>,
    ) -> Result<Task, ClientError> {
        let input = ReparentTaskInput { parent_task_id };
        self.mutate(Method::PUT, &format!("/tasks/{id}/parent"), &input, |task: &Task| {
            Mutation::ReparentTask {
                task_id: id,
                parent_id: task.parent_task_id,
            }
        })
        .await
    }

    pub async fn add_attachment(
        &self,
        id: DbId,
        input: &CreateAttachmentInput,
    ) -> Result<Attachment, ClientError> {
        self.mutate(
            Method::POST,
            &format!("/tasks/{id}/attachments"),
            input,
            |_: &Attachment| Mutation::AddAttachment { task_id: id },
        )
        .await
    }

    pub async fn delete_task(&self, id: DbId) -> Result<(), ClientError> {
        self.delete(&format!("/tasks/{id}"), Mutation::DeleteTask { task_id: id })
            .await
    }

    // ============================================================
    // Comment Operations
    // ============================================================

    pub async fn create_comment(&self, input: &CreateCommentInput) -> Result<Comment, ClientError> {
        self.mutate(Method::POST, "/comments", input, |comment: &Comment| {
            Mutation::CreateComment {
                task_id: comment.task_id,
            }
        })
        .await
    }

    /// Soft-delete a comment, or recover it by sending both fields empty.
    pub async fn soft_delete_comment(
        &self,
        id: DbId,
        input: &SoftDeleteCommentInput,
    ) -> Result<Comment, ClientError> {
        self.mutate(
            Method::PATCH,
            &format!("/comments/{id}/soft-delete"),
            input,
            |comment: &Comment| Mutation::SoftDeleteComment {
                task_id: comment.task_id,
            },
        )
        .await
    }

    // ============================================================
    // User Operations
    // ============================================================

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get_cached("/users", |users: &Vec<User>| {
            Tag::list(TagKind::Users, users.iter().map(|u| u.user_id))
        })
        .await
    }

    pub async fn get_user(&self, id: DbId) -> Result<UserDetail, ClientError> {
        self.get_cached(&format!("/users/{id}"), |detail: &UserDetail| {
            vec![Tag::one(TagKind::Users, detail.user.user_id)]
        })
        .await
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<User, ClientError> {
        self.mutate(Method::POST, "/users", input, |_: &User| Mutation::CreateUser)
            .await
    }

    pub async fn update_user(&self, id: DbId, input: &UpdateUserInput) -> Result<User, ClientError> {
        self.mutate(Method::PATCH, &format!("/users/{id}"), input, |_: &User| {
            Mutation::UpdateUser { user_id: id }
        })
        .await
    }

    pub async fn delete_user(&self, id: DbId) -> Result<(), ClientError> {
        self.delete(&format!("/users/{id}"), Mutation::DeleteUser { user_id: id })
            .await
    }

    // ============================================================
    // Org Operations
    // ============================================================

    pub async fn list_orgs(&self) -> Result<Vec<OrgSummary>, ClientError> {
        self.get_cached("/orgs", |orgs: &Vec<OrgSummary>| {
            Tag::list(TagKind::Orgs, orgs.iter().map(|o| o.org.id))
        })
        .await
    }

    pub async fn get_org(&self, id: DbId) -> Result<OrgDetail, ClientError> {
        self.get_cached(&format!("/orgs/{id}"), |detail: &OrgDetail| {
            vec![Tag::one(TagKind::Orgs, detail.org.id)]
        })
        .await
    }

    pub async fn create_org(&self, input: &CreateOrgInput) -> Result<Org, ClientError> {
        self.mutate(Method::POST, "/orgs", input, |_: &Org| Mutation::CreateOrg)
            .await
    }

    pub async fn update_org(&self, id: DbId, input: &UpdateOrgInput) -> Result<Org, ClientError> {
        self.mutate(Method::PATCH, &format!("/orgs/{id}"), input, |_: &Org| {
            Mutation::UpdateOrg { org_id: id }
        })
        .await
    }

    pub async fn delete_org(&self, id: DbId) -> Result<(), ClientError> {
        self.delete(&format!("/orgs/{id}"), Mutation::DeleteOrg { org_id: id })
            .await
    }

    // ============================================================
    // Search
    // ============================================================

    /// Free-text search. Not cached: results carry no tags.
    pub async fn search(&self, query: &str) -> Result<SearchResults, ClientError> {
        let response = self
            .request(Method::GET, "/search")
            .query(&[("query", query)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

fn collect_ids(nodes: &[TaskNode], ids: &mut Vec<DbId>) {
    for node in nodes {
        ids.push(node.task.id);
        collect_ids(&node.nested_tasks, ids);
    }
}

/// Percent-encode a query string value.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
