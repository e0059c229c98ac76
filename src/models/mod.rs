//! Domain models for Orgnocal.
//!
//! # Core Concepts
//!
//! - [`Org`]: A group of users with a product owner and a project manager.
//! - [`User`]: A member of orgs and projects.
//! - [`Project`]: Top-level container owning views, task layers and tasks.
//! - [`ProjectView`]: One of the ways a project is displayed (board, gantt, ...).
//! - [`TaskLayer`]: A named, ordered bucket that tasks can optionally sit in.
//! - [`Task`]: A unit of work. Tasks nest into a forest via `parent_task_id`.
//! - [`Comment`]: Discussion on a task. Soft-deleted rather than removed.
//! - [`Attachment`]: A file reference attached to a task.
//!
//! All JSON is `camelCase` so existing web clients can consume it unchanged.

mod attachment;
mod comment;
mod layer;
mod org;
mod project;
mod search;
mod task;
mod user;
mod view;

pub use attachment::*;
pub use comment::*;
pub use layer::*;
pub use org::*;
pub use project::*;
pub use search::*;
pub use task::*;
pub use user::*;
pub use view::*;

/// Identifier type for every stored entity.
pub type DbId = i64;
