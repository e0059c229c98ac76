//! Task hierarchy and layer consistency rules.
//!
//! Tasks in a project form a forest through `parent_task_id`, and each task
//! independently points at zero or one [`TaskLayer`](crate::models::TaskLayer).
//! This module holds the pure parts of that model:
//!
//! - [`rules`]: guard functions deciding whether a mutation is legal. They
//!   return `Result<(), Rejection>` and are evaluated by the store inside the
//!   same transaction as the write they protect.
//! - [`forest`]: bounded tree construction from flat task lists.
//! - [`layout`]: column geometry for the hierarchy view.
//!
//! Nothing here touches the database.

pub mod forest;
pub mod layout;
pub mod rules;

pub use forest::{build_forest, build_nodes, validate_forest, ChildIndex, ForestViolation};
pub use layout::{compute_layout_geometry, HierarchyInstance};
pub use rules::{Rejection, TaskPosition, MAX_LAYERS_PER_PROJECT};

/// Default number of nested generations returned below a requested task.
pub const DEFAULT_MAX_DEPTH: usize = 5;
