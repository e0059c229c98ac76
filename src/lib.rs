//! Orgnocal: multi-tenant project and task tracking.
//!
//! Projects own views, task layers and tasks. Tasks nest into a forest and
//! sit in at most one layer; the rules keeping those two structures
//! consistent live in [`hierarchy`] and are enforced by every store write in
//! [`db`]. [`api`] serves the store over HTTP and [`client`] consumes it with
//! a tag-invalidated [`cache`].

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod hierarchy;
pub mod models;
pub mod tree_render;
