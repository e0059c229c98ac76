use serde::{Deserialize, Serialize};

use super::DbId;

/// One way of displaying a project's tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: DbId,
    pub name: String,
    pub view_type: ViewType,
    /// Position of the view among the project's tabs.
    pub project_index: i64,
    pub task_order: Option<String>,
    pub filters: Option<String>,
    pub project_id: DbId,
}

/// The kinds of project views. Stored and serialized lowercase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Board,
    Calendar,
    Dashboard,
    Gantt,
    Hierarchy,
    Table,
    Tile,
}

impl ViewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Calendar => "calendar",
            Self::Dashboard => "dashboard",
            Self::Gantt => "gantt",
            Self::Hierarchy => "hierarchy",
            Self::Table => "table",
            Self::Tile => "tile",
        }
    }

    /// Case-insensitive parse, so `"Board"` and `"board"` both work.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "board" => Some(Self::Board),
            "calendar" => Some(Self::Calendar),
            "dashboard" => Some(Self::Dashboard),
            "gantt" => Some(Self::Gantt),
            "hierarchy" => Some(Self::Hierarchy),
            "table" => Some(Self::Table),
            "tile" => Some(Self::Tile),
            _ => None,
        }
    }

    /// Default tab name: the type with its first letter upper-cased.
    pub fn display_name(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateViewInput {
    pub name: String,
    pub view_type: ViewType,
    pub project_index: i64,
    pub project_id: DbId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateViewInput {
    pub name: Option<String>,
    pub project_index: Option<i64>,
    pub task_order: Option<String>,
    pub filters: Option<String>,
}
