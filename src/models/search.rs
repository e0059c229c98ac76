use serde::{Deserialize, Serialize};

use super::{Org, Project, Task, User};

/// Results of a free-text search. Each list is matched independently and
/// returned unranked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub orgs: Vec<Org>,
    pub users: Vec<User>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.projects.is_empty()
            && self.orgs.is_empty()
            && self.users.is_empty()
    }
}
