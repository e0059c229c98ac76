//! Bounded tree construction over flat task lists.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{DbId, Task, TaskForest, TaskNode};

/// Parent id -> direct children, in id order.
pub struct ChildIndex<'a> {
    children: HashMap<DbId, Vec<&'a Task>>,
    ids: HashSet<DbId>,
}

impl<'a> ChildIndex<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        let mut children: HashMap<DbId, Vec<&'a Task>> = HashMap::new();
        for task in tasks {
            if let Some(parent) = task.parent_task_id {
                children.entry(parent).or_default().push(task);
            }
        }
        for list in children.values_mut() {
            list.sort_by_key(|t| t.id);
        }
        let ids = tasks.iter().map(|t| t.id).collect();
        Self { children, ids }
    }

    pub fn children_of(&self, id: DbId) -> &[&'a Task] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.ids.contains(&id)
    }

    /// A task is a root when it has no parent or its parent is not in the set.
    pub fn is_root(&self, task: &Task) -> bool {
        task.parent_task_id.map_or(true, |p| !self.contains(p))
    }

    /// Build the subtree under `task`, descending at most `max_depth`
    /// generations.
    pub fn subtree(&self, task: &Task, max_depth: usize) -> TaskNode {
        let mut path = HashSet::new();
        self.subtree_inner(task, max_depth, &mut path)
    }

    fn subtree_inner(&self, task: &Task, remaining: usize, path: &mut HashSet<DbId>) -> TaskNode {
        let children = self.children_of(task.id);
        let mut node = TaskNode::leaf(task.clone());
        if children.is_empty() {
            return node;
        }
        if remaining == 0 {
            node.truncated = true;
            return node;
        }

        path.insert(task.id);
        for child in children {
            // a corrupt parent chain must not loop forever
            if path.contains(&child.id) {
                continue;
            }
            let nested = self.subtree_inner(child, remaining - 1, path);
            node.nested_tasks.push(nested);
        }
        path.remove(&task.id);
        node
    }
}

/// Arrange `tasks` into trees rooted at tasks with no parent in the list.
pub fn build_forest(tasks: &[Task], max_depth: usize) -> TaskForest {
    let index = ChildIndex::new(tasks);
    let mut roots: Vec<&Task> = tasks.iter().filter(|t| index.is_root(t)).collect();
    roots.sort_by_key(|t| t.id);
    collect(&index, roots, max_depth)
}

/// Build a tree for each task in `roots`, drawing nested tasks from `pool`.
pub fn build_nodes(roots: &[Task], pool: &[Task], max_depth: usize) -> TaskForest {
    let index = ChildIndex::new(pool);
    collect(&index, roots.iter().collect(), max_depth)
}

fn collect(index: &ChildIndex<'_>, roots: Vec<&Task>, max_depth: usize) -> TaskForest {
    let tasks: Vec<TaskNode> = roots
        .into_iter()
        .map(|t| index.subtree(t, max_depth))
        .collect();
    let truncated = tasks.iter().any(TaskNode::any_truncated);
    TaskForest { tasks, truncated }
}

/// A structural problem in a set of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForestViolation {
    SelfParent { task_id: DbId },
    Cycle { task_id: DbId },
    TooDeep { task_id: DbId, depth: usize },
}

/// Check that no task is its own parent, no parent chain loops, and every
/// chain ends within `max_depth` ancestors.
pub fn validate_forest(tasks: &[Task], max_depth: usize) -> Vec<ForestViolation> {
    let parents: HashMap<DbId, Option<DbId>> =
        tasks.iter().map(|t| (t.id, t.parent_task_id)).collect();

    let mut violations = Vec::new();
    let mut ids: Vec<DbId> = parents.keys().copied().collect();
    ids.sort_unstable();

    for id in ids {
        if parents.get(&id).copied().flatten() == Some(id) {
            violations.push(ForestViolation::SelfParent { task_id: id });
            continue;
        }

        let mut seen = HashSet::from([id]);
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = parents.get(&current).copied().flatten() {
            if !parents.contains_key(&parent) {
                break;
            }
            if !seen.insert(parent) {
                violations.push(ForestViolation::Cycle { task_id: id });
                break;
            }
            depth += 1;
            current = parent;
        }
        if depth > max_depth && !violations.contains(&ForestViolation::Cycle { task_id: id }) {
            violations.push(ForestViolation::TooDeep { task_id: id, depth });
        }
    }
    violations
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn task(id: DbId, parent: Option<DbId>, layer: Option<DbId>) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: None,
            status: None,
            priority: None,
            tags: None,
            posted_date: None,
            latest_edit_date: None,
            start_date: None,
            end_date: None,
            size: None,
            urls: vec![],
            project_id: 1,
            archived: false,
            parent_task_id: parent,
            task_layer_id: layer,
            created_by_user_id: None,
            latest_edited_by_user_id: None,
            author_user_id: None,
            assigned_user_id: None,
        }
    }

    fn chain(len: DbId) -> Vec<Task> {
        (1..=len)
            .map(|id| task(id, if id == 1 { None } else { Some(id - 1) }, None))
            .collect()
    }

    #[test]
    fn builds_roots_and_children_in_id_order() {
        let tasks = vec![
            task(3, Some(1), None),
            task(1, None, None),
            task(2, Some(1), None),
            task(4, None, None),
        ];
        let forest = build_forest(&tasks, 5);
        let roots: Vec<DbId> = forest.tasks.iter().map(|n| n.task.id).collect();
        assert_eq!(roots, vec![1, 4]);
        let kids: Vec<DbId> = forest.tasks[0]
            .nested_tasks
            .iter()
            .map(|n| n.task.id)
            .collect();
        assert_eq!(kids, vec![2, 3]);
        assert!(!forest.truncated);
    }

    #[test]
    fn orphan_with_missing_parent_is_a_root() {
        let tasks = vec![task(2, Some(99), None)];
        let forest = build_forest(&tasks, 5);
        assert_eq!(forest.tasks.len(), 1);
        assert_eq!(forest.tasks[0].task.id, 2);
    }

    #[test]
    fn depth_limit_sets_truncated() {
        let tasks = chain(4);
        let forest = build_forest(&tasks, 2);
        assert!(forest.truncated);
        let second = &forest.tasks[0].nested_tasks[0];
        let third = &second.nested_tasks[0];
        assert_eq!(third.task.id, 3);
        assert!(third.nested_tasks.is_empty());
        assert!(third.truncated);
    }

    #[test]
    fn exact_depth_is_not_truncated() {
        let forest = build_forest(&chain(3), 2);
        assert!(!forest.truncated);
    }

    #[test]
    fn depth_zero_returns_bare_roots() {
        let forest = build_forest(&chain(2), 0);
        assert!(forest.tasks[0].nested_tasks.is_empty());
        assert!(forest.tasks[0].truncated);
    }

    #[test]
    fn build_nodes_uses_given_roots() {
        let pool = chain(3);
        let roots = vec![pool[1].clone()];
        let forest = build_nodes(&roots, &pool, 5);
        assert_eq!(forest.tasks.len(), 1);
        assert_eq!(forest.tasks[0].task.id, 2);
        assert_eq!(forest.tasks[0].nested_tasks[0].task.id, 3);
    }

    #[test]
    fn valid_forest_has_no_violations() {
        assert!(validate_forest(&chain(5), 5).is_empty());
    }

    #[test]
    fn detects_self_parent() {
        let tasks = vec![task(1, Some(1), None)];
        assert_eq!(
            validate_forest(&tasks, 5),
            vec![ForestViolation::SelfParent { task_id: 1 }]
        );
    }

    #[test]
    fn detects_cycles() {
        let tasks = vec![task(1, Some(2), None), task(2, Some(1), None)];
        let violations = validate_forest(&tasks, 5);
        assert!(violations.contains(&ForestViolation::Cycle { task_id: 1 }));
        assert!(violations.contains(&ForestViolation::Cycle { task_id: 2 }));
    }

    #[test]
    fn detects_chains_deeper_than_limit() {
        let violations = validate_forest(&chain(4), 2);
        assert_eq!(
            violations,
            vec![ForestViolation::TooDeep { task_id: 4, depth: 3 }]
        );
    }

    #[test]
    fn cyclic_input_still_builds() {
        let tasks = vec![
            task(1, None, None),
            task(2, Some(1), None),
            task(3, Some(3), None),
        ];
        let forest = build_forest(&tasks, 5);
        assert_eq!(forest.tasks.len(), 1);
    }
}
