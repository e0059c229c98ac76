//! ASCII rendering of a project's layered task hierarchy.

use crate::models::{LayerWithTasks, TaskNode, TaskStatus};

const TO_DO: char = '○';
const IN_PROGRESS: char = '◐';
const IN_REVIEW: char = '◎';
const COMPLETED: char = '●';
const NO_STATUS: char = '•';

/// Marker appended to tasks whose nested tasks were cut off by the depth limit.
const TRUNCATED: &str = " …";

/// Heading of the section listing tasks without a layer.
pub const UNLAYERED_HEADING: &str = "(no layer)";

fn status_symbol(status: Option<TaskStatus>) -> char {
    match status {
        Some(TaskStatus::ToDo) => TO_DO,
        Some(TaskStatus::InProgress) => IN_PROGRESS,
        Some(TaskStatus::InReview) => IN_REVIEW,
        Some(TaskStatus::Completed) => COMPLETED,
        None => NO_STATUS,
    }
}

/// Render every layer as a section headed by its name, with the layer's
/// tasks drawn as trees below it. Unlayered root tasks follow under
/// [`UNLAYERED_HEADING`] when there are any.
///
/// Example output:
/// ```text
/// Backlog
/// ├── ○ Write schema
/// │   └── ◐ Review schema
/// └── ● Ship v1 …
/// ```
pub fn render_hierarchy(layers: &[LayerWithTasks], unlayered: &[TaskNode]) -> String {
    let mut output = String::new();
    for layer in layers {
        render_section(&mut output, &layer.layer.name, &layer.tasks);
    }
    if !unlayered.is_empty() {
        render_section(&mut output, UNLAYERED_HEADING, unlayered);
    }
    output
}

fn render_section(output: &mut String, heading: &str, nodes: &[TaskNode]) {
    output.push_str(heading);
    output.push('\n');
    for (i, node) in nodes.iter().enumerate() {
        render_node(output, node, "", i + 1 == nodes.len());
    }
}

fn render_node(output: &mut String, node: &TaskNode, prefix: &str, is_last: bool) {
    let branch = if is_last { "└── " } else { "├── " };
    output.push_str(prefix);
    output.push_str(branch);
    output.push(status_symbol(node.task.status));
    output.push(' ');
    output.push_str(&node.task.title);
    if node.truncated {
        output.push_str(TRUNCATED);
    }
    output.push('\n');

    let continuation = if is_last { "    " } else { "│   " };
    let child_prefix = format!("{prefix}{continuation}");
    for (i, child) in node.nested_tasks.iter().enumerate() {
        render_node(output, child, &child_prefix, i + 1 == node.nested_tasks.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskLayer};

    fn node(title: &str, status: Option<TaskStatus>, nested: Vec<TaskNode>) -> TaskNode {
        TaskNode {
            task: Task {
                id: 1,
                title: title.to_string(),
                description: None,
                status,
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
                parent_task_id: None,
                task_layer_id: None,
                created_by_user_id: None,
                latest_edited_by_user_id: None,
                author_user_id: None,
                assigned_user_id: None,
            },
            nested_tasks: nested,
            truncated: false,
        }
    }

    fn layer(name: &str, tasks: Vec<TaskNode>) -> LayerWithTasks {
        LayerWithTasks {
            layer: TaskLayer {
                id: 1,
                name: name.to_string(),
                project_id: 1,
                sort_index: 0,
            },
            truncated: tasks.iter().any(TaskNode::any_truncated),
            tasks,
        }
    }

    #[test]
    fn test_empty_layer() {
        let output = render_hierarchy(&[layer("Backlog", vec![])], &[]);
        assert_eq!(output, "Backlog\n");
    }

    #[test]
    fn test_nested_tasks() {
        let layers = vec![layer(
            "Backlog",
            vec![
                node(
                    "Write schema",
                    Some(TaskStatus::ToDo),
                    vec![
                        node("Review schema", Some(TaskStatus::InProgress), vec![]),
                        node("Seed data", None, vec![]),
                    ],
                ),
                node("Ship v1", Some(TaskStatus::Completed), vec![]),
            ],
        )];
        let expected = "Backlog\n├── ○ Write schema\n│   ├── ◐ Review schema\n│   └── • Seed data\n└── ● Ship v1\n";
        assert_eq!(render_hierarchy(&layers, &[]), expected);
    }

    #[test]
    fn test_truncated_marker_and_unlayered_section() {
        let mut cut = node("Deep", Some(TaskStatus::InReview), vec![]);
        cut.truncated = true;
        let output = render_hierarchy(&[], &[cut]);
        assert_eq!(output, "(no layer)\n└── ◎ Deep …\n");
    }

    #[test]
    fn test_last_child_continuation_is_blank() {
        let layers = vec![layer(
            "Doing",
            vec![node(
                "A",
                None,
                vec![node("B", None, vec![node("C", None, vec![])])],
            )],
        )];
        let expected = "Doing\n└── • A\n    └── • B\n        └── • C\n";
        assert_eq!(render_hierarchy(&layers, &[]), expected);
    }
}
