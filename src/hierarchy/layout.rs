//! Column geometry for the hierarchy view.
//!
//! Every root task gets its own column group. A group is as wide as the
//! busiest generation below its root, and groups are laid out left to right:
//! roots in layers first (in layer display order), then roots without a layer.

use serde::{Deserialize, Serialize};

use super::forest::ChildIndex;
use super::rules::sort_layers;
use crate::models::{DbId, Task, TaskLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyInstance {
    pub top_task_id: DbId,
    pub column_index: usize,
    /// Sum of `max_items_per_layer` of every earlier instance.
    pub column_offset: usize,
    /// Largest number of tasks in one generation below the root, at least 1.
    pub max_items_per_layer: usize,
}

pub fn compute_layout_geometry(
    tasks: &[Task],
    layers: &[TaskLayer],
    max_depth: usize,
) -> Vec<HierarchyInstance> {
    let index = ChildIndex::new(tasks);

    let mut ordered = layers.to_vec();
    sort_layers(&mut ordered);
    let rank = |layer_id: Option<DbId>| {
        layer_id
            .and_then(|id| ordered.iter().position(|l| l.id == id))
            .unwrap_or(ordered.len())
    };

    let mut roots: Vec<&Task> = tasks.iter().filter(|t| index.is_root(t)).collect();
    roots.sort_by_key(|t| (rank(t.task_layer_id), t.id));

    let mut offset = 0;
    roots
        .into_iter()
        .enumerate()
        .map(|(column_index, root)| {
            let width = widest_generation(&index, root, max_depth);
            let instance = HierarchyInstance {
                top_task_id: root.id,
                column_index,
                column_offset: offset,
                max_items_per_layer: width,
            };
            offset += width;
            instance
        })
        .collect()
}

fn widest_generation(index: &ChildIndex<'_>, root: &Task, max_depth: usize) -> usize {
    let mut widest = 1;
    let mut generation: Vec<&Task> = vec![root];
    for _ in 0..max_depth {
        generation = generation
            .iter()
            .flat_map(|t| index.children_of(t.id).iter().copied())
            .filter(|t| t.id != root.id)
            .collect();
        if generation.is_empty() {
            break;
        }
        widest = widest.max(generation.len());
    }
    widest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::forest::tests::task;

    fn layer(id: DbId, sort_index: i64) -> TaskLayer {
        TaskLayer {
            id,
            name: format!("L{id}"),
            project_id: 1,
            sort_index,
        }
    }

    #[test]
    fn widths_and_offsets_accumulate() {
        let layers = vec![layer(1, 0), layer(2, 1)];
        let tasks = vec![
            task(1, None, Some(1)),
            task(2, None, Some(1)),
            task(10, Some(1), Some(2)),
            task(11, Some(1), Some(2)),
            task(12, Some(1), Some(2)),
            task(20, Some(2), Some(2)),
        ];
        let layout = compute_layout_geometry(&tasks, &layers, 5);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].top_task_id, 1);
        assert!(layout[0].max_items_per_layer >= 3);
        assert_eq!(layout[1].top_task_id, 2);
        assert_eq!(layout[1].column_index, 1);
        assert!(layout[1].column_offset >= 3);
        assert_eq!(layout[1].max_items_per_layer, 1);
    }

    #[test]
    fn childless_root_is_one_column_wide() {
        let layout = compute_layout_geometry(&[task(1, None, None)], &[], 5);
        assert_eq!(
            layout,
            vec![HierarchyInstance {
                top_task_id: 1,
                column_index: 0,
                column_offset: 0,
                max_items_per_layer: 1,
            }]
        );
    }

    #[test]
    fn widest_generation_may_be_deeper_than_the_first() {
        let tasks = vec![
            task(1, None, None),
            task(2, Some(1), None),
            task(3, Some(2), None),
            task(4, Some(2), None),
        ];
        let layout = compute_layout_geometry(&tasks, &[], 5);
        assert_eq!(layout[0].max_items_per_layer, 2);
    }

    #[test]
    fn layered_roots_come_first_in_display_order() {
        let layers = vec![layer(1, 1), layer(2, 0)];
        let tasks = vec![
            task(1, None, None),
            task(2, None, Some(1)),
            task(3, None, Some(2)),
        ];
        let order: Vec<DbId> = compute_layout_geometry(&tasks, &layers, 5)
            .iter()
            .map(|i| i.top_task_id)
            .collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}
