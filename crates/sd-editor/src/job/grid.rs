//! Row and column insertion for grid containers.

use super::{AddObjectJob, BatchJob, ModifyPropertyJob, UpdateSelectionJob};
use crate::context::EditorContext;
use crate::selection::SelectionGroup;
use sd_core::mask::grid_index;
use sd_core::{Fragment, GridAxis, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    Before,
    After,
}

/// Grids to extend and the lines to insert next to.
fn targets(ctx: &EditorContext, axis: GridAxis, position: InsertPosition) -> Option<Vec<(NodeId, Vec<usize>)>> {
    match ctx.selection.group()? {
        SelectionGroup::Grid(grid) if grid.axis() == axis => {
            Some(vec![(grid.target(), grid.indexes().iter().copied().collect())])
        }
        SelectionGroup::Grid(_) => None,
        SelectionGroup::Objects(objects) => objects
            .items()
            .iter()
            .map(|item| {
                let mask = ctx.mask(*item);
                if !mask.is_grid() {
                    return None;
                }
                let count = mask.line_count(axis);
                let line = match position {
                    InsertPosition::Before => 0,
                    InsertPosition::After => count.saturating_sub(1),
                };
                Some((*item, vec![line]))
            })
            .collect(),
    }
}

/// Insert one row or column next to each selected line.
///
/// Missing constraint objects are created first so there is one per
/// existing line. New constraints land at the insertion points, and every
/// child at or past an insertion point has its cell index shifted by the
/// number of lines inserted before it. Spans are left alone. A line
/// selection moves to the new lines; an object selection ends up on the
/// extended grids.
pub fn insert_grid_lines(ctx: &EditorContext, axis: GridAxis, position: InsertPosition) -> Option<BatchJob> {
    let targets = targets(ctx, axis, position)?;
    let class = ctx.registry.resolve_simple_name(axis.constraints_class());
    let constraint = || Fragment::instance(axis.constraints_class(), class);
    let slot = axis.constraints_property();
    let index_property = axis.index_property();
    let (grid_group, hit) = match ctx.selection.group() {
        Some(SelectionGroup::Objects(objects)) => (false, Some(objects.hit())),
        _ => (true, None),
    };

    let mut batch = BatchJob::new(format!("Insert {}", axis.label()));
    let mut inserted: Vec<(NodeId, Vec<usize>)> = Vec::new();

    for (grid, lines) in targets {
        let mask = ctx.mask(grid);
        let count = mask.line_count(axis);
        let existing = mask.grid_constraints(axis).len();

        for k in existing..count {
            batch.push(AddObjectJob::from_fragment(constraint(), grid, slot, k));
        }

        let mut points: Vec<usize> = lines
            .iter()
            .map(|line| match position {
                _ if count == 0 => 0,
                InsertPosition::Before => *line,
                InsertPosition::After => line + 1,
            })
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut new_lines = Vec::with_capacity(points.len());
        for (j, point) in points.iter().enumerate() {
            batch.push(AddObjectJob::from_fragment(constraint(), grid, slot, point + j));
            new_lines.push(point + j);
        }

        for child in mask.sub_components() {
            let from = grid_index(&ctx.document, *child, axis);
            let shift = points.iter().filter(|p| **p <= from).count();
            if shift > 0 {
                batch.push(ModifyPropertyJob::set(*child, index_property, (from + shift).to_string()));
            }
        }
        inserted.push((grid, new_lines));
    }

    let selected = match inserted.as_slice() {
        [(grid, lines)] if grid_group => SelectionGroup::grid(*grid, axis, lines.iter().copied()),
        _ => SelectionGroup::objects(inserted.iter().map(|(grid, _)| *grid), hit),
    };
    batch.push(UpdateSelectionJob::new(selected));
    Some(batch)
}
