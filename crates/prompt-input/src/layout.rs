// Reference row layout: stacks the tree the way the sidebar draws it, one
// fixed-height row per visible node, each nested list padded one level further.

use std::collections::HashSet;

use prompt_core::{Folder, Node, NodeId, Rect, Vec2};

use crate::{ListLayout, RowLayout, RowShape, TreeLayout};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub origin: Vec2,
    pub width: f32,
    pub row_height: f32,
    /// Left padding added per nesting level, relative to the parent folder.
    pub level_indent: f32,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            origin: Vec2::new(0.0, 0.0),
            width: 280.0,
            row_height: 24.0,
            level_indent: 15.0,
        }
    }
}

/// Lay out `root` and everything visible below it. Folders in `collapsed`
/// show only their header.
pub fn stack_tree(root: &Folder, collapsed: &HashSet<NodeId>, metrics: &RowMetrics) -> TreeLayout {
    let mut layout = TreeLayout::default();
    let origin = metrics.origin;
    stack_folder(
        root,
        0,
        origin.x,
        origin.y,
        metrics.width,
        collapsed,
        metrics,
        &mut layout,
    );
    layout
}

/// Returns the bottom edge of the folder row.
#[allow(clippy::too_many_arguments)]
fn stack_folder(
    folder: &Folder,
    depth: usize,
    x: f32,
    y: f32,
    width: f32,
    collapsed: &HashSet<NodeId>,
    metrics: &RowMetrics,
    layout: &mut TreeLayout,
) -> f32 {
    let header = Rect::new(x, y, width, metrics.row_height);
    let row_index = layout.rows.len();
    layout.rows.push(RowLayout {
        id: folder.id,
        depth,
        rect: header,
        shape: RowShape::Folder {
            header,
            children: None,
        },
    });

    if collapsed.contains(&folder.id) {
        return header.bottom();
    }

    let list_depth = depth + 1;
    let pad = metrics.level_indent;
    let list_top = header.bottom();
    let list_index = layout.lists.len();
    layout.lists.push(ListLayout {
        parent: folder.id,
        depth: list_depth,
        rect: Rect::new(x, list_top, width, 0.0),
        items: Vec::with_capacity(folder.children.len()),
    });

    let mut cursor = list_top;
    for child in &folder.children {
        let item_top = cursor;
        cursor = match child {
            Node::Folder(sub) => stack_folder(
                sub,
                list_depth,
                x + pad,
                cursor,
                width - pad,
                collapsed,
                metrics,
                layout,
            ),
            Node::Component(c) => {
                layout.rows.push(RowLayout {
                    id: c.id,
                    depth: list_depth,
                    rect: Rect::new(x + pad, cursor, width - pad, metrics.row_height),
                    shape: RowShape::Component,
                });
                cursor + metrics.row_height
            }
        };
        layout.lists[list_index]
            .items
            .push(Rect::new(x + pad, item_top, width - pad, cursor - item_top));
    }

    let children = Rect::new(x, list_top, width, cursor - list_top);
    layout.lists[list_index].rect = children;
    let row = &mut layout.rows[row_index];
    row.rect = Rect::new(x, y, width, cursor - y);
    row.shape = RowShape::Folder {
        header,
        children: Some(children),
    };
    cursor
}
