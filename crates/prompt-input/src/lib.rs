// Drag geometry resolver
// Turns a pointer position plus the laid-out row rectangles of the tree (or the
// prompt editor) into a symbolic drop intent. Pure: nothing here mutates a tree,
// so it is safe to call on every pointer move.

pub mod layout;
mod tests;

use prompt_core::{
    DropIndicator, DropIntent, DropPosition, ListTarget, NodeId, Rect, Vec2, ROOT_ID,
};

pub use layout::{stack_tree, RowMetrics};

// ──────────────────────────────────────────────
// Layout input
// ──────────────────────────────────────────────

/// Horizontal margin (px) at the left of a child list that switches a
/// component drag into list reordering.
pub const INDENT: f32 = 20.0;

/// What is being dragged. Only components may use the list-insert zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Component,
    Folder,
    Section,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowShape {
    Component,
    Folder {
        header: Rect,
        /// The rendered children block; `None` while the folder is collapsed.
        children: Option<Rect>,
    },
}

/// One visible tree row. A folder row covers its header and its expanded children.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub id: NodeId,
    pub depth: usize,
    pub rect: Rect,
    pub shape: RowShape,
}

/// One rendered child list: the direct children of `parent`, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ListLayout {
    pub parent: NodeId,
    pub depth: usize,
    pub rect: Rect,
    pub items: Vec<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    pub rows: Vec<RowLayout>,
    pub lists: Vec<ListLayout>,
}

// ──────────────────────────────────────────────
// Resolution output
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub intent: DropIntent,
    pub indicator: DropIndicator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    pub indent: f32,
    /// Resolve the top half of a folder header to `Inside` (first child).
    /// When off, the whole header resolves to `InsideBottom`.
    pub first_child_zone: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            indent: INDENT,
            first_child_zone: false,
        }
    }
}

// ──────────────────────────────────────────────
// Resolver
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct DragGeometryResolver {
    config: ResolverConfig,
}

impl DragGeometryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a drag-over event in the sidebar tree.
    ///
    /// Precedence when regions overlap: a folder header wins, then the
    /// left-margin list zone (component drags only), then the above/below
    /// halves of the innermost row under the pointer. The root has no siblings,
    /// so its body outside any header or list zone resolves to nothing.
    pub fn resolve_tree(
        &self,
        layout: &TreeLayout,
        pointer: Vec2,
        dragging: DragKind,
    ) -> Option<Resolution> {
        let row = innermost_row(layout, pointer);

        if let Some(row) = row {
            if let Some(resolution) = self.folder_header_drop(row, pointer) {
                return Some(resolution);
            }
        }

        if dragging == DragKind::Component {
            if let Some(resolution) = self.list_margin_drop(layout, pointer) {
                return Some(resolution);
            }
        }

        row.filter(|row| row.id != ROOT_ID)
            .map(|row| row_half_drop(row, pointer))
    }

    /// Resolve a drag-over event in the prompt editor: the insertion index among
    /// the section blocks, or `None` when the pointer left the editor.
    pub fn resolve_sections(
        &self,
        editor: Rect,
        sections: &[Rect],
        pointer: Vec2,
    ) -> Option<Resolution> {
        if !editor.contains(pointer) {
            return None;
        }
        let index = insertion_index(sections, pointer.y);
        let y = if index == 0 {
            editor.y
        } else {
            sections[index - 1].bottom()
        };
        Some(Resolution {
            intent: DropIntent::ListInsert {
                list: ListTarget::Sections,
                index,
            },
            indicator: DropIndicator {
                x: editor.x,
                y,
                width: editor.width,
            },
        })
    }

    fn folder_header_drop(&self, row: &RowLayout, pointer: Vec2) -> Option<Resolution> {
        let RowShape::Folder { header, children } = &row.shape else {
            return None;
        };
        if pointer.y >= header.bottom() {
            return None;
        }

        let indent = self.config.indent;
        let x = row.rect.x + indent;
        let width = row.rect.width - indent;

        if self.config.first_child_zone && pointer.y < header.mid_y() {
            return Some(Resolution {
                intent: DropIntent::Node {
                    target: row.id,
                    position: DropPosition::Inside,
                },
                indicator: DropIndicator { x, y: header.bottom(), width },
            });
        }

        // Expanded folders draw the line under the last rendered child.
        let y = children.map_or(header.bottom(), |c| c.bottom());
        Some(Resolution {
            intent: DropIntent::Node {
                target: row.id,
                position: DropPosition::InsideBottom,
            },
            indicator: DropIndicator { x, y, width },
        })
    }

    fn list_margin_drop(&self, layout: &TreeLayout, pointer: Vec2) -> Option<Resolution> {
        let list = layout
            .lists
            .iter()
            .filter(|list| {
                list.rect.contains(pointer)
                    && pointer.x < list.rect.x + self.config.indent
                    && !list.items.iter().any(|item| item.contains(pointer))
            })
            .max_by_key(|list| list.depth)?;

        let index = insertion_index(&list.items, pointer.y);
        let y = match index {
            0 => list.items.first().map_or(list.rect.y, |r| r.y),
            i => list.items[i - 1].bottom(),
        };
        Some(Resolution {
            intent: DropIntent::ListInsert {
                list: ListTarget::Children(list.parent),
                index,
            },
            indicator: DropIndicator {
                x: list.rect.x,
                y,
                width: list.rect.width,
            },
        })
    }
}

/// First index whose box midpoint lies below `y`; the list length if none does.
pub fn insertion_index(items: &[Rect], y: f32) -> usize {
    items
        .iter()
        .position(|rect| y < rect.mid_y())
        .unwrap_or(items.len())
}

/// The deepest row containing the pointer. Later rows win ties.
fn innermost_row(layout: &TreeLayout, pointer: Vec2) -> Option<&RowLayout> {
    layout
        .rows
        .iter()
        .filter(|row| row.rect.contains(pointer))
        .max_by_key(|row| row.depth)
}

fn row_half_drop(row: &RowLayout, pointer: Vec2) -> Resolution {
    let rect = row.rect;
    let (position, y) = if pointer.y - rect.y < rect.height / 2.0 {
        (DropPosition::Above, rect.y)
    } else {
        (DropPosition::Below, rect.bottom())
    };
    Resolution {
        intent: DropIntent::Node {
            target: row.id,
            position,
        },
        indicator: DropIndicator {
            x: rect.x,
            y,
            width: rect.width,
        },
    }
}
