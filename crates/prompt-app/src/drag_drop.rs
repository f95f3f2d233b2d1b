use std::collections::HashSet;

use prompt_core::{
    DropIndicator, DropIntent, ListTarget, Node, NodeId, Rect, Section, Vec2, ROOT_ID,
};
use prompt_editor::{sections, SectionError};
use prompt_input::{DragKind, Resolution, TreeLayout};
use prompt_tree::{ComponentTree, TreeError};

use crate::state::{AppError, AppState};

// ──────────────────────────────────────────────
// Drag session: lives from drag start to the paired drop or cancel
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A folder or component picked up from the tree, as it was at drag start.
    TreeNode(Node),
    /// An existing section of the active prompt.
    Section(NodeId),
}

impl DragSource {
    pub fn kind(&self) -> DragKind {
        match self {
            DragSource::TreeNode(Node::Folder(_)) => DragKind::Folder,
            DragSource::TreeNode(Node::Component(_)) => DragKind::Component,
            DragSource::Section(_) => DragKind::Section,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source: DragSource,
    /// Latest drag-over result; `None` when the pointer is over nothing droppable.
    pub resolution: Option<Resolution>,
}

impl DragSession {
    pub fn new(source: DragSource) -> Self {
        Self {
            source,
            resolution: None,
        }
    }

    pub fn intent(&self) -> Option<DropIntent> {
        self.resolution.map(|r| r.intent)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DropRejected {
    #[error("no drop target under the pointer")]
    NoIntent,
    #[error("drop target {0} is gone or no longer visible")]
    StaleTarget(NodeId),
    #[error("node {0} cannot be dropped onto itself")]
    SelfDrop(NodeId),
    #[error("this item cannot be dropped here")]
    WrongSurface,
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Section(#[from] SectionError),
}

// ──────────────────────────────────────────────
// Reconciliation: finalized intent -> one new tree or section list
// ──────────────────────────────────────────────

/// Apply a tree drop: a move relative to a node, or a splice into a folder's
/// child list. Rejections leave `tree` untouched.
pub fn reconcile_tree_drop(
    tree: &ComponentTree,
    collapsed: &HashSet<NodeId>,
    session: &DragSession,
) -> Result<ComponentTree, DropRejected> {
    let DragSource::TreeNode(dragged) = &session.source else {
        return Err(DropRejected::WrongSurface);
    };
    let dragged_id = dragged.id();

    match session.intent().ok_or(DropRejected::NoIntent)? {
        DropIntent::Node { target, position } => {
            if target == dragged_id {
                return Err(DropRejected::SelfDrop(target));
            }
            ensure_visible(tree, collapsed, target)?;
            Ok(tree.move_node(dragged, target, position)?)
        }
        DropIntent::ListInsert {
            list: ListTarget::Children(parent),
            index,
        } => {
            // Only components reorder through the list margin.
            if dragged.is_folder() {
                return Err(DropRejected::WrongSurface);
            }
            ensure_visible(tree, collapsed, parent)?;
            // The child list is only on screen while the folder is expanded.
            if collapsed.contains(&parent) {
                return Err(DropRejected::StaleTarget(parent));
            }
            Ok(tree.move_to_index(dragged_id, parent, index)?)
        }
        DropIntent::ListInsert {
            list: ListTarget::Sections,
            ..
        } => Err(DropRejected::WrongSurface),
    }
}

/// Apply a drop onto the prompt editor. A component creates a linked section
/// at the resolved index (the end if nothing was resolved); a section moves.
pub fn reconcile_section_drop(
    tree: &ComponentTree,
    current: &[Section],
    session: &DragSession,
    new_id: NodeId,
) -> Result<Vec<Section>, DropRejected> {
    let index = match session.intent() {
        None => None,
        Some(DropIntent::ListInsert {
            list: ListTarget::Sections,
            index,
        }) => Some(index),
        Some(_) => return Err(DropRejected::WrongSurface),
    };

    match &session.source {
        DragSource::TreeNode(Node::Component(picked)) => {
            // Use the component as it is now, not as it was at drag start.
            let component = tree
                .component(picked.id)
                .ok_or(DropRejected::StaleTarget(picked.id))?;
            let section = Section::from_component(new_id, component);
            Ok(sections::insert_at(
                current,
                index.unwrap_or(current.len()),
                section,
            ))
        }
        DragSource::TreeNode(Node::Folder(_)) => Err(DropRejected::WrongSurface),
        DragSource::Section(id) => {
            let index = index.ok_or(DropRejected::NoIntent)?;
            Ok(sections::move_to(current, *id, index)?)
        }
    }
}

/// The target must still exist and must not sit under a collapsed folder.
fn ensure_visible(
    tree: &ComponentTree,
    collapsed: &HashSet<NodeId>,
    target: NodeId,
) -> Result<(), DropRejected> {
    if !tree.contains(target) {
        return Err(DropRejected::StaleTarget(target));
    }
    let mut current = target;
    while current != ROOT_ID {
        let Some((parent, _)) = tree.parent_of(current) else {
            return Err(DropRejected::StaleTarget(target));
        };
        if collapsed.contains(&parent) {
            return Err(DropRejected::StaleTarget(target));
        }
        current = parent;
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Session lifecycle on AppState
// ──────────────────────────────────────────────

impl AppState {
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Start dragging. Any session still pending is discarded with its intent.
    pub fn begin_drag(&mut self, source: DragSource) {
        if let Some(previous) = self.drag.replace(DragSession::new(source)) {
            log::debug!("Discarding pending drag of {:?}", previous.source);
        }
    }

    /// Start dragging the tree node `id`.
    pub fn begin_tree_drag(&mut self, id: NodeId) -> Result<(), AppError> {
        let node = self
            .tree
            .find(id)
            .cloned()
            .ok_or(TreeError::NotFound(id))?;
        self.begin_drag(DragSource::TreeNode(node));
        Ok(())
    }

    /// Start dragging section `id` of the active prompt.
    pub fn begin_section_drag(&mut self, id: NodeId) -> Result<(), AppError> {
        if !self.prompts.sections().iter().any(|s| s.id == id) {
            return Err(SectionError::NotFound(id).into());
        }
        self.begin_drag(DragSource::Section(id));
        Ok(())
    }

    /// Drag-over in the tree. Recomputes the intent; never touches the tree.
    pub fn drag_over_tree(&mut self, layout: &TreeLayout, pointer: Vec2) -> Option<Resolution> {
        let resolver = self.resolver;
        let session = self.drag.as_mut()?;
        session.resolution = resolver.resolve_tree(layout, pointer, session.source.kind());
        session.resolution
    }

    /// Drag-over in the prompt editor, given the editor bounds and section blocks.
    pub fn drag_over_sections(
        &mut self,
        editor: Rect,
        blocks: &[Rect],
        pointer: Vec2,
    ) -> Option<Resolution> {
        let resolver = self.resolver;
        let session = self.drag.as_mut()?;
        session.resolution = resolver.resolve_sections(editor, blocks, pointer);
        session.resolution
    }

    /// Set the pending intent directly, for drops not driven by pointer geometry.
    pub fn set_drop_intent(&mut self, intent: DropIntent) {
        if let Some(session) = self.drag.as_mut() {
            session.resolution = Some(Resolution {
                intent,
                indicator: DropIndicator::default(),
            });
        }
    }

    /// Pointer left every drop surface: clear the pending intent, keep the session.
    pub fn drag_leave(&mut self) {
        if let Some(session) = self.drag.as_mut() {
            session.resolution = None;
        }
    }

    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            log::debug!("Drag cancelled");
        }
    }

    /// Finish the drag over the tree. The session ends either way.
    pub fn drop_on_tree(&mut self) -> Result<(), DropRejected> {
        let session = self.drag.take().ok_or(DropRejected::NoIntent)?;
        match reconcile_tree_drop(&self.tree, &self.collapsed, &session) {
            Ok(tree) => {
                self.commit(Some(tree), None);
                if let Some(intent) = session.intent() {
                    log::info!("Dropped {:?} at {:?}", session.source.kind(), intent);
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("Tree drop rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Finish the drag over the prompt editor. Returns the id of the section
    /// created by a component drop. The session ends either way.
    pub fn drop_on_sections(&mut self) -> Result<Option<NodeId>, DropRejected> {
        let session = self.drag.take().ok_or(DropRejected::NoIntent)?;
        let new_id = self.alloc_id();
        match reconcile_section_drop(&self.tree, self.prompts.sections(), &session, new_id) {
            Ok(next) => {
                self.commit(None, Some(next));
                let created = matches!(session.source, DragSource::TreeNode(_)).then_some(new_id);
                log::info!("Dropped {:?} into prompt editor", session.source.kind());
                Ok(created)
            }
            Err(e) => {
                log::warn!("Section drop rejected: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::storage::StoredState;
    use prompt_core::{Component, ComponentKind, DropPosition, Folder};
    use prompt_input::RowMetrics;

    /// Components (1)
    /// ├── FolderA (2)
    /// │   └── CompX (3)
    /// └── CompZ (6)
    fn sample_state() -> AppState {
        let root = Folder::root().with_children(vec![
            Node::Folder(Folder::new(2, "FolderA").with_children(vec![Node::Component(
                Component::new(3, "CompX", ComponentKind::Main, "x"),
            )])),
            Node::Component(Component::new(6, "CompZ", ComponentKind::Context, "z")),
        ]);
        AppState::from_stored(
            StoredState {
                tree: Some(root),
                ..StoredState::default()
            },
            Settings::default(),
        )
    }

    fn resolution(intent: DropIntent) -> Option<Resolution> {
        Some(Resolution {
            intent,
            indicator: DropIndicator::default(),
        })
    }

    fn drag_with(state: &AppState, id: NodeId, intent: DropIntent) -> DragSession {
        DragSession {
            source: DragSource::TreeNode(state.tree().find(id).unwrap().clone()),
            resolution: resolution(intent),
        }
    }

    fn child_ids(state: &AppState, folder: NodeId) -> Vec<NodeId> {
        let folder = if folder == ROOT_ID {
            state.tree().root()
        } else {
            state.tree().find(folder).unwrap().as_folder().unwrap()
        };
        folder.children.iter().map(Node::id).collect()
    }

    // ── Tree drops ────────────────────────────

    #[test]
    fn drop_moves_component_to_end_of_root() {
        let mut state = sample_state();
        state.toggle_collapse(2).unwrap();
        let session = drag_with(
            &state,
            3,
            DropIntent::Node {
                target: ROOT_ID,
                position: DropPosition::InsideBottom,
            },
        );
        state.drag = Some(session);
        state.drop_on_tree().unwrap();

        assert_eq!(child_ids(&state, ROOT_ID), [2, 6, 3]);
        assert!(child_ids(&state, 2).is_empty());
        assert!(state.drag_session().is_none());
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn folder_into_own_child_is_rejected_and_session_cleared() {
        let mut state = sample_state();
        state.toggle_collapse(2).unwrap();
        let before = state.tree().clone();
        state.drag = Some(drag_with(
            &state,
            2,
            DropIntent::Node {
                target: 3,
                position: DropPosition::Below,
            },
        ));
        let err = state.drop_on_tree().unwrap_err();
        assert!(matches!(err, DropRejected::Tree(TreeError::InvalidMove { .. })));
        assert_eq!(state.tree(), &before);
        assert_eq!(state.generation(), 0);
        assert!(state.drag_session().is_none());
    }

    #[test]
    fn self_drop_is_rejected() {
        let state = sample_state();
        let session = drag_with(
            &state,
            6,
            DropIntent::Node {
                target: 6,
                position: DropPosition::Above,
            },
        );
        assert_eq!(
            reconcile_tree_drop(state.tree(), &state.collapsed, &session),
            Err(DropRejected::SelfDrop(6))
        );
    }

    #[test]
    fn target_hidden_by_collapse_is_stale() {
        let state = sample_state();
        // FolderA (2) starts collapsed, so CompX (3) is not on screen.
        let session = drag_with(
            &state,
            6,
            DropIntent::Node {
                target: 3,
                position: DropPosition::Above,
            },
        );
        assert_eq!(
            reconcile_tree_drop(state.tree(), &state.collapsed, &session),
            Err(DropRejected::StaleTarget(3))
        );
    }

    #[test]
    fn target_deleted_since_drag_over_is_stale() {
        let mut state = sample_state();
        state.begin_tree_drag(6).unwrap();
        state.drag.as_mut().unwrap().resolution = resolution(DropIntent::Node {
            target: 2,
            position: DropPosition::Above,
        });
        state.delete_node(2).unwrap();
        assert_eq!(state.drop_on_tree(), Err(DropRejected::StaleTarget(2)));
        assert_eq!(child_ids(&state, ROOT_ID), [6]);
    }

    #[test]
    fn drop_without_intent_does_nothing() {
        let mut state = sample_state();
        state.begin_tree_drag(6).unwrap();
        state.drag_leave();
        assert_eq!(state.drop_on_tree(), Err(DropRejected::NoIntent));
        assert_eq!(state.generation(), 0);
        assert_eq!(state.drop_on_tree(), Err(DropRejected::NoIntent));
    }

    #[test]
    fn list_insert_reorders_within_expanded_folder() {
        let mut state = sample_state();
        state.begin_tree_drag(6).unwrap();
        state.drag.as_mut().unwrap().resolution = resolution(DropIntent::ListInsert {
            list: ListTarget::Children(ROOT_ID),
            index: 0,
        });
        state.drop_on_tree().unwrap();
        assert_eq!(child_ids(&state, ROOT_ID), [6, 2]);
    }

    #[test]
    fn list_insert_into_collapsed_folder_is_stale() {
        let state = sample_state();
        let session = drag_with(
            &state,
            6,
            DropIntent::ListInsert {
                list: ListTarget::Children(2),
                index: 0,
            },
        );
        assert_eq!(
            reconcile_tree_drop(state.tree(), &state.collapsed, &session),
            Err(DropRejected::StaleTarget(2))
        );
    }

    #[test]
    fn folders_cannot_use_list_insert() {
        let state = sample_state();
        let session = drag_with(
            &state,
            2,
            DropIntent::ListInsert {
                list: ListTarget::Children(ROOT_ID),
                index: 2,
            },
        );
        assert_eq!(
            reconcile_tree_drop(state.tree(), &state.collapsed, &session),
            Err(DropRejected::WrongSurface)
        );
    }

    #[test]
    fn pointer_over_folder_header_drops_inside() {
        let mut state = sample_state();
        state.toggle_collapse(2).unwrap();
        let layout = state.tree_layout(&RowMetrics::default());

        state.begin_tree_drag(6).unwrap();
        // FolderA header spans y 24..48.
        let resolved = state.drag_over_tree(&layout, Vec2::new(100.0, 30.0)).unwrap();
        assert_eq!(
            resolved.intent,
            DropIntent::Node {
                target: 2,
                position: DropPosition::InsideBottom
            }
        );
        state.drop_on_tree().unwrap();
        assert_eq!(child_ids(&state, 2), [3, 6]);
    }

    #[test]
    fn drag_over_nothing_clears_intent() {
        let mut state = sample_state();
        let layout = state.tree_layout(&RowMetrics::default());
        state.begin_tree_drag(6).unwrap();
        assert!(state.drag_over_tree(&layout, Vec2::new(100.0, 30.0)).is_some());
        assert!(state.drag_over_tree(&layout, Vec2::new(900.0, 900.0)).is_none());
        assert_eq!(state.drag_session().unwrap().resolution, None);
    }

    #[test]
    fn folder_over_root_padding_leaves_tree_unchanged() {
        let mut state = sample_state();
        let layout = state.tree_layout(&RowMetrics::default());
        let before = state.tree().clone();

        state.begin_tree_drag(2).unwrap();
        // Left of every child row, below the root header.
        assert!(state.drag_over_tree(&layout, Vec2::new(5.0, 30.0)).is_none());
        assert_eq!(state.drop_on_tree(), Err(DropRejected::NoIntent));
        assert_eq!(state.tree(), &before);
    }

    #[test]
    fn new_drag_replaces_pending_session() {
        let mut state = sample_state();
        state.begin_tree_drag(6).unwrap();
        state.drag.as_mut().unwrap().resolution = resolution(DropIntent::Node {
            target: 2,
            position: DropPosition::Above,
        });
        state.begin_tree_drag(2).unwrap();

        let session = state.drag_session().unwrap();
        assert_eq!(session.source.kind(), DragKind::Folder);
        assert_eq!(session.resolution, None);
    }

    #[test]
    fn drag_over_without_session_is_ignored() {
        let mut state = sample_state();
        let layout = state.tree_layout(&RowMetrics::default());
        assert!(state.drag_over_tree(&layout, Vec2::new(100.0, 30.0)).is_none());
        state.cancel_drag();
        assert!(state.drag_session().is_none());
    }

    // ── Prompt editor drops ───────────────────

    fn three_sections(state: &mut AppState) -> Vec<NodeId> {
        let first = state.prompts().sections()[0].id;
        let second = state.add_section_after(Some(0));
        let third = state.add_section_after(Some(1));
        vec![first, second, third]
    }

    #[test]
    fn component_dropped_at_index_two_of_three() {
        let mut state = sample_state();
        let before = three_sections(&mut state);

        state.begin_tree_drag(6).unwrap();
        state.set_drop_intent(DropIntent::ListInsert {
            list: ListTarget::Sections,
            index: 2,
        });
        let created = state.drop_on_sections().unwrap().unwrap();

        let ids: Vec<_> = state.prompts().sections().iter().map(|s| s.id).collect();
        assert_eq!(ids, [before[0], before[1], created, before[2]]);
        let section = &state.prompts().sections()[2];
        assert_eq!(section.linked_component_id, Some(6));
        assert_eq!(section.content, "z");
        assert_eq!(section.original_content.as_deref(), Some("z"));
        assert!(!section.dirty);
    }

    #[test]
    fn component_drop_without_geometry_appends() {
        let mut state = sample_state();
        three_sections(&mut state);
        state.begin_tree_drag(6).unwrap();
        let created = state.drop_on_sections().unwrap().unwrap();
        assert_eq!(state.prompts().sections().last().unwrap().id, created);
    }

    #[test]
    fn component_drop_uses_current_content() {
        let mut state = sample_state();
        state.begin_tree_drag(6).unwrap();
        state.edit_component(6, None, None, Some("zz")).unwrap();
        state.drop_on_sections().unwrap();
        assert_eq!(state.prompts().sections().last().unwrap().content, "zz");
    }

    #[test]
    fn folder_drop_on_editor_is_rejected() {
        let mut state = sample_state();
        state.begin_tree_drag(2).unwrap();
        assert_eq!(state.drop_on_sections(), Err(DropRejected::WrongSurface));
        assert_eq!(state.prompts().sections().len(), 1);
    }

    #[test]
    fn section_drag_reorders_by_geometry() {
        let mut state = sample_state();
        let ids = three_sections(&mut state);
        let editor = Rect::new(300.0, 0.0, 400.0, 300.0);
        let blocks = [
            Rect::new(300.0, 0.0, 400.0, 100.0),
            Rect::new(300.0, 100.0, 400.0, 100.0),
            Rect::new(300.0, 200.0, 400.0, 100.0),
        ];

        state.begin_section_drag(ids[0]).unwrap();
        let resolved = state
            .drag_over_sections(editor, &blocks, Vec2::new(400.0, 290.0))
            .unwrap();
        assert_eq!(
            resolved.intent,
            DropIntent::ListInsert {
                list: ListTarget::Sections,
                index: 3
            }
        );
        assert_eq!(state.drop_on_sections().unwrap(), None);
        let order: Vec<_> = state.prompts().sections().iter().map(|s| s.id).collect();
        assert_eq!(order, [ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn tree_intent_on_editor_is_wrong_surface() {
        let state = sample_state();
        let session = drag_with(
            &state,
            6,
            DropIntent::Node {
                target: 2,
                position: DropPosition::Above,
            },
        );
        assert_eq!(
            reconcile_section_drop(state.tree(), state.prompts().sections(), &session, 99),
            Err(DropRejected::WrongSurface)
        );
    }
}
