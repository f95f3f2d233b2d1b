// Component tree store
// Owns no state of its own: every operation takes the current tree and returns
// a new one, leaving the input untouched.

mod node;

use prompt_core::{Component, DropPosition, Folder, Node, NodeId, ROOT_ID};
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} not found")]
    NotFound(NodeId),
    #[error("cannot move node {dragged} onto {target}: target is the node itself or one of its descendants")]
    InvalidMove { dragged: NodeId, target: NodeId },
    #[error("node {target} cannot receive a drop at this position")]
    InvalidTarget { target: NodeId },
}

// ──────────────────────────────────────────────
// ComponentTree
// ──────────────────────────────────────────────

/// The folder/component tree, rooted at the distinguished `ROOT_ID` folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentTree {
    root: Folder,
}

impl ComponentTree {
    /// A tree holding only the empty root folder.
    pub fn new() -> Self {
        Self { root: Folder::root() }
    }

    /// Wrap a loaded root folder. The root id is forced to `ROOT_ID`.
    pub fn from_root(mut root: Folder) -> Self {
        if root.id != ROOT_ID {
            log::warn!("Loaded root folder had id {}, resetting to {}", root.id, ROOT_ID);
            root.id = ROOT_ID;
        }
        Self { root }
    }

    pub fn root(&self) -> &Folder {
        &self.root
    }

    pub fn into_root(self) -> Folder {
        self.root
    }

    /// Find a non-root node by id.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        node::find(&self.root.children, id)
    }

    pub fn component(&self, id: NodeId) -> Option<&Component> {
        self.find(id).and_then(Node::as_component)
    }

    /// True if `id` is the root or any node below it.
    pub fn contains(&self, id: NodeId) -> bool {
        id == self.root.id || self.find(id).is_some()
    }

    /// True if `id` names the root or a folder below it.
    pub fn is_folder(&self, id: NodeId) -> bool {
        id == self.root.id || self.find(id).is_some_and(Node::is_folder)
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        1 + self.root.children.iter().map(Node::subtree_len).sum::<usize>()
    }

    /// Every id in the tree, depth-first, root first.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.root.id];
        for child in &self.root.children {
            child.collect_ids(&mut ids);
        }
        ids
    }

    pub fn max_id(&self) -> NodeId {
        self.ids().into_iter().max().unwrap_or(ROOT_ID)
    }

    /// The folder whose child list holds `id`, and the index within it.
    pub fn parent_of(&self, id: NodeId) -> Option<(NodeId, usize)> {
        node::parent_of(&self.root, id)
    }

    /// Insert `node` above/below `target`, or as first/last child of a target folder.
    pub fn insert(
        &self,
        target: NodeId,
        node: Node,
        position: DropPosition,
    ) -> Result<Self, TreeError> {
        let invalid = TreeError::InvalidTarget { target };

        if target == self.root.id {
            // The root has no siblings.
            if !position.targets_children() {
                return Err(invalid);
            }
            let mut next = self.clone();
            node::push_child(&mut next.root, node, position);
            return Ok(next);
        }

        match self.find(target) {
            None => return Err(invalid),
            Some(Node::Component(_)) if position.targets_children() => return Err(invalid),
            Some(_) => {}
        }

        let mut next = self.clone();
        node::attach(&mut next.root.children, target, node, position).map_err(|_| invalid)?;
        Ok(next)
    }

    /// Splice `node` into the child list of `parent` at `index` (clamped to the list length).
    pub fn insert_at(&self, parent: NodeId, index: usize, node: Node) -> Result<Self, TreeError> {
        let mut next = self.clone();
        let folder = next
            .folder_mut(parent)
            .ok_or(TreeError::InvalidTarget { target: parent })?;
        let index = index.min(folder.children.len());
        folder.children.insert(index, node);
        Ok(next)
    }

    /// Detach the node with `id`, returning the new tree and the detached subtree.
    pub fn remove(&self, id: NodeId) -> Result<(Self, Node), TreeError> {
        if id == self.root.id {
            return Err(TreeError::InvalidTarget { target: id });
        }
        let mut next = self.clone();
        let removed = node::detach(&mut next.root.children, id).ok_or(TreeError::NotFound(id))?;
        Ok((next, removed))
    }

    /// Move `dragged` to `position` relative to `target`: remove, then insert.
    /// Rejects self-moves and moving a folder into its own subtree.
    pub fn move_node(
        &self,
        dragged: &Node,
        target: NodeId,
        position: DropPosition,
    ) -> Result<Self, TreeError> {
        let dragged_id = dragged.id();
        self.check_move(dragged_id, target)?;

        // Validate the target before detaching so a bad drop leaves nothing half-done.
        if !self.contains(target)
            || (position.targets_children() && !self.is_folder(target))
            || (target == self.root.id && !position.targets_children())
        {
            return Err(TreeError::InvalidTarget { target });
        }

        let (detached, node) = self.remove(dragged_id)?;
        detached.insert(target, node, position)
    }

    /// Move `dragged` into the child list of `parent` at `index`, where `index`
    /// was computed against the list as it looked before the move.
    pub fn move_to_index(
        &self,
        dragged: NodeId,
        parent: NodeId,
        index: usize,
    ) -> Result<Self, TreeError> {
        self.check_move(dragged, parent)?;
        if !self.is_folder(parent) {
            return Err(TreeError::InvalidTarget { target: parent });
        }

        let index = match self.parent_of(dragged) {
            Some((old_parent, old_index)) if old_parent == parent && old_index < index => index - 1,
            _ => index,
        };
        let (detached, node) = self.remove(dragged)?;
        detached.insert_at(parent, index, node)
    }

    /// Replace the node with `id` by `updater(node)`. Unknown ids leave the tree as is.
    pub fn update_node(&self, id: NodeId, updater: impl FnOnce(Node) -> Node) -> Self {
        let mut next = self.clone();
        if id == next.root.id {
            if let Node::Folder(mut folder) = updater(Node::Folder(next.root.clone())) {
                folder.id = ROOT_ID;
                next.root = folder;
            }
            return next;
        }
        if let Some(slot) = node::find_mut(&mut next.root.children, id) {
            *slot = updater(slot.clone());
        }
        next
    }

    /// Remove the node with `id` and drop it. The root can never be deleted.
    pub fn delete_node(&self, id: NodeId) -> Result<Self, TreeError> {
        self.remove(id).map(|(next, _)| next)
    }

    /// Append nodes as the last children of the root, keeping their order.
    pub fn append_to_root(&self, nodes: Vec<Node>) -> Self {
        let mut next = self.clone();
        next.root.children.extend(nodes);
        next
    }

    fn check_move(&self, dragged: NodeId, target: NodeId) -> Result<(), TreeError> {
        let invalid = TreeError::InvalidMove { dragged, target };
        if dragged == target || dragged == self.root.id {
            return Err(invalid);
        }
        match self.find(dragged) {
            None => Err(TreeError::NotFound(dragged)),
            Some(Node::Folder(folder)) if find_descendant(folder, target) => Err(invalid),
            Some(_) => Ok(()),
        }
    }

    fn folder_mut(&mut self, id: NodeId) -> Option<&mut Folder> {
        if id == self.root.id {
            return Some(&mut self.root);
        }
        node::find_mut(&mut self.root.children, id).and_then(Node::as_folder_mut)
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `candidate` is anywhere inside `folder`'s subtree (the folder itself excluded).
pub fn find_descendant(folder: &Folder, candidate: NodeId) -> bool {
    node::contains_descendant(folder, candidate)
}
