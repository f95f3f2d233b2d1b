use prompt_core::{DropPosition, Folder, Node, NodeId};

// ──────────────────────────────────────────────
// Recursive walks over a folder's child list
// ──────────────────────────────────────────────
//
// All walks are depth-first and visit siblings in order. A walk stops at the
// first match, so only the path from the list to the matched node is touched.

/// Find a node by id anywhere below `nodes`.
pub(crate) fn find(nodes: &[Node], id: NodeId) -> Option<&Node> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Node::Folder(folder) = node {
            if let Some(found) = find(&folder.children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Mutable variant of [`find`].
pub(crate) fn find_mut(nodes: &mut [Node], id: NodeId) -> Option<&mut Node> {
    for node in nodes.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Node::Folder(folder) = node {
            if let Some(found) = find_mut(&mut folder.children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Locate the folder whose child list holds `id`. Returns the folder id and
/// the child index.
pub(crate) fn parent_of(folder: &Folder, id: NodeId) -> Option<(NodeId, usize)> {
    for (index, child) in folder.children.iter().enumerate() {
        if child.id() == id {
            return Some((folder.id, index));
        }
        if let Node::Folder(sub) = child {
            if let Some(found) = parent_of(sub, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Remove the node with `id` from whichever child list holds it.
/// A folder is detached together with its whole subtree.
pub(crate) fn detach(nodes: &mut Vec<Node>, id: NodeId) -> Option<Node> {
    if let Some(index) = nodes.iter().position(|n| n.id() == id) {
        return Some(nodes.remove(index));
    }
    for node in nodes.iter_mut() {
        if let Node::Folder(folder) = node {
            if let Some(removed) = detach(&mut folder.children, id) {
                return Some(removed);
            }
        }
    }
    None
}

/// Insert `node` relative to `target`. Returns the node back when the target
/// is not in this list (or cannot take children for `Inside*` positions).
pub(crate) fn attach(
    nodes: &mut Vec<Node>,
    target: NodeId,
    node: Node,
    position: DropPosition,
) -> Result<(), Node> {
    if let Some(index) = nodes.iter().position(|n| n.id() == target) {
        return match position {
            DropPosition::Above => {
                nodes.insert(index, node);
                Ok(())
            }
            DropPosition::Below => {
                nodes.insert(index + 1, node);
                Ok(())
            }
            DropPosition::Inside | DropPosition::InsideBottom => match &mut nodes[index] {
                Node::Folder(folder) => {
                    push_child(folder, node, position);
                    Ok(())
                }
                Node::Component(_) => Err(node),
            },
        };
    }

    let mut node = node;
    for candidate in nodes.iter_mut() {
        if let Node::Folder(folder) = candidate {
            match attach(&mut folder.children, target, node, position) {
                Ok(()) => return Ok(()),
                Err(back) => node = back,
            }
        }
    }
    Err(node)
}

/// Put `node` first (`Inside`) or last (`InsideBottom`) in `folder`.
pub(crate) fn push_child(folder: &mut Folder, node: Node, position: DropPosition) {
    if position == DropPosition::Inside {
        folder.children.insert(0, node);
    } else {
        folder.children.push(node);
    }
}

/// True if `candidate` sits anywhere below `folder`.
pub(crate) fn contains_descendant(folder: &Folder, candidate: NodeId) -> bool {
    folder.children.iter().any(|child| {
        child.id() == candidate
            || matches!(child, Node::Folder(sub) if contains_descendant(sub, candidate))
    })
}
