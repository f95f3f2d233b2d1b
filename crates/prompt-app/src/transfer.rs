// JSON import/export of the component tree.
//
// Import accepts either a bare array of nodes or a single folder object whose
// children are taken. Export writes the root folder as a `{"type": "folder"}` node.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use prompt_core::{Folder, Node, NodeId};

/// File name offered when exporting.
pub const DEFAULT_EXPORT_FILE: &str = "components.json";

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("malformed import: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("import holds no nodes")]
    Empty,
    #[error("expected a folder or a list of nodes, found component {0}")]
    NotFolder(NodeId),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse an import document into the nodes to append under the root.
pub fn parse_import(text: &str) -> Result<Vec<Node>, TransferError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let nodes = if value.is_array() {
        serde_json::from_value::<Vec<Node>>(value)?
    } else {
        match serde_json::from_value::<Node>(value)? {
            Node::Folder(folder) => folder.children,
            Node::Component(c) => return Err(TransferError::NotFolder(c.id)),
        }
    };
    if nodes.is_empty() {
        return Err(TransferError::Empty);
    }
    Ok(nodes)
}

/// Give every node whose id is already in `used` (or repeated within `nodes`)
/// a fresh id from `alloc`. Returns how many ids changed.
pub fn rekey(
    nodes: &mut [Node],
    used: &mut HashSet<NodeId>,
    alloc: &mut impl FnMut() -> NodeId,
) -> usize {
    let mut changed = 0;
    for node in nodes {
        if !used.insert(node.id()) {
            let fresh = alloc();
            log::debug!("Id {} already in use, using {}", node.id(), fresh);
            match &mut *node {
                Node::Folder(f) => f.id = fresh,
                Node::Component(c) => c.id = fresh,
            }
            used.insert(fresh);
            changed += 1;
        }
        if let Node::Folder(f) = &mut *node {
            changed += rekey(&mut f.children, used, alloc);
        }
    }
    changed
}

pub fn export_json(root: &Folder) -> Result<String, TransferError> {
    Ok(serde_json::to_string_pretty(&Node::Folder(root.clone()))?)
}

pub fn import_file(path: &Path) -> Result<Vec<Node>, TransferError> {
    let text = std::fs::read_to_string(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_import(&text)
}

pub fn export_file(root: &Folder, path: &Path) -> Result<(), TransferError> {
    let json = export_json(root)?;
    std::fs::write(path, json).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })
}
