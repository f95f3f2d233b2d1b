use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Geometry
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Vertical midpoint, used for above/below and list-index decisions.
    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ──────────────────────────────────────────────
// Identity
// ──────────────────────────────────────────────

pub type NodeId = u64;

/// The distinguished root folder. Never deletable, never movable.
pub const ROOT_ID: NodeId = 1;

pub const ROOT_NAME: &str = "Components";

// ──────────────────────────────────────────────
// Component kinds
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Context,
    #[default]
    Main,
    Instruction,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Main => "main",
            Self::Instruction => "instruction",
        }
    }

    /// Heading label used when a prompt is compiled with markdown headings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Context => "Context",
            Self::Main => "Main",
            Self::Instruction => "Instruction",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "context" => Ok(Self::Context),
            "main" => Ok(Self::Main),
            "instruction" => Ok(Self::Instruction),
            other => Err(format!("unknown component type: {other}")),
        }
    }
}

// ──────────────────────────────────────────────
// Tree nodes
// ──────────────────────────────────────────────

/// A folder or a component. Serialized with a `type` discriminator so that
/// exported files read `{"type": "folder", ...}` / `{"type": "component", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Folder(Folder),
    Component(Component),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "componentType", default)]
    pub kind: ComponentKind,
}

impl Folder {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// The empty root folder a fresh workspace starts with.
    pub fn root() -> Self {
        Self::new(ROOT_ID, ROOT_NAME)
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

impl Component {
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        kind: ComponentKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            content: content.into(),
            kind,
        }
    }
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Folder(f) => f.id,
            Node::Component(c) => c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Folder(f) => &f.name,
            Node::Component(c) => &c.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Node::Folder(f) => f.name = name.into(),
            Node::Component(c) => c.name = name.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Node::Folder(f) => Some(f),
            Node::Component(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Node::Folder(f) => Some(f),
            Node::Component(_) => None,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Node::Component(c) => Some(c),
            Node::Folder(_) => None,
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        match self {
            Node::Folder(f) => 1 + f.children.iter().map(Node::subtree_len).sum::<usize>(),
            Node::Component(_) => 1,
        }
    }

    /// Collect every id in this subtree, depth-first in sibling order.
    pub fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id());
        if let Node::Folder(f) = self {
            for child in &f.children {
                child.collect_ids(out);
            }
        }
    }
}

// ──────────────────────────────────────────────
// Prompts and sections
// ──────────────────────────────────────────────

/// Transient header-edit buffer. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDraft {
    pub name: String,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_component_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(default = "default_open")]
    pub open: bool,
    #[serde(default)]
    pub dirty: bool,
    #[serde(skip)]
    pub header_draft: Option<HeaderDraft>,
}

fn default_open() -> bool {
    true
}

impl Section {
    /// A free-text section with a name and no linked component.
    pub fn named(id: NodeId, name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id,
            name: name.into(),
            content: String::new(),
            kind,
            linked_component_id: None,
            original_content: None,
            open: true,
            dirty: false,
            header_draft: None,
        }
    }

    /// A freshly added, unnamed section whose header starts in edit mode.
    pub fn blank(id: NodeId, kind: ComponentKind) -> Self {
        Self {
            header_draft: Some(HeaderDraft {
                name: String::new(),
                kind,
            }),
            ..Self::named(id, "", kind)
        }
    }

    /// A section linked to `component`, mirroring its current content.
    pub fn from_component(id: NodeId, component: &Component) -> Self {
        Self {
            content: component.content.clone(),
            linked_component_id: Some(component.id),
            original_content: Some(component.content.clone()),
            ..Self::named(id, component.name.clone(), component.kind)
        }
    }

    pub fn is_linked(&self) -> bool {
        self.linked_component_id.is_some()
    }

    /// Whether the content has diverged from the linked component's last-saved content.
    pub fn computed_dirty(&self) -> bool {
        self.linked_component_id.is_some()
            && self.original_content.as_deref() != Some(self.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: NodeId,
    pub num: u32,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

// ──────────────────────────────────────────────
// Drag and drop
// ──────────────────────────────────────────────

/// Where a dragged node lands relative to a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropPosition {
    Above,
    Below,
    /// First child of the target folder.
    Inside,
    /// Last child of the target folder.
    InsideBottom,
}

impl DropPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::Inside => "inside",
            Self::InsideBottom => "inside-bottom",
        }
    }

    /// True for positions that require a folder target.
    pub fn targets_children(&self) -> bool {
        matches!(self, Self::Inside | Self::InsideBottom)
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DropPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            "inside" => Ok(Self::Inside),
            "inside-bottom" => Ok(Self::InsideBottom),
            other => Err(format!("unknown drop position: {other}")),
        }
    }
}

/// An ordered list that can receive a `list-insert` drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    /// The direct children of a folder.
    Children(NodeId),
    /// The active prompt's sections.
    Sections,
}

/// Symbolic result of hit-testing one drag-over event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIntent {
    Node {
        target: NodeId,
        position: DropPosition,
    },
    ListInsert {
        list: ListTarget,
        index: usize,
    },
}

/// Where to draw the drop indicator line. Display hint only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DropIndicator {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}
