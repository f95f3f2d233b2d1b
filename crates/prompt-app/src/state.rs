// Application state: the component tree, the prompts, and the interaction
// state around them (collapsed folders, the drag session).
//
// Each committed change swaps in a new tree and/or section list in a single
// step and bumps `generation`; a rejected change leaves everything as it was.

use std::collections::HashSet;
use std::path::Path;

use prompt_core::{
    Component, ComponentKind, DropPosition, Folder, Node, NodeId, Section, ROOT_ID,
};
use prompt_editor::{compile_prompt, max_prompt_id, sections, PromptBook, SectionError};
use prompt_input::{stack_tree, DragGeometryResolver, RowMetrics, TreeLayout};
use prompt_tree::{ComponentTree, TreeError};

use crate::clipboard::ClipboardError;
use crate::drag_drop::{DragSession, DropRejected};
use crate::settings::Settings;
use crate::storage::{PersistenceError, StoredState};
use crate::transfer::{self, TransferError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Section(#[from] SectionError),
    #[error("drop rejected: {0}")]
    Drop(#[from] DropRejected),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("name must not be blank")]
    BlankName,
    #[error("node {0} is not a component")]
    NotAComponent(NodeId),
    #[error("node {0} is not a folder")]
    NotAFolder(NodeId),
    #[error("{0}")]
    Setting(String),
    #[error("`{0}` only works inside `shell`: collapse state is not saved")]
    ShellOnly(&'static str),
}

pub struct AppState {
    pub(crate) tree: ComponentTree,
    pub(crate) prompts: PromptBook,
    pub(crate) settings: Settings,
    pub(crate) collapsed: HashSet<NodeId>,
    pub(crate) drag: Option<DragSession>,
    pub(crate) resolver: DragGeometryResolver,
    next_id: NodeId,
    generation: u64,
}

impl AppState {
    /// Rebuild from a stored document, filling in whatever is missing.
    pub fn from_stored(stored: StoredState, settings: Settings) -> Self {
        let tree = stored
            .tree
            .map(ComponentTree::from_root)
            .unwrap_or_default();
        let prompts = stored.prompts.unwrap_or_default();

        let mut next_id = tree.max_id().max(max_prompt_id(&prompts)) + 1;

        // The root owns `ROOT_ID`; a child carrying it, or any repeated id,
        // gets a fresh one so ids stay unique across the tree.
        let mut root = tree.into_root();
        let mut used = HashSet::from([ROOT_ID]);
        let rekeyed = transfer::rekey(&mut root.children, &mut used, &mut || {
            let id = next_id;
            next_id += 1;
            id
        });
        if rekeyed > 0 {
            log::warn!("Re-keyed {rekeyed} nodes with duplicate ids in stored tree");
        }
        let tree = ComponentTree::from_root(root);
        let prompts = PromptBook::from_parts(prompts, stored.active_prompt_id, || {
            let id = next_id;
            next_id += 1;
            id
        });

        let mut collapsed = HashSet::new();
        nested_folders(tree.root(), &mut collapsed);

        log::info!(
            "Loaded {} nodes and {} prompts",
            tree.node_count(),
            prompts.prompts().len()
        );
        Self {
            tree,
            prompts,
            settings,
            collapsed,
            drag: None,
            resolver: DragGeometryResolver::new(),
            next_id,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> StoredState {
        StoredState {
            tree: Some(self.tree.root().clone()),
            prompts: Some(self.prompts.prompts().to_vec()),
            active_prompt_id: Some(self.prompts.active_id()),
        }
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    pub fn prompts(&self) -> &PromptBook {
        &self.prompts
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Bumped once per committed change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn collapsed(&self) -> &HashSet<NodeId> {
        &self.collapsed
    }

    pub fn is_collapsed(&self, id: NodeId) -> bool {
        self.collapsed.contains(&id)
    }

    pub(crate) fn alloc_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Publish a new tree and/or active section list as one replacement.
    pub(crate) fn commit(&mut self, tree: Option<ComponentTree>, sections: Option<Vec<Section>>) {
        if let Some(tree) = tree {
            self.tree = tree;
        }
        if let Some(sections) = sections {
            self.prompts.set_sections(sections);
        }
        self.generation += 1;
    }

    // ──────────────────────────────────────────────
    // Tree authoring
    // ──────────────────────────────────────────────

    /// Append a new, collapsed folder to `parent`.
    pub fn add_folder(&mut self, parent: NodeId, name: &str) -> Result<NodeId, AppError> {
        let name = non_blank(name)?;
        let id = self.alloc_id();
        let folder = Node::Folder(Folder::new(id, name));
        let tree = self.tree.insert(parent, folder, DropPosition::InsideBottom)?;
        self.collapsed.insert(id);
        self.commit(Some(tree), None);
        log::info!("Added folder {id} to {parent}");
        Ok(id)
    }

    pub fn add_component(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: ComponentKind,
        content: &str,
    ) -> Result<NodeId, AppError> {
        let name = non_blank(name)?;
        let id = self.alloc_id();
        let component = Node::Component(Component::new(id, name, kind, content));
        let tree = self
            .tree
            .insert(parent, component, DropPosition::InsideBottom)?;
        self.commit(Some(tree), None);
        log::info!("Added component {id} to {parent}");
        Ok(id)
    }

    /// Change a component's fields. Sections linked to it without unsaved
    /// edits pick up the new content.
    pub fn edit_component(
        &mut self,
        id: NodeId,
        name: Option<&str>,
        kind: Option<ComponentKind>,
        content: Option<&str>,
    ) -> Result<(), AppError> {
        let mut updated = match self.tree.find(id) {
            None => return Err(TreeError::NotFound(id).into()),
            Some(Node::Folder(_)) => return Err(AppError::NotAComponent(id)),
            Some(Node::Component(c)) => c.clone(),
        };
        if let Some(name) = name {
            updated.name = non_blank(name)?;
        }
        if let Some(kind) = kind {
            updated.kind = kind;
        }
        if let Some(content) = content {
            updated.content = content.to_string();
        }

        let content = updated.content.clone();
        let tree = self.tree.update_node(id, |_| Node::Component(updated));
        self.prompts
            .map_all_sections(|s| sections::sync_linked(s, id, &content));
        self.commit(Some(tree), None);
        log::info!("Edited component {id}");
        Ok(())
    }

    pub fn rename_folder(&mut self, id: NodeId, name: &str) -> Result<(), AppError> {
        if id == ROOT_ID {
            return Err(TreeError::InvalidTarget { target: id }.into());
        }
        match self.tree.find(id) {
            None => return Err(TreeError::NotFound(id).into()),
            Some(Node::Component(_)) => return Err(AppError::NotAFolder(id)),
            Some(Node::Folder(_)) => {}
        }
        let name = non_blank(name)?;
        let tree = self.tree.update_node(id, |mut node| {
            node.set_name(name);
            node
        });
        self.commit(Some(tree), None);
        log::info!("Renamed folder {id}");
        Ok(())
    }

    /// Delete a component, or a folder with everything under it.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), AppError> {
        let tree = self.tree.delete_node(id)?;
        self.collapsed.retain(|folder| tree.contains(*folder));
        self.commit(Some(tree), None);
        log::info!("Deleted node {id}");
        Ok(())
    }

    /// Flip a folder between collapsed and expanded. Returns the new collapsed state.
    pub fn toggle_collapse(&mut self, id: NodeId) -> Result<bool, AppError> {
        if !self.tree.is_folder(id) {
            return Err(AppError::NotAFolder(id));
        }
        if self.collapsed.remove(&id) {
            Ok(false)
        } else {
            self.collapsed.insert(id);
            Ok(true)
        }
    }

    pub fn move_node(
        &mut self,
        id: NodeId,
        target: NodeId,
        position: DropPosition,
    ) -> Result<(), AppError> {
        let dragged = self
            .tree
            .find(id)
            .cloned()
            .ok_or(TreeError::NotFound(id))?;
        let tree = self.tree.move_node(&dragged, target, position)?;
        self.commit(Some(tree), None);
        log::info!("Moved node {id} {position} {target}");
        Ok(())
    }

    /// Row and list rectangles for the tree as currently expanded.
    pub fn tree_layout(&self, metrics: &RowMetrics) -> TreeLayout {
        stack_tree(self.tree.root(), &self.collapsed, metrics)
    }

    // ──────────────────────────────────────────────
    // Import / export
    // ──────────────────────────────────────────────

    /// Append imported nodes under the root, re-keying ids already in use.
    /// Returns the number of top-level nodes added.
    pub fn import_nodes(&mut self, mut nodes: Vec<Node>) -> usize {
        let mut used: HashSet<NodeId> = self.tree.ids().into_iter().collect();
        for prompt in self.prompts.prompts() {
            used.insert(prompt.id);
            used.extend(prompt.sections.iter().map(|s| s.id));
        }

        let mut next = self.next_id;
        let rekeyed = transfer::rekey(&mut nodes, &mut used, &mut || {
            let id = next;
            next += 1;
            id
        });
        if rekeyed > 0 {
            log::info!("Re-keyed {rekeyed} imported nodes");
        }
        for node in &nodes {
            if let Node::Folder(folder) = node {
                self.collapsed.insert(folder.id);
                nested_folders(folder, &mut self.collapsed);
            }
        }

        let count = nodes.len();
        let tree = self.tree.append_to_root(nodes);
        self.next_id = next.max(tree.max_id() + 1);
        self.commit(Some(tree), None);
        log::info!("Imported {count} nodes");
        count
    }

    pub fn import_file(&mut self, path: &Path) -> Result<usize, AppError> {
        let nodes = transfer::import_file(path)?;
        Ok(self.import_nodes(nodes))
    }

    pub fn export_file(&self, path: &Path) -> Result<(), AppError> {
        transfer::export_file(self.tree.root(), path)?;
        log::info!("Exported components to {}", path.display());
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Prompts
    // ──────────────────────────────────────────────

    pub fn new_prompt(&mut self) -> NodeId {
        let prompt_id = self.alloc_id();
        let section_id = self.alloc_id();
        self.prompts.create(prompt_id, section_id);
        self.commit(None, None);
        log::info!("Created prompt {prompt_id}");
        prompt_id
    }

    pub fn switch_prompt(&mut self, id: NodeId) -> Result<(), AppError> {
        self.prompts.switch(id)?;
        self.commit(None, None);
        Ok(())
    }

    pub fn compiled_prompt(&self) -> String {
        compile_prompt(self.prompts.sections(), self.settings.guide())
    }

    // ──────────────────────────────────────────────
    // Sections of the active prompt
    // ──────────────────────────────────────────────

    fn edit_sections(
        &mut self,
        f: impl FnOnce(&[Section]) -> Result<Vec<Section>, SectionError>,
    ) -> Result<(), AppError> {
        let next = f(self.prompts.sections())?;
        self.commit(None, Some(next));
        Ok(())
    }

    /// Insert a blank section after index `after` (at the end for `None`),
    /// with its header open for editing.
    pub fn add_section_after(&mut self, after: Option<usize>) -> NodeId {
        let id = self.alloc_id();
        let section = Section::blank(id, self.settings.default_section_type);
        let index = after.map_or(self.prompts.sections().len(), |i| i + 1);
        let next = sections::insert_at(self.prompts.sections(), index, section);
        self.commit(None, Some(next));
        id
    }

    pub fn remove_section(&mut self, id: NodeId) -> Result<(), AppError> {
        self.edit_sections(|s| sections::remove_by_id(s, id))
    }

    pub fn update_section_content(&mut self, id: NodeId, content: &str) -> Result<(), AppError> {
        self.edit_sections(|s| sections::update_content(s, id, content))
    }

    pub fn toggle_section(&mut self, id: NodeId) -> Result<(), AppError> {
        self.edit_sections(|s| sections::toggle_open(s, id))
    }

    pub fn move_section(&mut self, id: NodeId, index: usize) -> Result<(), AppError> {
        self.edit_sections(|s| sections::move_to(s, id, index))
    }

    pub fn start_section_header_edit(&mut self, id: NodeId) -> Result<(), AppError> {
        self.edit_sections(|s| sections::start_header_edit(s, id))
    }

    pub fn edit_section_header_draft(
        &mut self,
        id: NodeId,
        name: Option<String>,
        kind: Option<ComponentKind>,
    ) -> Result<(), AppError> {
        self.edit_sections(|s| sections::edit_header_draft(s, id, name, kind))
    }

    pub fn cancel_section_header_edit(&mut self, id: NodeId) -> Result<(), AppError> {
        self.edit_sections(|s| sections::cancel_header_edit(s, id))
    }

    pub fn commit_section_header(
        &mut self,
        id: NodeId,
        name: &str,
        kind: ComponentKind,
    ) -> Result<(), AppError> {
        self.edit_sections(|s| sections::commit_header(s, id, name, kind))
    }

    pub fn commit_section_header_draft(&mut self, id: NodeId) -> Result<(), AppError> {
        self.edit_sections(|s| sections::commit_header_draft(s, id))
    }

    /// Enter in section `id`. Returns the id of the section created, if any.
    pub fn press_enter(
        &mut self,
        id: NodeId,
        cursor: usize,
        shift: bool,
    ) -> Result<Option<NodeId>, AppError> {
        let new_id = self.next_id;
        let (next, created) = sections::press_enter(
            self.prompts.sections(),
            id,
            cursor,
            shift,
            new_id,
            self.settings.default_section_type,
        )?;
        if created.is_some() {
            self.next_id += 1;
        }
        self.commit(None, Some(next));
        Ok(created)
    }

    /// Write a linked section's content back into its component and mark it
    /// clean, in one step.
    pub fn save_section(&mut self, id: NodeId) -> Result<(), AppError> {
        let section = self
            .prompts
            .sections()
            .iter()
            .find(|s| s.id == id)
            .ok_or(SectionError::NotFound(id))?;
        let component_id = section
            .linked_component_id
            .ok_or(SectionError::NotLinked(id))?;
        let content = section.content.clone();
        let component = self
            .tree
            .component(component_id)
            .ok_or(TreeError::NotFound(component_id))?;

        let updated = Component {
            content: content.clone(),
            ..component.clone()
        };
        let tree = self
            .tree
            .update_node(component_id, |_| Node::Component(updated));
        let saved = sections::save_linked_edit(self.prompts.sections(), id)?;

        self.prompts.set_sections(saved);
        self.prompts
            .map_all_sections(|s| sections::sync_linked(s, component_id, &content));
        self.commit(Some(tree), None);
        log::info!("Saved section {id} into component {component_id}");
        Ok(())
    }
}

fn non_blank(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BlankName);
    }
    Ok(name.to_string())
}

/// Every folder below `folder`, at any depth.
fn nested_folders(folder: &Folder, out: &mut HashSet<NodeId>) {
    for child in &folder.children {
        if let Node::Folder(sub) = child {
            out.insert(sub.id);
            nested_folders(sub, out);
        }
    }
}
