// Section list store: pure transforms over a prompt's ordered sections.
//
// Every operation returns a new list and leaves the input untouched. The
// `dirty` flag of a touched section is recomputed on the way out, so it always
// equals `linked && content != original_content`.

use prompt_core::{ComponentKind, HeaderDraft, NodeId, Section};

use crate::input::{enter_action, EnterAction};
use crate::SectionError;

/// Insert `section` at `index`, clamped to `[0, len]`.
pub fn insert_at(sections: &[Section], index: usize, section: Section) -> Vec<Section> {
    let mut next = sections.to_vec();
    let index = index.min(next.len());
    next.insert(index, section);
    next
}

pub fn remove_by_id(sections: &[Section], id: NodeId) -> Result<Vec<Section>, SectionError> {
    let index = position(sections, id)?;
    let mut next = sections.to_vec();
    next.remove(index);
    Ok(next)
}

/// Move section `id` to `index`, where `index` refers to the list before the move.
pub fn move_to(sections: &[Section], id: NodeId, index: usize) -> Result<Vec<Section>, SectionError> {
    let from = position(sections, id)?;
    let mut next = sections.to_vec();
    let section = next.remove(from);
    let index = if from < index { index - 1 } else { index };
    next.insert(index.min(next.len()), section);
    Ok(next)
}

pub fn update_content(
    sections: &[Section],
    id: NodeId,
    content: impl Into<String>,
) -> Result<Vec<Section>, SectionError> {
    let content = content.into();
    update(sections, id, |s| s.content = content)
}

pub fn toggle_open(sections: &[Section], id: NodeId) -> Result<Vec<Section>, SectionError> {
    update(sections, id, |s| s.open = !s.open)
}

/// Open the header editor, seeding the draft from the current name and type.
pub fn start_header_edit(sections: &[Section], id: NodeId) -> Result<Vec<Section>, SectionError> {
    update(sections, id, |s| {
        s.header_draft = Some(HeaderDraft {
            name: s.name.clone(),
            kind: s.kind,
        })
    })
}

/// Change the pending header draft. Starts a draft if none is open.
pub fn edit_header_draft(
    sections: &[Section],
    id: NodeId,
    name: Option<String>,
    kind: Option<ComponentKind>,
) -> Result<Vec<Section>, SectionError> {
    update(sections, id, |s| {
        let draft = s.header_draft.get_or_insert_with(|| HeaderDraft {
            name: s.name.clone(),
            kind: s.kind,
        });
        if let Some(name) = name {
            draft.name = name;
        }
        if let Some(kind) = kind {
            draft.kind = kind;
        }
    })
}

pub fn cancel_header_edit(sections: &[Section], id: NodeId) -> Result<Vec<Section>, SectionError> {
    update(sections, id, |s| s.header_draft = None)
}

/// Set name and type and close the header editor.
pub fn commit_header(
    sections: &[Section],
    id: NodeId,
    name: impl Into<String>,
    kind: ComponentKind,
) -> Result<Vec<Section>, SectionError> {
    let name = name.into();
    update(sections, id, |s| {
        s.name = name;
        s.kind = kind;
        s.header_draft = None;
    })
}

/// Commit whatever the open draft holds; without a draft the header is unchanged.
pub fn commit_header_draft(sections: &[Section], id: NodeId) -> Result<Vec<Section>, SectionError> {
    update(sections, id, |s| {
        if let Some(draft) = s.header_draft.take() {
            s.name = draft.name;
            s.kind = draft.kind;
        }
    })
}

/// Accept the current content as the linked component's content.
/// Writing it back into the tree is the caller's job.
pub fn save_linked_edit(sections: &[Section], id: NodeId) -> Result<Vec<Section>, SectionError> {
    let index = position(sections, id)?;
    if !sections[index].is_linked() {
        return Err(SectionError::NotLinked(id));
    }
    update(sections, id, |s| s.original_content = Some(s.content.clone()))
}

/// Replace the content of every section linked to `component` that has no
/// unsaved edits, so clean sections keep mirroring the component.
pub fn sync_linked(sections: &[Section], component: NodeId, content: &str) -> Vec<Section> {
    sections
        .iter()
        .cloned()
        .map(|mut s| {
            if s.linked_component_id == Some(component) && !s.dirty {
                s.content = content.to_string();
                s.original_content = Some(content.to_string());
            }
            s.dirty = s.computed_dirty();
            s
        })
        .collect()
}

/// Recompute every `dirty` flag, e.g. after loading persisted sections.
pub fn refresh_dirty(sections: &[Section]) -> Vec<Section> {
    sections
        .iter()
        .cloned()
        .map(|mut s| {
            s.dirty = s.computed_dirty();
            s
        })
        .collect()
}

/// Handle Enter typed in section `id` with the caret at byte offset `cursor`.
///
/// At the end of the text a new blank section `new_id` is added right after
/// the current one and its id is returned. Anywhere else (or with Shift held)
/// a newline is inserted at the caret instead.
pub fn press_enter(
    sections: &[Section],
    id: NodeId,
    cursor: usize,
    shift: bool,
    new_id: NodeId,
    kind: ComponentKind,
) -> Result<(Vec<Section>, Option<NodeId>), SectionError> {
    let index = position(sections, id)?;
    match enter_action(&sections[index].content, cursor, shift) {
        EnterAction::NewSection => {
            log::debug!("Enter at end of section {id}: adding section {new_id}");
            Ok((
                insert_at(sections, index + 1, Section::blank(new_id, kind)),
                Some(new_id),
            ))
        }
        EnterAction::InsertNewline { content } => Ok((update_content(sections, id, content)?, None)),
    }
}

fn position(sections: &[Section], id: NodeId) -> Result<usize, SectionError> {
    sections
        .iter()
        .position(|s| s.id == id)
        .ok_or(SectionError::NotFound(id))
}

fn update(
    sections: &[Section],
    id: NodeId,
    f: impl FnOnce(&mut Section),
) -> Result<Vec<Section>, SectionError> {
    let index = position(sections, id)?;
    let mut next = sections.to_vec();
    let section = &mut next[index];
    f(section);
    section.dirty = section.computed_dirty();
    Ok(next)
}
