// Prompt list: the retained prompts and which one is being edited.

use prompt_core::{ComponentKind, NodeId, Prompt, Section};

use crate::sections;
use crate::SectionError;

/// Creating a prompt past this many evicts the oldest one.
pub const MAX_PROMPTS: usize = 10;

/// Always holds at least one prompt, and `active` always names one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBook {
    prompts: Vec<Prompt>,
    active: NodeId,
}

/// A new prompt with a single empty "Section 1".
pub fn starter_prompt(id: NodeId, num: u32, section_id: NodeId) -> Prompt {
    Prompt {
        id,
        num,
        name: format!("Prompt {num}"),
        sections: vec![Section::named(section_id, "Section 1", ComponentKind::Main)],
    }
}

impl PromptBook {
    pub fn new(prompt_id: NodeId, section_id: NodeId) -> Self {
        Self {
            prompts: vec![starter_prompt(prompt_id, 1, section_id)],
            active: prompt_id,
        }
    }

    /// Rebuild from persisted prompts. An empty list gets a starter prompt with
    /// ids from `alloc`; an unknown or missing active id falls back to the first prompt.
    pub fn from_parts(
        prompts: Vec<Prompt>,
        active: Option<NodeId>,
        mut alloc: impl FnMut() -> NodeId,
    ) -> Self {
        if prompts.is_empty() {
            let prompt_id = alloc();
            let section_id = alloc();
            return Self::new(prompt_id, section_id);
        }
        let mut prompts: Vec<Prompt> = prompts
            .into_iter()
            .map(|mut p| {
                p.sections = sections::refresh_dirty(&p.sections);
                p
            })
            .collect();
        if prompts.len() > MAX_PROMPTS {
            let excess = prompts.len() - MAX_PROMPTS;
            prompts.drain(..excess);
        }
        let active = active
            .filter(|id| prompts.iter().any(|p| p.id == *id))
            .unwrap_or(prompts[0].id);
        Self { prompts, active }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn active_id(&self) -> NodeId {
        self.active
    }

    pub fn active(&self) -> &Prompt {
        self.prompts
            .iter()
            .find(|p| p.id == self.active)
            .unwrap_or(&self.prompts[0])
    }

    pub fn sections(&self) -> &[Section] {
        &self.active().sections
    }

    /// Replace the active prompt's sections.
    pub fn set_sections(&mut self, sections: Vec<Section>) {
        let active = self.active;
        if let Some(prompt) = self.prompts.iter_mut().find(|p| p.id == active) {
            prompt.sections = sections;
        }
    }

    /// Apply `f` to the sections of every prompt (used when a component changes).
    pub fn map_all_sections(&mut self, f: impl Fn(&[Section]) -> Vec<Section>) {
        for prompt in &mut self.prompts {
            prompt.sections = f(&prompt.sections);
        }
    }

    /// Append a new prompt, make it active, and evict the oldest past `MAX_PROMPTS`.
    pub fn create(&mut self, prompt_id: NodeId, section_id: NodeId) -> NodeId {
        let num = self.prompts.last().map_or(1, |p| p.num + 1);
        self.prompts.push(starter_prompt(prompt_id, num, section_id));
        if self.prompts.len() > MAX_PROMPTS {
            let evicted = self.prompts.remove(0);
            log::info!("Evicted oldest prompt {} ({})", evicted.id, evicted.name);
        }
        self.active = prompt_id;
        prompt_id
    }

    pub fn switch(&mut self, id: NodeId) -> Result<(), SectionError> {
        if !self.prompts.iter().any(|p| p.id == id) {
            return Err(SectionError::PromptNotFound(id));
        }
        self.active = id;
        Ok(())
    }

    /// Largest prompt or section id in use.
    pub fn max_id(&self) -> NodeId {
        max_prompt_id(&self.prompts)
    }
}

/// Largest prompt or section id in `prompts`, 0 when empty.
pub fn max_prompt_id(prompts: &[Prompt]) -> NodeId {
    prompts
        .iter()
        .flat_map(|p| std::iter::once(p.id).chain(p.sections.iter().map(|s| s.id)))
        .max()
        .unwrap_or(0)
}
