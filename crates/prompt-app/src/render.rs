//! Plain-text rendering of the component tree and prompts for the terminal.

use std::collections::HashSet;

use prompt_core::{Folder, Node, NodeId, Prompt, Section};

const EXPANDED: char = '▾';
const COLLAPSED: char = '▸';
const DIRTY: char = '*';

/// Render the tree as ASCII art.
///
/// Example output:
/// ```text
/// ▾ Components [1]
/// ├── ▸ Personas [2]
/// │   └── Judge [3] (context)
/// └── Tone [4] (instruction)
/// ```
///
/// With `visible_only`, children of collapsed folders are left out, matching
/// what the sidebar shows.
pub fn render_tree(root: &Folder, collapsed: &HashSet<NodeId>, visible_only: bool) -> String {
    let mut output = String::new();
    output.push(folder_marker(root.id, collapsed));
    output.push_str(&format!(" {} [{}]\n", root.name, root.id));
    if visible_only && collapsed.contains(&root.id) {
        return output;
    }
    render_children(&mut output, &root.children, "", collapsed, visible_only);
    output
}

fn render_children(
    output: &mut String,
    children: &[Node],
    prefix: &str,
    collapsed: &HashSet<NodeId>,
    visible_only: bool,
) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);

        match child {
            Node::Folder(folder) => {
                output.push(folder_marker(folder.id, collapsed));
                output.push_str(&format!(" {} [{}]\n", folder.name, folder.id));
                if visible_only && collapsed.contains(&folder.id) {
                    continue;
                }
                let extension = if is_last { "    " } else { "│   " };
                let child_prefix = format!("{prefix}{extension}");
                render_children(output, &folder.children, &child_prefix, collapsed, visible_only);
            }
            Node::Component(c) => {
                output.push_str(&format!("{} [{}] ({})\n", c.name, c.id, c.kind));
            }
        }
    }
}

fn folder_marker(id: NodeId, collapsed: &HashSet<NodeId>) -> char {
    if collapsed.contains(&id) {
        COLLAPSED
    } else {
        EXPANDED
    }
}

/// One line per prompt, the active one marked with `>`.
pub fn render_prompt_list(prompts: &[Prompt], active: NodeId) -> String {
    prompts
        .iter()
        .map(|p| {
            let marker = if p.id == active { '>' } else { ' ' };
            format!(
                "{marker} {} [{}] {} sections\n",
                p.name,
                p.id,
                p.sections.len()
            )
        })
        .collect()
}

/// The sections of a prompt with their content indented below each header.
pub fn render_sections(sections: &[Section]) -> String {
    let mut output = String::new();
    for (i, s) in sections.iter().enumerate() {
        let name = if s.name.is_empty() { "(untitled)" } else { s.name.as_str() };
        output.push_str(&format!("{i}. {name} [{}] ({})", s.id, s.kind));
        if let Some(component) = s.linked_component_id {
            output.push_str(&format!(" -> {component}"));
        }
        if s.dirty {
            output.push(' ');
            output.push(DIRTY);
        }
        output.push('\n');
        if s.open {
            for line in s.content.lines() {
                output.push_str("    ");
                output.push_str(line);
                output.push('\n');
            }
        }
    }
    output
}
