// Prompt Builder: compose prompts from a tree of reusable components.
// Command-line host over the tree store, the drag/drop reconciler and the
// section editor. Each command applies one step and persists the result.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use prompt_core::{ComponentKind, DropIntent, DropPosition, ListTarget, NodeId, Vec2, ROOT_ID};
use prompt_input::RowMetrics;

use prompt_app::clipboard::{self, SystemClipboard};
use prompt_app::settings::{self, FileSettingsBackend, SettingsBackend};
use prompt_app::storage::{DebouncedPersister, JsonFileStore, PersistenceError, StateStore};
use prompt_app::{render, transfer, AppError, AppState};

#[derive(Parser)]
#[command(name = "prompt-builder")]
#[command(about = "Compose prompts from a tree of reusable components")]
struct Cli {
    /// State file (default: <data dir>/prompt-builder/state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Settings file (default: <config dir>/prompt-builder/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// One line typed into `shell`.
#[derive(Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the component tree
    Tree {
        /// Leave out the contents of collapsed folders
        #[arg(long)]
        visible: bool,
    },
    /// Add a folder
    AddFolder {
        name: String,
        #[arg(long, default_value_t = ROOT_ID)]
        parent: NodeId,
    },
    /// Add a component
    AddComponent {
        name: String,
        #[arg(long, default_value_t = ROOT_ID)]
        parent: NodeId,
        #[arg(long = "type", default_value = "main")]
        kind: ComponentKind,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Change a component's name, type or content
    EditComponent {
        id: NodeId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        kind: Option<ComponentKind>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Rename a folder
    Rename { id: NodeId, name: String },
    /// Delete a component, or a folder and everything in it
    Delete { id: NodeId },
    /// Expand or collapse a folder (shell only; collapse state is not saved)
    Toggle { id: NodeId },
    /// Move a node relative to a target (above, below, inside, inside-bottom)
    Move {
        id: NodeId,
        target: NodeId,
        #[arg(long, default_value = "inside-bottom")]
        position: DropPosition,
    },
    /// Drag a node and release it at a pointer position over the tree.
    /// Outside the shell every nested folder starts collapsed.
    DragTo {
        id: NodeId,
        x: f32,
        y: f32,
    },
    /// Append the nodes of a JSON file to the root folder
    Import { path: PathBuf },
    /// Write the root folder to a JSON file
    Export {
        #[arg(default_value = transfer::DEFAULT_EXPORT_FILE)]
        path: PathBuf,
    },
    /// Start a new prompt and make it active
    NewPrompt,
    /// List prompts
    Prompts,
    /// Make another prompt active
    Switch { id: NodeId },
    /// Show the sections of the active prompt
    Sections,
    /// Drop a component into the active prompt as a linked section
    DropComponent {
        id: NodeId,
        /// Insertion index (default: end)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Add a blank section
    AddSection {
        /// Insert after this index (default: end)
        #[arg(long)]
        after: Option<usize>,
    },
    /// Remove a section
    RemoveSection { id: NodeId },
    /// Drag a section to an index of the section list
    MoveSection { id: NodeId, index: usize },
    /// Replace a section's content
    EditSection { id: NodeId, content: String },
    /// Set a section's name and type
    Header {
        id: NodeId,
        name: String,
        #[arg(long = "type")]
        kind: Option<ComponentKind>,
    },
    /// Open or close a section
    Fold { id: NodeId },
    /// Press Enter in a section
    Enter {
        id: NodeId,
        /// Byte offset of the caret (default: end of text)
        #[arg(long)]
        cursor: Option<usize>,
        #[arg(long)]
        shift: bool,
    },
    /// Write a linked section's edits back into its component
    SaveSection { id: NodeId },
    /// Copy the active prompt to the clipboard
    Copy {
        /// Print instead of using the clipboard
        #[arg(long)]
        print: bool,
    },
    /// Show settings, or change them with key=value pairs
    Settings { assignments: Vec<String> },
    /// Write pending changes now
    Save,
    /// Read commands from stdin until `quit`
    Shell,
}

// ──────────────────────────────────────────────
// Host
// ──────────────────────────────────────────────

struct Host<S: StateStore> {
    state: AppState,
    persister: DebouncedPersister<S>,
    settings_backend: FileSettingsBackend,
    clipboard: SystemClipboard,
}

impl Host<JsonFileStore> {
    fn open(state_path: Option<&Path>, settings_path: Option<&Path>) -> Result<Self, AppError> {
        let store = match state_path {
            Some(path) => JsonFileStore::new(path),
            None => JsonFileStore::default_location()?,
        };
        let settings_backend = match settings_path {
            Some(path) => FileSettingsBackend::new(path),
            None => FileSettingsBackend::default_location()?,
        };
        Host::with_store(store, settings_backend)
    }
}

impl<S: StateStore> Host<S> {
    fn with_store(store: S, settings_backend: FileSettingsBackend) -> Result<Self, AppError> {
        let settings = settings::load_or_seed(&settings_backend);
        // A store that exists but cannot be read is not overwritten.
        let stored = store.load()?;
        let mut persister = DebouncedPersister::new(store);
        persister.set_auto_flush(settings.auto_save);
        Ok(Self {
            state: AppState::from_stored(stored, settings),
            persister,
            settings_backend,
            clipboard: SystemClipboard::default(),
        })
    }

    /// Run one command and schedule a write if it changed anything.
    fn run_command(&mut self, command: Commands) -> Result<String, AppError> {
        let before = self.state.generation();
        let output = self.execute(command)?;
        if self.state.generation() != before {
            self.persister
                .schedule(self.state.snapshot(), Instant::now());
        }
        Ok(output)
    }

    fn execute(&mut self, command: Commands) -> Result<String, AppError> {
        let state = &mut self.state;
        let output = match command {
            Commands::Tree { visible } => {
                render::render_tree(state.tree().root(), state.collapsed(), visible)
            }
            Commands::AddFolder { name, parent } => {
                format!("{}\n", state.add_folder(parent, &name)?)
            }
            Commands::AddComponent {
                name,
                parent,
                kind,
                content,
            } => format!("{}\n", state.add_component(parent, &name, kind, &content)?),
            Commands::EditComponent {
                id,
                name,
                kind,
                content,
            } => {
                state.edit_component(id, name.as_deref(), kind, content.as_deref())?;
                String::new()
            }
            Commands::Rename { id, name } => {
                state.rename_folder(id, &name)?;
                String::new()
            }
            Commands::Delete { id } => {
                state.delete_node(id)?;
                String::new()
            }
            Commands::Toggle { id } => {
                let collapsed = state.toggle_collapse(id)?;
                format!("{}\n", if collapsed { "collapsed" } else { "expanded" })
            }
            Commands::Move {
                id,
                target,
                position,
            } => {
                state.move_node(id, target, position)?;
                String::new()
            }
            Commands::DragTo { id, x, y } => {
                let layout = state.tree_layout(&RowMetrics::default());
                state.begin_tree_drag(id)?;
                let resolved = state.drag_over_tree(&layout, Vec2::new(x, y));
                state.drop_on_tree()?;
                match resolved.map(|r| r.intent) {
                    Some(DropIntent::Node { target, position }) => {
                        format!("moved {id} {position} {target}\n")
                    }
                    Some(DropIntent::ListInsert { index, .. }) => {
                        format!("moved {id} to index {index}\n")
                    }
                    None => String::new(),
                }
            }
            Commands::Import { path } => {
                format!("imported {} nodes\n", state.import_file(&path)?)
            }
            Commands::Export { path } => {
                state.export_file(&path)?;
                format!("{}\n", path.display())
            }
            Commands::NewPrompt => format!("{}\n", state.new_prompt()),
            Commands::Prompts => render::render_prompt_list(
                state.prompts().prompts(),
                state.prompts().active_id(),
            ),
            Commands::Switch { id } => {
                state.switch_prompt(id)?;
                String::new()
            }
            Commands::Sections => render::render_sections(state.prompts().sections()),
            Commands::DropComponent { id, index } => {
                state.begin_tree_drag(id)?;
                if let Some(index) = index {
                    state.set_drop_intent(DropIntent::ListInsert {
                        list: ListTarget::Sections,
                        index,
                    });
                }
                match state.drop_on_sections()? {
                    Some(created) => format!("{created}\n"),
                    None => String::new(),
                }
            }
            Commands::AddSection { after } => format!("{}\n", state.add_section_after(after)),
            Commands::RemoveSection { id } => {
                state.remove_section(id)?;
                String::new()
            }
            Commands::MoveSection { id, index } => {
                state.begin_section_drag(id)?;
                state.set_drop_intent(DropIntent::ListInsert {
                    list: ListTarget::Sections,
                    index,
                });
                state.drop_on_sections()?;
                String::new()
            }
            Commands::EditSection { id, content } => {
                state.update_section_content(id, &content)?;
                String::new()
            }
            Commands::Header { id, name, kind } => {
                let kind = match kind {
                    Some(kind) => kind,
                    None => section_kind(state, id)?,
                };
                state.commit_section_header(id, &name, kind)?;
                String::new()
            }
            Commands::Fold { id } => {
                state.toggle_section(id)?;
                String::new()
            }
            Commands::Enter { id, cursor, shift } => {
                let cursor = match cursor {
                    Some(cursor) => cursor,
                    None => section_content_len(state, id)?,
                };
                match state.press_enter(id, cursor, shift)? {
                    Some(created) => format!("{created}\n"),
                    None => String::new(),
                }
            }
            Commands::SaveSection { id } => {
                state.save_section(id)?;
                String::new()
            }
            Commands::Copy { print } => {
                if print {
                    format!("{}\n", state.compiled_prompt())
                } else {
                    let text = clipboard::copy_active_prompt(state, &mut self.clipboard)?;
                    format!("copied {} bytes\n", text.len())
                }
            }
            Commands::Settings { assignments } => {
                if !assignments.is_empty() {
                    let mut next = state.settings().clone();
                    for assignment in &assignments {
                        let (key, value) = assignment.split_once('=').ok_or_else(|| {
                            AppError::Setting(format!("expected key=value, got {assignment:?}"))
                        })?;
                        next.set(key.trim(), value).map_err(AppError::Setting)?;
                    }
                    self.settings_backend.post(&next)?;
                    self.persister.set_auto_flush(next.auto_save);
                    state.set_settings(next);
                    log::info!("Updated settings");
                }
                let json = serde_json::to_string_pretty(state.settings())
                    .map_err(PersistenceError::from)?;
                format!("{json}\n")
            }
            Commands::Save => {
                if self.persister.flush() {
                    "saved\n".to_string()
                } else {
                    String::new()
                }
            }
            // Handled by `run`; a nested shell is refused when parsing.
            Commands::Shell => String::new(),
        };
        Ok(output)
    }

    /// Interactive loop. Writes follow the debounce unless autoSave is off.
    fn run_shell(&mut self) {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("> ");
            let _ = std::io::stdout().flush();
            let line = match lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    log::error!("Failed to read input: {}", e);
                    break;
                }
                None => break,
            };
            let line = line.trim();
            if line.is_empty() {
                self.persister.poll(Instant::now());
                continue;
            }
            if line == "quit" || line == "exit" {
                break;
            }

            match parse_shell_line(line) {
                Ok(command) => match self.run_command(command) {
                    Ok(output) => print!("{output}"),
                    Err(e) => eprintln!("error: {e}"),
                },
                Err(message) => eprintln!("{message}"),
            }
            self.persister.poll(Instant::now());
        }
        self.finish();
    }

    /// Flush on exit when autoSave is on; otherwise pending changes are dropped.
    fn finish(&mut self) {
        if !self.persister.is_pending() {
            return;
        }
        if self.state.settings().auto_save {
            self.persister.flush();
        } else {
            log::warn!("autoSave is off; discarding unsaved changes");
        }
    }
}

fn parse_shell_line(line: &str) -> Result<Commands, String> {
    let words = shlex::split(line).ok_or_else(|| "error: unbalanced quotes".to_string())?;
    match ShellLine::try_parse_from(words) {
        Ok(ShellLine {
            command: Commands::Shell,
        }) => Err("error: already in a shell".to_string()),
        Ok(parsed) => Ok(parsed.command),
        Err(e) => Err(e.to_string()),
    }
}

fn section_kind(state: &AppState, id: NodeId) -> Result<ComponentKind, AppError> {
    state
        .prompts()
        .sections()
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.kind)
        .ok_or_else(|| prompt_editor::SectionError::NotFound(id).into())
}

fn section_content_len(state: &AppState, id: NodeId) -> Result<usize, AppError> {
    state
        .prompts()
        .sections()
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.content.len())
        .ok_or_else(|| prompt_editor::SectionError::NotFound(id).into())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut host = Host::open(cli.state.as_deref(), cli.settings.as_deref())?;
    match cli.command.unwrap_or(Commands::Tree { visible: false }) {
        Commands::Shell => host.run_shell(),
        command => print!("{}", run_once(&mut host, command)?),
    }
    Ok(())
}

/// Run a single command outside the shell and write the result straight away.
fn run_once<S: StateStore>(host: &mut Host<S>, command: Commands) -> Result<String, AppError> {
    if let Commands::Toggle { .. } = command {
        return Err(AppError::ShellOnly("toggle"));
    }
    let output = host.run_command(command)?;
    host.persister.flush();
    Ok(output)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
