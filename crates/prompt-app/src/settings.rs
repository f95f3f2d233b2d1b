// Settings persistence: global app configuration stored separately from the
// tree and prompts. Uses the platform config dir:
// ~/Library/Application Support/prompt-builder/settings.json on macOS,
// ~/.config/prompt-builder/settings.json on Linux.

use std::path::{Path, PathBuf};

use prompt_core::ComponentKind;
use serde::{Deserialize, Serialize};

use crate::storage::{write_json, PersistenceError};

const SYSTEM_GUIDE: &str = include_str!("../assets/system_guide.md");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default = "default_prompt_name")]
    pub default_prompt_name: String,
    #[serde(default = "default_section_type")]
    pub default_section_type: ComponentKind,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub markdown_prompting_enabled: bool,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_true() -> bool {
    true
}

fn default_prompt_name() -> String {
    "New Prompt".to_string()
}

fn default_section_type() -> ComponentKind {
    ComponentKind::Instruction
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_system_prompt() -> String {
    SYSTEM_GUIDE.trim_end().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save: default_true(),
            default_prompt_name: default_prompt_name(),
            default_section_type: default_section_type(),
            theme: default_theme(),
            markdown_prompting_enabled: false,
            system_prompt: default_system_prompt(),
        }
    }
}

impl Settings {
    /// Guide text to put in front of the copied prompt, if markdown prompting is on.
    pub fn guide(&self) -> Option<&str> {
        self.markdown_prompting_enabled
            .then_some(self.system_prompt.as_str())
    }

    /// Apply one `key=value` assignment using the stored (camelCase) key names.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let parse_bool = |v: &str| {
            v.parse::<bool>()
                .map_err(|_| format!("expected true or false, got {v:?}"))
        };
        match key {
            "autoSave" => self.auto_save = parse_bool(value)?,
            "defaultPromptName" => self.default_prompt_name = value.to_string(),
            "defaultSectionType" => self.default_section_type = value.parse()?,
            "theme" => self.theme = value.to_string(),
            "markdownPromptingEnabled" => self.markdown_prompting_enabled = parse_bool(value)?,
            "systemPrompt" => self.system_prompt = value.to_string(),
            other => return Err(format!("unknown setting: {other}")),
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Backend
// ──────────────────────────────────────────────

/// `GET /settings -> {settings?}` and `POST /settings {settings}`.
pub trait SettingsBackend {
    fn get(&self) -> Result<Option<Settings>, PersistenceError>;
    fn post(&self, settings: &Settings) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<Settings>,
}

#[derive(Debug, Clone)]
pub struct FileSettingsBackend {
    path: PathBuf,
}

impl FileSettingsBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, PersistenceError> {
        let config_dir = dirs::config_dir().ok_or(PersistenceError::NoConfigDir)?;
        Ok(Self::new(
            config_dir.join("prompt-builder").join("settings.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsBackend for FileSettingsBackend {
    fn get(&self) -> Result<Option<Settings>, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(serde_json::from_str::<Envelope>(&data)?.settings),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn post(&self, settings: &Settings) -> Result<(), PersistenceError> {
        write_json(
            &self.path,
            &Envelope {
                settings: Some(settings.clone()),
            },
        )
    }
}

/// Read settings, seeding the backend with defaults when nothing is stored.
/// A backend that cannot be read yields defaults.
pub fn load_or_seed(backend: &dyn SettingsBackend) -> Settings {
    match backend.get() {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            let settings = Settings::default();
            log::info!("No settings stored, seeding defaults");
            if let Err(e) = backend.post(&settings) {
                log::error!("Failed to seed settings: {}", e);
            }
            settings
        }
        Err(e) => {
            log::warn!("Failed to load settings, using defaults: {}", e);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let s = Settings::default();
        assert!(s.auto_save);
        assert_eq!(s.default_prompt_name, "New Prompt");
        assert_eq!(s.default_section_type, ComponentKind::Instruction);
        assert_eq!(s.theme, "dark");
        assert!(!s.markdown_prompting_enabled);
        assert!(s.system_prompt.starts_with("# Prompt Structure/System Guide"));
        assert_eq!(s.guide(), None);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"theme":"light","autoSave":false}"#).unwrap();
        assert_eq!(s.theme, "light");
        assert!(!s.auto_save);
        assert_eq!(s.default_prompt_name, "New Prompt");
    }

    #[test]
    fn missing_file_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileSettingsBackend::new(dir.path().join("settings.json"));
        assert_eq!(backend.get().unwrap(), None);

        let s = load_or_seed(&backend);
        assert_eq!(s, Settings::default());
        assert_eq!(backend.get().unwrap(), Some(Settings::default()));
    }

    #[test]
    fn stored_settings_are_returned() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileSettingsBackend::new(dir.path().join("settings.json"));
        let mut s = Settings::default();
        s.set("markdownPromptingEnabled", "true").unwrap();
        s.set("defaultSectionType", "context").unwrap();
        backend.post(&s).unwrap();

        let raw = std::fs::read_to_string(backend.path()).unwrap();
        assert!(raw.contains("\"settings\""));
        let loaded = load_or_seed(&backend);
        assert_eq!(loaded.default_section_type, ComponentKind::Context);
        assert!(loaded.guide().is_some());
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "garbage").unwrap();
        let backend = FileSettingsBackend::new(&path);
        assert_eq!(load_or_seed(&backend), Settings::default());
        // The broken file is left for the user to inspect.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage");
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut s = Settings::default();
        assert!(s.set("fontSize", "12").is_err());
        assert!(s.set("autoSave", "maybe").is_err());
        assert!(s.set("defaultSectionType", "poem").is_err());
        assert_eq!(s, Settings::default());
    }
}
