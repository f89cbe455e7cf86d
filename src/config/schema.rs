use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/segue/config.toml` or
/// `~/.config/segue/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SEGUE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root directory scanned when segue is started without arguments.
    /// Empty means "not configured yet"; set it with `segue path <dir>`.
    pub root: String,
    /// File extensions treated as audio (leading dots optional).
    pub extensions: Vec<String>,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Optional recursion depth cap (WalkDir semantics: root is depth 0).
    pub max_depth: Option<usize>,
    /// Whether to follow symlinks while scanning.
    pub follow_links: bool,
    /// Whether dot-files and dot-directories are scanned.
    pub include_hidden: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: String::new(),
            extensions: vec![
                "mp3".to_string(),
                "flac".to_string(),
                "wav".to_string(),
                "ogg".to_string(),
            ],
            recursive: true,
            max_depth: None,
            follow_links: false,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether repeat-current-track starts enabled.
    pub repeat: bool,
    /// Whether the queue built from the main playlist (`segue .`) is shuffled.
    pub shuffle_on_main: bool,
    /// Initial output volume, `0.0..=2.0`.
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            repeat: false,
            shuffle_on_main: true,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Minimum time between accepted key commands (milliseconds).
    pub cooldown_ms: u64,
    /// Control-loop sleep per iteration (milliseconds).
    pub tick_ms: u64,
    /// Volume change applied by the up/down arrows.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 200,
            tick_ms: 50,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Show the album panel next to the track details.
    pub covers: bool,
    /// Show the sample-peak visualizer.
    pub visualizer: bool,
    /// Use block glyphs for the visualizer bars instead of plain ASCII.
    pub blocks: bool,
    /// Show the key-binding help line.
    pub info: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            covers: true,
            visualizer: true,
            blocks: true,
            info: false,
        }
    }
}
