//! TOML configuration.
//!
//! Resolved from the platform config directory (`dafkesher/config.toml`) or
//! an explicit `--config` path. A missing file at the platform location
//! yields the documented defaults; unknown keys warn on stderr instead of
//! failing.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "dafkesher";
const DEFAULT_DATA_FILE: &str = "data.json";
const DEFAULT_OPENER: &str = "xdg-open";

#[derive(Debug, Clone)]
pub struct Config {
    /// Path the configuration was read from; `None` when running on
    /// defaults.
    pub config_path: Option<PathBuf>,
    /// The static JSON data file holding the contact records.
    pub data_path: PathBuf,
    /// Directory `.vcf` exports are written to.
    pub export_dir: PathBuf,
    /// Whether the free-text search haystack includes the two phone-link
    /// fields in addition to the display phone.
    pub search_includes_phone_links: bool,
    pub ui: UiConfig,
    pub commands: Commands,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            export_dir: PathBuf::from("."),
            search_includes_phone_links: false,
            ui: UiConfig::default(),
            commands: Commands::default(),
        }
    }
}

// =============================================================================
// UI Configuration
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub header_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
    pub error_fg: RgbColor,
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            border: RgbColor::new(110, 110, 110),
            selection_bg: RgbColor::new(40, 80, 140),
            selection_fg: RgbColor::new(235, 235, 235),
            header_fg: RgbColor::new(170, 170, 170),
            status_fg: RgbColor::new(220, 220, 220),
            status_bg: RgbColor::new(55, 55, 55),
            error_fg: RgbColor::new(200, 60, 60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// External Commands
// =============================================================================

/// Openers for the call and message deep links. Both default to handing the
/// URI to `xdg-open`; either can be replaced or disabled (empty string) in
/// the config file.
#[derive(Debug, Clone)]
pub struct Commands {
    pub dial: Option<CommandExec>,
    pub message: Option<CommandExec>,
}

impl Default for Commands {
    fn default() -> Self {
        let opener = Some(CommandExec {
            program: DEFAULT_OPENER.to_string(),
            args: Vec::new(),
        });
        Self {
            dial: opener.clone(),
            message: opener,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

// =============================================================================
// Raw file shape
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    data_path: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    search_includes_phone_links: Option<bool>,
    ui: UiFile,
    commands: CommandsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    header_fg: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
    error_fg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        let defaults = UiColors::default();
        Self {
            border: defaults.border,
            selection_bg: defaults.selection_bg,
            selection_fg: defaults.selection_fg,
            header_fg: defaults.header_fg,
            status_fg: defaults.status_fg,
            status_bg: defaults.status_bg,
            error_fg: defaults.error_fg,
        }
    }
}

impl From<UiColorsFile> for UiColors {
    fn from(file: UiColorsFile) -> Self {
        Self {
            border: file.border,
            selection_bg: file.selection_bg,
            selection_fg: file.selection_fg,
            header_fg: file.header_fg,
            status_fg: file.status_fg,
            status_bg: file.status_bg,
            error_fg: file.error_fg,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommandsFile {
    dial: Option<CommandDef>,
    message: Option<CommandDef>,
}

// =============================================================================
// Loading
// =============================================================================

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `override_path`, or from the platform location.
/// A missing explicitly-requested file is an error; a missing file at the
/// platform location is not.
pub fn load(override_path: Option<&Path>) -> Result<Config> {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        if override_path.is_some() {
            bail!("configuration file not found at {}", path.display());
        }
        return Ok(Config::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let defaults = Config::default();

    Ok(Config {
        config_path: Some(path),
        data_path: cfg_file
            .data_path
            .map(|p| expand_tilde(&p))
            .unwrap_or(defaults.data_path),
        export_dir: cfg_file
            .export_dir
            .map(|p| expand_tilde(&p))
            .unwrap_or(defaults.export_dir),
        search_includes_phone_links: cfg_file
            .search_includes_phone_links
            .unwrap_or(defaults.search_includes_phone_links),
        ui: UiConfig {
            colors: cfg_file.ui.colors.into(),
        },
        commands: Commands {
            dial: match cfg_file.commands.dial {
                Some(def) => CommandExec::from_def(def),
                None => defaults.commands.dial,
            },
            message: match cfg_file.commands.message {
                Some(def) => CommandExec::from_def(def),
                None => defaults.commands.message,
            },
        },
    })
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from([
        "data_path",
        "export_dir",
        "search_includes_phone_links",
        "ui",
        "commands",
    ]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }
}
