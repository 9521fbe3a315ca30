//! Configuration file loading and validation. The run-time core consumes the
//! validated [`Config`]; everything in here happens before the first X
//! request is issued.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use x11rb::protocol::xproto::KeyButMask;

use crate::errors::ConfigError;
use crate::registry::Direction;
use crate::{Binding, Config};

pub const CONFIG_FILE: &str = "config.toml";

/// On-disk shape of the config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    modifier: String,
    #[serde(default)]
    actions: Vec<ActionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionEntry {
    key: String,
    command: Option<Vec<String>>,
    action: Option<NavigateAction>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum NavigateAction {
    #[serde(rename = "NEXT_WINDOW")]
    NextWindow,
    #[serde(rename = "PREVIOUS_WINDOW")]
    PreviousWindow,
}

impl From<NavigateAction> for Direction {
    fn from(action: NavigateAction) -> Self {
        match action {
            NavigateAction::NextWindow => Direction::Next,
            NavigateAction::PreviousWindow => Direction::Previous,
        }
    }
}

/// Maps a modifier name to its mask. The recognized set is enumerated
/// explicitly; an unknown name is a config error, never a silent "no
/// modifier".
pub fn modifier_from_name(name: &str) -> Option<KeyButMask> {
    let mask = match name {
        "Shift" => KeyButMask::SHIFT,
        "Lock" => KeyButMask::LOCK,
        "Control" => KeyButMask::CONTROL,
        "Mod1" => KeyButMask::MOD1,
        "Mod2" => KeyButMask::MOD2,
        "Mod3" => KeyButMask::MOD3,
        "Mod4" => KeyButMask::MOD4,
        "Mod5" => KeyButMask::MOD5,
        _ => return None,
    };
    Some(mask)
}

pub fn default_path() -> Result<PathBuf, ConfigError> {
    match dirs::config_dir() {
        Some(dir) => Ok(dir.join("wwm").join(CONFIG_FILE)),
        None => Err(ConfigError::NoConfigDir),
    }
}

/// Parses and validates config file contents.
pub fn parse(contents: &str) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(contents)?;

    let modifier = modifier_from_name(&file.modifier)
        .ok_or_else(|| ConfigError::UnknownModifier(file.modifier.clone()))?;

    let mut bindings = Vec::with_capacity(file.actions.len());
    for entry in file.actions {
        if entry.command.is_none() && entry.action.is_none() {
            return Err(ConfigError::EmptyBinding(entry.key));
        }
        bindings.push(Binding {
            key: entry.key,
            command: entry.command,
            navigate: entry.action.map(Direction::from),
        });
    }

    Ok(Config { modifier, bindings })
}

/// Loads the config from `path`, falling back to the built-in defaults when
/// the file does not exist. Any other read or validation failure is an error.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(?path, "no config file found, using defaults");
            return Ok(Config::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    parse(&contents)
}
