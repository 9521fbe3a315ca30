use std::path::PathBuf;

use thiserror::Error;

use crate::keyboard::keysyms::Keysym;

/// Failures on the X connection itself.
#[derive(Debug, Error)]
pub enum X11Error {
    #[error("could not connect to the X server: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),
    #[error("the X connection failed: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),
    #[error("X request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),
    #[error("another window manager is already running")]
    AlreadyRunning,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown modifier {0:?} (expected Shift, Lock, Control or Mod1..Mod5)")]
    UnknownModifier(String),
    #[error("binding for key {0:?} has neither a command nor an action")]
    EmptyBinding(String),
    #[error("could not locate a configuration directory")]
    NoConfigDir,
    #[error("could not write config file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors that abort the window manager. Everything here is fatal; per-event
/// failures are contained inside the event loop and never surface as `WmError`.
#[derive(Debug, Error)]
pub enum WmError {
    #[error(transparent)]
    X11(#[from] X11Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown key name {0:?} in binding")]
    UnknownKeyName(String),
    #[error("no keycode is bound to key {name:?} (keysym 0x{keysym:x})")]
    NotBound { name: String, keysym: Keysym },
    #[error("unrecognized arguments, try --help")]
    InvalidArguments,
    #[error("--config requires a path")]
    NoConfigPath,
    #[error("config file {0:?} does not exist")]
    BadConfigPath(PathBuf),
}
