pub mod config;
pub mod errors;
pub mod exec;
pub mod keyboard;
pub mod registry;
pub mod window_manager;
pub mod x11;

use x11rb::protocol::xproto::KeyButMask;

use crate::registry::Direction;

/// One key binding, already validated: a symbolic key name plus its effects.
/// A binding may carry both a command and a navigation action; the command
/// runs first.
#[derive(Debug, Clone)]
pub struct Binding {
    pub key: String,
    pub command: Option<Vec<String>>,
    pub navigate: Option<Direction>,
}

/// The consumed configuration: one modifier required on every binding, and
/// the bindings in declared order.
#[derive(Debug, Clone)]
pub struct Config {
    pub modifier: KeyButMask,
    pub bindings: Vec<Binding>,
}

impl Default for Config {
    fn default() -> Self {
        const TERMINAL: &str = "xterm";

        Self {
            modifier: KeyButMask::MOD4,
            bindings: vec![
                Binding {
                    key: "j".to_string(),
                    command: None,
                    navigate: Some(Direction::Next),
                },
                Binding {
                    key: "k".to_string(),
                    command: None,
                    navigate: Some(Direction::Previous),
                },
                Binding {
                    key: "Return".to_string(),
                    command: Some(vec![TERMINAL.to_string()]),
                    navigate: None,
                },
            ],
        }
    }
}
