use std::collections::HashMap;

use tracing::debug;
use x11rb::protocol::xproto::{KeyButMask, Keycode};

use crate::Binding;
use crate::errors::WmError;
use crate::keyboard::keysyms::{Keysym, format_keysym, keysym_from_name};
use crate::registry::Direction;

pub mod keysyms;

/// The server's keycode/keysym table, fetched once at acquisition time and
/// never rebuilt during the run loop.
#[derive(Debug, Clone, Default)]
pub struct KeyboardMapping {
    pub min_keycode: Keycode,
    pub max_keycode: Keycode,
    pub keysyms_per_keycode: u8,
    pub syms: Vec<Keysym>,
}

impl KeyboardMapping {
    /// Keysym stored for `(keycode, column)`, or `None` outside the table.
    pub fn keysym_at(&self, keycode: Keycode, column: u8) -> Option<Keysym> {
        if keycode < self.min_keycode || column >= self.keysyms_per_keycode {
            return None;
        }
        let index = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode as usize
            + column as usize;
        self.syms.get(index).copied()
    }

    /// Finds the first keycode producing `keysym`, scanning keycodes
    /// ascending and columns ascending within each keycode. The tie-break is
    /// therefore deterministic: lowest keycode, then lowest column.
    pub fn keycode_for_keysym(&self, keysym: Keysym) -> Option<Keycode> {
        for keycode in self.min_keycode..=self.max_keycode {
            for column in 0..self.keysyms_per_keycode {
                if self.keysym_at(keycode, column) == Some(keysym) {
                    return Some(keycode);
                }
            }
        }
        None
    }
}

/// A binding resolved down to the raw `(modifier mask, keycode)` pair the
/// server reports in key-press events.
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    pub keycode: Keycode,
    pub modifiers: u16,
    pub command: Option<Vec<String>>,
    pub navigate: Option<Direction>,
}

/// Bindings indexed by `(modifier mask, keycode)` for O(1) key-press
/// dispatch. Built once during acquisition; the linear keysym scan happens
/// only here.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: Vec<ResolvedBinding>,
    index: HashMap<(u16, Keycode), usize>,
}

/// Event state bits ignored when matching bindings, mirroring the grab
/// variants issued for each binding: CapsLock (LOCK) and NumLock (MOD2).
pub fn ignored_modifiers() -> u16 {
    u16::from(KeyButMask::LOCK) | u16::from(KeyButMask::MOD2)
}

impl BindingTable {
    /// Resolves every configured binding against the keyboard mapping. A key
    /// name outside the symbol table or a keysym no keycode produces is fatal
    /// here, before any grab is issued.
    pub fn resolve(
        bindings: &[Binding],
        modifier: KeyButMask,
        mapping: &KeyboardMapping,
    ) -> Result<Self, WmError> {
        let modifier_mask = u16::from(modifier);
        let mut table = Self::default();

        for binding in bindings {
            let keysym = keysym_from_name(&binding.key)
                .ok_or_else(|| WmError::UnknownKeyName(binding.key.clone()))?;
            let keycode = mapping
                .keycode_for_keysym(keysym)
                .ok_or_else(|| WmError::NotBound {
                    name: binding.key.clone(),
                    keysym,
                })?;
            debug!(
                key = %format_keysym(keysym),
                keycode,
                modifiers = format_args!("0x{modifier_mask:x}"),
                "resolved binding"
            );

            let slot = table.bindings.len();
            table.bindings.push(ResolvedBinding {
                keycode,
                modifiers: modifier_mask,
                command: binding.command.clone(),
                navigate: binding.navigate,
            });
            // Declared order wins when two bindings collapse onto the same
            // combination.
            table.index.entry((modifier_mask, keycode)).or_insert(slot);
        }

        Ok(table)
    }

    /// Looks up the binding for a key-press, stripping the lock modifiers
    /// from the reported state first.
    pub fn lookup(&self, state: KeyButMask, keycode: Keycode) -> Option<&ResolvedBinding> {
        let clean_state = u16::from(state) & !ignored_modifiers();
        self.index
            .get(&(clean_state, keycode))
            .map(|&slot| &self.bindings[slot])
    }

    pub fn bindings(&self) -> &[ResolvedBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two columns per keycode, starting at keycode 8:
    ///   8 -> (j, J), 9 -> (k, K), 10 -> (Return, _), 11 -> (j, _)
    fn synthetic_mapping() -> KeyboardMapping {
        KeyboardMapping {
            min_keycode: 8,
            max_keycode: 11,
            keysyms_per_keycode: 2,
            syms: vec![0x6a, 0x4a, 0x6b, 0x4b, keysyms::XK_RETURN, 0, 0x6a, 0],
        }
    }

    fn binding(key: &str, command: Option<&[&str]>, navigate: Option<Direction>) -> Binding {
        Binding {
            key: key.to_string(),
            command: command.map(|argv| argv.iter().map(|s| s.to_string()).collect()),
            navigate,
        }
    }

    #[test]
    fn keycode_lookup_finds_an_entry_holding_the_keysym() {
        let mapping = synthetic_mapping();
        let keycode = mapping.keycode_for_keysym(0x4b).expect("K is mapped");
        let held = (0..mapping.keysyms_per_keycode)
            .filter_map(|column| mapping.keysym_at(keycode, column))
            .any(|sym| sym == 0x4b);
        assert!(held);
    }

    #[test]
    fn keycode_lookup_prefers_the_lowest_keycode() {
        // "j" appears on keycode 8 column 0 and keycode 11 column 0.
        assert_eq!(synthetic_mapping().keycode_for_keysym(0x6a), Some(8));
    }

    #[test]
    fn keycode_lookup_scans_columns_within_a_keycode() {
        // "J" only exists in column 1.
        assert_eq!(synthetic_mapping().keycode_for_keysym(0x4a), Some(8));
    }

    #[test]
    fn unmapped_keysyms_resolve_to_none() {
        assert_eq!(synthetic_mapping().keycode_for_keysym(0xff1b), None);
    }

    #[test]
    fn resolve_builds_an_indexed_table() {
        let bindings = [
            binding("j", None, Some(Direction::Next)),
            binding("Return", Some(&["xterm"]), None),
        ];
        let table =
            BindingTable::resolve(&bindings, KeyButMask::MOD4, &synthetic_mapping()).unwrap();

        let hit = table.lookup(KeyButMask::MOD4, 8).expect("j is bound");
        assert_eq!(hit.navigate, Some(Direction::Next));
        let hit = table.lookup(KeyButMask::MOD4, 10).expect("Return is bound");
        assert_eq!(hit.command.as_deref(), Some(&["xterm".to_string()][..]));
    }

    #[test]
    fn lookup_requires_the_exact_modifier_state() {
        let bindings = [binding("j", None, Some(Direction::Next))];
        let table =
            BindingTable::resolve(&bindings, KeyButMask::MOD4, &synthetic_mapping()).unwrap();

        assert!(table.lookup(KeyButMask::from(0u16), 8).is_none());
        assert!(
            table
                .lookup(KeyButMask::MOD4 | KeyButMask::SHIFT, 8)
                .is_none()
        );
    }

    #[test]
    fn lookup_ignores_caps_and_num_lock() {
        let bindings = [binding("j", None, Some(Direction::Next))];
        let table =
            BindingTable::resolve(&bindings, KeyButMask::MOD4, &synthetic_mapping()).unwrap();

        let state = KeyButMask::MOD4 | KeyButMask::LOCK | KeyButMask::MOD2;
        assert!(table.lookup(state, 8).is_some());
    }

    #[test]
    fn first_declared_binding_wins_on_duplicates() {
        let bindings = [
            binding("j", None, Some(Direction::Next)),
            binding("j", None, Some(Direction::Previous)),
        ];
        let table =
            BindingTable::resolve(&bindings, KeyButMask::MOD4, &synthetic_mapping()).unwrap();

        let hit = table.lookup(KeyButMask::MOD4, 8).unwrap();
        assert_eq!(hit.navigate, Some(Direction::Next));
    }

    #[test]
    fn unknown_key_name_is_fatal() {
        let bindings = [binding("NoSuchKey", None, Some(Direction::Next))];
        let err = BindingTable::resolve(&bindings, KeyButMask::MOD4, &synthetic_mapping())
            .unwrap_err();
        assert!(matches!(err, WmError::UnknownKeyName(name) if name == "NoSuchKey"));
    }

    #[test]
    fn unbound_keysym_is_fatal() {
        let bindings = [binding("Escape", None, Some(Direction::Next))];
        let err = BindingTable::resolve(&bindings, KeyButMask::MOD4, &synthetic_mapping())
            .unwrap_err();
        assert!(matches!(err, WmError::NotBound { name, .. } if name == "Escape"));
    }
}
