//! Keysym constants and the symbolic name table.
//!
//! Keysyms for printable Latin-1 characters equal their character codes, so
//! single-character names ("j", "0", "-") need no table entry. Everything
//! else goes through `NAMED`, which uses the standard X names ("Return",
//! "space", "Prior").

pub type Keysym = u32;

pub const XK_RETURN: Keysym = 0xff0d;
pub const XK_TAB: Keysym = 0xff09;
pub const XK_ESCAPE: Keysym = 0xff1b;
pub const XK_BACKSPACE: Keysym = 0xff08;
pub const XK_DELETE: Keysym = 0xffff;
pub const XK_SPACE: Keysym = 0x0020;
pub const XK_HOME: Keysym = 0xff50;
pub const XK_LEFT: Keysym = 0xff51;
pub const XK_UP: Keysym = 0xff52;
pub const XK_RIGHT: Keysym = 0xff53;
pub const XK_DOWN: Keysym = 0xff54;
pub const XK_PRIOR: Keysym = 0xff55;
pub const XK_NEXT: Keysym = 0xff56;
pub const XK_END: Keysym = 0xff57;
pub const XK_F1: Keysym = 0xffbe;

static NAMED: &[(&str, Keysym)] = &[
    ("Return", XK_RETURN),
    ("Tab", XK_TAB),
    ("Escape", XK_ESCAPE),
    ("BackSpace", XK_BACKSPACE),
    ("Delete", XK_DELETE),
    ("space", XK_SPACE),
    ("Home", XK_HOME),
    ("End", XK_END),
    ("Left", XK_LEFT),
    ("Up", XK_UP),
    ("Right", XK_RIGHT),
    ("Down", XK_DOWN),
    ("Prior", XK_PRIOR),
    ("Page_Up", XK_PRIOR),
    ("Next", XK_NEXT),
    ("Page_Down", XK_NEXT),
    ("F1", XK_F1),
    ("F2", XK_F1 + 1),
    ("F3", XK_F1 + 2),
    ("F4", XK_F1 + 3),
    ("F5", XK_F1 + 4),
    ("F6", XK_F1 + 5),
    ("F7", XK_F1 + 6),
    ("F8", XK_F1 + 7),
    ("F9", XK_F1 + 8),
    ("F10", XK_F1 + 9),
    ("F11", XK_F1 + 10),
    ("F12", XK_F1 + 11),
];

/// Looks up a symbolic key name. Returns `None` for names outside the table.
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next())
        && (' '..='~').contains(&c)
    {
        return Some(c as Keysym);
    }
    NAMED
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, keysym)| keysym)
}

/// Human-readable form of a keysym, for logs and diagnostics.
pub fn format_keysym(keysym: Keysym) -> String {
    if let Some(&(name, _)) = NAMED.iter().find(|&&(_, sym)| sym == keysym) {
        return name.to_string();
    }
    if (0x20..=0x7e).contains(&keysym)
        && let Some(c) = char::from_u32(keysym)
    {
        return c.to_string();
    }
    format!("0x{keysym:x}")
}
