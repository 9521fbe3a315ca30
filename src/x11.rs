//! All display-server I/O lives behind the [`XConn`] trait. The dispatcher
//! only ever sees the closed [`XEvent`] union and the request surface below,
//! so tests can substitute a recording double for the real connection.

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConfigureRequestEvent, ConfigureWindowAux, ConnectionExt,
    EventMask, GrabMode, KeyButMask, Keycode, MapState, Screen, Window,
};
use x11rb::rust_connection::RustConnection;

use crate::errors::X11Error;
use crate::keyboard::KeyboardMapping;

pub type X11Result<T> = Result<T, X11Error>;

/// Incoming protocol events, reduced to the variants the dispatcher reacts
/// to. Everything unrecognized is passed through as `Other` and ignored.
#[derive(Debug, Clone)]
pub enum XEvent {
    KeyPress { keycode: Keycode, state: KeyButMask },
    MapRequest { window: Window },
    ConfigureRequest(ConfigureRequestEvent),
    Unmapped { window: Window },
    Destroyed { window: Window },
    Other,
}

/// The request/event surface the window manager drives. Checked requests
/// (`acquire_redirect`, `grab_key`) block until the server confirms them;
/// the map/unmap/configure requests are fire-and-forget and only guaranteed
/// to have left the process after `flush`.
pub trait XConn {
    /// Root screen dimensions in pixels.
    fn screen_size(&self) -> (u16, u16);

    /// Checked request for substructure redirection on the root window.
    /// Fails with [`X11Error::AlreadyRunning`] when another client already
    /// holds it.
    fn acquire_redirect(&mut self) -> X11Result<()>;

    /// Fetches the server's keycode/keysym table.
    fn keyboard_mapping(&mut self) -> X11Result<KeyboardMapping>;

    /// Checked grab of one key/modifier combination on the root window,
    /// including the CapsLock/NumLock ignore-mask variants.
    fn grab_key(&mut self, modifiers: u16, keycode: Keycode) -> X11Result<()>;

    /// Viewable, non-override-redirect children of the root, for adopting
    /// windows that existed before the manager started.
    fn viewable_children(&mut self) -> X11Result<Vec<Window>>;

    /// Blocking attribute round trip: does the window manage itself?
    fn override_redirect(&mut self, window: Window) -> X11Result<bool>;

    fn map_window(&mut self, window: Window) -> X11Result<()>;
    fn unmap_window(&mut self, window: Window) -> X11Result<()>;
    fn configure_window(&mut self, window: Window, aux: &ConfigureWindowAux) -> X11Result<()>;

    /// Blocks until the next event is available.
    fn wait_for_event(&mut self) -> X11Result<XEvent>;

    /// Delivers all buffered unchecked requests to the server.
    fn flush(&mut self) -> X11Result<()>;
}

/// The live connection. Owned by the process root and handed to the window
/// manager at construction; every request goes through it.
pub struct X11 {
    connection: RustConnection,
    screen: Screen,
    root: Window,
}

impl X11 {
    pub fn connect() -> X11Result<Self> {
        let (connection, screen_number) = x11rb::connect(None)?;
        let screen = connection.setup().roots[screen_number].clone();
        let root = screen.root;
        info!(
            screen = screen_number,
            root = format_args!("0x{root:x}"),
            width = screen.width_in_pixels,
            height = screen.height_in_pixels,
            "connected to the X server"
        );
        Ok(Self {
            connection,
            screen,
            root,
        })
    }
}

impl XConn for X11 {
    fn screen_size(&self) -> (u16, u16) {
        (self.screen.width_in_pixels, self.screen.height_in_pixels)
    }

    fn acquire_redirect(&mut self) -> X11Result<()> {
        let cookie = self.connection.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY),
        )?;
        match cookie.check() {
            Ok(()) => Ok(()),
            Err(x11rb::errors::ReplyError::X11Error(ref error))
                if error.error_kind == x11rb::protocol::ErrorKind::Access =>
            {
                Err(X11Error::AlreadyRunning)
            }
            Err(error) => Err(error.into()),
        }
    }

    fn keyboard_mapping(&mut self) -> X11Result<KeyboardMapping> {
        let setup = self.connection.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = self
            .connection
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        Ok(KeyboardMapping {
            min_keycode,
            max_keycode,
            keysyms_per_keycode: mapping.keysyms_per_keycode,
            syms: mapping.keysyms,
        })
    }

    fn grab_key(&mut self, modifiers: u16, keycode: Keycode) -> X11Result<()> {
        // Grab the combination with and without CapsLock/NumLock so those
        // lock states do not swallow the binding.
        let ignored = [
            0u16,
            u16::from(KeyButMask::LOCK),
            u16::from(KeyButMask::MOD2),
            u16::from(KeyButMask::LOCK) | u16::from(KeyButMask::MOD2),
        ];
        for extra in ignored {
            self.connection
                .grab_key(
                    false,
                    self.root,
                    (modifiers | extra).into(),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?
                .check()?;
        }
        Ok(())
    }

    fn viewable_children(&mut self) -> X11Result<Vec<Window>> {
        let tree = self.connection.query_tree(self.root)?.reply()?;
        let mut children = Vec::new();
        for &window in &tree.children {
            let Ok(attributes) = self.connection.get_window_attributes(window)?.reply() else {
                // The window can be gone by the time we ask about it.
                continue;
            };
            if attributes.override_redirect || attributes.map_state != MapState::VIEWABLE {
                continue;
            }
            children.push(window);
        }
        Ok(children)
    }

    fn override_redirect(&mut self, window: Window) -> X11Result<bool> {
        let attributes = self.connection.get_window_attributes(window)?.reply()?;
        Ok(attributes.override_redirect)
    }

    fn map_window(&mut self, window: Window) -> X11Result<()> {
        self.connection.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&mut self, window: Window) -> X11Result<()> {
        self.connection.unmap_window(window)?;
        Ok(())
    }

    fn configure_window(&mut self, window: Window, aux: &ConfigureWindowAux) -> X11Result<()> {
        self.connection.configure_window(window, aux)?;
        Ok(())
    }

    fn wait_for_event(&mut self) -> X11Result<XEvent> {
        let event = self.connection.wait_for_event()?;
        let event = match event {
            Event::KeyPress(e) => XEvent::KeyPress {
                keycode: e.detail,
                state: e.state,
            },
            Event::MapRequest(e) => XEvent::MapRequest { window: e.window },
            Event::ConfigureRequest(e) => XEvent::ConfigureRequest(e),
            Event::UnmapNotify(e) => XEvent::Unmapped { window: e.window },
            Event::DestroyNotify(e) => XEvent::Destroyed { window: e.window },
            other => {
                debug!(?other, "ignoring event");
                XEvent::Other
            }
        };
        Ok(event)
    }

    fn flush(&mut self) -> X11Result<()> {
        self.connection.flush()?;
        Ok(())
    }
}
