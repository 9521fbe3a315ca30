use std::collections::HashSet;

use tracing::{debug, info, warn};
use x11rb::protocol::xproto::{
    ConfigWindow, ConfigureRequestEvent, ConfigureWindowAux, KeyButMask, Keycode, Window,
};

use crate::Config;
use crate::errors::{WmError, X11Error};
use crate::exec::{CommandSpawner, Spawner};
use crate::keyboard::BindingTable;
use crate::registry::{Direction, WindowRegistry};
use crate::x11::{XConn, XEvent};

/// Lifecycle of the dispatcher. Construction covers the step from
/// "uninitialized" to `Acquiring` (connection up, root known); `run` moves
/// through `Running` and ends in `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Acquiring,
    Running,
    Terminated,
}

type WmResult<T> = Result<T, WmError>;

/// The main control loop: acquires management rights, grabs the configured
/// key combinations, then routes protocol events until the process dies.
pub struct WindowManager<C: XConn, S: Spawner = CommandSpawner> {
    conn: C,
    spawner: S,
    config: Config,
    registry: WindowRegistry,
    bindings: BindingTable,
    screen_width: u16,
    screen_height: u16,
    /// Windows this manager unmapped itself while navigating. Their
    /// UnmapNotify must not be mistaken for a client withdrawal.
    hidden: HashSet<Window>,
    state: RunState,
}

impl<C: XConn> WindowManager<C> {
    pub fn new(conn: C, config: Config) -> Self {
        Self::with_spawner(conn, CommandSpawner, config)
    }
}

impl<C: XConn, S: Spawner> WindowManager<C, S> {
    pub fn with_spawner(conn: C, spawner: S, config: Config) -> Self {
        let (screen_width, screen_height) = conn.screen_size();
        Self {
            conn,
            spawner,
            config,
            registry: WindowRegistry::new(),
            bindings: BindingTable::default(),
            screen_width,
            screen_height,
            hidden: HashSet::new(),
            state: RunState::Acquiring,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Acquires management rights and runs the event loop. Returns only on a
    /// fatal error; a healthy manager runs until the process is killed.
    pub fn run(&mut self) -> WmResult<()> {
        let result = match self.acquire() {
            Ok(()) => self.event_loop(),
            Err(err) => Err(err),
        };
        self.state = RunState::Terminated;
        result
    }

    /// `Acquiring` phase: one checked request for substructure redirection,
    /// then binding resolution, key grabs, and adoption of pre-existing
    /// windows.
    fn acquire(&mut self) -> WmResult<()> {
        self.conn.acquire_redirect()?;
        info!("acquired substructure redirection on the root window");

        let mapping = self.conn.keyboard_mapping()?;
        self.bindings =
            BindingTable::resolve(&self.config.bindings, self.config.modifier, &mapping)?;

        let combinations: Vec<(u16, Keycode)> = self
            .bindings
            .bindings()
            .iter()
            .map(|binding| (binding.modifiers, binding.keycode))
            .collect();
        for (modifiers, keycode) in combinations {
            // A combination another client already grabbed is skipped rather
            // than aborting the whole manager.
            if let Err(err) = self.conn.grab_key(modifiers, keycode) {
                warn!(keycode, modifiers, error = %err, "could not grab key, skipping binding");
            }
        }

        self.adopt_existing_windows()?;
        self.conn.flush()?;
        self.state = RunState::Running;
        Ok(())
    }

    fn event_loop(&mut self) -> WmResult<()> {
        info!("entering the event loop");
        loop {
            let event = self.conn.wait_for_event()?;
            self.handle_event(event)?;
            // Everything issued while handling the event leaves the process
            // before the next blocking wait.
            self.conn.flush()?;
        }
    }

    fn handle_event(&mut self, event: XEvent) -> Result<(), X11Error> {
        match event {
            XEvent::KeyPress { keycode, state } => self.handle_key_press(keycode, state),
            XEvent::MapRequest { window } => self.handle_map_request(window),
            XEvent::ConfigureRequest(event) => self.handle_configure_request(&event),
            XEvent::Unmapped { window } => self.handle_unmapped(window),
            XEvent::Destroyed { window } => self.handle_destroyed(window),
            XEvent::Other => Ok(()),
        }
    }

    fn handle_key_press(&mut self, keycode: Keycode, state: KeyButMask) -> Result<(), X11Error> {
        let Some(binding) = self.bindings.lookup(state, keycode) else {
            debug!(keycode, state = u16::from(state), "key press without a matching binding");
            return Ok(());
        };
        let command = binding.command.clone();
        let navigate = binding.navigate;

        // A binding carrying both effects runs the command first, then the
        // window switch.
        if let Some(argv) = &command {
            self.spawner.spawn(argv);
        }
        if let Some(direction) = navigate {
            self.navigate(direction)?;
        }
        Ok(())
    }

    /// Advances the registry and swaps the visible window: unmap the old
    /// current, map the new one. No-op when nothing is managed or when the
    /// ring has a single window and the switch lands back on it.
    fn navigate(&mut self, direction: Direction) -> Result<(), X11Error> {
        let Some(previous) = self.registry.current() else {
            return Ok(());
        };
        self.registry.advance(direction);
        let Some(current) = self.registry.current() else {
            return Ok(());
        };
        if current == previous {
            // Unmapping and remapping the same window would leave a
            // UnmapNotify in flight with no hidden-set entry to match it,
            // and the registry would treat it as a withdrawal.
            return Ok(());
        }

        self.conn.unmap_window(previous)?;
        self.hidden.insert(previous);
        self.conn.map_window(current)?;
        self.hidden.remove(&current);
        debug!(
            from = format_args!("0x{previous:x}"),
            to = format_args!("0x{current:x}"),
            "switched window"
        );
        Ok(())
    }

    fn handle_map_request(&mut self, window: Window) -> Result<(), X11Error> {
        let override_redirect = match self.conn.override_redirect(window) {
            Ok(flag) => flag,
            Err(err) => {
                // The window can vanish between the request and our round
                // trip; skip the event rather than bringing the loop down.
                debug!(window, error = %err, "attribute fetch failed, ignoring map request");
                return Ok(());
            }
        };
        if override_redirect {
            debug!(
                window = format_args!("0x{window:x}"),
                "override-redirect window places itself, ignoring"
            );
            return Ok(());
        }
        info!(window = format_args!("0x{window:x}"), "managing window");
        self.manage(window)
    }

    /// Maps a window, forces full-screen geometry, and registers it as the
    /// new current window.
    fn manage(&mut self, window: Window) -> Result<(), X11Error> {
        self.conn.map_window(window)?;
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(0)
                .y(0)
                .width(u32::from(self.screen_width))
                .height(u32::from(self.screen_height)),
        )?;
        self.registry.register_if_absent(window);
        self.hidden.remove(&window);
        Ok(())
    }

    /// Forwards a client's configure request untouched. Forced placement
    /// applies only at initial map time; a mapped client may reconfigure
    /// itself however it likes.
    fn handle_configure_request(
        &mut self,
        event: &ConfigureRequestEvent,
    ) -> Result<(), X11Error> {
        let mut aux = ConfigureWindowAux::new();
        if event.value_mask.contains(ConfigWindow::X) {
            aux = aux.x(i32::from(event.x));
        }
        if event.value_mask.contains(ConfigWindow::Y) {
            aux = aux.y(i32::from(event.y));
        }
        if event.value_mask.contains(ConfigWindow::WIDTH) {
            aux = aux.width(u32::from(event.width));
        }
        if event.value_mask.contains(ConfigWindow::HEIGHT) {
            aux = aux.height(u32::from(event.height));
        }
        if event.value_mask.contains(ConfigWindow::BORDER_WIDTH) {
            aux = aux.border_width(u32::from(event.border_width));
        }
        if event.value_mask.contains(ConfigWindow::SIBLING) {
            aux = aux.sibling(event.sibling);
        }
        if event.value_mask.contains(ConfigWindow::STACK_MODE) {
            aux = aux.stack_mode(event.stack_mode);
        }
        self.conn.configure_window(event.window, &aux)
    }

    fn handle_unmapped(&mut self, window: Window) -> Result<(), X11Error> {
        if self.hidden.contains(&window) {
            // Our own unmap from a navigation, not a withdrawal.
            return Ok(());
        }
        self.forget(window)
    }

    fn handle_destroyed(&mut self, window: Window) -> Result<(), X11Error> {
        self.hidden.remove(&window);
        self.forget(window)
    }

    /// Drops a withdrawn or destroyed window from the registry. When it was
    /// the visible one, the new current window is mapped so the display is
    /// not left empty.
    fn forget(&mut self, window: Window) -> Result<(), X11Error> {
        let was_current = self.registry.current() == Some(window);
        if !self.registry.remove(window) {
            return Ok(());
        }
        info!(window = format_args!("0x{window:x}"), "unmanaging window");
        if was_current && let Some(current) = self.registry.current() {
            self.hidden.remove(&current);
            self.conn.map_window(current)?;
        }
        Ok(())
    }

    fn adopt_existing_windows(&mut self) -> Result<(), X11Error> {
        for window in self.conn.viewable_children()? {
            info!(
                window = format_args!("0x{window:x}"),
                "adopting window that existed before startup"
            );
            self.manage(window)?;
        }
        Ok(())
    }
}
