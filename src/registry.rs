use x11rb::protocol::xproto::Window;

/// Direction of a window switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Ordered collection of managed windows. The front of the list is the most
/// recently mapped window; `current` indexes the visible one.
///
/// Invariants: no duplicate identifiers, and `current` is a valid position
/// whenever the registry is non-empty.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: Vec<Window>,
    current: usize,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `window` at the front and makes it current, unless it is
    /// already registered. Returns whether the window was inserted, so repeat
    /// map requests for the same identifier stay idempotent.
    pub fn register_if_absent(&mut self, window: Window) -> bool {
        if self.windows.contains(&window) {
            return false;
        }
        self.windows.insert(0, window);
        self.current = 0;
        true
    }

    /// Moves `current` one step with wraparound in both directions. No-op on
    /// an empty registry.
    pub fn advance(&mut self, direction: Direction) {
        if self.windows.is_empty() {
            return;
        }
        self.current = match direction {
            Direction::Next => (self.current + 1) % self.windows.len(),
            Direction::Previous => {
                (self.current + self.windows.len() - 1) % self.windows.len()
            }
        };
    }

    pub fn current(&self) -> Option<Window> {
        self.windows.get(self.current).copied()
    }

    /// Removes a window, keeping `current` on a valid position. Removing an
    /// entry in front of the current one shifts the index down; removing the
    /// current entry makes the next older window current (clamped to the last
    /// position when the oldest one goes away). Returns whether the window
    /// was registered.
    pub fn remove(&mut self, window: Window) -> bool {
        let Some(position) = self.windows.iter().position(|&w| w == window) else {
            return false;
        };
        self.windows.remove(position);
        if position < self.current {
            self.current -= 1;
        }
        if !self.windows.is_empty() && self.current >= self.windows.len() {
            self.current = self.windows.len() - 1;
        }
        true
    }

    pub fn contains(&self, window: Window) -> bool {
        self.windows.contains(&window)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Registered windows, most recently mapped first.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }
}
