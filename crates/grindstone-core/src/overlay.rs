//! Overlay panel state.
//!
//! Tracks which UI panels are open and which one is frontmost. At most one
//! panel is frontmost at a time; opening a panel closes every other panel
//! first. While any panel is open, gameplay input is blocked.
//!
//! The overlay is pure state. Presentation hosts mirror visibility changes
//! by implementing [`PanelSink`] and attaching it to the engine; the engine
//! applies open/close transitions to the sink while draining overlay events,
//! preserving close-then-open order.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::fixed::Ticks;

/// Total number of panels.
pub const PANEL_COUNT: usize = 5;

/// Panel opened by [`Overlay::escape`] when nothing is open.
pub const DEFAULT_PANEL: Panel = Panel::Settings;

/// A UI panel managed by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Research,
    Inventory,
    Settings,
    Facilities,
    Character,
}

impl Panel {
    /// Every panel, in index order.
    pub const ALL: [Panel; PANEL_COUNT] = [
        Panel::Research,
        Panel::Inventory,
        Panel::Settings,
        Panel::Facilities,
        Panel::Character,
    ];

    /// Stable index for hashing and array lookups.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Receives panel visibility changes mirrored out of the overlay.
///
/// Implementations must be idempotent: the same visibility may be applied
/// more than once across a session.
pub trait PanelSink {
    fn set_visible(&mut self, panel: Panel, visible: bool);
}

/// Open-panel state with a frontmost pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overlay {
    /// Frontmost panel, if any. Tracks the most recent open.
    current: Option<Panel>,
    /// Open panels in the order they were opened.
    open: Vec<Panel>,

    /// Events recorded this step, drained by the engine.
    #[serde(skip)]
    pending_events: Vec<Event>,
}

impl Overlay {
    pub fn new() -> Self {
        Self {
            current: None,
            open: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    /// Open a panel, closing every other open panel first.
    ///
    /// Emits `PanelClosed` for each panel closed (in the order they were
    /// opened), then `PanelOpened` for the target. Opening an already-open
    /// panel closes and reopens it.
    pub fn open(&mut self, panel: Panel, tick: Ticks) {
        self.close_all(tick);
        self.open.push(panel);
        self.current = Some(panel);
        self.pending_events.push(Event::PanelOpened { panel, tick });
    }

    /// Close a panel if it is open. No-ops otherwise.
    pub fn close(&mut self, panel: Panel, tick: Ticks) {
        let Some(pos) = self.open.iter().position(|&p| p == panel) else {
            return;
        };
        self.open.remove(pos);
        if self.current == Some(panel) {
            self.current = self.open.last().copied();
        }
        self.pending_events.push(Event::PanelClosed { panel, tick });
    }

    /// Close every open panel, oldest first.
    pub fn close_all(&mut self, tick: Ticks) {
        for panel in std::mem::take(&mut self.open) {
            self.pending_events.push(Event::PanelClosed { panel, tick });
        }
        self.current = None;
    }

    /// Close the panel if open, open it otherwise.
    pub fn toggle(&mut self, panel: Panel, tick: Ticks) {
        if self.open.contains(&panel) {
            self.close(panel, tick);
        } else {
            self.open(panel, tick);
        }
    }

    /// Dismiss-or-summon: closes everything if any panel is open, otherwise
    /// opens [`DEFAULT_PANEL`].
    pub fn escape(&mut self, tick: Ticks) {
        if self.is_open() {
            self.close_all(tick);
        } else {
            self.open(DEFAULT_PANEL, tick);
        }
    }

    /// Whether any panel is open.
    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// The frontmost panel, if any.
    pub fn current(&self) -> Option<Panel> {
        self.current
    }

    /// Whether gameplay input is blocked. True exactly while a panel is open.
    pub fn should_block_input(&self) -> bool {
        self.is_open()
    }

    /// Open panels in the order they were opened.
    pub fn open_panels(&self) -> &[Panel] {
        &self.open
    }

    /// Drain events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// Peek at pending events without draining.
    pub fn pending_events(&self) -> &[Event] {
        &self.pending_events
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
