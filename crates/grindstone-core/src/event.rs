//! Typed events, buffered per kind and delivered in batch.
//!
//! Components record events into pending queues during a step; the engine
//! pumps them into the [`EventBus`] and delivers them in batch during the
//! post phase. Each event kind has its own fixed-capacity [`EventBuffer`]
//! ring. Delivery is exactly-once per event per subscriber.
//!
//! Subscribers are read-only listeners (UI refresh, logging, analytics);
//! they observe state through event payloads plus the engine's query
//! methods and must not re-enter the engine during a callback.
//!
//! A kind can be suppressed via [`EventBus::suppress`]; suppressed kinds
//! are never recorded and hold no buffer.

use crate::fixed::{Fixed64, Ticks};
use crate::overlay::Panel;
use crate::research::{EffectKind, ResearchId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. Every variant carries the tick it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Overlay --
    PanelOpened {
        panel: Panel,
        tick: Ticks,
    },
    PanelClosed {
        panel: Panel,
        tick: Ticks,
    },

    // -- Research --
    /// The point balance changed; carries the post-change value.
    PointsChanged {
        balance: Fixed64,
        tick: Ticks,
    },
    NodeUnlocked {
        id: ResearchId,
        key: String,
        tick: Ticks,
    },

    // -- Progression --
    XpGained {
        amount: Fixed64,
        total: Fixed64,
        tick: Ticks,
    },
    LevelUp {
        level: u32,
        threshold: Fixed64,
        tick: Ticks,
    },

    // -- Player --
    EffectApplied {
        id: ResearchId,
        effect: EffectKind,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PanelOpened,
    PanelClosed,
    PointsChanged,
    NodeUnlocked,
    XpGained,
    LevelUp,
    EffectApplied,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 7;

impl Event {
    /// The discriminant tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PanelOpened { .. } => EventKind::PanelOpened,
            Event::PanelClosed { .. } => EventKind::PanelClosed,
            Event::PointsChanged { .. } => EventKind::PointsChanged,
            Event::NodeUnlocked { .. } => EventKind::NodeUnlocked,
            Event::XpGained { .. } => EventKind::XpGained,
            Event::LevelUp { .. } => EventKind::LevelUp,
            Event::EffectApplied { .. } => EventKind::EffectApplied,
        }
    }
}

impl EventKind {
    /// Every event kind, in buffer index order.
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::PanelOpened,
        EventKind::PanelClosed,
        EventKind::PointsChanged,
        EventKind::NodeUnlocked,
        EventKind::XpGained,
        EventKind::LevelUp,
        EventKind::EffectApplied,
    ];

    /// Position of this kind in the per-kind arrays.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Fixed-capacity event ring. Storage is allocated once up front; writing
/// past capacity overwrites the oldest entry.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Next write slot, wrapping at capacity.
    head: usize,
    /// Events currently held, at most capacity.
    len: usize,
    /// Lifetime write count, dropped events included.
    total_written: u64,
}

impl EventBuffer {
    /// Allocate a ring of the given capacity. Zero is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Write an event, dropping the oldest entry when the ring is full.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Events currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lifetime write count, dropped events included.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// How many writes were lost to overwrites.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // Once wrapped, head is both the next write slot and the oldest
            // entry.
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Drop all held events. The lifetime write count is untouched.
    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Oldest-to-newest walk over an [`EventBuffer`].
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Delivery ordering for subscribers. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

/// Per-subscriber predicate; events it rejects are skipped for that
/// subscriber only.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// A registered [`Listener`] with its priority, filter, and tie-break order.
struct SubscriberEntry {
    listener: Listener,
    priority: SubscriberPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("listener", &"<fn>")
            .field("priority", &self.priority)
            .field(
                "filter",
                &if self.filter.is_some() {
                    "Some(<fn>)"
                } else {
                    "None"
                },
            )
            .field("insertion_order", &self.insertion_order)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The event bus: one ring per kind, subscriber lists, suppression flags.
/// Owned by the engine instance; nothing here is global.
pub struct EventBus {
    /// Rings allocated lazily on first emit of each kind.
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],

    suppressed: [bool; EVENT_KIND_COUNT],

    /// Subscribers, indexed by kind.
    subscribers: [Vec<SubscriberEntry>; EVENT_KIND_COUNT],

    /// Ring capacity used when a kind's buffer is first allocated.
    default_capacity: usize,

    /// Monotonic counter; breaks ties between equal-priority subscribers.
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

const fn empty_subscriber_array() -> [Vec<SubscriberEntry>; EVENT_KIND_COUNT] {
    // Default is not const, so the array is spelled out.
    [
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ]
}

impl EventBus {
    /// Bus whose rings allocate at `default_capacity` entries per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            subscribers: empty_subscriber_array(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Suppress a kind: its events are discarded at emit and its ring is
    /// released.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Record an event into its kind's ring. A suppressed kind discards the
    /// event without touching storage.
    pub fn emit(&mut self, event: Event) {
        let kind = event.kind();
        let idx = kind.index();

        if self.suppressed[idx] {
            return;
        }

        let buffer = self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(self.default_capacity));
        buffer.push(event);
    }

    /// Register a listener for an event kind. Listeners are called in
    /// registration order during delivery with Normal priority and no filter.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.on_filtered(kind, SubscriberPriority::Normal, None, listener);
    }

    /// Register a listener with explicit priority and optional filter.
    pub fn on_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: Listener,
    ) {
        let order = self.next_insertion_order;
        self.next_insertion_order += 1;
        self.subscribers[kind.index()].push(SubscriberEntry {
            listener,
            priority,
            filter,
            insertion_order: order,
        });
    }

    /// Drain every ring to its subscribers. The engine calls this once per
    /// step, in the post phase.
    ///
    /// Per kind with buffered events: subscribers run in
    /// `(priority, insertion_order)` order, each seeing the batch oldest to
    /// newest with its own filter applied, and the ring is cleared after.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            if self.suppressed[idx] {
                continue;
            }

            let Some(buffer) = self.buffers[idx].as_ref() else {
                continue;
            };

            if buffer.is_empty() {
                continue;
            }

            // The batch is detached from the ring so the listener loop holds
            // no borrow into the buffer array.
            let events: Vec<Event> = buffer.iter().cloned().collect();

            self.subscribers[idx]
                .sort_by_key(|entry| (entry.priority as u8, entry.insertion_order));

            for entry in &mut self.subscribers[idx] {
                for event in &events {
                    if let Some(ref filter) = entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }

            if let Some(buffer) = self.buffers[idx].as_mut() {
                buffer.clear();
            }
        }
    }

    /// Read-only view of a kind's ring. `None` until the first emit.
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Lifetime emit count for a kind, dropped events included.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }

    /// Drop all buffered events. Subscribers and suppression flags stay.
    pub fn clear_all(&mut self) {
        for buffer in &mut self.buffers {
            if let Some(b) = buffer.as_mut() {
                b.clear();
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
