use crate::event::{EventClass, InputEvent};
use std::collections::HashMap;

/// Trait for reacting to decoded input events.
pub trait InputListener: Send {
    fn on_input(&mut self, event: &InputEvent);
}

impl<F> InputListener for F
where
    F: FnMut(&InputEvent) + Send,
{
    fn on_input(&mut self, event: &InputEvent) {
        self(event)
    }
}

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    All,
    Gamepad,
    Mouse,
    KeyDown,
    KeyUp,
    Custom(fn(&InputEvent) -> bool),
}

impl EventFilter {
    /// Whether this filter can ever accept an event of `class`.
    /// `Custom` filters are assumed to.
    pub fn covers(&self, class: EventClass) -> bool {
        match self {
            EventFilter::All | EventFilter::Custom(_) => true,
            EventFilter::Gamepad => class == EventClass::Gamepad,
            EventFilter::Mouse => class == EventClass::Mouse,
            EventFilter::KeyDown => class == EventClass::KeyDown,
            EventFilter::KeyUp => class == EventClass::KeyUp,
        }
    }

    fn accepts(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::Custom(f) => f(event),
            other => other.covers(event.class()),
        }
    }
}

/// Metadata-wrapped listener with filters and control flags.
struct ListenerEntry {
    listener: Box<dyn InputListener>,
    enabled: bool,
    filter: EventFilter,
    tag: Option<String>, // Device interface path
}

#[derive(Default)]
pub struct InputEventBus {
    next_id: u64,
    listeners: HashMap<u64, ListenerEntry>,
}

impl InputEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with optional filtering and tag.
    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        tag: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
                tag,
            },
        );
        self.next_id += 1;
        id
    }

    /// Enables a previously registered listener.
    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Disables (mutes) a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    /// Unregisters a listener entirely. Returns whether it existed.
    pub fn remove_listener(&mut self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Drops every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Is any enabled listener interested in `class`?
    pub fn has_subscriber(&self, class: EventClass) -> bool {
        self.listeners
            .values()
            .any(|e| e.enabled && e.filter.covers(class))
    }

    /// Emits one event to all active and matching listeners.
    /// Returns how many listeners received it.
    pub fn emit(&mut self, event: &InputEvent) -> usize {
        let mut delivered = 0;
        for entry in self.listeners.values_mut() {
            if !entry.enabled {
                continue;
            }

            // If tagged, ensure this listener wants this event's device
            if let Some(ref wanted) = entry.tag {
                if event.device_name() != wanted {
                    continue;
                }
            }

            if entry.filter.accepts(event) {
                entry.listener.on_input(event);
                delivered += 1;
            }
        }
        delivered
    }
}
