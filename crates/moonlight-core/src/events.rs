//! Host-facing event subscriptions.

use crate::interaction::ToolMode;
use crate::shapes::ElementId;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The scene changed (any command, undo, redo, import or clear).
    Change,
    /// The selection changed and is not empty; carries the new selection.
    Select(Vec<ElementId>),
    /// The selection became empty; carries what was selected before.
    Deselect(Vec<ElementId>),
    Focus,
    Blur,
    ModeChange(ToolMode),
    ElementAdd(Vec<ElementId>),
    ElementDelete(Vec<ElementId>),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Change => EventKind::Change,
            Event::Select(_) => EventKind::Select,
            Event::Deselect(_) => EventKind::Deselect,
            Event::Focus => EventKind::Focus,
            Event::Blur => EventKind::Blur,
            Event::ModeChange(_) => EventKind::ModeChange,
            Event::ElementAdd(_) => EventKind::ElementAdd,
            Event::ElementDelete(_) => EventKind::ElementDelete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Select,
    Deselect,
    Focus,
    Blur,
    ModeChange,
    ElementAdd,
    ElementDelete,
}

type Callback = Rc<dyn Fn(&Event)>;

struct Listener {
    id: u64,
    kind: EventKind,
    callback: Callback,
}

type Listeners = RefCell<Vec<Listener>>;

/// Listener registry owned by one engine.
#[derive(Default)]
pub struct EventBus {
    listeners: Rc<Listeners>,
    next_id: Cell<u64>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, callback: impl Fn(&Event) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            kind,
            callback: Rc::new(callback),
        });
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every listener of its kind.
    ///
    /// Listeners are snapshotted first, so a callback may subscribe or
    /// unsubscribe without affecting this delivery.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        let callbacks: Vec<Callback> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Rc::clone(&l.callback))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

/// Handle returned by a subscription. Dropping it keeps the listener.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Detach the listener. Returns false if it was already gone (or the
    /// engine was destroyed).
    pub fn unsubscribe(&self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != self.id);
        listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_matching_kind_only() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(EventKind::Select, move |e| sink.borrow_mut().push(e.clone()));

        bus.emit(&Event::Change);
        bus.emit(&Event::Select(vec![ElementId::from("el-1")]));
        assert_eq!(
            *seen.borrow(),
            vec![Event::Select(vec![ElementId::from("el-1")])]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let sub = bus.subscribe(EventKind::Change, move |_| counter.set(counter.get() + 1));

        bus.emit(&Event::Change);
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        bus.emit(&Event::Change);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_unsubscribe_inside_callback() {
        let bus = EventBus::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let inner = Rc::clone(&slot);
        let sub = bus.subscribe(EventKind::Blur, move |_| {
            if let Some(sub) = inner.borrow().as_ref() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(sub);

        bus.emit(&Event::Blur);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::Focus, |_| {});
        drop(bus);
        assert!(!sub.unsubscribe());
    }
}
