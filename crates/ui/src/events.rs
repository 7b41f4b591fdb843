//! Viewer event hub
//!
//! Single-threaded listener registry standing in for DOM event listeners.
//! [`EventHub::listen`] returns a [`Subscription`]; dropping it removes the
//! listener, so teardown cannot forget a registration.

use pdf_annotator_core::Point;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Keys the annotation layer cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Events delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The viewport container scrolled
    Scroll,
    /// The window resized
    Resize,
    /// The live zoom changed to `zoom`
    ZoomChange { zoom: f32 },
    /// Pointer pressed at a viewport position, over the text layer of
    /// `page_number` if any
    PointerDown {
        position: Point,
        page_number: Option<u32>,
    },
    PointerUp,
    KeyUp(Key),
    Blur,
    /// The document selection changed; `pages` lists the text layers the
    /// selection now intersects (empty when the selection was cleared)
    SelectionChange { pages: Vec<u32> },
}

/// Discriminant of [`ViewerEvent`], used to pick listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Scroll,
    Resize,
    ZoomChange,
    PointerDown,
    PointerUp,
    KeyUp,
    Blur,
    SelectionChange,
}

impl ViewerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ViewerEvent::Scroll => EventKind::Scroll,
            ViewerEvent::Resize => EventKind::Resize,
            ViewerEvent::ZoomChange { .. } => EventKind::ZoomChange,
            ViewerEvent::PointerDown { .. } => EventKind::PointerDown,
            ViewerEvent::PointerUp => EventKind::PointerUp,
            ViewerEvent::KeyUp(_) => EventKind::KeyUp,
            ViewerEvent::Blur => EventKind::Blur,
            ViewerEvent::SelectionChange { .. } => EventKind::SelectionChange,
        }
    }
}

type Handler = Rc<RefCell<Box<dyn FnMut(&ViewerEvent)>>>;

#[derive(Default)]
struct HubState {
    next_id: u64,
    listeners: BTreeMap<u64, (EventKind, Handler)>,
}

/// Shared listener registry; clones refer to the same hub
#[derive(Clone, Default)]
pub struct EventHub {
    state: Rc<RefCell<HubState>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`
    #[must_use = "dropping the subscription removes the listener"]
    pub fn listen<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&ViewerEvent) + 'static,
    {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, (kind, Rc::new(RefCell::new(Box::new(handler)))));
        Subscription {
            hub: Rc::downgrade(&self.state),
            id,
        }
    }

    /// Deliver `event` to its listeners, in registration order
    ///
    /// Listeners may subscribe or unsubscribe while the event is delivered.
    /// A listener that re-enters itself through a nested emit is skipped for
    /// the nested event.
    pub fn emit(&self, event: &ViewerEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<(u64, Handler)> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, (listener_kind, _))| *listener_kind == kind)
            .map(|(id, (_, handler))| (*id, Rc::clone(handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            // removed by an earlier handler of this same event
            if !self.state.borrow().listeners.contains_key(&id) {
                continue;
            }
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    handler(event);
                    delivered += 1;
                }
                Err(_) => log::trace!("listener {} re-entered, skipping {:?}", id, kind),
            }
        }
        delivered
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.state
            .borrow()
            .listeners
            .values()
            .filter(|(listener_kind, _)| *listener_kind == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

/// Live listener registration
#[derive(Debug)]
pub struct Subscription {
    hub: Weak<RefCell<HubState>>,
    id: u64,
}

impl Subscription {
    /// Remove the listener now instead of at drop
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            // Dropped outside the borrow: the handler may own subscriptions.
            let removed = hub.borrow_mut().listeners.remove(&self.id);
            drop(removed);
        }
    }
}
