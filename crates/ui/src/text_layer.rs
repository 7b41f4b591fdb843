//! Text-layer selection registry
//!
//! Tracks which mounted text layers are taking part in a text selection so
//! the host can switch them into "selecting" mode. One registry is owned by
//! each viewer; the shared event listeners are installed while at least one
//! layer is registered and removed with the last registration.

use crate::events::{EventHub, EventKind, Key, Subscription, ViewerEvent};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct LayerEntry {
    registrations: usize,
    selecting: bool,
}

#[derive(Debug, Default)]
struct SelectionTracking {
    layers: BTreeMap<u32, LayerEntry>,
    pointer_down: bool,
}

impl SelectionTracking {
    fn reset(&mut self) {
        for layer in self.layers.values_mut() {
            layer.selecting = false;
        }
    }

    fn handle(&mut self, event: &ViewerEvent) {
        match event {
            ViewerEvent::PointerDown { page_number, .. } => {
                self.pointer_down = true;
                if let Some(layer) = page_number.and_then(|page| self.layers.get_mut(&page)) {
                    layer.selecting = true;
                }
            }
            ViewerEvent::SelectionChange { pages } => {
                if pages.is_empty() {
                    self.reset();
                    return;
                }
                for (page, layer) in self.layers.iter_mut() {
                    layer.selecting = pages.contains(page);
                }
            }
            ViewerEvent::PointerUp | ViewerEvent::Blur => {
                self.pointer_down = false;
                self.reset();
            }
            ViewerEvent::KeyUp(_) if !self.pointer_down => self.reset(),
            _ => {}
        }
    }
}

#[derive(Debug)]
struct RegistryState {
    tracking: Rc<RefCell<SelectionTracking>>,
    listeners: Vec<Subscription>,
}

/// Reference-counted registry of mounted text layers
#[derive(Debug, Clone)]
pub struct TextLayerRegistry {
    events: EventHub,
    state: Rc<RefCell<RegistryState>>,
}

impl TextLayerRegistry {
    pub fn new(events: EventHub) -> Self {
        Self {
            events,
            state: Rc::new(RefCell::new(RegistryState {
                tracking: Rc::new(RefCell::new(SelectionTracking::default())),
                listeners: Vec::new(),
            })),
        }
    }

    /// Register the text layer of `page_number`
    ///
    /// The layer stays registered until every returned registration is
    /// dropped.
    #[must_use = "dropping the registration unregisters the layer"]
    pub fn register(&self, page_number: u32) -> TextLayerRegistration {
        let mut state = self.state.borrow_mut();
        let was_empty = state.tracking.borrow().layers.is_empty();
        state
            .tracking
            .borrow_mut()
            .layers
            .entry(page_number)
            .or_default()
            .registrations += 1;

        if was_empty {
            state.listeners = install_listeners(&self.events, &state.tracking);
            log::debug!("text layer listeners installed");
        }

        TextLayerRegistration {
            registry: Rc::downgrade(&self.state),
            page_number,
        }
    }

    pub fn is_selecting(&self, page_number: u32) -> bool {
        let state = self.state.borrow();
        let tracking = state.tracking.borrow();
        tracking.layers.get(&page_number).is_some_and(|layer| layer.selecting)
    }

    /// Pages currently in selecting mode, ascending
    pub fn selecting_pages(&self) -> Vec<u32> {
        let state = self.state.borrow();
        let tracking = state.tracking.borrow();
        tracking
            .layers
            .iter()
            .filter(|(_, layer)| layer.selecting)
            .map(|(page, _)| *page)
            .collect()
    }

    pub fn registered_pages(&self) -> Vec<u32> {
        self.state
            .borrow()
            .tracking
            .borrow()
            .layers
            .keys()
            .copied()
            .collect()
    }

    pub fn is_pointer_down(&self) -> bool {
        self.state.borrow().tracking.borrow().pointer_down
    }

    /// Whether the shared listeners are installed
    pub fn is_listening(&self) -> bool {
        !self.state.borrow().listeners.is_empty()
    }
}

fn install_listeners(
    events: &EventHub,
    tracking: &Rc<RefCell<SelectionTracking>>,
) -> Vec<Subscription> {
    [
        EventKind::PointerDown,
        EventKind::PointerUp,
        EventKind::SelectionChange,
        EventKind::Blur,
        EventKind::KeyUp,
    ]
    .into_iter()
    .map(|kind| {
        let tracking = Rc::downgrade(tracking);
        events.listen(kind, move |event| {
            if let Some(tracking) = tracking.upgrade() {
                tracking.borrow_mut().handle(event);
            }
        })
    })
    .collect()
}

/// Disposer for one text-layer registration
#[derive(Debug)]
pub struct TextLayerRegistration {
    registry: Weak<RefCell<RegistryState>>,
    page_number: u32,
}

impl TextLayerRegistration {
    pub fn page_number(&self) -> u32 {
        self.page_number
    }
}

impl Drop for TextLayerRegistration {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let released = {
            let state = registry.borrow();
            let mut tracking = state.tracking.borrow_mut();
            if let Some(layer) = tracking.layers.get_mut(&self.page_number) {
                layer.registrations = layer.registrations.saturating_sub(1);
                if layer.registrations == 0 {
                    tracking.layers.remove(&self.page_number);
                }
            }
            if tracking.layers.is_empty() {
                tracking.pointer_down = false;
                true
            } else {
                false
            }
        };

        if released {
            let listeners = std::mem::take(&mut registry.borrow_mut().listeners);
            drop(listeners);
            log::debug!("text layer listeners removed");
        }
    }
}
