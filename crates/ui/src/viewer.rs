//! Viewer
//!
//! Wires the annotation layer for one document: shared zoom and viewport
//! container, event hub and frame scheduler, text-layer registry, annotation
//! store, selection resolver, persistence sink, and one tooltip per mounted
//! annotation.

use crate::events::{EventHub, ViewerEvent};
use crate::placement::{DismissEvent, TooltipOptions};
use crate::text_layer::TextLayerRegistry;
use crate::tooltip::{AnnotationTooltip, TooltipContext};
use crate::viewport::{ContainerSlot, ViewportContainer};
use chrono::{DateTime, Utc};
use pdf_annotator_core::{
    load_or_default, save_best_effort, AnnotationDraft, AnnotationId, AnnotationSink,
    AnnotationStore, AnnotationUpdate, ResolverConfig, SelectionResolver, SelectionSource,
    TextLayerLocator, ZoomOptions, ZoomState,
};
use pdf_annotator_scheduler::{FrameScheduler, FrameStats};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// Viewer construction options
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    pub resolver: ResolverConfig,
    pub zoom: ZoomOptions,
    pub tooltip: TooltipOptions,
}

/// Annotation layer of one open document
pub struct Viewer {
    context: TooltipContext,
    registry: TextLayerRegistry,
    resolver: SelectionResolver,
    store: AnnotationStore,
    sink: Box<dyn AnnotationSink>,
    tooltips: HashMap<AnnotationId, AnnotationTooltip>,
}

impl Viewer {
    pub fn new(config: ViewerConfig, sink: Box<dyn AnnotationSink>) -> Self {
        let events = EventHub::new();
        let context = TooltipContext {
            zoom: Rc::new(RefCell::new(ZoomState::new(1.0, config.zoom))),
            container: ContainerSlot::default(),
            events: events.clone(),
            frames: Rc::new(FrameScheduler::new()),
            options: config.tooltip,
        };

        Self {
            context,
            registry: TextLayerRegistry::new(events),
            resolver: SelectionResolver::new(config.resolver),
            store: AnnotationStore::new(),
            sink,
            tooltips: HashMap::new(),
        }
    }

    /// Attach the viewport container
    pub fn with_container(self, container: Rc<dyn ViewportContainer>) -> Self {
        self.context.container.set(Some(container));
        self
    }

    /// Attach, swap or detach the viewport container. Every tooltip shares
    /// the slot; open ones re-anchor on the next frame.
    pub fn set_container(&self, container: Option<Rc<dyn ViewportContainer>>) {
        self.context.container.set(container);
        self.context.events.emit(&ViewerEvent::Resize);
    }

    pub fn events(&self) -> &EventHub {
        &self.context.events
    }

    pub fn frames(&self) -> &FrameScheduler {
        &self.context.frames
    }

    pub fn registry(&self) -> &TextLayerRegistry {
        &self.registry
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn resolver(&self) -> &SelectionResolver {
        &self.resolver
    }

    /// Shared zoom state
    ///
    /// Changing it through this handle does not notify open tooltips; emit
    /// [`ViewerEvent::ZoomChange`] afterwards or use [`Viewer::set_zoom`].
    pub fn zoom(&self) -> Rc<RefCell<ZoomState>> {
        Rc::clone(&self.context.zoom)
    }

    pub fn current_zoom(&self) -> f32 {
        self.context.zoom.borrow().current()
    }

    /// Set the live zoom. Open tooltips re-anchor on the next frame.
    pub fn set_zoom(&self, zoom: f32) -> f32 {
        let previous = self.current_zoom();
        let zoom = self.context.zoom.borrow_mut().set(zoom, Instant::now());
        if zoom != previous {
            self.context.events.emit(&ViewerEvent::ZoomChange { zoom });
        }
        zoom
    }

    /// Replace the store contents with the persisted list. Returns the count.
    pub fn restore(&mut self) -> usize {
        self.tooltips.clear();
        self.store.set_all(load_or_default(self.sink.as_ref()));
        log::debug!("restored {} annotations", self.store.len());
        self.store.len()
    }

    /// Resolve the active selection into one annotation per covered page
    ///
    /// New annotations are persisted and get an open tooltip. Returns the
    /// new ids; empty when there is nothing selected.
    pub fn create_annotation_from_selection(
        &mut self,
        source: &dyn SelectionSource,
        layers: &dyn TextLayerLocator,
    ) -> Vec<AnnotationId> {
        self.create_annotation_from_selection_at(source, layers, Utc::now())
    }

    pub fn create_annotation_from_selection_at(
        &mut self,
        source: &dyn SelectionSource,
        layers: &dyn TextLayerLocator,
        now: DateTime<Utc>,
    ) -> Vec<AnnotationId> {
        let Some(selection) = self.resolver.resolve(source, layers, self.current_zoom()) else {
            return Vec::new();
        };

        let ids: Vec<AnnotationId> = AnnotationDraft::from_selection(&selection)
            .into_iter()
            .filter_map(|draft| self.store.add_at(draft, now).ok())
            .collect();
        if ids.is_empty() {
            return ids;
        }

        self.persist();
        for id in &ids {
            self.mount_tooltip(*id, now);
        }
        ids
    }

    /// Store a draft directly, e.g. from a comment form
    pub fn add_annotation(&mut self, draft: AnnotationDraft) -> Option<AnnotationId> {
        let now = Utc::now();
        let id = self.store.add_at(draft, now).ok()?;
        self.persist();
        self.mount_tooltip(id, now);
        Some(id)
    }

    pub fn update_annotation(&mut self, id: AnnotationId, update: AnnotationUpdate) -> bool {
        let updated = self.store.update(id, update);
        if updated {
            self.persist();
        }
        updated
    }

    pub fn delete_annotation(&mut self, id: AnnotationId) -> bool {
        self.tooltips.remove(&id);
        let deleted = self.store.delete(id).is_some();
        if deleted {
            self.persist();
        }
        deleted
    }

    /// Replace a page's annotations with embedded PDF annotation rectangles
    pub fn import_page_annotations(
        &mut self,
        page_number: u32,
        rects: &[[f32; 4]],
    ) -> Vec<AnnotationId> {
        self.unmount_tooltips_for_page(page_number);
        let ids = self.store.import_page_annotations(page_number, rects);
        self.persist();
        ids
    }

    pub fn tooltip(&self, id: AnnotationId) -> Option<&AnnotationTooltip> {
        self.tooltips.get(&id)
    }

    pub fn tooltip_mut(&mut self, id: AnnotationId) -> Option<&mut AnnotationTooltip> {
        self.tooltips.get_mut(&id)
    }

    /// Mount tooltips for every annotation of a page that has none yet.
    /// Returns how many were mounted.
    pub fn mount_tooltips_for_page(&mut self, page_number: u32) -> usize {
        let now = Utc::now();
        let ids: Vec<AnnotationId> = self
            .store
            .for_page(page_number)
            .map(|annotation| annotation.id)
            .filter(|id| !self.tooltips.contains_key(id))
            .collect();
        for id in &ids {
            self.mount_tooltip(*id, now);
        }
        ids.len()
    }

    pub fn unmount_tooltips_for_page(&mut self, page_number: u32) -> usize {
        let before = self.tooltips.len();
        let store = &self.store;
        self.tooltips.retain(|id, _| {
            store
                .get(*id)
                .is_some_and(|annotation| annotation.page_number != page_number)
        });
        before - self.tooltips.len()
    }

    /// Feed a dismiss interaction to every open tooltip. Returns how many closed.
    pub fn dismiss(&mut self, event: DismissEvent) -> usize {
        self.tooltips
            .values_mut()
            .filter(|tooltip| tooltip.is_open())
            .map(|tooltip| usize::from(tooltip.handle_dismiss(&event)))
            .sum()
    }

    /// Run one display frame of coalesced recomputation
    pub fn run_frame(&self) -> FrameStats {
        self.context.frames.run_frame()
    }

    fn mount_tooltip(&mut self, id: AnnotationId, now: DateTime<Utc>) {
        if let Some(annotation) = self.store.get(id) {
            let tooltip = AnnotationTooltip::mount(annotation, self.context.clone(), now);
            self.tooltips.insert(id, tooltip);
        }
    }

    fn persist(&self) -> bool {
        save_best_effort(self.sink.as_ref(), self.store.as_slice())
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("annotations", &self.store.len())
            .field("tooltips", &self.tooltips.len())
            .field("context", &self.context)
            .finish()
    }
}
