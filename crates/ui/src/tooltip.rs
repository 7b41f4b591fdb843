//! Annotation tooltip
//!
//! One tooltip per annotation. While open it listens for scroll, resize and
//! zoom changes, coalesces recomputation to one per frame, and keeps its
//! anchor and floating position current. Closing drops the listeners and
//! retires the liveness guard, so a frame already requested becomes a no-op.

use crate::anchor::AnchorProvider;
use crate::events::{EventHub, EventKind, Subscription};
use crate::placement::{
    compute_placement, should_dismiss, DismissEvent, FloatingPosition, TooltipOptions,
};
use crate::viewport::{ClientRect, ContainerSlot};
use chrono::{DateTime, Utc};
use pdf_annotator_core::{Annotation, AnnotationId, Rect, Size, ZoomState};
use pdf_annotator_scheduler::{FrameKey, FrameScheduler, LivenessGuard, LivenessToken};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Default size assumed for the floating element until the host measures it
pub const DEFAULT_FLOATING_SIZE: Size = Size {
    width: 240.0,
    height: 80.0,
};

/// Shared, read-only inputs for every tooltip of one viewer
#[derive(Clone)]
pub struct TooltipContext {
    pub zoom: Rc<RefCell<ZoomState>>,
    pub container: ContainerSlot,
    pub events: EventHub,
    pub frames: Rc<FrameScheduler>,
    pub options: TooltipOptions,
}

impl std::fmt::Debug for TooltipContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TooltipContext")
            .field("zoom", &self.zoom.borrow().current())
            .field("has_container", &self.container.is_attached())
            .field("options", &self.options)
            .finish()
    }
}

/// Open/closed state of a tooltip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipPhase {
    Closed,
    Open,
}

#[derive(Debug)]
struct Layout {
    anchor: ClientRect,
    position: Option<FloatingPosition>,
    floating_size: Size,
    recomputations: u64,
}

impl Layout {
    fn recompute(&mut self, provider: &AnchorProvider, options: &TooltipOptions) {
        self.anchor = provider.client_rect();
        let viewport = provider
            .container()
            .map(|container| container.viewport_size())
            .unwrap_or_default();
        self.position = Some(compute_placement(
            &self.anchor,
            self.floating_size,
            viewport,
            options,
        ));
        self.recomputations += 1;
    }
}

/// Listeners and liveness of one open session; dropping it ends the session
struct OpenSession {
    _liveness: LivenessGuard,
    _listeners: Vec<Subscription>,
}

/// Floating tooltip bound to one annotation
pub struct AnnotationTooltip {
    annotation_id: AnnotationId,
    provider: Rc<AnchorProvider>,
    context: TooltipContext,
    frame_key: FrameKey,
    layout: Rc<RefCell<Layout>>,
    session: Option<OpenSession>,
}

impl AnnotationTooltip {
    /// Create a closed tooltip for `annotation`
    pub fn new(annotation: &Annotation, context: TooltipContext) -> Self {
        let provider = AnchorProvider::new(
            annotation,
            context.container.clone(),
            Rc::clone(&context.zoom),
        );
        let frame_key = context.frames.allocate_key();
        Self {
            annotation_id: annotation.id,
            provider: Rc::new(provider),
            context,
            frame_key,
            layout: Rc::new(RefCell::new(Layout {
                anchor: ClientRect::zero(),
                position: None,
                floating_size: DEFAULT_FLOATING_SIZE,
                recomputations: 0,
            })),
            session: None,
        }
    }

    /// Create a tooltip, opened when the annotation was created within the
    /// recency window before `now`
    pub fn mount(annotation: &Annotation, context: TooltipContext, now: DateTime<Utc>) -> Self {
        let window = chrono::Duration::from_std(context.options.recency_window)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let is_new = annotation.is_new_at(now, window);
        let mut tooltip = Self::new(annotation, context);
        if is_new {
            tooltip.open();
        }
        tooltip
    }

    pub fn annotation_id(&self) -> AnnotationId {
        self.annotation_id
    }

    pub fn phase(&self) -> TooltipPhase {
        if self.session.is_some() {
            TooltipPhase::Open
        } else {
            TooltipPhase::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Open and compute the anchor immediately. No-op when already open.
    pub fn open(&mut self) {
        if self.session.is_some() {
            return;
        }

        let liveness = LivenessGuard::new();
        let token = liveness.token();
        let listeners = [EventKind::Scroll, EventKind::Resize, EventKind::ZoomChange]
            .into_iter()
            .map(|kind| self.schedule_on(kind, &token))
            .collect();
        self.session = Some(OpenSession {
            _liveness: liveness,
            _listeners: listeners,
        });

        self.layout.borrow_mut().recompute(&self.provider, &self.context.options);
        log::trace!("tooltip for {} opened", self.annotation_id);
    }

    /// Close, removing listeners. A recomputation already requested for the
    /// next frame will not run.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            log::trace!("tooltip for {} closed", self.annotation_id);
        }
    }

    pub fn set_open(&mut self, open: bool) {
        if open {
            self.open();
        } else {
            self.close();
        }
    }

    /// Close when `event` dismisses this tooltip. Returns whether it closed.
    pub fn handle_dismiss(&mut self, event: &DismissEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        let floating = self.floating_rect();
        if should_dismiss(event, &self.anchor(), floating) {
            self.close();
            return true;
        }
        false
    }

    /// Measured size of the floating element; re-places it when open
    pub fn set_floating_size(&mut self, size: Size) {
        let mut layout = self.layout.borrow_mut();
        layout.floating_size = size;
        if self.session.is_some() {
            layout.recompute(&self.provider, &self.context.options);
        }
    }

    /// Anchor from the last recomputation
    pub fn anchor(&self) -> ClientRect {
        self.layout.borrow().anchor
    }

    /// Anchor computed right now, for reference-rect queries from the
    /// placement layer
    pub fn live_anchor(&self) -> ClientRect {
        self.provider.client_rect()
    }

    pub fn position(&self) -> Option<FloatingPosition> {
        self.layout.borrow().position
    }

    pub fn floating_rect(&self) -> Option<Rect> {
        let layout = self.layout.borrow();
        layout.position.map(|position| position.rect(layout.floating_size))
    }

    /// Number of anchor recomputations so far
    pub fn recompute_count(&self) -> u64 {
        self.layout.borrow().recomputations
    }

    pub fn frame_key(&self) -> FrameKey {
        self.frame_key
    }

    fn schedule_on(&self, kind: EventKind, liveness: &LivenessToken) -> Subscription {
        let frames: Weak<FrameScheduler> = Rc::downgrade(&self.context.frames);
        let layout = Rc::downgrade(&self.layout);
        let provider = Rc::downgrade(&self.provider);
        let options = self.context.options.clone();
        let liveness = liveness.clone();
        let key = self.frame_key;

        self.context.events.listen(kind, move |_| {
            let Some(frames) = frames.upgrade() else {
                return;
            };
            let layout = layout.clone();
            let provider = provider.clone();
            let options = options.clone();
            frames.request(key, &liveness, move || {
                if let (Some(layout), Some(provider)) = (layout.upgrade(), provider.upgrade()) {
                    layout.borrow_mut().recompute(&provider, &options);
                }
            });
        })
    }
}

impl Drop for AnnotationTooltip {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AnnotationTooltip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationTooltip")
            .field("annotation_id", &self.annotation_id)
            .field("phase", &self.phase())
            .field("anchor", &self.anchor())
            .finish()
    }
}
