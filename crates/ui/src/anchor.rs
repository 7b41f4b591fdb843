//! Annotation anchor projection
//!
//! Projects an annotation's stored rectangles into current viewport pixels
//! and unions them into the rectangle a tooltip anchors to.

use crate::viewport::{ClientRect, ContainerSlot, ViewportContainer};
use pdf_annotator_core::{Annotation, CoordinateSpace, HighlightRect, PageFrame, Rect, ZoomState};
use std::cell::RefCell;
use std::rc::Rc;

/// Union of `highlights` projected at `zoom`, in viewport pixels
///
/// Falls back to [`ClientRect::zero`] when the container is unavailable, the
/// page is not mounted, or there is nothing to project.
pub fn compute_anchor(
    page_number: u32,
    highlights: &[HighlightRect],
    container: Option<&dyn ViewportContainer>,
    zoom: f32,
) -> ClientRect {
    let Some(container) = container else {
        return ClientRect::zero();
    };
    let Some(origin) = container.page_origin(page_number) else {
        return ClientRect::zero();
    };

    let page_size = container.page_size(page_number).unwrap_or_default();
    let frame = PageFrame::new(origin, zoom, page_size);
    let projected: Vec<Rect> = highlights
        .iter()
        .filter(|highlight| highlight.page_number == page_number)
        .map(|highlight| {
            highlight
                .to_space(CoordinateSpace::ViewportPixels, &frame)
                .rect()
        })
        .collect();

    Rect::union_all(&projected).map(ClientRect::from).unwrap_or_default()
}

/// Live anchor for one annotation
///
/// Holds the read-only inputs shared with every other tooltip of the viewer
/// and recomputes on every query, so it always reflects the live zoom and
/// the currently attached container.
#[derive(Clone)]
pub struct AnchorProvider {
    page_number: u32,
    highlights: Vec<HighlightRect>,
    container: ContainerSlot,
    zoom: Rc<RefCell<ZoomState>>,
}

impl AnchorProvider {
    pub fn new(
        annotation: &Annotation,
        container: ContainerSlot,
        zoom: Rc<RefCell<ZoomState>>,
    ) -> Self {
        Self {
            page_number: annotation.page_number,
            highlights: annotation.highlights.clone(),
            container,
            zoom,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn container(&self) -> Option<Rc<dyn ViewportContainer>> {
        self.container.get()
    }

    /// Current bounding client rectangle
    pub fn client_rect(&self) -> ClientRect {
        // live zoom, never the settled one
        let zoom = self.zoom.borrow().current();
        let container = self.container.get();
        compute_anchor(
            self.page_number,
            &self.highlights,
            container.as_deref(),
            zoom,
        )
    }
}

impl std::fmt::Debug for AnchorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorProvider")
            .field("page_number", &self.page_number)
            .field("highlights", &self.highlights.len())
            .field("has_container", &self.container.is_attached())
            .finish()
    }
}
