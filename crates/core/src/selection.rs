//! Selection-to-highlight resolution
//!
//! Turns the live text selection into page-grouped, zoom-normalized,
//! consolidated highlight rectangles. The selection itself and the DOM
//! hit-testing are provided by the host through [`SelectionSource`] and
//! [`TextLayerLocator`].

use crate::config::ResolverConfig;
use crate::geometry::{CoordinateSpace, HighlightRect, PageFrame, Point, Rect, Size};
use std::collections::BTreeMap;

/// The first range of the active selection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionRange {
    /// Client rectangles of the range, in viewport pixels
    pub client_rects: Vec<Rect>,
    /// Raw text of the range
    pub text: String,
    /// Caret only, no extent
    pub is_collapsed: bool,
}

/// Provides the active text selection
pub trait SelectionSource {
    /// The first range of the current selection, `None` when nothing is selected
    fn active_range(&self) -> Option<SelectionRange>;
}

/// Result of hit-testing a viewport point against mounted text layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayerHit {
    /// Page number recovered from the text layer's page attribute
    pub page_number: u32,
    /// Viewport-space top-left corner of the text layer
    pub origin: Point,
}

/// Maps a viewport point to the text layer underneath it
pub trait TextLayerLocator {
    /// Nearest text-layer ancestor of the element at `point`
    fn text_layer_at(&self, point: Point) -> Option<TextLayerHit>;
}

/// Resolved selection, ready to become an annotation or a selection tooltip
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollapsibleSelection {
    /// Consolidated rectangles in document units, ascending by page number
    pub highlights: Vec<HighlightRect>,
    /// Trimmed selection text
    pub text: String,
    pub is_collapsed: bool,
}

impl CollapsibleSelection {
    /// Distinct page numbers covered, ascending
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.highlights.iter().map(|h| h.page_number).collect();
        pages.dedup();
        pages
    }

    pub fn highlights_for_page(&self, page_number: u32) -> impl Iterator<Item = &HighlightRect> {
        self.highlights.iter().filter(move |h| h.page_number == page_number)
    }
}

/// Resolves native selections into highlight rectangles
///
/// The configuration is fixed per resolver instance; call-time input is only
/// the selection, the text-layer lookup, and the current zoom.
#[derive(Debug, Clone, Default)]
pub struct SelectionResolver {
    config: ResolverConfig,
}

impl SelectionResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the active selection
    ///
    /// Returns `None` when there is no selection or it is collapsed. Pure
    /// read: the caller clears the native selection if it wants to.
    pub fn resolve(
        &self,
        source: &dyn SelectionSource,
        layers: &dyn TextLayerLocator,
        zoom: f32,
    ) -> Option<CollapsibleSelection> {
        let range = source.active_range()?;
        if range.is_collapsed {
            return None;
        }

        let mut by_page: BTreeMap<u32, Vec<HighlightRect>> = BTreeMap::new();
        let mut dropped = 0usize;

        for client_rect in &range.client_rects {
            if client_rect.is_degenerate(self.config.min_rect_size) {
                dropped += 1;
                continue;
            }

            match self.to_document_units(client_rect, layers, zoom) {
                Some(highlight) => {
                    let page = by_page.entry(highlight.page_number).or_default();
                    page.push(highlight);
                }
                None => dropped += 1,
            }
        }

        let mut highlights = Vec::new();
        for rects in by_page.values() {
            highlights.extend(self.config.consolidation.consolidate_highlights(rects));
        }
        highlights.sort_by_key(|h| h.page_number);

        log::debug!(
            "resolved selection: {} client rects, {} dropped, {} highlights on {} pages",
            range.client_rects.len(),
            dropped,
            highlights.len(),
            by_page.len()
        );

        Some(CollapsibleSelection {
            highlights,
            text: range.text.trim().to_string(),
            is_collapsed: false,
        })
    }

    fn to_document_units(
        &self,
        client_rect: &Rect,
        layers: &dyn TextLayerLocator,
        zoom: f32,
    ) -> Option<HighlightRect> {
        // Sample just inside the left edge at mid-height; the exact corner
        // often lands on the gap between spans.
        let sample = Point::new(
            client_rect.left + 1.0,
            client_rect.top + client_rect.height / 2.0,
        );
        let hit = layers.text_layer_at(sample)?;

        let frame = PageFrame::new(hit.origin, zoom, Size::default());
        let viewport = HighlightRect::new(
            hit.page_number,
            *client_rect,
            CoordinateSpace::ViewportPixels,
        );
        let mut document = viewport.to_space(CoordinateSpace::DocumentUnits, &frame);

        if let Some(max_line_height) = self.config.max_line_height {
            document.height = document.height.min(max_line_height);
        }
        Some(document)
    }
}
