//! Floating placement and dismissal
//!
//! Positions a floating element (the tooltip) next to an anchor rectangle:
//! offset along the main axis, flip to the opposite side when the preferred
//! side overflows, then shift along the cross axis to stay inside the padded
//! viewport.

use crate::viewport::ClientRect;
use pdf_annotator_core::{Point, Rect, Size};
use std::time::Duration;

/// Gap between anchor and floating element
pub const DEFAULT_OFFSET: f32 = 10.0;

/// Minimum distance kept from the viewport edges
pub const DEFAULT_VIEWPORT_PADDING: f32 = 8.0;

/// Annotations younger than this open their tooltip on mount
pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_secs(1);

/// Side of the anchor the floating element sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

impl Placement {
    pub fn opposite(self) -> Self {
        match self {
            Placement::Top => Placement::Bottom,
            Placement::Bottom => Placement::Top,
            Placement::Left => Placement::Right,
            Placement::Right => Placement::Left,
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Placement::Top | Placement::Bottom)
    }
}

/// Tooltip behavior shared by every tooltip of a viewer
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipOptions {
    pub placement: Placement,
    pub offset: f32,
    pub viewport_padding: f32,
    pub recency_window: Duration,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            placement: Placement::Top,
            offset: DEFAULT_OFFSET,
            viewport_padding: DEFAULT_VIEWPORT_PADDING,
            recency_window: DEFAULT_RECENCY_WINDOW,
        }
    }
}

impl TooltipOptions {
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_viewport_padding(mut self, viewport_padding: f32) -> Self {
        self.viewport_padding = viewport_padding;
        self
    }

    pub fn with_recency_window(mut self, recency_window: Duration) -> Self {
        self.recency_window = recency_window;
        self
    }
}

/// Computed top-left of the floating element and the side it ended up on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingPosition {
    pub x: f32,
    pub y: f32,
    pub placement: Placement,
}

impl FloatingPosition {
    pub fn rect(&self, size: Size) -> Rect {
        Rect::new(self.x, self.y, size.width, size.height)
    }
}

/// Place a `floating` box next to `anchor` inside `viewport`
pub fn compute_placement(
    anchor: &ClientRect,
    floating: Size,
    viewport: Size,
    options: &TooltipOptions,
) -> FloatingPosition {
    let preferred = options.placement;
    let mut placement = preferred;
    let preferred_overflow = main_axis_overflow(anchor, floating, viewport, preferred, options);
    if preferred_overflow > 0.0 {
        let fallback = preferred.opposite();
        let fallback_overflow = main_axis_overflow(anchor, floating, viewport, fallback, options);
        if fallback_overflow < preferred_overflow {
            placement = fallback;
        }
    }

    let (x, y) = main_axis_position(anchor, floating, placement, options.offset);
    let padding = options.viewport_padding;
    let (x, y) = if placement.is_vertical() {
        (shift(x, floating.width, viewport.width, padding), y)
    } else {
        (x, shift(y, floating.height, viewport.height, padding))
    };

    FloatingPosition { x, y, placement }
}

fn main_axis_position(
    anchor: &ClientRect,
    floating: Size,
    placement: Placement,
    offset: f32,
) -> (f32, f32) {
    let centered_x = anchor.center_x() - floating.width / 2.0;
    let centered_y = anchor.center_y() - floating.height / 2.0;
    match placement {
        Placement::Top => (centered_x, anchor.top - offset - floating.height),
        Placement::Bottom => (centered_x, anchor.bottom + offset),
        Placement::Left => (anchor.left - offset - floating.width, centered_y),
        Placement::Right => (anchor.right + offset, centered_y),
    }
}

/// Pixels by which the element crosses the padded viewport edge on its side
fn main_axis_overflow(
    anchor: &ClientRect,
    floating: Size,
    viewport: Size,
    placement: Placement,
    options: &TooltipOptions,
) -> f32 {
    let (x, y) = main_axis_position(anchor, floating, placement, options.offset);
    let padding = options.viewport_padding;
    let overflow = match placement {
        Placement::Top => padding - y,
        Placement::Bottom => y + floating.height - (viewport.height - padding),
        Placement::Left => padding - x,
        Placement::Right => x + floating.width - (viewport.width - padding),
    };
    overflow.max(0.0)
}

fn shift(start: f32, length: f32, extent: f32, padding: f32) -> f32 {
    start.min(extent - length - padding).max(padding)
}

/// Interactions that may close a tooltip
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DismissEvent {
    OutsidePointerDown(Point),
    Escape,
}

/// Whether `event` dismisses a tooltip anchored at `anchor`
///
/// A pointer press inside the anchor or the floating element keeps it open.
pub fn should_dismiss(event: &DismissEvent, anchor: &ClientRect, floating: Option<Rect>) -> bool {
    match event {
        DismissEvent::Escape => true,
        DismissEvent::OutsidePointerDown(point) => {
            let in_floating = floating.is_some_and(|rect| rect.contains_point(*point));
            !anchor.contains(*point) && !in_floating
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };
    const TOOLTIP: Size = Size {
        width: 200.0,
        height: 50.0,
    };

    fn anchor(left: f32, top: f32, width: f32, height: f32) -> ClientRect {
        ClientRect::from(Rect::new(left, top, width, height))
    }

    #[test]
    fn test_default_options() {
        let options = TooltipOptions::default();
        assert_eq!(options.placement, Placement::Top);
        assert_eq!(options.offset, 10.0);
        assert_eq!(options.viewport_padding, 8.0);
        assert_eq!(options.recency_window, Duration::from_secs(1));
    }

    #[test]
    fn test_top_placement_centered_above() {
        let reference = anchor(300.0, 300.0, 100.0, 20.0);
        let position = compute_placement(&reference, TOOLTIP, VIEWPORT, &TooltipOptions::default());
        assert_eq!(position.placement, Placement::Top);
        assert_eq!(position.x, 250.0);
        assert_eq!(position.y, 240.0);
    }

    #[test]
    fn test_flips_below_when_no_room_above() {
        let reference = anchor(300.0, 20.0, 100.0, 20.0);
        let position = compute_placement(&reference, TOOLTIP, VIEWPORT, &TooltipOptions::default());
        assert_eq!(position.placement, Placement::Bottom);
        assert_eq!(position.y, 50.0);
    }

    #[test]
    fn test_keeps_preferred_side_when_flip_is_worse() {
        let tall = Size::new(200.0, 580.0);
        let reference = anchor(300.0, 300.0, 100.0, 20.0);
        let position = compute_placement(&reference, tall, VIEWPORT, &TooltipOptions::default());
        // above overflows by 298, below by 318
        assert_eq!(position.placement, Placement::Top);
    }

    #[test]
    fn test_shift_keeps_tooltip_inside_padding() {
        let options = TooltipOptions::default();
        let left_anchor = anchor(0.0, 300.0, 20.0, 20.0);
        let left_edge = compute_placement(&left_anchor, TOOLTIP, VIEWPORT, &options);
        assert_eq!(left_edge.x, 8.0);

        let right_anchor = anchor(780.0, 300.0, 20.0, 20.0);
        let right_edge = compute_placement(&right_anchor, TOOLTIP, VIEWPORT, &options);
        assert_eq!(right_edge.x, 800.0 - 200.0 - 8.0);
    }

    #[test]
    fn test_horizontal_placement_shifts_vertically() {
        let options = TooltipOptions::default().with_placement(Placement::Right);
        let reference = anchor(100.0, 0.0, 20.0, 10.0);
        let position = compute_placement(&reference, TOOLTIP, VIEWPORT, &options);
        assert_eq!(position.placement, Placement::Right);
        assert_eq!(position.x, 130.0);
        assert_eq!(position.y, 8.0);
    }

    #[test]
    fn test_zero_anchor_still_places() {
        let options = TooltipOptions::default();
        let position = compute_placement(&ClientRect::zero(), TOOLTIP, VIEWPORT, &options);
        assert!(position.x.is_finite());
        assert!(position.y.is_finite());
    }

    #[test]
    fn test_dismiss_rules() {
        let reference = anchor(100.0, 100.0, 50.0, 20.0);
        let floating = Some(Rect::new(100.0, 40.0, 200.0, 50.0));

        assert!(should_dismiss(&DismissEvent::Escape, &reference, floating));
        let click = |x: f32, y: f32| DismissEvent::OutsidePointerDown(Point::new(x, y));

        assert!(should_dismiss(&click(500.0, 500.0), &reference, floating));
        assert!(!should_dismiss(&click(120.0, 110.0), &reference, floating));
        assert!(!should_dismiss(&click(250.0, 60.0), &reference, floating));
        assert!(should_dismiss(&click(250.0, 60.0), &reference, None));
    }
}
