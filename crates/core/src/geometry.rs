//! Rectangle geometry and coordinate spaces
//!
//! Highlights are stored in document units: coordinates relative to the
//! top-left of a page rendered at zoom 1.0. Every rectangle that crosses a
//! module boundary carries its [`CoordinateSpace`] so conversions never have
//! to guess.

use serde::{Deserialize, Serialize};

/// A point in some 2D coordinate space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::default()
    }
}

/// Width and height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
///
/// Width and height are never negative: constructors normalize them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a rectangle, clamping negative extents to zero
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Zero-sized rectangle at the origin
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from edge coordinates, in any order
    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        let (left, right) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        let (top, bottom) = if top <= bottom {
            (top, bottom)
        } else {
            (bottom, top)
        };
        Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when either side is smaller than `min_size`
    pub fn is_degenerate(&self, min_size: f32) -> bool {
        self.width < min_size || self.height < min_size
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Bounding box of a set of rectangles, `None` for an empty set
    pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().fold(None, |acc: Option<Rect>, rect| match acc {
            Some(bounds) => Some(bounds.union(rect)),
            None => Some(*rect),
        })
    }

    /// Vertical spans intersect (touching edges count)
    pub fn overlaps_vertically(&self, other: &Rect) -> bool {
        !(self.top > other.bottom() || other.top > self.bottom())
    }

    /// Horizontal spans strictly intersect
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left < other.right() && other.left < self.right()
    }

    /// Strict bounding-box intersection
    pub fn intersects(&self, other: &Rect) -> bool {
        self.overlaps_horizontally(other)
            && self.top < other.bottom()
            && other.top < self.bottom()
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }

    /// Multiply every coordinate by `factor`
    pub fn scale(&self, factor: f32) -> Rect {
        Rect::new(
            self.left * factor,
            self.top * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Grow outward by the given inset
    pub fn inflate(&self, inset: &Inset) -> Rect {
        Rect::new(
            self.left - inset.left,
            self.top - inset.top,
            self.width + inset.left + inset.right,
            self.height + inset.top + inset.bottom,
        )
    }
}

/// Per-edge outward padding
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Inset {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Inset {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }
}

/// Coordinate space a rectangle is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Relative to the page content box at zoom 1.0
    DocumentUnits,
    /// Client pixels relative to the browser/window viewport
    ViewportPixels,
    /// Percent (0-100) of the page's zoom-1 width and height
    Percent,
}

/// Where a page currently sits on screen and how it is scaled
///
/// `page_size` is the untransformed page size (zoom 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub origin: Point,
    pub zoom: f32,
    pub page_size: Size,
}

impl PageFrame {
    pub fn new(origin: Point, zoom: f32, page_size: Size) -> Self {
        Self {
            origin,
            zoom,
            page_size,
        }
    }
}

/// A rectangle on a specific page, tagged with its coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightRect {
    /// 1-based page number
    pub page_number: u32,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    pub space: CoordinateSpace,
}

impl HighlightRect {
    pub fn new(page_number: u32, rect: Rect, space: CoordinateSpace) -> Self {
        Self {
            page_number,
            top: rect.top,
            left: rect.left,
            width: rect.width.max(0.0),
            height: rect.height.max(0.0),
            space,
        }
    }

    /// Shorthand for a rectangle in document units
    pub fn document(page_number: u32, rect: Rect) -> Self {
        Self::new(page_number, rect, CoordinateSpace::DocumentUnits)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    pub fn with_rect(&self, rect: Rect) -> Self {
        Self::new(self.page_number, rect, self.space)
    }

    /// Convert into `target` using the page's current frame
    pub fn to_space(&self, target: CoordinateSpace, frame: &PageFrame) -> HighlightRect {
        if self.space == target {
            return *self;
        }
        let document = to_document(self.rect(), self.space, frame);
        let converted = from_document(document, target, frame);
        HighlightRect::new(self.page_number, converted, target)
    }
}

fn to_document(rect: Rect, space: CoordinateSpace, frame: &PageFrame) -> Rect {
    match space {
        CoordinateSpace::DocumentUnits => rect,
        CoordinateSpace::ViewportPixels => {
            let zoom = non_zero(frame.zoom);
            rect.translate(-frame.origin.x, -frame.origin.y).scale(1.0 / zoom)
        }
        CoordinateSpace::Percent => Rect::new(
            rect.left / 100.0 * frame.page_size.width,
            rect.top / 100.0 * frame.page_size.height,
            rect.width / 100.0 * frame.page_size.width,
            rect.height / 100.0 * frame.page_size.height,
        ),
    }
}

fn from_document(rect: Rect, space: CoordinateSpace, frame: &PageFrame) -> Rect {
    match space {
        CoordinateSpace::DocumentUnits => rect,
        CoordinateSpace::ViewportPixels => {
            rect.scale(frame.zoom).translate(frame.origin.x, frame.origin.y)
        }
        CoordinateSpace::Percent => {
            let width = non_zero(frame.page_size.width);
            let height = non_zero(frame.page_size.height);
            Rect::new(
                rect.left / width * 100.0,
                rect.top / height * 100.0,
                rect.width / width * 100.0,
                rect.height / height * 100.0,
            )
        }
    }
}

// Zero divisors collapse to identity so conversions stay finite.
fn non_zero(value: f32) -> f32 {
    if value.abs() < f32::EPSILON {
        1.0
    } else {
        value
    }
}
