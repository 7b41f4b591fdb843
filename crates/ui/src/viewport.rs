//! Viewport container seam and client rectangles

use pdf_annotator_core::{Point, Rect, Size};
use std::cell::RefCell;
use std::rc::Rc;

/// The scrollable element hosting the rendered pages
///
/// Implemented by the host over whatever renders the pages. Read-only: the
/// annotation layer never scrolls or resizes it.
pub trait ViewportContainer {
    /// Viewport-space top-left of the mounted page, `None` when the page is
    /// not currently mounted
    fn page_origin(&self, page_number: u32) -> Option<Point>;

    /// Size of the visible viewport
    fn viewport_size(&self) -> Size;

    /// Untransformed (zoom 1) page size, when the render engine knows it
    fn page_size(&self, _page_number: u32) -> Option<Size> {
        None
    }
}

/// Container reference shared by the viewer and all of its tooltips
///
/// Clones refer to the same slot, so attaching or swapping the container is
/// seen by every anchor on its next query.
#[derive(Clone, Default)]
pub struct ContainerSlot {
    inner: Rc<RefCell<Option<Rc<dyn ViewportContainer>>>>,
}

impl ContainerSlot {
    pub fn new(container: Option<Rc<dyn ViewportContainer>>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(container)),
        }
    }

    /// The attached container, if any
    pub fn get(&self) -> Option<Rc<dyn ViewportContainer>> {
        self.inner.borrow().clone()
    }

    pub fn set(&self, container: Option<Rc<dyn ViewportContainer>>) {
        *self.inner.borrow_mut() = container;
    }

    pub fn is_attached(&self) -> bool {
        self.inner.borrow().is_some()
    }
}

impl std::fmt::Debug for ContainerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Bounding client rectangle, shaped like a DOM rect
///
/// Floating placement always receives one of these, never an absent value;
/// [`ClientRect::zero`] stands in when nothing can be measured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl ClientRect {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }
}

impl From<Rect> for ClientRect {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.left,
            y: rect.top,
            width: rect.width,
            height: rect.height,
            top: rect.top,
            right: rect.right(),
            bottom: rect.bottom(),
            left: rect.left,
        }
    }
}

impl From<ClientRect> for Rect {
    fn from(rect: ClientRect) -> Self {
        Rect::new(rect.left, rect.top, rect.width, rect.height)
    }
}
