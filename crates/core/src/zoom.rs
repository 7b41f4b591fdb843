//! Zoom state
//!
//! Two zoom values exist at any time: the live value that follows the user's
//! gesture, and a settled value that only catches up after the gesture has
//! paused. Raster rendering keys off the settled value to avoid re-rendering
//! every frame; geometry projection must always use the live value or
//! anchors drift during a pinch.

use crate::geometry::Size;
use std::time::{Duration, Instant};

/// Default debounce before the settled zoom catches up
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Largest canvas area the renderer will allocate, in device pixels
pub const MAX_CANVAS_PIXELS: f32 = 16_777_216.0 * 2.0;

/// Largest canvas side the renderer will allocate, in device pixels
pub const MAX_CANVAS_DIMENSION: f32 = 32_767.0 * 2.0;

/// Allowed zoom range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomOptions {
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 10.0,
        }
    }
}

impl ZoomOptions {
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Live and settled zoom for one viewer
#[derive(Debug, Clone)]
pub struct ZoomState {
    options: ZoomOptions,
    current: f32,
    settled: f32,
    is_fit_width: bool,
    settle_delay: Duration,
    last_change: Option<Instant>,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new(1.0, ZoomOptions::default())
    }
}

impl ZoomState {
    pub fn new(initial: f32, options: ZoomOptions) -> Self {
        let zoom = options.clamp(initial);
        Self {
            options,
            current: zoom,
            settled: zoom,
            is_fit_width: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
            last_change: None,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// The live zoom. Use this for every geometric projection.
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn options(&self) -> ZoomOptions {
        self.options
    }

    pub fn is_fit_width(&self) -> bool {
        self.is_fit_width
    }

    /// Set the live zoom, clamped to the allowed range
    pub fn set(&mut self, zoom: f32, now: Instant) -> f32 {
        self.set_with_mode(zoom, false, now)
    }

    /// Scale the live zoom by `factor`
    pub fn zoom_by(&mut self, factor: f32, now: Instant) -> f32 {
        self.set(self.current * factor, now)
    }

    /// Fit the widest page into `container_width`
    pub fn fit_width(&mut self, container_width: f32, page_widths: &[f32], now: Instant) -> f32 {
        let zoom = fit_width_zoom(container_width, page_widths, &self.options);
        self.set_with_mode(zoom, true, now)
    }

    fn set_with_mode(&mut self, zoom: f32, is_fit_width: bool, now: Instant) -> f32 {
        let clamped = self.options.clamp(zoom);
        if clamped != self.current {
            self.current = clamped;
            self.last_change = Some(now);
        }
        self.is_fit_width = is_fit_width;
        clamped
    }

    /// The zoom raster rendering should use at `now`
    ///
    /// Catches up with the live zoom once it has been stable for the settle
    /// delay.
    pub fn settled(&mut self, now: Instant) -> f32 {
        match self.last_change {
            Some(changed) if now.saturating_duration_since(changed) < self.settle_delay => {}
            _ => {
                self.settled = self.current;
                self.last_change = None;
            }
        }
        self.settled
    }
}

/// Zoom that fits the widest page into the container width
pub fn fit_width_zoom(container_width: f32, page_widths: &[f32], options: &ZoomOptions) -> f32 {
    let widest = page_widths.iter().copied().fold(0.0_f32, f32::max);
    if widest <= 0.0 || container_width <= 0.0 {
        return options.clamp(1.0);
    }
    options.clamp(container_width / widest)
}

/// Device-pixel scale for rasterizing a page
///
/// Rasters are rendered at most at zoom 1 (scaled up by CSS beyond that) and
/// clamped so the canvas stays under the browser's allocation limits, which
/// some engines hit early on high-DPR displays.
pub fn render_scale(dpr: f32, zoom: f32, page_size: Size) -> f32 {
    let target = dpr * zoom.min(1.0);
    if !(target > 0.0) {
        return 0.0;
    }

    let width = page_size.width.max(1.0);
    let height = page_size.height.max(1.0);
    let area_limit = (MAX_CANVAS_PIXELS / (width * height)).sqrt();
    let width_limit = MAX_CANVAS_DIMENSION / width;
    let height_limit = MAX_CANVAS_DIMENSION / height;

    target
        .min(area_limit)
        .min(width_limit)
        .min(height_limit)
        .max(0.0)
}
