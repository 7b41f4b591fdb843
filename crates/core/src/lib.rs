//! PDF Annotator Core Library
//!
//! Geometry, selection resolution and the annotation model for the
//! annotation layer of a PDF viewer.

pub mod annotation;
pub mod config;
pub mod consolidation;
pub mod geometry;
pub mod persistence;
pub mod selection;
pub mod zoom;

pub use annotation::{
    Annotation, AnnotationDraft, AnnotationError, AnnotationId, AnnotationStore, AnnotationUpdate,
    DEFAULT_HIGHLIGHT_COLOR,
};
pub use config::{ConfigError, ResolverConfig, DEFAULT_MIN_RECT_SIZE};
pub use consolidation::{
    MergePredicate, MergeStrategy, RectConsolidationPolicy, DEFAULT_MERGE_THRESHOLD,
};
pub use geometry::{CoordinateSpace, HighlightRect, Inset, PageFrame, Point, Rect, Size};
pub use persistence::{
    load_or_default, save_best_effort, AnnotationSink, JsonFileSink, MemorySink, PersistenceError,
    PersistenceResult, DEFAULT_STORAGE_KEY,
};
pub use selection::{
    CollapsibleSelection, SelectionRange, SelectionResolver, SelectionSource, TextLayerHit,
    TextLayerLocator,
};
pub use zoom::{fit_width_zoom, render_scale, ZoomOptions, ZoomState, DEFAULT_SETTLE_DELAY};
