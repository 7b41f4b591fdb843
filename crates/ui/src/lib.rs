//! PDF Annotator UI Library
//!
//! Interaction layer for annotations: anchor projection, tooltips, floating
//! placement, text-layer selection tracking and the viewer that ties them to
//! the core model.

pub mod anchor;
pub mod events;
pub mod placement;
pub mod text_layer;
pub mod tooltip;
pub mod viewer;
pub mod viewport;

pub use anchor::{compute_anchor, AnchorProvider};
pub use events::{EventHub, EventKind, Key, Subscription, ViewerEvent};
pub use placement::{
    compute_placement, should_dismiss, DismissEvent, FloatingPosition, Placement, TooltipOptions,
};
pub use text_layer::{TextLayerRegistration, TextLayerRegistry};
pub use tooltip::{AnnotationTooltip, TooltipContext, TooltipPhase};
pub use viewer::{Viewer, ViewerConfig};
pub use viewport::{ClientRect, ContainerSlot, ViewportContainer};
