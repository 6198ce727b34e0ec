//! # Gallery Core
//!
//! Gesture arbitration and animation state for a touch image viewer:
//! pinch-zoom with pan and fling, swipe-to-dismiss, a paging carousel, the
//! lightbox open/close transition, and the coordinator that opens it.
//!
//! The crate never draws. Hosts feed recognizer events in, tick a
//! [`FrameRuntime`] once per display frame, and read back the current style
//! of each component.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    GalleryCoordinator                     │
//! │        measure thumbnail ─▶ notify ─▶ show lightbox       │
//! ├───────────────────────────────────────────────────────────┤
//! │ LightboxTransition │ Pager ─▶ ImageTransformer │ Swipeout │
//! │                    │          ScalableImage    │          │
//! ├───────────────────────────────────────────────────────────┤
//! │ GestureDispatcher  │ Spring · Timing · Decay │ FrameRuntime│
//! │ (begin detection)  │     (integrators)       │ (values)    │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod error;
pub mod event;
pub mod gallery;
pub mod gesture;
pub mod lightbox;
pub mod pager;
pub mod scalable;
pub mod swipeout;
pub mod transformer;
pub mod value;
pub mod vectors;

pub use animation::{
    interpolate, Animation, Decay, DecayConfig, Easing, Spring, SpringConfig, Timing, TimingConfig,
};
pub use config::{
    IndexChangeMode, LightboxConfig, PagerConfig, ScalableImageConfig, SwipeoutConfig,
    TransformerConfig, ViewerConfig,
};
pub use error::{GalleryError, GalleryResult};
pub use event::{
    normalize_dimensions, GestureEvent, GestureState, MeasuredRect, Measurements, Platform, Size,
};
pub use gallery::{GalleryCoordinator, GalleryEntry, GalleryImage, ListenerId, MeasureView};
pub use gesture::{
    ActiveAfterBegan, BeginDetection, DiffTracker, GestureDispatcher, GestureHandlers, StateBegan,
};
pub use lightbox::{ImageRect, LightboxStyle, LightboxTransition};
pub use pager::{clamp_velocity, friction, should_render, PageSlot, Pager};
pub use scalable::ScalableImage;
pub use swipeout::{SwipeOutcome, SwipeRelease, Swipeout};
pub use transformer::{ImageTransformer, InteractionType, RecognizerRequest, TransformStyle};
pub use value::{AnimatedValue, Derived, FrameRuntime, FrameTime, Shared, Source};
pub use vectors::{Vec2, VectorValue};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
