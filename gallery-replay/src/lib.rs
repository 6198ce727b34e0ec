//! # Gallery Replay
//!
//! Deterministic replay of recorded or hand-written gesture traces against
//! the gallery engine. A [`Scenario`] names the window, the image and a
//! script of recognizer events; [`run`] drives the viewer frame by frame at a
//! fixed interval and returns a [`ReplayReport`] with the render styles of
//! every frame.
//!
//! ```text
//! scenario.json ─▶ Scenario ─▶ Replay ─┬─▶ GalleryCoordinator ─▶ LightboxTransition
//!                                      ├─▶ Pager ◀── ImageTransformer (page at rest)
//!                                      └─▶ Swipeout ◀── ImageTransformer (zoomed)
//!                                               │
//!                                      FrameRuntime::frame ─▶ FrameReport
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod report;
pub mod runner;
pub mod scenario;

pub use report::{FrameReport, PagerFrame, ReplayReport, SwipeFrame};
pub use runner::{run, Replay, DEFAULT_FRAME_MS};
pub use scenario::{GestureTarget, Scenario, Step};

use gallery_core::GalleryError;
use thiserror::Error;

/// Errors raised while loading or starting a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The scenario file could not be read.
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The scenario is not valid JSON or does not match the format.
    #[error("Scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The scenario is well-formed but unusable.
    #[error("Invalid scenario: {0}")]
    Invalid(String),

    /// A viewer component rejected the scenario.
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
