//! Scenario files.
//!
//! A scenario describes one viewer session: the window, the image, an
//! optional thumbnail to open the lightbox from, a [`ViewerConfig`], and a
//! script of recognizer events and frame advances.
//!
//! ```json
//! {
//!   "name": "pinch-then-pan",
//!   "window": { "width": 375, "height": 667 },
//!   "image": { "width": 400, "height": 300 },
//!   "steps": [
//!     { "kind": "gesture", "target": "pinch", "old_state": "undetermined", "state": "began",
//!       "number_of_pointers": 2, "focal_x": 200, "focal_y": 150 },
//!     { "kind": "advance", "frames": 4 },
//!     { "kind": "settle" }
//!   ]
//! }
//! ```

use std::path::Path;

use gallery_core::{GestureEvent, MeasuredRect, Size, ViewerConfig};
use serde::{Deserialize, Serialize};

use crate::ReplayError;

/// Default number of pages when a scenario does not set one.
fn default_pages() -> usize {
    1
}

/// Default cap on frames run by a single settle step.
fn default_settle_frames() -> usize {
    2000
}

/// A scripted viewer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, echoed in the report.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Window size; the pager page width is the window width.
    pub window: Size,
    /// Intrinsic size of the displayed image.
    pub image: Size,
    /// Number of pages in the pager.
    #[serde(default = "default_pages")]
    pub pages: usize,
    /// Thumbnail rectangle to open the lightbox from. Without one the
    /// viewer starts already open.
    #[serde(default)]
    pub thumbnail: Option<MeasuredRect>,
    /// Component settings.
    #[serde(default)]
    pub config: ViewerConfig,
    /// Script.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Parse`] for malformed JSON and
    /// [`ReplayError::Invalid`] for an empty pager.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] when the file cannot be read, otherwise
    /// the errors of [`Scenario::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ReplayError> {
        if self.pages == 0 {
            return Err(ReplayError::Invalid("scenario needs at least one page".into()));
        }
        self.config.validate()?;
        Ok(())
    }
}

/// Which recognizer an event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureTarget {
    /// Image pan.
    Pan,
    /// Image pinch.
    Pinch,
    /// Image single tap.
    Tap,
    /// Image double tap.
    DoubleTap,
    /// Pager horizontal pan.
    PagerPan,
    /// Pager tap.
    PagerTap,
    /// Swipe-to-dismiss vertical pan.
    Swipe,
}

/// One script entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Deliver a recognizer event. Event fields sit next to `target`.
    Gesture {
        /// Receiving recognizer.
        target: GestureTarget,
        /// The event.
        #[serde(flatten)]
        event: GestureEvent,
    },
    /// Run a fixed number of frames.
    Advance {
        /// Frames to run.
        frames: usize,
    },
    /// Run frames until every animation has settled.
    Settle {
        /// Upper bound on frames.
        #[serde(default = "default_settle_frames")]
        max_frames: usize,
    },
    /// The viewer content finished its first layout.
    Layout,
    /// Close the lightbox.
    Close {
        /// Fade out in place instead of flying back to the thumbnail.
        #[serde(default)]
        fade: bool,
    },
}
