//! Per-frame render output.

use std::fmt;

use gallery_core::{LightboxStyle, SwipeRelease, TransformStyle};
use serde::{Deserialize, Serialize};

/// Pager state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagerFrame {
    /// Page the pager is moving to.
    pub index: usize,
    /// Page the host currently renders as active.
    pub active_index: usize,
    /// Horizontal translation of the page strip.
    pub translate_x: f64,
}

/// Swipe-to-dismiss state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwipeFrame {
    /// Vertical translation of the content.
    pub translate_y: f64,
    /// Backdrop opacity.
    pub backdrop_opacity: Option<f64>,
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Frame timestamp in milliseconds.
    pub time: f64,
    /// Image transform of the active page.
    pub transform: TransformStyle,
    /// Pager state.
    pub pager: PagerFrame,
    /// Swipe-to-dismiss state.
    pub swipe: SwipeFrame,
    /// Lightbox transition, while one exists.
    pub lightbox: Option<LightboxStyle>,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<4} t={:>8.1}  scale={:.3} tx={:>9.3} ty={:>9.3}  page={}/{} px={:>9.3}  sy={:>9.3}",
            self.frame,
            self.time,
            self.transform.scale,
            self.transform.translate_x,
            self.transform.translate_y,
            self.pager.index,
            self.pager.active_index,
            self.pager.translate_x,
            self.swipe.translate_y,
        )?;
        if let Some(opacity) = self.swipe.backdrop_opacity {
            write!(f, " backdrop={opacity:.3}")?;
        }
        if let Some(lightbox) = &self.lightbox {
            write!(f, "  lightbox={:.3}", lightbox.progress)?;
        }
        Ok(())
    }
}

/// Result of replaying a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Scenario name.
    pub scenario: String,
    /// Every frame, in order.
    pub frames: Vec<FrameReport>,
    /// Swipe releases, in order.
    pub releases: Vec<SwipeRelease>,
    /// Pages announced through the index-change hook.
    pub index_changes: Vec<usize>,
    /// Whether the lightbox finished closing.
    pub closed: bool,
}

impl ReplayReport {
    /// The last frame, if any ran.
    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameReport> {
        self.frames.last()
    }
}
