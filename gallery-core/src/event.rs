//! Gesture recognizer events, platform selection and geometry records.

use serde::{Deserialize, Serialize};

use crate::error::{GalleryError, GalleryResult};

/// Recognizer lifecycle state.
///
/// The numeric codes matter: begin detection on [`Platform::Android`] relies
/// on the difference `Active − Began == 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GestureState {
    /// No touch yet.
    #[default]
    Undetermined = 0,
    /// The recognizer gave up.
    Failed = 1,
    /// Touch down, recognition pending.
    Began = 2,
    /// The system took the gesture away.
    Cancelled = 3,
    /// Recognized and tracking.
    Active = 4,
    /// Finished normally.
    End = 5,
}

impl GestureState {
    /// Numeric code of the state.
    #[must_use]
    pub fn code(self) -> f64 {
        f64::from(self as u8)
    }

    /// Whether the state ends a recognizer session.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End | Self::Failed | Self::Cancelled)
    }

    /// Whether a recognizer in this state is still "in use" for settle
    /// arbitration (anything but idle or cleanly ended).
    #[must_use]
    pub fn is_in_use(self) -> bool {
        !matches!(self, Self::Undetermined | Self::End)
    }
}

/// One state-change or update event from a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureEvent {
    /// Current state.
    pub state: GestureState,
    /// Previous state (equal to `state` for plain updates).
    pub old_state: GestureState,
    /// Horizontal translation since the gesture began.
    pub translation_x: f64,
    /// Vertical translation since the gesture began.
    pub translation_y: f64,
    /// Horizontal velocity in points per second.
    pub velocity_x: f64,
    /// Vertical velocity in points per second.
    pub velocity_y: f64,
    /// Pinch scale since the gesture began.
    pub scale: f64,
    /// Pinch focal point x, in view coordinates.
    pub focal_x: f64,
    /// Pinch focal point y, in view coordinates.
    pub focal_y: f64,
    /// Number of pointers on screen.
    pub number_of_pointers: u32,
    /// Touch x, in view coordinates.
    pub x: f64,
    /// Touch y, in view coordinates.
    pub y: f64,
}

impl Default for GestureEvent {
    fn default() -> Self {
        Self {
            state: GestureState::Undetermined,
            old_state: GestureState::Undetermined,
            translation_x: 0.0,
            translation_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            scale: 1.0,
            focal_x: 0.0,
            focal_y: 0.0,
            number_of_pointers: 1,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl GestureEvent {
    /// An event transitioning from `old_state` to `state`.
    #[must_use]
    pub fn new(old_state: GestureState, state: GestureState) -> Self {
        Self {
            state,
            old_state,
            ..Self::default()
        }
    }

    /// Set the translation.
    #[must_use]
    pub fn with_translation(mut self, x: f64, y: f64) -> Self {
        self.translation_x = x;
        self.translation_y = y;
        self
    }

    /// Set the velocity.
    #[must_use]
    pub fn with_velocity(mut self, x: f64, y: f64) -> Self {
        self.velocity_x = x;
        self.velocity_y = y;
        self
    }

    /// Set the pinch scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the pinch focal point.
    #[must_use]
    pub fn with_focal(mut self, x: f64, y: f64) -> Self {
        self.focal_x = x;
        self.focal_y = y;
        self
    }

    /// Set the pointer count.
    #[must_use]
    pub fn with_pointers(mut self, pointers: u32) -> Self {
        self.number_of_pointers = pointers;
        self
    }

    /// Set the touch position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// Target platform, which selects the begin-detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Recognizers deliver `Began` reliably.
    #[default]
    Ios,
    /// Multi-finger recognizers may skip straight to `Active`.
    Android,
}

impl std::str::FromStr for Platform {
    type Err = GalleryError;

    fn from_str(s: &str) -> GalleryResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(GalleryError::Config(format!("unknown platform '{other}'"))),
        }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Reject zero, negative, or non-finite sides.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidDimensions`] tagged with `context`.
    pub fn validate(self, context: &'static str) -> GalleryResult<Self> {
        GalleryError::check_dimensions(context, self.width, self.height)?;
        Ok(self)
    }
}

/// Rectangle reported by the measurement service.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasuredRect {
    /// X relative to the parent.
    pub x: f64,
    /// Y relative to the parent.
    pub y: f64,
    /// Measured width; zero when not laid out.
    pub width: f64,
    /// Measured height; zero when not laid out.
    pub height: f64,
    /// X relative to the screen.
    pub page_x: f64,
    /// Y relative to the screen.
    pub page_y: f64,
}

impl MeasuredRect {
    /// Zero width and zero height: the view is not laid out.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Measurements captured for an activated gallery item.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// On-screen x of the thumbnail.
    pub x: f64,
    /// On-screen y of the thumbnail.
    pub y: f64,
    /// Thumbnail width.
    pub width: f64,
    /// Thumbnail height.
    pub height: f64,
    /// Width of the full-screen image.
    pub target_width: f64,
    /// Height of the full-screen image.
    pub target_height: f64,
}

/// Scale `item` to `result_width`, preserving its aspect ratio.
///
/// Returns the target `(width, height)`.
///
/// # Errors
///
/// Returns [`GalleryError::InvalidDimensions`] when `item` or `result_width`
/// is not positive.
pub fn normalize_dimensions(item: Size, result_width: f64) -> GalleryResult<Size> {
    item.validate("image")?;
    GalleryError::check_dimensions("window", result_width, 1.0)?;
    let scale_factor = item.width / result_width;
    Ok(Size::new(result_width, item.height / scale_factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes() {
        assert!((GestureState::Active.code() - GestureState::Began.code() - 2.0).abs() < f64::EPSILON);
        assert!(GestureState::Cancelled.is_terminal());
        assert!(!GestureState::Began.is_terminal());
        assert!(GestureState::Cancelled.is_in_use());
        assert!(!GestureState::End.is_in_use());
    }

    #[test]
    fn test_event_json_defaults() {
        let event: GestureEvent =
            serde_json::from_str(r#"{"state":"active","old_state":"began","scale":2.0}"#).unwrap();
        assert_eq!(event.state, GestureState::Active);
        assert_eq!(event.old_state, GestureState::Began);
        assert_eq!(event.number_of_pointers, 1);
        assert!((event.scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert!("web".parse::<Platform>().is_err());
    }

    #[test]
    fn test_normalize_dimensions() {
        let size = normalize_dimensions(Size::new(400.0, 300.0), 375.0).unwrap();
        assert!((size.width - 375.0).abs() < f64::EPSILON);
        assert!((size.height - 281.25).abs() < 1e-9);
        assert!(normalize_dimensions(Size::new(0.0, 300.0), 375.0).is_err());
    }

    #[test]
    fn test_degenerate_rect() {
        assert!(MeasuredRect::default().is_degenerate());
        let rect = MeasuredRect {
            width: 10.0,
            ..MeasuredRect::default()
        };
        assert!(!rect.is_degenerate());
    }
}
