//! Error types for viewer construction and gallery activation.

use thiserror::Error;

/// Result type for gallery operations.
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Errors that can occur while building viewer components or activating items.
///
/// Per-frame gesture handling never fails; every variant here is raised either
/// at construction time (bad inputs) or by the asynchronous activation path of
/// the [`GalleryCoordinator`](crate::gallery::GalleryCoordinator).
#[derive(Debug, Error)]
pub enum GalleryError {
    /// A transformer or scalable image was built without an image source.
    #[error("Image source is required to display an image")]
    MissingSource,

    /// A size used in boundary math is zero, negative or not finite.
    #[error("Invalid {context} dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Which size was rejected (window, image, canvas, page).
        context: &'static str,
        /// Rejected width.
        width: f64,
        /// Rejected height.
        height: f64,
    },

    /// An index was outside `0..len`.
    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of items.
        len: usize,
    },

    /// A pager was created without any pages.
    #[error("Pager requires at least one page")]
    EmptyPager,

    /// No gallery item was registered for the index.
    #[error("Gallery item not registered: {0}")]
    ItemNotRegistered(usize),

    /// The measured rectangle had zero width and height (view not laid out).
    #[error("Degenerate measurement for item {index}")]
    DegenerateMeasurement {
        /// Item index.
        index: usize,
    },

    /// The measurement service could not provide a rectangle.
    #[error("Measurement unavailable for item {index}: {reason}")]
    MeasurementUnavailable {
        /// Item index.
        index: usize,
        /// Reason reported by the measurement service.
        reason: String,
    },

    /// A later activation request replaced this one before it completed.
    #[error("Activation of item {index} superseded by a later request")]
    Superseded {
        /// Item index whose activation was dropped.
        index: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Scenario or config (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GalleryError {
    /// Check that a width/height pair is usable as a divisor.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidDimensions`] if either side is not a
    /// positive finite number.
    pub fn check_dimensions(context: &'static str, width: f64, height: f64) -> GalleryResult<()> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(width) && valid(height) {
            Ok(())
        } else {
            Err(Self::InvalidDimensions {
                context,
                width,
                height,
            })
        }
    }

    /// Whether the error only affects a single activation attempt.
    ///
    /// Recoverable errors leave the coordinator usable for later attempts.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateMeasurement { .. }
                | Self::MeasurementUnavailable { .. }
                | Self::Superseded { .. }
                | Self::ItemNotRegistered(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dimensions_accepts_positive() {
        assert!(GalleryError::check_dimensions("window", 375.0, 667.0).is_ok());
    }

    #[test]
    fn test_check_dimensions_rejects_zero_and_nan() {
        assert!(matches!(
            GalleryError::check_dimensions("window", 0.0, 667.0),
            Err(GalleryError::InvalidDimensions { context: "window", .. })
        ));
        assert!(GalleryError::check_dimensions("image", 10.0, f64::NAN).is_err());
        assert!(GalleryError::check_dimensions("image", -1.0, 10.0).is_err());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(GalleryError::DegenerateMeasurement { index: 1 }.is_recoverable());
        assert!(GalleryError::Superseded { index: 1 }.is_recoverable());
        assert!(!GalleryError::MissingSource.is_recoverable());
        assert!(!GalleryError::EmptyPager.is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = GalleryError::IndexOutOfRange { index: 7, len: 5 };
        assert_eq!(err.to_string(), "Index 7 out of range for 5 items");
        let err = GalleryError::InvalidDimensions {
            context: "page",
            width: 0.0,
            height: 1.0,
        };
        assert_eq!(err.to_string(), "Invalid page dimensions: 0x1");
    }
}
