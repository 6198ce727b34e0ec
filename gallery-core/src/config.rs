//! Component configuration.
//!
//! Every component takes a serde-friendly config struct with defaults tuned
//! for phone-sized screens. [`ViewerConfig`] bundles them for hosts that
//! configure the whole viewer at once, with environment overrides.

use serde::{Deserialize, Serialize};

use crate::animation::{Easing, SpringConfig, TimingConfig};
use crate::error::{GalleryError, GalleryResult};
use crate::event::Platform;

/// Easing shared by the zoom and lightbox timing animations.
pub const STANDARD_EASING: Easing = Easing::bezier(0.33, 0.01, 0.0, 1.0);

/// Environment variable selecting the platform (`ios` / `android`).
pub const ENV_PLATFORM: &str = "GALLERY_PLATFORM";
/// Environment variable overriding [`TransformerConfig::max_scale`].
pub const ENV_MAX_SCALE: &str = "GALLERY_MAX_SCALE";
/// Environment variable overriding [`PagerConfig::num_to_render`].
pub const ENV_NUM_TO_RENDER: &str = "GALLERY_NUM_TO_RENDER";

fn standard_timing(duration_ms: f64) -> TimingConfig {
    TimingConfig {
        duration_ms,
        easing: STANDARD_EASING,
    }
}

/// Image transformer (pinch, pan, double tap) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Largest settled scale.
    pub max_scale: f64,
    /// Smallest scale reachable while pinching.
    pub min_scale: f64,
    /// Rubber-band allowance above `max_scale` while pinching.
    pub over_scale: f64,
    /// Scale applied by a double tap on an unzoomed image.
    pub double_tap_scale: f64,
    /// Spring used to pull the offset back inside its bounds.
    pub spring: SpringConfig,
    /// Timing used for scale snaps and resets.
    pub timing: TimingConfig,
    /// Deceleration of fling decays.
    pub decay_deceleration: f64,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            max_scale: 3.0,
            min_scale: 0.7,
            over_scale: 0.5,
            double_tap_scale: 3.0,
            spring: SpringConfig {
                stiffness: 1000.0,
                damping: 500.0,
                mass: 3.0,
                overshoot_clamping: true,
                rest_displacement_threshold: 0.01,
                rest_speed_threshold: 0.01,
            },
            timing: standard_timing(250.0),
            decay_deceleration: 0.9915,
        }
    }
}

impl TransformerConfig {
    /// Check scale limits and decay parameters.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Config`] describing the first invalid field.
    pub fn validate(&self) -> GalleryResult<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0) {
            return Err(GalleryError::Config(format!(
                "min_scale must be in (0, 1], got {}",
                self.min_scale
            )));
        }
        if self.max_scale < 1.0 {
            return Err(GalleryError::Config(format!(
                "max_scale must be at least 1, got {}",
                self.max_scale
            )));
        }
        if self.over_scale < 0.0 {
            return Err(GalleryError::Config("over_scale must not be negative".into()));
        }
        if self.double_tap_scale <= 1.0 {
            return Err(GalleryError::Config("double_tap_scale must exceed 1".into()));
        }
        validate_deceleration(self.decay_deceleration)
    }
}

fn validate_deceleration(value: f64) -> GalleryResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(GalleryError::Config(format!(
            "decay deceleration must be in (0, 1), got {value}"
        )))
    }
}

/// Pinch-only scalable image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalableImageConfig {
    /// Largest scale while pinching.
    pub max_scale: f64,
    /// Smallest scale while pinching.
    pub min_scale: f64,
    /// Timing of the snap back to scale 1.
    pub timing: TimingConfig,
}

impl Default for ScalableImageConfig {
    fn default() -> Self {
        Self {
            max_scale: 3.0,
            min_scale: 1.0,
            timing: standard_timing(250.0),
        }
    }
}

/// When the pager's active index (and with it the render window) follows a
/// committed page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexChangeMode {
    /// Right after the index-change notification, on the main context.
    #[default]
    Immediate,
    /// When the host calls `Pager::complete_index_change`.
    Deferred,
}

/// Horizontal pager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Gap between pages; `None` means `round(width / 14)`.
    pub gutter_width: Option<f64>,
    /// Whether gutters are laid out at all.
    pub render_gutter: bool,
    /// Pages rendered on each side of the active one.
    pub num_to_render: usize,
    /// Page shown first.
    pub initial_index: usize,
    /// Lower bound of the settle spring's seeded speed.
    pub min_velocity: f64,
    /// Upper bound of the settle spring's seeded speed.
    pub max_velocity: f64,
    /// Release speed above which a swipe commits to the next page.
    pub commit_velocity: f64,
    /// Settle spring; `None` uses a slightly over-damped default.
    pub spring: Option<SpringConfig>,
    /// When the active index follows a committed page change.
    pub index_change: IndexChangeMode,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            gutter_width: None,
            render_gutter: true,
            num_to_render: 2,
            initial_index: 0,
            min_velocity: 700.0,
            max_velocity: 3000.0,
            commit_velocity: 10.0,
            spring: None,
            index_change: IndexChangeMode::Immediate,
        }
    }
}

impl PagerConfig {
    /// Gutter width for a pager `width` wide.
    #[must_use]
    pub fn resolved_gutter(&self, width: f64) -> f64 {
        if !self.render_gutter {
            return 0.0;
        }
        self.gutter_width.unwrap_or_else(|| (width / 14.0).round())
    }

    /// Settle spring parameters.
    #[must_use]
    pub fn resolved_spring(&self) -> SpringConfig {
        self.spring.unwrap_or_else(|| {
            let ratio = 1.1;
            let mass = 0.4;
            let stiffness = 100.0;
            SpringConfig {
                stiffness,
                mass,
                damping: ratio * 2.0 * f64::sqrt(mass * stiffness),
                overshoot_clamping: false,
                rest_displacement_threshold: 1.0,
                rest_speed_threshold: 5.0,
            }
        })
    }

    /// Check velocity limits.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Config`] when the velocity range is inverted or
    /// negative.
    pub fn validate(&self) -> GalleryResult<()> {
        if self.min_velocity < 0.0 || self.max_velocity < self.min_velocity {
            return Err(GalleryError::Config(format!(
                "pager velocity range [{}, {}] is invalid",
                self.min_velocity, self.max_velocity
            )));
        }
        if matches!(self.gutter_width, Some(g) if g < 0.0) {
            return Err(GalleryError::Config("gutter_width must not be negative".into()));
        }
        Ok(())
    }
}

/// Swipe-to-dismiss settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeoutConfig {
    /// Dismiss distance; `None` means the window height.
    pub to_value: Option<f64>,
    /// Release speed required to dismiss.
    pub dismiss_velocity: f64,
    /// Minimum speed of the dismiss spring.
    pub velocity_floor: f64,
    /// Backdrop opacity reached at `to_value` of drag.
    pub backdrop_min_opacity: f64,
    /// Duration of the backdrop fade on dismiss.
    pub backdrop_fade_ms: f64,
    /// Spring carrying the content off screen.
    pub dismiss_spring: SpringConfig,
    /// Spring pulling the content back.
    pub cancel_spring: SpringConfig,
}

impl Default for SwipeoutConfig {
    fn default() -> Self {
        Self {
            to_value: None,
            dismiss_velocity: 30.0,
            velocity_floor: 1200.0,
            backdrop_min_opacity: 0.7,
            backdrop_fade_ms: 200.0,
            dismiss_spring: SpringConfig {
                stiffness: 50.0,
                damping: 30.0,
                mass: 1.0,
                overshoot_clamping: true,
                ..SpringConfig::default()
            },
            cancel_spring: SpringConfig {
                stiffness: 1000.0,
                damping: 500.0,
                mass: 2.0,
                overshoot_clamping: false,
                rest_displacement_threshold: 10.0,
                rest_speed_threshold: 10.0,
            },
        }
    }
}

/// Lightbox open/close transition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    /// Open and close animation.
    pub timing: TimingConfig,
    /// Fade-out animation used by `hide(fade = true)`.
    pub fade_timing: TimingConfig,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            timing: standard_timing(300.0),
            fade_timing: standard_timing(500.0),
        }
    }
}

/// All component settings plus the target platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Platform selecting the begin-detection strategy.
    pub platform: Platform,
    /// Image transformer settings.
    pub transformer: TransformerConfig,
    /// Scalable image settings.
    pub scalable: ScalableImageConfig,
    /// Pager settings.
    pub pager: PagerConfig,
    /// Swipe-to-dismiss settings.
    pub swipeout: SwipeoutConfig,
    /// Lightbox transition settings.
    pub lightbox: LightboxConfig,
}

impl ViewerConfig {
    /// Defaults with overrides from `GALLERY_PLATFORM`, `GALLERY_MAX_SCALE`
    /// and `GALLERY_NUM_TO_RENDER`. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(platform) = std::env::var(ENV_PLATFORM)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.platform = platform;
        }
        if let Some(max_scale) = std::env::var(ENV_MAX_SCALE)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.transformer.max_scale = max_scale;
        }
        if let Some(num) = std::env::var(ENV_NUM_TO_RENDER)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.pager.num_to_render = num;
        }
        self
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Serialization`] for malformed JSON.
    pub fn from_json(json: &str) -> GalleryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Config`] for the first invalid value.
    pub fn validate(&self) -> GalleryResult<()> {
        self.transformer.validate()?;
        if self.scalable.min_scale > self.scalable.max_scale {
            return Err(GalleryError::Config(
                "scalable min_scale exceeds max_scale".into(),
            ));
        }
        self.pager.validate()?;
        if !(0.0..=1.0).contains(&self.swipeout.backdrop_min_opacity) {
            return Err(GalleryError::Config(
                "backdrop_min_opacity must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pager_gutter_resolution() {
        let config = PagerConfig::default();
        assert!((config.resolved_gutter(375.0) - 27.0).abs() < f64::EPSILON);
        let hidden = PagerConfig {
            render_gutter: false,
            gutter_width: Some(20.0),
            ..PagerConfig::default()
        };
        assert!(hidden.resolved_gutter(375.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pager_default_spring() {
        let spring = PagerConfig::default().resolved_spring();
        assert!((spring.damping - 1.1 * 2.0 * 40.0_f64.sqrt()).abs() < 1e-9);
        assert!((spring.mass - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_transformer_config() {
        let config = TransformerConfig {
            decay_deceleration: 1.0,
            ..TransformerConfig::default()
        };
        assert!(matches!(config.validate(), Err(GalleryError::Config(_))));
        let config = TransformerConfig {
            min_scale: 0.0,
            ..TransformerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            ViewerConfig::from_json(r#"{"platform":"android","pager":{"num_to_render":1}}"#).unwrap();
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.pager.num_to_render, 1);
        assert!((config.transformer.max_scale - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ViewerConfig::from_json("{"),
            Err(GalleryError::Serialization(_))
        ));
    }
}
