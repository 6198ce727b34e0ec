//! Lightbox open/close transition.
//!
//! The full-screen image grows out of the thumbnail rectangle: a single
//! progress value runs from 0 to 1 and every rectangle edge interpolates
//! between the measured thumbnail and the centred target. Once open, the
//! viewer content fades in and the transition image hides itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::{interpolate, Timing};
use crate::config::LightboxConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::event::{Measurements, Size};
use crate::value::{AnimatedValue, FrameRuntime, Shared};

/// Position and size of the transition image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Everything a host needs to draw one lightbox frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightboxStyle {
    /// Transition image rectangle.
    pub image: ImageRect,
    /// Transition image opacity.
    pub image_opacity: f64,
    /// Viewer content opacity.
    pub children_opacity: f64,
    /// Backdrop opacity; follows the progress.
    pub backdrop_opacity: f64,
    /// Transition progress, 0 closed, 1 open.
    pub progress: f64,
}

/// Thumbnail-to-full-screen transition.
pub struct LightboxTransition {
    runtime: FrameRuntime,
    config: LightboxConfig,
    source: String,
    from: ImageRect,
    target: ImageRect,
    progress: AnimatedValue,
    children_opacity: AnimatedValue,
    image_opacity: AnimatedValue,
    children_ready: Shared<bool>,
}

impl fmt::Debug for LightboxTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightboxTransition")
            .field("source", &self.source)
            .field("from", &self.from)
            .field("target", &self.target)
            .field("progress", &self.progress.get())
            .finish_non_exhaustive()
    }
}

impl LightboxTransition {
    /// Start building a transition on `runtime`.
    #[must_use]
    pub fn builder(runtime: &FrameRuntime) -> LightboxBuilder {
        LightboxBuilder::new(runtime)
    }

    fn open(&self) {
        let (opacity, ready) = (self.children_opacity.clone(), self.children_ready.clone());
        self.progress
            .animate_with(Timing::new(1.0, self.config.timing), move |finished| {
                if finished {
                    opacity.set(1.0);
                    ready.set(true);
                }
            });
    }

    /// Close the lightbox and call `cb` once the image is back in place.
    ///
    /// With `fade` the content and image fade out in place instead of
    /// flying back to the thumbnail.
    pub fn hide(&self, cb: impl FnOnce() + 'static, fade: bool) {
        tracing::debug!(source = %self.source, fade, "lightbox hide");
        if fade {
            let timing = self.config.fade_timing;
            self.children_opacity.animate(Timing::new(0.0, timing));
            self.progress.animate_with(Timing::new(0.0, timing), move |_| cb());
        } else {
            self.image_opacity.set(1.0);
            self.children_opacity.set(0.0);
            self.progress
                .animate_with(Timing::new(0.0, self.config.timing), move |_| cb());
        }
    }

    /// The viewer content has been laid out; hide the transition image on
    /// the next frame.
    pub fn on_children_layout(&self) {
        if self.image_opacity.get() == 0.0 {
            return;
        }
        let image_opacity = self.image_opacity.clone();
        self.runtime.run_on_ui(move || image_opacity.set(0.0));
    }

    /// Current frame.
    #[must_use]
    pub fn style(&self) -> LightboxStyle {
        let progress = self.progress.get();
        let lerp = |from: f64, to: f64| interpolate(progress, [0.0, 1.0], [from, to]);
        LightboxStyle {
            image: ImageRect {
                x: lerp(self.from.x, self.target.x),
                y: lerp(self.from.y, self.target.y),
                width: lerp(self.from.width, self.target.width),
                height: lerp(self.from.height, self.target.height),
            },
            image_opacity: self.image_opacity.get(),
            children_opacity: self.children_opacity.get(),
            backdrop_opacity: progress,
            progress,
        }
    }

    /// The open animation finished and the content may render.
    #[must_use]
    pub fn is_children_ready(&self) -> bool {
        self.children_ready.get()
    }

    /// Rectangle of the fully open image.
    #[must_use]
    pub fn target(&self) -> ImageRect {
        self.target
    }

    /// Image source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Builder for [`LightboxTransition`].
pub struct LightboxBuilder {
    runtime: FrameRuntime,
    source: Option<String>,
    measurements: Option<Measurements>,
    target_dimensions: Size,
    window: Size,
    config: LightboxConfig,
    on_ready: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for LightboxBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightboxBuilder")
            .field("source", &self.source)
            .field("measurements", &self.measurements)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl LightboxBuilder {
    fn new(runtime: &FrameRuntime) -> Self {
        Self {
            runtime: runtime.clone(),
            source: None,
            measurements: None,
            target_dimensions: Size::default(),
            window: Size::default(),
            config: LightboxConfig::default(),
            on_ready: None,
        }
    }

    /// Image URI or asset name.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Thumbnail rectangle the transition starts from.
    #[must_use]
    pub fn measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = Some(measurements);
        self
    }

    /// Intrinsic size of the full image.
    #[must_use]
    pub fn target_dimensions(mut self, width: f64, height: f64) -> Self {
        self.target_dimensions = Size::new(width, height);
        self
    }

    /// Window size.
    #[must_use]
    pub fn window(mut self, width: f64, height: f64) -> Self {
        self.window = Size::new(width, height);
        self
    }

    /// Transition timings.
    #[must_use]
    pub fn config(mut self, config: LightboxConfig) -> Self {
        self.config = config;
        self
    }

    /// Called right before the open animation starts.
    #[must_use]
    pub fn on_ready(mut self, cb: impl FnOnce() + 'static) -> Self {
        self.on_ready = Some(Box::new(cb));
        self
    }

    /// Build the transition and start opening it.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::MissingSource`] when no source was given.
    /// - [`GalleryError::Config`] when no starting rectangle was given.
    /// - [`GalleryError::InvalidDimensions`] for unusable sizes.
    pub fn build(self) -> GalleryResult<LightboxTransition> {
        let source = self.source.ok_or(GalleryError::MissingSource)?;
        let measurements = self
            .measurements
            .ok_or_else(|| GalleryError::Config("lightbox needs starting measurements".into()))?;
        let window = self.window.validate("window")?;
        let dims = self.target_dimensions.validate("target")?;

        let scale_factor = dims.width / window.width;
        let target_height = dims.height / scale_factor;
        let target = ImageRect {
            x: 0.0,
            y: (window.height - target_height) / 2.0,
            width: window.width,
            height: target_height,
        };
        let from = ImageRect {
            x: measurements.x,
            y: measurements.y,
            width: measurements.width,
            height: measurements.height,
        };

        let transition = LightboxTransition {
            progress: self.runtime.value(0.0),
            children_opacity: self.runtime.value(0.0),
            image_opacity: self.runtime.value(1.0),
            children_ready: Shared::new(false),
            runtime: self.runtime,
            config: self.config,
            source,
            from,
            target,
        };

        if let Some(cb) = self.on_ready {
            cb();
        }
        tracing::debug!(source = %transition.source, "lightbox opening");
        transition.open();
        Ok(transition)
    }
}
