//! Pinch-only zoom that always springs back.
//!
//! A [`ScalableImage`] zooms around the pinch focal point while fingers are
//! down and returns to scale 1 with zero translation as soon as the pinch is
//! released. It never keeps an offset, which suits images embedded in
//! scrolling feeds.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::animation::Timing;
use crate::config::ScalableImageConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::event::{normalize_dimensions, GestureEvent, Platform, Size};
use crate::gesture::{GestureDispatcher, GestureHandlers};
use crate::transformer::{PinchContext, TransformStyle};
use crate::value::{AnimatedValue, FrameRuntime, Shared};
use crate::vectors::{Vec2, VectorValue};

type Hook = Box<dyn FnMut()>;
type SharedHook = Rc<RefCell<dyn FnMut()>>;

#[derive(Default)]
struct Hooks {
    on_gesture_start: Option<Hook>,
    on_gesture_release: Option<Hook>,
    on_end: Option<SharedHook>,
}

struct Engine {
    config: ScalableImageConfig,
    canvas: Vec2,
    scale: AnimatedValue,
    scale_offset: Shared<f64>,
    scale_translation: VectorValue,
    loaded: Shared<bool>,
    outer_active: Option<Shared<bool>>,
    hooks: Hooks,
}

impl Engine {
    #[allow(clippy::float_cmp)]
    fn is_at_rest(&self) -> bool {
        self.scale.get() == 1.0 && self.scale_translation.is_zero()
    }
}

impl GestureHandlers<PinchContext> for Engine {
    #[allow(clippy::float_cmp)]
    fn should_handle_event(&mut self, event: &GestureEvent, ctx: &mut PinchContext) -> bool {
        let outer = self.outer_active.as_ref().is_some_and(Shared::get);
        let handle = event.number_of_pointers == 2
            && self.scale.get() == 1.0
            && self.loaded.get()
            && !outer;
        ctx.skipped = !handle;
        handle
    }

    fn before_each(&mut self, event: &GestureEvent, ctx: &mut PinchContext) {
        let (min, max) = (self.config.min_scale, self.config.max_scale);
        ctx.next_scale = (event.scale * self.scale_offset.get()).clamp(min, max);
        if ctx.next_scale > min && ctx.next_scale < max {
            ctx.gesture_scale = event.scale;
        }
        let focal = Vec2::new(event.focal_x, event.focal_y);
        ctx.adjust_focal = focal - self.canvas * 0.5;
    }

    fn after_each(&mut self, event: &GestureEvent, ctx: &mut PinchContext) {
        if ctx.skipped || event.state.is_terminal() {
            return;
        }
        self.scale.set(ctx.next_scale);
    }

    fn on_start(&mut self, _event: &GestureEvent, ctx: &mut PinchContext) {
        ctx.origin = ctx.adjust_focal;
        if let Some(cb) = self.hooks.on_gesture_start.as_mut() {
            cb();
        }
    }

    fn on_active(&mut self, _event: &GestureEvent, ctx: &mut PinchContext) {
        let pinch = ctx.adjust_focal - ctx.origin;
        self.scale_translation
            .set(pinch + ctx.origin - ctx.origin * ctx.gesture_scale);
    }

    fn on_finish(&mut self, event: &GestureEvent, ctx: &mut PinchContext, _cancelled_or_failed: bool) {
        if ctx.skipped {
            return;
        }
        if let Some(cb) = self.hooks.on_gesture_release.as_mut() {
            cb();
        }
        ctx.gesture_scale = 1.0;
        tracing::debug!(state = ?event.state, scale = self.scale.get(), "scalable image released");

        let timing = self.config.timing;
        let on_end = self.hooks.on_end.clone();
        self.scale.animate_with(Timing::new(1.0, timing), move |finished| {
            if finished {
                if let Some(cb) = on_end {
                    let mut hook = cb.borrow_mut();
                    (*hook)();
                }
            }
        });
        self.scale_translation.x.animate(Timing::new(0.0, timing));
        self.scale_translation.y.animate(Timing::new(0.0, timing));
    }
}

/// Pinch-to-zoom image that snaps back on release.
pub struct ScalableImage {
    source: String,
    target: Size,
    engine: Engine,
    pinch: GestureDispatcher<PinchContext>,
    at_rest: Shared<bool>,
}

impl fmt::Debug for ScalableImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalableImage")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("style", &self.style())
            .finish_non_exhaustive()
    }
}

impl ScalableImage {
    /// Start building a scalable image on `runtime`.
    #[must_use]
    pub fn builder(runtime: &FrameRuntime) -> ScalableImageBuilder {
        ScalableImageBuilder::new(runtime)
    }

    /// Feed a pinch recognizer event.
    pub fn on_pinch_event(&mut self, event: &GestureEvent) {
        self.pinch.dispatch(event, &mut self.engine);
        self.at_rest.set(self.engine.is_at_rest());
    }

    /// The image finished loading; pinches are accepted from now on.
    pub fn mark_loaded(&self) {
        self.engine.loaded.set(true);
    }

    /// Current transform.
    #[must_use]
    pub fn style(&self) -> TransformStyle {
        let t = self.engine.scale_translation.get();
        TransformStyle {
            translate_x: t.x,
            translate_y: t.y,
            scale: self.engine.scale.get(),
        }
    }

    /// Scale 1 with no translation.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.engine.is_at_rest()
    }

    /// Handle to the at-rest signal.
    #[must_use]
    pub fn at_rest_signal(&self) -> Shared<bool> {
        self.at_rest.clone()
    }

    /// Rendered image size.
    #[must_use]
    pub fn target_size(&self) -> Size {
        self.target
    }

    /// Image source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Builder for [`ScalableImage`].
pub struct ScalableImageBuilder {
    runtime: FrameRuntime,
    source: Option<String>,
    image: Size,
    canvas: Option<Size>,
    window_width: f64,
    config: ScalableImageConfig,
    platform: Platform,
    outer_active: Option<Shared<bool>>,
    hooks: Hooks,
    on_scale: Option<Box<dyn FnMut(f64)>>,
    on_state_change: Option<Box<dyn FnMut(bool)>>,
}

impl fmt::Debug for ScalableImageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalableImageBuilder")
            .field("source", &self.source)
            .field("image", &self.image)
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}

impl ScalableImageBuilder {
    fn new(runtime: &FrameRuntime) -> Self {
        Self {
            runtime: runtime.clone(),
            source: None,
            image: Size::default(),
            canvas: None,
            window_width: 0.0,
            config: ScalableImageConfig::default(),
            platform: Platform::default(),
            outer_active: None,
            hooks: Hooks::default(),
            on_scale: None,
            on_state_change: None,
        }
    }

    /// Image URI or asset name.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Intrinsic image size.
    #[must_use]
    pub fn image_size(mut self, width: f64, height: f64) -> Self {
        self.image = Size::new(width, height);
        self
    }

    /// Window width, used when no canvas is given.
    #[must_use]
    pub fn window_width(mut self, width: f64) -> Self {
        self.window_width = width;
        self
    }

    /// Canvas the image is laid out in; defaults to the image's own
    /// window-width-normalised size.
    #[must_use]
    pub fn canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas = Some(Size::new(width, height));
        self
    }

    /// Zoom settings.
    #[must_use]
    pub fn config(mut self, config: ScalableImageConfig) -> Self {
        self.config = config;
        self
    }

    /// Platform for begin detection.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Flag that, while set, makes the pinch yield.
    #[must_use]
    pub fn outer_active(mut self, flag: Shared<bool>) -> Self {
        self.outer_active = Some(flag);
        self
    }

    /// Called when a pinch starts.
    #[must_use]
    pub fn on_gesture_start(mut self, cb: impl FnMut() + 'static) -> Self {
        self.hooks.on_gesture_start = Some(Box::new(cb));
        self
    }

    /// Called when a pinch is released.
    #[must_use]
    pub fn on_gesture_release(mut self, cb: impl FnMut() + 'static) -> Self {
        self.hooks.on_gesture_release = Some(Box::new(cb));
        self
    }

    /// Called once the snap-back animation settled.
    #[must_use]
    pub fn on_end(mut self, cb: impl FnMut() + 'static) -> Self {
        self.hooks.on_end = Some(Rc::new(RefCell::new(cb)));
        self
    }

    /// Called after a frame when the scale changed.
    #[must_use]
    pub fn on_scale(mut self, cb: impl FnMut(f64) + 'static) -> Self {
        self.on_scale = Some(Box::new(cb));
        self
    }

    /// Called after a frame when the at-rest signal changed.
    #[must_use]
    pub fn on_state_change(mut self, cb: impl FnMut(bool) + 'static) -> Self {
        self.on_state_change = Some(Box::new(cb));
        self
    }

    /// Validate inputs and build the image.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::MissingSource`] when no source was given.
    /// - [`GalleryError::InvalidDimensions`] for unusable sizes.
    /// - [`GalleryError::Config`] when `min_scale > max_scale`.
    #[allow(clippy::float_cmp)]
    pub fn build(self) -> GalleryResult<ScalableImage> {
        let source = self.source.ok_or(GalleryError::MissingSource)?;
        if self.config.min_scale > self.config.max_scale {
            return Err(GalleryError::Config(
                "scalable min_scale exceeds max_scale".into(),
            ));
        }
        let width = self.canvas.map_or(self.window_width, |c| c.width);
        let target = normalize_dimensions(self.image, width)?;
        let canvas = self.canvas.unwrap_or(target).validate("canvas")?;

        let scale = self.runtime.value(1.0);
        let scale_translation = VectorValue::zero(&self.runtime);
        let at_rest = Shared::new(true);

        let (reader, signal) = (scale.clone(), at_rest.clone());
        let translation = scale_translation.clone();
        let mut on_change = self.on_state_change;
        self.runtime.react(
            move || reader.get() == 1.0 && translation.is_zero(),
            move |rest, _| {
                signal.set(*rest);
                if let Some(cb) = on_change.as_mut() {
                    cb(*rest);
                }
            },
        );
        if let Some(mut cb) = self.on_scale {
            let reader = scale.clone();
            self.runtime.react(move || reader.get(), move |s, _| cb(*s));
        }

        let engine = Engine {
            config: self.config,
            canvas: Vec2::new(canvas.width, canvas.height),
            scale,
            scale_offset: Shared::new(1.0),
            scale_translation,
            loaded: Shared::new(false),
            outer_active: self.outer_active,
            hooks: self.hooks,
        };

        Ok(ScalableImage {
            source,
            target,
            engine,
            pinch: GestureDispatcher::new("scalable.pinch", self.platform),
            at_rest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::GestureState;
    use std::cell::Cell;
    use GestureState::{Active, Began, End, Undetermined};

    fn image(rt: &FrameRuntime) -> ScalableImage {
        let img = ScalableImage::builder(rt)
            .source("feed.jpg")
            .image_size(400.0, 300.0)
            .window_width(375.0)
            .build()
            .unwrap();
        img.mark_loaded();
        img
    }

    fn event(old: GestureState, new: GestureState, scale: f64) -> GestureEvent {
        GestureEvent::new(old, new)
            .with_pointers(2)
            .with_scale(scale)
            .with_focal(100.0, 100.0)
    }

    #[test]
    fn test_canvas_defaults_to_target() {
        let rt = FrameRuntime::new();
        let img = image(&rt);
        assert!((img.target_size().height - 281.25).abs() < 1e-9);
    }

    #[test]
    fn test_missing_source() {
        let rt = FrameRuntime::new();
        let err = ScalableImage::builder(&rt)
            .image_size(1.0, 1.0)
            .window_width(375.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, GalleryError::MissingSource));
    }

    #[test]
    fn test_scale_clamped_without_overshoot() {
        let rt = FrameRuntime::new();
        let mut img = image(&rt);
        img.on_pinch_event(&event(Undetermined, Began, 1.0));
        img.on_pinch_event(&event(Began, Active, 10.0));
        assert!((img.style().scale - 3.0).abs() < f64::EPSILON);
        assert!(!img.is_at_rest());
    }

    #[test]
    fn test_release_snaps_back_and_calls_on_end() {
        let rt = FrameRuntime::new();
        let ended = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        let (e, r) = (ended.clone(), released.clone());
        let mut img = ScalableImage::builder(&rt)
            .source("feed.jpg")
            .image_size(400.0, 300.0)
            .window_width(375.0)
            .on_gesture_release(move || r.set(r.get() + 1))
            .on_end(move || e.set(e.get() + 1))
            .build()
            .unwrap();
        img.mark_loaded();

        img.on_pinch_event(&event(Undetermined, Began, 1.0));
        img.on_pinch_event(&event(Began, Active, 2.0));
        let mid = img.style();
        assert!((mid.scale - 2.0).abs() < f64::EPSILON);
        assert!(mid.translate_x.abs() > 0.0);
        img.on_pinch_event(&event(Active, End, 2.0));
        assert_eq!(released.get(), 1);

        rt.frame(0.0);
        rt.run_until_idle(0.0, 16.0, 100);
        assert!(img.is_at_rest());
        assert!(img.at_rest_signal().get());
        assert_eq!(ended.get(), 1);
    }

    #[test]
    fn test_zoomed_image_rejects_new_pinch() {
        let rt = FrameRuntime::new();
        let mut img = image(&rt);
        img.engine.scale.set(1.5);
        img.on_pinch_event(&event(Undetermined, Began, 1.0));
        img.on_pinch_event(&event(Began, Active, 2.0));
        assert!((img.style().scale - 1.5).abs() < f64::EPSILON);
    }
}
