//! Pinch, pan, tap and double-tap zoom for a single image.
//!
//! Four recognizers feed one [`ImageTransformer`]. Each has its own
//! [`GestureDispatcher`] and session context; all of them write the shared
//! [`TransformState`]. The rendered transform is always
//! `scale_translation + translation + offset` for position and `scale` for
//! zoom.
//!
//! After every pan, pinch, or tap release the transformer settles: the
//! committed offset is sprung back inside the legal rectangle, flung with a
//! clamped decay, or re-centred when the image is not zoomed. Settling waits
//! until neither pan nor pinch is still in use.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::{Decay, Spring, Timing};
use crate::config::TransformerConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::event::{GestureEvent, GestureState, Platform, Size};
use crate::gesture::{GestureDispatcher, GestureHandlers};
use crate::value::{AnimatedValue, FrameRuntime, Shared};
use crate::vectors::{self, Vec2, VectorValue};

/// Which interaction started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// A pan of a zoomed image.
    Pan,
    /// A pinch.
    Scale,
}

/// Requests the transformer sends back to the host gesture runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerRequest {
    /// The pinch continued with a pointer count other than two; the host
    /// should end the pinch session so it finishes and settles.
    ResetPinch,
}

/// Render output of a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformStyle {
    /// Horizontal translation.
    pub translate_x: f64,
    /// Vertical translation.
    pub translate_y: f64,
    /// Zoom factor.
    pub scale: f64,
}

/// Continuous transform state shared with the render layer.
#[derive(Debug, Clone)]
pub struct TransformState {
    /// Current zoom.
    pub scale: AnimatedValue,
    /// Zoom committed by the last pinch.
    pub scale_offset: Shared<f64>,
    /// Committed pan position.
    pub offset: VectorValue,
    /// In-flight pan delta.
    pub translation: VectorValue,
    /// In-flight pinch-induced translation.
    pub scale_translation: VectorValue,
    /// Latest pan velocity.
    pub pan_velocity: VectorValue,
}

impl TransformState {
    fn new(runtime: &FrameRuntime) -> Self {
        Self {
            scale: runtime.value(1.0),
            scale_offset: Shared::new(1.0),
            offset: VectorValue::zero(runtime),
            translation: VectorValue::zero(runtime),
            scale_translation: VectorValue::zero(runtime),
            pan_velocity: VectorValue::zero(runtime),
        }
    }

    /// Scale 1 with no offset or translation.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_at_rest(&self) -> bool {
        self.scale.get() == 1.0
            && self.offset.is_zero()
            && self.translation.is_zero()
            && self.scale_translation.is_zero()
    }

    /// Current transform.
    #[must_use]
    pub fn style(&self) -> TransformStyle {
        let translate = vectors::sum([&self.scale_translation, &self.translation, &self.offset]);
        TransformStyle {
            translate_x: translate.x,
            translate_y: translate.y,
            scale: self.scale.get(),
        }
    }
}

/// Pan session context.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanContext {
    /// Translation of the current event.
    pub pan: Vec2,
    /// Translation accumulated while a second finger was down.
    pub pan_offset: Vec2,
}

/// Pinch session context.
#[derive(Debug, Clone, Copy)]
pub struct PinchContext {
    /// Focal point captured at begin, relative to the image centre.
    pub origin: Vec2,
    /// Current focal point relative to the image centre.
    pub adjust_focal: Vec2,
    /// Last in-range gesture scale.
    pub gesture_scale: f64,
    /// Scale to apply after this event.
    pub next_scale: f64,
    /// The session was rejected at begin.
    pub skipped: bool,
    /// A [`RecognizerRequest::ResetPinch`] was already queued.
    pub release_requested: bool,
}

impl Default for PinchContext {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            adjust_focal: Vec2::ZERO,
            gesture_scale: 1.0,
            next_scale: 1.0,
            skipped: false,
            release_requested: false,
        }
    }
}

/// Single-tap session context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapContext;

/// Double-tap session context.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleTapContext;

type FlagCallback = Box<dyn FnMut(bool)>;
type InteractionCallback = Box<dyn FnMut(InteractionType)>;

#[derive(Default)]
struct Callbacks {
    on_tap: Option<FlagCallback>,
    on_double_tap: Option<FlagCallback>,
    on_interaction: Option<InteractionCallback>,
}

struct Engine {
    config: TransformerConfig,
    canvas: Vec2,
    image: Vec2,
    state: TransformState,
    pan_state: Shared<GestureState>,
    pinch_state: Shared<GestureState>,
    loaded: Shared<bool>,
    outer_active: Option<Shared<bool>>,
    at_rest: Shared<bool>,
    callbacks: Callbacks,
    requests: Vec<RecognizerRequest>,
}

impl Engine {
    fn can_interact(&self) -> bool {
        let outer = self.outer_active.as_ref().is_some_and(Shared::get);
        !outer && self.loaded.get()
    }

    fn can_pan_vertically(&self) -> bool {
        self.canvas.y < self.image.y * self.state.scale.get()
    }

    fn timing(&self, to: f64) -> Timing {
        Timing::new(to, self.config.timing)
    }

    fn spring(&self, to: f64) -> Spring {
        Spring::new(to, self.config.spring)
    }

    fn interaction(&mut self, kind: InteractionType) {
        if let Some(cb) = self.callbacks.on_interaction.as_mut() {
            cb(kind);
        }
    }

    fn sync_rest(&self) {
        self.at_rest.set(self.state.is_at_rest());
    }

    fn reset(&self, animated: bool) {
        let state = &self.state;
        if animated {
            state.scale.animate(self.timing(1.0));
            state.scale_offset.set(1.0);
            state.offset.x.animate(self.timing(0.0));
            state.offset.y.animate(self.timing(0.0));
        } else {
            state.scale.set(1.0);
            state.scale_offset.set(1.0);
            state.translation.set(Vec2::ZERO);
            state.scale_translation.set(Vec2::ZERO);
            state.offset.set(Vec2::ZERO);
        }
    }

    /// Legal offset rectangle `[-max, max]` for the current scale.
    fn boundaries(&self) -> Vec2 {
        let fixed_scale = self
            .state
            .scale
            .get()
            .clamp(self.config.min_scale, self.config.max_scale);
        let scaled_height = self.image.y * fixed_scale;
        let right = self.canvas.x / 2.0 * (fixed_scale - 1.0);
        let top = if self.canvas.y < scaled_height {
            (scaled_height - self.canvas.y).abs() / 2.0
        } else {
            0.0
        };
        Vec2::new(right, top)
    }

    #[allow(clippy::float_cmp)]
    fn settle(&self) {
        let state = &self.state;
        let max = self.boundaries();
        let min = -max;

        // The vertical axis is re-centred whenever it cannot pan, even while
        // another recognizer is still in use.
        if !self.can_pan_vertically() {
            state.offset.y.animate(self.spring(0.0));
        }

        let pinch = self.pinch_state.get();
        let pinch_aborted = matches!(pinch, GestureState::Cancelled | GestureState::Failed);
        if (self.pan_state.get().is_in_use() || pinch.is_in_use()) && !pinch_aborted {
            tracing::debug!(pan = ?self.pan_state.get(), pinch = ?pinch, "settle deferred");
            return;
        }

        let scale = state.scale.get();
        if state.offset.is_zero()
            && state.translation.is_zero()
            && state.scale_translation.is_zero()
            && scale == 1.0
        {
            return;
        }

        if scale <= 1.0 {
            tracing::debug!(scale, "settle: re-centre");
            state.offset.x.animate(self.timing(0.0));
            state.offset.y.animate(self.timing(0.0));
            return;
        }

        let offset = state.offset.get();
        let target = offset.clamp(min, max);
        let velocity = state.pan_velocity.get();
        let deceleration = self.config.decay_deceleration;
        let within_max = scale <= self.config.max_scale;

        if target.x == offset.x {
            if velocity.x.abs() > 0.0 && within_max {
                state
                    .offset
                    .x
                    .animate(Decay::clamped(velocity.x, deceleration, min.x, max.x));
            }
        } else {
            state.offset.x.animate(self.spring(target.x));
        }

        if target.y == offset.y {
            if velocity.y.abs() > 0.0 && within_max && offset.y != min.y && offset.y != max.y {
                state
                    .offset
                    .y
                    .animate(Decay::clamped(velocity.y, deceleration, min.y, max.y));
            }
        } else {
            state.offset.y.animate(self.spring(target.y));
        }

        tracing::debug!(
            offset_x = offset.x,
            offset_y = offset.y,
            target_x = target.x,
            target_y = target.y,
            "settle: bounds"
        );
    }

    /// Zoom to the double-tap scale so `(x, y)` becomes the focal centre.
    fn scale_to(&self, x: f64, y: f64) {
        let scale = self.config.double_tap_scale;
        let state = &self.state;
        state.scale.animate(self.timing(scale));
        state.scale_offset.set(scale);

        let target_image = self.image * scale;
        let center = self.canvas * 0.5;
        let image_center = self.image * 0.5;

        let origin = -(target_image * 0.5 - center);
        let koef = Vec2::new(x, y).divide(image_center) - Vec2::splat(1.0);
        let mut target = origin.scale_by(koef);

        if target_image.y < self.canvas.y {
            target.y = 0.0;
        }

        state.offset.x.animate(self.timing(target.x));
        state.offset.y.animate(self.timing(target.y));
    }

    fn finish_pan(&self) {
        let state = &self.state;
        state.offset.set(state.offset.get() + state.translation.get());
        state.translation.set(Vec2::ZERO);
        self.settle();
        state.pan_velocity.set(Vec2::ZERO);
    }
}

impl GestureHandlers<PanContext> for Engine {
    fn should_handle_event(&mut self, _event: &GestureEvent, _ctx: &mut PanContext) -> bool {
        self.state.scale.get() > 1.0 && self.can_interact()
    }

    fn before_each(&mut self, event: &GestureEvent, ctx: &mut PanContext) {
        ctx.pan = Vec2::new(event.translation_x, event.translation_y);
        self.state
            .pan_velocity
            .set(Vec2::new(event.velocity_x, event.velocity_y));
    }

    fn on_start(&mut self, _event: &GestureEvent, ctx: &mut PanContext) {
        self.state.offset.cancel();
        ctx.pan_offset = Vec2::ZERO;
        self.interaction(InteractionType::Pan);
    }

    fn on_active(&mut self, event: &GestureEvent, ctx: &mut PanContext) {
        self.pan_state.set(event.state);

        if self.state.scale.get() <= 1.0 {
            return;
        }
        if event.number_of_pointers > 1 {
            // two-finger pan belongs to the pinch focal math
            ctx.pan_offset = ctx.pan;
        } else {
            let next = ctx.pan - ctx.pan_offset;
            self.state.translation.x.set(next.x);
            if self.can_pan_vertically() {
                self.state.translation.y.set(next.y);
            }
        }
    }

    fn on_end(&mut self, event: &GestureEvent, ctx: &mut PanContext) {
        self.pan_state.set(event.state);
        ctx.pan_offset = Vec2::ZERO;
        self.finish_pan();
    }

    fn on_finish(&mut self, _event: &GestureEvent, _ctx: &mut PanContext, cancelled_or_failed: bool) {
        if cancelled_or_failed && self.pan_state.get() == GestureState::Active {
            self.pan_state.set(GestureState::End);
            self.finish_pan();
        }
    }
}

impl GestureHandlers<PinchContext> for Engine {
    fn should_handle_event(&mut self, event: &GestureEvent, ctx: &mut PinchContext) -> bool {
        let handle = event.number_of_pointers == 2 && self.can_interact();
        ctx.skipped = !handle;
        handle
    }

    fn before_each(&mut self, event: &GestureEvent, ctx: &mut PinchContext) {
        let min = self.config.min_scale;
        let max = self.config.max_scale + self.config.over_scale;
        ctx.next_scale = (event.scale * self.state.scale_offset.get()).clamp(min, max);
        if ctx.next_scale > min && ctx.next_scale < max {
            ctx.gesture_scale = event.scale;
        }

        if event.number_of_pointers == 2 {
            let focal = Vec2::new(event.focal_x, event.focal_y);
            let center = self.canvas * 0.5;
            ctx.adjust_focal = focal - (center + self.state.offset.get());
        } else if event.state == GestureState::Active && !ctx.release_requested {
            ctx.release_requested = true;
            self.requests.push(RecognizerRequest::ResetPinch);
        }
    }

    fn after_each(&mut self, event: &GestureEvent, ctx: &mut PinchContext) {
        if ctx.skipped || matches!(event.state, GestureState::End | GestureState::Cancelled) {
            return;
        }
        self.state.scale.set(ctx.next_scale);
    }

    fn on_start(&mut self, _event: &GestureEvent, ctx: &mut PinchContext) {
        self.interaction(InteractionType::Scale);
        self.state.offset.cancel();
        ctx.origin = ctx.adjust_focal;
    }

    fn on_active(&mut self, event: &GestureEvent, ctx: &mut PinchContext) {
        self.pinch_state.set(event.state);
        let pinch = ctx.adjust_focal - ctx.origin;
        let next = pinch + ctx.origin - ctx.origin * ctx.gesture_scale;
        self.state.scale_translation.set(next);
    }

    fn on_finish(&mut self, event: &GestureEvent, ctx: &mut PinchContext, _cancelled_or_failed: bool) {
        if ctx.skipped {
            return;
        }
        ctx.gesture_scale = 1.0;
        self.pinch_state.set(event.state);

        let state = &self.state;
        let scale = state.scale.get();
        state.scale_offset.set(scale);
        state
            .offset
            .set(state.offset.get() + state.scale_translation.get());
        state.scale_translation.set(Vec2::ZERO);

        let max = self.config.max_scale;
        if scale < 1.0 {
            state.scale_offset.set(1.0);
            state.scale.animate(self.timing(1.0));
        } else if scale > max {
            state.scale_offset.set(max);
            state.scale.animate(self.timing(max));
        }

        self.settle();
    }
}

impl GestureHandlers<TapContext> for Engine {
    fn should_handle_event(&mut self, event: &GestureEvent, _ctx: &mut TapContext) -> bool {
        event.number_of_pointers == 1 && self.can_interact()
    }

    fn on_start(&mut self, _event: &GestureEvent, _ctx: &mut TapContext) {
        self.state.offset.cancel();
    }

    fn on_active(&mut self, _event: &GestureEvent, _ctx: &mut TapContext) {
        let scaled = self.state.scale.get() > 1.0;
        if let Some(cb) = self.callbacks.on_tap.as_mut() {
            cb(scaled);
        }
    }

    fn on_end(&mut self, _event: &GestureEvent, _ctx: &mut TapContext) {
        self.settle();
    }
}

impl GestureHandlers<DoubleTapContext> for Engine {
    fn should_handle_event(&mut self, event: &GestureEvent, _ctx: &mut DoubleTapContext) -> bool {
        event.number_of_pointers == 1 && self.can_interact()
    }

    fn on_active(&mut self, event: &GestureEvent, _ctx: &mut DoubleTapContext) {
        let scaled = self.state.scale.get() > 1.0;
        if let Some(cb) = self.callbacks.on_double_tap.as_mut() {
            cb(scaled);
        }
        if scaled {
            self.reset(true);
        } else {
            self.scale_to(event.x, event.y);
        }
    }
}

/// Zoomable, pannable image.
pub struct ImageTransformer {
    source: String,
    runtime: FrameRuntime,
    engine: Engine,
    pan: GestureDispatcher<PanContext>,
    pinch: GestureDispatcher<PinchContext>,
    tap: GestureDispatcher<TapContext>,
    double_tap: GestureDispatcher<DoubleTapContext>,
}

impl fmt::Debug for ImageTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageTransformer")
            .field("source", &self.source)
            .field("canvas", &self.engine.canvas)
            .field("image", &self.engine.image)
            .field("style", &self.style())
            .finish_non_exhaustive()
    }
}

impl ImageTransformer {
    /// Start building a transformer on `runtime`.
    #[must_use]
    pub fn builder(runtime: &FrameRuntime) -> TransformerBuilder {
        TransformerBuilder::new(runtime)
    }

    /// Feed a pan recognizer event.
    pub fn on_pan_event(&mut self, event: &GestureEvent) {
        self.pan.dispatch(event, &mut self.engine);
        self.engine.sync_rest();
    }

    /// Feed a pinch recognizer event.
    pub fn on_pinch_event(&mut self, event: &GestureEvent) {
        self.pinch.dispatch(event, &mut self.engine);
        self.engine.sync_rest();
    }

    /// Feed a single-tap recognizer event.
    pub fn on_tap_event(&mut self, event: &GestureEvent) {
        self.tap.dispatch(event, &mut self.engine);
        self.engine.sync_rest();
    }

    /// Feed a double-tap recognizer event.
    pub fn on_double_tap_event(&mut self, event: &GestureEvent) {
        self.double_tap.dispatch(event, &mut self.engine);
        self.engine.sync_rest();
    }

    /// The image finished loading; gestures are accepted from now on.
    pub fn mark_loaded(&self) {
        self.engine.loaded.set(true);
    }

    /// Whether gestures are accepted.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.engine.loaded.get()
    }

    /// Page visibility; an inactive page drops its zoom immediately.
    pub fn set_page_active(&self, active: bool) {
        if !active {
            tracing::debug!(source = %self.source, "page inactive, resetting transform");
            self.engine.reset(false);
            self.engine.sync_rest();
        }
    }

    /// Return to scale 1 and zero offset, animated or immediately.
    pub fn reset(&self, animated: bool) {
        self.engine.reset(animated);
        self.engine.sync_rest();
    }

    /// Current transform.
    #[must_use]
    pub fn style(&self) -> TransformStyle {
        self.engine.state.style()
    }

    /// Whether the image is unzoomed and untranslated.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.engine.state.is_at_rest()
    }

    /// Handle to the at-rest signal, refreshed after every event and frame.
    #[must_use]
    pub fn at_rest_signal(&self) -> Shared<bool> {
        self.engine.at_rest.clone()
    }

    /// Shared transform state.
    #[must_use]
    pub fn state(&self) -> &TransformState {
        &self.engine.state
    }

    /// Latest recorded pan recognizer state.
    #[must_use]
    pub fn pan_state(&self) -> GestureState {
        self.engine.pan_state.get()
    }

    /// Latest recorded pinch recognizer state.
    #[must_use]
    pub fn pinch_state(&self) -> GestureState {
        self.engine.pinch_state.get()
    }

    /// Drain requests for the host gesture runtime.
    pub fn take_requests(&mut self) -> Vec<RecognizerRequest> {
        std::mem::take(&mut self.engine.requests)
    }

    /// Image size scaled to the window width.
    #[must_use]
    pub fn target_size(&self) -> Size {
        Size::new(self.engine.image.x, self.engine.image.y)
    }

    /// Legal offset rectangle half-extents for the current scale.
    #[must_use]
    pub fn boundaries(&self) -> Vec2 {
        self.engine.boundaries()
    }

    /// Image source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runtime driving this transformer.
    #[must_use]
    pub fn runtime(&self) -> &FrameRuntime {
        &self.runtime
    }

    /// Pinch dispatcher, for inspecting the session context.
    #[must_use]
    pub fn pinch_dispatcher(&self) -> &GestureDispatcher<PinchContext> {
        &self.pinch
    }
}

/// Builder for [`ImageTransformer`].
pub struct TransformerBuilder {
    runtime: FrameRuntime,
    source: Option<String>,
    image: Size,
    window: Size,
    config: TransformerConfig,
    platform: Platform,
    outer_active: Option<Shared<bool>>,
    callbacks: Callbacks,
    on_state_change: Option<FlagCallback>,
}

impl fmt::Debug for TransformerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerBuilder")
            .field("source", &self.source)
            .field("image", &self.image)
            .field("window", &self.window)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl TransformerBuilder {
    fn new(runtime: &FrameRuntime) -> Self {
        Self {
            runtime: runtime.clone(),
            source: None,
            image: Size::default(),
            window: Size::default(),
            config: TransformerConfig::default(),
            platform: Platform::default(),
            outer_active: None,
            callbacks: Callbacks::default(),
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

    /// Window (canvas) size.
    #[must_use]
    pub fn window(mut self, width: f64, height: f64) -> Self {
        self.window = Size::new(width, height);
        self
    }

    /// Zoom settings.
    #[must_use]
    pub fn config(mut self, config: TransformerConfig) -> Self {
        self.config = config;
        self
    }

    /// Platform for begin detection.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Flag that, while set, makes every recognizer yield.
    #[must_use]
    pub fn outer_active(mut self, flag: Shared<bool>) -> Self {
        self.outer_active = Some(flag);
        self
    }

    /// Called on a single tap with whether the image is zoomed.
    #[must_use]
    pub fn on_tap(mut self, cb: impl FnMut(bool) + 'static) -> Self {
        self.callbacks.on_tap = Some(Box::new(cb));
        self
    }

    /// Called on a double tap with whether the image was zoomed.
    #[must_use]
    pub fn on_double_tap(mut self, cb: impl FnMut(bool) + 'static) -> Self {
        self.callbacks.on_double_tap = Some(Box::new(cb));
        self
    }

    /// Called when a pan or pinch starts driving the image.
    #[must_use]
    pub fn on_interaction(mut self, cb: impl FnMut(InteractionType) + 'static) -> Self {
        self.callbacks.on_interaction = Some(Box::new(cb));
        self
    }

    /// Called after a frame when the at-rest signal changes.
    #[must_use]
    pub fn on_state_change(mut self, cb: impl FnMut(bool) + 'static) -> Self {
        self.on_state_change = Some(Box::new(cb));
        self
    }

    /// Validate inputs and build the transformer.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::MissingSource`] when no source was given.
    /// - [`GalleryError::InvalidDimensions`] for unusable image or window sizes.
    /// - [`GalleryError::Config`] for invalid zoom settings.
    pub fn build(self) -> GalleryResult<ImageTransformer> {
        let source = self.source.ok_or(GalleryError::MissingSource)?;
        let window = self.window.validate("window")?;
        let image = self.image.validate("image")?;
        self.config.validate()?;

        let target_height = image.height / (image.width / window.width);
        let state = TransformState::new(&self.runtime);
        let at_rest = Shared::new(true);

        let reader = state.clone();
        let signal = at_rest.clone();
        let mut on_change = self.on_state_change;
        self.runtime.react(
            move || reader.is_at_rest(),
            move |rest, _| {
                signal.set(*rest);
                if let Some(cb) = on_change.as_mut() {
                    cb(*rest);
                }
            },
        );

        let engine = Engine {
            config: self.config,
            canvas: Vec2::new(window.width, window.height),
            image: Vec2::new(window.width, target_height),
            state,
            pan_state: Shared::new(GestureState::Undetermined),
            pinch_state: Shared::new(GestureState::Undetermined),
            loaded: Shared::new(false),
            outer_active: self.outer_active,
            at_rest,
            callbacks: self.callbacks,
            requests: Vec::new(),
        };

        Ok(ImageTransformer {
            source,
            runtime: self.runtime,
            engine,
            pan: GestureDispatcher::new("transformer.pan", self.platform),
            pinch: GestureDispatcher::new("transformer.pinch", self.platform),
            tap: GestureDispatcher::new("transformer.tap", self.platform),
            double_tap: GestureDispatcher::new("transformer.double_tap", self.platform),
        })
    }
}
