//! Swipe-to-dismiss.
//!
//! A vertical pan drags the content; on release it is either flung off
//! screen or pulled back. Optionally a backdrop fades with the drag distance
//! the way the lightbox presents it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::animation::{interpolate, Spring, Timing, TimingConfig};
use crate::config::SwipeoutConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::event::{GestureEvent, Platform};
use crate::gesture::{GestureDispatcher, GestureHandlers};
use crate::value::{AnimatedValue, FrameRuntime, Shared};

/// Extra distance past the dismiss target at which the fling animation is
/// cut off.
const OFFSCREEN_MARGIN: f64 = 100.0;

/// Result of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// The content is flung off screen.
    Dismissed,
    /// The content springs back.
    Cancelled,
}

/// What the last release decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwipeRelease {
    /// Dismiss or cancel.
    pub outcome: SwipeOutcome,
    /// Spring target.
    pub target: f64,
    /// Velocity the spring was seeded with.
    pub velocity: f64,
}

/// Pan session state. Swipe-to-dismiss keeps none.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeoutContext;

type Hook = Box<dyn FnMut()>;
type TranslateHook = Box<dyn FnMut(f64)>;

#[derive(Default)]
struct Hooks {
    on_active: Option<TranslateHook>,
    on_swipe_success: Option<Hook>,
    on_swipe_failure: Option<Hook>,
    callback: Option<Rc<RefCell<dyn FnMut()>>>,
}

struct Engine {
    config: SwipeoutConfig,
    to_value: f64,
    translate_y: AnimatedValue,
    backdrop: Option<AnimatedValue>,
    competing: Option<Shared<bool>>,
    hooks: Hooks,
    last_release: Option<SwipeRelease>,
}

impl Engine {
    fn dismiss(&mut self, translation: f64, velocity: f64) -> SwipeRelease {
        let sign = if velocity < 0.0 { -1.0 } else { 1.0 };
        let target = sign * self.to_value * 2.0;
        let floor = self.config.velocity_floor;
        let velocity = if velocity.abs() < floor {
            sign * floor
        } else {
            velocity
        };

        tracing::info!(translation, target, velocity, "swipe dismissed");
        let callback = self.hooks.callback.clone();
        self.translate_y.animate_with(
            Spring::new(target, self.config.dismiss_spring).with_velocity(velocity),
            move |_finished| {
                if let Some(cb) = callback {
                    let mut cb = cb.borrow_mut();
                    (*cb)();
                }
            },
        );
        if let Some(cb) = self.hooks.on_swipe_success.as_mut() {
            cb();
        }
        if let Some(backdrop) = &self.backdrop {
            backdrop.animate(Timing::new(
                0.0,
                TimingConfig {
                    duration_ms: self.config.backdrop_fade_ms,
                    ..TimingConfig::default()
                },
            ));
        }

        SwipeRelease {
            outcome: SwipeOutcome::Dismissed,
            target,
            velocity,
        }
    }

    fn cancel(&mut self, translation: f64, velocity: f64) -> SwipeRelease {
        tracing::debug!(translation, velocity, "swipe cancelled");
        if let Some(cb) = self.hooks.on_swipe_failure.as_mut() {
            cb();
        }
        self.translate_y
            .animate(Spring::new(0.0, self.config.cancel_spring).with_velocity(velocity));
        if let Some(backdrop) = &self.backdrop {
            backdrop.animate(Timing::new(1.0, TimingConfig::default()));
        }

        SwipeRelease {
            outcome: SwipeOutcome::Cancelled,
            target: 0.0,
            velocity,
        }
    }
}

impl GestureHandlers<SwipeoutContext> for Engine {
    fn should_handle_event(&mut self, event: &GestureEvent, _ctx: &mut SwipeoutContext) -> bool {
        let competing = self.competing.as_ref().is_some_and(Shared::get);
        event.number_of_pointers == 1 && event.velocity_x.abs() < event.velocity_y.abs() && !competing
    }

    fn on_active(&mut self, event: &GestureEvent, _ctx: &mut SwipeoutContext) {
        let ty = event.translation_y;
        self.translate_y.set(ty);
        if let Some(backdrop) = &self.backdrop {
            backdrop.set(interpolate(
                ty.abs(),
                [0.0, self.to_value],
                [1.0, self.config.backdrop_min_opacity],
            ));
        }
        if let Some(cb) = self.hooks.on_active.as_mut() {
            cb(ty);
        }
    }

    fn on_end(&mut self, event: &GestureEvent, _ctx: &mut SwipeoutContext) {
        let (ty, vy) = (event.translation_y, event.velocity_y);
        let enough_velocity = vy.abs() > self.config.dismiss_velocity;
        let right_direction = (ty > 0.0 && vy > 0.0) || (ty < 0.0 && vy < 0.0);

        let release = if enough_velocity && right_direction {
            self.dismiss(ty, vy)
        } else {
            self.cancel(ty, vy)
        };
        self.last_release = Some(release);
    }
}

/// Vertical swipe-to-dismiss container.
pub struct Swipeout {
    engine: Engine,
    pan: GestureDispatcher<SwipeoutContext>,
}

impl fmt::Debug for Swipeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Swipeout")
            .field("to_value", &self.engine.to_value)
            .field("translate_y", &self.translate_y())
            .field("last_release", &self.engine.last_release)
            .finish_non_exhaustive()
    }
}

impl Swipeout {
    /// Start building a swipe-to-dismiss container on `runtime`.
    #[must_use]
    pub fn builder(runtime: &FrameRuntime) -> SwipeoutBuilder {
        SwipeoutBuilder::new(runtime)
    }

    /// Feed a pan recognizer event.
    pub fn on_pan_event(&mut self, event: &GestureEvent) {
        self.pan.dispatch(event, &mut self.engine);
    }

    /// Whether children may claim gestures: only while the content is not
    /// displaced.
    #[must_use]
    pub fn should_handle_event(&self) -> bool {
        self.engine.translate_y.get() == 0.0
    }

    /// Current vertical translation.
    #[must_use]
    pub fn translate_y(&self) -> f64 {
        self.engine.translate_y.get()
    }

    /// Backdrop opacity, when the backdrop is enabled.
    #[must_use]
    pub fn backdrop_opacity(&self) -> Option<f64> {
        self.engine.backdrop.as_ref().map(AnimatedValue::get)
    }

    /// Drag distance that maps to a full dismiss.
    #[must_use]
    pub fn to_value(&self) -> f64 {
        self.engine.to_value
    }

    /// Decision taken on the most recent release.
    #[must_use]
    pub fn last_release(&self) -> Option<SwipeRelease> {
        self.engine.last_release
    }

    /// Whether the content is animating.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.engine.translate_y.is_animating()
    }
}

/// Builder for [`Swipeout`].
pub struct SwipeoutBuilder {
    runtime: FrameRuntime,
    window_height: f64,
    config: SwipeoutConfig,
    platform: Platform,
    backdrop: bool,
    competing: Option<Shared<bool>>,
    hooks: Hooks,
    on_translate_change: Option<TranslateHook>,
}

impl fmt::Debug for SwipeoutBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwipeoutBuilder")
            .field("window_height", &self.window_height)
            .field("config", &self.config)
            .field("backdrop", &self.backdrop)
            .finish_non_exhaustive()
    }
}

impl SwipeoutBuilder {
    fn new(runtime: &FrameRuntime) -> Self {
        Self {
            runtime: runtime.clone(),
            window_height: 0.0,
            config: SwipeoutConfig::default(),
            platform: Platform::default(),
            backdrop: false,
            competing: None,
            hooks: Hooks::default(),
            on_translate_change: None,
        }
    }

    /// Window height; the dismiss distance unless configured.
    #[must_use]
    pub fn window_height(mut self, height: f64) -> Self {
        self.window_height = height;
        self
    }

    /// Swipe settings.
    #[must_use]
    pub fn config(mut self, config: SwipeoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Platform for begin detection.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Drive a backdrop opacity from the drag, as the lightbox does.
    #[must_use]
    pub fn with_backdrop(mut self) -> Self {
        self.backdrop = true;
        self
    }

    /// Flag raised while a competing transform is mid-gesture.
    #[must_use]
    pub fn competing(mut self, flag: Shared<bool>) -> Self {
        self.competing = Some(flag);
        self
    }

    /// Called with the translation on every active event.
    #[must_use]
    pub fn on_active(mut self, cb: impl FnMut(f64) + 'static) -> Self {
        self.hooks.on_active = Some(Box::new(cb));
        self
    }

    /// Called after a frame when the translation changed.
    #[must_use]
    pub fn on_translate_change(mut self, cb: impl FnMut(f64) + 'static) -> Self {
        self.on_translate_change = Some(Box::new(cb));
        self
    }

    /// Called when a release dismisses.
    #[must_use]
    pub fn on_swipe_success(mut self, cb: impl FnMut() + 'static) -> Self {
        self.hooks.on_swipe_success = Some(Box::new(cb));
        self
    }

    /// Called when a release springs back.
    #[must_use]
    pub fn on_swipe_failure(mut self, cb: impl FnMut() + 'static) -> Self {
        self.hooks.on_swipe_failure = Some(Box::new(cb));
        self
    }

    /// Called once the dismiss animation stopped.
    #[must_use]
    pub fn callback(mut self, cb: impl FnMut() + 'static) -> Self {
        self.hooks.callback = Some(Rc::new(RefCell::new(cb)));
        self
    }

    /// Build the container.
    ///
    /// # Errors
    ///
    /// [`GalleryError::Config`] when the dismiss distance is not positive.
    pub fn build(self) -> GalleryResult<Swipeout> {
        let to_value = self.config.to_value.unwrap_or(self.window_height);
        if !(to_value.is_finite() && to_value > 0.0) {
            return Err(GalleryError::Config(format!(
                "swipeout to_value must be positive, got {to_value}"
            )));
        }

        let translate_y = self.runtime.value(0.0);
        let backdrop = self.backdrop.then(|| self.runtime.value(1.0));

        let (reader, cutoff) = (translate_y.clone(), translate_y.clone());
        let mut on_change = self.on_translate_change;
        self.runtime.react(
            move || reader.get(),
            move |value: &f64, _| {
                if let Some(cb) = on_change.as_mut() {
                    cb(*value);
                }
                if value.abs() >= to_value + OFFSCREEN_MARGIN && cutoff.is_animating() {
                    cutoff.cancel();
                }
            },
        );

        Ok(Swipeout {
            engine: Engine {
                config: self.config,
                to_value,
                translate_y,
                backdrop,
                competing: self.competing,
                hooks: self.hooks,
                last_release: None,
            },
            pan: GestureDispatcher::new("swipeout.pan", self.platform),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::GestureState::{self, Active, Began, End, Undetermined};
    use std::cell::Cell;

    const HEIGHT: f64 = 667.0;

    fn pan(old: GestureState, new: GestureState, ty: f64, vy: f64) -> GestureEvent {
        GestureEvent::new(old, new)
            .with_translation(0.0, ty)
            .with_velocity(0.0, vy)
    }

    fn drag(s: &mut Swipeout, ty: f64, vy: f64) {
        s.on_pan_event(&pan(Undetermined, Began, 0.0, vy));
        s.on_pan_event(&pan(Began, Active, ty / 2.0, vy));
        s.on_pan_event(&pan(Active, Active, ty, vy));
        s.on_pan_event(&pan(Active, End, ty, vy));
    }

    #[test]
    fn test_requires_positive_distance() {
        let rt = FrameRuntime::new();
        assert!(matches!(
            Swipeout::builder(&rt).build(),
            Err(GalleryError::Config(_))
        ));
    }

    #[test]
    fn test_slow_release_gets_velocity_floor() {
        let rt = FrameRuntime::new();
        let mut s = Swipeout::builder(&rt).window_height(HEIGHT).build().unwrap();
        drag(&mut s, 120.0, 500.0);
        let release = s.last_release().unwrap();
        assert_eq!(release.outcome, SwipeOutcome::Dismissed);
        assert!((release.velocity - 1200.0).abs() < f64::EPSILON);
        assert!((release.target - 1334.0).abs() < f64::EPSILON);

        drag(&mut s, -120.0, -500.0);
        let release = s.last_release().unwrap();
        assert!((release.velocity + 1200.0).abs() < f64::EPSILON);
        assert!((release.target + 1334.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fast_release_keeps_velocity() {
        let rt = FrameRuntime::new();
        let mut s = Swipeout::builder(&rt).window_height(HEIGHT).build().unwrap();
        drag(&mut s, 200.0, 2500.0);
        assert!((s.last_release().unwrap().velocity - 2500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrong_direction_springs_back() {
        let rt = FrameRuntime::new();
        let failures = Rc::new(Cell::new(0));
        let sink = failures.clone();
        let mut s = Swipeout::builder(&rt)
            .window_height(HEIGHT)
            .with_backdrop()
            .on_swipe_failure(move || sink.set(sink.get() + 1))
            .build()
            .unwrap();
        drag(&mut s, 200.0, -800.0);
        assert_eq!(s.last_release().unwrap().outcome, SwipeOutcome::Cancelled);
        assert_eq!(failures.get(), 1);
        assert!(!s.should_handle_event());

        rt.frame(0.0);
        rt.run_until_idle(0.0, 16.0, 500);
        assert!(s.translate_y().abs() < f64::EPSILON);
        assert!((s.backdrop_opacity().unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(s.should_handle_event());
    }

    #[test]
    fn test_backdrop_follows_drag() {
        let rt = FrameRuntime::new();
        let mut s = Swipeout::builder(&rt)
            .window_height(HEIGHT)
            .with_backdrop()
            .build()
            .unwrap();
        s.on_pan_event(&pan(Undetermined, Began, 0.0, 300.0));
        s.on_pan_event(&pan(Began, Active, HEIGHT / 2.0, 300.0));
        assert!((s.backdrop_opacity().unwrap() - 0.85).abs() < 1e-9);
        s.on_pan_event(&pan(Active, Active, HEIGHT * 3.0, 300.0));
        assert!((s.backdrop_opacity().unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_dismiss_cut_off_and_callback() {
        let rt = FrameRuntime::new();
        let done = Rc::new(Cell::new(0));
        let seen = Rc::new(Cell::new(0.0));
        let (d, t) = (done.clone(), seen.clone());
        let mut s = Swipeout::builder(&rt)
            .window_height(HEIGHT)
            .with_backdrop()
            .callback(move || d.set(d.get() + 1))
            .on_translate_change(move |y| t.set(y))
            .build()
            .unwrap();
        drag(&mut s, 150.0, 900.0);

        rt.frame(0.0);
        rt.run_until_idle(0.0, 16.0, 1000);
        assert!(!s.is_animating());
        assert_eq!(done.get(), 1);
        assert!(s.translate_y() >= HEIGHT + OFFSCREEN_MARGIN);
        assert!(s.translate_y() < HEIGHT * 2.0);
        assert!((seen.get() - s.translate_y()).abs() < f64::EPSILON);
        assert!(s.backdrop_opacity().unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_horizontal_drag_ignored() {
        let rt = FrameRuntime::new();
        let mut s = Swipeout::builder(&rt).window_height(HEIGHT).build().unwrap();
        let ev = |old, new| {
            GestureEvent::new(old, new)
                .with_translation(100.0, 10.0)
                .with_velocity(900.0, 50.0)
        };
        s.on_pan_event(&ev(Undetermined, Began));
        s.on_pan_event(&ev(Began, Active));
        s.on_pan_event(&ev(Active, End));
        assert!(s.last_release().is_none());
        assert!(s.translate_y().abs() < f64::EPSILON);
    }

    #[test]
    fn test_competing_transform_blocks() {
        let rt = FrameRuntime::new();
        let busy = Shared::new(true);
        let mut s = Swipeout::builder(&rt)
            .window_height(HEIGHT)
            .competing(busy.clone())
            .build()
            .unwrap();
        drag(&mut s, 150.0, 900.0);
        assert!(s.last_release().is_none());
        busy.set(false);
        drag(&mut s, 150.0, 900.0);
        assert!(s.last_release().is_some());
    }
}
