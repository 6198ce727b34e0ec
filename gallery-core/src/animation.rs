//! Frame-stepped animation integrators.
//!
//! Three integrators drive [`AnimatedValue`](crate::value::AnimatedValue)s:
//!
//! - [`Spring`]: damped harmonic oscillator, semi-implicit Euler with fixed
//!   sub-steps so large frame gaps stay stable.
//! - [`Timing`]: duration-based interpolation through an [`Easing`] curve.
//! - [`Decay`]: exponential velocity decay with optional clamp bounds, used
//!   for fling gestures.
//!
//! # Invariants
//!
//! 1. `start` is called exactly once, before the first `step`.
//! 2. `step` returns `true` on the settling frame and the value it leaves in
//!    [`Animation::current`] is final.
//! 3. Velocities are in units per second; timestamps in milliseconds.

use serde::{Deserialize, Serialize};

/// A frame-stepped integrator.
pub trait Animation {
    /// Capture the starting value and timestamp.
    fn start(&mut self, value: f64, now: f64);

    /// Advance to `now`. Returns `true` once settled.
    fn step(&mut self, now: f64) -> bool;

    /// Value after the most recent step.
    fn current(&self) -> f64;

    /// Velocity after the most recent step, in units per second.
    fn velocity(&self) -> f64;
}

/// Largest timestep fed to a single integrator update, in milliseconds.
const MAX_FRAME_GAP_MS: f64 = 64.0;

/// Spring sub-step size in seconds.
const SPRING_SUBSTEP_SECS: f64 = 0.001;

/// Spring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Spring constant.
    pub stiffness: f64,
    /// Damping coefficient.
    pub damping: f64,
    /// Attached mass.
    pub mass: f64,
    /// Settle immediately when the target is crossed.
    pub overshoot_clamping: bool,
    /// Distance to target below which the spring may rest.
    pub rest_displacement_threshold: f64,
    /// Speed below which the spring may rest.
    pub rest_speed_threshold: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
            overshoot_clamping: false,
            rest_displacement_threshold: 0.001,
            rest_speed_threshold: 0.001,
        }
    }
}

impl SpringConfig {
    /// Damping that makes this spring critically damped.
    #[must_use]
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }
}

/// Spring animation toward a target.
#[derive(Debug, Clone)]
pub struct Spring {
    to: f64,
    config: SpringConfig,
    initial_velocity: f64,
    from: f64,
    position: f64,
    velocity: f64,
    last: f64,
}

impl Spring {
    /// Spring toward `to`.
    #[must_use]
    pub fn new(to: f64, config: SpringConfig) -> Self {
        Self {
            to,
            config,
            initial_velocity: 0.0,
            from: 0.0,
            position: 0.0,
            velocity: 0.0,
            last: 0.0,
        }
    }

    /// Seed the spring with an initial velocity (units per second).
    #[must_use]
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.initial_velocity = velocity;
        self
    }

    /// Target value.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.to
    }

    /// The configured initial velocity.
    #[must_use]
    pub fn initial_velocity(&self) -> f64 {
        self.initial_velocity
    }

    fn integrate(&mut self, dt: f64) {
        let displacement = self.position - self.to;
        let force = -self.config.stiffness * displacement - self.config.damping * self.velocity;
        let acceleration = force / self.config.mass.max(f64::EPSILON);
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    fn overshot(&self) -> bool {
        (self.from < self.to && self.position > self.to)
            || (self.from > self.to && self.position < self.to)
    }
}

impl Animation for Spring {
    fn start(&mut self, value: f64, now: f64) {
        self.from = value;
        self.position = value;
        self.velocity = self.initial_velocity;
        self.last = now;
    }

    fn step(&mut self, now: f64) -> bool {
        let elapsed = (now - self.last).clamp(0.0, MAX_FRAME_GAP_MS) / 1000.0;
        self.last = now;

        let mut remaining = elapsed;
        while remaining > 0.0 {
            let dt = remaining.min(SPRING_SUBSTEP_SECS);
            self.integrate(dt);
            remaining -= dt;
            if self.config.overshoot_clamping && self.overshot() {
                break;
            }
        }

        let at_rest = (self.position - self.to).abs() <= self.config.rest_displacement_threshold
            && self.velocity.abs() <= self.config.rest_speed_threshold;
        if at_rest || (self.config.overshoot_clamping && self.overshot()) {
            self.position = self.to;
            self.velocity = 0.0;
            return true;
        }
        false
    }

    fn current(&self) -> f64 {
        self.position
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}

/// Easing curve for [`Timing`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    /// Identity curve.
    Linear,
    /// CSS-style cubic Bézier through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
    CubicBezier {
        /// First control point x.
        x1: f64,
        /// First control point y.
        y1: f64,
        /// Second control point x.
        x2: f64,
        /// Second control point y.
        y2: f64,
    },
}

impl Default for Easing {
    fn default() -> Self {
        Self::Linear
    }
}

impl Easing {
    /// Cubic Bézier easing.
    #[must_use]
    pub const fn bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// Map linear progress `t ∈ [0, 1]` through the curve.
    #[must_use]
    pub fn ease(&self, t: f64) -> f64 {
        match *self {
            Self::Linear => t.clamp(0.0, 1.0),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, fraction: f64) -> f64 {
    if fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;
    let derivative = |a: f64, b: f64, c: f64, t: f64| (3.0 * a * t + 2.0 * b) * t + c;

    // Newton-Raphson for the parametric t matching x, bisection if it stalls.
    let mut t = fraction;
    let mut converged = false;
    for _ in 0..8 {
        let x = sample(ax, bx, cx, t) - fraction;
        if x.abs() < 1e-7 {
            converged = true;
            break;
        }
        let dx = derivative(ax, bx, cx, t);
        if dx.abs() < 1e-7 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    if !converged {
        let (mut lo, mut hi) = (0.0, 1.0);
        t = fraction;
        for _ in 0..32 {
            let delta = sample(ax, bx, cx, t) - fraction;
            if delta.abs() < 1e-7 {
                break;
            }
            if delta > 0.0 {
                hi = t;
            } else {
                lo = t;
            }
            t = 0.5 * (lo + hi);
        }
    }

    sample(ay, by, cy, t)
}

/// Duration and easing of a [`Timing`] animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Easing curve.
    pub easing: Easing,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300.0,
            easing: Easing::bezier(0.42, 0.0, 0.58, 1.0),
        }
    }
}

/// Duration-based interpolation toward a target.
#[derive(Debug, Clone)]
pub struct Timing {
    to: f64,
    config: TimingConfig,
    from: f64,
    started_at: f64,
    position: f64,
    velocity: f64,
    last: f64,
}

impl Timing {
    /// Interpolate toward `to`.
    #[must_use]
    pub fn new(to: f64, config: TimingConfig) -> Self {
        Self {
            to,
            config,
            from: 0.0,
            started_at: 0.0,
            position: 0.0,
            velocity: 0.0,
            last: 0.0,
        }
    }

    /// Target value.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.to
    }
}

impl Animation for Timing {
    fn start(&mut self, value: f64, now: f64) {
        self.from = value;
        self.position = value;
        self.started_at = now;
        self.last = now;
    }

    fn step(&mut self, now: f64) -> bool {
        let progress = if self.config.duration_ms <= 0.0 {
            1.0
        } else {
            ((now - self.started_at) / self.config.duration_ms).clamp(0.0, 1.0)
        };

        let previous = self.position;
        if progress >= 1.0 {
            self.position = self.to;
        } else {
            self.position = self.from + (self.to - self.from) * self.config.easing.ease(progress);
        }

        let dt = now - self.last;
        self.velocity = if dt > 0.0 {
            (self.position - previous) / dt * 1000.0
        } else {
            0.0
        };
        self.last = now;

        progress >= 1.0
    }

    fn current(&self) -> f64 {
        self.position
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}

/// Velocity below which a decay settles, in units per second.
pub const DECAY_VELOCITY_EPSILON: f64 = 5.0;

/// Parameters of a [`Decay`] animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Per-millisecond velocity retention factor in `(0, 1)`.
    pub deceleration: f64,
    /// Optional `[min, max]` bounds.
    pub clamp: Option<[f64; 2]>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            deceleration: 0.998,
            clamp: None,
        }
    }
}

/// Exponential velocity decay.
///
/// Each frame, with `Δt = min(now − last, 64)`:
///
/// ```text
/// kv = d^Δt
/// kx = d·(1 − kv) / (1 − d)
/// x += (v/1000)·kx
/// v  = v·kv
/// ```
///
/// Settles when `|v| < 5` or when a clamp bound in the direction of the
/// initial velocity is reached, in which case the value snaps to the bound.
#[derive(Debug, Clone)]
pub struct Decay {
    config: DecayConfig,
    initial_velocity: f64,
    position: f64,
    velocity: f64,
    last: f64,
}

impl Decay {
    /// Decay starting at `velocity` (units per second).
    #[must_use]
    pub fn new(velocity: f64, config: DecayConfig) -> Self {
        Self {
            config,
            initial_velocity: velocity,
            position: 0.0,
            velocity,
            last: 0.0,
        }
    }

    /// Decay with default deceleration clamped to `[min, max]`.
    #[must_use]
    pub fn clamped(velocity: f64, deceleration: f64, min: f64, max: f64) -> Self {
        Self::new(
            velocity,
            DecayConfig {
                deceleration,
                clamp: Some([min, max]),
            },
        )
    }

    fn reached_bound(&self) -> Option<f64> {
        let [min, max] = self.config.clamp?;
        if self.initial_velocity < 0.0 && self.position <= min {
            Some(min)
        } else if self.initial_velocity > 0.0 && self.position >= max {
            Some(max)
        } else {
            None
        }
    }
}

impl Animation for Decay {
    fn start(&mut self, value: f64, now: f64) {
        self.position = value;
        self.velocity = self.initial_velocity;
        self.last = now;
    }

    fn step(&mut self, now: f64) -> bool {
        let d = self.config.deceleration;
        let dt = (now - self.last).clamp(0.0, MAX_FRAME_GAP_MS);
        self.last = now;

        let kv = d.powf(dt);
        let kx = d * (1.0 - kv) / (1.0 - d);
        let v0 = self.velocity / 1000.0;
        self.position += v0 * kx;
        self.velocity = v0 * kv * 1000.0;

        let bound = self.reached_bound();
        if let Some(bound) = bound {
            self.position = bound;
        }
        bound.is_some() || self.velocity.abs() < DECAY_VELOCITY_EPSILON
    }

    fn current(&self) -> f64 {
        self.position
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}

/// Linear interpolation of `value` from `input` range to `output` range,
/// clamped to the output range.
#[must_use]
pub fn interpolate(value: f64, input: [f64; 2], output: [f64; 2]) -> f64 {
    let span = input[1] - input[0];
    if span == 0.0 {
        return output[0];
    }
    let t = ((value - input[0]) / span).clamp(0.0, 1.0);
    output[0] + (output[1] - output[0]) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(animation: &mut dyn Animation, from: f64, frame_ms: f64, max_frames: usize) -> usize {
        animation.start(from, 0.0);
        for frame in 1..=max_frames {
            #[allow(clippy::cast_precision_loss)]
            let now = frame as f64 * frame_ms;
            if animation.step(now) {
                return frame;
            }
        }
        max_frames + 1
    }

    #[test]
    fn test_spring_settles_at_target() {
        let mut spring = Spring::new(10.0, SpringConfig::default());
        let frames = run(&mut spring, 0.0, 16.0, 1000);
        assert!(frames <= 1000);
        assert!((spring.current() - 10.0).abs() < f64::EPSILON);
        assert!(spring.velocity().abs() < f64::EPSILON);
    }

    #[test]
    fn test_spring_overshoot_clamping_never_passes_target() {
        let config = SpringConfig {
            stiffness: 300.0,
            damping: 5.0,
            overshoot_clamping: true,
            ..SpringConfig::default()
        };
        let mut spring = Spring::new(100.0, config);
        spring.start(0.0, 0.0);
        let mut now = 0.0;
        loop {
            now += 16.0;
            let done = spring.step(now);
            assert!(spring.current() <= 100.0);
            if done {
                break;
            }
        }
        assert!((spring.current() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spring_initial_velocity_moves_away_first() {
        let mut spring = Spring::new(0.0, SpringConfig::default()).with_velocity(-500.0);
        spring.start(0.0, 0.0);
        spring.step(16.0);
        assert!(spring.current() < 0.0);
    }

    #[test]
    fn test_spring_at_target_settles_immediately() {
        let mut spring = Spring::new(5.0, SpringConfig::default());
        assert_eq!(run(&mut spring, 5.0, 16.0, 10), 1);
    }

    #[test]
    fn test_timing_linear() {
        let config = TimingConfig {
            duration_ms: 100.0,
            easing: Easing::Linear,
        };
        let mut timing = Timing::new(10.0, config);
        timing.start(0.0, 0.0);
        assert!(!timing.step(25.0));
        assert!((timing.current() - 2.5).abs() < 1e-9);
        assert!(timing.step(100.0));
        assert!((timing.current() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timing_zero_duration_is_immediate() {
        let config = TimingConfig {
            duration_ms: 0.0,
            easing: Easing::Linear,
        };
        let mut timing = Timing::new(3.0, config);
        assert_eq!(run(&mut timing, 0.0, 16.0, 5), 1);
        assert!((timing.current() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bezier_endpoints_and_monotonic() {
        let easing = Easing::bezier(0.33, 0.01, 0.0, 1.0);
        assert!(easing.ease(0.0).abs() < f64::EPSILON);
        assert!((easing.ease(1.0) - 1.0).abs() < f64::EPSILON);
        let mut prev = 0.0;
        for i in 1..=20 {
            let y = easing.ease(f64::from(i) / 20.0);
            assert!(y >= prev - 1e-9);
            prev = y;
        }
    }

    #[test]
    fn test_bezier_linear_control_points() {
        let easing = Easing::bezier(0.0, 0.0, 1.0, 1.0);
        assert!((easing.ease(0.5) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_decay_terminates() {
        let mut decay = Decay::new(1000.0, DecayConfig::default());
        let frames = run(&mut decay, 0.0, 16.0, 10_000);
        assert!(frames <= 10_000);
        assert!(decay.velocity().abs() < DECAY_VELOCITY_EPSILON);
        assert!(decay.current() > 0.0);
    }

    #[test]
    fn test_decay_clamp_snaps_to_upper_bound() {
        let mut decay = Decay::clamped(1000.0, 0.998, 0.0, 100.0);
        decay.start(0.0, 0.0);
        let mut now = 0.0;
        loop {
            now += 16.0;
            let done = decay.step(now);
            assert!(decay.current() <= 100.0);
            if done {
                break;
            }
        }
        assert!((decay.current() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decay_negative_velocity_snaps_to_lower_bound() {
        let mut decay = Decay::clamped(-2000.0, 0.998, -50.0, 50.0);
        run(&mut decay, 0.0, 16.0, 1000);
        assert!((decay.current() + 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decay_frame_gap_capped() {
        let mut slow = Decay::new(1000.0, DecayConfig::default());
        slow.start(0.0, 0.0);
        slow.step(500.0);
        let mut capped = Decay::new(1000.0, DecayConfig::default());
        capped.start(0.0, 0.0);
        capped.step(64.0);
        assert!((slow.current() - capped.current()).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_clamps() {
        assert!((interpolate(50.0, [0.0, 100.0], [1.0, 0.7]) - 0.85).abs() < 1e-9);
        assert!((interpolate(500.0, [0.0, 100.0], [1.0, 0.7]) - 0.7).abs() < 1e-9);
        assert!((interpolate(-5.0, [0.0, 100.0], [1.0, 0.7]) - 1.0).abs() < 1e-9);
    }
}
