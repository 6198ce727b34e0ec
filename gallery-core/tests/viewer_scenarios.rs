//! Viewer Integration Tests
//!
//! Drives the public components end to end through recognizer events and
//! frame ticks:
//! - Integrator termination and clamping
//! - Transform boundaries after pinch and pan
//! - Pager index clamping, friction, and arbitration with a zoomed page
//! - Swipe-to-dismiss velocity floor

use gallery_core::{
    friction, Animation, Decay, DecayConfig, FrameRuntime, GestureEvent, GestureState,
    ImageTransformer, Pager, PagerConfig, SwipeOutcome, Swipeout,
};
use proptest::prelude::*;

use GestureState::{Active, Began, End, Undetermined};

const WINDOW: (f64, f64) = (375.0, 667.0);

/// Run frames 16 ms apart, continuing from the last frame.
fn settle(rt: &FrameRuntime) {
    let start = rt.last_frame().unwrap_or(0.0);
    rt.frame(start);
    rt.run_until_idle(start, 16.0, 2000);
}

fn transformer(rt: &FrameRuntime, width: f64, height: f64) -> ImageTransformer {
    let t = ImageTransformer::builder(rt)
        .source("https://example.com/photo.jpg")
        .image_size(width, height)
        .window(WINDOW.0, WINDOW.1)
        .build()
        .unwrap();
    t.mark_loaded();
    t
}

fn pinch(t: &mut ImageTransformer, scale: f64, focal: (f64, f64)) {
    let event = |old, new, s| {
        GestureEvent::new(old, new)
            .with_scale(s)
            .with_focal(focal.0, focal.1)
            .with_pointers(2)
    };
    t.on_pinch_event(&event(Undetermined, Began, 1.0));
    t.on_pinch_event(&event(Began, Active, scale));
    t.on_pinch_event(&event(Active, End, scale));
}

fn horizontal_swipe(p: &mut Pager, dx: f64, vx: f64) {
    let event = |old, new, tx| {
        GestureEvent::new(old, new)
            .with_translation(tx, 0.0)
            .with_velocity(vx, 0.0)
    };
    p.on_pan_event(&event(Undetermined, Began, 0.0));
    p.on_pan_event(&event(Began, Active, 0.0));
    p.on_pan_event(&event(Active, Active, dx));
    p.on_pan_event(&event(Active, End, dx));
}

// ============================================================================
// Integrators
// ============================================================================

#[test]
fn test_decay_terminates() {
    let mut decay = Decay::new(1000.0, DecayConfig::default());
    decay.start(0.0, 0.0);
    let mut now = 0.0;
    let mut steps = 0;
    loop {
        now += 16.0;
        steps += 1;
        if decay.step(now) {
            break;
        }
        assert!(steps < 1000, "decay did not settle");
    }
    assert!(decay.velocity().abs() < 5.0);
    assert!(decay.current() > 0.0);
}

#[test]
fn test_decay_clamps_exactly_at_bound() {
    let mut decay = Decay::clamped(1000.0, 0.998, 0.0, 100.0);
    decay.start(0.0, 0.0);
    let mut now = 0.0;
    loop {
        now += 16.0;
        let settled = decay.step(now);
        assert!(decay.current() <= 100.0);
        if settled {
            break;
        }
    }
    assert!((decay.current() - 100.0).abs() < f64::EPSILON);
}

// ============================================================================
// Transform engine
// ============================================================================

#[test]
fn test_offset_past_top_springs_to_boundary() {
    let rt = FrameRuntime::new();
    let mut t = transformer(&rt, 375.0, 703.0);
    // zoom around the window centre so no focal translation is introduced
    pinch(&mut t, 2.0, (187.5, 333.5));
    settle(&rt);
    assert!((t.style().scale - 2.0).abs() < f64::EPSILON);

    let bounds = t.boundaries();
    assert!((bounds.y - 369.5).abs() < 1e-9);
    assert!((bounds.x - 187.5).abs() < 1e-9);

    t.on_pan_event(&GestureEvent::new(Undetermined, Began));
    t.on_pan_event(&GestureEvent::new(Began, Active).with_translation(0.0, 400.0));
    t.on_pan_event(&GestureEvent::new(Active, End).with_translation(0.0, 400.0));
    settle(&rt);

    let offset = t.state().offset.get();
    assert!(offset.x.abs() < 1e-9);
    assert!((offset.y - 369.5).abs() < 1e-9);
}

#[test]
fn test_pinch_end_to_end() {
    let rt = FrameRuntime::new();
    let mut t = transformer(&rt, 400.0, 300.0);
    pinch(&mut t, 2.0, (200.0, 150.0));
    settle(&rt);

    let style = t.style();
    let bounds = t.boundaries();
    assert!((style.scale - 2.0).abs() < f64::EPSILON);
    assert!(style.translate_x.abs() <= bounds.x);
    assert!(style.translate_y.abs() <= bounds.y);
    assert!(!t.at_rest_signal().get());
}

// ============================================================================
// Pager
// ============================================================================

#[test]
fn test_pager_last_page_clamps_index() {
    let rt = FrameRuntime::new();
    let mut pager = Pager::builder(&rt, 5)
        .width(WINDOW.0)
        .config(PagerConfig {
            initial_index: 4,
            ..PagerConfig::default()
        })
        .build()
        .unwrap();
    horizontal_swipe(&mut pager, -120.0, -2000.0);
    settle(&rt);
    assert_eq!(pager.index(), 4);
    assert_eq!(pager.active_index(), 4);
    assert!((pager.translate_x() - pager.page_translate(4)).abs() < 1e-6);
}

#[test]
fn test_pager_yields_to_zoomed_page() {
    let rt = FrameRuntime::new();
    let mut pager = Pager::builder(&rt, 3).width(WINDOW.0).build().unwrap();
    let page_state = pager.page_state();
    let mut image = ImageTransformer::builder(&rt)
        .source("https://example.com/photo.jpg")
        .image_size(400.0, 300.0)
        .window(WINDOW.0, WINDOW.1)
        .on_state_change(move |at_rest| page_state.set(at_rest))
        .build()
        .unwrap();
    image.mark_loaded();

    pinch(&mut image, 2.0, (200.0, 150.0));
    settle(&rt);
    assert!(!pager.page_state().get());

    horizontal_swipe(&mut pager, -150.0, -900.0);
    settle(&rt);
    assert_eq!(pager.index(), 0);

    image.reset(false);
    rt.frame(rt.last_frame().unwrap_or(0.0) + 16.0);
    assert!(pager.page_state().get());

    horizontal_swipe(&mut pager, -150.0, -900.0);
    settle(&rt);
    assert_eq!(pager.index(), 1);
}

proptest! {
    #[test]
    fn prop_friction_compresses_monotonically(a in 0.0f64..500.0, b in 0.0f64..500.0) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(friction(large) >= friction(small));
        prop_assert!(friction(-large) <= friction(-small));
        prop_assert!(friction(large) <= 30.0);
    }
}

#[test]
fn test_friction_below_input() {
    for d in [20.0, 50.0] {
        assert!(friction(d) < d);
    }
    assert!(friction(50.0) >= friction(20.0));
}

// ============================================================================
// Swipe-to-dismiss
// ============================================================================

#[test]
fn test_swipe_velocity_floor() {
    let rt = FrameRuntime::new();
    let mut swipe = Swipeout::builder(&rt).window_height(WINDOW.1).build().unwrap();
    let event = |old, new, ty| {
        GestureEvent::new(old, new)
            .with_translation(0.0, ty)
            .with_velocity(0.0, 500.0)
    };
    swipe.on_pan_event(&event(Undetermined, Began, 0.0));
    swipe.on_pan_event(&event(Began, Active, 90.0));
    swipe.on_pan_event(&event(Active, End, 140.0));

    let release = swipe.last_release().unwrap();
    assert_eq!(release.outcome, SwipeOutcome::Dismissed);
    assert!((release.velocity - 1200.0).abs() < f64::EPSILON);
}
