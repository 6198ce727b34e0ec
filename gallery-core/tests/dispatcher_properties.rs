//! Gesture Dispatcher Integration Tests
//!
//! Checks callback ordering and skip propagation over generated recognizer
//! sessions on both begin-detection strategies.

use gallery_core::{GestureDispatcher, GestureEvent, GestureHandlers, GestureState, Platform};
use proptest::prelude::*;

use GestureState::{Active, Began, Cancelled, End, Failed, Undetermined};

/// Counts every callback, in order.
#[derive(Debug, Default)]
struct Recorder {
    handle: bool,
    log: Vec<&'static str>,
}

impl Recorder {
    fn new(handle: bool) -> Self {
        Self {
            handle,
            log: Vec::new(),
        }
    }

    fn count(&self, name: &str) -> usize {
        self.log.iter().filter(|n| **n == name).count()
    }
}

impl GestureHandlers<()> for Recorder {
    fn on_init(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("init");
    }
    fn on_event(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("event");
    }
    fn should_handle_event(&mut self, _: &GestureEvent, _: &mut ()) -> bool {
        self.log.push("should_handle");
        self.handle
    }
    fn before_each(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("before");
    }
    fn on_start(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("start");
    }
    fn on_active(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("active");
    }
    fn on_end(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("end");
    }
    fn on_fail(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("fail");
    }
    fn on_cancel(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("cancel");
    }
    fn on_finish(&mut self, _: &GestureEvent, _: &mut (), _: bool) {
        self.log.push("finish");
    }
    fn after_each(&mut self, _: &GestureEvent, _: &mut ()) {
        self.log.push("after");
    }
}

/// A well-formed session: `UNDETERMINED → BEGAN`, `actives` active frames,
/// then `terminal` from the last state.
fn session(actives: usize, terminal: GestureState) -> Vec<GestureEvent> {
    let mut events = vec![GestureEvent::new(Undetermined, Began)];
    let mut last = Began;
    for _ in 0..actives {
        events.push(GestureEvent::new(last, Active));
        last = Active;
    }
    events.push(GestureEvent::new(last, terminal));
    events
}

fn run(platform: Platform, handle: bool, events: &[GestureEvent]) -> Recorder {
    let mut dispatcher: GestureDispatcher<()> = GestureDispatcher::new("test", platform);
    let mut recorder = Recorder::new(handle);
    for event in events {
        dispatcher.dispatch(event, &mut recorder);
    }
    recorder
}

fn terminal_state() -> impl Strategy<Value = GestureState> {
    prop_oneof![Just(End), Just(Failed), Just(Cancelled)]
}

fn platform() -> impl Strategy<Value = Platform> {
    prop_oneof![Just(Platform::Ios), Just(Platform::Android)]
}

// ============================================================================
// Fixed sequences
// ============================================================================

#[test]
fn test_handled_session_order() {
    let recorder = run(Platform::Ios, true, &session(1, End));
    assert_eq!(
        recorder.log,
        vec![
            "init", "event", "before", "should_handle", "start", "after", // began
            "event", "before", "active", "after", // active
            "event", "before", "end", "finish", "after", // end
        ]
    );
}

#[test]
fn test_android_starts_on_first_active() {
    let recorder = run(Platform::Android, true, &session(2, End));
    let start = recorder.log.iter().position(|n| *n == "start").unwrap();
    let first_active = recorder.log.iter().position(|n| *n == "active").unwrap();
    assert!(start < first_active);
    // the BEGAN event itself does not start the session
    assert_eq!(recorder.log[..5], ["init", "event", "before", "after", "event"]);
}

#[test]
fn test_failure_from_began_never_finishes() {
    let recorder = run(Platform::Ios, true, &session(0, Failed));
    assert_eq!(recorder.count("finish"), 0);
    assert_eq!(recorder.count("fail"), 0);
    assert_eq!(recorder.count("start"), 1);
}

#[test]
fn test_back_to_back_sessions_reinitialize() {
    let mut events = session(1, End);
    events.extend(session(1, Cancelled));
    let recorder = run(Platform::Ios, true, &events);
    assert_eq!(recorder.count("init"), 2);
    assert_eq!(recorder.count("start"), 2);
    assert_eq!(recorder.count("finish"), 2);
    assert_eq!(recorder.count("cancel"), 1);
}

// ============================================================================
// Generated sessions
// ============================================================================

proptest! {
    #[test]
    fn prop_finish_iff_session_was_active(
        actives in 0usize..6,
        terminal in terminal_state(),
        platform in platform(),
        handle in any::<bool>(),
    ) {
        let recorder = run(platform, handle, &session(actives, terminal));
        let expected = usize::from(actives > 0);
        prop_assert_eq!(recorder.count("finish"), expected);
    }

    #[test]
    fn prop_start_once_per_active_session(
        actives in 1usize..6,
        terminal in terminal_state(),
        platform in platform(),
    ) {
        let recorder = run(platform, true, &session(actives, terminal));
        prop_assert_eq!(recorder.count("start"), 1);
        prop_assert_eq!(recorder.count("active"), actives);
        let terminal_callbacks =
            recorder.count("end") + recorder.count("fail") + recorder.count("cancel");
        prop_assert_eq!(terminal_callbacks, 1);
    }

    #[test]
    fn prop_skipped_session_sees_only_ambient_callbacks(
        actives in 1usize..6,
        terminal in terminal_state(),
        platform in platform(),
    ) {
        let events = session(actives, terminal);
        let recorder = run(platform, false, &events);
        for name in ["start", "active", "end", "fail", "cancel"] {
            prop_assert_eq!(recorder.count(name), 0, "{} fired for a skipped session", name);
        }
        for name in ["event", "before", "after"] {
            prop_assert_eq!(recorder.count(name), events.len());
        }
        prop_assert_eq!(recorder.count("should_handle"), 1);
    }

    #[test]
    fn prop_sessions_are_independent(
        first in 1usize..4,
        second in 1usize..4,
        handle_first in any::<bool>(),
    ) {
        let mut dispatcher: GestureDispatcher<()> = GestureDispatcher::new("test", Platform::Ios);
        let mut skipped = Recorder::new(handle_first);
        for event in session(first, End) {
            dispatcher.dispatch(&event, &mut skipped);
        }
        let mut handled = Recorder::new(true);
        for event in session(second, End) {
            dispatcher.dispatch(&event, &mut handled);
        }
        prop_assert_eq!(handled.count("start"), 1);
        prop_assert_eq!(handled.count("active"), second);
    }
}
