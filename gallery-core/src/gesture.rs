//! Gesture-event dispatcher: turns a recognizer's raw state-change stream
//! into ordered lifecycle callbacks.
//!
//! # State Machine
//!
//! ```text
//! UNDETERMINED(0) ─▶ BEGAN(2) ─▶ ACTIVE(4) ─▶ END(5)
//!                       │            ├──────▶ FAILED(1)
//!                       └────────────┴──────▶ CANCELLED(3)
//! ```
//!
//! Every event runs the same fixed sequence:
//!
//! 1. `on_init` once per session
//! 2. `on_event`
//! 3. `before_each`
//! 4. begin detection through the platform [`BeginDetection`] strategy
//! 5. on the begin frame, `should_handle_event` decides the session's skip flag
//! 6. unless skipped: `on_start`, `on_active`, `on_end` / `on_fail` / `on_cancel`
//! 7. leaving `ACTIVE`: clear the skip flag and call `on_finish`
//! 8. `after_each`
//!
//! # Invariants
//!
//! 1. `on_finish` fires if and only if the event leaves `ACTIVE`. A
//!    session that fails straight from `BEGAN` never sees `on_end`, `on_fail`,
//!    or `on_finish`.
//! 2. `on_finish` fires even for skipped sessions; components rely on it to
//!    reset shared state exactly once.
//! 3. `on_start` fires at most once per session.
//! 4. Plain updates carry `old_state == state` and never count as leaving
//!    `ACTIVE`.
//! 5. The session context is reset after the event that carries a terminal
//!    state, so the next session starts from `C::default()`.
//!
//! # Failure Modes
//!
//! - If begin detection never matches (e.g. the alternate platform receives
//!   `UNDETERMINED → ACTIVE` directly) the skip flag stays undetermined and
//!   `on_active` still fires without a preceding `on_start`.

use std::collections::HashMap;
use std::fmt;

use crate::event::{GestureEvent, GestureState, Platform};

/// Name under which the recognizer state is diff-tracked.
const STATE_DIFF_KEY: &str = "pinchState";

/// Lifecycle callbacks for one recognizer. All methods default to no-ops.
///
/// Callbacks run synchronously within the frame and must not block.
#[allow(unused_variables)]
pub trait GestureHandlers<C> {
    /// First event of a session.
    fn on_init(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// Every event, regardless of arbitration.
    fn on_event(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// Decide, on the begin frame, whether this session drives state.
    fn should_handle_event(&mut self, event: &GestureEvent, ctx: &mut C) -> bool {
        true
    }

    /// Every event, before lifecycle callbacks.
    fn before_each(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// Begin frame of a handled session.
    fn on_start(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// Every `ACTIVE` event of a handled session.
    fn on_active(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// `ACTIVE → END` of a handled session.
    fn on_end(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// `ACTIVE → FAILED` of a handled session.
    fn on_fail(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// `ACTIVE → CANCELLED` of a handled session.
    fn on_cancel(&mut self, event: &GestureEvent, ctx: &mut C) {}

    /// Leaving `ACTIVE` for any state, handled or skipped.
    fn on_finish(&mut self, event: &GestureEvent, ctx: &mut C, cancelled_or_failed: bool) {}

    /// Every event, last.
    fn after_each(&mut self, event: &GestureEvent, ctx: &mut C) {}
}

/// Strategy deciding whether an event is the begin frame of a session.
pub trait BeginDetection: fmt::Debug {
    /// `state_diff` is the change of the numeric state code since the
    /// previous event of the session (zero on the first event).
    fn is_begin(&self, event: &GestureEvent, state_diff: f64) -> bool;
}

/// Begin is the `BEGAN` state itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateBegan;

impl BeginDetection for StateBegan {
    fn is_begin(&self, event: &GestureEvent, _state_diff: f64) -> bool {
        event.state == GestureState::Began
    }
}

/// Begin is the first `ACTIVE` event directly following `BEGAN`.
///
/// Multi-finger recognizers on some platforms deliver `BEGAN` before the
/// second pointer lands, so the reliable begin is the jump to `ACTIVE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveAfterBegan;

impl BeginDetection for ActiveAfterBegan {
    fn is_begin(&self, event: &GestureEvent, state_diff: f64) -> bool {
        let gap = GestureState::Active.code() - GestureState::Began.code();
        state_diff == gap && event.state == GestureState::Active
    }
}

impl Platform {
    /// The begin-detection strategy for this platform.
    #[must_use]
    pub fn begin_detection(self) -> Box<dyn BeginDetection> {
        match self {
            Self::Ios => Box::new(StateBegan),
            Self::Android => Box::new(ActiveAfterBegan),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DiffEntry {
    stash: f64,
    prev: Option<f64>,
}

/// Per-name frame-to-frame delta tracking.
#[derive(Debug, Clone, Default)]
pub struct DiffTracker {
    entries: HashMap<&'static str, DiffEntry>,
}

impl DiffTracker {
    /// Record `value` under `name` and return its change since the previous
    /// record (zero the first time).
    pub fn diff(&mut self, name: &'static str, value: f64) -> f64 {
        let entry = self.entries.entry(name).or_default();
        entry.stash = entry.prev.map_or(0.0, |prev| value - prev);
        entry.prev = Some(value);
        entry.stash
    }

    /// Last delta computed for `name`.
    #[must_use]
    pub fn last(&self, name: &str) -> Option<f64> {
        self.entries.get(name).map(|e| e.stash)
    }

    /// Forget every tracked name.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Default)]
struct Session<C> {
    data: C,
    initialized: bool,
    skip: Option<bool>,
    diffs: DiffTracker,
}

/// Dispatcher for one recognizer instance, owning its session context `C`.
pub struct GestureDispatcher<C> {
    name: &'static str,
    detection: Box<dyn BeginDetection>,
    session: Session<C>,
}

impl<C: fmt::Debug> fmt::Debug for GestureDispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureDispatcher")
            .field("name", &self.name)
            .field("detection", &self.detection)
            .field("session", &self.session)
            .finish()
    }
}

impl<C: Default> GestureDispatcher<C> {
    /// Dispatcher using the strategy for `platform`.
    #[must_use]
    pub fn new(name: &'static str, platform: Platform) -> Self {
        Self::with_detection(name, platform.begin_detection())
    }

    /// Dispatcher with an explicit begin-detection strategy.
    #[must_use]
    pub fn with_detection(name: &'static str, detection: Box<dyn BeginDetection>) -> Self {
        Self {
            name,
            detection,
            session: Session::default(),
        }
    }

    /// Feed one event through the handler set.
    pub fn dispatch<H>(&mut self, event: &GestureEvent, handlers: &mut H)
    where
        H: GestureHandlers<C> + ?Sized,
    {
        let session = &mut self.session;

        if !session.initialized {
            session.initialized = true;
            handlers.on_init(event, &mut session.data);
        }

        handlers.on_event(event, &mut session.data);
        handlers.before_each(event, &mut session.data);

        let state_diff = session.diffs.diff(STATE_DIFF_KEY, event.state.code());
        let is_begin = self.detection.is_begin(event, state_diff);

        if is_begin {
            let handle = handlers.should_handle_event(event, &mut session.data);
            session.skip = Some(!handle);
            tracing::debug!(recognizer = self.name, handle, "session begin");
        }

        let leaving_active =
            event.old_state == GestureState::Active && event.state != GestureState::Active;

        let skipped = session.skip == Some(true);
        if !skipped {
            if is_begin {
                handlers.on_start(event, &mut session.data);
            }
            if event.state == GestureState::Active {
                handlers.on_active(event, &mut session.data);
            }
            if leaving_active {
                match event.state {
                    GestureState::End => handlers.on_end(event, &mut session.data),
                    GestureState::Failed => handlers.on_fail(event, &mut session.data),
                    GestureState::Cancelled => handlers.on_cancel(event, &mut session.data),
                    _ => {}
                }
            }
        }

        if leaving_active {
            session.skip = None;
            let cancelled_or_failed =
                matches!(event.state, GestureState::Cancelled | GestureState::Failed);
            tracing::trace!(
                recognizer = self.name,
                state = ?event.state,
                cancelled_or_failed,
                "session finish"
            );
            handlers.on_finish(event, &mut session.data, cancelled_or_failed);
        }

        handlers.after_each(event, &mut session.data);

        if event.state.is_terminal() {
            self.session = Session::default();
        }
    }

    /// Drop the current session without firing callbacks.
    pub fn reset(&mut self) {
        self.session = Session::default();
    }
}

impl<C> GestureDispatcher<C> {
    /// Recognizer name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The current session context.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.session.data
    }

    /// Whether the current session was rejected by `should_handle_event`.
    #[must_use]
    pub fn is_skipping(&self) -> bool {
        self.session.skip == Some(true)
    }

    /// Whether a session is in progress.
    #[must_use]
    pub fn in_session(&self) -> bool {
        self.session.initialized
    }
}
