//! Reactive values driven by the frame loop.
//!
//! Every piece of continuous state in the viewer (scale, offsets, page
//! position, dismiss translation) lives in an [`AnimatedValue`]. A value is
//! either set immediately or handed an [`Animation`] that the
//! [`FrameRuntime`] steps once per frame until it settles.
//!
//! ```text
//! gesture event ──▶ handler writes value ──▶ frame(now) steps animations
//!                                             │
//!                                             ├─▶ reactions (pull observers)
//!                                             └─▶ main-context queue drained
//! ```
//!
//! # Ownership
//!
//! Values are `Rc`-shared handles: any component may read them, but exactly
//! one logical owner writes a value during a gesture session. Starting a new
//! animation on a value always cancels the previous one first, so two
//! integrators never race on the same value.
//!
//! # Contexts
//!
//! Gesture callbacks and animation completions run synchronously inside the
//! frame ("UI context"). Work that belongs to the host application (index
//! change notifications, overlay visibility) is deferred with
//! [`FrameRuntime::run_on_main`] and runs when the frame finishes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::animation::Animation;

/// Frame timestamp in milliseconds.
pub type FrameTime = f64;

/// Completion callback for an animation. Receives `true` when the animation
/// settled and `false` when it was cancelled or replaced.
pub type CompletionCallback = Box<dyn FnOnce(bool)>;

type Task = Box<dyn FnOnce()>;

struct Running {
    animation: Box<dyn Animation>,
    started: bool,
    on_complete: Option<CompletionCallback>,
}

struct Slot {
    value: f64,
    version: u64,
    running: Option<Running>,
    registered: bool,
}

impl Slot {
    fn write(&mut self, value: f64) {
        self.value = value;
        self.version = self.version.wrapping_add(1);
    }
}

#[derive(Default)]
struct RuntimeInner {
    active: RefCell<Vec<Weak<RefCell<Slot>>>>,
    reactions: RefCell<Vec<Box<dyn FnMut()>>>,
    main_queue: RefCell<VecDeque<Task>>,
    ui_queue: RefCell<VecDeque<Task>>,
    last_frame: Cell<Option<FrameTime>>,
    frames: Cell<u64>,
}

/// The frame loop that drives animations, reactions, and deferred work.
///
/// Cloning a runtime produces another handle to the same loop.
#[derive(Clone, Default)]
pub struct FrameRuntime {
    inner: Rc<RuntimeInner>,
}

impl fmt::Debug for FrameRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRuntime")
            .field("active", &self.active_animations())
            .field("frames", &self.inner.frames.get())
            .field("last_frame", &self.inner.last_frame.get())
            .finish()
    }
}

impl FrameRuntime {
    /// Create a new, idle runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value owned by this runtime.
    #[must_use]
    pub fn value(&self, initial: f64) -> AnimatedValue {
        AnimatedValue {
            slot: Rc::new(RefCell::new(Slot {
                value: initial,
                version: 0,
                running: None,
                registered: false,
            })),
            runtime: self.clone(),
        }
    }

    /// Timestamp of the most recent frame, if any frame ran yet.
    #[must_use]
    pub fn last_frame(&self) -> Option<FrameTime> {
        self.inner.last_frame.get()
    }

    /// Number of frames processed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.inner.frames.get()
    }

    /// Number of values with an in-flight animation.
    #[must_use]
    pub fn active_animations(&self) -> usize {
        self.inner
            .active
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether any animation is still running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active_animations() == 0
    }

    /// Run one frame at `now` (milliseconds).
    ///
    /// Order: queued UI work, animation steps, completion callbacks,
    /// reactions, then the main-context queue.
    pub fn frame(&self, now: FrameTime) {
        self.inner.last_frame.set(Some(now));
        self.inner.frames.set(self.inner.frames.get() + 1);

        Self::drain(&self.inner.ui_queue);

        let snapshot = std::mem::take(&mut *self.inner.active.borrow_mut());
        let mut keep = Vec::with_capacity(snapshot.len());
        let mut completions: Vec<CompletionCallback> = Vec::new();

        for weak in snapshot {
            let Some(slot) = weak.upgrade() else {
                continue;
            };
            let mut guard = slot.borrow_mut();
            let Some(mut running) = guard.running.take() else {
                guard.registered = false;
                continue;
            };

            if !running.started {
                running.animation.start(guard.value, now);
                running.started = true;
            }
            let settled = running.animation.step(now);
            let current = running.animation.current();
            guard.write(current);

            if settled {
                guard.registered = false;
                tracing::trace!(value = current, "animation settled");
                if let Some(cb) = running.on_complete.take() {
                    completions.push(cb);
                }
            } else {
                guard.running = Some(running);
                keep.push(weak.clone());
            }
        }

        self.inner.active.borrow_mut().extend(keep);

        for cb in completions {
            cb(true);
        }

        self.run_reactions();
        self.flush_main();
    }

    /// Advance frames of `step` milliseconds until every animation settled or
    /// `max_frames` ran. Returns the timestamp of the last frame.
    pub fn run_until_idle(&self, start: FrameTime, step: FrameTime, max_frames: usize) -> FrameTime {
        let mut now = start;
        for _ in 0..max_frames {
            now += step;
            self.frame(now);
            if self.is_idle() {
                break;
            }
        }
        now
    }

    /// Register an observer evaluated after every frame.
    ///
    /// `prepare` is read each frame; `effect` runs when the result differs
    /// from the previous frame (and once on the first frame).
    pub fn react<T, P, E>(&self, mut prepare: P, mut effect: E)
    where
        T: PartialEq + Clone + 'static,
        P: FnMut() -> T + 'static,
        E: FnMut(&T, Option<&T>) + 'static,
    {
        let mut previous: Option<T> = None;
        self.inner.reactions.borrow_mut().push(Box::new(move || {
            let next = prepare();
            if previous.as_ref() != Some(&next) {
                effect(&next, previous.as_ref());
                previous = Some(next);
            }
        }));
    }

    /// Defer `task` to the main context. It runs at the end of the current
    /// (or next) frame, or on [`flush_main`](Self::flush_main).
    pub fn run_on_main(&self, task: impl FnOnce() + 'static) {
        self.inner.main_queue.borrow_mut().push_back(Box::new(task));
    }

    /// Defer `task` to the start of the next frame.
    pub fn run_on_ui(&self, task: impl FnOnce() + 'static) {
        self.inner.ui_queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run all queued main-context work now.
    pub fn flush_main(&self) {
        Self::drain(&self.inner.main_queue);
    }

    /// Number of main-context tasks waiting.
    #[must_use]
    pub fn pending_main(&self) -> usize {
        self.inner.main_queue.borrow().len()
    }

    fn drain(queue: &RefCell<VecDeque<Task>>) {
        loop {
            let next = queue.borrow_mut().pop_front();
            match next {
                Some(task) => task(),
                None => break,
            }
        }
    }

    fn run_reactions(&self) {
        // Reactions registered while running are kept for the next frame.
        let mut reactions = std::mem::take(&mut *self.inner.reactions.borrow_mut());
        for reaction in &mut reactions {
            reaction();
        }
        let mut slot = self.inner.reactions.borrow_mut();
        let added = std::mem::take(&mut *slot);
        *slot = reactions;
        slot.extend(added);
    }

    fn register(&self, slot: &Rc<RefCell<Slot>>) {
        self.inner.active.borrow_mut().push(Rc::downgrade(slot));
    }
}

/// Anything whose changes can be observed through a version counter.
pub trait Source {
    /// Monotonic change counter; bumps on every write.
    fn version(&self) -> u64;
}

/// A shared numeric value that may be driven by an animation.
#[derive(Clone)]
pub struct AnimatedValue {
    slot: Rc<RefCell<Slot>>,
    runtime: FrameRuntime,
}

impl fmt::Debug for AnimatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("AnimatedValue")
            .field("value", &slot.value)
            .field("animating", &slot.running.is_some())
            .finish()
    }
}

impl AnimatedValue {
    /// Current value. Mid-animation this is the latest frame's value.
    #[must_use]
    pub fn get(&self) -> f64 {
        self.slot.borrow().value
    }

    /// Set the value immediately, cancelling any running animation.
    pub fn set(&self, value: f64) {
        let cancelled = {
            let mut slot = self.slot.borrow_mut();
            let cancelled = slot.running.take();
            slot.write(value);
            cancelled
        };
        Self::notify_cancelled(cancelled);
    }

    /// Add `delta` to the current value immediately.
    pub fn add(&self, delta: f64) {
        self.set(self.get() + delta);
    }

    /// Drive the value with `animation`.
    pub fn animate(&self, animation: impl Animation + 'static) {
        self.start(Box::new(animation), None);
    }

    /// Drive the value with `animation`, calling `on_complete` when it
    /// settles (`true`) or is cancelled (`false`).
    pub fn animate_with(
        &self,
        animation: impl Animation + 'static,
        on_complete: impl FnOnce(bool) + 'static,
    ) {
        self.start(Box::new(animation), Some(Box::new(on_complete)));
    }

    /// Halt the running animation, freezing the current value.
    pub fn cancel(&self) {
        let cancelled = self.slot.borrow_mut().running.take();
        Self::notify_cancelled(cancelled);
    }

    /// Whether an animation is driving this value.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.slot.borrow().running.is_some()
    }

    /// Instantaneous velocity of the running animation (units per second),
    /// or zero when idle.
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.slot
            .borrow()
            .running
            .as_ref()
            .filter(|r| r.started)
            .map_or(0.0, |r| r.animation.velocity())
    }

    /// The runtime this value belongs to.
    #[must_use]
    pub fn runtime(&self) -> &FrameRuntime {
        &self.runtime
    }

    fn start(&self, mut animation: Box<dyn Animation>, on_complete: Option<CompletionCallback>) {
        let started = match self.runtime.last_frame() {
            Some(now) => {
                animation.start(self.get(), now);
                true
            }
            None => false,
        };
        let (cancelled, needs_register) = {
            let mut slot = self.slot.borrow_mut();
            let cancelled = slot.running.replace(Running {
                animation,
                started,
                on_complete,
            });
            let needs_register = !slot.registered;
            slot.registered = true;
            (cancelled, needs_register)
        };
        if needs_register {
            self.runtime.register(&self.slot);
        }
        Self::notify_cancelled(cancelled);
    }

    fn notify_cancelled(cancelled: Option<Running>) {
        if let Some(cb) = cancelled.and_then(|mut r| r.on_complete.take()) {
            cb(false);
        }
    }
}

impl Source for AnimatedValue {
    fn version(&self) -> u64 {
        self.slot.borrow().version
    }
}

#[derive(Debug)]
struct SharedSlot<T: Copy> {
    value: Cell<T>,
    version: Cell<u64>,
}

/// A shared, non-animated value such as a flag, index, or recognizer state.
#[derive(Debug, Clone)]
pub struct Shared<T: Copy> {
    slot: Rc<SharedSlot<T>>,
}

impl<T: Copy> Shared<T> {
    /// Create a new shared value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(SharedSlot {
                value: Cell::new(value),
                version: Cell::new(0),
            }),
        }
    }

    /// Read the value.
    #[must_use]
    pub fn get(&self) -> T {
        self.slot.value.get()
    }

    /// Write the value.
    pub fn set(&self, value: T) {
        self.slot.value.set(value);
        self.slot.version.set(self.slot.version.get().wrapping_add(1));
    }

    /// Write the value and return the previous one.
    pub fn replace(&self, value: T) -> T {
        let previous = self.get();
        self.set(value);
        previous
    }
}

impl<T: Copy + Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Copy> Source for Shared<T> {
    fn version(&self) -> u64 {
        self.slot.version.get()
    }
}

/// A value computed from declared inputs, recomputed on read when any input
/// changed.
pub struct Derived<T: Clone> {
    inputs: Vec<Box<dyn Source>>,
    compute: Box<dyn Fn() -> T>,
    cache: RefCell<Option<(Vec<u64>, T)>>,
}

impl<T: Clone + fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("inputs", &self.inputs.len())
            .field("cached", &self.cache.borrow().as_ref().map(|(_, v)| v.clone()))
            .finish()
    }
}

impl<T: Clone> Derived<T> {
    /// Create a derived value over `inputs`.
    #[must_use]
    pub fn new(inputs: Vec<Box<dyn Source>>, compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inputs,
            compute: Box::new(compute),
            cache: RefCell::new(None),
        }
    }

    /// Current value, recomputed only if an input changed since the last read.
    #[must_use]
    pub fn get(&self) -> T {
        let versions: Vec<u64> = self.inputs.iter().map(|s| s.version()).collect();
        if let Some((seen, value)) = self.cache.borrow().as_ref() {
            if *seen == versions {
                return value.clone();
            }
        }
        let value = (self.compute)();
        *self.cache.borrow_mut() = Some((versions, value.clone()));
        value
    }
}
