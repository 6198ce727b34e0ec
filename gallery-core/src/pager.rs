//! Horizontal pager.
//!
//! Pages sit side by side, `width + gutter` apart. The pager owns one pan
//! recognizer that drags the strip and one tap recognizer that re-settles it.
//! A drag commits to the neighbouring page only when the release is fast
//! enough and never crosses either end; otherwise the strip springs back.
//!
//! The pager yields the pan to the active page while that page reports it is
//! not at rest (see [`Pager::page_state`]) or while an outer gesture is active.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::animation::{Spring, SpringConfig};
use crate::config::{IndexChangeMode, PagerConfig};
use crate::error::{GalleryError, GalleryResult};
use crate::event::{GestureEvent, Platform};
use crate::gesture::{GestureDispatcher, GestureHandlers};
use crate::value::{AnimatedValue, Derived, FrameRuntime, Shared, Source};

const MAX_FRICTION: f64 = 30.0;
const FRICTION_RANGE: f64 = 200.0;

/// Rubber-band displacement for a drag of `value` past either end.
///
/// Grows linearly from 1 to 30 over the first 200 points and saturates
/// there; the sign follows `value`.
#[must_use]
pub fn friction(value: f64) -> f64 {
    let res = (1.0 + value.abs() * (MAX_FRICTION - 1.0) / FRICTION_RANGE).clamp(1.0, MAX_FRICTION);
    if value < 0.0 {
        -res
    } else {
        res
    }
}

/// Clamp the magnitude of `velocity` into `[min, max]` keeping its sign.
///
/// Zero counts as negative.
#[must_use]
pub fn clamp_velocity(velocity: f64, min: f64, max: f64) -> f64 {
    if velocity > 0.0 {
        velocity.clamp(min, max)
    } else {
        velocity.clamp(-max, -min)
    }
}

/// Whether page `index` falls inside the render window around `active`.
#[must_use]
pub fn should_render(index: usize, active: usize, diff: usize) -> bool {
    index.abs_diff(active) <= diff
}

/// Layout of one page in the strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSlot {
    /// Page index.
    pub index: usize,
    /// Left edge inside the strip.
    pub left: f64,
    /// Page width.
    pub width: f64,
    /// Gutter rendered after the page; zero for the last page.
    pub gutter: f64,
    /// `false` for placeholders outside the render window.
    pub rendered: bool,
}

/// Pan session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagerPanContext {
    /// Translation captured on the first active frame; the drag is measured
    /// from there.
    pub offset: Option<f64>,
}

/// Tap session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagerTapContext;

type IndexHook = Rc<RefCell<dyn FnMut(usize)>>;
type GestureHook = Box<dyn FnMut(&GestureEvent, bool)>;
type EnabledGestureHook = Box<dyn FnMut(&GestureEvent)>;
type GestureFilter = Box<dyn FnMut(&GestureEvent) -> bool>;

#[derive(Default)]
struct Hooks {
    on_index_change: Option<IndexHook>,
    on_gesture: Option<GestureHook>,
    on_enabled_gesture: Option<EnabledGestureHook>,
    should_handle: Option<GestureFilter>,
}

struct Engine {
    runtime: FrameRuntime,
    config: PagerConfig,
    spring: SpringConfig,
    width: f64,
    gutter: f64,
    length: usize,
    index: Shared<usize>,
    active_index: Shared<usize>,
    pending_index: Shared<Option<usize>>,
    offset_x: AnimatedValue,
    pager_x: Shared<f64>,
    velocity: Shared<f64>,
    page_at_rest: Shared<bool>,
    outer_active: Option<Shared<bool>>,
    in_progress: Derived<bool>,
    hooks: Hooks,
}

#[allow(clippy::cast_precision_loss)]
fn page_translate(index: usize, width: f64, gutter: f64) -> f64 {
    let i = index as f64;
    -(i * width + gutter * i)
}

impl Engine {
    fn page_translate(&self, index: usize) -> f64 {
        page_translate(index, self.width, self.gutter)
    }

    #[allow(clippy::cast_precision_loss)]
    fn can_swipe(&self, delta: f64) -> bool {
        let next = self.offset_x.get() + delta;
        if next > 0.0 {
            return false;
        }
        let pages = self.length.saturating_sub(1) as f64;
        let total = self.width * pages + self.gutter * pages;
        next.abs() < total
    }

    fn next_index(&self, velocity: f64) -> usize {
        let current = self.index.get();
        let current_translate = self.page_translate(current).abs();
        let current_offset = self.offset_x.get().abs();

        if velocity < 0.0 {
            if current_offset < current_translate || current + 1 >= self.length {
                return current;
            }
            current + 1
        } else {
            if current_offset > current_translate || current == 0 {
                return current;
            }
            current - 1
        }
    }

    fn page_at_rest(&self) -> bool {
        self.page_at_rest.get()
    }

    fn outer_active(&self) -> bool {
        self.outer_active.as_ref().is_some_and(Shared::get)
    }

    /// Spring the strip to `target`, seeded with `velocity`.
    #[allow(clippy::float_cmp)]
    fn settle_to(&self, target: f64, velocity: f64) {
        if self.offset_x.get() == target {
            return;
        }
        let seed = self.velocity.clone();
        self.offset_x.animate_with(
            Spring::new(target, self.spring).with_velocity(velocity),
            move |finished| {
                if finished {
                    seed.set(0.0);
                }
            },
        );
    }

    fn commit_index(&self, next: usize) {
        self.index.set(next);
        tracing::debug!(index = next, "pager index committed");

        let hook = self.hooks.on_index_change.clone();
        let active = self.active_index.clone();
        match self.config.index_change {
            IndexChangeMode::Immediate => {
                self.runtime.run_on_main(move || {
                    if let Some(cb) = hook {
                        let mut cb = cb.borrow_mut();
                        (*cb)(next);
                    }
                    active.set(next);
                });
            }
            IndexChangeMode::Deferred => {
                self.pending_index.set(Some(next));
                self.runtime.run_on_main(move || {
                    if let Some(cb) = hook {
                        let mut cb = cb.borrow_mut();
                        (*cb)(next);
                    }
                });
            }
        }
    }
}

impl GestureHandlers<PagerPanContext> for Engine {
    fn on_init(&mut self, _event: &GestureEvent, ctx: &mut PagerPanContext) {
        ctx.offset = None;
    }

    fn on_event(&mut self, event: &GestureEvent, _ctx: &mut PagerPanContext) {
        self.velocity.set(clamp_velocity(
            event.velocity_x,
            self.config.min_velocity,
            self.config.max_velocity,
        ));

        let enabled = self.page_at_rest();
        if let Some(cb) = self.hooks.on_gesture.as_mut() {
            cb(event, enabled);
        }
        if enabled && !self.in_progress.get() {
            if let Some(cb) = self.hooks.on_enabled_gesture.as_mut() {
                cb(event);
            }
        }
    }

    fn should_handle_event(&mut self, event: &GestureEvent, _ctx: &mut PagerPanContext) -> bool {
        if self.in_progress.get() {
            return true;
        }
        if event.number_of_pointers != 1
            || !self.page_at_rest()
            || self.outer_active()
            || event.velocity_x.abs() <= event.velocity_y.abs()
        {
            return false;
        }
        self.hooks.should_handle.as_mut().map_or(true, |f| f(event))
    }

    fn on_start(&mut self, _event: &GestureEvent, ctx: &mut PagerPanContext) {
        ctx.offset = None;
    }

    fn on_active(&mut self, event: &GestureEvent, ctx: &mut PagerPanContext) {
        // the first active frame can jump; measure the drag from there
        let offset = *ctx.offset.get_or_insert(event.translation_x);
        let val = event.translation_x - offset;
        let next = if self.can_swipe(val) { val } else { friction(val) };
        self.pager_x.set(next);
    }

    fn on_end(&mut self, event: &GestureEvent, ctx: &mut PagerPanContext) {
        let val = event.translation_x - ctx.offset.unwrap_or(event.translation_x);
        let can_swipe = self.can_swipe(val);

        self.offset_x.set(self.offset_x.get() + self.pager_x.get());
        self.pager_x.set(0.0);

        let current = self.index.get();
        let next = self.next_index(event.velocity_x);
        let should_move = event.velocity_x.abs() > self.config.commit_velocity && can_swipe;
        let target = self.page_translate(if should_move { next } else { current });

        tracing::debug!(
            current,
            next,
            should_move,
            velocity = event.velocity_x,
            "pager release"
        );
        self.settle_to(target, self.velocity.get());

        if should_move && next != current {
            self.commit_index(next);
        }
    }
}

impl GestureHandlers<PagerTapContext> for Engine {
    fn should_handle_event(&mut self, event: &GestureEvent, _ctx: &mut PagerTapContext) -> bool {
        event.number_of_pointers == 1 && self.page_at_rest()
    }

    fn on_start(&mut self, _event: &GestureEvent, _ctx: &mut PagerTapContext) {
        self.offset_x.cancel();
    }

    fn on_end(&mut self, _event: &GestureEvent, _ctx: &mut PagerTapContext) {
        self.settle_to(self.page_translate(self.index.get()), 0.0);
    }
}

/// Horizontal multi-page carousel.
pub struct Pager {
    engine: Engine,
    pan: GestureDispatcher<PagerPanContext>,
    tap: GestureDispatcher<PagerTapContext>,
}

impl fmt::Debug for Pager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager")
            .field("length", &self.engine.length)
            .field("index", &self.engine.index.get())
            .field("active_index", &self.engine.active_index.get())
            .field("translate_x", &self.translate_x())
            .finish_non_exhaustive()
    }
}

impl Pager {
    /// Start building a pager over `length` pages.
    #[must_use]
    pub fn builder(runtime: &FrameRuntime, length: usize) -> PagerBuilder {
        PagerBuilder::new(runtime, length)
    }

    /// Feed a pan recognizer event.
    pub fn on_pan_event(&mut self, event: &GestureEvent) {
        self.pan.dispatch(event, &mut self.engine);
    }

    /// Feed a tap recognizer event.
    pub fn on_tap_event(&mut self, event: &GestureEvent) {
        self.tap.dispatch(event, &mut self.engine);
    }

    /// Committed page index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.engine.index.get()
    }

    /// Page the render window is centred on. Trails [`index`](Self::index)
    /// until the index-change notification ran.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.engine.active_index.get()
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engine.length
    }

    /// Always `false`; a pager has at least one page.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engine.length == 0
    }

    /// Gutter between pages.
    #[must_use]
    pub fn gutter_width(&self) -> f64 {
        self.engine.gutter
    }

    /// Strip position of page `index` (non-positive).
    #[must_use]
    pub fn page_translate(&self, index: usize) -> f64 {
        self.engine.page_translate(index)
    }

    /// Rendered strip translation: committed offset plus drag delta.
    #[must_use]
    pub fn translate_x(&self) -> f64 {
        self.engine.offset_x.get() + self.engine.pager_x.get()
    }

    /// Committed strip offset.
    #[must_use]
    pub fn offset_x(&self) -> f64 {
        self.engine.offset_x.get()
    }

    /// In-flight drag delta.
    #[must_use]
    pub fn pager_x(&self) -> f64 {
        self.engine.pager_x.get()
    }

    /// Width of the whole strip.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_width(&self) -> f64 {
        let len = self.engine.length as f64;
        len * self.engine.width + self.engine.gutter * len - 2.0
    }

    /// The rendered position differs from the committed page.
    #[must_use]
    pub fn is_pager_in_progress(&self) -> bool {
        self.engine.in_progress.get()
    }

    /// Whether `index` is the committed page.
    #[must_use]
    pub fn is_page_active(&self, index: usize) -> bool {
        self.engine.index.get() == index
    }

    /// Layout of every page; pages outside the render window are
    /// placeholders with `rendered == false`.
    #[must_use]
    pub fn page_slots(&self) -> Vec<PageSlot> {
        let engine = &self.engine;
        let active = engine.active_index.get();
        (0..engine.length)
            .map(|index| PageSlot {
                index,
                left: -engine.page_translate(index),
                width: engine.width,
                gutter: if index + 1 == engine.length { 0.0 } else { engine.gutter },
                rendered: should_render(index, active, engine.config.num_to_render),
            })
            .collect()
    }

    /// Signal the active page writes its at-rest state into. While it is
    /// `false` the pager does not claim drags.
    #[must_use]
    pub fn page_state(&self) -> Shared<bool> {
        self.engine.page_at_rest.clone()
    }

    /// Record the active page's at-rest state.
    pub fn on_page_state_change(&self, at_rest: bool) {
        self.engine.page_at_rest.set(at_rest);
    }

    /// Move to `index` without animation and notify the index change.
    ///
    /// # Errors
    ///
    /// [`GalleryError::IndexOutOfRange`] when `index >= len`.
    pub fn jump_to(&self, index: usize) -> GalleryResult<()> {
        let engine = &self.engine;
        if index >= engine.length {
            return Err(GalleryError::IndexOutOfRange {
                index,
                len: engine.length,
            });
        }
        engine.offset_x.set(engine.page_translate(index));
        engine.pager_x.set(0.0);
        engine.commit_index(index);
        Ok(())
    }

    /// Finish a deferred index change: the render window moves to the
    /// committed page. Returns the new active index, if one was pending.
    pub fn complete_index_change(&self) -> Option<usize> {
        let next = self.engine.pending_index.replace(None)?;
        self.engine.active_index.set(next);
        Some(next)
    }

    /// Runtime driving this pager.
    #[must_use]
    pub fn runtime(&self) -> &FrameRuntime {
        &self.engine.runtime
    }
}

/// Builder for [`Pager`].
pub struct PagerBuilder {
    runtime: FrameRuntime,
    length: usize,
    width: f64,
    config: PagerConfig,
    platform: Platform,
    outer_active: Option<Shared<bool>>,
    hooks: Hooks,
    on_translate_change: Option<Box<dyn FnMut(f64)>>,
}

impl fmt::Debug for PagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagerBuilder")
            .field("length", &self.length)
            .field("width", &self.width)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PagerBuilder {
    fn new(runtime: &FrameRuntime, length: usize) -> Self {
        Self {
            runtime: runtime.clone(),
            length,
            width: 0.0,
            config: PagerConfig::default(),
            platform: Platform::default(),
            outer_active: None,
            hooks: Hooks::default(),
            on_translate_change: None,
        }
    }

    /// Page width, usually the window width.
    #[must_use]
    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Pager settings.
    #[must_use]
    pub fn config(mut self, config: PagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Platform for begin detection.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Flag that, while set, keeps the pager from claiming drags.
    #[must_use]
    pub fn outer_active(mut self, flag: Shared<bool>) -> Self {
        self.outer_active = Some(flag);
        self
    }

    /// Called on the main context after a page change is committed.
    #[must_use]
    pub fn on_index_change(mut self, cb: impl FnMut(usize) + 'static) -> Self {
        self.hooks.on_index_change = Some(Rc::new(RefCell::new(cb)));
        self
    }

    /// Called with every pan event and whether the active page is at rest.
    #[must_use]
    pub fn on_gesture(mut self, cb: impl FnMut(&GestureEvent, bool) + 'static) -> Self {
        self.hooks.on_gesture = Some(Box::new(cb));
        self
    }

    /// Called with pan events while the page is at rest and the strip sits
    /// on a page.
    #[must_use]
    pub fn on_enabled_gesture(mut self, cb: impl FnMut(&GestureEvent) + 'static) -> Self {
        self.hooks.on_enabled_gesture = Some(Box::new(cb));
        self
    }

    /// Extra condition a drag must meet to be claimed.
    #[must_use]
    pub fn should_handle_gesture(mut self, f: impl FnMut(&GestureEvent) -> bool + 'static) -> Self {
        self.hooks.should_handle = Some(Box::new(f));
        self
    }

    /// Called after a frame when the strip translation changed.
    #[must_use]
    pub fn on_pager_translate_change(mut self, cb: impl FnMut(f64) + 'static) -> Self {
        self.on_translate_change = Some(Box::new(cb));
        self
    }

    /// Validate inputs and build the pager.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::EmptyPager`] for zero pages.
    /// - [`GalleryError::InvalidDimensions`] for a non-positive width.
    /// - [`GalleryError::IndexOutOfRange`] for an initial index past the end.
    /// - [`GalleryError::Config`] for invalid settings.
    pub fn build(self) -> GalleryResult<Pager> {
        if self.length == 0 {
            return Err(GalleryError::EmptyPager);
        }
        GalleryError::check_dimensions("pager", self.width, 1.0)?;
        self.config.validate()?;
        let initial = self.config.initial_index;
        if initial >= self.length {
            return Err(GalleryError::IndexOutOfRange {
                index: initial,
                len: self.length,
            });
        }

        let gutter = self.config.resolved_gutter(self.width);
        let width = self.width;
        let index = Shared::new(initial);
        let offset_x = self.runtime.value(page_translate(initial, width, gutter));
        let pager_x = Shared::new(0.0);

        let in_progress = {
            let (index, offset_x, pager_x) = (index.clone(), offset_x.clone(), pager_x.clone());
            let mut inputs: Vec<Box<dyn Source>> = Vec::with_capacity(3);
            inputs.push(Box::new(index.clone()));
            inputs.push(Box::new(offset_x.clone()));
            inputs.push(Box::new(pager_x.clone()));
            Derived::new(
                inputs,
                move || {
                    let committed = page_translate(index.get(), width, gutter).abs().floor();
                    let rendered = (offset_x.get() + pager_x.get()).abs().floor();
                    committed != rendered
                },
            )
        };

        if let Some(mut cb) = self.on_translate_change {
            let (offset_x, pager_x) = (offset_x.clone(), pager_x.clone());
            self.runtime
                .react(move || offset_x.get() + pager_x.get(), move |x, _| cb(*x));
        }

        tracing::debug!(
            length = self.length,
            width,
            gutter,
            initial,
            "pager created"
        );

        let engine = Engine {
            runtime: self.runtime,
            spring: self.config.resolved_spring(),
            config: self.config,
            width,
            gutter,
            length: self.length,
            index,
            active_index: Shared::new(initial),
            pending_index: Shared::new(None),
            offset_x,
            pager_x,
            velocity: Shared::new(0.0),
            page_at_rest: Shared::new(true),
            outer_active: self.outer_active,
            in_progress,
            hooks: self.hooks,
        };

        Ok(Pager {
            engine,
            pan: GestureDispatcher::new("pager.pan", self.platform),
            tap: GestureDispatcher::new("pager.tap", self.platform),
        })
    }
}
