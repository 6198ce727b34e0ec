//! Scenario runner.
//!
//! Wires one viewer the way a host would: the image transformer sits inside
//! a pager page and a swipe-to-dismiss container, the pager yields while the
//! image is zoomed, swipe-to-dismiss yields to a zoomed image, and the
//! lightbox opens from the thumbnail through the gallery coordinator.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use gallery_core::{
    FrameRuntime, GalleryCoordinator, GalleryImage, GestureEvent, GestureState, ImageTransformer,
    LightboxTransition, Measurements, Pager, RecognizerRequest, Shared, SwipeRelease, Swipeout,
};

use crate::report::{FrameReport, PagerFrame, ReplayReport, SwipeFrame};
use crate::scenario::{GestureTarget, Scenario, Step};
use crate::ReplayError;

/// Default frame interval, 60 Hz.
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// Measure the thumbnail and activate it through a coordinator, returning the
/// lightbox geometry.
async fn activate(scenario: &Scenario, uri: &str) -> Result<Option<Measurements>, ReplayError> {
    let Some(thumbnail) = scenario.thumbnail else {
        return Ok(None);
    };
    let index = scenario.config.pager.initial_index;
    let coordinator = GalleryCoordinator::new(scenario.pages, scenario.window.width)?;
    coordinator.add_image(
        index,
        GalleryImage::new(uri, scenario.image.width, scenario.image.height),
        Arc::new(thumbnail),
    );
    let entry = coordinator.on_show(index).await?;
    Ok(entry.measurements)
}

/// A running viewer driven by a scenario script.
pub struct Replay {
    runtime: FrameRuntime,
    frame_ms: f64,
    now: f64,
    transformer: ImageTransformer,
    pager: Pager,
    swipeout: Swipeout,
    lightbox: Option<LightboxTransition>,
    closed: Shared<bool>,
    index_changes: Rc<RefCell<Vec<usize>>>,
    frames: Vec<FrameReport>,
    releases: Vec<SwipeRelease>,
}

impl Replay {
    /// Build the viewer for `scenario`, opening the lightbox from the
    /// thumbnail when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Invalid`] for a non-positive frame interval and
    /// [`ReplayError::Gallery`] when a component rejects the scenario.
    pub async fn open(scenario: &Scenario, frame_ms: f64) -> Result<Self, ReplayError> {
        if !frame_ms.is_finite() || frame_ms <= 0.0 {
            return Err(ReplayError::Invalid(format!(
                "frame interval must be positive, got {frame_ms}"
            )));
        }
        let uri = format!("scenario://{}", scenario.name);
        let measurements = activate(scenario, &uri).await?;

        let config = &scenario.config;
        let window = scenario.window;
        let runtime = FrameRuntime::new();
        let index_changes = Rc::new(RefCell::new(Vec::new()));
        let zoomed = Shared::new(false);

        let sink = Rc::clone(&index_changes);
        let pager = Pager::builder(&runtime, scenario.pages)
            .width(window.width)
            .config(config.pager.clone())
            .platform(config.platform)
            .on_index_change(move |index| sink.borrow_mut().push(index))
            .build()?;

        let page_state = pager.page_state();
        let zoom_flag = zoomed.clone();
        let transformer = ImageTransformer::builder(&runtime)
            .source(uri.clone())
            .image_size(scenario.image.width, scenario.image.height)
            .window(window.width, window.height)
            .config(config.transformer.clone())
            .platform(config.platform)
            .on_state_change(move |at_rest| {
                page_state.set(at_rest);
                zoom_flag.set(!at_rest);
            })
            .build()?;
        transformer.mark_loaded();

        let swipeout = Swipeout::builder(&runtime)
            .window_height(window.height)
            .config(config.swipeout.clone())
            .platform(config.platform)
            .with_backdrop()
            .competing(zoomed)
            .build()?;

        let lightbox = match measurements {
            Some(m) => Some(
                LightboxTransition::builder(&runtime)
                    .source(uri)
                    .measurements(m)
                    .target_dimensions(m.target_width, m.target_height)
                    .window(window.width, window.height)
                    .config(config.lightbox.clone())
                    .build()?,
            ),
            None => None,
        };

        tracing::info!(
            scenario = %scenario.name,
            pages = scenario.pages,
            lightbox = lightbox.is_some(),
            "replay opened"
        );

        Ok(Self {
            runtime,
            frame_ms,
            now: 0.0,
            transformer,
            pager,
            swipeout,
            lightbox,
            closed: Shared::new(false),
            index_changes,
            frames: Vec::new(),
            releases: Vec::new(),
        })
    }

    /// Apply one script entry.
    pub fn apply(&mut self, step: &Step) {
        match step {
            Step::Gesture { target, event } => self.gesture(*target, event),
            Step::Advance { frames } => {
                for _ in 0..*frames {
                    self.tick();
                }
            }
            Step::Settle { max_frames } => {
                for _ in 0..*max_frames {
                    self.tick();
                    if self.runtime.is_idle() {
                        break;
                    }
                }
            }
            Step::Layout => match &self.lightbox {
                Some(lightbox) => lightbox.on_children_layout(),
                None => tracing::warn!("layout step without a lightbox"),
            },
            Step::Close { fade } => match &self.lightbox {
                Some(lightbox) => {
                    let closed = self.closed.clone();
                    lightbox.hide(move || closed.set(true), *fade);
                }
                None => tracing::warn!("close step without a lightbox"),
            },
        }
    }

    fn gesture(&mut self, target: GestureTarget, event: &GestureEvent) {
        tracing::debug!(?target, old = ?event.old_state, state = ?event.state, "replay gesture");
        match target {
            GestureTarget::Pan => self.transformer.on_pan_event(event),
            GestureTarget::Pinch => self.transformer.on_pinch_event(event),
            GestureTarget::Tap => self.transformer.on_tap_event(event),
            GestureTarget::DoubleTap => self.transformer.on_double_tap_event(event),
            GestureTarget::PagerPan => self.pager.on_pan_event(event),
            GestureTarget::PagerTap => self.pager.on_tap_event(event),
            GestureTarget::Swipe => {
                let before = self.swipeout.last_release();
                self.swipeout.on_pan_event(event);
                let after = self.swipeout.last_release();
                if let Some(release) = after.filter(|_| after != before) {
                    self.releases.push(release);
                }
            }
        }
        self.serve_requests();
    }

    /// A host answers a pinch reset request by cancelling the recognizer.
    fn serve_requests(&mut self) {
        for request in self.transformer.take_requests() {
            match request {
                RecognizerRequest::ResetPinch => {
                    tracing::debug!("pinch reset requested");
                    self.transformer.on_pinch_event(&GestureEvent::new(
                        GestureState::Active,
                        GestureState::Cancelled,
                    ));
                }
            }
        }
    }

    fn tick(&mut self) {
        self.now += self.frame_ms;
        self.runtime.frame(self.now);
        let report = FrameReport {
            frame: self.runtime.frame_count(),
            time: self.now,
            transform: self.transformer.style(),
            pager: PagerFrame {
                index: self.pager.index(),
                active_index: self.pager.active_index(),
                translate_x: self.pager.translate_x(),
            },
            swipe: SwipeFrame {
                translate_y: self.swipeout.translate_y(),
                backdrop_opacity: self.swipeout.backdrop_opacity(),
            },
            lightbox: self.lightbox.as_ref().map(LightboxTransition::style),
        };
        self.frames.push(report);
    }

    /// Frames recorded so far.
    #[must_use]
    pub fn frames(&self) -> &[FrameReport] {
        &self.frames
    }

    /// Finish and hand back the report.
    #[must_use]
    pub fn into_report(self, scenario: &Scenario) -> ReplayReport {
        let index_changes = self.index_changes.borrow().clone();
        ReplayReport {
            scenario: scenario.name.clone(),
            frames: self.frames,
            releases: self.releases,
            index_changes,
            closed: self.closed.get(),
        }
    }
}

/// Replay every step of `scenario`.
///
/// # Errors
///
/// See [`Replay::open`].
pub async fn run(scenario: &Scenario, frame_ms: f64) -> Result<ReplayReport, ReplayError> {
    let mut replay = Replay::open(scenario, frame_ms).await?;
    for step in &scenario.steps {
        replay.apply(step);
    }
    let report = replay.into_report(scenario);
    tracing::info!(
        scenario = %report.scenario,
        frames = report.frames.len(),
        releases = report.releases.len(),
        "replay finished"
    );
    Ok(report)
}
