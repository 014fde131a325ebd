//! The hero rotation controller.
//!
//! [`HeroSlider`] owns one "current image" slot inside the stage's container.
//! It rotates that slot on a timer, serves manual "next" requests, and runs
//! at most one slide at a time: requests arriving mid-slide are counted and
//! replayed one step each once the slide finalizes. Every handler takes the
//! current instant so the slider never reads a clock itself; the owning task
//! waits on [`HeroSlider::rotation_deadline`] and
//! [`HeroSlider::fallback_deadline`].

mod rotation;
mod transition;

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::config::{Configuration, HeroImage, LayoutOptions};
use crate::events::SliderEvent;
use crate::layout::{CanvasSize, Size, fit_canvas};
use crate::stage::{
    CURRENT_CLASS, ElementId, INCOMING_CLASS, MediaQuery, SLIDE_IN_CLASS, SLIDE_OUT_CLASS,
    SLIDE_PROPERTY, Stage, SubscriptionId, Topic,
};

use rotation::RotationTimer;
use transition::{FinalizeCause, Readiness, Transition};

pub use transition::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    /// Reserved; nothing requests it yet.
    Previous,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Self::Next => 1,
            Self::Previous => -1,
        }
    }
}

/// Floor-mod step through a list of `len` images. `len` must be non-zero.
pub fn wrap_index(index: usize, direction: Direction, len: usize) -> usize {
    (index as isize + direction.offset()).rem_euclid(len as isize) as usize
}

#[derive(Debug, Clone, Copy)]
pub struct SliderOptions {
    pub rotation_interval: Duration,
    pub transition_fallback: Duration,
    pub layout: LayoutOptions,
}

impl Default for SliderOptions {
    fn default() -> Self {
        Self::from(&Configuration::default())
    }
}

impl From<&Configuration> for SliderOptions {
    fn from(cfg: &Configuration) -> Self {
        Self {
            rotation_interval: cfg.rotation_interval,
            transition_fallback: cfg.transition_fallback,
            layout: cfg.layout,
        }
    }
}

pub struct HeroSlider<S> {
    stage: S,
    options: SliderOptions,
    images: Vec<HeroImage>,
    current_index: usize,
    active: Option<Slot>,
    transition: Option<Transition>,
    queued_advances: usize,
    reduced_motion: bool,
    small_viewport: bool,
    rotation: RotationTimer,
    subscriptions: Vec<(Topic, SubscriptionId)>,
    canvas: Option<CanvasSize>,
}

impl<S: Stage> HeroSlider<S> {
    /// Build a slider starting on a uniformly random image.
    pub fn new<R: Rng + ?Sized>(
        stage: S,
        images: Vec<HeroImage>,
        options: SliderOptions,
        rng: &mut R,
    ) -> Self {
        let start = if images.is_empty() {
            0
        } else {
            rng.random_range(0..images.len())
        };
        Self::with_start_index(stage, images, options, start)
    }

    pub fn with_start_index(
        stage: S,
        images: Vec<HeroImage>,
        options: SliderOptions,
        start: usize,
    ) -> Self {
        let reduced_motion = stage.media_matches(MediaQuery::ReducedMotion);
        let small_viewport = stage.media_matches(MediaQuery::SmallViewport);
        let current_index = if images.is_empty() {
            0
        } else {
            start % images.len()
        };
        Self {
            stage,
            rotation: RotationTimer::new(options.rotation_interval),
            options,
            images,
            current_index,
            active: None,
            transition: None,
            queued_advances: 0,
            reduced_motion,
            small_viewport,
            subscriptions: Vec::new(),
            canvas: None,
        }
    }

    /// Render the first image, size the container, subscribe and start
    /// rotating. Without a container or images the trigger is disabled and
    /// nothing else happens.
    pub fn init(&mut self, now: Instant) {
        if self.is_initialized() {
            debug!("slider already initialized");
            return;
        }
        if !self.stage.has_container() {
            info!("no hero container; slider disabled");
            self.stage.set_trigger_disabled(true);
            return;
        }
        if self.images.is_empty() {
            info!("no hero images; slider disabled");
            self.stage.set_trigger_disabled(true);
            return;
        }

        self.show_instantly(self.current_index);
        self.resize();

        let mut topics = vec![Topic::Resize, Topic::SmallViewport, Topic::ReducedMotion];
        if self.stage.has_trigger() {
            topics.push(Topic::TriggerClick);
        }
        for topic in topics {
            let id = self.stage.subscribe(topic);
            self.subscriptions.push((topic, id));
        }

        self.start_rotation(now);
        info!(
            images = self.images.len(),
            start = self.current_index,
            reduced_motion = self.reduced_motion,
            "hero slider initialized"
        );
    }

    /// Remove every subscription made by [`HeroSlider::init`] and stop the
    /// timer. The displayed image stays where it is.
    pub fn destroy(&mut self) {
        for (topic, id) in self.subscriptions.drain(..) {
            trace!(?topic, "unsubscribing");
            self.stage.unsubscribe(id);
        }
        self.rotation.stop();
    }

    pub fn is_initialized(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Dispatch a host notification. Page-level notifications only count
    /// while the matching subscription is live.
    pub fn handle(&mut self, event: SliderEvent, now: Instant) {
        match event {
            SliderEvent::NextPressed => {
                if self.listening(Topic::TriggerClick) {
                    self.press_next(now);
                }
            }
            SliderEvent::Resized => {
                if self.listening(Topic::Resize) {
                    self.resize();
                }
            }
            SliderEvent::SmallViewportChanged(small) => {
                if self.listening(Topic::SmallViewport) {
                    self.set_small_viewport(small);
                }
            }
            SliderEvent::ReducedMotionChanged(reduce) => {
                if self.listening(Topic::ReducedMotion) {
                    self.set_reduced_motion(reduce, now);
                }
            }
            SliderEvent::ImageLoaded { element, natural } => self.on_image_loaded(element, natural),
            SliderEvent::ImageFailed { element } => self.on_image_failed(element),
            SliderEvent::ImageDecoded { element } => self.on_image_decoded(element),
            SliderEvent::TransitionEnd { element, property } => {
                self.on_transition_end(element, &property, now)
            }
            SliderEvent::TransitionCancel { element } => self.on_transition_cancel(element, now),
        }
    }

    fn listening(&self, topic: Topic) -> bool {
        self.subscriptions.iter().any(|(t, _)| *t == topic)
    }

    /// Manual "next": the automatic rotation restarts a full interval later.
    pub fn press_next(&mut self, now: Instant) {
        if self.images.len() <= 1 {
            return;
        }
        self.rotation.stop();
        self.request_advance(Direction::Next, now);
        self.start_rotation(now);
    }

    /// Drive the rotation timer; does nothing unless a tick is due.
    pub fn on_rotation_tick(&mut self, now: Instant) {
        if !self.rotation.poll(now) {
            return;
        }
        if self.reduced_motion || self.images.len() <= 1 {
            return;
        }
        trace!("rotation tick");
        self.request_advance(Direction::Next, now);
    }

    pub fn set_reduced_motion(&mut self, reduce: bool, now: Instant) {
        self.reduced_motion = reduce;
        debug!(reduce, "reduced motion preference changed");
        if reduce {
            self.rotation.stop();
        } else {
            self.start_rotation(now);
        }
    }

    pub fn set_small_viewport(&mut self, small: bool) {
        self.small_viewport = small;
        self.resize();
    }

    pub fn request_advance(&mut self, direction: Direction, now: Instant) {
        if !self.stage.has_container() || self.images.is_empty() {
            self.queued_advances = 0;
            self.stage.set_trigger_disabled(true);
            return;
        }
        if self.images.len() <= 1 {
            return;
        }
        if self.transition.is_some() {
            self.queued_advances += 1;
            debug!(queued = self.queued_advances, "slide in flight; advance queued");
            return;
        }

        let target = wrap_index(self.current_index, direction, self.images.len());
        if self.reduced_motion || self.active.is_none() {
            self.show_instantly(target);
        } else {
            self.begin_transition(target, now);
        }
    }

    /// Recompute the container from the viewport and the active image.
    pub fn resize(&mut self) {
        self.resize_to(self.active.and_then(|slot| slot.natural));
    }

    fn resize_to(&mut self, natural: Option<Size>) {
        if !self.stage.has_container() {
            return;
        }
        let bounds = self
            .options
            .layout
            .limits(self.small_viewport)
            .bounds(self.stage.viewport());
        let canvas = fit_canvas(bounds, natural);
        self.stage.set_container_size(canvas);
        for (name, value) in canvas.root_properties() {
            self.stage.set_root_property(name, &value);
        }
        trace!(width = canvas.width, height = canvas.height, "container resized");
        self.canvas = Some(canvas);
    }

    fn start_rotation(&mut self, now: Instant) {
        if self.reduced_motion || self.images.len() <= 1 {
            self.rotation.stop();
            return;
        }
        self.rotation.start(now);
    }

    fn refresh_trigger(&mut self) {
        self.stage.set_trigger_disabled(self.images.len() < 2);
    }

    /// Swap without animation. The old element leaves before the new one
    /// arrives, so the container never holds two.
    fn show_instantly(&mut self, target: usize) {
        let created = self.stage.create_image(&self.images[target], CURRENT_CLASS);
        if created.natural.is_some() {
            self.resize_to(created.natural);
        }
        if let Some(previous) = self.active.take() {
            if self.stage.is_attached(previous.element) {
                self.stage.remove(previous.element);
            }
        }
        self.stage.append(created.element);
        self.active = Some(Slot::from(created));
        self.current_index = target;
        self.refresh_trigger();
        debug!(index = target, element = %created.element, "swapped hero image");
    }

    fn begin_transition(&mut self, target: usize, now: Instant) {
        let created = self.stage.create_image(&self.images[target], INCOMING_CLASS);
        if created.natural.is_some() {
            self.resize_to(created.natural);
        }
        self.stage.append(created.element);

        let awaiting = if self.stage.supports_decode() {
            self.stage.decode(created.element);
            Some(Readiness::Decode)
        } else if created.natural.is_none() {
            Some(Readiness::Load)
        } else {
            None
        };

        self.transition = Some(Transition {
            incoming: Slot::from(created),
            target,
            awaiting,
            deadline: now + self.options.transition_fallback,
        });
        debug!(index = target, element = %created.element, ?awaiting, "slide started");

        if awaiting.is_none() {
            self.start_slide();
        }
    }

    fn start_slide(&mut self) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };
        transition.awaiting = None;
        self.stage.add_class(transition.incoming.element, SLIDE_IN_CLASS);
        if let Some(active) = self.active {
            self.stage.add_class(active.element, SLIDE_OUT_CLASS);
        }
    }

    fn on_image_loaded(&mut self, element: ElementId, natural: Size) {
        let mut known = false;
        if let Some(slot) = self.active.as_mut().filter(|slot| slot.element == element) {
            slot.natural = Some(natural);
            known = true;
        }
        let mut release = false;
        if let Some(transition) = self.transition.as_mut() {
            if transition.is_incoming(element) {
                transition.incoming.natural = Some(natural);
                release = transition.releases(element, Readiness::Load);
                known = true;
            }
        }
        if !known {
            trace!(%element, "load for a retired element");
            return;
        }
        self.resize_to(Some(natural));
        if release {
            self.start_slide();
        }
    }

    fn on_image_failed(&mut self, element: ElementId) {
        let is_active = self.active.is_some_and(|slot| slot.element == element);
        let release = self
            .transition
            .as_ref()
            .is_some_and(|t| t.releases(element, Readiness::Load));
        let is_incoming = self
            .transition
            .as_ref()
            .is_some_and(|t| t.is_incoming(element));
        if !is_active && !is_incoming {
            return;
        }
        debug!(%element, "hero image failed to load");
        self.resize();
        if release {
            self.start_slide();
        }
    }

    fn on_image_decoded(&mut self, element: ElementId) {
        let release = self
            .transition
            .as_ref()
            .is_some_and(|t| t.releases(element, Readiness::Decode));
        if release {
            self.start_slide();
        }
    }

    fn on_transition_end(&mut self, element: ElementId, property: &str, now: Instant) {
        if property != SLIDE_PROPERTY {
            return;
        }
        if self.transition.as_ref().is_some_and(|t| t.is_incoming(element)) {
            self.finalize(FinalizeCause::TransitionEnd, now);
        }
    }

    fn on_transition_cancel(&mut self, element: ElementId, now: Instant) {
        if self.transition.as_ref().is_some_and(|t| t.is_incoming(element)) {
            self.finalize(FinalizeCause::TransitionCancel, now);
        }
    }

    /// Finalize the slide if its fallback deadline has passed.
    pub fn on_fallback_timeout(&mut self, now: Instant) {
        if self.transition.as_ref().is_some_and(|t| t.deadline <= now) {
            self.finalize(FinalizeCause::Timeout, now);
        }
    }

    fn finalize(&mut self, cause: FinalizeCause, now: Instant) {
        let Some(transition) = self.transition.take() else {
            return;
        };
        let incoming = transition.incoming.element;
        self.stage.remove_class(incoming, INCOMING_CLASS);
        self.stage.remove_class(incoming, SLIDE_IN_CLASS);
        self.stage.add_class(incoming, CURRENT_CLASS);

        if let Some(previous) = self.active {
            if self.stage.is_attached(previous.element) {
                self.stage.remove(previous.element);
            }
        }
        self.active = Some(transition.incoming);
        self.current_index = transition.target;
        self.refresh_trigger();
        debug!(
            index = self.current_index,
            %cause,
            queued = self.queued_advances,
            "slide finalized"
        );

        self.drain_queue(now);
    }

    /// Replay queued advances one step at a time. A replay that slides stops
    /// the loop; the rest wait for that slide to finalize.
    fn drain_queue(&mut self, now: Instant) {
        if self.queued_advances == 0 {
            return;
        }
        if self.images.len() <= 1 {
            self.queued_advances = 0;
            return;
        }
        while self.queued_advances > 0 && self.transition.is_none() {
            self.queued_advances -= 1;
            self.request_advance(Direction::Next, now);
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_image(&self) -> Option<&HeroImage> {
        self.images.get(self.current_index)
    }

    pub fn images(&self) -> &[HeroImage] {
        &self.images
    }

    pub fn active(&self) -> Option<Slot> {
        self.active
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn queued_advances(&self) -> usize {
        self.queued_advances
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn small_viewport(&self) -> bool {
        self.small_viewport
    }

    /// Last size applied to the container.
    pub fn canvas(&self) -> Option<CanvasSize> {
        self.canvas
    }

    pub fn rotation_deadline(&self) -> Option<Instant> {
        self.rotation.deadline()
    }

    pub fn fallback_deadline(&self) -> Option<Instant> {
        self.transition.as_ref().map(|t| t.deadline)
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn into_stage(self) -> S {
        self.stage
    }
}
