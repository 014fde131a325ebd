//! Host abstraction the slider renders through.
//!
//! A [`Stage`] stands in for the page: one container the slider owns, an
//! optional "next" trigger, the document root's style properties, live media
//! queries and the subscriptions that feed [`crate::events::SliderEvent`]s
//! back to the slider task.

mod headless;

use std::fmt;

pub use headless::{ElementState, HeadlessStage, HostEnvironment};

use crate::config::HeroImage;
use crate::layout::{CanvasSize, Size, Viewport};

pub const IMAGE_CLASS: &str = "hero-layer__image";
pub const INCOMING_CLASS: &str = "hero-layer__image--incoming";
pub const SLIDE_IN_CLASS: &str = "hero-layer__image--slide-in";
pub const SLIDE_OUT_CLASS: &str = "hero-layer__image--slide-out";
pub const CURRENT_CLASS: &str = "hero-layer__image--current";

/// The CSS property whose transition completes a slide.
pub const SLIDE_PROPERTY: &str = "transform";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Notification sources the slider listens to while initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    Resize,
    SmallViewport,
    ReducedMotion,
    TriggerClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaQuery {
    /// `(prefers-reduced-motion: reduce)`
    ReducedMotion,
    /// `(max-width: 600px)` by default.
    SmallViewport,
}

/// A freshly created, still detached image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedImage {
    pub element: ElementId,
    /// Known when the image is already complete, e.g. served from cache.
    pub natural: Option<Size>,
}

pub trait Stage {
    fn has_container(&self) -> bool;

    fn has_trigger(&self) -> bool;

    fn viewport(&self) -> Viewport;

    fn media_matches(&self, query: MediaQuery) -> bool;

    fn subscribe(&mut self, topic: Topic) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Create a detached image element carrying `class` alongside
    /// [`IMAGE_CLASS`]. Loading starts immediately; unless the returned
    /// natural size is already known the host later reports `ImageLoaded` or
    /// `ImageFailed` for it.
    fn create_image(&mut self, image: &HeroImage, class: &str) -> CreatedImage;

    /// Whether [`Stage::decode`] will eventually report `ImageDecoded`.
    fn supports_decode(&self) -> bool;

    fn decode(&mut self, element: ElementId);

    fn append(&mut self, element: ElementId);

    fn remove(&mut self, element: ElementId);

    fn is_attached(&self, element: ElementId) -> bool;

    fn add_class(&mut self, element: ElementId, class: &str);

    fn remove_class(&mut self, element: ElementId, class: &str);

    fn set_container_size(&mut self, canvas: CanvasSize);

    fn set_root_property(&mut self, name: &str, value: &str);

    fn set_trigger_disabled(&mut self, disabled: bool);
}
