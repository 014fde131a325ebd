use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use super::{
    CreatedImage, ElementId, IMAGE_CLASS, INCOMING_CLASS, MediaQuery, SLIDE_IN_CLASS, Stage,
    SubscriptionId, Topic,
};
use crate::config::HeroImage;
use crate::events::{AnimateSlide, LoadRequest};
use crate::layout::{CanvasSize, Size, Viewport};

/// Window state shared between the console and the stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEnvironment {
    pub viewport: Viewport,
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    pub source: String,
    pub alt: String,
    pub classes: BTreeSet<String>,
}

/// In-process page model. Loading and slide animations are handed off to
/// the loader and animator tasks when their channels are wired; otherwise
/// the stage only records what the slider did, which is what tests rely on.
#[derive(Debug)]
pub struct HeadlessStage {
    environment: watch::Receiver<HostEnvironment>,
    small_viewport_max_width: f64,
    image_root: PathBuf,
    container: bool,
    trigger: bool,
    decode_support: bool,
    known_sizes: HashMap<String, Size>,
    to_loader: Option<Sender<LoadRequest>>,
    to_animator: Option<Sender<AnimateSlide>>,

    next_element: u64,
    next_subscription: u64,
    elements: BTreeMap<ElementId, ElementState>,
    children: Vec<ElementId>,
    max_children: usize,
    incoming_created: usize,
    container_size: Option<CanvasSize>,
    root_properties: BTreeMap<String, String>,
    trigger_disabled: bool,
    subscriptions: BTreeMap<SubscriptionId, Topic>,
}

impl HeadlessStage {
    pub fn new(environment: watch::Receiver<HostEnvironment>) -> Self {
        Self {
            environment,
            small_viewport_max_width: 600.0,
            image_root: PathBuf::from("."),
            container: true,
            trigger: true,
            decode_support: false,
            known_sizes: HashMap::new(),
            to_loader: None,
            to_animator: None,
            next_element: 0,
            next_subscription: 0,
            elements: BTreeMap::new(),
            children: Vec::new(),
            max_children: 0,
            incoming_created: 0,
            container_size: None,
            root_properties: BTreeMap::new(),
            trigger_disabled: false,
            subscriptions: BTreeMap::new(),
        }
    }

    /// A stage whose window never changes.
    pub fn fixed(viewport: Viewport, reduced_motion: bool) -> Self {
        let (_tx, rx) = watch::channel(HostEnvironment {
            viewport,
            reduced_motion,
        });
        Self::new(rx)
    }

    pub fn with_image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = root.into();
        self
    }

    pub fn with_small_viewport_max_width(mut self, max_width: f64) -> Self {
        self.small_viewport_max_width = max_width;
        self
    }

    pub fn with_decode_support(mut self, supported: bool) -> Self {
        self.decode_support = supported;
        self
    }

    /// Treat `source` as already cached so new elements for it are complete.
    pub fn with_known_size(mut self, source: impl Into<String>, size: Size) -> Self {
        self.known_sizes.insert(source.into(), size);
        self
    }

    pub fn with_loader(mut self, to_loader: Sender<LoadRequest>) -> Self {
        self.to_loader = Some(to_loader);
        self
    }

    pub fn with_animator(mut self, to_animator: Sender<AnimateSlide>) -> Self {
        self.to_animator = Some(to_animator);
        self
    }

    pub fn without_container(mut self) -> Self {
        self.container = false;
        self
    }

    pub fn without_trigger(mut self) -> Self {
        self.trigger = false;
        self
    }

    /// Elements currently attached to the container, in document order.
    pub fn attached(&self) -> &[ElementId] {
        &self.children
    }

    /// Most elements ever attached to the container at the same time.
    pub fn max_attached(&self) -> usize {
        self.max_children
    }

    pub fn element(&self, element: ElementId) -> Option<&ElementState> {
        self.elements.get(&element)
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.elements
            .get(&element)
            .is_some_and(|state| state.classes.contains(class))
    }

    /// Live elements: attached ones plus any created but not yet attached.
    /// Detached elements are dropped.
    pub fn created(&self) -> impl Iterator<Item = (&ElementId, &ElementState)> {
        self.elements.iter()
    }

    /// How many elements were ever created with the incoming class.
    pub fn incoming_created(&self) -> usize {
        self.incoming_created
    }

    pub fn container_size(&self) -> Option<CanvasSize> {
        self.container_size
    }

    pub fn root_property(&self, name: &str) -> Option<&str> {
        self.root_properties.get(name).map(String::as_str)
    }

    pub fn trigger_disabled(&self) -> bool {
        self.trigger_disabled
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_subscribed(&self, topic: Topic) -> bool {
        self.subscriptions.values().any(|t| *t == topic)
    }

    /// Local file behind `source`; `None` for anything with a URI scheme.
    pub fn resolve_source(&self, source: &str) -> Option<PathBuf> {
        if source.contains("://") {
            return None;
        }
        Some(self.image_root.join(source))
    }

    fn source_path(&self, element: ElementId) -> Option<PathBuf> {
        self.elements
            .get(&element)
            .and_then(|state| self.resolve_source(&state.source))
    }

    fn send_load(&self, request: LoadRequest) {
        if let Some(tx) = &self.to_loader {
            if let Err(err) = tx.try_send(request) {
                warn!("failed to queue load request: {err}");
            }
        }
    }
}

impl Stage for HeadlessStage {
    fn has_container(&self) -> bool {
        self.container
    }

    fn has_trigger(&self) -> bool {
        self.trigger
    }

    fn viewport(&self) -> Viewport {
        self.environment.borrow().viewport
    }

    fn media_matches(&self, query: MediaQuery) -> bool {
        let env = *self.environment.borrow();
        match query {
            MediaQuery::ReducedMotion => env.reduced_motion,
            MediaQuery::SmallViewport => env.viewport.width <= self.small_viewport_max_width,
        }
    }

    fn subscribe(&mut self, topic: Topic) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.insert(id, topic);
        trace!(?topic, id = id.0, "subscribed");
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.subscriptions.remove(&id).is_none() {
            warn!(id = id.0, "unsubscribe for unknown subscription");
        }
    }

    fn create_image(&mut self, image: &HeroImage, class: &str) -> CreatedImage {
        self.next_element += 1;
        let element = ElementId(self.next_element);
        let mut classes = BTreeSet::new();
        classes.insert(IMAGE_CLASS.to_string());
        if class == INCOMING_CLASS {
            self.incoming_created += 1;
        }
        if !class.is_empty() {
            classes.insert(class.to_string());
        }
        self.elements.insert(
            element,
            ElementState {
                source: image.source.clone(),
                alt: image.alt_text.clone(),
                classes,
            },
        );

        let natural = self.known_sizes.get(&image.source).copied();
        if natural.is_none() {
            self.send_load(LoadRequest::Probe {
                element,
                path: self.resolve_source(&image.source),
            });
        }
        debug!(%element, source = %image.source, cached = natural.is_some(), "created image");
        CreatedImage { element, natural }
    }

    fn supports_decode(&self) -> bool {
        self.decode_support
    }

    fn decode(&mut self, element: ElementId) {
        self.send_load(LoadRequest::Decode {
            element,
            path: self.source_path(element),
        });
    }

    fn append(&mut self, element: ElementId) {
        self.children.retain(|child| *child != element);
        self.children.push(element);
        self.max_children = self.max_children.max(self.children.len());
    }

    fn remove(&mut self, element: ElementId) {
        self.children.retain(|child| *child != element);
        self.elements.remove(&element);
    }

    fn is_attached(&self, element: ElementId) -> bool {
        self.children.contains(&element)
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        let Some(state) = self.elements.get_mut(&element) else {
            return;
        };
        state.classes.insert(class.to_string());
        if class == SLIDE_IN_CLASS {
            if let Some(tx) = &self.to_animator {
                if let Err(err) = tx.try_send(AnimateSlide(element)) {
                    warn!("failed to queue slide animation: {err}");
                }
            }
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(state) = self.elements.get_mut(&element) {
            state.classes.remove(class);
        }
    }

    fn set_container_size(&mut self, canvas: CanvasSize) {
        self.container_size = Some(canvas);
    }

    fn set_root_property(&mut self, name: &str, value: &str) {
        self.root_properties.insert(name.to_string(), value.to_string());
    }

    fn set_trigger_disabled(&mut self, disabled: bool) {
        self.trigger_disabled = disabled;
    }
}
