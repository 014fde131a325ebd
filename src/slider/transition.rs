use std::fmt;

use tokio::time::Instant;

use crate::layout::Size;
use crate::stage::{CreatedImage, ElementId};

/// An image element owned by the slider together with what is known about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub element: ElementId,
    pub natural: Option<Size>,
}

impl From<CreatedImage> for Slot {
    fn from(created: CreatedImage) -> Self {
        Self {
            element: created.element,
            natural: created.natural,
        }
    }
}

/// What the incoming image still has to report before it slides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Decode,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinalizeCause {
    TransitionEnd,
    TransitionCancel,
    Timeout,
}

impl fmt::Display for FinalizeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TransitionEnd => "transition-end",
            Self::TransitionCancel => "transition-cancel",
            Self::Timeout => "timeout",
        })
    }
}

/// A slide in flight. Held in an `Option` by the slider; finalization takes
/// it out, so whichever completion arrives first is the only one that counts.
#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) incoming: Slot,
    pub(crate) target: usize,
    pub(crate) awaiting: Option<Readiness>,
    pub(crate) deadline: Instant,
}

impl Transition {
    pub(crate) fn is_incoming(&self, element: ElementId) -> bool {
        self.incoming.element == element
    }

    /// True when `element` reporting `readiness` releases the slide.
    pub(crate) fn releases(&self, element: ElementId, readiness: Readiness) -> bool {
        self.is_incoming(element) && self.awaiting == Some(readiness)
    }
}
