use std::path::PathBuf;

use crate::layout::Size;
use crate::stage::ElementId;

/// Notifications the host delivers to the slider task.
#[derive(Debug, Clone, PartialEq)]
pub enum SliderEvent {
    /// The "next" trigger was pressed.
    NextPressed,
    /// The window was resized; the new viewport is read back from the stage.
    Resized,
    SmallViewportChanged(bool),
    ReducedMotionChanged(bool),
    ImageLoaded { element: ElementId, natural: Size },
    ImageFailed { element: ElementId },
    /// Decoding settled, successfully or not.
    ImageDecoded { element: ElementId },
    TransitionEnd { element: ElementId, property: String },
    TransitionCancel { element: ElementId },
}

/// Work the headless stage hands to its loader. `path` is `None` when the
/// source cannot be resolved to a local file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadRequest {
    Probe {
        element: ElementId,
        path: Option<PathBuf>,
    },
    Decode {
        element: ElementId,
        path: Option<PathBuf>,
    },
}

/// A slide animation the headless stage asks the animator to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimateSlide(pub ElementId);
