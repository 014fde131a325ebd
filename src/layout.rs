//! Canvas sizing for the hero container.
//!
//! Bounds come from the viewport and the active breakpoint; the canvas then
//! fits the image width-first and shrinks to the height bound if it would
//! overflow, preserving the image's aspect ratio.

use serde::Deserialize;

/// Natural pixel dimensions of an image, orientation already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `None` when either side is zero, mirroring an image that has not loaded.
    pub fn aspect(&self) -> Option<f64> {
        if self.width > 0 && self.height > 0 {
            Some(f64::from(self.width) / f64::from(self.height))
        } else {
            None
        }
    }
}

/// Inner dimensions of the host window in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<[f64; 2]> for Viewport {
    fn from([width, height]: [f64; 2]) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub max_width: f64,
    pub max_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn aspect(&self) -> Option<f64> {
        (self.height > 0.0).then(|| self.width / self.height)
    }

    /// Presentation variables published on the document root.
    pub fn root_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = vec![
            (CANVAS_WIDTH_PROPERTY, format!("{}px", self.width)),
            (CANVAS_HEIGHT_PROPERTY, format!("{}px", self.height)),
        ];
        if let Some(aspect) = self.aspect() {
            props.push((CANVAS_ASPECT_PROPERTY, aspect.to_string()));
        }
        props
    }
}

pub const CANVAS_WIDTH_PROPERTY: &str = "--hero-canvas-width";
pub const CANVAS_HEIGHT_PROPERTY: &str = "--hero-canvas-height";
pub const CANVAS_ASPECT_PROPERTY: &str = "--hero-canvas-aspect";

/// Size limits for one breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CanvasLimits {
    pub max_width: f64,
    pub max_height: f64,
    /// Fraction of the viewport width the canvas may cover.
    pub width_ratio: f64,
    /// Fraction of the viewport height the canvas may cover.
    pub height_ratio: f64,
}

impl CanvasLimits {
    pub const DESKTOP: Self = Self {
        max_width: 1500.0,
        max_height: 1125.0,
        width_ratio: 0.98,
        height_ratio: 0.95,
    };

    pub const MOBILE: Self = Self {
        max_width: 640.0,
        max_height: 640.0,
        width_ratio: 0.96,
        height_ratio: 0.85,
    };

    pub fn bounds(&self, viewport: Viewport) -> Bounds {
        let max_width = self.max_width.min(viewport.width * self.width_ratio);
        let max_height = self.max_height.min(viewport.height * self.height_ratio);
        Bounds {
            max_width: max_width.max(1.0),
            max_height: max_height.max(1.0),
        }
    }
}

/// Width-first fit of `natural` inside `bounds`; raw bounds when unknown.
pub fn fit_canvas(bounds: Bounds, natural: Option<Size>) -> CanvasSize {
    let Some(aspect) = natural.and_then(|size| size.aspect()) else {
        return CanvasSize {
            width: bounds.max_width,
            height: bounds.max_height,
        };
    };

    let mut width = bounds.max_width;
    let mut height = width / aspect;
    if height > bounds.max_height {
        height = bounds.max_height;
        width = height * aspect;
    }
    CanvasSize { width, height }
}
