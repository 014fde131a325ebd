use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::layout::{CanvasLimits, Viewport};

/// One hero artwork: where to load it from and how to describe it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeroImage {
    #[serde(rename = "src")]
    pub source: String,
    #[serde(rename = "alt", default)]
    pub alt_text: String,
}

impl HeroImage {
    pub fn new(source: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alt_text: alt_text.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Ordered hero images; rotation follows this order.
    pub images: Vec<HeroImage>,
    /// Optional directory whose images are appended after `images`.
    pub image_library_path: Option<PathBuf>,
    /// Base directory for relative image sources. Defaults to the directory
    /// holding the configuration file.
    pub image_root: Option<PathBuf>,
    /// Time between automatic advances.
    #[serde(with = "humantime_serde")]
    pub rotation_interval: Duration,
    /// Upper bound on a slide before it is finalized without a completion event.
    #[serde(with = "humantime_serde")]
    pub transition_fallback: Duration,
    /// Optional deterministic seed for the starting image.
    pub startup_seed: Option<u64>,
    /// Whether the page carries a "next" trigger.
    pub trigger: bool,
    pub layout: LayoutOptions,
    pub headless: HeadlessOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)?;
        let mut cfg: Self = serde_yaml::from_str(&s)?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        cfg.image_root = Some(match cfg.image_root.take() {
            Some(root) => base.join(root),
            None => base.clone(),
        });
        cfg.image_library_path = cfg.image_library_path.take().map(|p| base.join(p));
        Ok(cfg)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.rotation_interval.is_zero(),
            "rotation-interval must be greater than zero"
        );
        ensure!(
            !self.transition_fallback.is_zero(),
            "transition-fallback must be greater than zero"
        );
        self.layout.validate().context("invalid layout")?;
        self.headless.validate().context("invalid headless options")?;
        Ok(self)
    }

    pub fn image_root(&self) -> &Path {
        self.image_root.as_deref().unwrap_or(Path::new("."))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            image_library_path: None,
            image_root: None,
            rotation_interval: Duration::from_secs(20),
            transition_fallback: Duration::from_millis(900),
            startup_seed: None,
            trigger: true,
            layout: LayoutOptions::default(),
            headless: HeadlessOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutOptions {
    /// Viewports at most this wide use the `mobile` limits.
    pub small_viewport_max_width: f64,
    pub desktop: CanvasLimits,
    pub mobile: CanvasLimits,
}

impl LayoutOptions {
    pub fn limits(&self, small_viewport: bool) -> &CanvasLimits {
        if small_viewport {
            &self.mobile
        } else {
            &self.desktop
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.small_viewport_max_width > 0.0,
            "layout.small-viewport-max-width must be positive"
        );
        for (name, limits) in [("desktop", &self.desktop), ("mobile", &self.mobile)] {
            ensure!(
                limits.max_width > 0.0 && limits.max_height > 0.0,
                "layout.{name} maximum dimensions must be positive"
            );
            ensure!(
                limits.width_ratio > 0.0 && limits.width_ratio <= 1.0,
                "layout.{name}.width-ratio must be in (0, 1]"
            );
            ensure!(
                limits.height_ratio > 0.0 && limits.height_ratio <= 1.0,
                "layout.{name}.height-ratio must be in (0, 1]"
            );
        }
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            small_viewport_max_width: 600.0,
            desktop: CanvasLimits::DESKTOP,
            mobile: CanvasLimits::MOBILE,
        }
    }
}

/// Settings for the in-process stage the binary renders to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HeadlessOptions {
    /// Initial window size as `[width, height]`.
    pub viewport: Viewport,
    pub prefers_reduced_motion: bool,
    /// Whether images report a decode signal before sliding in.
    pub decode_support: bool,
    /// How long a simulated slide takes before its transition ends.
    #[serde(with = "humantime_serde")]
    pub slide_duration: Duration,
}

impl HeadlessOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.viewport.width > 0.0 && self.viewport.height > 0.0,
            "headless.viewport must be positive"
        );
        Ok(())
    }
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1200.0, 800.0),
            prefers_reduced_motion: false,
            decode_support: true,
            slide_duration: Duration::from_millis(600),
        }
    }
}
