use hero_slider::config::{Configuration, HeroImage};
use hero_slider::layout::{CanvasLimits, Viewport};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn empty_document_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    assert!(cfg.images.is_empty());
    assert_eq!(cfg.rotation_interval, Duration::from_secs(20));
    assert_eq!(cfg.transition_fallback, Duration::from_millis(900));
    assert!(cfg.trigger);
    assert_eq!(cfg.startup_seed, None);
    assert!((cfg.layout.small_viewport_max_width - 600.0).abs() < f64::EPSILON);
    assert_eq!(cfg.layout.desktop, CanvasLimits::DESKTOP);
    assert_eq!(cfg.layout.mobile, CanvasLimits::MOBILE);
    assert_eq!(cfg.headless.viewport, Viewport::new(1200.0, 800.0));
    assert!(cfg.headless.decode_support);
    assert!(!cfg.headless.prefers_reduced_motion);
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
images:
  - src: art/dragon.jpg
    alt: A dragon over the lake
  - src: art/castle.png
rotation-interval: 45s
transition-fallback: 1s 200ms
startup-seed: 7
trigger: false
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        cfg.images,
        vec![
            HeroImage::new("art/dragon.jpg", "A dragon over the lake"),
            HeroImage::new("art/castle.png", ""),
        ]
    );
    assert_eq!(cfg.rotation_interval, Duration::from_secs(45));
    assert_eq!(cfg.transition_fallback, Duration::from_millis(1200));
    assert_eq!(cfg.startup_seed, Some(7));
    assert!(!cfg.trigger);
}

#[test]
fn parse_layout_overrides() {
    let yaml = r#"
layout:
  small-viewport-max-width: 720
  mobile:
    max-width: 500
    max-height: 400
    width-ratio: 1.0
    height-ratio: 0.5
headless:
  viewport: [390, 844]
  prefers-reduced-motion: true
  decode-support: false
  slide-duration: 0s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!((cfg.layout.small_viewport_max_width - 720.0).abs() < f64::EPSILON);
    assert_eq!(cfg.layout.desktop, CanvasLimits::DESKTOP);
    let bounds = cfg.layout.limits(true).bounds(cfg.headless.viewport);
    assert!((bounds.max_width - 390.0).abs() < 1e-9);
    assert!((bounds.max_height - 400.0).abs() < 1e-9);
    assert!(cfg.headless.prefers_reduced_motion);
    assert!(!cfg.headless.decode_support);
    assert!(cfg.headless.slide_duration.is_zero());
}

#[test]
fn partial_limits_are_rejected() {
    let yaml = r#"
layout:
  mobile:
    max-width: 500
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn zero_rotation_interval_is_invalid() {
    let cfg: Configuration = serde_yaml::from_str("rotation-interval: 0s").unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("rotation-interval"));
}

#[test]
fn zero_fallback_is_invalid() {
    let cfg: Configuration = serde_yaml::from_str("transition-fallback: 0ms").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn out_of_range_ratio_is_invalid() {
    let yaml = r#"
layout:
  desktop:
    max-width: 1500
    max-height: 1125
    width-ratio: 1.5
    height-ratio: 0.95
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(format!("{err:#}").contains("width-ratio"));
}

#[test]
fn non_positive_viewport_is_invalid() {
    let cfg: Configuration = serde_yaml::from_str("headless: { viewport: [0, 800] }").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn paths_resolve_against_the_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.yaml");
    std::fs::write(&path, "image-library-path: heroes\nimages: [{ src: a.jpg }]\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.image_root(), dir.path());
    assert_eq!(cfg.image_library_path, Some(dir.path().join("heroes")));
}

#[test]
fn explicit_image_root_is_relative_to_the_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.yaml");
    std::fs::write(&path, "image-root: static/img\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.image_root(), dir.path().join("static/img").as_path());
    assert_eq!(cfg.image_library_path, None);
}

#[test]
fn absolute_paths_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.yaml");
    std::fs::write(&path, "image-root: /srv/hero\n").unwrap();

    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.image_root(), Path::new("/srv/hero"));
}

#[test]
fn missing_file_is_an_error() {
    let missing = PathBuf::from("/definitely/not/here/hero.yaml");
    assert!(Configuration::from_yaml_file(missing).is_err());
}

#[test]
fn unloaded_config_defaults_to_current_dir() {
    let cfg = Configuration::default();
    assert_eq!(cfg.image_root(), Path::new("."));
}

#[test]
fn malformed_yaml_reports_the_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.yaml");
    std::fs::write(&path, "rotation-interval: [not, a, duration]\n").unwrap();

    let err = Configuration::from_yaml_file(&path).unwrap_err();
    assert!(err.downcast_ref::<serde_yaml::Error>().is_some());
}
