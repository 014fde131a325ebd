use hero_slider::config::HeroImage;
use hero_slider::events::{AnimateSlide, LoadRequest, SliderEvent};
use hero_slider::layout::{Size, Viewport};
use hero_slider::slider::{HeroSlider, SliderOptions};
use hero_slider::stage::HeadlessStage;
use hero_slider::tasks::{animator, loader, slider};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DESKTOP: Viewport = Viewport::new(1200.0, 800.0);

fn images(n: usize) -> Vec<HeroImage> {
    (0..n)
        .map(|i| HeroImage::new(format!("hero-{i}.jpg"), format!("Hero {i}")))
        .collect()
}

fn cached_stage(n: usize) -> HeadlessStage {
    (0..n).fold(HeadlessStage::fixed(DESKTOP, false), |stage, i| {
        stage.with_known_size(format!("hero-{i}.jpg"), Size::new(1600, 900))
    })
}

fn shown(stage: &HeadlessStage) -> Vec<String> {
    stage
        .attached()
        .iter()
        .filter_map(|id| stage.element(*id))
        .map(|el| el.source.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn missing_transition_end_finalizes_on_fallback() {
    let (event_tx, event_rx) = mpsc::channel::<SliderEvent>(16);
    let cancel = CancellationToken::new();
    let hero =
        HeroSlider::with_start_index(cached_stage(3), images(3), SliderOptions::default(), 0);
    let handle = tokio::spawn(slider::run(hero, event_rx, cancel.clone()));

    event_tx.send(SliderEvent::NextPressed).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    cancel.cancel();
    let stage = handle.await.unwrap().unwrap();
    assert_eq!(shown(&stage), vec!["hero-1.jpg".to_string()]);
    assert_eq!(stage.max_attached(), 2);
}

#[tokio::test(start_paused = true)]
async fn rotation_advances_every_interval() {
    let (_event_tx, event_rx) = mpsc::channel::<SliderEvent>(16);
    let cancel = CancellationToken::new();
    let hero =
        HeroSlider::with_start_index(cached_stage(3), images(3), SliderOptions::default(), 0);
    let handle = tokio::spawn(slider::run(hero, event_rx, cancel.clone()));

    // Two ticks, each finalized by the fallback 900ms later.
    tokio::time::sleep(Duration::from_secs(41)).await;

    cancel.cancel();
    let stage = handle.await.unwrap().unwrap();
    assert_eq!(shown(&stage), vec!["hero-2.jpg".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn rotation_keeps_running_after_host_channel_closes() {
    let (event_tx, event_rx) = mpsc::channel::<SliderEvent>(16);
    drop(event_tx);
    let cancel = CancellationToken::new();
    let hero =
        HeroSlider::with_start_index(cached_stage(2), images(2), SliderOptions::default(), 0);
    let handle = tokio::spawn(slider::run(hero, event_rx, cancel.clone()));

    tokio::time::sleep(Duration::from_secs(21)).await;

    cancel.cancel();
    let stage = handle.await.unwrap().unwrap();
    assert_eq!(shown(&stage), vec!["hero-1.jpg".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_releases_every_subscription() {
    let (_event_tx, event_rx) = mpsc::channel::<SliderEvent>(16);
    let cancel = CancellationToken::new();
    let hero =
        HeroSlider::with_start_index(cached_stage(2), images(2), SliderOptions::default(), 1);
    let handle = tokio::spawn(slider::run(hero, event_rx, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();

    let stage = handle.await.unwrap().unwrap();
    assert_eq!(stage.active_subscriptions(), 0);
    assert_eq!(shown(&stage), vec!["hero-1.jpg".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn animator_completion_beats_the_fallback() {
    let (event_tx, event_rx) = mpsc::channel::<SliderEvent>(16);
    let (slide_tx, slide_rx) = mpsc::channel::<AnimateSlide>(8);
    let cancel = CancellationToken::new();

    let options = SliderOptions {
        transition_fallback: Duration::from_secs(30),
        ..SliderOptions::default()
    };
    let stage = cached_stage(3).with_animator(slide_tx);
    let hero = HeroSlider::with_start_index(stage, images(3), options, 0);

    let animator = tokio::spawn(animator::run(
        slide_rx,
        event_tx.clone(),
        cancel.clone(),
        Duration::from_millis(600),
    ));
    let runner = tokio::spawn(slider::run(hero, event_rx, cancel.clone()));

    event_tx.send(SliderEvent::NextPressed).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    cancel.cancel();
    let stage = runner.await.unwrap().unwrap();
    let _ = animator.await;
    assert_eq!(shown(&stage), vec!["hero-1.jpg".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loader_reports_natural_size_to_the_slider() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(16, 9)
        .save(dir.path().join("hero-0.png"))
        .unwrap();

    let (event_tx, event_rx) = mpsc::channel::<SliderEvent>(16);
    let (load_tx, load_rx) = mpsc::channel::<LoadRequest>(8);
    let cancel = CancellationToken::new();

    let stage = HeadlessStage::fixed(DESKTOP, false)
        .with_image_root(dir.path())
        .with_loader(load_tx);
    let hero = HeroSlider::with_start_index(
        stage,
        vec![HeroImage::new("hero-0.png", "Hero")],
        SliderOptions::default(),
        0,
    );

    let loader = tokio::spawn(loader::run(load_rx, event_tx.clone(), cancel.clone(), 2));
    let runner = tokio::spawn(slider::run(hero, event_rx, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();

    let stage = runner.await.unwrap().unwrap();
    let _ = loader.await;
    let canvas = stage.container_size().expect("container sized");
    assert!((canvas.width - 1176.0).abs() < 1e-6);
    assert!((canvas.height - 661.5).abs() < 1e-6);
}
