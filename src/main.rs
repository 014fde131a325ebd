use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use hero_slider::config::{Configuration, HeroImage};
use hero_slider::events::{AnimateSlide, LoadRequest, SliderEvent};
use hero_slider::layout::{Viewport, fit_canvas};
use hero_slider::library;
use hero_slider::slider::{HeroSlider, SliderOptions};
use hero_slider::stage::{HeadlessStage, HostEnvironment};
use hero_slider::tasks::console::{self, Command, HostControl};
use hero_slider::tasks::{animator, loader, slider};

#[derive(Debug, Parser)]
#[command(
    name = "hero-slider",
    version,
    about = "Rotating hero image controller with a headless stage"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Deterministic seed for the starting image
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Override the initial viewport, e.g. 1200x800
    #[arg(long, value_name = "WxH", value_parser = console::parse_viewport)]
    viewport: Option<Viewport>,
    /// Start with the reduced-motion preference set
    #[arg(long)]
    reduced_motion: bool,
    /// Stop after this long, e.g. "90s"
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,
    /// Print the canvas computed for each image without running the slider
    #[arg(long)]
    layout_dry_run: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("hero_slider={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).compact().init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?
        .validated()
        .context("invalid configuration values")?;
    if let Some(viewport) = args.viewport {
        cfg.headless.viewport = viewport;
    }
    if args.reduced_motion {
        cfg.headless.prefers_reduced_motion = true;
    }
    if args.seed.is_some() {
        cfg.startup_seed = args.seed;
    }
    tracing::debug!("Loaded configuration from {}:\n{:#?}", args.config.display(), cfg);

    let images = library::collect_images(&cfg).context("failed to collect hero images")?;
    info!(count = images.len(), "hero images ready");

    if args.layout_dry_run {
        run_layout_dry_run(&cfg, &images);
        return Ok(());
    }

    // Channels (small/bounded)
    let (event_tx, event_rx) = mpsc::channel::<SliderEvent>(64); // Host -> Slider
    let (load_tx, load_rx) = mpsc::channel::<LoadRequest>(16); // Stage -> Loader
    let (slide_tx, slide_rx) = mpsc::channel::<AnimateSlide>(8); // Stage -> Animator
    let (env_tx, env_rx) = watch::channel(HostEnvironment {
        viewport: cfg.headless.viewport,
        reduced_motion: cfg.headless.prefers_reduced_motion,
    });

    let stage = HeadlessStage::new(env_rx)
        .with_image_root(cfg.image_root())
        .with_small_viewport_max_width(cfg.layout.small_viewport_max_width)
        .with_decode_support(cfg.headless.decode_support)
        .with_loader(load_tx)
        .with_animator(slide_tx);
    let stage = if cfg.trigger {
        stage
    } else {
        stage.without_trigger()
    };

    let options = SliderOptions::from(&cfg);
    let hero = match cfg.startup_seed {
        Some(seed) => HeroSlider::new(stage, images, options, &mut StdRng::seed_from_u64(seed)),
        None => HeroSlider::new(stage, images, options, &mut rand::rng()),
    };

    let cancel = CancellationToken::new();
    let control = Arc::new(HostControl::new(
        env_tx,
        event_tx.clone(),
        cfg.layout.small_viewport_max_width,
    ));

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    if let Some(limit) = args.run_for {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(limit) => {
                    info!(?limit, "run time elapsed; initiating shutdown");
                    cancel.cancel();
                }
            }
        });
    }

    // SIGUSR1 presses "next", SIGUSR2 flips the reduced-motion preference.
    #[cfg(unix)]
    {
        let handlers = [
            (SignalKind::user_defined1(), Command::Next, "SIGUSR1"),
            (SignalKind::user_defined2(), Command::ToggleReducedMotion, "SIGUSR2"),
        ];
        for (kind, command, name) in handlers {
            let cancel = cancel.clone();
            let control = control.clone();
            tokio::spawn(async move {
                match signal(kind) {
                    Ok(mut stream) => loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            received = stream.recv() => {
                                if received.is_none() {
                                    break;
                                }
                                info!(signal = name, ?command, "signal received");
                                if !control.apply(command).await {
                                    break;
                                }
                            }
                        }
                    },
                    Err(err) => warn!("failed to register {name} handler: {err}"),
                }
            });
        }
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let cancel = cancel.clone();
        let event_tx = event_tx.clone();
        async move {
            loader::run(load_rx, event_tx, cancel, 4)
                .await
                .context("loader task failed")
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        let event_tx = event_tx.clone();
        let slide_duration = cfg.headless.slide_duration;
        async move {
            animator::run(slide_rx, event_tx, cancel, slide_duration)
                .await
                .context("animator task failed")
        }
    });

    if io::stdin().is_terminal() {
        let cancel = cancel.clone();
        let control = control.clone();
        tasks.spawn(async move {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            console::run(input, control, cancel)
                .await
                .context("console task failed")
        });
        info!("console ready: next | motion [on|off] | viewport WxH | quit");
    } else {
        tracing::debug!("stdin is not a terminal; console disabled");
    }
    drop(event_tx);

    let stage = slider::run(hero, event_rx, cancel.clone())
        .await
        .context("slider task failed")?;
    cancel.cancel();

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    let shown = stage
        .attached()
        .iter()
        .filter_map(|id| stage.element(*id))
        .map(|el| el.source.as_str())
        .collect::<Vec<_>>();
    info!(
        ?shown,
        canvas = ?stage.container_size(),
        subscriptions = stage.active_subscriptions(),
        "hero slider stopped"
    );
    Ok(())
}

fn run_layout_dry_run(cfg: &Configuration, images: &[HeroImage]) {
    let viewport = cfg.headless.viewport;
    let small = viewport.width <= cfg.layout.small_viewport_max_width;
    let bounds = cfg.layout.limits(small).bounds(viewport);

    println!(
        "# layout dry run\n# viewport: {}x{} ({})\n# bounds: {} x {}\n# images: {}\n",
        viewport.width,
        viewport.height,
        if small { "small" } else { "desktop" },
        bounds.max_width,
        bounds.max_height,
        images.len(),
    );

    let stage = HeadlessStage::fixed(viewport, false).with_image_root(cfg.image_root());
    for (idx, image) in images.iter().enumerate() {
        let natural = stage
            .resolve_source(&image.source)
            .and_then(|path| loader::probe_natural_size(&path).ok());
        let canvas = fit_canvas(bounds, natural);
        let natural = natural.map_or_else(
            || "unavailable".to_string(),
            |n| format!("{}x{}", n.width, n.height),
        );
        println!(
            "  {:>3}: {:>8.1} x {:<8.1} ({natural}) {}",
            idx + 1,
            canvas.width,
            canvas.height,
            image.source
        );
    }
}
