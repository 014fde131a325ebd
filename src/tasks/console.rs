use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::SliderEvent;
use crate::layout::Viewport;
use crate::stage::HostEnvironment;

/// Something a person at the terminal can do to the simulated page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Next,
    ReducedMotion(bool),
    ToggleReducedMotion,
    Viewport(Viewport),
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let arg = words.next();
        match (verb, arg) {
            ("next" | "n", None) => Ok(Self::Next),
            ("motion", Some("off")) => Ok(Self::ReducedMotion(true)),
            ("motion", Some("on")) => Ok(Self::ReducedMotion(false)),
            ("motion", None) => Ok(Self::ToggleReducedMotion),
            ("viewport", Some(size)) => parse_viewport(size).map(Self::Viewport),
            ("quit" | "q", None) => Ok(Self::Quit),
            _ => bail!("unknown command '{}'", line.trim()),
        }
    }
}

/// Parse `WIDTHxHEIGHT`, e.g. `1200x800`.
pub fn parse_viewport(raw: &str) -> Result<Viewport> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: f64 = w.trim().parse().context("invalid viewport width")?;
    let height: f64 = h.trim().parse().context("invalid viewport height")?;
    if width <= 0.0 || height <= 0.0 {
        bail!("viewport must be positive, got {raw}");
    }
    Ok(Viewport::new(width, height))
}

/// Applies commands to the shared window state and tells the slider what a
/// browser would: resize and media-query change notifications, trigger clicks.
#[derive(Debug)]
pub struct HostControl {
    environment: watch::Sender<HostEnvironment>,
    to_slider: Sender<SliderEvent>,
    small_viewport_max_width: f64,
}

impl HostControl {
    pub fn new(
        environment: watch::Sender<HostEnvironment>,
        to_slider: Sender<SliderEvent>,
        small_viewport_max_width: f64,
    ) -> Self {
        Self {
            environment,
            to_slider,
            small_viewport_max_width,
        }
    }

    /// Returns `false` once the command asks to quit or the slider is gone.
    pub async fn apply(&self, command: Command) -> bool {
        let events = match command {
            Command::Next => vec![SliderEvent::NextPressed],
            Command::ReducedMotion(reduce) => self.set_reduced_motion(reduce),
            Command::ToggleReducedMotion => {
                let reduce = !self.environment.borrow().reduced_motion;
                self.set_reduced_motion(reduce)
            }
            Command::Viewport(viewport) => self.set_viewport(viewport),
            Command::Quit => return false,
        };
        for event in events {
            if self.to_slider.send(event).await.is_err() {
                debug!("slider channel closed");
                return false;
            }
        }
        true
    }

    fn set_reduced_motion(&self, reduce: bool) -> Vec<SliderEvent> {
        let changed = self.environment.send_if_modified(|env| {
            let changed = env.reduced_motion != reduce;
            env.reduced_motion = reduce;
            changed
        });
        if changed {
            info!(reduce, "reduced motion preference changed");
            vec![SliderEvent::ReducedMotionChanged(reduce)]
        } else {
            Vec::new()
        }
    }

    fn set_viewport(&self, viewport: Viewport) -> Vec<SliderEvent> {
        let breakpoint = self.small_viewport_max_width;
        let was_small = self.environment.borrow().viewport.width <= breakpoint;
        self.environment.send_modify(|env| env.viewport = viewport);
        let is_small = viewport.width <= breakpoint;
        info!(width = viewport.width, height = viewport.height, "viewport resized");

        let mut events = vec![SliderEvent::Resized];
        if was_small != is_small {
            events.push(SliderEvent::SmallViewportChanged(is_small));
        }
        events
    }
}

/// Reads commands line by line until EOF, `quit`, or cancellation, then
/// cancels the whole pipeline.
pub async fn run<R>(
    input: R,
    control: std::sync::Arc<HostControl>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        select! {
            _ = cancel.cancelled() => return Ok(()),

            line = lines.next_line() => {
                let Some(line) = line.context("reading console input")? else {
                    info!("console input closed; initiating shutdown");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        debug!(?command, "console command");
                        if !control.apply(command).await {
                            break;
                        }
                    }
                    Err(err) => warn!("{err:#}"),
                }
            }
        }
    }
    cancel.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn control(
        width: f64,
    ) -> (
        Arc<HostControl>,
        watch::Receiver<HostEnvironment>,
        mpsc::Receiver<SliderEvent>,
    ) {
        let (env_tx, env_rx) = watch::channel(HostEnvironment {
            viewport: Viewport::new(width, 800.0),
            reduced_motion: false,
        });
        let (tx, rx) = mpsc::channel(16);
        (Arc::new(HostControl::new(env_tx, tx, 600.0)), env_rx, rx)
    }

    #[test]
    fn parses_commands() {
        assert_eq!("next".parse::<Command>().unwrap(), Command::Next);
        assert_eq!(
            "motion off".parse::<Command>().unwrap(),
            Command::ReducedMotion(true)
        );
        assert_eq!(
            "viewport 640x480".parse::<Command>().unwrap(),
            Command::Viewport(Viewport::new(640.0, 480.0))
        );
        assert!("viewport 0x480".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn crossing_the_breakpoint_notifies_both_listeners() {
        let (control, env, mut rx) = control(1200.0);
        assert!(control.apply(Command::Viewport(Viewport::new(500.0, 700.0))).await);
        assert_eq!(rx.recv().await.unwrap(), SliderEvent::Resized);
        assert_eq!(
            rx.recv().await.unwrap(),
            SliderEvent::SmallViewportChanged(true)
        );
        assert_eq!(env.borrow().viewport, Viewport::new(500.0, 700.0));

        assert!(control.apply(Command::Viewport(Viewport::new(550.0, 700.0))).await);
        assert_eq!(rx.recv().await.unwrap(), SliderEvent::Resized);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unchanged_preference_is_not_reported() {
        let (control, env, mut rx) = control(1200.0);
        assert!(control.apply(Command::ReducedMotion(false)).await);
        assert!(rx.try_recv().is_err());

        assert!(control.apply(Command::ToggleReducedMotion).await);
        assert_eq!(
            rx.recv().await.unwrap(),
            SliderEvent::ReducedMotionChanged(true)
        );
        assert!(env.borrow().reduced_motion);
    }

    #[tokio::test]
    async fn eof_cancels_the_pipeline() {
        let (control, _env, mut rx) = control(1200.0);
        let cancel = CancellationToken::new();
        run(&b"next\nbogus\n\nnext\n"[..], control, cancel.clone())
            .await
            .unwrap();
        assert!(cancel.is_cancelled());
        assert_eq!(rx.recv().await.unwrap(), SliderEvent::NextPressed);
        assert_eq!(rx.recv().await.unwrap(), SliderEvent::NextPressed);
    }
}
