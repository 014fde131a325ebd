use std::future::pending;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::events::SliderEvent;
use crate::slider::HeroSlider;
use crate::stage::Stage;

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// Owns the slider for its whole life: initializes it, serves host events
/// and both timers one at a time, and tears it down on cancellation. The
/// stage is handed back so callers can inspect what was rendered.
#[instrument(skip_all, fields(images = slider.images().len()))]
pub async fn run<S: Stage>(
    mut slider: HeroSlider<S>,
    mut events: Receiver<SliderEvent>,
    cancel: CancellationToken,
) -> Result<S> {
    slider.init(Instant::now());
    let mut events_open = true;

    loop {
        let rotation = slider.rotation_deadline();
        let fallback = slider.fallback_deadline();

        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; stopping hero slider");
                break;
            }

            maybe_event = events.recv(), if events_open => match maybe_event {
                Some(event) => {
                    debug!(?event, "host event");
                    slider.handle(event, Instant::now());
                }
                None => {
                    // Host side went away; timers keep the rotation going.
                    debug!("event channel closed");
                    events_open = false;
                }
            },

            _ = wait_until(fallback), if fallback.is_some() => {
                slider.on_fallback_timeout(Instant::now());
            }

            _ = wait_until(rotation), if rotation.is_some() => {
                slider.on_rotation_tick(Instant::now());
            }
        }
    }

    slider.destroy();
    Ok(slider.into_stage())
}
