use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::events::{AnimateSlide, SliderEvent};
use crate::stage::{ElementId, SLIDE_PROPERTY};

/// Plays slide animations for the headless stage: each one reports a
/// `transform` transition end after `slide_duration`. A zero duration models
/// a stylesheet without a transition, where no completion event ever fires.
#[instrument(skip_all, fields(slide_ms = slide_duration.as_millis() as u64))]
pub async fn run(
    mut slides: Receiver<AnimateSlide>,
    to_slider: Sender<SliderEvent>,
    cancel: CancellationToken,
    slide_duration: Duration,
) -> Result<()> {
    let mut playing: JoinSet<ElementId> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            Some(AnimateSlide(element)) = slides.recv() => {
                if slide_duration.is_zero() {
                    trace!(%element, "no transition configured; completion never fires");
                    continue;
                }
                playing.spawn(async move {
                    sleep(slide_duration).await;
                    element
                });
            }

            Some(Ok(element)) = playing.join_next() => {
                let event = SliderEvent::TransitionEnd {
                    element,
                    property: SLIDE_PROPERTY.to_string(),
                };
                if to_slider.send(event).await.is_err() {
                    debug!("slider channel closed; animator exiting");
                    break;
                }
            }

            else => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn completes_after_slide_duration() {
        let (slide_tx, slide_rx) = mpsc::channel(4);
        let (ev_tx, mut ev_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            slide_rx,
            ev_tx,
            cancel.clone(),
            Duration::from_millis(600),
        ));

        let start = tokio::time::Instant::now();
        slide_tx.send(AnimateSlide(ElementId(4))).await.unwrap();
        let event = ev_rx.recv().await.expect("animator channel closed");
        assert_eq!(
            event,
            SliderEvent::TransitionEnd {
                element: ElementId(4),
                property: "transform".to_string(),
            }
        );
        assert!(start.elapsed() >= Duration::from_millis(600));

        cancel.cancel();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_never_completes() {
        let (slide_tx, slide_rx) = mpsc::channel(4);
        let (ev_tx, mut ev_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(slide_rx, ev_tx, cancel.clone(), Duration::ZERO));

        slide_tx.send(AnimateSlide(ElementId(1))).await.unwrap();
        let none = tokio::time::timeout(Duration::from_secs(5), ev_rx.recv()).await;
        assert!(none.is_err(), "no transition end should be reported");

        cancel.cancel();
        let _ = handle.await;
    }
}
