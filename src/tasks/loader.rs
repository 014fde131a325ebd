use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::Error;
use crate::events::{LoadRequest, SliderEvent};
use crate::layout::Size;

/// Natural size the way a browser reports it: EXIF orientations 5 through 8
/// rotate the image a quarter turn, so width and height swap.
pub fn probe_natural_size(path: &Path) -> Result<Size, Error> {
    let (width, height) = image::image_dimensions(path).map_err(|source| Error::Probe {
        path: path.to_path_buf(),
        source,
    })?;
    let size = match read_orientation(path) {
        Some(5..=8) => Size::new(height, width),
        _ => Size::new(width, height),
    };
    Ok(size)
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let orientation = field.value.get_uint(0)? as u16;
    debug!("exif orientation {} for {}", orientation, path.display());
    Some(orientation)
}

fn decode_fully(path: &Path) -> Result<(), Error> {
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| Error::Probe {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

fn serve(request: LoadRequest) -> SliderEvent {
    match request {
        LoadRequest::Probe { element, path } => {
            let Some(path) = path else {
                debug!(%element, "source is not a local file");
                return SliderEvent::ImageFailed { element };
            };
            match probe_natural_size(&path) {
                Ok(natural) => SliderEvent::ImageLoaded { element, natural },
                Err(err) => {
                    debug!(%element, "probe failed: {err}");
                    SliderEvent::ImageFailed { element }
                }
            }
        }
        LoadRequest::Decode { element, path } => {
            // Decode failures still settle; the slide goes ahead regardless.
            if let Some(path) = path {
                if let Err(err) = decode_fully(&path) {
                    debug!(%element, "decode failed: {err}");
                }
            }
            SliderEvent::ImageDecoded { element }
        }
    }
}

/// Serves the headless stage's load and decode requests on blocking threads
/// and reports each outcome to the slider task.
#[instrument(skip_all, fields(max_in_flight = max_in_flight))]
pub async fn run(
    mut requests: Receiver<LoadRequest>,
    to_slider: Sender<SliderEvent>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let mut tasks: JoinSet<SliderEvent> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            Some(request) = requests.recv(), if tasks.len() < max_in_flight => {
                tasks.spawn(async move {
                    let fallback = match &request {
                        LoadRequest::Probe { element, .. } => {
                            SliderEvent::ImageFailed { element: *element }
                        }
                        LoadRequest::Decode { element, .. } => {
                            SliderEvent::ImageDecoded { element: *element }
                        }
                    };
                    tokio::task::spawn_blocking(move || serve(request))
                        .await
                        .unwrap_or(fallback)
                });
            }

            Some(joined) = tasks.join_next() => {
                match joined {
                    Ok(event) => {
                        if to_slider.send(event).await.is_err() {
                            debug!("slider channel closed; loader exiting");
                            break;
                        }
                    }
                    Err(err) => warn!("load task failed: {err}"),
                }
            }

            else => break,
        }
    }
    Ok(())
}
