use std::path::PathBuf;

use thiserror::Error;

/// Library error type for hero-slider operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A configured image directory is missing or not a directory.
    #[error("invalid image directory: {}", .0.display())]
    BadDir(PathBuf),

    /// Image dimensions could not be read.
    #[error("failed to probe {}: {source}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
