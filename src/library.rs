//! Assembling the hero image list.

use std::path::Path;

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::{Configuration, HeroImage};
use crate::error::Error;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Return `true` if `path` has an extension the loader can decode.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Configured images first, then anything found under `image-library-path`.
///
/// # Errors
/// Returns [`Error::BadDir`] if the library path is set but not a directory.
pub fn collect_images(cfg: &Configuration) -> Result<Vec<HeroImage>, Error> {
    let mut images = cfg.images.clone();
    if let Some(library) = &cfg.image_library_path {
        let found = discover_images(library, cfg.image_root())?;
        info!(
            library = %library.display(),
            discovered = found.len(),
            "image library scanned"
        );
        images.extend(found);
    }
    Ok(images)
}

/// Recursively list images below `library`, sorted by path. Sources are
/// written relative to `image_root` when possible so the stage resolves
/// them back to the same file. Alt text comes from the file stem.
///
/// # Errors
/// Returns [`Error::BadDir`] if `library` is missing or not a directory.
pub fn discover_images(library: &Path, image_root: &Path) -> Result<Vec<HeroImage>, Error> {
    if !library.is_dir() {
        return Err(Error::BadDir(library.to_path_buf()));
    }

    let mut paths: Vec<_> = WalkDir::new(library)
        .follow_links(true)
        .into_iter()
        // Skip hidden dot-directories *below* the root only.
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(DirEntry::into_path)
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let source = path
                .strip_prefix(image_root)
                .unwrap_or(path.as_path())
                .to_string_lossy()
                .into_owned();
            let alt_text = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
                .unwrap_or_default();
            debug!(%source, "discovered hero image");
            HeroImage::new(source, alt_text)
        })
        .collect())
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
