use image::RgbImage;
use log::{debug, error};
use std::fs;
use std::path::{Path, PathBuf};

/// Path of frame `index` inside `dir`, zero-padded so files sort in order.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{:05}.png", index))
}

/// Saves a resolved frame as PNG, creating the parent directory if needed.
/// Failures are logged and reported as `false`.
pub fn save_frame(image: &RgbImage, path: &Path) -> bool {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Err(e) = fs::create_dir_all(parent)
    {
        error!("Failed to create '{}': {}", parent.display(), e);
        return false;
    }
    match image.save(path) {
        Ok(()) => {
            debug!("saved {}", path.display());
            true
        }
        Err(e) => {
            error!("Failed to save image to '{}': {}", path.display(), e);
            false
        }
    }
}
