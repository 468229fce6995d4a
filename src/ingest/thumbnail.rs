use image::imageops::FilterType;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ThumbnailConfig;
use crate::error::VaultError;

/// Writes fixed-width previews into the thumbnails directory.
///
/// The output width is fixed by configuration; the height is exactly
/// `floor(source_height * width / source_width)`. Resizing always uses
/// Lanczos3 so repeated runs over the same source are byte-reproducible.
/// The thumbnail is saved under the same stored filename as the original,
/// so the encoder follows the original's extension.
pub struct ThumbnailGenerator {
    dir: PathBuf,
    width: u32,
}

impl ThumbnailGenerator {
    pub fn new(thumbnails_dir: &Path, config: &ThumbnailConfig) -> Self {
        Self {
            dir: thumbnails_dir.to_path_buf(),
            width: config.width,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Exact integer height law for a source of `w0 x h0`, `w0 > 0`.
    pub fn target_height(&self, w0: u32, h0: u32) -> u32 {
        (h0 as u64 * self.width as u64 / w0 as u64) as u32
    }

    /// Resize the decoded image and write it under `stored_name`. On any
    /// save failure the partial file is removed before returning, so a
    /// failed attempt leaves the thumbnails directory untouched.
    pub fn generate(&self, img: &DynamicImage, stored_name: &str) -> Result<PathBuf, VaultError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let height = self.target_height(img.width(), img.height());
        let thumbnail = img.resize_exact(self.width, height, FilterType::Lanczos3);

        let path = self.dir.join(stored_name);
        if let Err(e) = thumbnail.save(&path) {
            let _ = fs::remove_file(&path);
            return Err(match e {
                image::ImageError::IoError(io) => VaultError::Storage(io),
                other => VaultError::UnsupportedImage(other),
            });
        }

        Ok(path)
    }
}
