//! Vehicle photo hosting.
//!
//! Photos are cropped to fill a fixed frame and stored under a name derived
//! from the vehicle alias, so uploading again for the same alias replaces
//! the previous photo.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::ImageFormat;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Folder inside the photo directory that receives fleet photos.
const PHOTO_FOLDER: &str = "fleet-status";

/// Something that accepts a photo and hands back a URL for it.
pub trait PhotoHost {
    /// Upload `file` as the photo of the vehicle called `alias`.
    ///
    /// Returns `None` if the upload failed; the cause is logged.
    fn upload(&self, file: &Path, alias: &str) -> Option<String>;
}

/// Stores photos in a local directory and returns `file://` URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPhotoHost {
    dir: PathBuf,
    width: u32,
    height: u32,
}

impl LocalPhotoHost {
    /// Create a host writing `width`x`height` photos into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            dir: dir.into(),
            width,
            height,
        }
    }

    /// Create a host from the `[photos]` configuration section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.photos_dir(), config.photos.width, config.photos.height)
    }

    /// Where the photo of `alias` is stored.
    #[must_use]
    pub fn photo_path(&self, alias: &str) -> PathBuf {
        self.dir
            .join(PHOTO_FOLDER)
            .join(format!("{}.jpg", slugify(alias)))
    }

    fn store(&self, file: &Path, alias: &str) -> Result<PathBuf> {
        let img = image::open(file)?;
        debug!(
            "Cropping {} ({}x{}) to {}x{}",
            file.display(),
            img.width(),
            img.height(),
            self.width,
            self.height
        );
        let cropped = img.resize_to_fill(self.width, self.height, FilterType::Lanczos3);

        let target = self.photo_path(alias);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        cropped
            .to_rgb8()
            .save_with_format(&target, ImageFormat::Jpeg)?;
        Ok(target)
    }
}

impl PhotoHost for LocalPhotoHost {
    fn upload(&self, file: &Path, alias: &str) -> Option<String> {
        match self.store(file, alias) {
            Ok(path) => {
                let path = path.canonicalize().unwrap_or(path);
                info!("Stored photo for {} at {}", alias, path.display());
                Some(format!("file://{}", path.display()))
            }
            Err(e) => {
                error!("Failed to upload photo {}: {}", file.display(), e);
                None
            }
        }
    }
}

/// Reduce an alias to a file-name-safe slug.
fn slugify(alias: &str) -> String {
    let mut slug = String::with_capacity(alias.len());
    for c in alias.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "vehicle".to_string()
    } else {
        slug.to_string()
    }
}
