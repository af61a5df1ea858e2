//! Sidecar persistence: format choice, mutual exclusion, fallback loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::traits::SidecarCodec;
use crate::format::voc::VocCodec;
use crate::format::yolo::YoloCodec;
use crate::model::{AnnotationSet, ImageSize};

/// Extensions probed when resolving an annotation stem back to its image.
pub const IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "tif", "webp"];

/// The two interchangeable sidecar formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarFormat {
    /// Pascal-VOC-style XML sidecar (`<stem>.xml`).
    #[default]
    Xml,
    /// YOLO text sidecar (`<stem>.txt` plus `classes.txt`).
    Yolo,
}

impl SidecarFormat {
    /// The codec implementing this format.
    pub fn codec(&self) -> &'static dyn SidecarCodec {
        match self {
            SidecarFormat::Xml => &VocCodec,
            SidecarFormat::Yolo => &YoloCodec,
        }
    }

    /// The other format, used as fallback source and stale-file target.
    pub fn other(&self) -> Self {
        match self {
            SidecarFormat::Xml => SidecarFormat::Yolo,
            SidecarFormat::Yolo => SidecarFormat::Xml,
        }
    }
}

/// Persists annotation sets as sidecar files in one save directory,
/// enforcing that at most one format is authoritative per image.
///
/// Writing an image's sidecar in one format deletes the other format's file
/// if present; saving an empty set deletes both. Loading tries the active
/// format first and falls back to the other when it yields no labels; the
/// two are never merged.
#[derive(Debug, Clone)]
pub struct SidecarStore {
    save_dir: PathBuf,
}

impl SidecarStore {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Path of the sidecar for an image stem in the given format.
    pub fn sidecar_path(&self, stem: &str, format: SidecarFormat) -> PathBuf {
        self.save_dir
            .join(format!("{}.{}", stem, format.codec().extension()))
    }

    /// Persist a set in the given format, deleting the other format's
    /// sidecar. An empty set removes both sidecars instead.
    pub fn save(
        &self,
        stem: &str,
        set: &AnnotationSet,
        format: SidecarFormat,
    ) -> Result<(), FormatError> {
        if set.is_empty() {
            return self.remove(stem);
        }

        fs::create_dir_all(&self.save_dir)?;
        format.codec().write(set, &self.sidecar_path(stem, format))?;

        let stale = self.sidecar_path(stem, format.other());
        if stale.exists() {
            fs::remove_file(&stale)?;
        }

        log::info!(
            "saved {} label(s) for '{}' as {}",
            set.len(),
            stem,
            format.codec().id()
        );
        Ok(())
    }

    /// Delete both sidecars of an image stem, if present.
    pub fn remove(&self, stem: &str) -> Result<(), FormatError> {
        for format in [SidecarFormat::Xml, SidecarFormat::Yolo] {
            let path = self.sidecar_path(stem, format);
            if path.exists() {
                fs::remove_file(&path)?;
                log::info!("removed sidecar {:?}", path);
            }
        }
        Ok(())
    }

    /// Load an image's annotations, preferring `format` and falling back to
    /// the other format when the preferred one has no data.
    ///
    /// A missing or malformed sidecar counts as "no data" rather than an
    /// error; the result is an empty set when neither format has labels.
    pub fn load(&self, stem: &str, size: ImageSize, format: SidecarFormat) -> AnnotationSet {
        for candidate in [format, format.other()] {
            let path = self.sidecar_path(stem, candidate);
            if !path.exists() {
                continue;
            }
            match candidate.codec().read(&path, size) {
                Ok(set) if !set.is_empty() => {
                    log::debug!(
                        "loaded {} label(s) for '{}' from {}",
                        set.len(),
                        stem,
                        candidate.codec().id()
                    );
                    return set;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("failed to read sidecar {:?}: {}", path, e);
                }
            }
        }

        AnnotationSet::new(
            find_image_for_stem(&self.save_dir, stem).unwrap_or_default(),
            size,
        )
    }
}

/// Find an image file matching the given stem in the directory.
///
/// Returns `None` when no image with a known extension exists; callers
/// fall back to an empty path rather than inventing one that a later
/// reload could not reproduce.
pub fn find_image_for_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.exists())
}
