//! Trait seam shared by the two sidecar codecs.

use std::path::Path;

use crate::format::error::FormatError;
use crate::model::{AnnotationSet, ImageSize};

/// A bidirectional per-image annotation codec.
///
/// Both implementations ([`crate::format::VocCodec`],
/// [`crate::format::YoloCodec`]) read and write one sidecar file per image,
/// keyed by the image's filename stem. [`crate::format::SidecarStore`] owns
/// path construction and the mutual-exclusion rule; codecs only see the
/// concrete sidecar path.
pub trait SidecarCodec: Send + Sync {
    /// Unique identifier for this format (e.g. "voc", "yolo").
    fn id(&self) -> &'static str;

    /// Sidecar file extension (without leading dot).
    fn extension(&self) -> &'static str;

    /// Write the set to `path`, replacing any previous sidecar of this
    /// format. An implementation may delete `path` instead of writing it
    /// when nothing survives encoding.
    fn write(&self, set: &AnnotationSet, path: &Path) -> Result<(), FormatError>;

    /// Read the sidecar at `path`.
    ///
    /// `size` is the pixel size of the image the sidecar belongs to; the
    /// YOLO codec needs it to denormalize coordinates, the XML codec
    /// carries its own.
    fn read(&self, path: &Path, size: ImageSize) -> Result<AnnotationSet, FormatError>;
}
