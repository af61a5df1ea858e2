//! Labels and per-image annotation sets.

use std::path::PathBuf;

use super::geometry::BoundingBox;

/// Default value for the `pose` compatibility field.
pub const DEFAULT_POSE: &str = "Unspecified";

/// A labeled bounding box.
///
/// `pose`, `truncated` and `difficult` exist for format compatibility only;
/// nothing in the tool interprets them beyond round-tripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub pose: String,
    pub truncated: u8,
    pub difficult: u8,
    pub bndbox: BoundingBox,
}

impl Label {
    /// Create a label with default compatibility fields.
    pub fn new(name: impl Into<String>, bndbox: BoundingBox) -> Self {
        Self {
            name: name.into(),
            pose: DEFAULT_POSE.to_string(),
            truncated: 0,
            difficult: 0,
            bndbox,
        }
    }
}

/// Pixel dimensions of an image at annotation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    /// Channel count, written as `depth` in the XML sidecar.
    pub depth: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            depth: 3,
        }
    }
}

/// The ordered labels of one image, plus what is needed to persist them.
///
/// At most one on-disk sidecar (XML or YOLO) is authoritative for the image
/// at any time; see [`crate::format::SidecarStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSet {
    /// Path of the annotated image.
    pub image_path: PathBuf,
    /// Image dimensions at save time.
    pub size: ImageSize,
    /// Labels in creation order.
    pub labels: Vec<Label>,
}

impl AnnotationSet {
    /// Create an empty set for an image.
    pub fn new(image_path: impl Into<PathBuf>, size: ImageSize) -> Self {
        Self {
            image_path: image_path.into(),
            size,
            labels: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}
