//! Data models for annotations.

mod geometry;
mod label;

pub use geometry::BoundingBox;
pub use label::{AnnotationSet, DEFAULT_POSE, ImageSize, Label};
