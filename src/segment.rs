//! Trait seam to the external segmentation capability.
//!
//! The core never talks to a model directly; it drives these traits. A real
//! backend wraps its runtime behind them, and tests substitute recording
//! mocks.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::model::{BoundingBox, ImageSize, Label};

/// Errors surfaced by a segmentation backend.
#[derive(Error, Debug)]
pub enum SegmentError {
    /// I/O error while touching frames or videos
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure (model load, inference, ...)
    #[error("segmentation backend error: {0}")]
    Backend(String),
}

impl SegmentError {
    /// Create a backend error with a message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Whether a prompt point marks foreground or background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Foreground,
    Background,
}

/// A single click prompt, in the pixel space of the image it was captured
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptPoint {
    pub x: i32,
    pub y: i32,
    pub polarity: Polarity,
}

impl PromptPoint {
    pub fn new(x: i32, y: i32, polarity: Polarity) -> Self {
        Self { x, y, polarity }
    }
}

/// Interactive single-image segmentation.
///
/// Stateful per image: prompts accumulate against the image set by
/// [`ImageSegmenter::set_image`] and refine one candidate mask until
/// [`ImageSegmenter::reset_prompts`] clears them. The session resets the
/// backend whenever the active image changes.
pub trait ImageSegmenter {
    /// Replace the active image, discarding accumulated prompt state.
    fn set_image(&mut self, image: &image::DynamicImage) -> Result<(), SegmentError>;

    /// Register one prompt point and return the tight bounding box of the
    /// refined candidate mask, for live preview.
    fn add_point(&mut self, point: PromptPoint) -> Result<BoundingBox, SegmentError>;

    /// Discard accumulated prompts without changing the active image.
    fn reset_prompts(&mut self);
}

/// One object's annotation on one extracted frame, produced by the batch
/// mask render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Filename stem of the frame image this record belongs to.
    pub stem: String,
    /// The labeled box on that frame.
    pub label: Label,
    /// Pixel size of the frame.
    pub size: ImageSize,
}

/// Batch segmentation over an extracted video frame set.
///
/// Driven exclusively by [`crate::video::VideoAnnotationJob`]; the call
/// sequence is extract, set_video, run_inference, reset_object_prompts,
/// then per object (ascending id) add_object_point* and commit_object,
/// and finally render_masks.
pub trait VideoSegmenter {
    /// Extract frames from `video` into `out_dir` at `frame_rate` frames
    /// per second. Returns the number of frames written.
    fn extract_frames(
        &mut self,
        video: &Path,
        out_dir: &Path,
        frame_rate: u32,
    ) -> Result<usize, SegmentError>;

    /// Point the backend at an extracted frame set.
    fn set_video(&mut self, frames_dir: &Path) -> Result<(), SegmentError>;

    /// Seed per-frame features; runs once per job.
    fn run_inference(&mut self, frames_dir: &Path) -> Result<(), SegmentError>;

    /// Drop per-object prompt state left over from a previous job.
    fn reset_object_prompts(&mut self);

    /// Register one prompt point for an object.
    fn add_object_point(&mut self, object_id: u32, point: PromptPoint) -> Result<(), SegmentError>;

    /// Commit the object's accumulated points as a mask extension.
    fn commit_object(&mut self, object_id: u32) -> Result<(), SegmentError>;

    /// Propagate masks across all frames, writing rendered mask imagery
    /// into `mask_dir` and returning one record per object per covered
    /// frame. `label_map` resolves object ids to label names.
    fn render_masks(
        &mut self,
        mask_dir: &Path,
        label_map: &BTreeMap<u32, String>,
    ) -> Result<Vec<FrameRecord>, SegmentError>;
}
