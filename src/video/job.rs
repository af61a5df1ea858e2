//! One batch video annotation job.
//!
//! A job owns a snapshot of the confirmed prompt queue and drives the
//! video backend through its full pipeline: frame extraction, inference,
//! per-object prompting in ascending id order, and mask rendering. The
//! results are reconciled into per-frame sidecars afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::{FormatError, SidecarFormat, SidecarStore, IMAGE_EXTENSIONS};
use crate::model::AnnotationSet;
use crate::segment::{FrameRecord, SegmentError, VideoSegmenter};
use crate::video::queue::QueuedObject;

/// Frames extracted per second of video when the user sets no override.
pub const DEFAULT_FRAME_RATE: u32 = 2;

/// Subdirectory of the output directory that receives rendered masks.
pub const MASK_SUBDIR: &str = "mask";

#[derive(Error, Debug)]
pub enum VideoJobError {
    #[error("no objects confirmed for the video")]
    EmptyQueue,

    #[error("label text must not be empty")]
    EmptyLabel,

    #[error("no prompt points staged for the object")]
    NoPendingPoints,

    #[error("a video job is already running")]
    JobInFlight,

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A job's parameters plus the object snapshot to propagate.
#[derive(Debug, Clone)]
pub struct VideoAnnotationJob {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub objects: BTreeMap<u32, QueuedObject>,
    pub save_dir: PathBuf,
    pub format: SidecarFormat,
    pub frame_rate: u32,
}

/// What a finished job hands back to the session thread.
#[derive(Debug)]
pub struct JobResult {
    pub records: Vec<FrameRecord>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            error: Some(message.into()),
        }
    }
}

impl VideoAnnotationJob {
    /// Object id to label text, for rendering.
    pub fn label_map(&self) -> BTreeMap<u32, String> {
        self.objects
            .iter()
            .map(|(&id, obj)| (id, obj.label.clone()))
            .collect()
    }

    /// Run the whole pipeline. Never panics the worker thread: a failure
    /// is logged and folded into the returned [`JobResult`].
    pub fn run<S: VideoSegmenter>(&self, segmenter: &mut S) -> JobResult {
        match self.run_inner(segmenter) {
            Ok(records) => JobResult {
                records,
                error: None,
            },
            Err(e) => {
                log::error!("video job for {:?} failed: {}", self.video_path, e);
                JobResult::failed(e.to_string())
            }
        }
    }

    fn run_inner<S: VideoSegmenter>(
        &self,
        segmenter: &mut S,
    ) -> Result<Vec<FrameRecord>, VideoJobError> {
        let mask_dir = self.output_dir.join(MASK_SUBDIR);
        fs::create_dir_all(&self.output_dir)?;
        fs::create_dir_all(&mask_dir)?;

        let frames = segmenter.extract_frames(&self.video_path, &self.output_dir, self.frame_rate)?;
        log::info!(
            "extracted {} frames from {:?} at {} fps",
            frames,
            self.video_path,
            self.frame_rate
        );

        segmenter.set_video(&self.output_dir)?;
        segmenter.run_inference(&self.output_dir)?;
        segmenter.reset_object_prompts();

        // BTreeMap iteration is ascending, so objects are applied in the
        // order their ids were confirmed.
        for (&id, object) in &self.objects {
            for &point in &object.points {
                segmenter.add_object_point(id, point)?;
            }
            segmenter.commit_object(id)?;
        }

        let records = segmenter.render_masks(&mask_dir, &self.label_map())?;
        Ok(records)
    }
}

/// Persist a finished job's records as per-frame sidecars.
///
/// The save directory, format, and frame directory all come from the
/// job snapshot taken at submission time, so a format or directory
/// change made while the job ran cannot redirect its output. Records
/// are grouped by frame stem; a group is saved only when the frame
/// image actually exists under the job's output directory, so stale
/// records from a partially failed run never produce orphan sidecars.
/// Returns how many frames were persisted.
pub fn reconcile(job: &VideoAnnotationJob, result: &JobResult) -> Result<usize, VideoJobError> {
    let mut by_stem: BTreeMap<&str, Vec<&FrameRecord>> = BTreeMap::new();
    for record in &result.records {
        by_stem.entry(&record.stem).or_default().push(record);
    }

    let store = SidecarStore::new(&job.save_dir);
    let mut persisted = 0;
    for (stem, records) in by_stem {
        let Some(image_path) = frame_image_for_stem(&job.output_dir, stem) else {
            log::debug!("no frame image for stem '{}', skipping", stem);
            continue;
        };
        let mut set = AnnotationSet::new(image_path, records[0].size);
        set.labels = records.iter().map(|r| r.label.clone()).collect();
        store.save(stem, &set, job.format)?;
        persisted += 1;
    }
    Ok(persisted)
}

fn frame_image_for_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
