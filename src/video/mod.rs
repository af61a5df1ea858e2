//! Batch video annotation.
//!
//! Interactive sessions annotate one image at a time; this module covers
//! the batch path instead. Objects are staged in an [`ObjectPromptQueue`],
//! a [`VideoAnnotationJob`] propagates them through every extracted frame
//! on a worker thread owned by the [`VideoBatchScheduler`], and
//! [`reconcile`] turns the resulting frame records into ordinary sidecar
//! files that the interactive session can open and edit.

mod job;
mod queue;
mod worker;

pub use job::{DEFAULT_FRAME_RATE, JobResult, MASK_SUBDIR, VideoAnnotationJob, VideoJobError, reconcile};
pub use queue::{ObjectPromptQueue, QueuedObject};
pub use worker::{CompletedJob, VideoBatchScheduler};
