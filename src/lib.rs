//! quicklabel - segmentation-assisted image and video annotation core.
//!
//! A human places point or box prompts on an image, an external segmentation
//! capability turns the prompts into a mask and a tight bounding box, and the
//! resulting labels are persisted beside the image in one of two
//! interchangeable sidecar formats (Pascal-VOC-style XML or YOLO text).
//!
//! The crate is split along the same lines as the workflow:
//!
//! - [`model`]: bounding boxes, labels, and per-image annotation sets
//! - [`format`]: the two sidecar codecs, the `classes.txt` registry, and the
//!   mutual-exclusion store that keeps exactly one sidecar authoritative
//! - [`session`]: the per-image annotation state machine driven by
//!   interaction events
//! - [`video`]: multi-object prompt collection and the background batch job
//!   that reconciles segmentation output into per-frame annotation files
//! - [`segment`]: the trait seam to the external segmentation capability
//! - [`config`]: persisted user configuration
//!
//! Window layout, rendering, and device handling are deliberately outside
//! this crate; they talk to it through [`session::SessionEvent`] and the
//! [`segment`] traits.

pub mod config;
pub mod format;
pub mod model;
pub mod segment;
pub mod session;
pub mod video;

pub use config::AppConfig;
pub use format::{ClassTable, FormatError, SidecarFormat, SidecarStore};
pub use model::{AnnotationSet, BoundingBox, ImageSize, Label};
pub use segment::{FrameRecord, ImageSegmenter, Polarity, PromptPoint, VideoSegmenter};
pub use session::{AnnotationSession, SessionError, SessionEvent, SessionState};
pub use video::{CompletedJob, JobResult, ObjectPromptQueue, VideoAnnotationJob, VideoBatchScheduler};
