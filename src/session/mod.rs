//! Per-image annotation session.
//!
//! Replaces callback-soup event wiring with an explicit state machine: the
//! interaction surface feeds [`SessionEvent`]s in, the session drives the
//! segmentation backend and the sidecar store, and every transition is
//! handled to completion before the next event is accepted.

mod event;
mod images;

pub use event::SessionEvent;
pub use images::{ImageList, NavOutcome};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::{FormatError, SidecarFormat, SidecarStore};
use crate::model::{AnnotationSet, BoundingBox, ImageSize, Label};
use crate::segment::{ImageSegmenter, Polarity, PromptPoint, SegmentError};

/// Errors surfaced to the user by the session.
///
/// None of these mutate session state; the interaction surface re-prompts
/// and the user tries again.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no annotation is pending confirmation")]
    NothingPending,

    #[error("label text must not be empty")]
    EmptyLabel,

    #[error("no save directory configured")]
    NoSaveLocation,

    #[error("no image loaded")]
    NoImage,

    #[error("cannot read image {path:?}")]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// Where the session is between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No pending geometry.
    Idle,
    /// Accumulating point prompts; the candidate refines with each click.
    PointPrompting { candidate: BoundingBox },
    /// A box drag is in progress.
    BoxPainting { anchor: (i32, i32), corner: (i32, i32) },
    /// A finished drag waits for confirm or cancel.
    AwaitingConfirmation { candidate: BoundingBox },
}

impl SessionState {
    /// The candidate box a confirm would commit, if any.
    fn candidate(&self) -> Option<BoundingBox> {
        match self {
            SessionState::PointPrompting { candidate }
            | SessionState::AwaitingConfirmation { candidate } => Some(*candidate),
            _ => None,
        }
    }
}

/// The active image of a session.
#[derive(Debug, Clone)]
struct ActiveImage {
    path: PathBuf,
    stem: String,
    size: ImageSize,
}

/// The per-image annotation state machine.
pub struct AnnotationSession {
    state: SessionState,
    format: SidecarFormat,
    store: Option<SidecarStore>,
    image: Option<ActiveImage>,
    labels: Vec<Label>,
}

impl AnnotationSession {
    pub fn new(format: SidecarFormat) -> Self {
        Self {
            state: SessionState::Idle,
            format,
            store: None,
            image: None,
            labels: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn format(&self) -> SidecarFormat {
        self.format
    }

    /// The persisted labels of the active image, in creation order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// The candidate box currently shown for preview, if any.
    pub fn candidate(&self) -> Option<BoundingBox> {
        self.state.candidate()
    }

    pub fn save_dir(&self) -> Option<&Path> {
        self.store.as_ref().map(SidecarStore::save_dir)
    }

    /// Switch the save directory. Discards pending geometry and reloads
    /// the active image's annotations from the new location.
    pub fn set_save_dir(
        &mut self,
        dir: impl Into<PathBuf>,
        segmenter: &mut dyn ImageSegmenter,
    ) -> Result<(), SessionError> {
        self.store = Some(SidecarStore::new(dir));
        self.discard_pending(segmenter);
        self.reload();
        Ok(())
    }

    /// Switch the active persistence format and reload through the
    /// fallback path (primary format first, then the other).
    pub fn set_format(&mut self, format: SidecarFormat) {
        if self.format == format {
            return;
        }
        self.format = format;
        self.reload();
    }

    /// Make `path` the active image.
    ///
    /// Decodes the image to validate it and capture its dimensions, hands
    /// the buffer to the segmentation backend, discards any pending
    /// geometry, and loads existing annotations for the new stem. An
    /// unreadable image leaves the session untouched.
    pub fn load_image(
        &mut self,
        path: &Path,
        segmenter: &mut dyn ImageSegmenter,
    ) -> Result<(), SessionError> {
        let decoded = image::open(path).map_err(|source| SessionError::ImageUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let size = ImageSize::new(
            decoded.width(),
            decoded.height(),
            u32::from(decoded.color().channel_count()),
        );

        segmenter.set_image(&decoded)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("loaded image '{}' ({}x{})", stem, size.width, size.height);

        self.image = Some(ActiveImage {
            path: path.to_path_buf(),
            stem,
            size,
        });
        self.state = SessionState::Idle;
        self.labels.clear();
        self.reload();
        Ok(())
    }

    /// Feed one interaction event through the state machine.
    pub fn handle_event(
        &mut self,
        event: SessionEvent,
        segmenter: &mut dyn ImageSegmenter,
    ) -> Result<(), SessionError> {
        match event {
            SessionEvent::PointClick { x, y, polarity } => self.on_point(x, y, polarity, segmenter),
            SessionEvent::BoxDragStart { x, y } => self.on_drag_start(x, y),
            SessionEvent::BoxDragMove { x, y } => {
                self.on_drag_move(x, y);
                Ok(())
            }
            SessionEvent::BoxDragEnd { x, y } => {
                self.on_drag_end(x, y);
                Ok(())
            }
            SessionEvent::Confirm(text) => self.on_confirm(&text, segmenter),
            SessionEvent::Cancel => {
                self.on_cancel(segmenter);
                Ok(())
            }
            SessionEvent::DeleteSelected(indices) => self.on_delete_selected(&indices),
            SessionEvent::DeleteAll => self.on_delete_all(segmenter),
        }
    }

    fn on_point(
        &mut self,
        x: i32,
        y: i32,
        polarity: Polarity,
        segmenter: &mut dyn ImageSegmenter,
    ) -> Result<(), SessionError> {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        let candidate = segmenter.add_point(PromptPoint::new(x, y, polarity))?;
        self.state = SessionState::PointPrompting { candidate };
        Ok(())
    }

    fn on_drag_start(&mut self, x: i32, y: i32) -> Result<(), SessionError> {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        self.state = SessionState::BoxPainting {
            anchor: (x, y),
            corner: (x, y),
        };
        Ok(())
    }

    fn on_drag_move(&mut self, x: i32, y: i32) {
        if let SessionState::BoxPainting { anchor, .. } = self.state {
            self.state = SessionState::BoxPainting {
                anchor,
                corner: (x, y),
            };
        }
    }

    fn on_drag_end(&mut self, x: i32, y: i32) {
        if let SessionState::BoxPainting { anchor, .. } = self.state {
            let candidate = BoundingBox::from_corners(anchor.0, anchor.1, x, y);
            self.state = SessionState::AwaitingConfirmation { candidate };
        }
    }

    fn on_confirm(
        &mut self,
        text: &str,
        segmenter: &mut dyn ImageSegmenter,
    ) -> Result<(), SessionError> {
        let candidate = self.state.candidate().ok_or(SessionError::NothingPending)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyLabel);
        }
        if self.store.is_none() {
            return Err(SessionError::NoSaveLocation);
        }

        self.labels.push(Label::new(text, candidate));
        self.state = SessionState::Idle;
        segmenter.reset_prompts();

        // On failure the label stays in memory; the user can fix the
        // directory and trigger another save.
        self.persist_labels()
    }

    fn on_cancel(&mut self, segmenter: &mut dyn ImageSegmenter) {
        if self.state != SessionState::Idle {
            segmenter.reset_prompts();
            self.state = SessionState::Idle;
        }
    }

    fn on_delete_selected(&mut self, indices: &[usize]) -> Result<(), SessionError> {
        if self.labels.is_empty() {
            return Ok(());
        }

        let mut rows: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.labels.len())
            .collect();
        rows.sort_unstable();
        rows.dedup();

        for &row in rows.iter().rev() {
            let removed = self.labels.remove(row);
            log::debug!("deleted label '{}' at row {}", removed.name, row);
        }

        self.persist_labels()
    }

    fn on_delete_all(&mut self, segmenter: &mut dyn ImageSegmenter) -> Result<(), SessionError> {
        self.labels.clear();
        self.discard_pending(segmenter);

        if let (Some(store), Some(image)) = (&self.store, &self.image) {
            store.remove(&image.stem)?;
        }
        Ok(())
    }

    /// Re-persist the in-memory labels after an edit; an empty list makes
    /// the store delete both sidecars.
    fn persist_labels(&self) -> Result<(), SessionError> {
        let (Some(store), Some(image)) = (&self.store, &self.image) else {
            return Ok(());
        };
        let set = AnnotationSet {
            image_path: image.path.clone(),
            size: image.size,
            labels: self.labels.clone(),
        };
        store.save(&image.stem, &set, self.format)?;
        Ok(())
    }

    fn discard_pending(&mut self, segmenter: &mut dyn ImageSegmenter) {
        if self.state != SessionState::Idle {
            segmenter.reset_prompts();
            self.state = SessionState::Idle;
        }
    }

    fn reload(&mut self) {
        let (Some(store), Some(image)) = (&self.store, &self.image) else {
            return;
        };
        let set = store.load(&image.stem, image.size, self.format);
        self.labels = set.labels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SidecarFormat;
    use tempfile::TempDir;

    /// Segmenter double that grows the candidate box with every point.
    #[derive(Default)]
    struct MockSegmenter {
        points: Vec<PromptPoint>,
        images_set: usize,
        resets: usize,
    }

    impl ImageSegmenter for MockSegmenter {
        fn set_image(&mut self, _image: &image::DynamicImage) -> Result<(), SegmentError> {
            self.images_set += 1;
            self.points.clear();
            Ok(())
        }

        fn add_point(&mut self, point: PromptPoint) -> Result<BoundingBox, SegmentError> {
            self.points.push(point);
            let n = self.points.len() as i32;
            Ok(BoundingBox::from_corners(
                point.x - 5 * n,
                point.y - 5 * n,
                point.x + 5 * n,
                point.y + 5 * n,
            ))
        }

        fn reset_prompts(&mut self) {
            self.resets += 1;
            self.points.clear();
        }
    }

    fn write_test_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(64, 48).save(&path).expect("write png");
        path
    }

    fn ready_session(dir: &TempDir, seg: &mut MockSegmenter) -> AnnotationSession {
        let img = write_test_image(dir.path(), "frame.png");
        let mut session = AnnotationSession::new(SidecarFormat::Xml);
        session.set_save_dir(dir.path(), seg).expect("save dir");
        session.load_image(&img, seg).expect("load image");
        session
    }

    fn confirm_one(
        session: &mut AnnotationSession,
        seg: &mut MockSegmenter,
        x: i32,
        y: i32,
        name: &str,
    ) {
        session
            .handle_event(
                SessionEvent::PointClick {
                    x,
                    y,
                    polarity: Polarity::Foreground,
                },
                seg,
            )
            .expect("click");
        session
            .handle_event(SessionEvent::Confirm(name.into()), seg)
            .expect("confirm");
    }

    #[test]
    fn point_clicks_refine_one_candidate() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        session
            .handle_event(
                SessionEvent::PointClick {
                    x: 20,
                    y: 20,
                    polarity: Polarity::Foreground,
                },
                &mut seg,
            )
            .expect("first click");
        let first = session.candidate().expect("candidate");

        session
            .handle_event(
                SessionEvent::PointClick {
                    x: 20,
                    y: 20,
                    polarity: Polarity::Background,
                },
                &mut seg,
            )
            .expect("second click");
        let second = session.candidate().expect("candidate");

        assert!(matches!(
            session.state(),
            SessionState::PointPrompting { .. }
        ));
        assert_ne!(first, second);
        assert_eq!(seg.points.len(), 2);
    }

    #[test]
    fn confirm_persists_and_returns_to_idle() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        confirm_one(&mut session, &mut seg, 20, 20, "cat");

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.labels().len(), 1);
        assert_eq!(seg.resets, 1);
        assert!(dir.path().join("frame.xml").exists());
        assert!(!dir.path().join("frame.txt").exists());
    }

    #[test]
    fn confirm_without_candidate_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        let err = session
            .handle_event(SessionEvent::Confirm("cat".into()), &mut seg)
            .expect_err("nothing pending");
        assert!(matches!(err, SessionError::NothingPending));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn confirm_with_empty_text_keeps_the_candidate() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        session
            .handle_event(
                SessionEvent::PointClick {
                    x: 20,
                    y: 20,
                    polarity: Polarity::Foreground,
                },
                &mut seg,
            )
            .expect("click");

        let err = session
            .handle_event(SessionEvent::Confirm("   ".into()), &mut seg)
            .expect_err("empty label");
        assert!(matches!(err, SessionError::EmptyLabel));
        // State unchanged: the user just types a name and confirms again.
        assert!(session.candidate().is_some());
        assert!(session.labels().is_empty());
    }

    #[test]
    fn confirm_without_save_dir_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let img = write_test_image(dir.path(), "frame.png");
        let mut seg = MockSegmenter::default();
        let mut session = AnnotationSession::new(SidecarFormat::Xml);
        session.load_image(&img, &mut seg).expect("load image");

        session
            .handle_event(
                SessionEvent::PointClick {
                    x: 20,
                    y: 20,
                    polarity: Polarity::Foreground,
                },
                &mut seg,
            )
            .expect("click");
        let err = session
            .handle_event(SessionEvent::Confirm("cat".into()), &mut seg)
            .expect_err("no save dir");
        assert!(matches!(err, SessionError::NoSaveLocation));
        assert!(session.candidate().is_some());
    }

    #[test]
    fn box_drag_produces_a_normalized_candidate() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        session
            .handle_event(SessionEvent::BoxDragStart { x: 40, y: 30 }, &mut seg)
            .expect("start");
        session
            .handle_event(SessionEvent::BoxDragMove { x: 25, y: 25 }, &mut seg)
            .expect("move");
        session
            .handle_event(SessionEvent::BoxDragEnd { x: 10, y: 12 }, &mut seg)
            .expect("end");

        // Dragged up-left, so the corners must be reordered.
        assert_eq!(
            session.candidate(),
            Some(BoundingBox {
                xmin: 10,
                ymin: 12,
                xmax: 40,
                ymax: 30
            })
        );
        assert!(matches!(
            session.state(),
            SessionState::AwaitingConfirmation { .. }
        ));
    }

    #[test]
    fn cancel_discards_the_candidate() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        session
            .handle_event(
                SessionEvent::PointClick {
                    x: 20,
                    y: 20,
                    polarity: Polarity::Foreground,
                },
                &mut seg,
            )
            .expect("click");
        session
            .handle_event(SessionEvent::Cancel, &mut seg)
            .expect("cancel");

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.labels().is_empty());
        assert_eq!(seg.resets, 1);
        assert!(!dir.path().join("frame.xml").exists());
    }

    #[test]
    fn delete_with_selection_removes_exactly_those_rows() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        confirm_one(&mut session, &mut seg, 10, 10, "first");
        confirm_one(&mut session, &mut seg, 20, 20, "second");
        confirm_one(&mut session, &mut seg, 30, 30, "third");
        assert_eq!(session.labels().len(), 3);

        session
            .handle_event(SessionEvent::delete(vec![1]), &mut seg)
            .expect("delete row 1");

        let names: Vec<&str> = session.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["first", "third"]);
        assert!(dir.path().join("frame.xml").exists());
    }

    #[test]
    fn delete_without_selection_clears_everything() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);

        confirm_one(&mut session, &mut seg, 10, 10, "first");
        confirm_one(&mut session, &mut seg, 20, 20, "second");
        confirm_one(&mut session, &mut seg, 30, 30, "third");

        session
            .handle_event(SessionEvent::delete(vec![]), &mut seg)
            .expect("clear all");

        assert!(session.labels().is_empty());
        assert!(!dir.path().join("frame.xml").exists());
        assert!(!dir.path().join("frame.txt").exists());
    }

    #[test]
    fn switching_images_discards_pending_geometry() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);
        let second = write_test_image(dir.path(), "other.png");

        session
            .handle_event(
                SessionEvent::PointClick {
                    x: 20,
                    y: 20,
                    polarity: Polarity::Foreground,
                },
                &mut seg,
            )
            .expect("click");
        session.load_image(&second, &mut seg).expect("switch");

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.candidate().is_none());
        assert_eq!(seg.images_set, 2);
    }

    #[test]
    fn unreadable_image_mutates_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);
        confirm_one(&mut session, &mut seg, 10, 10, "cat");

        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not an image").expect("write junk");

        let err = session
            .load_image(&bogus, &mut seg)
            .expect_err("must fail to decode");
        assert!(matches!(err, SessionError::ImageUnreadable { .. }));
        // Still on the old image with its label intact.
        assert_eq!(session.labels().len(), 1);
    }

    #[test]
    fn reload_after_format_switch_falls_back_to_other_sidecar() {
        let dir = TempDir::new().expect("temp dir");
        let mut seg = MockSegmenter::default();
        let mut session = ready_session(&dir, &mut seg);
        confirm_one(&mut session, &mut seg, 20, 20, "cat");
        assert!(dir.path().join("frame.xml").exists());

        // The XML sidecar stays authoritative until the next save.
        session.set_format(SidecarFormat::Yolo);
        assert_eq!(session.labels().len(), 1);
        assert_eq!(session.labels()[0].name, "cat");
    }
}
