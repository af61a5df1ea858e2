//! Background execution of video annotation jobs.
//!
//! At most one job runs at a time. The scheduler owns the prompt queue,
//! snapshots it when a job starts, and hands the snapshot to a named
//! worker thread. The session thread polls for the [`JobResult`] instead
//! of blocking, so interactive use stays responsive.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread::JoinHandle;

use crate::format::SidecarFormat;
use crate::segment::{PromptPoint, VideoSegmenter};
use crate::video::job::{JobResult, VideoAnnotationJob, VideoJobError, reconcile};
use crate::video::queue::{ObjectPromptQueue, QueuedObject};

/// A finished job together with the snapshot it ran under.
///
/// Reconciliation must use the submission-time parameters, not whatever
/// the session has been changed to since, so the two travel together.
pub struct CompletedJob {
    pub job: VideoAnnotationJob,
    pub result: JobResult,
}

impl CompletedJob {
    /// Persist the job's records against its own snapshot.
    pub fn reconcile(&self) -> Result<usize, VideoJobError> {
        reconcile(&self.job, &self.result)
    }
}

struct JobWorker {
    job: VideoAnnotationJob,
    result_rx: Receiver<JobResult>,
    handle: Option<JoinHandle<()>>,
}

/// Owns the prompt queue and the single in-flight job.
#[derive(Default)]
pub struct VideoBatchScheduler {
    queue: ObjectPromptQueue,
    worker: Option<JobWorker>,
}

impl VideoBatchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> &ObjectPromptQueue {
        &self.queue
    }

    pub fn add_pending_point(&mut self, point: PromptPoint) {
        self.queue.add_pending_point(point);
    }

    pub fn cancel_pending(&mut self) {
        self.queue.cancel_pending();
    }

    pub fn confirm_object(&mut self, label: &str) -> Result<u32, VideoJobError> {
        self.queue.confirm_object(label)
    }

    pub fn remove_object(&mut self, id: u32) -> Option<QueuedObject> {
        self.queue.remove_object(id)
    }

    pub fn is_job_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Snapshot the queue and launch the job on a worker thread.
    ///
    /// Rejected up front, before any frame extraction, when a job is
    /// already in flight or no objects have been confirmed.
    pub fn start_job<S>(
        &mut self,
        video_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        save_dir: impl Into<PathBuf>,
        format: SidecarFormat,
        frame_rate: u32,
        mut segmenter: S,
    ) -> Result<(), VideoJobError>
    where
        S: VideoSegmenter + Send + 'static,
    {
        if self.worker.is_some() {
            return Err(VideoJobError::JobInFlight);
        }
        if self.queue.is_empty() {
            return Err(VideoJobError::EmptyQueue);
        }

        let job = VideoAnnotationJob {
            video_path: video_path.into(),
            output_dir: output_dir.into(),
            objects: self.queue.take_objects(),
            save_dir: save_dir.into(),
            format,
            frame_rate,
        };
        log::info!(
            "starting video job for {:?} with {} objects",
            job.video_path,
            job.objects.len()
        );

        let snapshot = job.clone();
        let (result_tx, result_rx) = channel();
        let handle = std::thread::Builder::new()
            .name("video-annotation-job".to_string())
            .spawn(move || {
                let result = job.run(&mut segmenter);
                // The receiver may be gone if the scheduler was dropped.
                let _ = result_tx.send(result);
            })?;

        self.worker = Some(JobWorker {
            job: snapshot,
            result_rx,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Non-blocking check for a finished job.
    ///
    /// Returns `None` while the job is still running. A worker thread
    /// that died without reporting is surfaced as a failed result rather
    /// than a hang.
    pub fn poll_completion(&mut self) -> Option<CompletedJob> {
        let worker = self.worker.as_mut()?;
        let result = match worker.result_rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                JobResult::failed("job thread terminated unexpectedly")
            }
        };
        let job = self.finish_worker()?;
        Some(CompletedJob { job, result })
    }

    /// Block until the in-flight job reports, if any.
    pub fn wait(&mut self) -> Option<CompletedJob> {
        let worker = self.worker.as_mut()?;
        let result = match worker.result_rx.recv() {
            Ok(result) => result,
            Err(_) => JobResult::failed("job thread terminated unexpectedly"),
        };
        let job = self.finish_worker()?;
        Some(CompletedJob { job, result })
    }

    fn finish_worker(&mut self) -> Option<VideoAnnotationJob> {
        let mut worker = self.worker.take()?;
        if let Some(handle) = worker.handle.take() {
            let _ = handle.join();
        }
        Some(worker.job)
    }
}

impl Drop for VideoBatchScheduler {
    fn drop(&mut self) {
        self.finish_worker();
    }
}
