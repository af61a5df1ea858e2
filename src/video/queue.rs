//! Prompt queue for batch video annotation.
//!
//! Points are staged per object before a job runs: the user clicks prompts
//! for one object, confirms it with a label, and repeats. Object ids are
//! handed out monotonically so deleting an object never reassigns its id
//! to a later one.

use std::collections::BTreeMap;
use std::mem;

use crate::segment::PromptPoint;
use crate::video::job::VideoJobError;

/// One confirmed object: its prompt points and its label text.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedObject {
    pub points: Vec<PromptPoint>,
    pub label: String,
}

/// Staging area for objects to be propagated through a video.
#[derive(Debug)]
pub struct ObjectPromptQueue {
    objects: BTreeMap<u32, QueuedObject>,
    pending: Vec<PromptPoint>,
    next_object_id: u32,
}

impl ObjectPromptQueue {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            pending: Vec::new(),
            next_object_id: 1,
        }
    }

    /// Stage a prompt point for the object currently being defined.
    pub fn add_pending_point(&mut self, point: PromptPoint) {
        self.pending.push(point);
    }

    /// The staged points not yet confirmed into an object.
    pub fn pending(&self) -> &[PromptPoint] {
        &self.pending
    }

    /// Drop the staged points. Does not consume an object id.
    pub fn cancel_pending(&mut self) {
        self.pending.clear();
    }

    /// Turn the staged points into a confirmed object and return its id.
    pub fn confirm_object(&mut self, label: &str) -> Result<u32, VideoJobError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(VideoJobError::EmptyLabel);
        }
        if self.pending.is_empty() {
            return Err(VideoJobError::NoPendingPoints);
        }

        let id = self.next_object_id;
        self.next_object_id += 1;
        self.objects.insert(
            id,
            QueuedObject {
                points: mem::take(&mut self.pending),
                label: label.to_string(),
            },
        );
        log::debug!("confirmed object {} ('{}')", id, label);
        Ok(id)
    }

    /// Remove a confirmed object. Its id is never reused.
    pub fn remove_object(&mut self, id: u32) -> Option<QueuedObject> {
        self.objects.remove(&id)
    }

    pub fn objects(&self) -> &BTreeMap<u32, QueuedObject> {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Snapshot the confirmed objects for a job and clear the queue.
    ///
    /// Staged-but-unconfirmed points are untouched: they belong to the
    /// next object, which may still be confirmed into the next batch.
    /// The id counter keeps running so later objects get fresh ids.
    pub fn take_objects(&mut self) -> BTreeMap<u32, QueuedObject> {
        mem::take(&mut self.objects)
    }
}

impl Default for ObjectPromptQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Polarity;

    fn point(x: i32, y: i32) -> PromptPoint {
        PromptPoint::new(x, y, Polarity::Foreground)
    }

    #[test]
    fn object_ids_are_monotonic_from_one() {
        let mut queue = ObjectPromptQueue::new();

        queue.add_pending_point(point(1, 1));
        assert_eq!(queue.confirm_object("cat").unwrap(), 1);
        queue.add_pending_point(point(2, 2));
        assert_eq!(queue.confirm_object("dog").unwrap(), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn cancel_does_not_consume_an_id() {
        let mut queue = ObjectPromptQueue::new();

        queue.add_pending_point(point(1, 1));
        queue.cancel_pending();
        assert!(queue.pending().is_empty());

        queue.add_pending_point(point(2, 2));
        assert_eq!(queue.confirm_object("cat").unwrap(), 1);
    }

    #[test]
    fn removed_ids_are_never_reused() {
        let mut queue = ObjectPromptQueue::new();

        queue.add_pending_point(point(1, 1));
        queue.confirm_object("cat").unwrap();
        queue.add_pending_point(point(2, 2));
        queue.confirm_object("dog").unwrap();

        assert!(queue.remove_object(1).is_some());
        queue.add_pending_point(point(3, 3));
        assert_eq!(queue.confirm_object("bird").unwrap(), 3);
        assert!(!queue.objects().contains_key(&1));
    }

    #[test]
    fn confirm_requires_points_and_a_label() {
        let mut queue = ObjectPromptQueue::new();

        assert!(matches!(
            queue.confirm_object("cat"),
            Err(VideoJobError::NoPendingPoints)
        ));

        queue.add_pending_point(point(1, 1));
        assert!(matches!(
            queue.confirm_object("  "),
            Err(VideoJobError::EmptyLabel)
        ));
        // Points survive the failed confirm.
        assert_eq!(queue.pending().len(), 1);
    }

    #[test]
    fn take_objects_clears_but_keeps_the_counter() {
        let mut queue = ObjectPromptQueue::new();

        queue.add_pending_point(point(1, 1));
        queue.confirm_object("cat").unwrap();
        let taken = queue.take_objects();
        assert_eq!(taken.len(), 1);
        assert!(queue.is_empty());

        queue.add_pending_point(point(2, 2));
        assert_eq!(queue.confirm_object("dog").unwrap(), 2);
    }

    #[test]
    fn take_objects_keeps_staged_points_for_the_next_object() {
        let mut queue = ObjectPromptQueue::new();

        queue.add_pending_point(point(1, 1));
        queue.confirm_object("cat").unwrap();
        // The user has already started clicking the next object when the
        // batch is launched; those points must survive the snapshot.
        queue.add_pending_point(point(5, 5));

        let taken = queue.take_objects();
        assert_eq!(taken.len(), 1);
        assert_eq!(queue.pending().len(), 1);
        assert_eq!(queue.confirm_object("dog").unwrap(), 2);
    }
}
