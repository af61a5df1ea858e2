//! Interaction events consumed by the annotation session.

use crate::segment::Polarity;

/// A discrete event from the interaction surface.
///
/// The surface owns no annotation state; everything it can do to the
/// current image arrives here as one of these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A prompt click on the image (left = foreground, right = background).
    PointClick { x: i32, y: i32, polarity: Polarity },
    /// A box drag began; the anchor corner is fixed here.
    BoxDragStart { x: i32, y: i32 },
    /// The floating corner of an in-progress drag moved.
    BoxDragMove { x: i32, y: i32 },
    /// The drag ended; the two corners are normalized into the candidate.
    BoxDragEnd { x: i32, y: i32 },
    /// Commit the pending candidate under the given label text.
    Confirm(String),
    /// Discard the pending candidate.
    Cancel,
    /// Remove exactly the labels at these indices.
    DeleteSelected(Vec<usize>),
    /// Remove every label and both sidecar files.
    DeleteAll,
}

impl SessionEvent {
    /// Map a raw delete request onto the right variant.
    ///
    /// An explicit selection always wins; only a delete with nothing
    /// selected means "clear all annotations for this image". Callers must
    /// funnel the delete key through here so that precedence cannot drift.
    pub fn delete(selection: Vec<usize>) -> Self {
        if selection.is_empty() {
            SessionEvent::DeleteAll
        } else {
            SessionEvent::DeleteSelected(selection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_precedence_prefers_selection() {
        assert_eq!(
            SessionEvent::delete(vec![2]),
            SessionEvent::DeleteSelected(vec![2])
        );
        assert_eq!(SessionEvent::delete(vec![]), SessionEvent::DeleteAll);
    }
}
