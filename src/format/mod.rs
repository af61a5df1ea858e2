//! Sidecar annotation formats.
//!
//! Two interchangeable per-image formats share the [`crate::model`] types:
//!
//! - **XML** ([`VocCodec`]): Pascal-VOC-style `<stem>.xml`, full fidelity for
//!   every [`crate::model::Label`] field.
//! - **YOLO** ([`YoloCodec`]): `<stem>.txt` with normalized center/size
//!   coordinates plus a directory-scoped `classes.txt` registry
//!   ([`ClassTable`]).
//!
//! [`SidecarStore`] enforces the mutual-exclusion rule (writing one format
//! deletes the other; an empty set deletes both) and performs the fallback
//! load used when the active format has no data for an image.

mod classes;
mod error;
mod store;
mod traits;
mod voc;
mod yolo;

#[cfg(test)]
mod tests;

pub use classes::{CLASS_FILE, ClassTable};
pub use error::FormatError;
pub use store::{IMAGE_EXTENSIONS, SidecarFormat, SidecarStore, find_image_for_stem};
pub use traits::SidecarCodec;
pub use voc::VocCodec;
pub use yolo::YoloCodec;
