//! Ordered image list for directory browsing.

use std::path::{Path, PathBuf};

use crate::format::IMAGE_EXTENSIONS;

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Moved to a new image.
    Moved,
    /// Already at the first image.
    AtFirst,
    /// Already at the last image.
    AtLast,
    /// The list is empty.
    Empty,
}

/// The sorted images of one directory plus a cursor.
#[derive(Debug, Clone, Default)]
pub struct ImageList {
    files: Vec<PathBuf>,
    index: usize,
}

impl ImageList {
    /// List the images directly inside `dir`, sorted by path.
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        let ext = ext.to_ascii_lowercase();
                        IMAGE_EXTENSIONS.contains(&ext.as_str())
                    })
            })
            .collect();
        files.sort();
        log::info!("found {} image(s) in {:?}", files.len(), dir);
        Ok(Self { files, index: 0 })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// The image under the cursor.
    pub fn current(&self) -> Option<&Path> {
        self.files.get(self.index).map(PathBuf::as_path)
    }

    /// Move the cursor to an absolute position.
    pub fn select(&mut self, index: usize) -> Option<&Path> {
        if index < self.files.len() {
            self.index = index;
            self.current()
        } else {
            None
        }
    }

    /// Advance to the next image.
    pub fn next(&mut self) -> NavOutcome {
        if self.files.is_empty() {
            return NavOutcome::Empty;
        }
        if self.index + 1 >= self.files.len() {
            return NavOutcome::AtLast;
        }
        self.index += 1;
        NavOutcome::Moved
    }

    /// Step back to the previous image.
    pub fn prev(&mut self) -> NavOutcome {
        if self.files.is_empty() {
            return NavOutcome::Empty;
        }
        if self.index == 0 {
            return NavOutcome::AtFirst;
        }
        self.index -= 1;
        NavOutcome::Moved
    }
}
