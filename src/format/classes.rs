//! Per-directory class-name registry backing the YOLO format.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::format::error::FormatError;

/// Name of the class registry file inside a save directory.
pub const CLASS_FILE: &str = "classes.txt";

/// Append-only mapping from class name to integer id, scoped to one save
/// directory and persisted as `classes.txt` (one name per line, line order
/// defines the id).
///
/// Ids are assigned in first-seen order by a monotonic counter and are never
/// renumbered or reused, even if a class later disappears from every
/// annotation in the directory; other files already written there may still
/// reference the old ids.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    names: Vec<String>,
    index: HashMap<String, u32>,
    next_id: u32,
    dirty: bool,
}

impl ClassTable {
    /// Load the registry of `dir`, or an empty one if `classes.txt` does
    /// not exist there.
    pub fn load(dir: &Path) -> Result<Self, FormatError> {
        let path = dir.join(CLASS_FILE);
        let mut table = Self::default();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            for line in content.lines() {
                let name = line.trim();
                if !name.is_empty() {
                    table.insert(name);
                }
            }
            table.dirty = false;
        }
        Ok(table)
    }

    fn insert(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.dirty = true;
        id
    }

    /// Resolve a class name to its id, registering it if unseen.
    ///
    /// Names are trimmed first; an empty name yields `None` and is never
    /// registered.
    pub fn resolve_or_insert(&mut self, name: &str) -> Option<u32> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(self.insert(name))
    }

    /// Look up the id of an already-registered name.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.index.get(name.trim()).copied()
    }

    /// Look up a name by id.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Persist the registry into `dir` if it gained names since loading
    /// (or if the file is missing entirely).
    pub fn save(&mut self, dir: &Path) -> Result<(), FormatError> {
        let path = dir.join(CLASS_FILE);
        if !self.dirty && path.exists() {
            return Ok(());
        }
        fs::create_dir_all(dir)?;
        let mut content = self.names.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&path, content)?;
        self.dirty = false;
        log::debug!("wrote {} class name(s) to {:?}", self.names.len(), path);
        Ok(())
    }
}
