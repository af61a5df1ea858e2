//! YOLO text sidecar codec.
//!
//! One text line per label, `class_id cx cy w h` with coordinates normalized
//! to the image size, plus a directory-scoped `classes.txt` registry.

use std::fs;
use std::path::Path;

use crate::format::classes::ClassTable;
use crate::format::error::FormatError;
use crate::format::store::find_image_for_stem;
use crate::format::traits::SidecarCodec;
use crate::model::{AnnotationSet, BoundingBox, ImageSize, Label};

/// YOLO sidecar format.
///
/// Lossy by policy: labels whose box collapses to zero area after clamping
/// against the image bounds are dropped silently, and labels with an empty
/// trimmed name never make it into `classes.txt`.
pub struct YoloCodec;

impl SidecarCodec for YoloCodec {
    fn id(&self) -> &'static str {
        "yolo"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn write(&self, set: &AnnotationSet, path: &Path) -> Result<(), FormatError> {
        let (image_w, image_h) = (set.size.width, set.size.height);
        if image_w == 0 || image_h == 0 {
            log::warn!("skipping YOLO sidecar {:?}: image has no dimensions", path);
            return Ok(());
        }

        let dir = path.parent().unwrap_or(Path::new("."));
        let mut classes = ClassTable::load(dir)?;
        for label in &set.labels {
            classes.resolve_or_insert(&label.name);
        }
        // The registry must hit disk before any line referencing its ids.
        classes.save(dir)?;

        let mut lines = Vec::new();
        for label in &set.labels {
            let name = label.name.trim();
            if name.is_empty() {
                continue;
            }
            let Some(class_id) = classes.id_of(name) else {
                continue;
            };

            let (image_w, image_h) = (f64::from(image_w), f64::from(image_h));
            let xmin = f64::from(label.bndbox.xmin).clamp(0.0, image_w);
            let ymin = f64::from(label.bndbox.ymin).clamp(0.0, image_h);
            let xmax = f64::from(label.bndbox.xmax).clamp(0.0, image_w);
            let ymax = f64::from(label.bndbox.ymax).clamp(0.0, image_h);

            let width = xmax - xmin;
            let height = ymax - ymin;
            if width <= 0.0 || height <= 0.0 {
                log::debug!("dropping degenerate box for '{}' in {:?}", name, path);
                continue;
            }

            let cx = ((xmin + xmax) / 2.0 / image_w).clamp(0.0, 1.0);
            let cy = ((ymin + ymax) / 2.0 / image_h).clamp(0.0, 1.0);
            let nw = (width / image_w).clamp(0.0, 1.0);
            let nh = (height / image_h).clamp(0.0, 1.0);

            lines.push(format!(
                "{} {:.6} {:.6} {:.6} {:.6}",
                class_id, cx, cy, nw, nh
            ));
        }

        if lines.is_empty() {
            // Nothing survived; a stale sidecar must not linger.
            if path.exists() {
                fs::remove_file(path)?;
            }
            return Ok(());
        }

        log::debug!("writing YOLO sidecar {:?} ({} line(s))", path, lines.len());
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(path, content)?;
        Ok(())
    }

    fn read(&self, path: &Path, size: ImageSize) -> Result<AnnotationSet, FormatError> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let mut set =
            AnnotationSet::new(find_image_for_stem(dir, stem).unwrap_or_default(), size);

        if size.width == 0 || size.height == 0 {
            return Ok(set);
        }

        let classes = ClassTable::load(dir)?;
        let content = fs::read_to_string(path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_yolo_line(line, &classes, size.width, size.height) {
                Some(label) => set.labels.push(label),
                None => log::debug!("skipping malformed YOLO line in {:?}: {}", path, line),
            }
        }

        Ok(set)
    }
}

/// Parse a single YOLO annotation line into a pixel-space label.
///
/// Returns `None` for malformed lines (wrong token count or non-numeric
/// fields); the caller skips those without failing the whole file.
fn parse_yolo_line(
    line: &str,
    classes: &ClassTable,
    image_w: u32,
    image_h: u32,
) -> Option<Label> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return None;
    }

    let class_id: u32 = parts[0].parse().ok()?;
    let cx: f64 = parts[1].parse().ok()?;
    let cy: f64 = parts[2].parse().ok()?;
    let nw: f64 = parts[3].parse().ok()?;
    let nh: f64 = parts[4].parse().ok()?;

    let (image_w, image_h) = (i32::try_from(image_w).ok()?, i32::try_from(image_h).ok()?);
    let cx = cx * f64::from(image_w);
    let cy = cy * f64::from(image_h);
    let box_w = nw * f64::from(image_w);
    let box_h = nh * f64::from(image_h);

    let xmin = ((cx - box_w / 2.0).round() as i32).max(0);
    let ymin = ((cy - box_h / 2.0).round() as i32).max(0);
    let mut xmax = ((cx + box_w / 2.0).round() as i32).min(image_w);
    let mut ymax = ((cy + box_h / 2.0).round() as i32).min(image_h);

    // Rounding can collapse thin boxes; rebuild the far edge from the size.
    if xmax <= xmin {
        xmax = (xmin + (box_w.round() as i32).max(1)).min(image_w);
    }
    if ymax <= ymin {
        ymax = (ymin + (box_h.round() as i32).max(1)).min(image_h);
    }

    let name = classes
        .name_of(class_id)
        .map(str::to_owned)
        .unwrap_or_else(|| class_id.to_string());

    // The recovery above already guarantees ordered corners; the legacy
    // width/height heuristic must not run here, or a box hugging the
    // right or bottom edge would be pushed outside the image.
    Some(Label::new(
        name,
        BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        },
    ))
}
