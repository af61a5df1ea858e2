//! Bounding box geometry in original-image pixel space.

/// An axis-aligned bounding box with `xmin <= xmax` and `ymin <= ymax`.
///
/// Coordinates are pixels in the source image, not the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    /// Create a box from two arbitrary corner points, reordering min/max
    /// per axis.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            xmin: x1.min(x2),
            ymin: y1.min(y2),
            xmax: x1.max(x2),
            ymax: y1.max(y2),
        }
    }

    /// Reconstruct a box from stored coordinates, applying the legacy
    /// width/height heuristic.
    ///
    /// One historical writer stored width/height where `xmax`/`ymax` belong.
    /// Such boxes are recognizable because the stored second value is not
    /// greater than the first: when `xmax <= xmin` and `xmax > 0` the value
    /// is reinterpreted as a width and added to `xmin` (same rule on the y
    /// axis). Every load from either sidecar format goes through this.
    pub fn from_legacy(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        let xmax = if xmax <= xmin && xmax > 0 {
            xmin + xmax
        } else {
            xmax
        };
        let ymax = if ymax <= ymin && ymax > 0 {
            ymin + ymax
        } else {
            ymax
        };
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Box width in pixels.
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    /// Box height in pixels.
    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_reorders_per_axis() {
        let bb = BoundingBox::from_corners(50, 10, 20, 40);
        assert_eq!(bb.xmin, 20);
        assert_eq!(bb.ymin, 10);
        assert_eq!(bb.xmax, 50);
        assert_eq!(bb.ymax, 40);
    }

    #[test]
    fn legacy_width_height_is_reinterpreted() {
        // xmax=5 <= xmin=10 and positive, so it is a width; same for ymax=8.
        let bb = BoundingBox::from_legacy(10, 10, 5, 8);
        assert_eq!(bb.xmax, 15);
        assert_eq!(bb.ymax, 18);
    }

    #[test]
    fn legacy_heuristic_leaves_valid_boxes_alone() {
        let bb = BoundingBox::from_legacy(10, 20, 30, 40);
        assert_eq!(
            bb,
            BoundingBox {
                xmin: 10,
                ymin: 20,
                xmax: 30,
                ymax: 40
            }
        );
    }

    #[test]
    fn legacy_heuristic_ignores_non_positive_second_value() {
        let bb = BoundingBox::from_legacy(10, 10, 0, -3);
        assert_eq!(bb.xmax, 0);
        assert_eq!(bb.ymax, -3);
    }
}
