//! Classification results.

use std::fmt;

/// What a blob was classified as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionKind {
    Person,
    Fire,
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionKind::Person => write!(f, "person"),
            DetectionKind::Fire => write!(f, "fire"),
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// height / (width + eps); the epsilon guards degenerate zero-width boxes.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / (self.width as f64 + 1e-6)
    }
}

/// One detection in one processed frame. Transient: detections carry no
/// identity and are not tracked across frames.
#[derive(Clone, Debug)]
pub struct Detection {
    pub kind: DetectionKind,
    pub bbox: BoundingBox,
    /// Component area in px² (pixel count).
    pub area: u32,
    pub aspect_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_is_height_over_width() {
        let bbox = BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 20,
        };
        assert!((bbox.aspect_ratio() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn zero_width_box_does_not_divide_by_zero() {
        let bbox = BoundingBox {
            x: 0,
            y: 0,
            width: 0,
            height: 5,
        };
        assert!(bbox.aspect_ratio().is_finite());
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(DetectionKind::Person.to_string(), "person");
        assert_eq!(DetectionKind::Fire.to_string(), "fire");
    }
}
