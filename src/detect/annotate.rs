//! Detection overlay drawing.
//!
//! Fire boxes are red, person boxes green, matching the recording palette.
//! The box is drawn 2 px thick with a filled color tag above the top-left
//! corner standing in for a text label (text drawing would require bundling
//! a font; the color already encodes the detection kind).

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::detect::result::{Detection, DetectionKind};

const FIRE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const PERSON_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TAG_WIDTH: u32 = 12;
const TAG_HEIGHT: u32 = 4;

pub fn kind_color(kind: DetectionKind) -> Rgb<u8> {
    match kind {
        DetectionKind::Fire => FIRE_COLOR,
        DetectionKind::Person => PERSON_COLOR,
    }
}

/// Draw one detection onto the annotated frame.
pub fn draw_detection(canvas: &mut RgbImage, detection: &Detection) {
    let color = kind_color(detection.kind);
    let bbox = detection.bbox;

    let outer = Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width.max(1), bbox.height.max(1));
    draw_hollow_rect_mut(canvas, outer, color);
    if bbox.width > 4 && bbox.height > 4 {
        let inner = Rect::at(bbox.x as i32 + 1, bbox.y as i32 + 1)
            .of_size(bbox.width - 2, bbox.height - 2);
        draw_hollow_rect_mut(canvas, inner, color);
    }

    // Label tag above the box, clamped to the space right of its corner.
    let tag_y = bbox.y.saturating_sub(TAG_HEIGHT + 1);
    let tag_w = TAG_WIDTH.min(canvas.width().saturating_sub(bbox.x)).max(1);
    let tag = Rect::at(bbox.x as i32, tag_y as i32).of_size(tag_w, TAG_HEIGHT);
    draw_filled_rect_mut(canvas, tag, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    fn detection(kind: DetectionKind) -> Detection {
        Detection {
            kind,
            bbox: BoundingBox {
                x: 10,
                y: 10,
                width: 8,
                height: 12,
            },
            area: 96,
            aspect_ratio: 1.5,
        }
    }

    #[test]
    fn fire_box_is_red_and_person_box_is_green() {
        let mut canvas = RgbImage::new(40, 40);
        draw_detection(&mut canvas, &detection(DetectionKind::Fire));
        assert_eq!(*canvas.get_pixel(10, 10), FIRE_COLOR);

        let mut canvas = RgbImage::new(40, 40);
        draw_detection(&mut canvas, &detection(DetectionKind::Person));
        assert_eq!(*canvas.get_pixel(10, 10), PERSON_COLOR);
    }

    #[test]
    fn box_is_two_pixels_thick() {
        let mut canvas = RgbImage::new(40, 40);
        draw_detection(&mut canvas, &detection(DetectionKind::Person));
        assert_eq!(*canvas.get_pixel(11, 11), PERSON_COLOR);
        // Interior stays untouched.
        assert_eq!(*canvas.get_pixel(14, 16), Rgb([0, 0, 0]));
    }

    #[test]
    fn tag_is_drawn_above_the_box() {
        let mut canvas = RgbImage::new(40, 40);
        draw_detection(&mut canvas, &detection(DetectionKind::Fire));
        assert_eq!(*canvas.get_pixel(10, 5), FIRE_COLOR);
    }

    #[test]
    fn tag_is_clamped_at_the_right_edge() {
        let mut canvas = RgbImage::new(15, 40);
        let det = Detection {
            kind: DetectionKind::Fire,
            bbox: BoundingBox {
                x: 10,
                y: 10,
                width: 4,
                height: 6,
            },
            area: 24,
            aspect_ratio: 1.5,
        };
        draw_detection(&mut canvas, &det);
        // Tag rows span the clamped width only.
        assert_eq!(*canvas.get_pixel(10, 5), FIRE_COLOR);
        assert_eq!(*canvas.get_pixel(14, 5), FIRE_COLOR);
    }

    #[test]
    fn drawing_at_the_top_edge_does_not_panic() {
        let mut canvas = RgbImage::new(40, 40);
        let det = Detection {
            kind: DetectionKind::Fire,
            bbox: BoundingBox {
                x: 0,
                y: 0,
                width: 5,
                height: 5,
            },
            area: 25,
            aspect_ratio: 1.0,
        };
        draw_detection(&mut canvas, &det);
    }
}
