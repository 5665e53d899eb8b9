//! Frame classification pipeline.
//!
//! Turns one raw frame into an annotated copy plus an ordered list of
//! person/fire detections:
//!
//! 1. grayscale view -> heat palette -> heat channel (red plane)
//! 2. adaptive person threshold = percentile of the heat channel
//! 3. binary masks (`>=` threshold), one per detection kind
//! 4. morphological opening + dilation on each mask
//! 5. connected-region extraction, then the per-kind gates
//! 6. boxes drawn on a copy of the heat visualization
//!
//! The classifier is a pure function of (frame, config): it never mutates
//! its input, performs no I/O, and dispatches no alerts. Fire detections
//! precede person detections in the output; within each kind, order follows
//! raster discovery order of the underlying mask regions.

pub mod annotate;
pub mod blobs;
pub mod colormap;
pub mod percentile;
pub mod result;

use anyhow::Result;
use image::GrayImage;

use crate::frame::Frame;
use blobs::{extract_blobs, refine_mask, Blob, MASK_ON};
use colormap::{apply_heat_palette, heat_channel};
use percentile::percentile;
pub use result::{BoundingBox, Detection, DetectionKind};

/// Tunables for the classification pipeline.
#[derive(Clone, Copy, Debug)]
pub struct ClassifierConfig {
    /// Percentile of the heat channel used as the adaptive person threshold.
    pub person_percentile: f64,
    /// Absolute heat-channel threshold for fire. 255 selects only
    /// maximum-intensity pixels.
    pub fire_threshold: u8,
    /// Minimum blob area in px², both kinds.
    pub min_area: u32,
    /// Maximum blob area in px², person only. Fire has no ceiling: large
    /// fires are valid detections.
    pub max_area: u32,
    /// Minimum height/width ratio for a person blob. An upright silhouette
    /// is taller than wide; this rejects wide heat blobs such as floor or
    /// wall heating.
    pub person_aspect_min: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            person_percentile: 30.0,
            fire_threshold: 255,
            min_area: 50,
            max_area: 30000,
            person_aspect_min: 0.7,
        }
    }
}

/// Output of classifying one frame.
pub struct Classified {
    /// Heat-visualization copy with detection overlays.
    pub annotated: Frame,
    /// Fire detections first, then person detections.
    pub detections: Vec<Detection>,
    /// The adaptive threshold that was used for the person mask.
    pub person_threshold: u8,
}

pub struct FrameClassifier {
    config: ClassifierConfig,
}

impl FrameClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, frame: &Frame) -> Result<Classified> {
        let rgb = frame.to_rgb_image();
        let gray = image::imageops::grayscale(&rgb);
        let heatmap = apply_heat_palette(&gray);
        let heat = heat_channel(&heatmap);

        let person_threshold = percentile(heat.as_raw(), self.config.person_percentile)?;

        let mask_person = threshold_mask(&heat, person_threshold);
        let mask_fire = threshold_mask(&heat, self.config.fire_threshold);

        let blobs_fire = extract_blobs(&refine_mask(&mask_fire));
        let blobs_person = extract_blobs(&refine_mask(&mask_person));

        let mut detections = Vec::new();
        for blob in &blobs_fire {
            if self.fire_gate(blob) {
                detections.push(detection_from(DetectionKind::Fire, blob));
            }
        }
        for blob in &blobs_person {
            if self.person_gate(blob) {
                detections.push(detection_from(DetectionKind::Person, blob));
            }
        }

        let mut annotated = heatmap;
        for detection in &detections {
            annotate::draw_detection(&mut annotated, detection);
        }

        Ok(Classified {
            annotated: Frame::from_rgb_image(annotated, frame.timestamp_ms),
            detections,
            person_threshold,
        })
    }

    /// Fire keeps any blob at or above the area floor.
    pub fn fire_gate(&self, blob: &Blob) -> bool {
        blob.area >= self.config.min_area
    }

    /// Person keeps blobs inside the area band whose box is upright enough.
    pub fn person_gate(&self, blob: &Blob) -> bool {
        blob.area >= self.config.min_area
            && blob.area <= self.config.max_area
            && blob.bbox.aspect_ratio() >= self.config.person_aspect_min
    }
}

fn detection_from(kind: DetectionKind, blob: &Blob) -> Detection {
    Detection {
        kind,
        bbox: blob.bbox,
        area: blob.area,
        aspect_ratio: blob.bbox.aspect_ratio(),
    }
}

/// Pixel-wise `value >= threshold` binary mask.
fn threshold_mask(channel: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = GrayImage::new(channel.width(), channel.height());
    for (src, dst) in channel.pixels().zip(mask.pixels_mut()) {
        dst.0[0] = if src.0[0] >= threshold { MASK_ON } else { 0 };
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blob(area: u32, width: u32, height: u32) -> Blob {
        Blob {
            bbox: BoundingBox {
                x: 0,
                y: 0,
                width,
                height,
            },
            area,
        }
    }

    fn classifier() -> FrameClassifier {
        FrameClassifier::new(ClassifierConfig::default())
    }

    #[test]
    fn person_area_boundaries() {
        let c = classifier();
        // Qualifying aspect (taller than wide) throughout.
        assert!(!c.person_gate(&blob(49, 7, 7)));
        assert!(c.person_gate(&blob(50, 5, 10)));
        assert!(c.person_gate(&blob(30000, 150, 200)));
        assert!(!c.person_gate(&blob(30001, 150, 201)));
    }

    #[test]
    fn wide_blob_is_never_a_person() {
        let c = classifier();
        // Aspect 0.5, any area in range.
        assert!(!c.person_gate(&blob(200, 20, 10)));
        assert!(!c.person_gate(&blob(29000, 240, 120)));
    }

    #[test]
    fn upright_blob_is_a_person() {
        let c = classifier();
        // Aspect 2.0, area 100.
        assert!(c.person_gate(&blob(100, 10, 20)));
    }

    #[test]
    fn fire_has_no_area_ceiling_and_no_shape_gate() {
        let c = classifier();
        assert!(c.fire_gate(&blob(1_000_000, 2000, 500)));
        assert!(c.fire_gate(&blob(50, 50, 1)));
        assert!(!c.fire_gate(&blob(49, 7, 7)));
    }

    #[test]
    fn threshold_mask_is_inclusive() {
        let channel = GrayImage::from_fn(4, 1, |x, _| Luma([(x * 50) as u8]));
        let mask = threshold_mask(&channel, 100);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, MASK_ON, MASK_ON]);
    }

    #[test]
    fn all_zero_frame_is_one_full_frame_person() {
        // 160x120 of intensity zero: the adaptive threshold is 0, every
        // pixel satisfies >= 0, and the single component covers the frame.
        // Area 19200 sits inside [50, 30000] and aspect 120/160 = 0.75
        // clears 0.7, so the whole frame is reported as one person.
        let frame = Frame::new(vec![0u8; 160 * 120 * 3], 160, 120, 0).unwrap();
        let classified = classifier().classify(&frame).unwrap();

        assert_eq!(classified.person_threshold, 0);
        assert_eq!(classified.detections.len(), 1);
        let det = &classified.detections[0];
        assert_eq!(det.kind, DetectionKind::Person);
        assert_eq!(det.area, 19200);
        assert_eq!(
            det.bbox,
            BoundingBox {
                x: 0,
                y: 0,
                width: 160,
                height: 120
            }
        );
    }

    #[test]
    fn classify_never_mutates_the_input_frame() {
        let data: Vec<u8> = (0..160 * 120 * 3u32).map(|i| (i % 251) as u8).collect();
        let frame = Frame::new(data.clone(), 160, 120, 7).unwrap();
        let _ = classifier().classify(&frame).unwrap();
        assert_eq!(frame.pixels(), &data[..]);
    }

    #[test]
    fn hot_square_yields_fire_before_person() {
        // Vertical gradient background (rows 0..119 at intensity 2*row)
        // plus a maximum-intensity upright square in the cold region. The
        // square passes both gates; the warm lower band is too wide to be
        // a person; fire detections come first.
        let width = 160u32;
        let height = 120u32;
        let mut data = vec![0u8; (width * height * 3) as usize];
        for y in 0..height {
            let v = (y * 2).min(255) as u8;
            for x in 0..width {
                let off = ((y * width + x) * 3) as usize;
                data[off] = v;
                data[off + 1] = v;
                data[off + 2] = v;
            }
        }
        for y in 2..23 {
            for x in 10..20 {
                let off = ((y * width + x) * 3) as usize;
                data[off] = 255;
                data[off + 1] = 255;
                data[off + 2] = 255;
            }
        }

        let frame = Frame::new(data, width, height, 0).unwrap();
        let classified = classifier().classify(&frame).unwrap();

        let kinds: Vec<DetectionKind> = classified.detections.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DetectionKind::Fire, DetectionKind::Person]);

        for det in &classified.detections {
            // Both detections come from the hot square (dilated by one).
            assert!(det.bbox.x >= 8 && det.bbox.x <= 10, "{:?}", det);
            assert!(det.bbox.y <= 2, "{:?}", det);
            assert!(det.area >= 50);
            assert!(det.aspect_ratio >= 0.7);
        }
    }
}
