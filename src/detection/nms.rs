//! Non-Maximum Suppression.
//!
//! Typical Single-Shot MultiBox Detectors (SSD) produce duplicate detections for individual
//! objects. Non-Maximum Suppression (NMS) filters these duplicates out, leaving only the detection
//! with the highest confidence for each object.

use super::RawDetection;

/// A non-maximum suppression algorithm.
#[derive(Debug, Clone)]
pub struct NonMaxSuppression {
    iou_thresh: f32,
}

impl NonMaxSuppression {
    /// The default intersection-over-union threshold used to determine if two detections overlap.
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            iou_thresh: Self::DEFAULT_IOU_THRESH,
        }
    }

    /// Sets the intersection-over-union threshold to consider two detections as overlapping.
    pub fn set_iou_thresh(&mut self, iou_thresh: f32) {
        self.iou_thresh = iou_thresh;
    }

    /// Performs non-maximum suppression on `detections`.
    ///
    /// `detections` is drained in the process. The retained detections are returned in order of
    /// descending confidence.
    pub fn process(&self, detections: &mut Vec<RawDetection>) -> Vec<RawDetection> {
        let mut out = Vec::new();

        // Sort by ascending confidence, process highest confidence first by starting at the back.
        detections.sort_unstable_by(|a, b| a.confidence().total_cmp(&b.confidence()));

        while let Some(seed) = detections.pop() {
            detections.retain(|other| {
                let iou = seed.bounding_rect().iou(&other.bounding_rect());
                iou < self.iou_thresh
            });
            out.push(seed);
        }

        out
    }
}

impl Default for NonMaxSuppression {
    fn default() -> Self {
        Self::new()
    }
}
