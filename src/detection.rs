//! Common functionality for object detection.
//!
//! The palm detector is a Single-Shot MultiBox Detector (SSD): [`ssd`] computes its anchors and
//! [`nms`] filters out the duplicate detections it produces.

pub mod nms;
pub mod ssd;

use nalgebra::Point2;

use crate::image::Rect;

/// A detected object, in pixel coordinates of the frame it was found in.
///
/// A [`RawDetection`] consists of a [`Rect`] enclosing the object, a confidence value between 0.0
/// and 1.0, and a possibly empty list of keypoints whose meaning depends on the network.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    confidence: f32,
    rect: Rect,
    keypoints: Vec<Point2<f32>>,
}

impl RawDetection {
    pub fn new(confidence: f32, rect: Rect) -> Self {
        Self::with_keypoints(confidence, rect, Vec::new())
    }

    pub fn with_keypoints(confidence: f32, rect: Rect, keypoints: Vec<Point2<f32>>) -> Self {
        Self {
            confidence,
            rect,
            keypoints,
        }
    }

    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the axis-aligned bounding rectangle containing the detected object.
    #[inline]
    pub fn bounding_rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn keypoints(&self) -> &[Point2<f32>] {
        &self.keypoints
    }
}
