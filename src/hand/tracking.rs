//! Hand tracking across frames.
//!
//! Finding hands with the palm detector is expensive, so it only runs while fewer than the maximum
//! number of hands are tracked. Tracked hands carry a region of interest (RoI) from one frame to
//! the next: the landmark network runs on the RoI, and the RoI is then moved to the bounding box of
//! the estimated landmarks. Tracking is lost when the hand presence score drops too low.

use crate::image::{AspectRatio, Image, Rect};
use crate::timer::Timer;

use super::provider::{Detection, LandmarkProvider};

/// Finds regions that contain a hand.
pub trait HandDetector {
    /// Returns square regions of `image` that each contain one hand, most confident first.
    fn detect_regions(&mut self, image: &Image) -> anyhow::Result<Vec<Rect>>;

    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

/// Estimates hand landmarks inside a region of a frame.
pub trait LandmarkEstimator {
    /// Estimates landmarks of the hand inside `roi`, in pixel coordinates of `image`.
    ///
    /// `roi` may extend past the borders of `image`.
    fn estimate(&mut self, image: &Image, roi: Rect) -> anyhow::Result<Detection>;

    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

/// Tracks up to a fixed number of hands, reporting their landmarks.
pub struct HandTracker<D, L> {
    detector: D,
    estimator: L,
    rois: Vec<Rect>,
    max_hands: usize,
    loss_thresh: f32,
    roi_padding: f32,
    iou_thresh: f32,
}

impl<D: HandDetector, L: LandmarkEstimator> HandTracker<D, L> {
    pub const DEFAULT_MAX_HANDS: usize = 2;

    /// Hand presence score below which tracking of a hand is lost.
    pub const DEFAULT_LOSS_THRESHOLD: f32 = 0.5;

    pub const DEFAULT_ROI_PADDING: f32 = 0.5;

    /// Intersection-over-union at or above which two regions are considered the same hand.
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    pub fn new(detector: D, estimator: L) -> Self {
        Self {
            detector,
            estimator,
            rois: Vec::new(),
            max_hands: Self::DEFAULT_MAX_HANDS,
            loss_thresh: Self::DEFAULT_LOSS_THRESHOLD,
            roi_padding: Self::DEFAULT_ROI_PADDING,
            iou_thresh: Self::DEFAULT_IOU_THRESH,
        }
    }

    /// Sets the maximum number of hands to track at once.
    pub fn set_max_hands(&mut self, max_hands: usize) {
        self.max_hands = max_hands;
        self.rois.truncate(max_hands);
    }

    pub fn max_hands(&self) -> usize {
        self.max_hands
    }

    /// Sets the tracking loss threshold.
    ///
    /// Hands whose presence score falls below this value are neither reported nor tracked further.
    pub fn set_loss_threshold(&mut self, threshold: f32) {
        self.loss_thresh = threshold;
    }

    pub fn loss_threshold(&self) -> f32 {
        self.loss_thresh
    }

    /// Returns the regions of interest the hands will be looked for in on the next frame.
    pub fn rois(&self) -> &[Rect] {
        &self.rois
    }

    /// Estimates landmarks in `roi` and starts tracking the hand if it is still present.
    fn track(
        &mut self,
        image: &Image,
        roi: Rect,
        hands: &mut Vec<Detection>,
    ) -> anyhow::Result<()> {
        let detection = self.estimator.estimate(image, roi)?;
        if detection.confidence < self.loss_thresh {
            log::trace!(
                "hand presence {:.2} in {:?} below {} -> lost",
                detection.confidence,
                roi,
                self.loss_thresh,
            );
            return Ok(());
        }

        let positions = detection.landmarks.iter().map(|lm| (lm.x(), lm.y()));
        let Some(bounds) = Rect::bounding(positions) else {
            return Ok(());
        };
        let next = bounds
            .grow_rel(self.roi_padding)
            .grow_to_fit_aspect(AspectRatio::SQUARE);

        if self.overlaps_tracked(&next) {
            log::trace!("hand in {:?} is already tracked", next);
            return Ok(());
        }

        self.rois.push(next);
        hands.push(detection);
        Ok(())
    }

    fn overlaps_tracked(&self, rect: &Rect) -> bool {
        self.rois.iter().any(|roi| roi.iou(rect) >= self.iou_thresh)
    }
}

impl<D: HandDetector, L: LandmarkEstimator> LandmarkProvider for HandTracker<D, L> {
    /// Reports tracked hands first (in the order they were found), then newly detected ones.
    ///
    /// On error, tracking of all hands not yet processed this frame is lost.
    fn detect(&mut self, image: &Image) -> anyhow::Result<Vec<Detection>> {
        let mut hands = Vec::new();

        for roi in std::mem::take(&mut self.rois) {
            self.track(image, roi, &mut hands)?;
        }

        if self.rois.len() < self.max_hands {
            for region in self.detector.detect_regions(image)? {
                if self.rois.len() >= self.max_hands {
                    break;
                }
                if self.overlaps_tracked(&region) {
                    continue;
                }
                self.track(image, region, &mut hands)?;
            }
        }

        Ok(hands)
    }

    fn timers(&self) -> Vec<&Timer> {
        let mut timers = self.detector.timers();
        timers.extend(self.estimator.timers());
        timers
    }
}
