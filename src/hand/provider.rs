//! Interface to hand landmark sources.

use crate::image::Image;
use crate::timer::Timer;

use super::landmark::{HandObservation, Landmark};

/// Something that finds hands in camera frames.
///
/// Implementations report zero or more [`Detection`]s per frame, in pixel coordinates of the frame
/// passed in.
pub trait LandmarkProvider {
    fn detect(&mut self, image: &Image) -> anyhow::Result<Vec<Detection>>;

    /// Profiling timers to report alongside the frame rate.
    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for &mut P {
    fn detect(&mut self, image: &Image) -> anyhow::Result<Vec<Detection>> {
        (**self).detect(image)
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    fn detect(&mut self, image: &Image) -> anyhow::Result<Vec<Detection>> {
        (**self).detect(image)
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

/// A raw, unvalidated hand detection.
///
/// Providers are expected to report all 21 landmarks in id order, but this is only checked when
/// the detection is turned into a [`HandObservation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub landmarks: Vec<Landmark>,
    pub confidence: f32,
}

impl Detection {
    pub fn new(landmarks: Vec<Landmark>, confidence: f32) -> Self {
        Self {
            landmarks,
            confidence,
        }
    }

    /// Validates this detection, returning the resulting [`HandObservation`].
    pub fn to_observation(&self) -> anyhow::Result<HandObservation> {
        HandObservation::new(&self.landmarks, self.confidence)
    }
}

/// Determines which hand is acted upon when several are detected in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandSelection {
    /// Use the first detection reported by the provider, ignoring all others.
    #[default]
    First,
    /// Use the detection with the highest confidence.
    MostConfident,
}

impl HandSelection {
    /// Picks a detection according to this policy and validates it.
    ///
    /// Returns `None` if there are no detections, or if the selected one is malformed (a warning is
    /// logged in that case).
    pub fn select(self, detections: &[Detection]) -> Option<HandObservation> {
        let detection = match self {
            HandSelection::First => detections.first(),
            HandSelection::MostConfident => detections
                .iter()
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence)),
        }?;

        match detection.to_observation() {
            Ok(hand) => Some(hand),
            Err(e) => {
                log::warn!("discarding malformed hand detection: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::hand::landmark::{tests::landmarks_with_index_tip, LandmarkIdx};

    use super::*;

    fn detection(tip: (i32, i32), confidence: f32) -> Detection {
        Detection::new(landmarks_with_index_tip(tip), confidence)
    }

    #[test]
    fn no_detections() {
        assert_eq!(HandSelection::First.select(&[]), None);
        assert_eq!(HandSelection::MostConfident.select(&[]), None);
    }

    #[test]
    fn first_wins() {
        let detections = [detection((100, 100), 0.85), detection((300, 300), 0.99)];
        let hand = HandSelection::First.select(&detections).unwrap();
        assert_eq!(hand[LandmarkIdx::IndexFingerTip].x, 100);
    }

    #[test]
    fn most_confident_wins() {
        let detections = [detection((100, 100), 0.85), detection((300, 300), 0.99)];
        let hand = HandSelection::MostConfident.select(&detections).unwrap();
        assert_eq!(hand[LandmarkIdx::IndexFingerTip].x, 300);
    }

    #[test]
    fn malformed_is_no_hand() {
        let mut bad = detection((100, 100), 0.9);
        bad.landmarks.truncate(20);
        assert_eq!(HandSelection::First.select(&[bad.clone()]), None);

        // A well-formed second hand does not stand in for a malformed first one.
        let detections = [bad, detection((300, 300), 0.9)];
        assert_eq!(HandSelection::First.select(&detections), None);
    }
}
