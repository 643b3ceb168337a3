//! Turning pinch gestures into region movement.

use nalgebra::Point2;

use crate::gesture;
use crate::hand::landmark::{HandObservation, LandmarkIdx};
use crate::image::Resolution;
use crate::region::DraggableRegion;

/// Pinch distance (in pixels) below which a pinch drags, at the reference resolution.
pub const BASE_THRESHOLD: f32 = 40.0;

/// The resolution [`BASE_THRESHOLD`] is specified for.
pub const REFERENCE_RESOLUTION: Resolution = Resolution::RES_720P;

/// The landmark that acts as the cursor while dragging.
pub const CURSOR_LANDMARK: LandmarkIdx = LandmarkIdx::IndexFingerTip;

/// The landmark that has to touch [`CURSOR_LANDMARK`] to drag.
pub const PINCH_LANDMARK: LandmarkIdx = LandmarkIdx::MiddleFingerTip;

/// Scales [`BASE_THRESHOLD`] to frames of resolution `res`.
pub fn threshold_for(res: Resolution) -> f32 {
    BASE_THRESHOLD * res.scale_relative_to(REFERENCE_RESOLUTION)
}

/// Gesture state of a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// No hand, or the fingers are too far apart.
    Idle,
    /// The fingers are pinched together.
    Dragging {
        cursor: Point2<i32>,
        distance: f32,
    },
}

impl GestureState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, GestureState::Dragging { .. })
    }

    pub fn cursor(&self) -> Option<Point2<i32>> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging { cursor, .. } => Some(*cursor),
        }
    }
}

/// Classifies a hand as pinching or not.
///
/// The hand is [`GestureState::Dragging`] only when the pinch distance is strictly below
/// `threshold`.
pub fn classify(hand: Option<&HandObservation>, threshold: f32) -> GestureState {
    let Some(hand) = hand else {
        return GestureState::Idle;
    };

    let pinch = gesture::pinch(hand, CURSOR_LANDMARK, PINCH_LANDMARK);
    if pinch.distance() < threshold {
        GestureState::Dragging {
            cursor: pinch.anchor(),
            distance: pinch.distance(),
        }
    } else {
        GestureState::Idle
    }
}

/// Owns the draggable regions and moves them according to per-frame gestures.
///
/// Nothing but the regions themselves is carried from one frame to the next.
#[derive(Debug, Clone)]
pub struct DragController {
    regions: Vec<DraggableRegion>,
    threshold: f32,
}

impl DragController {
    /// Creates a controller for frames of resolution `res`.
    pub fn new(regions: Vec<DraggableRegion>, res: Resolution) -> Self {
        let threshold = threshold_for(res);
        log::debug!("pinch threshold for {}: {:.1}px", res, threshold);
        Self { regions, threshold }
    }

    /// Rescales the pinch threshold when the frame resolution changes.
    pub fn set_resolution(&mut self, res: Resolution) {
        let threshold = threshold_for(res);
        if threshold != self.threshold {
            log::debug!("pinch threshold for {}: {:.1}px", res, threshold);
            self.threshold = threshold;
        }
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn regions(&self) -> &[DraggableRegion] {
        &self.regions
    }

    /// Processes the hand seen in one frame.
    ///
    /// While dragging, every region containing the cursor snaps to it, in creation order. Several
    /// overlapping regions can therefore be picked up at once.
    pub fn step(&mut self, hand: Option<&HandObservation>) -> GestureState {
        let state = classify(hand, self.threshold);
        if let GestureState::Dragging { cursor, distance } = state {
            let mut moved = 0;
            for region in &mut self.regions {
                if region.update(cursor) {
                    moved += 1;
                }
            }
            log::trace!(
                "dragging at {:?} (distance {:.1}), moved {} regions",
                cursor,
                distance,
                moved
            );
        }
        state
    }
}
