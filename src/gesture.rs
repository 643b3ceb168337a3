//! Geometric gesture features derived from a single [`HandObservation`].

use nalgebra::Point2;

use crate::hand::landmark::{HandObservation, LandmarkIdx};
use crate::image::{draw, Color, Image};

/// Fingertip landmarks, from thumb to pinky.
const FINGERTIPS: [LandmarkIdx; 5] = [
    LandmarkIdx::ThumbTip,
    LandmarkIdx::IndexFingerTip,
    LandmarkIdx::MiddleFingerTip,
    LandmarkIdx::RingFingerTip,
    LandmarkIdx::PinkyTip,
];

/// Returns which fingers are extended, ordered thumb, index, middle, ring, pinky.
///
/// The thumb counts as up when its tip is to the right of the joint below it. This only matches
/// an upright right hand when the frame was mirrored (selfie view) before detection. The other
/// fingers count as up when the tip is strictly higher on screen than the PIP joint.
pub fn finger_up_states(hand: &HandObservation) -> [bool; 5] {
    FINGERTIPS.map(|tip| {
        if tip == LandmarkIdx::ThumbTip {
            hand[tip].x > hand[LandmarkIdx::ThumbIp].x
        } else {
            // PIP is always two ids below the tip.
            let pip = LandmarkIdx::ALL[tip.id() - 2];
            hand[tip].y < hand[pip].y
        }
    })
}

/// Euclidean distance between two pixel positions.
pub fn distance(p: Point2<i32>, q: Point2<i32>) -> f32 {
    let dx = (q.x - p.x) as f32;
    let dy = (q.y - p.y) as f32;
    dx.hypot(dy)
}

/// Measures how far apart landmarks `a` and `b` are.
pub fn pinch(hand: &HandObservation, a: LandmarkIdx, b: LandmarkIdx) -> Pinch {
    let a = hand[a];
    let b = hand[b];
    let midpoint = Point2::new((a.x + b.x).div_euclid(2), (a.y + b.y).div_euclid(2));
    Pinch {
        distance: distance(a, b),
        a,
        b,
        midpoint,
    }
}

/// Result of [`pinch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinch {
    distance: f32,
    a: Point2<i32>,
    b: Point2<i32>,
    midpoint: Point2<i32>,
}

impl Pinch {
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// The point a pinch acts on: the position of the first landmark.
    #[inline]
    pub fn anchor(&self) -> Point2<i32> {
        self.a
    }

    #[inline]
    pub fn endpoints(&self) -> (Point2<i32>, Point2<i32>) {
        (self.a, self.b)
    }

    /// Midpoint between both landmarks, rounded towards negative infinity.
    #[inline]
    pub fn midpoint(&self) -> Point2<i32> {
        self.midpoint
    }

    /// Draws the connecting line and a dot on both endpoints and the midpoint.
    pub fn draw(&self, target: &mut Image) {
        const COLOR: Color = Color::MAGENTA;

        draw::line(target, self.a.x, self.a.y, self.b.x, self.b.y)
            .color(COLOR)
            .stroke_width(3);
        for p in [self.a, self.b, self.midpoint] {
            draw::circle(target, p.x, p.y, 21).color(COLOR).filled();
        }
    }
}
