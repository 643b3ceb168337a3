//! The hand landmark model.

use std::{fmt, ops::Index};

use nalgebra::Point2;

use crate::image::{draw, Color, Image, Rect};

/// Number of landmarks in a complete hand observation.
pub const NUM_LANDMARKS: usize = 21;

/// Names for the hand pose landmarks, in landmark id order.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **IP**: Interphalangeal joint of the thumb.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl LandmarkIdx {
    /// All landmarks, indexed by their id.
    pub const ALL: [LandmarkIdx; NUM_LANDMARKS] = {
        use LandmarkIdx::*;
        [
            Wrist,
            ThumbCmc,
            ThumbMcp,
            ThumbIp,
            ThumbTip,
            IndexFingerMcp,
            IndexFingerPip,
            IndexFingerDip,
            IndexFingerTip,
            MiddleFingerMcp,
            MiddleFingerPip,
            MiddleFingerDip,
            MiddleFingerTip,
            RingFingerMcp,
            RingFingerPip,
            RingFingerDip,
            RingFingerTip,
            PinkyMcp,
            PinkyPip,
            PinkyDip,
            PinkyTip,
        ]
    };

    /// Returns the landmark with the given id, or `None` if `id` is not in `0..21`.
    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    /// Returns the numeric id of this landmark.
    #[inline]
    pub fn id(self) -> usize {
        self as usize
    }
}

const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

/// Margin added around the landmarks' bounding box when drawing it.
const BOUNDING_BOX_MARGIN: u32 = 20;

/// A single keypoint reported by a landmark provider.
///
/// The position is in pixel coordinates of the frame the landmark was detected in (origin at the
/// top left, X pointing right, Y pointing down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landmark {
    id: usize,
    position: Point2<i32>,
}

impl Landmark {
    pub fn new(id: usize, x: i32, y: i32) -> Self {
        Self {
            id,
            position: Point2::new(x, y),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Point2<i32> {
        self.position
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.position.y
    }
}

/// A complete set of landmarks for one hand in one frame.
///
/// Can only be constructed from exactly 21 landmarks in id order, so every [`LandmarkIdx`] can be
/// looked up without checks.
#[derive(Clone, PartialEq)]
pub struct HandObservation {
    positions: [Point2<i32>; NUM_LANDMARKS],
    bounding_box: Rect,
    confidence: f32,
}

impl HandObservation {
    /// Validates a list of landmarks and creates a [`HandObservation`] from it.
    ///
    /// Returns an error if there are not exactly 21 landmarks, or if their ids are not `0..21` in
    /// order.
    pub fn new(landmarks: &[Landmark], confidence: f32) -> anyhow::Result<Self> {
        if landmarks.len() != NUM_LANDMARKS {
            anyhow::bail!(
                "hand observation has {} landmarks (expected {})",
                landmarks.len(),
                NUM_LANDMARKS,
            );
        }

        let mut positions = [Point2::origin(); NUM_LANDMARKS];
        for (expected_id, (lm, out)) in landmarks.iter().zip(&mut positions).enumerate() {
            if lm.id() != expected_id {
                anyhow::bail!(
                    "hand observation has landmark {} at position {}",
                    lm.id(),
                    expected_id,
                );
            }
            *out = lm.position();
        }

        let bounding_box = Rect::bounding(positions.iter().map(|p| (p.x, p.y)))
            .ok_or_else(|| anyhow::anyhow!("hand observation has no landmarks"))?;

        Ok(Self {
            positions,
            bounding_box,
            confidence,
        })
    }

    /// Returns the position of a landmark, in frame pixel coordinates.
    #[inline]
    pub fn position(&self, idx: LandmarkIdx) -> Point2<i32> {
        self.positions[idx.id()]
    }

    /// Returns an iterator over all landmarks, in id order.
    pub fn landmarks(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.positions
            .iter()
            .enumerate()
            .map(|(id, p)| Landmark::new(id, p.x, p.y))
    }

    /// Returns the tightest rectangle containing all landmarks.
    #[inline]
    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    /// Returns the provider's confidence that this is a hand.
    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Draws the hand skeleton, a marker per landmark, and the (padded) bounding box.
    pub fn draw(&self, target: &mut Image) {
        for (a, b) in CONNECTIVITY {
            let a = self.position(*a);
            let b = self.position(*b);
            draw::line(target, a.x, a.y, b.x, b.y)
                .color(Color::GREEN)
                .stroke_width(2);
        }
        for pos in &self.positions {
            draw::marker(target, pos.x, pos.y).color(Color::MAGENTA);
        }
        draw::rect(target, self.bounding_box.grow(BOUNDING_BOX_MARGIN))
            .color(Color::GREEN)
            .stroke_width(2);
    }
}

impl Index<LandmarkIdx> for HandObservation {
    type Output = Point2<i32>;

    #[inline]
    fn index(&self, idx: LandmarkIdx) -> &Point2<i32> {
        &self.positions[idx.id()]
    }
}

impl fmt::Debug for HandObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandObservation")
            .field("bounding_box", &self.bounding_box)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds landmarks for a relaxed, upright hand with the index fingertip at `tip`.
    ///
    /// Landmark `i` sits at `(tip.x - 100 + 10 * i, tip.y + 200 - 10 * i)`, except for the index
    /// tip itself.
    pub(crate) fn landmarks_with_index_tip(tip: (i32, i32)) -> Vec<Landmark> {
        (0..NUM_LANDMARKS)
            .map(|id| {
                if id == LandmarkIdx::IndexFingerTip.id() {
                    Landmark::new(id, tip.0, tip.1)
                } else {
                    let i = id as i32;
                    Landmark::new(id, tip.0 - 100 + 10 * i, tip.1 + 200 - 10 * i)
                }
            })
            .collect()
    }

    #[test]
    fn ids_round_trip() {
        for (id, idx) in LandmarkIdx::ALL.iter().enumerate() {
            assert_eq!(idx.id(), id);
            assert_eq!(LandmarkIdx::from_id(id), Some(*idx));
        }
        assert_eq!(LandmarkIdx::from_id(21), None);
        assert_eq!(LandmarkIdx::IndexFingerTip.id(), 8);
        assert_eq!(LandmarkIdx::MiddleFingerTip.id(), 12);
    }

    #[test]
    fn rejects_incomplete_observation() {
        let mut landmarks = landmarks_with_index_tip((150, 150));
        landmarks.pop();
        assert!(HandObservation::new(&landmarks, 1.0).is_err());

        let mut landmarks = landmarks_with_index_tip((150, 150));
        landmarks.push(Landmark::new(21, 0, 0));
        assert!(HandObservation::new(&landmarks, 1.0).is_err());

        assert!(HandObservation::new(&[], 1.0).is_err());
    }

    #[test]
    fn rejects_out_of_order_ids() {
        let mut landmarks = landmarks_with_index_tip((150, 150));
        landmarks.swap(3, 4);
        let err = HandObservation::new(&landmarks, 1.0).unwrap_err();
        assert!(err.to_string().contains("landmark 4 at position 3"), "{err}");
    }

    #[test]
    fn lookup_and_bounding_box() {
        let landmarks = landmarks_with_index_tip((500, 40));
        let hand = HandObservation::new(&landmarks, 0.9).unwrap();

        assert_eq!(hand.position(LandmarkIdx::IndexFingerTip), Point2::new(500, 40));
        assert_eq!(hand[LandmarkIdx::Wrist], Point2::new(400, 240));
        assert_eq!(hand.confidence(), 0.9);
        assert_eq!(hand.landmarks().collect::<Vec<_>>(), landmarks);

        // Pinky tip is the right-most and (apart from the index tip) top-most landmark.
        assert_eq!(
            hand.bounding_box(),
            Rect::from_corners((400, 40), (600, 240))
        );
    }

    #[test]
    fn draw_stays_in_bounds() {
        let landmarks = landmarks_with_index_tip((5, 5));
        let hand = HandObservation::new(&landmarks, 1.0).unwrap();
        let mut image = Image::new(64, 64);
        hand.draw(&mut image);
    }
}
