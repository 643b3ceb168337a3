//! Palm detection.

use std::path::Path;

use nalgebra::{Point2, Vector2};

use crate::detection::{
    nms::NonMaxSuppression,
    ssd::{Anchor, Anchors, LayerInfo},
    RawDetection,
};
use crate::image::{Image, Rect, Resolution};
use crate::nn::{Cnn, ColorMapper, Outputs};
use crate::num::sigmoid;
use crate::timer::Timer;

use super::tracking::HandDetector;

/// Palm detection score below which a detection is discarded.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.8;

const LAYERS: &[LayerInfo] = &[LayerInfo::new(2, 24, 24), LayerInfo::new(6, 12, 12)];

/// Number of values the network outputs per anchor: box center and size, then 7 keypoints.
const BOX_PARAMS: usize = 4 + 2 * ALL_KEYPOINTS.len();

/// Palm size to hand region size.
const HAND_SCALE: f32 = 2.6;

/// How far the hand region is moved from the palm towards the fingers, relative to the palm size.
const HAND_SHIFT: f32 = 0.5;

/// A keypoint of a [`Palm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keypoint {
    Wrist = 0,
    IndexFingerMcp = 1,
    MiddleFingerMcp = 2,
    RingFingerMcp = 3,
    PinkyMcp = 4,
    ThumbCmc = 5,
    ThumbMcp = 6,
}

/// A list of all [`Keypoint`]s.
pub const ALL_KEYPOINTS: &[Keypoint] = &[
    Keypoint::Wrist,
    Keypoint::IndexFingerMcp,
    Keypoint::MiddleFingerMcp,
    Keypoint::RingFingerMcp,
    Keypoint::PinkyMcp,
    Keypoint::ThumbCmc,
    Keypoint::ThumbMcp,
];

/// A palm found by the [`PalmDetector`], in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Palm {
    raw: RawDetection,
}

impl Palm {
    pub fn new(raw: RawDetection) -> Self {
        Self { raw }
    }

    pub fn confidence(&self) -> f32 {
        self.raw.confidence()
    }

    /// Returns the bounding rectangle of the palm (without fingers).
    pub fn bounding_rect(&self) -> Rect {
        self.raw.bounding_rect()
    }

    /// Returns the position of `keypoint`, if the detection has it.
    pub fn keypoint(&self, keypoint: Keypoint) -> Option<Point2<f32>> {
        self.raw.keypoints().get(keypoint as usize).copied()
    }

    /// Computes the square region that should contain the whole hand, fingers included.
    ///
    /// The region is centered above the palm, in the direction from the wrist to the middle
    /// finger's knuckle (straight up if the keypoints are missing).
    pub fn hand_region(&self) -> Rect {
        let rect = self.bounding_rect();
        let size = rect.width().max(rect.height()) as f32;

        let up = match (
            self.keypoint(Keypoint::Wrist),
            self.keypoint(Keypoint::MiddleFingerMcp),
        ) {
            (Some(wrist), Some(finger)) => (finger - wrist)
                .try_normalize(f32::EPSILON)
                .unwrap_or(-Vector2::y()),
            _ => -Vector2::y(),
        };

        let (xc, yc) = rect.center();
        let center = Point2::new(xc as f32, yc as f32) + up * (size * HAND_SHIFT);
        let side = (size * HAND_SCALE).round() as u32;
        Rect::from_center(
            center.x.round() as i32,
            center.y.round() as i32,
            side,
            side,
        )
    }
}

/// Runs a MediaPipe palm detection network on whole camera frames.
///
/// The network takes a square NCHW RGB input (192x192 for the published models). Frames of other
/// aspect ratios are padded with black bars. Its first output must hold the box parameters
/// (`[1, 2016, 18]`) and its second output the raw scores (`[1, 2016, 1]`).
pub struct PalmDetector {
    cnn: Cnn,
    anchors: Anchors,
    thresh: f32,
    nms: NonMaxSuppression,
    t_infer: Timer,
    t_extract: Timer,
    t_nms: Timer,
}

impl PalmDetector {
    /// Loads the palm detection network from an `.onnx` file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let cnn = Cnn::load(path, ColorMapper::linear(0.0..=1.0))?;
        Ok(Self {
            cnn,
            anchors: Anchors::calculate(LAYERS),
            thresh: DEFAULT_MIN_CONFIDENCE,
            nms: NonMaxSuppression::new(),
            t_infer: Timer::new("palm infer"),
            t_extract: Timer::new("palm extract"),
            t_nms: Timer::new("palm nms"),
        })
    }

    /// Sets the minimum detection score for a palm to be reported.
    #[inline]
    pub fn set_threshold(&mut self, thresh: f32) {
        self.thresh = thresh;
    }

    /// Detects palms in `image`, most confident first.
    pub fn detect(&mut self, image: &Image) -> anyhow::Result<Vec<Palm>> {
        let input_res = self.cnn.input_resolution();
        let Some(aspect) = input_res.aspect_ratio() else {
            anyhow::bail!("palm detection network has empty input {}", input_res);
        };

        // Oversized view of the frame matching the network's aspect ratio.
        let view = image.rect().grow_to_fit_aspect(aspect);
        let outputs = self.t_infer.time(|| self.cnn.estimate(image, view))?;

        let mut detections = self.t_extract.time(|| {
            extract(&outputs, &self.anchors, input_res, view, self.thresh)
        })?;
        let palms = self.t_nms.time(|| self.nms.process(&mut detections));

        let palms = palms.into_iter().map(Palm::new).collect::<Vec<_>>();
        for palm in &palms {
            log::trace!(
                "palm at {:?}, confidence {:.2}",
                palm.bounding_rect(),
                palm.confidence()
            );
        }
        Ok(palms)
    }
}

impl HandDetector for PalmDetector {
    fn detect_regions(&mut self, image: &Image) -> anyhow::Result<Vec<Rect>> {
        let palms = self.detect(image)?;
        Ok(palms.iter().map(Palm::hand_region).collect())
    }

    fn timers(&self) -> Vec<&Timer> {
        vec![&self.t_infer, &self.t_extract, &self.t_nms]
    }
}

fn extract(
    outputs: &Outputs,
    anchors: &Anchors,
    input_res: Resolution,
    view: Rect,
    thresh: f32,
) -> anyhow::Result<Vec<RawDetection>> {
    let (box_shape, boxes) = outputs.get(0)?;
    let (score_shape, scores) = outputs.get(1)?;
    let num_anchors = anchors.anchor_count();
    if boxes.len() != num_anchors * BOX_PARAMS || scores.len() != num_anchors {
        anyhow::bail!(
            "palm detection outputs have shapes {:?} and {:?}, expected [1, {}, {}] and [1, {}, 1]",
            box_shape,
            score_shape,
            num_anchors,
            BOX_PARAMS,
            num_anchors,
        );
    }

    Ok(decode(anchors, input_res, view, boxes, scores, thresh))
}

/// Decodes all boxes scoring at least `thresh`, mapping them from network input pixels into the
/// frame that `view` was sampled from.
fn decode(
    anchors: &Anchors,
    input_res: Resolution,
    view: Rect,
    boxes: &[f32],
    scores: &[f32],
    thresh: f32,
) -> Vec<RawDetection> {
    let mut detections = Vec::new();
    for (index, (&score, params)) in scores
        .iter()
        .zip(boxes.chunks_exact(BOX_PARAMS))
        .enumerate()
    {
        let confidence = sigmoid(score);
        if confidence < thresh {
            continue;
        }

        detections.push(decode_box(
            &anchors[index],
            input_res,
            view,
            params,
            confidence,
        ));
    }
    detections
}

fn decode_box(
    anchor: &Anchor,
    input_res: Resolution,
    view: Rect,
    params: &[f32],
    confidence: f32,
) -> RawDetection {
    let input_w = input_res.width() as f32;
    let input_h = input_res.height() as f32;
    let scale_x = view.width() as f32 / input_w;
    let scale_y = view.height() as f32 / input_h;

    let to_frame = |x: f32, y: f32| {
        Point2::new(
            view.x() as f32 + (x + anchor.x_center() * input_w) * scale_x,
            view.y() as f32 + (y + anchor.y_center() * input_h) * scale_y,
        )
    };

    let center = to_frame(params[0], params[1]);
    let rect = Rect::from_center(
        center.x.round() as i32,
        center.y.round() as i32,
        (params[2] * scale_x).round() as u32,
        (params[3] * scale_y).round() as u32,
    );
    let keypoints = params[4..]
        .chunks_exact(2)
        .map(|xy| to_frame(xy[0], xy[1]))
        .collect();

    RawDetection::with_keypoints(confidence, rect, keypoints)
}
