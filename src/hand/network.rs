//! Hand landmark estimation with an ONNX network.

use std::path::Path;

use crate::image::{Image, Rect};
use crate::nn::{Cnn, ColorMapper, Outputs};
use crate::timer::Timer;

use super::landmark::{Landmark, NUM_LANDMARKS};
use super::provider::Detection;
use super::tracking::LandmarkEstimator;

/// Runs a MediaPipe-style hand landmark network on a region of a camera frame.
///
/// Its first output must hold the 21 screen-space landmarks (`[1, 63]`, X/Y/Z triples in network
/// input pixels) and its second output the hand presence score (`[1, 1]`). Any further outputs are
/// ignored.
pub struct LandmarkNetwork {
    cnn: Cnn,
    t_infer: Timer,
    t_extract: Timer,
}

impl LandmarkNetwork {
    /// Loads the network from an `.onnx` file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let cnn = Cnn::load(path, ColorMapper::linear(0.0..=1.0))?;
        Ok(Self {
            cnn,
            t_infer: Timer::new("landmark infer"),
            t_extract: Timer::new("landmark extract"),
        })
    }
}

impl LandmarkEstimator for LandmarkNetwork {
    /// Estimates landmarks in `roi`, which is first grown to the network's aspect ratio.
    fn estimate(&mut self, image: &Image, roi: Rect) -> anyhow::Result<Detection> {
        let input_res = self.cnn.input_resolution();
        let Some(aspect) = input_res.aspect_ratio() else {
            anyhow::bail!("landmark network has empty input {}", input_res);
        };

        let roi = roi.grow_to_fit_aspect(aspect);
        let outputs = self.t_infer.time(|| self.cnn.estimate(image, roi))?;

        let scale = (
            roi.width() as f32 / input_res.width() as f32,
            roi.height() as f32 / input_res.height() as f32,
        );
        let detection = self
            .t_extract
            .time(|| extract(&outputs, roi, scale))?;

        log::trace!("hand presence in {:?}: {:.3}", roi, detection.confidence);
        Ok(detection)
    }

    fn timers(&self) -> Vec<&Timer> {
        vec![&self.t_infer, &self.t_extract]
    }
}

fn extract(outputs: &Outputs, roi: Rect, scale: (f32, f32)) -> anyhow::Result<Detection> {
    let (shape, screen_landmarks) = outputs.get(0)?;
    if screen_landmarks.len() != NUM_LANDMARKS * 3 {
        anyhow::bail!(
            "landmark output has shape {:?}, expected {} values",
            shape,
            NUM_LANDMARKS * 3,
        );
    }
    let (shape, presence) = outputs.get(1)?;
    let &[presence] = presence else {
        anyhow::bail!("presence output has shape {:?}, expected 1 value", shape);
    };

    let landmarks = screen_landmarks
        .chunks_exact(3)
        .enumerate()
        .map(|(id, xyz)| {
            let (x, y) = to_frame_coords(xyz[0], xyz[1], roi, scale);
            Landmark::new(id, x, y)
        })
        .collect();

    Ok(Detection::new(landmarks, presence))
}

/// Maps a position in network input pixels to frame pixels.
fn to_frame_coords(x: f32, y: f32, roi: Rect, scale: (f32, f32)) -> (i32, i32) {
    (
        roi.x() + (x * scale.0).round() as i32,
        roi.y() + (y * scale.1).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_network_coords_into_roi() {
        // 224x224 network input on a 448x448 region at the left edge of the frame.
        let roi = Rect::from_top_left(-100, 50, 448, 448);
        let scale = (2.0, 2.0);

        assert_eq!(to_frame_coords(0.0, 0.0, roi, scale), (-100, 50));
        assert_eq!(to_frame_coords(100.0, 50.0, roi, scale), (100, 150));
        assert_eq!(to_frame_coords(224.0, 224.0, roi, scale), (348, 498));
    }

    #[test]
    fn maps_into_right_edge() {
        // A region around the right-most default rectangle of a 720p frame.
        let roi = Rect::from_center(1150, 150, 300, 300);
        let scale = (300.0 / 224.0, 300.0 / 224.0);

        assert_eq!(to_frame_coords(112.0, 112.0, roi, scale), (1150, 150));
        let (x, _) = to_frame_coords(100.0, 112.0, roi, scale);
        assert!(1050 < x && x < 1250, "{x}");
    }
}
