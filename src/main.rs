use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pinchdrag::drag::DragController;
use pinchdrag::gui::Window;
use pinchdrag::hand::detection::{self, PalmDetector};
use pinchdrag::hand::network::LandmarkNetwork;
use pinchdrag::hand::provider::HandSelection;
use pinchdrag::hand::tracking::HandTracker;
use pinchdrag::image::Resolution;
use pinchdrag::pipeline::{self, Pipeline, StopReason};
use pinchdrag::region::DraggableRegion;
use pinchdrag::video::webcam::{Webcam, WebcamOptions};

type Tracker = HandTracker<PalmDetector, LandmarkNetwork>;

#[derive(Parser, Debug)]
#[command(
    name = "pinchdrag",
    about = "Drag rectangles around by pinching index and middle finger in front of a webcam"
)]
struct Cli {
    /// Palm detection network to load (ONNX)
    #[arg(long, default_value = "3rdparty/onnx/palm_detection_full.onnx")]
    palm_model: PathBuf,

    /// Hand landmark network to load (ONNX)
    #[arg(long, default_value = "3rdparty/onnx/hand_landmark_full.onnx")]
    landmark_model: PathBuf,

    /// Name of the webcam to open (default: `PINCHDRAG_WEBCAM_NAME`, or the first compatible
    /// device)
    #[arg(long)]
    camera: Option<String>,

    /// Requested capture width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Requested capture height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Requested capture frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Minimum palm detection score to start tracking a hand
    #[arg(long, default_value_t = detection::DEFAULT_MIN_CONFIDENCE)]
    detection_confidence: f32,

    /// Minimum hand presence score to keep tracking a hand
    #[arg(long, default_value_t = Tracker::DEFAULT_LOSS_THRESHOLD)]
    tracking_confidence: f32,

    /// Maximum number of hands to track
    #[arg(long, default_value_t = Tracker::DEFAULT_MAX_HANDS)]
    max_hands: usize,

    /// Number of draggable rectangles
    #[arg(long, default_value_t = 5)]
    regions: usize,

    /// Act on the most confident hand instead of the first one reported
    #[arg(long)]
    most_confident: bool,

    /// Don't mirror the camera image
    #[arg(long)]
    no_mirror: bool,

    /// Don't draw the hand skeleton
    #[arg(long)]
    no_landmarks: bool,

    /// Draw the distance between the pinching fingertips
    #[arg(long)]
    draw_pinch: bool,
}

fn main() -> anyhow::Result<()> {
    pinchdrag::init_logger!();

    let cli = Cli::parse();
    log::debug!("{:?}", cli);

    let (mut pipeline, webcam) = setup(&cli)?;
    match pipeline.run(webcam, Window::new("pinchdrag"))? {
        StopReason::UserRequested => {}
        StopReason::SourceFailed => log::info!("webcam stopped delivering frames, exiting"),
    }
    Ok(())
}

fn setup(cli: &Cli) -> anyhow::Result<(Pipeline<Tracker>, Webcam)> {
    let mut detector = PalmDetector::load(&cli.palm_model).with_context(|| {
        format!(
            "failed to load palm detection model '{}'",
            cli.palm_model.display()
        )
    })?;
    detector.set_threshold(cli.detection_confidence);
    let network = LandmarkNetwork::load(&cli.landmark_model).with_context(|| {
        format!(
            "failed to load hand landmark model '{}'",
            cli.landmark_model.display()
        )
    })?;

    let mut tracker = HandTracker::new(detector, network);
    tracker.set_loss_threshold(cli.tracking_confidence);
    tracker.set_max_hands(cli.max_hands);
    log::info!(
        "tracking up to {} hand(s), detection confidence {}, tracking confidence {}",
        tracker.max_hands(),
        cli.detection_confidence,
        tracker.loss_threshold(),
    );

    let mut options = WebcamOptions::default().resolution(Resolution::new(cli.width, cli.height));
    if let Some(name) = &cli.camera {
        options = options.name(name.clone());
    }
    if let Some(fps) = cli.fps {
        options = options.fps(fps);
    }
    let webcam = Webcam::open(options).context("failed to open webcam")?;

    let controller = DragController::new(DraggableRegion::row(cli.regions), webcam.resolution());
    let options = pipeline::Options {
        mirror: !cli.no_mirror,
        draw_landmarks: !cli.no_landmarks,
        draw_pinch: cli.draw_pinch,
        selection: if cli.most_confident {
            HandSelection::MostConfident
        } else {
            HandSelection::First
        },
    };

    Ok((Pipeline::new(tracker, controller, options), webcam))
}
