use std::{cell::Cell, collections::VecDeque, rc::Rc};

use nalgebra::Point2;
use pinchdrag::drag::{DragController, GestureState};
use pinchdrag::gui::FrameSink;
use pinchdrag::hand::landmark::{Landmark, LandmarkIdx, NUM_LANDMARKS};
use pinchdrag::hand::provider::{Detection, LandmarkProvider};
use pinchdrag::image::{Color, Image, Resolution};
use pinchdrag::pipeline::{Options, Pipeline, StopReason};
use pinchdrag::region::DraggableRegion;
use pinchdrag::video::FrameSource;

const RES: Resolution = Resolution::RES_720P;

/// Landmarks of an upright hand with the index fingertip at `tip` and the middle fingertip
/// `spread` pixels to its right.
fn hand(tip: (i32, i32), spread: i32) -> Vec<Landmark> {
    (0..NUM_LANDMARKS)
        .map(|id| {
            let i = id as i32;
            if id == LandmarkIdx::IndexFingerTip.id() {
                Landmark::new(id, tip.0, tip.1)
            } else if id == LandmarkIdx::MiddleFingerTip.id() {
                Landmark::new(id, tip.0 + spread, tip.1)
            } else {
                Landmark::new(id, tip.0 - 100 + 10 * i, tip.1 + 200 - 10 * i)
            }
        })
        .collect()
}

/// Replays a script of per-frame detection results.
struct ScriptedProvider {
    script: VecDeque<anyhow::Result<Vec<Detection>>>,
    seen: Vec<Image>,
}

impl ScriptedProvider {
    fn new(script: impl IntoIterator<Item = anyhow::Result<Vec<Detection>>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            seen: Vec::new(),
        }
    }

    fn no_hands() -> Self {
        Self::new(Vec::new())
    }
}

impl LandmarkProvider for ScriptedProvider {
    fn detect(&mut self, image: &Image) -> anyhow::Result<Vec<Detection>> {
        self.seen.push(image.clone());
        self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Produces `frames` blank frames, then fails.
struct FakeCamera {
    frames: usize,
}

impl FrameSource for FakeCamera {
    fn read(&mut self) -> anyhow::Result<Image> {
        if self.frames == 0 {
            anyhow::bail!("camera unplugged");
        }
        self.frames -= 1;
        Ok(Image::filled(RES.width(), RES.height(), Color::BLACK))
    }
}

/// Records shown frames and requests a stop after `stop_after` of them.
struct FakeDisplay {
    shown: Rc<Cell<usize>>,
    stop_after: usize,
}

impl FrameSink for FakeDisplay {
    fn show(&mut self, image: &Image) -> anyhow::Result<()> {
        assert_eq!(image.resolution(), RES);
        self.shown.set(self.shown.get() + 1);
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.shown.get() >= self.stop_after
    }
}

fn pipeline(provider: ScriptedProvider) -> Pipeline<ScriptedProvider> {
    let controller = DragController::new(DraggableRegion::row(5), RES);
    Pipeline::new(provider, controller, Options::default())
}

fn centers(pipeline: &Pipeline<ScriptedProvider>) -> Vec<Point2<i32>> {
    pipeline
        .controller()
        .regions()
        .iter()
        .map(|r| r.center())
        .collect()
}

#[test]
fn pinch_drags_first_region() {
    let provider = ScriptedProvider::new([
        Ok(vec![Detection::new(hand((150, 150), 20), 0.9)]),
        Ok(vec![Detection::new(hand((180, 200), 20), 0.9)]),
        Ok(vec![Detection::new(hand((240, 260), 20), 0.9)]),
        // Fingers apart: the region stays where it was dropped.
        Ok(vec![Detection::new(hand((600, 400), 90), 0.9)]),
    ]);
    let mut pipeline = pipeline(provider);
    let blank = Image::filled(RES.width(), RES.height(), Color::BLACK);

    let out = pipeline.process_frame(blank.clone());
    assert_eq!(
        out.state,
        GestureState::Dragging {
            cursor: Point2::new(150, 150),
            distance: 20.0,
        }
    );
    assert_eq!(out.image.resolution(), RES);

    pipeline.process_frame(blank.clone());
    pipeline.process_frame(blank.clone());
    assert_eq!(centers(&pipeline)[0], Point2::new(240, 260));

    let out = pipeline.process_frame(blank.clone());
    assert_eq!(out.state, GestureState::Idle);
    assert_eq!(
        centers(&pipeline),
        [
            Point2::new(240, 260),
            Point2::new(400, 150),
            Point2::new(650, 150),
            Point2::new(900, 150),
            Point2::new(1150, 150),
        ]
    );
}

#[test]
fn failures_are_no_hand() {
    let mut malformed = hand((150, 150), 10);
    malformed.pop();
    let provider = ScriptedProvider::new([
        Err(anyhow::anyhow!("inference exploded")),
        Ok(vec![Detection::new(malformed, 0.9)]),
        Ok(Vec::new()),
    ]);
    let mut pipeline = pipeline(provider);
    let before = centers(&pipeline);

    for _ in 0..3 {
        let out = pipeline.process_frame(Image::filled(RES.width(), RES.height(), Color::BLACK));
        assert_eq!(out.state, GestureState::Idle);
    }
    assert_eq!(centers(&pipeline), before);
}

#[test]
fn frames_are_mirrored_before_detection() {
    let mut frame = Image::filled(RES.width(), RES.height(), Color::BLACK);
    frame.set(0, 0, Color::WHITE);

    let mut pipeline = pipeline(ScriptedProvider::no_hands());
    pipeline.process_frame(frame.clone());
    let seen = &pipeline.provider().seen[0];
    assert_eq!(seen.get(RES.width() - 1, 0), Color::WHITE);
    assert_eq!(seen.get(0, 0), Color::BLACK);

    let controller = DragController::new(DraggableRegion::row(5), RES);
    let options = Options {
        mirror: false,
        ..Options::default()
    };
    let mut pipeline = Pipeline::new(ScriptedProvider::no_hands(), controller, options);
    pipeline.process_frame(frame);
    assert_eq!(pipeline.provider().seen[0].get(0, 0), Color::WHITE);
}

#[test]
fn overlay_is_rendered() {
    let mut pipeline = pipeline(ScriptedProvider::no_hands());
    let gray = Color::from_rgb8(100, 100, 100);
    let out = pipeline.process_frame(Image::filled(RES.width(), RES.height(), gray));

    assert_eq!(out.image.get(150, 150), Color::from_rgb8(178, 50, 178));
    assert_eq!(out.image.get(640, 600), gray);
}

#[test]
fn stops_on_user_request() {
    let shown = Rc::new(Cell::new(0));
    let display = FakeDisplay {
        shown: shown.clone(),
        stop_after: 3,
    };
    let mut pipeline = pipeline(ScriptedProvider::no_hands());

    let reason = pipeline.run(FakeCamera { frames: 100 }, display).unwrap();
    assert_eq!(reason, StopReason::UserRequested);
    assert_eq!(shown.get(), 3);
}

#[test]
fn stops_when_camera_fails() {
    let shown = Rc::new(Cell::new(0));
    let display = FakeDisplay {
        shown: shown.clone(),
        stop_after: usize::MAX,
    };
    let mut pipeline = pipeline(ScriptedProvider::new([
        Ok(vec![Detection::new(hand((420, 170), 5), 0.9)]),
    ]));

    let reason = pipeline.run(FakeCamera { frames: 2 }, display).unwrap();
    assert_eq!(reason, StopReason::SourceFailed);
    assert_eq!(shown.get(), 2);
    assert_eq!(centers(&pipeline)[1], Point2::new(420, 170));
}
