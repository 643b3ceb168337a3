//! The per-frame processing pipeline and the main loop driving it.
//!
//! Each frame goes through the same steps: mirror, detect, select a hand, classify the gesture,
//! move regions, annotate, render the overlay and display the result. Everything runs
//! sequentially on the calling thread.

use crate::drag::{DragController, GestureState, CURSOR_LANDMARK, PINCH_LANDMARK};
use crate::gesture;
use crate::gui::FrameSink;
use crate::hand::landmark::HandObservation;
use crate::hand::provider::{HandSelection, LandmarkProvider};
use crate::image::Image;
use crate::overlay;
use crate::timer::{FpsCounter, Timer};
use crate::video::FrameSource;

/// Per-frame behavior toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Flip frames horizontally before detection, so the preview acts like a mirror.
    pub mirror: bool,
    /// Draw the hand skeleton and bounding box.
    pub draw_landmarks: bool,
    /// Draw the line between the pinching fingertips.
    pub draw_pinch: bool,
    pub selection: HandSelection,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mirror: true,
            draw_landmarks: true,
            draw_pinch: false,
            selection: HandSelection::First,
        }
    }
}

/// Why [`Pipeline::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The display reported that the user wants to quit.
    UserRequested,
    /// The frame source failed to deliver a frame.
    SourceFailed,
}

/// Result of processing a single frame.
#[derive(Debug)]
pub struct FrameOutput {
    /// The annotated frame with the region overlay, ready for display.
    pub image: Image,
    pub state: GestureState,
}

/// Turns camera frames into rendered output, moving regions along the way.
pub struct Pipeline<P> {
    provider: P,
    controller: DragController,
    options: Options,
    t_detect: Timer,
    t_render: Timer,
}

impl<P: LandmarkProvider> Pipeline<P> {
    pub fn new(provider: P, controller: DragController, options: Options) -> Self {
        Self {
            provider,
            controller,
            options,
            t_detect: Timer::new("detect"),
            t_render: Timer::new("render"),
        }
    }

    #[inline]
    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    #[inline]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs all processing steps on one frame.
    ///
    /// Detection errors are logged and handled like a frame without a hand.
    pub fn process_frame(&mut self, mut frame: Image) -> FrameOutput {
        if self.options.mirror {
            frame.flip_horizontal_in_place();
        }
        self.controller.set_resolution(frame.resolution());

        let hand = self.detect(&frame);
        let state = self.controller.step(hand.as_ref());

        if let Some(hand) = &hand {
            if self.options.draw_landmarks {
                hand.draw(&mut frame);
            }
            if self.options.draw_pinch {
                gesture::pinch(hand, CURSOR_LANDMARK, PINCH_LANDMARK).draw(&mut frame);
            }
        }

        let image = self
            .t_render
            .time(|| overlay::render(&frame, self.controller.regions()));
        FrameOutput { image, state }
    }

    fn detect(&mut self, frame: &Image) -> Option<HandObservation> {
        let detections = {
            let _guard = self.t_detect.start();
            self.provider.detect(frame)
        };
        match detections {
            Ok(detections) => self.options.selection.select(&detections),
            Err(e) => {
                log::warn!("hand detection failed: {:#}", e);
                None
            }
        }
    }

    /// Pulls frames from `source`, processes them and shows them on `sink` until either side asks
    /// to stop.
    ///
    /// A failing frame source ends the loop normally; only display errors are returned.
    pub fn run<S, K>(&mut self, mut source: S, mut sink: K) -> anyhow::Result<StopReason>
    where
        S: FrameSource,
        K: FrameSink,
    {
        let mut fps = FpsCounter::new("pipeline");
        loop {
            let frame = match source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("failed to read frame: {:#}", e);
                    return Ok(StopReason::SourceFailed);
                }
            };

            let output = self.process_frame(frame);
            sink.show(&output.image)?;

            fps.tick_with(
                source
                    .timers()
                    .into_iter()
                    .chain(self.provider.timers())
                    .chain([&self.t_detect, &self.t_render]),
            );

            if sink.stop_requested() {
                log::info!("stop requested, exiting");
                return Ok(StopReason::UserRequested);
            }
        }
    }
}
