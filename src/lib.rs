//! Drag on-screen rectangles around by pinching in front of a webcam.
//!
//! Frames come from a [`FrameSource`][video::FrameSource], hands are found by a
//! [`LandmarkProvider`][hand::provider::LandmarkProvider], and the pinch between index and middle
//! fingertip drives a [`DragController`][drag::DragController]. The result is rendered by
//! [`overlay::render`] and shown on a [`FrameSink`][gui::FrameSink]. [`pipeline`] ties it all
//! together.
//!
//! # Coordinates
//!
//! All positions are integer pixel coordinates of the (mirrored) camera frame: the origin is the
//! top left corner, X points right and Y points down.
//!
//! # Environment Variables
//!
//! * `PINCHDRAG_WEBCAM_NAME`: Forces the device to use for [`Webcam`]s created without an explicit
//!   device name. If unset, the first device that supports a compatible image format will be used.
//! * `RUST_LOG`: Overrides the log filter set up by [`init_logger!`].
//!
//! [`Webcam`]: video::webcam::Webcam

use log::LevelFilter;

pub mod detection;
pub mod drag;
pub mod gesture;
pub mod gui;
pub mod hand;
pub mod image;
pub mod nn;
mod num;
pub mod overlay;
pub mod pipeline;
pub mod region;
mod resolution;
pub mod timer;
pub mod video;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .filter(Some("tract_onnx"), LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and this library will log at *trace*
/// level. Otherwise, they will log at *debug* level. Anything else only logs what `RUST_LOG`
/// enables.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
