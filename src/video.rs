//! Frame acquisition.

pub mod webcam;

use crate::image::Image;
use crate::timer::Timer;

/// A source of camera frames.
///
/// Returning an error signals that no further frames can be produced.
pub trait FrameSource {
    fn read(&mut self) -> anyhow::Result<Image>;

    /// Profiling timers to report alongside the frame rate.
    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn read(&mut self) -> anyhow::Result<Image> {
        (**self).read()
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> anyhow::Result<Image> {
        (**self).read()
    }

    fn timers(&self) -> Vec<&Timer> {
        (**self).timers()
    }
}
