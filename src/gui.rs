//! Frame display.

use anyhow::Context;
use minifb::{Key, WindowOptions};

use crate::image::{Image, Resolution};

/// Something that presents rendered frames and reports when the user wants to quit.
pub trait FrameSink {
    fn show(&mut self, image: &Image) -> anyhow::Result<()>;

    /// Returns `true` once the user asked to stop, for example by pressing ESC.
    fn stop_requested(&self) -> bool;
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn show(&mut self, image: &Image) -> anyhow::Result<()> {
        (**self).show(image)
    }

    fn stop_requested(&self) -> bool {
        (**self).stop_requested()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn show(&mut self, image: &Image) -> anyhow::Result<()> {
        (**self).show(image)
    }

    fn stop_requested(&self) -> bool {
        (**self).stop_requested()
    }
}

/// A native window displaying one image at a time.
///
/// The window is opened lazily when the first image is shown, and reopened whenever the image
/// resolution changes. Pressing ESC or closing the window requests a stop.
pub struct Window {
    title: String,
    inner: Option<(minifb::Window, Resolution)>,
    buf: Vec<u32>,
}

impl Window {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            inner: None,
            buf: Vec::new(),
        }
    }

    fn open(&self, res: Resolution) -> anyhow::Result<minifb::Window> {
        log::debug!("creating window '{}' at {}", self.title, res);
        minifb::Window::new(
            &self.title,
            res.width() as usize,
            res.height() as usize,
            WindowOptions::default(),
        )
        .with_context(|| format!("failed to open {} window '{}'", res, self.title))
    }
}

impl FrameSink for Window {
    fn show(&mut self, image: &Image) -> anyhow::Result<()> {
        let res = image.resolution();
        if !matches!(&self.inner, Some((_, win_res)) if *win_res == res) {
            // Close the old window before opening the new one.
            self.inner = None;
            let window = self.open(res)?;
            self.inner = Some((window, res));
        }

        image.write_0rgb(&mut self.buf);
        if let Some((window, _)) = &mut self.inner {
            window
                .update_with_buffer(&self.buf, res.width() as usize, res.height() as usize)
                .context("failed to update window")?;
        }
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        match &self.inner {
            Some((window, _)) => !window.is_open() || window.is_key_down(Key::Escape),
            None => false,
        }
    }
}
