//! V4L2 webcam access.
//!
//! Only V4L2 `VIDEO_CAPTURE` devices yielding JFIF JPEG or Motion JPEG frames are supported.

use std::{cmp::Reverse, env};

use anyhow::bail;
use linuxvideo::{
    format::{FrameIntervals, FrameSizes, PixFormat, PixelFormat},
    stream::ReadStream,
    BufType, CapabilityFlags, Device, Fract,
};

use crate::image::{Image, Resolution};
use crate::timer::Timer;

use super::FrameSource;

/// Environment variable that forces the device (by card name) to open.
pub const ENV_VAR_WEBCAM_NAME: &str = "PINCHDRAG_WEBCAM_NAME";

#[derive(Debug, Default, Clone, Copy)]
struct FramePrefs {
    resolution: Option<Resolution>,
    fps: Option<u32>,
}

/// Format negotiation options.
#[derive(Debug, Default, Clone)]
pub struct WebcamOptions {
    name: Option<String>,
    frame: FramePrefs,
}

impl WebcamOptions {
    /// Sets the name of the webcam device to open.
    ///
    /// If no webcam with the given name can be found, opening the webcam will result in an error.
    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// The device name to look for: the one set with [`WebcamOptions::name`], else `from_env`.
    fn device_name<'a>(&'a self, from_env: Option<&'a str>) -> Option<&'a str> {
        self.name.as_deref().or(from_env)
    }

    /// Sets the desired image resolution.
    ///
    /// A lower resolution might be selected if the webcam cannot deliver the desired resolution.
    #[inline]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.frame.resolution = Some(resolution);
        self
    }

    /// Sets the desired frame rate.
    ///
    /// A lower frame rate might be selected if the webcam cannot deliver the desired frame rate.
    #[inline]
    pub fn fps(mut self, fps: u32) -> Self {
        self.frame.fps = Some(fps);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameFormat {
    resolution: Resolution,
    frame_interval: Fract,
}

fn negotiate_format(device: &Device, prefs: FramePrefs) -> anyhow::Result<(PixFormat, Fract)> {
    let mut pixel_format = None;
    for format in device.formats(BufType::VIDEO_CAPTURE) {
        let format = format?;
        if format.pixel_format() == PixelFormat::JPEG || format.pixel_format() == PixelFormat::MJPG {
            pixel_format = Some(format.pixel_format());
            break;
        }
    }

    let Some(pixel_format) = pixel_format else {
        bail!("no supported pixel format found");
    };

    let mut formats = Vec::new();
    match device.frame_sizes(pixel_format)? {
        FrameSizes::Discrete(sizes) => {
            for size in sizes {
                let intervals =
                    match device.frame_intervals(pixel_format, size.width(), size.height())? {
                        FrameIntervals::Discrete(intervals) => intervals,
                        FrameIntervals::Stepwise(_) | FrameIntervals::Continuous(_) => {
                            bail!("stepwise or continuous frame rates are not supported")
                        }
                    };
                for rate in intervals {
                    formats.push(FrameFormat {
                        resolution: Resolution::new(size.width(), size.height()),
                        frame_interval: *rate.fract(),
                    });
                }
            }
        }
        FrameSizes::Stepwise(_) | FrameSizes::Continuous(_) => {
            bail!("stepwise or continuous resolutions are not supported")
        }
    }

    match pick_format(&formats, prefs) {
        Some(fmt) => Ok((
            PixFormat::new(
                fmt.resolution.width(),
                fmt.resolution.height(),
                pixel_format,
            ),
            fmt.frame_interval,
        )),
        None => bail!("failed to negotiate a webcam format"),
    }
}

/// Picks the format to use, relaxing the preferences until one matches.
///
/// The frame rate is given up before the resolution.
fn pick_format(formats: &[FrameFormat], mut prefs: FramePrefs) -> Option<FrameFormat> {
    loop {
        if let Some(fmt) = pick_format_step(formats, prefs) {
            return Some(fmt);
        }

        log::debug!("failed to negotiate format with prefs {:?}", prefs);
        if prefs.fps.take().is_none() && prefs.resolution.take().is_none() {
            return None;
        }
        log::debug!("retrying with new prefs {:?}", prefs);
    }
}

/// Among the formats that satisfy `prefs`, picks the one closest to the desired resolution, with
/// the highest frame rate.
fn pick_format_step(formats: &[FrameFormat], prefs: FramePrefs) -> Option<FrameFormat> {
    let eligible = formats.iter().filter(|fmt| {
        prefs.resolution.map_or(true, |res| {
            fmt.resolution.width() >= res.width() && fmt.resolution.height() >= res.height()
        }) && prefs.fps.map_or(true, |fps| {
            (1.0 / fmt.frame_interval.as_f32()).round() >= fps as f32
        })
    });
    let mut formats = eligible.copied().collect::<Vec<_>>();
    match prefs.resolution {
        // The smallest resolution that is at least as large as requested.
        Some(_) => formats.sort_by_key(|fmt| {
            (
                Reverse(fmt.resolution.num_pixels()),
                Reverse(fmt.frame_interval),
            )
        }),
        None => {
            formats.sort_by_key(|fmt| (fmt.resolution.num_pixels(), Reverse(fmt.frame_interval)))
        }
    }
    formats.last().copied()
}

/// A webcam yielding a stream of [`Image`]s.
pub struct Webcam {
    stream: ReadStream,
    width: u32,
    height: u32,
    t_dequeue: Timer,
    t_decode: Timer,
}

impl Webcam {
    /// Opens the first supported webcam found.
    ///
    /// This function can block for a significant amount of time while the webcam initializes (on
    /// the order of hundreds of milliseconds).
    pub fn open(options: WebcamOptions) -> anyhow::Result<Self> {
        let cam_name_from_env = env::var(ENV_VAR_WEBCAM_NAME).ok();
        if let Some(name) = &cam_name_from_env {
            log::debug!(
                "webcam override: `{}` is set to '{}'",
                ENV_VAR_WEBCAM_NAME,
                name,
            );
        }
        let name = options.device_name(cam_name_from_env.as_deref());

        for res in linuxvideo::list()? {
            match res {
                Ok(dev) => match Self::open_impl(dev, name, &options) {
                    Ok(Some(webcam)) => return Ok(webcam),
                    Ok(None) => {}
                    Err(e) => {
                        log::debug!("{}", e);
                    }
                },
                Err(e) => {
                    log::warn!("{}", e);
                }
            }
        }

        bail!("no supported webcam device found")
    }

    fn open_impl(
        dev: Device,
        name: Option<&str>,
        options: &WebcamOptions,
    ) -> anyhow::Result<Option<Self>> {
        let caps = dev.capabilities()?;
        if let Some(name) = name {
            if caps.card() != name {
                return Ok(None);
            }
        }

        let cap_flags = caps.device_capabilities();
        let path = dev.path()?;
        log::debug!(
            "device {} ({}) capabilities: {:?}",
            caps.card(),
            path.display(),
            cap_flags,
        );

        if !cap_flags.contains(CapabilityFlags::VIDEO_CAPTURE) {
            return Ok(None);
        }

        let (pixfmt, fract) = negotiate_format(&dev, options.frame)?;

        let capture = dev.video_capture(pixfmt)?;

        let format = capture.format();
        let width = format.width();
        let height = format.height();

        let actual = capture.set_frame_interval(fract)?;

        log::info!(
            "opened {} ({}), {}x{} @ {:.1}Hz",
            caps.card(),
            path.display(),
            width,
            height,
            1.0 / actual.as_f32(),
        );

        let stream = capture.into_stream()?;

        Ok(Some(Self {
            stream,
            width,
            height,
            t_dequeue: Timer::new("dequeue"),
            t_decode: Timer::new("decode"),
        }))
    }

    /// Returns the resolution frames are captured at.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Reads the next frame from the camera.
    ///
    /// If no frame is available, this method will block until one is.
    ///
    /// Frames that fail to decode are logged and replaced with a blank image. Webcams occasionally
    /// produce corrupted MJPG frames, and skipping them would cause latency spikes.
    pub fn read(&mut self) -> anyhow::Result<Image> {
        let dequeue_guard = self.t_dequeue.start();
        let (width, height) = (self.width, self.height);
        let t_decode = &self.t_decode;
        self.stream
            .dequeue(|buf| {
                drop(dequeue_guard);
                let image = match t_decode.time(|| Image::decode_jpeg(&buf)) {
                    Ok(image) => image,
                    Err(e) => {
                        log::error!("webcam decode error: {}", e);
                        Image::new(width, height)
                    }
                };
                Ok(image)
            })
            .map_err(Into::into)
    }
}

impl FrameSource for Webcam {
    fn read(&mut self) -> anyhow::Result<Image> {
        Webcam::read(self)
    }

    fn timers(&self) -> Vec<&Timer> {
        vec![&self.t_dequeue, &self.t_decode]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_name_overrides_env() {
        let options = WebcamOptions::default();
        assert_eq!(options.device_name(None), None);
        assert_eq!(options.device_name(Some("Env Cam")), Some("Env Cam"));

        let options = options.name("USB Camera");
        assert_eq!(options.device_name(Some("Env Cam")), Some("USB Camera"));
        assert_eq!(options.device_name(None), Some("USB Camera"));
    }

    fn fmt(width: u32, height: u32, fps: u32) -> FrameFormat {
        FrameFormat {
            resolution: Resolution::new(width, height),
            frame_interval: Fract::new(1, fps),
        }
    }

    fn formats() -> Vec<FrameFormat> {
        vec![
            fmt(640, 480, 30),
            fmt(640, 480, 60),
            fmt(1280, 720, 30),
            fmt(1920, 1080, 30),
            fmt(1920, 1080, 5),
        ]
    }

    #[test]
    fn picks_requested_resolution() {
        let prefs = FramePrefs {
            resolution: Some(Resolution::RES_720P),
            fps: Some(30),
        };
        assert_eq!(pick_format(&formats(), prefs), Some(fmt(1280, 720, 30)));
    }

    #[test]
    fn gives_up_fps_first() {
        let prefs = FramePrefs {
            resolution: Some(Resolution::RES_720P),
            fps: Some(60),
        };
        assert_eq!(pick_format(&formats(), prefs), Some(fmt(1280, 720, 30)));
    }

    #[test]
    fn falls_back_to_largest() {
        let prefs = FramePrefs {
            resolution: Some(Resolution::new(4000, 3000)),
            fps: None,
        };
        assert_eq!(pick_format(&formats(), prefs), Some(fmt(1920, 1080, 30)));
    }

    #[test]
    fn nothing_available() {
        assert_eq!(pick_format(&[], FramePrefs::default()), None);
    }
}
