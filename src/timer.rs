//! Performance measurement tools.

use std::{
    cell::Cell,
    fmt::{self, Arguments},
    time::{Duration, Instant},
};

/// Weight of the newest sample in a timer's moving average.
const EMA_ALPHA: f32 = 0.3;

/// A timer that can measure and average the time an operation takes.
///
/// Collected timings are averaged with an exponential moving average, and reset when the timer is
/// displayed using `{}` ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    /// The current average time, in seconds. `None` if nothing was measured since the last reset.
    avg: Cell<Option<f32>>,
    /// The number of time measurements that contributed to the current `avg`.
    count: Cell<usize>,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            avg: Cell::new(None),
            count: Cell::new(0),
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&self, timee: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        timee()
    }

    /// Starts timing an operation using a drop guard.
    ///
    /// When the returned [`TimerGuard`] is dropped, the time between the call to `start` and the
    /// drop is measured and recorded.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn record(&self, duration: Duration) {
        let secs = duration.as_secs_f32();
        let avg = match self.avg.get() {
            Some(prev) => prev + EMA_ALPHA * (secs - prev),
            None => secs,
        };
        self.avg.set(Some(avg));
        self.count.set(self.count.get() + 1);
    }

    /// Returns the averaged duration measured since the last reset, if any.
    pub fn average(&self) -> Option<Duration> {
        self.avg.get().map(Duration::from_secs_f32)
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let avg = self.avg.take().unwrap_or(0.0);
        let len = self.count.take();
        let avg_ms = avg * 1000.0;

        write!(f, "{}: {len}x{avg_ms:.01}ms", self.name)
    }
}

/// Cloning a timer resets its collected timings.
impl Clone for Timer {
    fn clone(&self) -> Self {
        Self::new(self.name)
    }
}

/// Guard returned by [`Timer::start`]. Stops timing the operation when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Logs frames per second with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1 and logs FPS and `extra` data if one second has passed.
    ///
    /// `extra` is only iterated when a log line is actually written, so passing [`Timer`]s here
    /// resets them once per second.
    pub fn tick_with<D: fmt::Display, I: IntoIterator<Item = D>>(&mut self, extra: I) {
        self.frames += 1;
        if self.start.elapsed() > Duration::from_secs(1) {
            let extra = extra
                .into_iter()
                .map(|item| item.to_string())
                .collect::<Vec<_>>();
            if extra.is_empty() {
                self.log(format_args!(""));
            } else {
                self.log(format_args!(" ({})", extra.join(", ")));
            }
        }
    }

    fn log(&mut self, args: Arguments<'_>) {
        log::debug!("{}: {} FPS{}", self.name, self.frames, args);

        self.frames = 0;
        self.start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_resets() {
        let timer = Timer::new("op");
        assert_eq!(timer.average(), None);

        timer.time(|| {});
        timer.time(|| {});
        assert!(timer.average().is_some());

        let shown = timer.to_string();
        assert!(shown.starts_with("op: 2x"), "{shown}");
        assert_eq!(timer.average(), None);
        assert_eq!(timer.to_string(), "op: 0x0.0ms");
    }

    #[test]
    fn average_is_smoothed() {
        let timer = Timer::new("op");
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        let avg = timer.average().unwrap().as_secs_f32();
        approx::assert_relative_eq!(avg, 0.013, epsilon = 1e-5);
    }
}
