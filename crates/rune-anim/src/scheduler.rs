//! Tick sources for the animation loop.
//!
//! The loop never talks to a host API directly; it asks a [`Scheduler`] to
//! run its next tick. Two strategies are provided:
//!
//! - [`FrameScheduler`]: ticks are queued until the host presents a frame,
//!   keeping animation work aligned with display refresh. Also the
//!   deterministic scheduler used by tests.
//! - [`TimerScheduler`]: ticks run after a fixed interval on the current
//!   tokio `LocalSet`, for headless hosts.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

pub use rune_config::SchedulerMode;

/// Deferred loop step handed to a scheduler.
pub type TickFn = Box<dyn FnOnce()>;

/// Capability to run a loop step later.
pub trait Scheduler {
    /// Arrange for `tick` to run once, at some point after this call returns.
    fn request_tick(&self, tick: TickFn);
}

/// Host-pumped scheduler aligned with display refresh.
///
/// Requested ticks wait until the host calls [`FrameScheduler::present_frame`]
/// (typically from its redraw handler). An optional redraw hook is invoked on
/// every request so the host knows another frame is wanted.
#[derive(Default)]
pub struct FrameScheduler {
    pending: RefCell<VecDeque<TickFn>>,
    redraw_hook: Option<Box<dyn Fn()>>,
    frames: Cell<u64>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `hook` whenever a tick is requested, e.g. to ask the window for a
    /// redraw.
    pub fn with_redraw_hook(hook: impl Fn() + 'static) -> Self {
        Self {
            redraw_hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    /// Run every tick requested before this call. Ticks requested while the
    /// frame runs are left for the next frame. Returns how many ran.
    pub fn present_frame(&self) -> usize {
        let batch: Vec<TickFn> = self.pending.borrow_mut().drain(..).collect();
        self.frames.set(self.frames.get() + 1);
        let count = batch.len();
        for tick in batch {
            tick();
        }
        count
    }

    /// Number of ticks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }
}

impl Scheduler for FrameScheduler {
    fn request_tick(&self, tick: TickFn) {
        self.pending.borrow_mut().push_back(tick);
        if let Some(hook) = &self.redraw_hook {
            hook();
        }
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .field("frames", &self.frames.get())
            .finish()
    }
}

/// Fixed-interval scheduler running on the current tokio `LocalSet`.
///
/// # Panics
///
/// `request_tick` must be called from within a `tokio::task::LocalSet`
/// context, as it spawns a local task.
#[derive(Debug, Clone, Copy)]
pub struct TimerScheduler {
    interval: Duration,
}

impl TimerScheduler {
    /// 60Hz equivalent.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_micros(16_667);

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Build from a millisecond interval, falling back to
    /// [`Self::DEFAULT_INTERVAL`] when it is not finite and positive.
    pub fn from_millis(interval_ms: f64) -> Self {
        if interval_ms.is_finite() && interval_ms > 0.0 {
            Self::new(Duration::from_secs_f64(interval_ms / 1000.0))
        } else {
            Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl Scheduler for TimerScheduler {
    fn request_tick(&self, tick: TickFn) {
        let interval = self.interval;
        tokio::task::spawn_local(async move {
            tokio::time::sleep(interval).await;
            tick();
        });
    }
}
