//! The animation loop and the context it runs in.
//!
//! A [`Timeline`] owns everything the animations of one host share: the
//! registry of active animations, the clock, the tick schedulers, the global
//! defaults and the lifecycle event queue. It is a cheap-to-clone handle, so
//! independent timelines (one per window, one per test) never interfere.
//!
//! # Loop
//!
//! ```text
//!   Idle ──start()──▶ Running ──tick: registry empty──▶ Idle
//!                       │  ▲
//!                       └──┘ tick: request next tick from the scheduler
//!                            selected by the current SchedulerMode
//! ```
//!
//! Each tick reads the clock once, advances every animation registered when
//! the tick began (registry order), and drops the finished ones. Animations
//! registered by a frame callback during a tick are first advanced on the
//! next tick.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use rune_config::RuneConfig;
use tracing::{debug, warn};

use crate::animation::{Animation, FrameCallback};
use crate::clock::{SystemClock, TimeSource};
use crate::error::Result;
use crate::events::{AnimationEvent, EventQueue};
use crate::options::{AnimationDefaults, AnimationOptions, AnimationSpec, StopOptions};
use crate::registry::AnimationRegistry;
use crate::scheduler::{Scheduler, SchedulerMode, TickFn, TimerScheduler};
use crate::set::AnimationSet;
use crate::types::{DebugFrame, NodeId};

pub(crate) struct TimelineInner {
    registry: RefCell<AnimationRegistry>,
    clock: Rc<dyn TimeSource>,
    frame_scheduler: Option<Rc<dyn Scheduler>>,
    timer_scheduler: Rc<dyn Scheduler>,
    mode: Cell<SchedulerMode>,
    defaults: RefCell<AnimationDefaults>,
    running: Cell<bool>,
    debug_frames: RefCell<HashMap<NodeId, DebugFrame>>,
    events: RefCell<EventQueue>,
    warned_frame_fallback: Cell<bool>,
}

/// Shared scheduler context driving every animation registered with it.
#[derive(Clone)]
pub struct Timeline {
    inner: Rc<TimelineInner>,
}

impl Timeline {
    pub fn builder() -> TimelineBuilder {
        TimelineBuilder::default()
    }

    /// Builder pre-populated from `rune.toml` settings.
    pub fn from_config(config: &RuneConfig) -> TimelineBuilder {
        TimelineBuilder::default()
            .defaults(AnimationDefaults::from(&config.animation))
            .mode(config.scheduler.mode)
            .timer_scheduler(Rc::new(TimerScheduler::from_millis(
                config.scheduler.frame_interval_ms,
            )))
    }

    pub(crate) fn from_inner(inner: Rc<TimelineInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<TimelineInner> {
        Rc::downgrade(&self.inner)
    }

    /// Current time of the timeline's clock, in milliseconds.
    pub fn now(&self) -> f64 {
        self.inner.clock.now()
    }

    // ========================================================================
    // Animation requests
    // ========================================================================

    /// Animate every node in `targets` with the same callback and options,
    /// then make sure the loop is running.
    ///
    /// Options are resolved once, so all animations of the batch share one
    /// start time. Nothing is registered if the options are invalid.
    ///
    /// # Panics
    ///
    /// Panics if the loop was idle and the selected scheduler cannot accept a
    /// tick, e.g. a [`TimerScheduler`] used outside a tokio `LocalSet`. See
    /// [`Timeline::start`].
    pub fn animate<I, T>(
        &self,
        targets: I,
        callback: impl Fn(&NodeId, f64, &AnimationSpec) + 'static,
        options: AnimationOptions,
    ) -> Result<AnimationSet>
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        let spec = options.resolve(&self.defaults(), self.now())?;
        let callback: FrameCallback = Rc::new(callback);

        let animations = targets
            .into_iter()
            .map(|target| {
                Animation::from_parts(
                    self.downgrade(),
                    target.into(),
                    Rc::clone(&callback),
                    spec.clone(),
                )
            })
            .collect();

        let set = AnimationSet::new(animations);
        self.start();
        Ok(set)
    }

    /// Stop every animation registered for `target`. Returns how many were
    /// stopped.
    pub fn stop(&self, target: &NodeId, options: StopOptions) -> usize {
        let animations = self.animations_for(target);
        for animation in &animations {
            animation.stop(options);
        }
        animations.len()
    }

    /// Copy every active animation of `from` onto `to`, keeping their
    /// absolute start times, and make sure the loop is running.
    pub fn clone_animations(&self, from: &NodeId, to: &NodeId) -> Vec<Animation> {
        let copies: Vec<Animation> = self
            .animations_for(from)
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.clone_onto(to))
            .collect();
        if !copies.is_empty() {
            self.start();
        }
        copies
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Start the loop if it is idle, running its first tick immediately.
    ///
    /// # Panics
    ///
    /// Propagates a panic from the scheduler's `request_tick` (a
    /// [`TimerScheduler`] outside a tokio `LocalSet`). The loop is left idle,
    /// so `start` can be called again once a usable scheduler is selected.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);
        debug!(
            targets = self.inner.registry.borrow().len(),
            "animation loop started"
        );
        self.tick();
    }

    fn tick(&self) {
        let _idle_on_unwind = IdleOnUnwind(&self.inner.running);
        self.advance();

        if self.inner.registry.borrow().is_empty() {
            self.inner.running.set(false);
            debug!("animation loop idle");
            return;
        }

        let weak = self.downgrade();
        let next: TickFn = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Timeline::from_inner(inner).tick();
            }
        });
        self.scheduler().request_tick(next);
    }

    fn scheduler(&self) -> Rc<dyn Scheduler> {
        match (self.inner.mode.get(), &self.inner.frame_scheduler) {
            (SchedulerMode::Frame, Some(frame)) => Rc::clone(frame),
            (SchedulerMode::Frame, None) => {
                if !self.inner.warned_frame_fallback.replace(true) {
                    warn!("frame scheduling requested without a frame scheduler; using timer");
                }
                Rc::clone(&self.inner.timer_scheduler)
            }
            (SchedulerMode::Timer, _) => Rc::clone(&self.inner.timer_scheduler),
        }
    }

    /// Advance every registered animation to the clock's current time,
    /// without touching loop scheduling. Returns how many finished.
    pub fn advance(&self) -> usize {
        let now = self.now();
        self.advance_to(now)
    }

    /// Advance every registered animation to `now`. Returns how many
    /// finished.
    pub fn advance_to(&self, now: f64) -> usize {
        let snapshot = self.inner.registry.borrow().snapshot();
        let mut finished_total = 0;

        for (target, animations) in snapshot {
            let mut finished = Vec::new();
            for animation in animations {
                if animation.update(Some(now)) {
                    finished.push(animation);
                }
            }
            if !finished.is_empty() {
                finished_total += finished.len();
                self.inner
                    .registry
                    .borrow_mut()
                    .retain(&target, |a| !finished.iter().any(|f| f.ptr_eq(a)));
            }
        }

        finished_total
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn is_idle(&self) -> bool {
        !self.is_running()
    }

    // ========================================================================
    // Registry access
    // ========================================================================

    pub(crate) fn register(&self, animation: Animation) {
        self.inner.registry.borrow_mut().register(animation);
    }

    pub(crate) fn deregister(&self, animation: &Animation) -> bool {
        self.inner.registry.borrow_mut().deregister(animation)
    }

    pub(crate) fn with_registry<R>(&self, f: impl FnOnce(&AnimationRegistry) -> R) -> R {
        f(&self.inner.registry.borrow())
    }

    /// Animations currently registered for `target`, oldest first.
    pub fn animations_for(&self, target: &NodeId) -> Vec<Animation> {
        self.with_registry(|r| r.get(target).map(<[Animation]>::to_vec).unwrap_or_default())
    }

    /// Nodes with registered animations, in registration order.
    pub fn targets(&self) -> Vec<NodeId> {
        self.with_registry(|r| r.targets().cloned().collect())
    }

    pub fn is_animating(&self, target: &NodeId) -> bool {
        self.with_registry(|r| r.contains(target))
    }

    /// Total number of registered animations.
    pub fn active_count(&self) -> usize {
        self.with_registry(AnimationRegistry::animation_count)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Snapshot of the defaults new animations are built with.
    pub fn defaults(&self) -> AnimationDefaults {
        self.inner.defaults.borrow().clone()
    }

    /// Replace the defaults. Existing animations keep the options they were
    /// built with.
    pub fn set_defaults(&self, defaults: AnimationDefaults) {
        *self.inner.defaults.borrow_mut() = defaults;
    }

    pub fn mode(&self) -> SchedulerMode {
        self.inner.mode.get()
    }

    /// Select the tick strategy; takes effect from the next reschedule.
    pub fn set_mode(&self, mode: SchedulerMode) {
        self.inner.mode.set(mode);
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub(crate) fn record_debug(&self, target: &NodeId, frame: DebugFrame) {
        self.inner
            .debug_frames
            .borrow_mut()
            .insert(target.clone(), frame);
    }

    pub(crate) fn clear_debug(&self, target: &NodeId) {
        self.inner.debug_frames.borrow_mut().remove(target);
    }

    /// Latest frame recorded for `target` by a `debug` animation.
    pub fn debug_frame(&self, target: &NodeId) -> Option<DebugFrame> {
        self.inner.debug_frames.borrow().get(target).copied()
    }

    pub(crate) fn push_event(&self, event: AnimationEvent) {
        self.inner.events.borrow_mut().push(event);
    }

    /// Take every lifecycle event recorded since the last drain.
    pub fn drain_events(&self) -> Vec<AnimationEvent> {
        self.inner.events.borrow_mut().drain().collect()
    }

    /// Take the oldest pending lifecycle event.
    pub fn next_event(&self) -> Option<AnimationEvent> {
        self.inner.events.borrow_mut().pop()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.inner.events.borrow().is_empty()
    }

    pub fn pending_event_count(&self) -> usize {
        self.inner.events.borrow().len()
    }

    /// Pending lifecycle events concerning `target`, oldest first. They stay
    /// queued.
    pub fn events_for(&self, target: &NodeId) -> Vec<AnimationEvent> {
        self.inner
            .events
            .borrow()
            .events_for_node(target)
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Marks the loop idle when a tick unwinds, so it is not left flagged as
/// running without a pending tick.
struct IdleOnUnwind<'a>(&'a Cell<bool>);

impl Drop for IdleOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.set(false);
        }
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("running", &self.inner.running.get())
            .field("mode", &self.inner.mode.get())
            .field("targets", &self.inner.registry.borrow().len())
            .finish()
    }
}

/// Builder for [`Timeline`].
///
/// Every collaborator is optional: the clock defaults to [`SystemClock`], the
/// timer scheduler to a 60Hz [`TimerScheduler`]. Providing a frame scheduler
/// selects [`SchedulerMode::Frame`] unless a mode is set explicitly.
#[derive(Default)]
pub struct TimelineBuilder {
    clock: Option<Rc<dyn TimeSource>>,
    frame_scheduler: Option<Rc<dyn Scheduler>>,
    timer_scheduler: Option<Rc<dyn Scheduler>>,
    defaults: AnimationDefaults,
    mode: Option<SchedulerMode>,
}

impl TimelineBuilder {
    pub fn clock(mut self, clock: Rc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn frame_scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.frame_scheduler = Some(scheduler);
        self
    }

    pub fn timer_scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.timer_scheduler = Some(scheduler);
        self
    }

    pub fn timer_interval(self, interval: Duration) -> Self {
        self.timer_scheduler(Rc::new(TimerScheduler::new(interval)))
    }

    pub fn defaults(mut self, defaults: AnimationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn mode(mut self, mode: SchedulerMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn build(self) -> Timeline {
        let mode = self.mode.unwrap_or(if self.frame_scheduler.is_some() {
            SchedulerMode::Frame
        } else {
            SchedulerMode::Timer
        });

        Timeline {
            inner: Rc::new(TimelineInner {
                registry: RefCell::new(AnimationRegistry::new()),
                clock: self.clock.unwrap_or_else(|| Rc::new(SystemClock::new())),
                frame_scheduler: self.frame_scheduler,
                timer_scheduler: self
                    .timer_scheduler
                    .unwrap_or_else(|| Rc::new(TimerScheduler::default())),
                mode: Cell::new(mode),
                defaults: RefCell::new(self.defaults),
                running: Cell::new(false),
                debug_frames: RefCell::new(HashMap::new()),
                events: RefCell::new(EventQueue::new()),
                warned_frame_fallback: Cell::new(false),
            }),
        }
    }
}
