//! A single animation bound to one node.
//!
//! An [`Animation`] turns elapsed time into eased progress and hands it to a
//! frame callback, which applies the presentation change (opacity, transform,
//! ...) for its node. It owns a [`Deferred`] that fulfils with the node when
//! the final frame renders, or rejects when the animation is abandoned.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use rune_anim::{Animation, AnimationOptions, EasingFunction, FrameScheduler, ManualClock, Timeline};
//!
//! let clock = Rc::new(ManualClock::new(0.0));
//! let frames = Rc::new(FrameScheduler::new());
//! let timeline = Timeline::builder()
//!     .clock(clock.clone())
//!     .frame_scheduler(frames.clone())
//!     .build();
//!
//! let fade = Animation::new(
//!     &timeline,
//!     "button",
//!     |_node, progress, _spec| println!("opacity {}", progress),
//!     AnimationOptions::new().duration_ms(200.0).easing(EasingFunction::Linear),
//! )
//! .unwrap();
//!
//! assert!(!fade.update(Some(100.0)));
//! assert!(fade.update(Some(200.0)));
//! assert!(fade.deferred().is_fulfilled());
//! ```

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use crate::deferred::Deferred;
use crate::error::{AnimationError, Result, panic_message};
use crate::events::{AnimationEvent, CancelReason};
use crate::options::{AnimationOptions, AnimationSpec, StopOptions};
use crate::timeline::{Timeline, TimelineInner};
use crate::types::{AnimationId, AnimationState, DebugFrame, NodeId};

/// Per-frame callback: node, eased progress in `[0, 1]`, resolved options.
pub type FrameCallback = Rc<dyn Fn(&NodeId, f64, &AnimationSpec)>;

struct AnimationInner {
    id: AnimationId,
    target: NodeId,
    callback: FrameCallback,
    spec: AnimationSpec,
    stopped: Cell<bool>,
    finished: Cell<bool>,
    deferred: Deferred<NodeId>,
    timeline: Weak<TimelineInner>,
}

/// Shared handle to a registered animation.
///
/// Clones refer to the same animation; use [`Animation::clone_onto`] to
/// duplicate it for another node.
#[derive(Clone)]
pub struct Animation {
    inner: Rc<AnimationInner>,
}

impl Animation {
    /// Create an animation and register it with `timeline`.
    ///
    /// `options` are merged over the timeline's current defaults; when no
    /// start time is given the timeline clock's current time is used. The
    /// frame callback is not invoked and the loop is not started; use
    /// [`Timeline::animate`] or [`Timeline::start`] for that.
    pub fn new(
        timeline: &Timeline,
        target: impl Into<NodeId>,
        callback: impl Fn(&NodeId, f64, &AnimationSpec) + 'static,
        options: AnimationOptions,
    ) -> Result<Self> {
        let spec = options.resolve(&timeline.defaults(), timeline.now())?;
        Ok(Self::from_parts(
            timeline.downgrade(),
            target.into(),
            Rc::new(callback),
            spec,
        ))
    }

    pub(crate) fn from_parts(
        timeline: Weak<TimelineInner>,
        target: NodeId,
        callback: FrameCallback,
        spec: AnimationSpec,
    ) -> Self {
        let animation = Self {
            inner: Rc::new(AnimationInner {
                id: AnimationId::new(),
                target,
                callback,
                spec,
                stopped: Cell::new(false),
                finished: Cell::new(false),
                deferred: Deferred::new(),
                timeline,
            }),
        };

        if let Some(timeline) = animation.timeline() {
            timeline.register(animation.clone());
            timeline.push_event(AnimationEvent::Started {
                animation_id: animation.id(),
                node_id: animation.target().clone(),
            });
        }
        animation
    }

    fn timeline(&self) -> Option<Timeline> {
        self.inner.timeline.upgrade().map(Timeline::from_inner)
    }

    /// Advance to `time` (milliseconds), or force the final frame with `None`.
    ///
    /// Invokes the frame callback once and returns whether the animation is
    /// finished. A stopped animation returns `true` without side effects.
    /// Infinite animations never finish through a timed update.
    pub fn update(&self, time: Option<f64>) -> bool {
        if self.inner.stopped.get() {
            return true;
        }

        let spec = &self.inner.spec;
        let progress = match time {
            Some(now) => spec.progress_at(now),
            None => 1.0,
        };

        if spec.debug {
            trace!(
                animation = %self.inner.id,
                node = %self.inner.target,
                ?time,
                progress,
                "animation frame"
            );
            if let Some(timeline) = self.timeline() {
                timeline.record_debug(&self.inner.target, DebugFrame { time, progress });
            }
        }

        let callback = Rc::clone(&self.inner.callback);
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            callback(&self.inner.target, progress, spec)
        }));
        if let Err(payload) = rendered {
            self.abandon_after_panic(payload);
            return true;
        }

        if progress < 1.0 || (spec.infinite && time.is_some()) {
            return false;
        }

        if !self.inner.finished.replace(true) {
            if let Some(timeline) = self.timeline() {
                timeline.clear_debug(&self.inner.target);
                timeline.push_event(AnimationEvent::Ended {
                    animation_id: self.inner.id,
                    node_id: self.inner.target.clone(),
                });
            }
            self.inner.deferred.fulfill(self.inner.target.clone());
        }
        true
    }

    fn abandon_after_panic(&self, payload: Box<dyn Any + Send>) {
        let message = panic_message(payload.as_ref());
        warn!(
            animation = %self.inner.id,
            node = %self.inner.target,
            %message,
            "frame callback panicked; abandoning animation"
        );

        self.inner.stopped.set(true);
        if let Some(timeline) = self.timeline() {
            timeline.deregister(self);
            timeline.clear_debug(&self.inner.target);
            timeline.push_event(AnimationEvent::Cancelled {
                animation_id: self.inner.id,
                node_id: self.inner.target.clone(),
                reason: CancelReason::CallbackPanicked,
            });
        }
        self.inner.deferred.reject(AnimationError::CallbackPanicked {
            target: self.inner.target.clone(),
            message,
        });
    }

    /// Stop the animation.
    ///
    /// With `finish` the final frame is rendered and the deferred fulfils;
    /// otherwise no further frame is rendered and the deferred rejects with
    /// [`AnimationError::Cancelled`]. No-op once stopped or finished.
    pub fn stop(&self, options: StopOptions) {
        if self.inner.stopped.get() || self.inner.finished.get() {
            return;
        }

        let timeline = self.timeline();
        if let Some(timeline) = &timeline {
            timeline.deregister(self);
        }

        if options.finish {
            self.update(None);
        }

        self.inner.stopped.set(true);

        if !options.finish {
            if let Some(timeline) = &timeline {
                timeline.clear_debug(&self.inner.target);
                timeline.push_event(AnimationEvent::Cancelled {
                    animation_id: self.inner.id,
                    node_id: self.inner.target.clone(),
                    reason: CancelReason::Stopped,
                });
            }
            self.inner.deferred.reject(AnimationError::Cancelled {
                target: self.inner.target.clone(),
            });
        }
    }

    /// Duplicate this animation for `target`, keeping the original absolute
    /// start time so both stay on the same timeline.
    ///
    /// The copy is registered with the same timeline and has its own
    /// deferred result. If the timeline has been dropped the copy is
    /// detached and never advanced by a loop.
    pub fn clone_onto(&self, target: impl Into<NodeId>) -> Animation {
        self.clone_with_spec(target.into(), self.inner.spec.clone())
    }

    /// Like [`Animation::clone_onto`], restarting at `start_ms`.
    pub fn clone_onto_at(&self, target: impl Into<NodeId>, start_ms: f64) -> Animation {
        let spec = AnimationSpec {
            start_ms,
            ..self.inner.spec.clone()
        };
        self.clone_with_spec(target.into(), spec)
    }

    fn clone_with_spec(&self, target: NodeId, spec: AnimationSpec) -> Animation {
        Self::from_parts(
            self.inner.timeline.clone(),
            target,
            Rc::clone(&self.inner.callback),
            spec,
        )
    }

    /// Attach fulfilment and rejection handlers to the deferred result.
    pub fn then(
        &self,
        on_fulfilled: impl FnOnce(NodeId) + 'static,
        on_rejected: impl FnOnce(AnimationError) + 'static,
    ) -> &Self {
        self.inner.deferred.then(on_fulfilled, on_rejected);
        self
    }

    pub fn catch(&self, on_rejected: impl FnOnce(AnimationError) + 'static) -> &Self {
        self.inner.deferred.catch(on_rejected);
        self
    }

    pub fn finally(&self, on_settled: impl FnOnce() + 'static) -> &Self {
        self.inner.deferred.finally(on_settled);
        self
    }

    /// The deferred result; await it or attach reactions.
    pub fn deferred(&self) -> Deferred<NodeId> {
        self.inner.deferred.clone()
    }

    pub fn id(&self) -> AnimationId {
        self.inner.id
    }

    pub fn target(&self) -> &NodeId {
        &self.inner.target
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.inner.spec
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.get()
    }

    /// Neither stopped nor finished.
    pub fn is_active(&self) -> bool {
        !self.is_stopped() && !self.is_finished()
    }

    pub fn state(&self) -> AnimationState {
        if self.is_finished() {
            AnimationState::Finished
        } else if self.is_stopped() {
            AnimationState::Cancelled
        } else {
            AnimationState::Running
        }
    }

    /// Whether both handles refer to the same animation.
    pub fn ptr_eq(&self, other: &Animation) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Animation {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("id", &self.inner.id)
            .field("target", &self.inner.target)
            .field("spec", &self.inner.spec)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::easing::EasingFunction;
    use crate::scheduler::FrameScheduler;
    use std::cell::RefCell;

    type FrameLog = Rc<RefCell<Vec<(String, f64)>>>;

    fn timeline() -> Timeline {
        Timeline::builder()
            .clock(Rc::new(ManualClock::new(0.0)))
            .frame_scheduler(Rc::new(FrameScheduler::new()))
            .build()
    }

    fn recorder() -> (FrameLog, impl Fn(&NodeId, f64, &AnimationSpec) + 'static) {
        let log: FrameLog = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |node: &NodeId, progress: f64, _: &AnimationSpec| {
            sink.borrow_mut().push((node.to_string(), progress))
        })
    }

    fn linear(duration_ms: f64) -> AnimationOptions {
        AnimationOptions::new()
            .duration_ms(duration_ms)
            .easing(EasingFunction::Linear)
            .start_ms(0.0)
    }

    #[test]
    fn test_construct_registers_without_rendering() {
        let timeline = timeline();
        let (log, callback) = recorder();
        let animation = Animation::new(&timeline, "a", callback, linear(1000.0)).unwrap();

        assert!(log.borrow().is_empty());
        assert_eq!(timeline.animations_for(&NodeId::from("a")), vec![animation.clone()]);
        assert!(animation.deferred().is_pending());
        assert_eq!(animation.state(), AnimationState::Running);
    }

    #[test]
    fn test_linear_end_to_end() {
        let timeline = timeline();
        let (log, callback) = recorder();
        let animation = Animation::new(&timeline, "a", callback, linear(1000.0)).unwrap();

        assert!(!animation.update(Some(0.0)));
        assert!(!animation.update(Some(500.0)));
        assert!(animation.update(Some(1000.0)));

        let progress: Vec<f64> = log.borrow().iter().map(|(_, p)| *p).collect();
        assert_eq!(progress, vec![0.0, 0.5, 1.0]);
        assert_eq!(animation.deferred().outcome(), Some(Ok(NodeId::from("a"))));
        assert!(animation.is_finished());
    }

    #[test]
    fn test_start_defaults_to_clock() {
        let clock = Rc::new(ManualClock::new(250.0));
        let timeline = Timeline::builder()
            .clock(clock.clone())
            .frame_scheduler(Rc::new(FrameScheduler::new()))
            .build();
        let animation = Animation::new(&timeline, "a", |_, _, _| {}, AnimationOptions::new()).unwrap();
        assert_eq!(animation.spec().start_ms, 250.0);
        assert_eq!(animation.spec().easing, EasingFunction::EaseInOut);
        assert_eq!(animation.spec().duration_ms, 1000.0);
    }

    #[test]
    fn test_monotonic_progress() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
        ] {
            let timeline = timeline();
            let (log, callback) = recorder();
            let animation = Animation::new(
                &timeline,
                "a",
                callback,
                linear(1000.0).easing(easing),
            )
            .unwrap();

            for t in (0..=1000).step_by(37) {
                animation.update(Some(t as f64));
            }
            let progress: Vec<f64> = log.borrow().iter().map(|(_, p)| *p).collect();
            assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?} regressed", easing);
        }
    }

    #[test]
    fn test_settles_exactly_once() {
        let timeline = timeline();
        let fulfilled = Rc::new(Cell::new(0));
        let animation = Animation::new(&timeline, "a", |_, _, _| {}, linear(100.0)).unwrap();
        {
            let fulfilled = Rc::clone(&fulfilled);
            animation.then(move |_| fulfilled.set(fulfilled.get() + 1), |_| panic!("rejected"));
        }

        assert!(animation.update(Some(100.0)));
        assert!(animation.update(Some(200.0)));
        assert!(animation.update(None));
        animation.stop(StopOptions::CANCEL);

        assert_eq!(fulfilled.get(), 1);
        assert!(animation.deferred().is_fulfilled());
    }

    #[test]
    fn test_stop_finish_renders_final_frame() {
        let timeline = timeline();
        let (log, callback) = recorder();
        let animation = Animation::new(&timeline, "a", callback, linear(1000.0)).unwrap();

        animation.update(Some(100.0));
        animation.stop(StopOptions::default());

        assert_eq!(log.borrow().last(), Some(&("a".to_string(), 1.0)));
        assert_eq!(animation.deferred().outcome(), Some(Ok(NodeId::from("a"))));
        assert!(animation.is_stopped());
        assert!(animation.is_finished());
        assert!(!timeline.is_animating(&NodeId::from("a")));
    }

    #[test]
    fn test_stop_cancel_rejects_without_rendering() {
        let timeline = timeline();
        let (log, callback) = recorder();
        let animation = Animation::new(&timeline, "a", callback, linear(1000.0)).unwrap();

        animation.stop(StopOptions::CANCEL);

        assert!(log.borrow().is_empty());
        assert_eq!(
            animation.deferred().outcome(),
            Some(Err(AnimationError::Cancelled {
                target: NodeId::from("a")
            }))
        );
        assert_eq!(animation.state(), AnimationState::Cancelled);
        assert!(animation.update(Some(500.0)));
        assert!(log.borrow().is_empty());
        assert!(!timeline.is_animating(&NodeId::from("a")));
    }

    #[test]
    fn test_infinite_wraps_and_never_finishes() {
        let timeline = timeline();
        let (log, callback) = recorder();
        let animation = Animation::new(
            &timeline,
            "spinner",
            callback,
            linear(1000.0).infinite(true),
        )
        .unwrap();

        assert!(!animation.update(Some(500.0)));
        assert!(!animation.update(Some(1500.0)));
        assert!(!animation.update(Some(999_999.999)));
        {
            let log = log.borrow();
            assert_eq!(log[0].1, log[1].1);
        }
        assert!(animation.deferred().is_pending());

        animation.stop(StopOptions::FINISH);
        assert_eq!(log.borrow().last().map(|(_, p)| *p), Some(1.0));
        assert!(animation.deferred().is_fulfilled());
    }

    #[test]
    fn test_infinite_ease_in_out_near_wrap_does_not_finish() {
        let timeline = timeline();
        let animation = Animation::new(
            &timeline,
            "spinner",
            |_, _, _| {},
            AnimationOptions::new()
                .duration_ms(1000.0)
                .infinite(true)
                .start_ms(0.0),
        )
        .unwrap();
        assert!(!animation.update(Some(999.999_999_999)));
        assert!(animation.is_active());
    }

    #[test]
    fn test_clone_keeps_absolute_start() {
        let timeline = timeline();
        let (log, callback) = recorder();
        let original = Animation::new(&timeline, "a", callback, linear(1000.0)).unwrap();

        let copy = original.clone_onto("b");
        assert!(!copy.ptr_eq(&original));
        assert_eq!(copy.spec().start_ms, 0.0);
        assert_eq!(copy.target().as_str(), "b");
        assert!(timeline.is_animating(&NodeId::from("b")));

        copy.update(Some(250.0));
        assert_eq!(log.borrow().last(), Some(&("b".to_string(), 0.25)));

        let restarted = original.clone_onto_at("c", 200.0);
        restarted.update(Some(250.0));
        assert_eq!(log.borrow().last(), Some(&("c".to_string(), 0.05)));

        original.stop(StopOptions::CANCEL);
        assert!(copy.deferred().is_pending());
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let timeline = timeline();
        let animation = Animation::new(
            &timeline,
            "bad",
            |_, progress, _| {
                if progress > 0.4 {
                    panic!("boom");
                }
            },
            linear(100.0),
        )
        .unwrap();

        assert!(!animation.update(Some(10.0)));
        assert!(animation.update(Some(50.0)));
        assert!(animation.is_stopped());
        assert!(!timeline.is_animating(&NodeId::from("bad")));
        match animation.deferred().outcome() {
            Some(Err(AnimationError::CallbackPanicked { target, message })) => {
                assert_eq!(target.as_str(), "bad");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_debug_metadata() {
        let timeline = timeline();
        let node = NodeId::from("dbg");
        let animation =
            Animation::new(&timeline, node.clone(), |_, _, _| {}, linear(100.0).debug(true))
                .unwrap();

        animation.update(Some(40.0));
        assert_eq!(
            timeline.debug_frame(&node),
            Some(DebugFrame {
                time: Some(40.0),
                progress: 0.4
            })
        );

        animation.update(Some(100.0));
        assert_eq!(timeline.debug_frame(&node), None);
    }

    #[test]
    fn test_stop_from_inside_callback() {
        let timeline = timeline();
        let slot: Rc<RefCell<Option<Animation>>> = Rc::new(RefCell::new(None));
        let handle = Rc::clone(&slot);
        let animation = Animation::new(
            &timeline,
            "a",
            move |_, progress, _| {
                if progress >= 0.5 && progress < 1.0 {
                    if let Some(me) = handle.borrow().as_ref() {
                        me.stop(StopOptions::FINISH);
                    }
                }
            },
            linear(100.0),
        )
        .unwrap();
        *slot.borrow_mut() = Some(animation.clone());

        animation.update(Some(60.0));
        assert!(animation.is_finished());
        assert!(animation.is_stopped());
        assert!(animation.deferred().is_fulfilled());
        slot.borrow_mut().take();
    }
}
