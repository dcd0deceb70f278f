//! Cooperative, time-driven animation scheduling for Rune nodes.
//!
//! Each animation maps elapsed time to eased progress for one node and hands
//! it to a frame callback. A [`Timeline`] owns the registry of active
//! animations and runs a loop that advances them on every tick until none
//! remain.
//!
//! # Features
//!
//! - Several concurrent animations per node, advanced in registration order
//! - `linear`, `ease-in`, `ease-out` and `ease-in-out` easing
//! - Infinite (wrapping) animations
//! - Stop with finish (render final frame) or cancel (reject)
//! - Promise-like [`Deferred`] results that can also be awaited
//! - Frame-aligned or timer-driven ticks through the [`Scheduler`] trait
//!
//! ```
//! use std::rc::Rc;
//! use rune_anim::{AnimationOptions, FrameScheduler, ManualClock, Timeline};
//!
//! let clock = Rc::new(ManualClock::new(0.0));
//! let frames = Rc::new(FrameScheduler::new());
//! let timeline = Timeline::builder()
//!     .clock(clock.clone())
//!     .frame_scheduler(frames.clone())
//!     .build();
//!
//! let set = timeline
//!     .animate(["title", "subtitle"], |node, p, _| println!("{node}: {p:.2}"), AnimationOptions::new())
//!     .unwrap();
//!
//! clock.set(1000.0);
//! frames.present_frame();
//! assert!(set.deferred().is_fulfilled());
//! assert!(timeline.is_idle());
//! ```

mod animation;
mod clock;
mod deferred;
mod easing;
mod error;
mod events;
mod options;
mod registry;
pub mod scheduler;
mod set;
mod timeline;
mod types;

pub use animation::{Animation, FrameCallback};
pub use clock::{ManualClock, SystemClock, TimeSource};
pub use deferred::{Deferred, Outcome};
pub use easing::EasingFunction;
pub use error::{AnimationError, Result};
pub use events::{AnimationEvent, CancelReason};
pub use options::{AnimationDefaults, AnimationOptions, AnimationSpec, StopOptions};
pub use scheduler::{FrameScheduler, Scheduler, SchedulerMode, TickFn, TimerScheduler};
pub use set::AnimationSet;
pub use timeline::{Timeline, TimelineBuilder};
pub use types::{AnimationId, AnimationState, DebugFrame, NodeId};
